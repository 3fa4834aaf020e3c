// Output module
pub mod table;

pub use table::{threshold_rows, AlertRow, AnomalyRow, OutputFormat, ThresholdRow, VitalsRow};
