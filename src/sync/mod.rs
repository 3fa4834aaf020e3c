// Export and import of readings and alerts
pub mod export_import;

pub use export_import::{ExportData, ExportImportManager, ImportResult};
