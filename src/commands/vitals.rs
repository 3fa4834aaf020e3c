use anyhow::Result;

use crate::cli::VitalArgs;
use crate::commands::AppContext;
use crate::output::{threshold_rows, OutputFormat};

pub fn handle_record_command(ctx: &AppContext, vitals: VitalArgs) -> Result<()> {
    if vitals.is_empty() {
        anyhow::bail!("Provide at least one vital sign (e.g. --heart-rate 72)");
    }

    let mut monitor = ctx.monitor()?;
    let outcome = monitor.record_reading(vitals.to_reading(&ctx.user))?;

    if ctx.json {
        return ctx.print_json(&outcome);
    }

    println!("Reading {} recorded for {}.", outcome.reading.id, outcome.reading.user_id);
    println!("{}", outcome.anomalies.to_table());
    if !outcome.alerts.is_empty() {
        println!(
            "{} alert(s) stored, {} notified immediately.",
            outcome.alerts.len(),
            outcome.notified.len()
        );
    }
    if !outcome.failed.is_empty() {
        eprintln!(
            "Warning: {} notification(s) could not be delivered; the alerts remain unread.",
            outcome.failed.len()
        );
    }
    Ok(())
}

pub fn handle_check_command(ctx: &AppContext, vitals: VitalArgs) -> Result<()> {
    let detector = ctx.detector()?;
    let anomalies = detector.analyze(&vitals.to_reading(&ctx.user));
    ctx.print(&anomalies)
}

pub fn handle_history_command(ctx: &AppContext, limit: usize) -> Result<()> {
    let database = ctx.open_database()?;
    let readings = database.list_vitals(Some(&ctx.user), Some(limit))?;
    ctx.print(&readings)
}

pub fn handle_thresholds_command(ctx: &AppContext) -> Result<()> {
    if ctx.json {
        return ctx.print_json(&ctx.config.thresholds);
    }
    println!("{}", tabled::Table::new(threshold_rows(&ctx.config.thresholds)));
    Ok(())
}
