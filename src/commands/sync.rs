use anyhow::Result;
use std::path::Path;

use crate::commands::AppContext;
use crate::sync::ExportImportManager;

pub fn handle_export_command(ctx: &AppContext, path: &Path, csv: bool, all_users: bool) -> Result<()> {
    let database = ctx.open_database()?;
    let manager = ExportImportManager::new(&database);
    let user = if all_users { None } else { Some(ctx.user.as_str()) };

    if csv {
        manager.export_to_csv(path, user)?;
        ctx.print_status(&format!("CSV files written to {}", path.display()));
    } else {
        let data = manager.export_to_json(path, user)?;
        ctx.print_status(&format!(
            "Exported {} reading(s) and {} alert(s) to {}",
            data.vital_signs.len(),
            data.alerts.len(),
            path.display()
        ));
    }
    Ok(())
}

pub fn handle_import_command(ctx: &AppContext, path: &Path) -> Result<()> {
    let database = ctx.open_database()?;
    let result = ExportImportManager::new(&database).import_from_json(path)?;

    for error in &result.errors {
        tracing::error!("{}", error);
    }

    if ctx.json {
        return ctx.print_json(&result);
    }
    println!(
        "Imported {} reading(s) and {} alert(s); {} duplicate(s) skipped, {} error(s).",
        result.vital_signs_imported,
        result.alerts_imported,
        result.duplicates_skipped,
        result.errors.len()
    );
    Ok(())
}
