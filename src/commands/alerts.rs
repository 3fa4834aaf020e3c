use anyhow::Result;

use crate::cli::AlertAction;
use crate::commands::AppContext;

pub fn handle_alert_action(ctx: &AppContext, action: AlertAction) -> Result<()> {
    let database = ctx.open_database()?;

    match action {
        AlertAction::List { unread, limit } => {
            let alerts = database.list_alerts(Some(&ctx.user), unread, Some(limit))?;
            ctx.print(&alerts)?;
        }
        AlertAction::Read { id: Some(id), .. } => {
            if !database.mark_read(&id)? {
                anyhow::bail!("Alert not found: {}", id);
            }
            ctx.print_status(&format!("Alert {} marked as read", id));
        }
        AlertAction::Read { id: None, .. } => {
            let updated = database.mark_all_read(&ctx.user)?;
            ctx.print_status(&format!("{} alert(s) marked as read", updated));
        }
        AlertAction::Attend { id } => {
            if !database.mark_attended(&id)? {
                anyhow::bail!("Alert not found: {}", id);
            }
            ctx.print_status(&format!("Alert {} marked as attended", id));
        }
        AlertAction::Delete { id: Some(id), .. } => {
            if !database.delete_alert(&id)? {
                anyhow::bail!("Alert not found: {}", id);
            }
            ctx.print_status(&format!("Alert {} deleted", id));
        }
        AlertAction::Delete { id: None, .. } => {
            let deleted = database.delete_read_alerts(&ctx.user)?;
            ctx.print_status(&format!("{} read alert(s) deleted", deleted));
        }
        AlertAction::Count => {
            let count = database.unread_count(&ctx.user)?;
            if ctx.json {
                ctx.print_json(&serde_json::json!({ "user_id": ctx.user, "unread": count }))?;
            } else {
                println!("{} unread alert(s) for {}", count, ctx.user);
            }
        }
    }

    Ok(())
}

pub fn handle_sos_command(ctx: &AppContext, message: &str) -> Result<()> {
    let mut monitor = ctx.monitor()?;
    let related = monitor.database().latest_vitals(&ctx.user)?.map(|v| v.id);
    let alert = monitor.raise_sos(&ctx.user, message, related.as_deref())?;

    if ctx.json {
        return ctx.print_json(&alert);
    }
    println!("SOS alert {} raised for {}.", alert.id, alert.user_id);
    Ok(())
}
