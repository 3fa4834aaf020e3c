// vitalcare: vital-sign monitoring with anomaly alerts
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vitalcare::cli::{Cli, Commands};
use vitalcare::commands::{
    handle_alert_action, handle_check_command, handle_config_action, handle_export_command,
    handle_history_command, handle_import_command, handle_record_command, handle_sos_command,
    handle_thresholds_command, AppContext,
};
use vitalcare::config::Config;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose when set
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => Config::default_path()?,
    };

    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    let ctx = AppContext::new(config, config_path, cli.user, cli.json);

    match cli.command {
        Commands::Record { vitals } => handle_record_command(&ctx, vitals)?,
        Commands::Check { vitals } => handle_check_command(&ctx, vitals)?,
        Commands::History { limit } => handle_history_command(&ctx, limit)?,
        Commands::Alerts { action } => handle_alert_action(&ctx, action)?,
        Commands::Sos { message } => handle_sos_command(&ctx, &message)?,
        Commands::Thresholds => handle_thresholds_command(&ctx)?,
        Commands::Export { path, csv, all_users } => {
            handle_export_command(&ctx, &path, csv, all_users)?
        }
        Commands::Import { path } => handle_import_command(&ctx, &path)?,
        Commands::NotifyTest => {
            ctx.notification_handler().send_test_notification()?;
            ctx.print_status("Test notification sent");
        }
        Commands::Config { action } => handle_config_action(&ctx, action)?,
    }

    Ok(())
}
