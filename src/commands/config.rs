use anyhow::{Context, Result};

use crate::cli::ConfigAction;
use crate::commands::AppContext;
use crate::config::Config;

pub fn handle_config_action(ctx: &AppContext, action: ConfigAction) -> Result<()> {
    let path = &ctx.config_path;

    match action {
        ConfigAction::Init => {
            Config::default().save_to(path)
                .context("Failed to initialize config")?;
            ctx.print_status(&format!("Configuration initialized at: {}", path.display()));
        }
        ConfigAction::Show => {
            if ctx.json {
                ctx.print_json(&ctx.config)?;
            } else {
                let toml_str = toml::to_string_pretty(&ctx.config)
                    .context("Failed to serialize config")?;
                println!("Configuration ({})", path.display());
                println!("{}", toml_str);
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = ctx.config.clone();
            config.set_value(&key, &value)
                .context("Invalid configuration")?;
            config.save_to(path)
                .context("Failed to save config")?;
            ctx.print_status(&format!("Configuration updated: {} = {}", key, value));
        }
    }

    Ok(())
}
