use anyhow::{Context, Result};
use aussie_os_app::config::{default_config_path, AppConfig};
use aussie_os_app::repl::{self, Interrupt};
use aussie_os_app::boot;
use aussie_os_interfaces::TerminalInterface;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn config_path() -> Result<PathBuf> {
    let mut args = std::env::args().skip(1);
    match (args.next().as_deref(), args.next()) {
        (None, _) => Ok(default_config_path()),
        (Some("--config"), Some(path)) => Ok(PathBuf::from(path)),
        (Some(other), _) => anyhow::bail!("Unexpected argument '{}'. Usage: aussie-os [--config <file>]", other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let path = config_path()?;
    let config = AppConfig::load(&path)?;

    let filter = EnvFilter::try_new(config.effective_log_level())
        .with_context(|| format!("Invalid log level '{}'", config.effective_log_level()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("Loaded configuration from {:?}", path);

    let mut kernel = boot(config).await?;
    kernel.start_background();

    let terminal = TerminalInterface::default();
    let interrupts = async {
        while tokio::signal::ctrl_c().await.is_ok() {
            match repl::interrupt(&kernel) {
                Interrupt::Stopped => tracing::info!("Interrupt received, stopped the current turn"),
                Interrupt::Exit => break,
            }
        }
    };

    let (result, interrupted) = tokio::select! {
        result = repl::run(&kernel, &terminal) => (result, false),
        _ = interrupts => (Ok(()), true),
    };

    kernel.shutdown();
    if interrupted {
        tracing::info!("Interrupted at the prompt, exiting");
        // The blocked stdin read would otherwise hold up runtime shutdown.
        std::process::exit(0);
    }
    result
}
