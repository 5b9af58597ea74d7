use clap::Parser;
use tickshift::cli::{Cli, Commands};
use tickshift::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Initialize telemetry
    tickshift::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Serve(args) => {
            tracing::info!("Starting replay server");
            args.execute(&config).await?;
        }
        Commands::Instruments(args) => {
            args.execute(&config)?;
        }
        Commands::Status => {
            println!("tickshift status");
            println!("  Mode: Simulated trading");
            println!("  Status: Not running");
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Server: ws://{}", config.server.bind);
            println!(
                "  Dataset: {} ({})",
                config.replay.data_path.display(),
                config.replay.symbol
            );
            println!(
                "  Session: {} ticks/bar, {}/batch, {}ms base interval",
                config.session.ticks_per_bar,
                config.session.batch_size,
                config.session.base_interval_ms
            );
            println!(
                "  Store: enabled={} dir={}",
                config.store.enabled,
                config.store.output_dir.display()
            );
        }
    }

    Ok(())
}
