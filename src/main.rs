//! MC2000 Map - Denon MC2000 controller mapping
//!
//! Runs the mapping engine against the controller's MIDI ports with the
//! in-memory console host.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mc2000_map::config::AppConfig;
use mc2000_map::control_mapping::{load_default_controls, ControlMap};
use mc2000_map::device::{self, ControllerDevice};
use mc2000_map::engine::Engine;
use mc2000_map::host::ConsoleHost;
use mc2000_map::leds::LED_TABLE;

/// MC2000 Map - drive a DJ host from the Denon MC2000
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI ports
    #[arg(long)]
    list_ports: bool,

    /// Print the control and LED tables
    #[arg(long)]
    test_mappings: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    info!("Starting MC2000 Map v{}...", env!("CARGO_PKG_VERSION"));

    if args.list_ports {
        device::list_ports_formatted();
        return Ok(());
    }

    if args.test_mappings {
        test_control_mappings()?;
        return Ok(());
    }

    info!("Configuration file: {}", args.config);
    let config = AppConfig::load(&args.config).await?;

    let controls = match &config.controls_csv {
        Some(path) => ControlMap::load_from_path(path).await?,
        None => load_default_controls()?,
    };

    run_app(config, controls, shutdown_signal()).await?;

    info!("MC2000 Map shutdown complete");
    Ok(())
}

async fn run_app(
    config: AppConfig,
    controls: ControlMap,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<()> {
    let mut engine = Engine::new(ConsoleHost::new(), controls, config.engine_settings())
        .context("Mapping tables are inconsistent")?;
    info!("Loaded {} controls", engine.controls().len());

    let mut device = ControllerDevice::new(&config);
    device.connect()?;
    let mut frames = device
        .take_frame_receiver()
        .context("Frame receiver already taken")?;

    engine.open();
    device.send_leds(&engine.take_outgoing());
    info!("✅ MC2000 ready");

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(frame) = frames.recv() => {
                debug!("Frame after {:?} in queue", frame.timestamp.elapsed());
                engine.handle_frame(&frame.raw_data);
                device.send_leds(&engine.take_outgoing());
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }
    }

    info!("Shutting down...");
    engine.close();
    device.send_leds(&engine.take_outgoing());
    device.disconnect();

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}

fn test_control_mappings() -> Result<()> {
    use colored::*;

    println!("\n{}", "=== MC2000 Control Mappings ===".bold().cyan());

    let controls = load_default_controls()?;
    println!(
        "\n  Total controls: {}",
        controls.len().to_string().green()
    );

    println!("\n{}", "Controls:".bold());
    for mapping in controls.mappings() {
        println!(
            "  {:<12} {:<14} {}",
            mapping.group.yellow(),
            mapping.control_id.bright_white(),
            mapping.message.green()
        );
    }

    println!("\n{}", "LEDs:".bold());
    for (name, address) in LED_TABLE {
        println!("  {:<14} {}", name.bright_white(), address.to_string().green());
    }

    let _ = mc2000_map::leds::LedRegistry::new()?;
    println!("\n{}", "✅ Every LED the feedback rules use resolves".green().bold());

    Ok(())
}
