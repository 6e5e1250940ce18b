use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use handscan_core::ScanMode;
use handscan_hardware::mock::{MockReader, MockReaderHandle};
use handscan_session::{InventoryState, Session, SessionConfig};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

/// Address given to the simulated reader.
const DEMO_ADDRESS: &str = "00:A0:C6:01:02:03";

/// Longest wait for the dispatcher to process a simulated trigger.
const DISPATCH_DEADLINE: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "handscan")]
#[command(about = "Drive a handheld RFID reader session against a simulated reader")]
#[command(version)]
#[command(long_about = "Runs a scripted reader session: discover, connect, configure, \
pull the trigger while tags are in the field, release and disconnect. Every outward \
notification is printed to stdout as one JSON object per line; logs go to stderr.")]
struct Args {
    /// Path to a JSON session configuration (HANDSCAN_* variables override it)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Name of the simulated reader
    #[arg(short, long, default_value = "RFD8500")]
    device: String,

    /// Scan mode to apply after connecting (RFID or BARCODE)
    #[arg(short, long, default_value = "RFID")]
    mode: ScanMode,

    /// Transmit power index to apply after connecting
    #[arg(short, long)]
    power: Option<u16>,

    /// Tag identifiers brought into the field while the trigger is held
    #[arg(short, long, value_delimiter = ',', default_value = "E2001,E2002")]
    tags: Vec<String>,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// Print the effective session configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = SessionConfig::load(args.config.as_deref())
        .context("Failed to load session configuration")?;

    if args.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    init_logging(&args);
    info!("Starting handscan v{}", env!("CARGO_PKG_VERSION"));

    let (driver, handle) = MockReader::new();
    handle.add_device(&args.device, DEMO_ADDRESS);

    let session = Session::builder(driver).with_config(config).build()?;
    let mut notifications = session.notifications();
    let printer = tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(notification) => match notification.to_json() {
                    Ok(json) => println!("{json}"),
                    Err(e) => error!(error = %e, "Failed to encode notification"),
                },
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Notifications lost"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = run_script(&session, &handle, &args).await;

    let stats = session.stats().await;
    info!(
        starts = stats.inventory_starts,
        stops = stats.inventory_stops,
        emitted = stats.notifications_emitted,
        faults = stats.faults_reported,
        "Session finished"
    );
    session.shutdown().await;
    printer.await?;

    result
}

async fn run_script(session: &Session, handle: &MockReaderHandle, args: &Args) -> Result<()> {
    let devices = session.discover().await?;
    info!(count = devices.len(), "Readers discovered");
    for device in &devices {
        debug!(name = %device.name, address = %device.address, "Reader");
    }

    let name = session.connect(&args.device).await?;
    info!(device = %name, "Connected");

    let mode = session.set_scan_mode(args.mode).await?;
    info!(mode = %mode.value(), applied = mode.is_applied(), "Scan mode");

    if let Some(power) = args.power {
        let ack = session.set_power(power).await?;
        info!(power = ack.value(), applied = ack.is_applied(), "Transmit power");
    }

    handle.press_trigger();
    wait_for_state(session, InventoryState::Scanning).await?;

    for tag in &args.tags {
        handle.read_tags(&[tag.as_str()])?;
    }

    handle.release_trigger();
    wait_for_state(session, InventoryState::Idle).await?;

    session.disconnect(&name).await?;
    info!(device = %name, "Disconnected");
    Ok(())
}

async fn wait_for_state(session: &Session, state: InventoryState) -> Result<()> {
    let reached = tokio::time::timeout(DISPATCH_DEADLINE, async {
        while session.inventory_state().await != state {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    if reached.is_err() {
        bail!("Reader did not reach {state} within {DISPATCH_DEADLINE:?}");
    }
    Ok(())
}

fn init_logging(args: &Args) {
    use tracing_subscriber::EnvFilter;

    let level = if args.verbose {
        "debug"
    } else if args.quiet {
        "error"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "handscan={level},handscan_session={level},handscan_hardware={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
