mod domain;
mod infrastructure;

use crate::domain::settings::SettingsService;
use crate::infrastructure::bluetooth::address::BdAddr;
use crate::infrastructure::bluetooth::connection::BusSession;
use crate::infrastructure::bluetooth::service::{ProgramOutcome, ProgrammingConfig};
use crate::infrastructure::bluetooth::transport::Endpoints;
use crate::infrastructure::bluetooth::ProgrammingService;
use crate::infrastructure::logging;
use anyhow::Result;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

/// Program IR buttons of a BLE remote through BlueZ. The remote must
/// already be paired and connected; it stays connected afterwards.
#[derive(Parser, Debug)]
#[command(name = "ble-ir-programmer", version)]
struct Cli {
    /// Bluetooth address of the remote, e.g. E8:DF:24:50:C1:E4
    #[arg(required_unless_present = "write_default_config")]
    address: Option<BdAddr>,

    /// Settings file (default: <config dir>/ble-ir-programmer/settings.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON file with the code table to program instead of the configured one
    #[arg(long)]
    codes: Option<PathBuf>,

    /// Adapter object path, e.g. /org/bluez/hci1
    #[arg(long)]
    adapter: Option<String>,

    /// Resolve the characteristics and show the plan without writing
    #[arg(long)]
    dry_run: bool,

    /// Write the current settings to the settings file and exit
    #[arg(long)]
    write_default_config: bool,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Diagnostics, usage and help all go to stdout
            println!("{}", err.render());
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("Programming failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings_service = match cli.config {
        Some(path) => SettingsService::open(path)?,
        None => SettingsService::new()?,
    };
    if let Some(codes) = &cli.codes {
        settings_service.load_code_table(codes)?;
    }
    if let Some(adapter) = cli.adapter {
        settings_service.get_mut().adapter_path = adapter;
    }

    if cli.write_default_config {
        settings_service.save()?;
        println!("Settings written to {}", settings_service.path().display());
        return Ok(());
    }

    let settings = settings_service.get().clone();
    let mut log_settings = settings.log_settings.clone();
    log_settings.level = logging::effective_level(&log_settings.level, cli.verbose);
    let _log_guard = logging::init_logger(&log_settings)?;

    let address = cli
        .address
        .ok_or_else(|| anyhow::anyhow!("Missing Bluetooth address"))?;
    let device_path = address.device_path(&settings.adapter_path);
    info!("Programming remote {}", address);

    let bus = BusSession::connect(settings.write_timeout())?;
    let service = ProgrammingService::new(
        bus,
        ProgrammingConfig {
            uuids: settings.characteristics,
            timing: settings.timing,
            write_timeout: settings.write_timeout(),
            code_table: settings.code_table.clone(),
            dry_run: cli.dry_run,
        },
    );

    let interrupt = service.interrupt();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current write");
            interrupt.trigger();
        }
    });

    match service.program(&device_path).await? {
        ProgramOutcome::Programmed { endpoints, report } => {
            print_endpoints(&endpoints);
            println!(
                "Programmed {} code(s) with {} writes in {:.1?}",
                report.entries, report.writes, report.elapsed
            );
            println!("Programming complete, BlueZ keeps the remote connected");
        }
        ProgramOutcome::DryRun { endpoints } => {
            print_endpoints(&endpoints);
            for (i, entry) in settings.code_table.iter().enumerate() {
                println!(
                    "{:>3}. key {} value {} bytes {}",
                    i + 1,
                    hex::encode(&entry.key),
                    entry.value.len(),
                    entry.name
                );
            }
            println!(
                "Dry run, nothing written (a real run waits about {:?})",
                settings.timing.total_for(settings.code_table.len())
            );
        }
    }

    Ok(())
}

fn print_endpoints(endpoints: &Endpoints) {
    println!("START/STOP: {}", endpoints.startstop.path);
    println!("KEY:        {}", endpoints.key.path);
    println!("VALUE:      {}", endpoints.value.path);
}
