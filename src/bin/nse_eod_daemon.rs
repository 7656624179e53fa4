use std::{env, error::Error, fs, path::PathBuf};

use bhav::db::nse::{cm_eod_archive::NseCmEodArchive, lib_nse::HttpFetch};
use bhav::sched;
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Archive directory
    #[arg(short, long, default_value = "/opt/appdata/nse-cm-eod")]
    base_dir: String,

    /// Cron expression for the daily sync, seconds first
    #[arg(short, long, default_value = "0 0 13 * * *")]
    schedule: String,
}

/// Sync once at startup, then on schedule.  The trigger fires every day on
/// purpose; weekends are skipped inside the per-day loop, so multi-day gaps
/// after an outage heal on the very next fire.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    info!("NSE CM EOD archive mirror");

    let base_dir = bootstrap_dir(&args.base_dir);
    let archive = NseCmEodArchive::new(base_dir);
    let fetch = HttpFetch::new();

    if let Err(e) = archive.sync(&fetch) {
        error!("initial sync failed: {}", e);
    }
    sched::run_on_schedule(&args.schedule, || {
        if let Err(e) = archive.sync(&fetch) {
            error!("sync failed: {}", e);
        }
    })
}

/// Create the archive directory, falling back to a location under the
/// current working directory when the primary one is not usable.
fn bootstrap_dir(primary: &str) -> String {
    if fs::create_dir_all(primary).is_ok() {
        return primary.to_string();
    }
    let fallback = env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("appdata/nse-cm-eod");
    warn!(
        "failed to create {}, switching to {}",
        primary,
        fallback.display()
    );
    if let Err(e) = fs::create_dir_all(&fallback) {
        error!("failed to create {}: {}", fallback.display(), e);
    }
    fallback.to_string_lossy().into_owned()
}
