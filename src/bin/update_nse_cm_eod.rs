use std::{error::Error, fs};

use bhav::db::{nse::lib_nse::HttpFetch, prod_db::ProdDb};
use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Archive directory, defaults to the production location
    #[arg(short, long)]
    base_dir: Option<String>,
}

/// Run this job every day after 18:30 IST, once the bhavcopy is published.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut archive = ProdDb::nse_cm_eod();
    if let Some(base_dir) = args.base_dir {
        archive.base_dir = base_dir;
    }
    fs::create_dir_all(&archive.base_dir)?;
    archive.sync(&HttpFetch::new())?;
    info!("done");
    Ok(())
}
