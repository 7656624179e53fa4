use std::{error::Error, fs, path::Path, thread, time::Duration};

use jiff::{civil::Date, ToSpan, Zoned};
use log::{error, info, warn};

use crate::db::nse::lib_nse::{unzip, Fetch};
use crate::is_weekend;

/// Anything smaller is a truncated download or a holiday placeholder,
/// never a real bhavcopy.
pub const MIN_FILE_SIZE: u64 = 1024;

/// Classification of one archive directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryClass {
    /// A well formed `YYYYMMDD.csv` file of viable size.
    DatedFile { date: Date },
    /// Recognized suffix but below [`MIN_FILE_SIZE`].  Deleted on the next
    /// pruning pass regardless of name shape or age.
    Undersized,
    /// Not a data file (temp files, foreign names, unparsable dates).
    Ignored,
}

/// Classify a directory entry by name and size alone.
pub fn classify(file_name: &str, size: u64) -> EntryClass {
    if !file_name.ends_with(".csv") {
        return EntryClass::Ignored;
    }
    if size < MIN_FILE_SIZE {
        return EntryClass::Undersized;
    }
    if file_name.len() != 12 {
        return EntryClass::Ignored;
    }
    match Date::strptime("%Y%m%d", &file_name[..8]) {
        Ok(date) => EntryClass::DatedFile { date },
        Err(_) => EntryClass::Ignored,
    }
}

/// Mirror of the NSE capital-market end-of-day bhavcopy files, one
/// `YYYYMMDD.csv` per trading day in a flat directory.  The directory is
/// the only state; the next day to download is always recomputed from it.
#[derive(Clone)]
pub struct NseCmEodArchive {
    pub base_dir: String,
    /// How far back to reach when the archive is empty.
    pub max_lookback_days: i32,
    /// Valid files older than this are retired.
    pub max_archive_keep_days: i32,
    /// Pause between successive requests to the NSE servers.
    pub request_delay: Duration,
}

impl NseCmEodArchive {
    pub fn new(base_dir: impl Into<String>) -> NseCmEodArchive {
        NseCmEodArchive {
            base_dir: base_dir.into(),
            max_lookback_days: 365,
            max_archive_keep_days: 1000,
            request_delay: Duration::from_secs(1),
        }
    }

    /// Return the csv filename for the day.  Does not check if the file exists.
    pub fn filename(&self, date: &Date) -> String {
        self.base_dir.to_owned() + "/" + &date.strftime("%Y%m%d").to_string() + ".csv"
    }

    /// Remote location of the zipped bhavcopy for the day, e.g.
    /// <https://archives.nseindia.com/content/historical/EQUITIES/2024/APR/cm01APR2024bhav.csv.zip>
    pub fn url(&self, date: &Date) -> String {
        let stamp = date.strftime("%d%b%Y").to_string().to_uppercase();
        format!(
            "https://archives.nseindia.com/content/historical/EQUITIES/{}/{}/cm{}bhav.csv.zip",
            &stamp[5..],
            &stamp[2..5],
            stamp
        )
    }

    /// Delete undersized files and files older than `max_archive_keep_days`.
    /// Best effort: every failure is logged and the walk continues.
    pub fn delete_old_files(&self) {
        self.delete_old_files_asof(Zoned::now().date())
    }

    pub fn delete_old_files_asof(&self, asof: Date) {
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!("cannot read archive directory {}: {}", self.base_dir, e);
                return;
            }
        };
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(e) => {
                    warn!("skipping {:?}: {}", entry.path(), e);
                    continue;
                }
            };
            if meta.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let to_delete = match classify(&name, meta.len()) {
                EntryClass::Undersized => true,
                EntryClass::DatedFile { date } => {
                    (asof - date).get_days() > self.max_archive_keep_days
                }
                EntryClass::Ignored => false,
            };
            if to_delete {
                match fs::remove_file(entry.path()) {
                    Ok(()) => info!("deleted {}", name),
                    Err(e) => error!("failed to delete {}: {}", name, e),
                }
            }
        }
    }

    /// Return the first day that still needs downloading: the day after the
    /// most recent valid file, or `max_lookback_days` ago if the archive has
    /// nothing newer.
    pub fn next_eod_date(&self) -> Result<Date, Box<dyn Error>> {
        self.next_eod_date_asof(Zoned::now().date())
    }

    pub fn next_eod_date_asof(&self, asof: Date) -> Result<Date, Box<dyn Error>> {
        let mut floor = asof.saturating_sub(self.max_lookback_days.days());
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(e) => {
                    warn!("skipping {:?}: {}", entry.path(), e);
                    continue;
                }
            };
            if meta.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let EntryClass::DatedFile { date } = classify(&name, meta.len()) {
                if date > floor {
                    floor = date;
                }
            }
        }
        Ok(floor.tomorrow()?)
    }

    /// Download and install the bhavcopy for one day.
    ///
    /// The zip lands in `tmp.zip`, is extracted into `tmp-unzip/`, and the
    /// expected member is renamed to its canonical `YYYYMMDD.csv` name.  The
    /// rename is the only way the canonical name appears, so readers never
    /// see a partial file.  A response without the expected member means no
    /// data was published for the day and is not an error.
    pub fn download_file(&self, date: Date, fetch: &dyn Fetch) -> Result<(), Box<dyn Error>> {
        let stamp = date.strftime("%d%b%Y").to_string().to_uppercase();
        let url = self.url(&date);
        info!("downloading {}", url);

        let zip_path = Path::new(&self.base_dir).join("tmp.zip");
        let unzip_dir = Path::new(&self.base_dir).join("tmp-unzip");
        let member_path = unzip_dir.join(format!("cm{}bhav.csv", stamp));

        // leftovers from a prior failed attempt
        let _ = fs::remove_file(&zip_path);
        let _ = fs::remove_dir_all(&unzip_dir);

        fetch.fetch(&url, &zip_path)?;
        if zip_path.exists() {
            unzip(&zip_path, &unzip_dir)?;
            if member_path.exists() {
                fs::rename(&member_path, self.filename(&date))?;
                info!("installed bhavcopy for {}", date);
            } else {
                info!("no bhavcopy published for {}", date);
            }
        }
        Ok(())
    }

    /// One full pass: prune, then walk the gap from the last valid day up to
    /// now, one day at a time, skipping weekends.  Failures leave the day as
    /// a gap for the next pass; nothing here is transactional because the
    /// next pass recomputes everything from the directory.
    pub fn sync(&self, fetch: &dyn Fetch) -> Result<(), Box<dyn Error>> {
        self.sync_asof(fetch, &Zoned::now())
    }

    pub fn sync_asof(&self, fetch: &dyn Fetch, now: &Zoned) -> Result<(), Box<dyn Error>> {
        info!("syncing NSE CM EOD archive in {}", self.base_dir);
        self.delete_old_files_asof(now.date());
        let mut day = self.next_eod_date_asof(now.date())?;
        while day.to_zoned(now.time_zone().clone())? < *now {
            if !is_weekend(&day) {
                if let Err(e) = self.download_file(day, fetch) {
                    error!("failed to download bhavcopy for {}: {}", day, e);
                }
            }
            day = day.tomorrow()?;
            thread::sleep(self.request_delay);
        }
        Ok(())
    }
}
