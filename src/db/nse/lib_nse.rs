use std::{
    fs::{self, File},
    io,
    path::Path,
};

use reqwest::{
    blocking::Client,
    header::{UPGRADE_INSECURE_REQUESTS, USER_AGENT},
    StatusCode,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("download failed with status {0}")]
    Status(StatusCode),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("bad zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("zip entry escapes the destination directory: {0}")]
    PathTraversal(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Byte-stream retrieval seam.  Production uses blocking HTTP, tests
/// substitute canned responses.
pub trait Fetch {
    fn fetch(&self, url: &str, file_path: &Path) -> Result<(), FetchError>;
}

pub struct HttpFetch {
    client: Client,
}

impl HttpFetch {
    pub fn new() -> HttpFetch {
        HttpFetch {
            client: Client::new(),
        }
    }
}

impl Default for HttpFetch {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetch for HttpFetch {
    fn fetch(&self, url: &str, file_path: &Path) -> Result<(), FetchError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36")
            .header(UPGRADE_INSECURE_REQUESTS, "1")
            .send()?;
        if response.status() != StatusCode::OK {
            return Err(FetchError::Status(response.status()));
        }
        let body = response.bytes()?;
        let dir = file_path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(dir)?;
        let mut out = File::create(file_path)?;
        io::copy(&mut body.as_ref(), &mut out)?;
        Ok(())
    }
}

/// Extract all members of the zip file `src` into the directory `dest`.
/// An entry whose name resolves outside `dest` fails the whole extraction.
pub fn unzip(src: &Path, dest: &Path) -> Result<(), ExtractError> {
    let file = File::open(src)?;
    let mut archive = zip::ZipArchive::new(file)?;
    fs::create_dir_all(dest)?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();
        let relative = match entry.enclosed_name() {
            Some(path) => path,
            None => return Err(ExtractError::PathTraversal(name)),
        };
        let out_path = dest.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&out_path)?;
            io::copy(&mut entry, &mut out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    fn write_zip(path: &Path, member: &str, contents: &[u8]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file(member, SimpleFileOptions::default()).unwrap();
        zip.write_all(contents).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn unzip_extracts_members() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("data.zip");
        write_zip(&src, "cm02JAN2024bhav.csv", b"SYMBOL,SERIES\n");
        let dest = dir.path().join("out");
        unzip(&src, &dest).unwrap();
        let extracted = dest.join("cm02JAN2024bhav.csv");
        assert_eq!(fs::read(extracted).unwrap(), b"SYMBOL,SERIES\n");
    }

    #[test]
    fn unzip_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("evil.zip");
        write_zip(&src, "../escape.csv", b"gotcha");
        let dest = dir.path().join("out");
        let err = unzip(&src, &dest).unwrap_err();
        assert!(matches!(err, ExtractError::PathTraversal(_)));
        assert!(!dir.path().join("escape.csv").exists());
    }

    #[ignore]
    #[test]
    fn fetch_live_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tmp.zip");
        HttpFetch::new()
            .fetch(
                "https://archives.nseindia.com/content/historical/EQUITIES/2024/JAN/cm02JAN2024bhav.csv.zip",
                &dest,
            )
            .unwrap();
        assert!(dest.metadata().unwrap().len() > 1024);
    }
}
