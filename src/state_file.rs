//! Small JSON state files kept in the data directory.
//!
//! Holds the UI-layer state that survives restarts (list filter and
//! selection, theme preference). Writes go to a temp file and are renamed
//! into place, so an interrupted write never leaves a half-written file.
//! A file that no longer parses is removed and treated as absent.

use crate::error::Result;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// Reads and writes named JSON files inside one directory.
#[derive(Debug, Clone)]
pub struct StateDir {
    /// Directory where state files are stored.
    pub dir: PathBuf,
}

impl StateDir {
    /// Open a state directory, creating it if it does not exist.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Load and parse a state file.
    ///
    /// Returns `Ok(None)` when the file does not exist. A corrupt file is
    /// deleted and also reported as `None`.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.path(name);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        match serde_json::from_str(&contents) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                log::warn!("Corrupt state file {}: {} -- removing", path.display(), e);
                let _ = fs::remove_file(&path);
                Ok(None)
            }
        }
    }

    /// Serialize `value` and atomically replace the named file.
    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        write_atomic(&self.path(name), json.as_bytes())
    }
}

fn is_gz(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

/// Write to `<path>.tmp` first and rename on success.
fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_dest = dest.with_extension(format!(
        "{}.tmp",
        dest.extension().and_then(|e| e.to_str()).unwrap_or("")
    ));

    let result = (|| -> Result<()> {
        fs::write(&tmp_dest, bytes)?;
        fs::rename(&tmp_dest, dest)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_dest);
    }

    result
}

/// Write a text payload to `path`, gzip-compressed when it ends in `.gz`.
pub fn write_text(path: &Path, text: &str) -> Result<()> {
    if is_gz(path) {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes())?;
        let bytes = encoder.finish()?;
        write_atomic(path, &bytes)
    } else {
        write_atomic(path, text.as_bytes())
    }
}

/// Read a text payload from `path` (handles `.gz` transparently).
pub fn read_text(path: &Path) -> Result<String> {
    if is_gz(path) {
        let file = fs::File::open(path)?;
        let mut reader = BufReader::new(GzDecoder::new(BufReader::new(file)));
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        Ok(contents)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}
