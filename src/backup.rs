use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::score::ScoreMap;

/// One mirrored save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    pub username: String,
    pub timestamp: DateTime<Utc>,
    pub scores: ScoreMap,
}

/// Append-only JSON array of every save. Not authoritative; the database is.
#[derive(Debug, Clone)]
pub struct JsonBackup {
    path: PathBuf,
}

impl JsonBackup {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mirrored entries, oldest first. A missing file reads as empty.
    pub fn entries(&self) -> Result<Vec<BackupEntry>, Error> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(fs::File::open(&self.path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn append(
        &self,
        username: &str,
        scores: &ScoreMap,
        timestamp: DateTime<Utc>,
    ) -> Result<(), Error> {
        let mut entries = self.entries()?;
        entries.push(BackupEntry {
            username: username.to_string(),
            timestamp,
            scores: scores.clone(),
        });

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        // write next to the target and swap in, so a failed write leaves the old file intact
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(fs::File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, &entries)?;
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
