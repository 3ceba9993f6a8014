//! Artifact files named by content kind and timestamp.

use crate::models::{ContentKind, GenerationResult};
use crate::Result;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<kind>_<YYYYmmddHHMMSS>.<ext>`, with a numeric suffix if that name is taken.
    pub fn path_for(&self, kind: ContentKind, at: DateTime<Local>) -> PathBuf {
        let stem = format!("{}_{}", kind, at.format("%Y%m%d%H%M%S"));
        let mut path = self.dir.join(format!("{}.{}", stem, kind.extension()));
        let mut n = 1;
        while path.exists() {
            path = self
                .dir
                .join(format!("{}_{}.{}", stem, n, kind.extension()));
            n += 1;
        }
        path
    }

    pub fn write(&self, kind: ContentKind, result: &GenerationResult) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(kind, Local::now());
        fs::write(&path, result.as_bytes())?;
        tracing::info!("Saved {} output to {}", kind, path.display());
        Ok(path)
    }
}
