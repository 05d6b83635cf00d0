use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use tempfile::TempPath;

/// File name prefix shared by every artifact this daemon creates
pub const ARTIFACT_PREFIX: &str = "lagunacam-";

/// Content of an artifact file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// Raw H.264 elementary stream straight from the camera
    RawVideo,
    /// MP4 container produced by the transcoder
    EncodedVideo,
}

impl ArtifactFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactFormat::RawVideo => "h264",
            ArtifactFormat::EncodedVideo => "mp4",
        }
    }
}

/// A temporary file owned by exactly one pipeline stage
///
/// Not `Clone`: handing an artifact to the next stage moves it. The file is
/// removed when the artifact is dropped; [`Artifact::discard`] does the same
/// but reports failures to the log.
#[derive(Debug)]
pub struct Artifact {
    path: TempPath,
    format: ArtifactFormat,
}

impl Artifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ArtifactFormat {
        self.format
    }

    /// Delete the backing file, best-effort
    ///
    /// A file that is already gone counts as deleted. Any other failure is
    /// logged and swallowed.
    pub fn discard(self) {
        let path = self.path.to_path_buf();
        match self.path.close() {
            Ok(()) => debug!("🗑️  Deleted artifact {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Artifact {} was already removed", path.display())
            }
            Err(e) => warn!("Failed to delete artifact {}: {}", path.display(), e),
        }
    }
}

/// Allocates uniquely named artifacts in one directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the system temporary directory
    pub fn system() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create an empty, uniquely named file for `format`
    pub fn allocate(&self, format: ArtifactFormat) -> io::Result<Artifact> {
        let suffix = format!(".{}", format.extension());
        let file = tempfile::Builder::new()
            .prefix(ARTIFACT_PREFIX)
            .suffix(&suffix)
            .tempfile_in(&self.dir)?;

        let path = file.into_temp_path();
        debug!("Allocated {:?} artifact {}", format, path.display());
        Ok(Artifact { path, format })
    }

    /// Paths of prefixed files currently in the store directory
    pub fn list_artifacts(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for entry in walkdir::WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
        {
            let entry = entry
                .with_context(|| format!("Failed to read artifact directory: {}", self.dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let is_ours = entry
                .file_name()
                .to_str()
                .map(|name| name.starts_with(ARTIFACT_PREFIX))
                .unwrap_or(false);
            if is_ours {
                found.push(entry.into_path());
            }
        }
        Ok(found)
    }

    /// Remove artifacts left behind by a previous process
    ///
    /// Returns the number of files removed. Individual delete failures are
    /// logged and skipped.
    pub fn sweep_orphans(&self) -> Result<usize> {
        info!("🔍 Checking for orphaned artifacts in {}...", self.dir.display());

        let mut cleaned = 0;
        for path in self.list_artifacts()? {
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!("🗑️  Deleted orphaned artifact: {}", path.display());
                    cleaned += 1;
                }
                Err(e) => warn!("Failed to delete orphaned artifact {}: {}", path.display(), e),
            }
        }

        if cleaned == 0 {
            debug!("No orphaned artifacts found");
        }
        Ok(cleaned)
    }
}
