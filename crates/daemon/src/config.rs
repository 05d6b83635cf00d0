use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use crate::artifact::ArtifactStore;

/// Where finished videos are copied to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteTarget {
    /// SSH user on the remote host
    pub user: String,
    /// Remote host name or address
    pub host: String,
    /// Directory on the remote host, relative to the user's home unless absolute
    pub remote_dir: String,
    /// Leading part of every uploaded file name
    pub file_prefix: String,
}

impl Default for RemoteTarget {
    fn default() -> Self {
        Self {
            user: "stahl".to_string(),
            host: "10.35.0.182".to_string(),
            remote_dir: "temp/venedig".to_string(),
            file_prefix: "laboratorio_laguna_cam".to_string(),
        }
    }
}

/// Optional speed/quality flags for the transcoder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeOptions {
    /// x264 preset, e.g. "ultrafast"
    pub preset: Option<String>,
    /// Constant quantizer, 0 = lossless
    pub qp: Option<u32>,
}

/// How often the log file is rolled over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    Daily,
    Never,
}

/// Configuration for the capture daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Camera capture binary
    pub capture_bin: PathBuf,
    /// Transcoder binary
    pub transcode_bin: PathBuf,
    /// Secure-copy client
    pub upload_bin: PathBuf,
    /// Directory for temporary artifacts (system temp dir when unset)
    pub artifact_dir: Option<PathBuf>,
    /// Kill any external tool that runs longer than this (no limit when unset)
    pub tool_timeout_secs: Option<u64>,
    pub remote: RemoteTarget,
    pub transcode: TranscodeOptions,
    /// Directory for log files, created on startup
    pub log_dir: PathBuf,
    /// Log file name prefix
    pub log_file_prefix: String,
    pub log_rotation: LogRotation,
    /// Number of rotated log files to keep
    pub log_max_files: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl DaemonConfig {
    /// Create a default configuration matching the Raspberry Pi deployment
    pub fn default_config() -> Self {
        Self {
            capture_bin: PathBuf::from("/opt/vc/bin/raspivid"),
            transcode_bin: PathBuf::from("ffmpeg"),
            upload_bin: PathBuf::from("scp"),
            artifact_dir: None,
            tool_timeout_secs: None,
            remote: RemoteTarget::default(),
            transcode: TranscodeOptions::default(),
            log_dir: PathBuf::from("./logs"),
            log_file_prefix: "lagunacam".to_string(),
            log_rotation: LogRotation::Daily,
            log_max_files: 5,
        }
    }

    /// Load configuration from a file, or return defaults if path is None or file doesn't exist
    pub fn load_config(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default_config();

        if let Some(config_path) = path {
            if config_path.exists() {
                let content = std::fs::read_to_string(config_path)
                    .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

                // TOML by extension, JSON otherwise
                if config_path.extension().and_then(|s| s.to_str()) == Some("toml") {
                    config = toml::from_str(&content)
                        .with_context(|| format!("Failed to parse TOML config: {}", config_path.display()))?;
                } else {
                    config = serde_json::from_str(&content)
                        .with_context(|| format!("Failed to parse JSON config: {}", config_path.display()))?;
                }
            }
        }

        Ok(config)
    }

    pub fn artifact_store(&self) -> ArtifactStore {
        match &self.artifact_dir {
            Some(dir) => ArtifactStore::new(dir),
            None => ArtifactStore::system(),
        }
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = DaemonConfig::load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(cfg, DaemonConfig::default());

        let cfg = DaemonConfig::load_config(None).unwrap();
        assert_eq!(cfg.capture_bin, PathBuf::from("/opt/vc/bin/raspivid"));
        assert_eq!(cfg.log_max_files, 5);
        assert_eq!(cfg.tool_timeout(), None);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lagunacam.toml");
        std::fs::write(
            &path,
            r#"
transcode_bin = "/usr/local/bin/ffmpeg"
log_rotation = "minutely"
tool_timeout_secs = 600

[remote]
host = "ssh.example.net"

[transcode]
preset = "ultrafast"
qp = 0
"#,
        )
        .unwrap();

        let cfg = DaemonConfig::load_config(Some(&path)).unwrap();
        assert_eq!(cfg.transcode_bin, PathBuf::from("/usr/local/bin/ffmpeg"));
        assert_eq!(cfg.log_rotation, LogRotation::Minutely);
        assert_eq!(cfg.tool_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(cfg.remote.host, "ssh.example.net");
        assert_eq!(cfg.remote.user, "stahl");
        assert_eq!(cfg.transcode.preset.as_deref(), Some("ultrafast"));
        assert_eq!(cfg.transcode.qp, Some(0));
        assert_eq!(cfg.upload_bin, PathBuf::from("scp"));
    }

    #[test]
    fn test_json_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lagunacam.json");
        std::fs::write(
            &path,
            r#"{ "artifact_dir": "/var/tmp/cam", "remote": { "user": "cam", "remote_dir": "videos/" } }"#,
        )
        .unwrap();

        let cfg = DaemonConfig::load_config(Some(&path)).unwrap();
        assert_eq!(cfg.remote.user, "cam");
        assert_eq!(cfg.remote.remote_dir, "videos/");
        assert_eq!(cfg.artifact_store().dir(), Path::new("/var/tmp/cam"));
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(DaemonConfig::load_config(Some(&path)).is_err());
    }
}
