use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::ci::models::{BuildState, ProjectSpec};
use crate::errors::ConfigError;

/// Process-wide settings, built once at startup and passed down by handle.
#[derive(Debug, Clone)]
pub struct Settings {
    pub addr: String,
    pub config_path: PathBuf,
    pub badge_dir: PathBuf,
    /// Parent of every project's working directory.
    pub workspace_dir: PathBuf,
    pub shell: String,
    pub secret: SharedSecret,
}

impl Settings {
    /// Badge files that should be in `badge_dir` but are not.
    pub fn missing_badges(&self) -> Vec<&'static str> {
        BuildState::ALL
            .iter()
            .map(|state| state.badge_file())
            .filter(|file| !self.badge_dir.join(file).is_file())
            .collect()
    }
}

/// Token that authorizes build triggers.
///
/// Compared through SHA-256 digests so the comparison time does not depend
/// on how much of the candidate matches. Never printed.
#[derive(Clone)]
pub struct SharedSecret {
    digest: [u8; 32],
}

impl SharedSecret {
    pub fn new(secret: &str) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        Ok(Self {
            digest: Sha256::digest(secret.as_bytes()).into(),
        })
    }

    pub fn matches(&self, candidate: &str) -> bool {
        let candidate: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        self.digest
            .iter()
            .zip(candidate.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

/// Load the project file: a map of project name to its scripts.
///
/// `.toml` files are read as TOML, anything else as JSON.
pub fn load_projects(path: &Path) -> Result<BTreeMap<String, ProjectSpec>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_projects(path, &content)
}

fn parse_projects(path: &Path, content: &str) -> Result<BTreeMap<String, ProjectSpec>, ConfigError> {
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let parsed = if is_toml {
        toml::from_str(content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(content).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}
