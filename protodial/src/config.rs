//! # Saved Files
//!
//! Plain text files the CLI reads so that long invocations don't have to be retyped.
//!
//! * **Import path lists**: one directory per line. Blank lines are skipped.
//! * **Connection profiles**: one `Key:value` entry per line.
//!
//! ```text
//! Hostname:api.example.com
//! Port:443
//! Metadata:authorization:Bearer t0k3n
//! Metadata:x-tenant:acme
//! ```
//!
//! `Metadata` entries are split at the first colon after the key, so values may contain
//! colons. Repeating a metadata key keeps the last value.
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read '{path}': '{source}'")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write '{path}': '{source}'")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Line {line}: {reason}")]
    Syntax { line: usize, reason: String },
}

/// Reads a newline-delimited list of import paths.
pub fn read_import_paths(path: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let contents = read(path)?;
    Ok(parse_import_paths(&contents))
}

fn parse_import_paths(contents: &str) -> Vec<PathBuf> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Connection settings saved to disk. Every entry is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub hostname: Option<String>,
    pub port: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl Profile {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        read(path)?.parse()
    }

    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        fs::write(path, self.to_string()).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl std::str::FromStr for Profile {
    type Err = ConfigError;

    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        let mut profile = Profile::default();

        for (idx, raw) in contents.lines().enumerate() {
            let line = idx + 1;
            let raw = raw.trim();

            if raw.is_empty() {
                continue;
            }

            let syntax = |reason: String| ConfigError::Syntax { line, reason };

            let (key, value) = raw
                .split_once(':')
                .ok_or_else(|| syntax(format!("expected 'Key:value', got '{raw}'")))?;

            match key.trim() {
                "Hostname" => profile.hostname = Some(value.trim().to_string()),
                "Port" => profile.port = Some(value.trim().to_string()),
                "Metadata" => {
                    let (name, value) = value.split_once(':').ok_or_else(|| {
                        syntax(format!("expected 'Metadata:<key>:<value>', got '{raw}'"))
                    })?;

                    let name = name.trim();
                    if name.is_empty() {
                        return Err(syntax("metadata key cannot be empty".to_string()));
                    }

                    profile
                        .metadata
                        .insert(name.to_string(), value.trim().to_string());
                }
                other => return Err(syntax(format!("unknown entry '{other}'"))),
            }
        }

        Ok(profile)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(hostname) = &self.hostname {
            writeln!(f, "Hostname:{hostname}")?;
        }
        if let Some(port) = &self.port {
            writeln!(f, "Port:{port}")?;
        }
        for (key, value) in &self.metadata {
            writeln!(f, "Metadata:{key}:{value}")?;
        }
        Ok(())
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}
