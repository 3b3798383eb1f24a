//! Configuration loading from disk.

use std::fmt;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::defaults::baseline;
use crate::config::merge::{self, Overlay};
use crate::config::snapshot::Snapshot;
use crate::config::validation::Issues;

/// Accepted serialized forms of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Json,
    Toml,
}

impl Format {
    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => f.write_str("JSON"),
            Format::Toml => f.write_str("TOML"),
        }
    }
}

/// Line and column (1-based) of a syntax error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input is not well-formed in its format. Nothing was merged.
    #[error("{format} parse error{}: {message}", at(.location))]
    Parse {
        format: Format,
        location: Option<Location>,
        message: String,
    },

    /// Schema and domain issues found while resolving.
    #[error("Validation failed: {0}")]
    Validation(Issues),

    #[error("cannot tell the format of {0}; use a .json or .toml extension")]
    UnknownFormat(String),
}

fn at(location: &Option<Location>) -> String {
    location.map(|l| format!(" at {}", l)).unwrap_or_default()
}

impl ConfigError {
    pub(crate) fn from_json(e: serde_json::Error) -> Self {
        let location = (e.line() > 0).then(|| Location {
            line: e.line(),
            column: e.column(),
        });
        ConfigError::Parse {
            format: Format::Json,
            location,
            message: e.to_string(),
        }
    }

    pub(crate) fn from_toml(e: toml::de::Error, input: &str) -> Self {
        let location = e.span().map(|span| locate(input, span.start));
        ConfigError::Parse {
            format: Format::Toml,
            location,
            message: e.message().to_string(),
        }
    }

    /// The aggregated issues, when this is a validation failure.
    pub fn issues(&self) -> Option<&Issues> {
        match self {
            ConfigError::Validation(issues) => Some(issues),
            _ => None,
        }
    }
}

impl From<Issues> for ConfigError {
    fn from(issues: Issues) -> Self {
        ConfigError::Validation(issues)
    }
}

fn locate(input: &str, offset: usize) -> Location {
    let before = &input[..offset.min(input.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    Location { line, column }
}

/// Parse, merge onto the baseline, validate and freeze.
pub fn load_str(input: &str, format: Format) -> Result<Snapshot, ConfigError> {
    let overlay = Overlay::parse(input, format)?;
    let document = merge::resolve(&baseline(), &overlay)?;
    Ok(Snapshot::freeze(document)?)
}

/// Load and validate configuration from a JSON or TOML file.
pub fn load_path(path: &Path) -> Result<Snapshot, ConfigError> {
    let format = Format::from_path(path)
        .ok_or_else(|| ConfigError::UnknownFormat(path.display().to_string()))?;
    load_path_as(path, format)
}

/// Load a file in an explicit format, ignoring its extension.
pub fn load_path_as(path: &Path, format: Format) -> Result<Snapshot, ConfigError> {
    let content = fs::read_to_string(path)?;
    let snapshot = load_str(&content, format)?;
    tracing::debug!(path = %path.display(), %format, "Configuration loaded");
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("mesh.json")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("/etc/mesh/config.TOML")), Some(Format::Toml));
        assert_eq!(Format::from_path(Path::new("config.yaml")), None);
        assert_eq!(Format::from_path(Path::new("config")), None);
    }

    #[test]
    fn test_json_parse_error_has_location() {
        let err = load_str("{\n  \"listen\": {\"port\": }\n}", Format::Json).unwrap_err();
        match err {
            ConfigError::Parse { format, location, .. } => {
                assert_eq!(format, Format::Json);
                assert_eq!(location.unwrap().line, 2);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_toml_parse_error_has_location() {
        let err = load_str("[listen]\nport = = 1\n", Format::Toml).unwrap_err();
        match &err {
            ConfigError::Parse { format, location, .. } => {
                assert_eq!(*format, Format::Toml);
                assert_eq!(location.unwrap().line, 2);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(err.to_string().starts_with("TOML parse error at line 2"));
    }

    #[test]
    fn test_validation_error_lists_every_issue() {
        let err = load_str(
            r#"{"listen": {"port": 70000}, "handshakes": {"try_interval": "abc"}}"#,
            Format::Json,
        )
        .unwrap_err();
        let issues = err.issues().unwrap();
        assert_eq!(issues.len(), 2);
        let message = err.to_string();
        assert!(message.contains("listen.port"));
        assert!(message.contains("handshakes.try_interval"));
    }

    #[test]
    fn test_load_path_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh.toml");
        fs::write(&path, "[tun]\nmtu = 1400\n").unwrap();

        let snapshot = load_path(&path).unwrap();
        assert_eq!(snapshot.document().tun.mtu, 1400);

        let unknown = dir.path().join("mesh.conf");
        fs::write(&unknown, "").unwrap();
        assert!(matches!(load_path(&unknown), Err(ConfigError::UnknownFormat(_))));
        assert!(load_path_as(&unknown, Format::Toml).is_ok());
    }

    #[test]
    fn test_locate() {
        let input = "a\nbc\ndef";
        assert_eq!(locate(input, 0), Location { line: 1, column: 1 });
        assert_eq!(locate(input, 3), Location { line: 2, column: 2 });
        assert_eq!(locate(input, 5), Location { line: 3, column: 1 });
    }
}
