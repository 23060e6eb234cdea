//! Proving stack configuration.

use std::path::{Path, PathBuf};

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::circuit::MAX_PUBLIC_SIGNALS;
use crate::error::{Error, Result};

/// Per-type circuit artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Wasm,
    Zkey,
    VerifyingKey,
}

impl Artifact {
    fn suffix(&self) -> &'static str {
        match self {
            Artifact::Wasm => "wasm",
            Artifact::Zkey => "zkey",
            Artifact::VerifyingKey => "vkey.json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackConfig {
    /// Directory holding `circuit_<type id>.{wasm,zkey,vkey.json}`.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Public signal limit enforced when validating circuits.
    #[serde(default = "default_max_public_signals")]
    pub max_public_signals: usize,

    /// Signature used for circuit inputs when the caller does not pick one.
    #[serde(default)]
    pub default_signature_index: usize,
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_max_public_signals() -> usize {
    MAX_PUBLIC_SIGNALS
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: default_artifacts_dir(),
            max_public_signals: default_max_public_signals(),
            default_signature_index: 0,
        }
    }
}

impl StackConfig {
    /// Load and validate a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the config against protocol limits.
    pub fn validate(&self) -> Result<()> {
        if self.max_public_signals == 0 || self.max_public_signals > MAX_PUBLIC_SIGNALS {
            return Err(Error::Serialization(format!(
                "max_public_signals must be in [1, {MAX_PUBLIC_SIGNALS}], got {}",
                self.max_public_signals
            )));
        }
        Ok(())
    }

    /// Path of one artifact of a registered type.
    pub fn artifact_path(&self, type_id: &BigUint, artifact: Artifact) -> PathBuf {
        self.artifacts_dir
            .join(format!("circuit_{type_id}.{}", artifact.suffix()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let c: StackConfig = serde_json::from_str(r#"{"artifacts_dir": "/tmp/zk"}"#).unwrap();
        assert_eq!(c.artifacts_dir, PathBuf::from("/tmp/zk"));
        assert_eq!(c.max_public_signals, 256);
        assert_eq!(c.default_signature_index, 0);
        assert_eq!(serde_json::from_str::<StackConfig>("{}").unwrap(), StackConfig::default());
    }

    #[test]
    fn test_artifact_paths() {
        let c = StackConfig::default();
        assert_eq!(
            c.artifact_path(&BigUint::from(778u32), Artifact::VerifyingKey),
            PathBuf::from("artifacts/circuit_778.vkey.json")
        );
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("zkcred-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"max_public_signals": 300}"#).unwrap();
        assert!(StackConfig::from_json_file(&path).is_err());
        std::fs::write(&path, r#"{"default_signature_index": 2}"#).unwrap();
        assert_eq!(StackConfig::from_json_file(&path).unwrap().default_signature_index, 2);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(
            StackConfig::from_json_file(&path).unwrap_err().kind(),
            crate::error::ErrorKind::Io
        );
    }
}
