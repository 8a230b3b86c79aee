use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uw_core::{Error, Result};

/// Provenance block shared by all artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    /// Producing tool.
    pub tool: String,
    /// Producing tool version.
    pub tool_version: String,
    /// Creation time; 0 in deterministic mode.
    pub created_unix_ms: u128,
    /// SHA-256 of input files, keyed by role.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs_sha256: BTreeMap<String, String>,
}

impl ArtifactMeta {
    /// Metadata stamped with the current time, or 0 when `deterministic`.
    pub fn new(deterministic: bool) -> Result<Self> {
        let created_unix_ms = if deterministic { 0 } else { now_unix_ms()? };
        Ok(Self {
            tool: "upcweight".to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            created_unix_ms,
            inputs_sha256: BTreeMap::new(),
        })
    }

    /// Record the digest of an input file under `role`.
    pub fn with_input(mut self, role: impl Into<String>, path: &Path) -> Result<Self> {
        self.inputs_sha256.insert(role.into(), sha256_file(path)?);
        Ok(self)
    }
}

fn now_unix_ms() -> Result<u128> {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::Validation(format!("system time error: {}", e)))?;
    Ok(d.as_millis())
}

/// Lower-case hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    h.finalize().iter().map(|b| format!("{:02x}", b)).collect()
}

/// Lower-case hex SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> Result<String> {
    Ok(sha256_hex(&std::fs::read(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn deterministic_meta() {
        let m = ArtifactMeta::new(true).unwrap();
        assert_eq!(m.created_unix_ms, 0);
        assert_eq!(m.tool, "upcweight");
        assert!(ArtifactMeta::new(false).unwrap().created_unix_ms > 0);
    }

    #[test]
    fn input_digest() {
        let path = std::env::temp_dir().join(format!("uw_meta_{}.txt", std::process::id()));
        std::fs::write(&path, b"abc").unwrap();
        let m = ArtifactMeta::new(true).unwrap().with_input("weights", &path).unwrap();
        assert_eq!(m.inputs_sha256["weights"], sha256_hex(b"abc"));
        std::fs::remove_file(&path).ok();
    }
}
