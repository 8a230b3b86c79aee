use std::path::{Path, PathBuf};

use serde::Serialize;
use uw_core::{ArtifactSink, Result};

/// Writes each artifact to `<dir>/<name>.json` as pretty JSON.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl JsonFileSink {
    /// Sink rooted at `dir` (created on first write).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), written: Vec::new() }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Serialize and write any artifact.
    pub fn write_artifact<T: Serialize>(&mut self, name: &str, artifact: &T) -> Result<PathBuf> {
        self.write(name, &serde_json::to_value(artifact)?)?;
        Ok(self.dir.join(format!("{name}.json")))
    }
}

impl ArtifactSink for JsonFileSink {
    fn write(&mut self, name: &str, value: &serde_json::Value) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{name}.json"));
        std::fs::write(&path, serde_json::to_string_pretty(value)?)?;
        tracing::info!(path = %path.display(), "artifact written");
        self.written.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_named_files() {
        let dir = std::env::temp_dir().join(format!("uw_sink_{}", std::process::id()));
        let mut sink = JsonFileSink::new(&dir);
        let path = sink.write_artifact("closure_full", &serde_json::json!({"ok": true})).unwrap();
        assert_eq!(path, dir.join("closure_full.json"));
        let back: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(back["ok"], true);
        assert_eq!(sink.written().len(), 1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn surfaces_io_errors() {
        let file = std::env::temp_dir().join(format!("uw_sink_file_{}", std::process::id()));
        std::fs::write(&file, b"x").unwrap();
        // A regular file cannot be used as the output directory.
        let mut sink = JsonFileSink::new(&file);
        assert!(sink.write("a", &serde_json::json!(1)).is_err());
        std::fs::remove_file(&file).ok();
    }
}
