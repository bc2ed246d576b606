use crate::types::Result;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Record appended when classification failed terminally for an entry.
const FAILURE_MARKER: &str = r#"shop="ERROR"|result=-1"#;

/// Append-only sink for classification lines; never truncates prior runs.
pub struct ResultWriter {
    file: File,
}

impl ResultWriter {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    /// One line per entry: the title plus the verbatim model verdict.
    pub fn append(&mut self, title: &str, verdict: &str) -> Result<()> {
        writeln!(self.file, r#"title="{}"|{}"#, title, verdict)?;
        Ok(())
    }

    pub fn append_failure(&mut self, title: &str) -> Result<()> {
        self.append(title, FAILURE_MARKER)
    }
}
