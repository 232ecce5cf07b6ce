use crate::{report::Outcome, util::ensure_parent_dir, util::now_rfc3339};
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where outcomes go, one call per finished unit.
pub trait ResultSink {
    fn record(&mut self, outcome: &Outcome) -> Result<()>;
}

/// Append-only results file. Every line is written whole and flushed before
/// `record` returns.
pub struct ResultLog {
    path: PathBuf,
    file: File,
}

impl ResultLog {
    pub fn open(path: &Path) -> Result<Self> {
        ensure_parent_dir(path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open results log: {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Marks the start of a run. Banner lines start with `#`.
    pub fn banner(&mut self, label: &str) -> Result<()> {
        let rule = "=".repeat(80);
        let text = format!("# {rule}\n# START {label} {}\n# {rule}\n", now_rfc3339());
        self.append(&text)
    }

    fn append(&mut self, text: &str) -> Result<()> {
        self.file
            .write_all(text.as_bytes())
            .and_then(|_| self.file.flush())
            .with_context(|| format!("append to {}", self.path.display()))
    }
}

impl ResultSink for ResultLog {
    fn record(&mut self, outcome: &Outcome) -> Result<()> {
        let line = format!("{outcome}\n");
        self.append(&line)?;
        info!(target: "results", "\t{}", outcome);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemorySink {
    pub outcomes: Vec<Outcome>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.outcomes.iter().map(|o| o.to_string()).collect()
    }
}

impl ResultSink for MemorySink {
    fn record(&mut self, outcome: &Outcome) -> Result<()> {
        self.outcomes.push(outcome.clone());
        Ok(())
    }
}
