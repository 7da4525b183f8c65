use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use scout_core::PageResult;
use serde::Serialize;

/// Writes one `page_<n>.json` file per completed search page.
pub struct Checkpoints {
    dir: PathBuf,
}

impl Checkpoints {
    /// Use `dir`, creating it if needed.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create checkpoint directory: {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path_for(&self, page_number: u32) -> PathBuf {
        self.dir.join(format!("page_{page_number}.json"))
    }

    pub fn write(&self, page: &PageResult) -> Result<PathBuf> {
        let path = self.path_for(page.page_number);
        write_json(&path, page)?;
        Ok(path)
    }
}

/// Pretty JSON to `path`, or to stdout when no path is given.
pub fn emit<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => write_json(path, value),
        None => {
            let json = serde_json::to_string_pretty(value)?;
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
            Ok(())
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
