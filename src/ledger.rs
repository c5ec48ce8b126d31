use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Append-only, duplicate-free set of metric lines backed by a file.
///
/// Lines are compared byte for byte, so semantically equal lines with
/// different label order are both kept.
pub struct MetricsLedger {
    path: PathBuf,
    file: File,
    seen: HashSet<String>,
    lines: Vec<String>,
    duplicates: usize,
}

impl MetricsLedger {
    /// Truncates the file at `path` and loads it as the baseline.
    ///
    /// The baseline is read back after truncation and is therefore always empty;
    /// duplicate checks afterwards run against the in-memory set only.
    pub fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let lines: Vec<String> = fs::read_to_string(path)?
            .lines()
            .map(str::to_string)
            .collect();
        let seen = lines.iter().cloned().collect();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            seen,
            lines,
            duplicates: 0,
        })
    }

    /// Appends `line` unless an identical line is already present.
    ///
    /// Returns `Ok(false)` for a duplicate, which is reported but not an error.
    pub fn add(&mut self, line: impl Into<String>) -> io::Result<bool> {
        let line = line.into();
        if self.seen.contains(&line) {
            self.duplicates += 1;
            warn!(
                "Duplicate metric line rejected in {}: {}",
                self.path.display(),
                line
            );
            return Ok(false);
        }

        writeln!(self.file, "{}", line)?;
        self.seen.insert(line.clone());
        self.lines.push(line);
        Ok(true)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}
