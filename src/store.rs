//! Line sources and sinks.
//!
//! The rest of the crate never opens files. It reads an ordered list of lines
//! from a [`LineSource`] and hands the complete updated list to a
//! [`LineSink`].

use crate::error::{FixedWidthError, Result};
use log::debug;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Something that yields the lines of a file, without terminators.
pub trait LineSource {
    fn read_lines(&self) -> Result<Vec<String>>;
}

/// Something that persists a complete, ordered list of lines.
pub trait LineSink {
    fn write_lines(&mut self, lines: &[String]) -> Result<()>;
}

/// A file on disk.
///
/// Writes go to a temporary file in the same directory which then replaces
/// the target in a single rename, so readers see either the old or the new
/// contents and never a partial file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl LineSource for FileStore {
    fn read_lines(&self) -> Result<Vec<String>> {
        let contents = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FixedWidthError::FileNotFound {
                path: self.path.clone(),
            },
            _ => FixedWidthError::Io(e),
        })?;

        let lines: Vec<String> = contents.lines().map(str::to_string).collect();
        debug!("Read {} lines from {}", lines.len(), self.path.display());
        Ok(lines)
    }
}

impl LineSink for FileStore {
    fn write_lines(&mut self, lines: &[String]) -> Result<()> {
        let temp = NamedTempFile::new_in(self.directory())?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            for line in lines {
                writer.write_all(line.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;

        if let Ok(metadata) = fs::metadata(&self.path) {
            fs::set_permissions(temp.path(), metadata.permissions())?;
        }

        // Atomic move from temp to final file
        temp.persist(&self.path).map_err(|e| e.error)?;

        debug!("Wrote {} lines to {}", lines.len(), self.path.display());
        Ok(())
    }
}

/// An in-memory line store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    lines: Vec<String>,
    writes: usize,
}

impl MemoryStore {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MemoryStore {
            lines: lines.into_iter().map(Into::into).collect(),
            writes: 0,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of completed [`LineSink::write_lines`] calls.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl LineSource for MemoryStore {
    fn read_lines(&self) -> Result<Vec<String>> {
        Ok(self.lines.clone())
    }
}

impl LineSink for MemoryStore {
    fn write_lines(&mut self, lines: &[String]) -> Result<()> {
        self.lines = lines.to_vec();
        self.writes += 1;
        Ok(())
    }
}
