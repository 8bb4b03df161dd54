//! The source database: owns file contents and resolves spans.

use crate::span::{FileId, ResolvedSpan, Span};
use std::io;
use std::path::{Path, PathBuf};

/// A single registered source file with a precomputed line-start index.
#[derive(Debug)]
pub struct SourceFile {
    /// Path of the file (or a synthetic name for in-memory sources).
    pub path: PathBuf,
    /// Full text content.
    pub content: String,
    line_starts: Vec<u32>,
}

impl SourceFile {
    fn new(path: PathBuf, content: String) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in content.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self {
            path,
            content,
            line_starts,
        }
    }

    /// Converts a byte offset to 1-indexed (line, column).
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (idx as u32 + 1, offset - self.line_starts[idx] + 1)
    }

    /// Returns the full text of the line containing `offset`, without the
    /// trailing newline.
    pub fn line_text(&self, offset: u32) -> &str {
        let (line, _) = self.line_col(offset);
        let start = self.line_starts[(line - 1) as usize] as usize;
        let end = self
            .line_starts
            .get(line as usize)
            .map(|&s| (s as usize).saturating_sub(1))
            .unwrap_or(self.content.len());
        &self.content[start..end]
    }
}

/// Owns all loaded source text and resolves [`Span`]s to line/column
/// coordinates.
#[derive(Default, Debug)]
pub struct SourceDb {
    files: Vec<SourceFile>,
}

impl SourceDb {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a file from disk and registers it.
    pub fn load_file(&mut self, path: &Path) -> Result<FileId, io::Error> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.add(path.to_path_buf(), content))
    }

    /// Registers an in-memory source under a synthetic name.
    pub fn add_source(&mut self, name: impl Into<PathBuf>, content: impl Into<String>) -> FileId {
        self.add(name.into(), content.into())
    }

    fn add(&mut self, path: PathBuf, content: String) -> FileId {
        let id = FileId::new(self.files.len() as u32);
        self.files.push(SourceFile::new(path, content));
        id
    }

    /// Returns the file for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this database.
    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.index()]
    }

    /// Resolves a span's start position to `file:line:col`. Returns `None`
    /// for location-less spans.
    pub fn resolve(&self, span: Span) -> Option<ResolvedSpan> {
        if span.is_none() {
            return None;
        }
        let file = self.file(span.file);
        let (line, col) = file.line_col(span.start);
        Some(ResolvedSpan {
            path: file.path.clone(),
            line,
            col,
        })
    }
}
