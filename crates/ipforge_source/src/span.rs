//! File identifiers, byte-range spans, and their resolved display form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Opaque identifier for a file registered in the [`SourceDb`](crate::SourceDb).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct FileId(u32);

impl FileId {
    /// A placeholder id for diagnostics that have no source location
    /// (e.g. a missing library directory).
    pub const NONE: FileId = FileId(u32::MAX);

    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A byte range within a registered source file.
///
/// `start` is inclusive, `end` exclusive. Spans produced by the
/// preprocessor refer to offsets in the *original* text, which the
/// preprocessor keeps position-stable for exactly this purpose.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Span {
    /// The file this range belongs to.
    pub file: FileId,
    /// Inclusive start byte offset.
    pub start: u32,
    /// Exclusive end byte offset.
    pub end: u32,
}

impl Span {
    /// A span with no location, for file-level or tool-level diagnostics.
    pub const NONE: Span = Span {
        file: FileId::NONE,
        start: 0,
        end: 0,
    };

    /// Creates a span covering `start..end` in `file`.
    pub fn new(file: FileId, start: u32, end: u32) -> Self {
        Self { file, start, end }
    }

    /// Creates a zero-length span at a single offset, used when only a
    /// position (not an extent) is known.
    pub fn at(file: FileId, offset: u32) -> Self {
        Self::new(file, offset, offset)
    }

    /// Returns `true` if this span carries no location.
    pub fn is_none(&self) -> bool {
        self.file == FileId::NONE
    }
}

/// A span resolved to 1-indexed line/column coordinates for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpan {
    /// Path of the source file.
    pub path: PathBuf,
    /// Starting line (1-indexed).
    pub line: u32,
    /// Starting column (1-indexed).
    pub col: u32,
}

impl fmt::Display for ResolvedSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line, self.col)
    }
}
