//! Fatal parser errors. Per-entry problems are diagnostics, not errors.

use std::path::PathBuf;

/// Errors that abort header parsing for the whole file.
#[derive(Debug, thiserror::Error)]
pub enum SvError {
    /// The input file could not be read.
    #[error("failed to read {path}: {source}")]
    SourceIo {
        /// The input path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// No `module` declaration exists in the (preprocessed) text.
    #[error("no module declaration found in {path}")]
    NoModuleFound {
        /// The input path.
        path: PathBuf,
    },

    /// A delimiter in the module header never closes.
    #[error("unbalanced '{delimiter}' in module header at {path}:{line}")]
    UnbalancedDelimiters {
        /// The input path.
        path: PathBuf,
        /// 1-indexed line of the opening delimiter.
        line: u32,
        /// The delimiter that never closed.
        delimiter: char,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = SvError::NoModuleFound {
            path: PathBuf::from("empty.sv"),
        };
        assert_eq!(e.to_string(), "no module declaration found in empty.sv");

        let e = SvError::UnbalancedDelimiters {
            path: PathBuf::from("bad.sv"),
            line: 3,
            delimiter: '(',
        };
        assert!(e.to_string().contains("bad.sv:3"));
        assert!(e.to_string().contains('('));
    }
}
