//! Stable diagnostic codes, one per recoverable condition.
//!
//! Codes are grouped by pipeline stage: `1xx` preprocessor/parser, `2xx`
//! library index, `3xx` grouping/matching, `4xx` output. The letter prefix
//! reflects the default severity the condition carries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A diagnostic code: a severity letter plus a stage-grouped number,
/// displayed like `W103`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// Prefix letter (`E`, `W`, or `N`).
    pub letter: char,
    /// Numeric identifier.
    pub number: u16,
}

impl DiagnosticCode {
    const fn new(letter: char, number: u16) -> Self {
        Self { letter, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.letter, self.number)
    }
}

/// Unterminated comment or unbalanced conditional; the preprocessor
/// returned partial text.
pub const PREPROCESSOR_RECOVERED: DiagnosticCode = DiagnosticCode::new('W', 101);
/// A port entry could not be parsed and was dropped.
pub const MALFORMED_PORT: DiagnosticCode = DiagnosticCode::new('W', 103);
/// A parameter entry could not be parsed and was dropped.
pub const MALFORMED_PARAMETER: DiagnosticCode = DiagnosticCode::new('W', 104);
/// The library root is missing or empty; matching will find nothing.
pub const LIBRARY_IO: DiagnosticCode = DiagnosticCode::new('W', 201);
/// One library XML file failed to parse and was skipped.
pub const LIBRARY_PARSE: DiagnosticCode = DiagnosticCode::new('W', 202);
/// An abstraction definition references a bus definition absent from the
/// catalog.
pub const DANGLING_BUS_REF: DiagnosticCode = DiagnosticCode::new('W', 203);
/// A port group reached no candidate above the threshold.
pub const NO_MATCH: DiagnosticCode = DiagnosticCode::new('N', 301);
/// Two candidates scored within the ambiguity margin.
pub const AMBIGUOUS_MATCH: DiagnosticCode = DiagnosticCode::new('W', 302);
