//! The immutable module model produced by the header parser.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Port direction as written in the source.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Direction {
    /// `input`
    Input,
    /// `output`
    Output,
    /// `inout`
    Inout,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
            Direction::Inout => write!(f, "inout"),
        }
    }
}

/// A packed range `[left:right]` carried as verbatim text.
///
/// Bounds are kept textual because they are frequently parametric
/// (`DATA_WIDTH-1`). Literal integer bounds are additionally exposed so
/// the matcher can enforce exact-width checks and the serializer can emit
/// numeric vectors.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PortRange {
    /// Text left of the colon.
    pub left: String,
    /// Text right of the colon.
    pub right: String,
}

impl PortRange {
    /// Creates a range from its two bound expressions.
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Returns `(left, right)` when both bounds are integer literals.
    pub fn literal_bounds(&self) -> Option<(i64, i64)> {
        let l = self.left.trim().parse().ok()?;
        let r = self.right.trim().parse().ok()?;
        Some((l, r))
    }

    /// Returns the bit width when both bounds are literal.
    pub fn literal_width(&self) -> Option<u64> {
        let (l, r) = self.literal_bounds()?;
        Some(l.abs_diff(r) + 1)
    }

    /// Returns `true` for a `[low:high]` (little-endian) literal range.
    pub fn is_little_endian(&self) -> bool {
        matches!(self.literal_bounds(), Some((l, r)) if l < r)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.left, self.right)
    }
}

/// A single module port.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Port {
    /// Name with original casing preserved.
    pub name: String,
    /// Direction; interface references are recorded as [`Direction::Inout`].
    pub direction: Direction,
    /// `signed` qualifier.
    pub signed: bool,
    /// The first packed range, when one was written with a `:`.
    pub range: Option<PortRange>,
    /// Additional packed dimensions beyond [`Port::range`], verbatim.
    pub packed_dims: Vec<String>,
    /// Unpacked dimensions following the name, verbatim.
    pub unpacked_dims: Vec<String>,
    /// The type token for package-imported or user types, opaque.
    pub type_name: Option<String>,
    /// `true` for interface ports (`bus_if.master m`); ignored by matching.
    pub interface_ref: bool,
}

impl Port {
    /// Creates a scalar port with the given direction and name.
    pub fn scalar(direction: Direction, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction,
            signed: false,
            range: None,
            packed_dims: Vec::new(),
            unpacked_dims: Vec::new(),
            type_name: None,
            interface_ref: false,
        }
    }

    /// Creates a vector port with a `[left:right]` range.
    pub fn vector(
        direction: Direction,
        name: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        Self {
            range: Some(PortRange::new(left, right)),
            ..Self::scalar(direction, name)
        }
    }
}

/// A module parameter.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Tokenized type specification (`int`, `logic [7:0]`, `type`, …),
    /// uninterpreted.
    pub type_spec: Option<String>,
    /// Default value expression, verbatim.
    pub default: Option<String>,
    /// `true` for `localparam` (excluded from externalized parameters).
    pub is_local: bool,
}

impl Parameter {
    /// Returns the default value parsed as an integer literal, if it is one.
    pub fn literal_default(&self) -> Option<i64> {
        self.default.as_deref()?.trim().parse().ok()
    }
}

/// A parsed module header: the parser's sole output, never mutated after
/// construction.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Module {
    /// Module name.
    pub name: String,
    /// Parameters in declaration order.
    pub parameters: Vec<Parameter>,
    /// Ports in declaration order.
    pub ports: Vec<Port>,
    /// Path of the source file.
    pub source_path: PathBuf,
}

impl Module {
    /// Looks up a parameter by exact name.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}
