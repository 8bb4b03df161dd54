//! Tolerant module header parser.
//!
//! Operates on preprocessed text (comments blanked, conditionals
//! resolved). The parser extracts the first top-level module's name,
//! parameter list, and port list — ANSI and non-ANSI styles — and skips
//! entries it cannot understand with a warning rather than failing the
//! file. It never interprets types or evaluates expressions; everything it
//! does not need structurally is carried as verbatim text.

use crate::error::SvError;
use crate::module::{Direction, Module, Parameter, Port, PortRange};
use ipforge_diagnostics::{code, Diagnostic, DiagnosticSink};
use ipforge_source::{FileId, Span};
use std::path::Path;

const DIRECTIONS: [&str; 3] = ["input", "output", "inout"];

const NET_AND_VAR_TYPES: [&str; 16] = [
    "wire", "tri", "tri0", "tri1", "wand", "wor", "trireg", "supply0", "supply1", "reg", "logic",
    "bit", "var", "byte", "int", "integer",
];

const EXTRA_BUILTIN_TYPES: [&str; 6] = ["shortint", "longint", "time", "real", "shortreal", "string"];

const MODIFIERS: [&str; 6] = ["signed", "unsigned", "automatic", "const", "scalared", "vectored"];

/// Parses the first module header in `clean` (preprocessed) text.
///
/// Individually malformed ports and parameters are dropped with a warning;
/// a module is still returned. Fails only when no module exists or a
/// header delimiter never closes.
pub fn parse_module(
    clean: &str,
    file: FileId,
    path: &Path,
    sink: &DiagnosticSink,
) -> Result<Module, SvError> {
    let header_start = find_keyword(clean, "module", 0).ok_or_else(|| SvError::NoModuleFound {
        path: path.to_path_buf(),
    })?;

    let mut cursor = Cursor::new(clean, header_start + "module".len());
    cursor.skip_ws();
    let name = cursor.read_ident().ok_or_else(|| SvError::NoModuleFound {
        path: path.to_path_buf(),
    })?;

    // Header import clauses (`module m import pkg::*; #(...)`) carry no
    // port information.
    loop {
        cursor.skip_ws();
        if cursor.at_word("import") {
            cursor.skip_until(b';');
            cursor.bump();
        } else {
            break;
        }
    }

    let mut param_text: Option<(usize, String)> = None;
    cursor.skip_ws();
    if cursor.peek() == b'#' {
        cursor.bump();
        cursor.skip_ws();
        if cursor.peek() == b'(' {
            let open = cursor.pos;
            let inner = cursor
                .balanced(b'(', b')')
                .ok_or_else(|| unbalanced(path, clean, open, '('))?;
            param_text = Some(inner);
        }
    }

    let mut port_text: Option<(usize, String)> = None;
    cursor.skip_ws();
    if cursor.peek() == b'(' {
        let open = cursor.pos;
        let inner = cursor
            .balanced(b'(', b')')
            .ok_or_else(|| unbalanced(path, clean, open, '('))?;
        port_text = Some(inner);
    }

    cursor.skip_ws();
    if cursor.peek() == b';' {
        cursor.bump();
    }

    let body_start = cursor.pos;
    let body_end = find_keyword(clean, "endmodule", body_start).unwrap_or(clean.len());
    let body = &clean[body_start..body_end];

    let mut parameters = Vec::new();
    if let Some((offset, text)) = &param_text {
        parse_parameter_list(text, *offset, file, sink, &mut parameters);
    }
    parse_body_parameters(body, body_start, file, sink, &mut parameters);

    let ports = match &port_text {
        Some((offset, text)) if is_ansi_port_list(text) => {
            parse_ansi_ports(text, *offset, file, sink)
        }
        Some((offset, text)) => {
            parse_non_ansi_ports(text, *offset, body, body_start, file, sink)
        }
        None => Vec::new(),
    };

    Ok(Module {
        name,
        parameters,
        ports,
        source_path: path.to_path_buf(),
    })
}

fn unbalanced(path: &Path, text: &str, offset: usize, delimiter: char) -> SvError {
    let line = text[..offset].bytes().filter(|&b| b == b'\n').count() as u32 + 1;
    SvError::UnbalancedDelimiters {
        path: path.to_path_buf(),
        line,
        delimiter,
    }
}

// ============================================================================
// Cursor: byte-level scanning with string awareness
// ============================================================================

struct Cursor<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str, pos: usize) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos,
        }
    }

    fn peek(&self) -> u8 {
        *self.bytes.get(self.pos).unwrap_or(&0)
    }

    fn bump(&mut self) {
        if self.pos < self.bytes.len() {
            self.pos += 1;
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_ascii_whitespace() && self.pos < self.bytes.len() {
            self.pos += 1;
        }
    }

    fn at_word(&self, word: &str) -> bool {
        self.text[self.pos..].starts_with(word)
            && !self
                .bytes
                .get(self.pos + word.len())
                .is_some_and(|&b| is_ident_char(b))
    }

    fn read_ident(&mut self) -> Option<String> {
        if !is_ident_start(self.peek()) {
            return None;
        }
        let start = self.pos;
        while is_ident_char(self.peek()) {
            self.pos += 1;
        }
        Some(self.text[start..self.pos].to_string())
    }

    fn skip_until(&mut self, target: u8) {
        while self.pos < self.bytes.len() && self.peek() != target {
            self.pos += 1;
        }
    }

    /// At an opening delimiter, consumes through its matching close and
    /// returns `(inner_offset, inner_text)`. Quote- and nesting-aware.
    fn balanced(&mut self, open: u8, close: u8) -> Option<(usize, String)> {
        debug_assert_eq!(self.peek(), open);
        self.bump();
        let inner_start = self.pos;
        let mut depth = 1usize;
        let mut in_string = false;
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if in_string {
                if b == b'\\' {
                    self.pos += 1;
                } else if b == b'"' {
                    in_string = false;
                }
            } else if b == b'"' {
                in_string = true;
            } else if b == open {
                depth += 1;
            } else if b == close {
                depth -= 1;
                if depth == 0 {
                    let inner = self.text[inner_start..self.pos].to_string();
                    self.pos += 1;
                    return Some((inner_start, inner));
                }
            }
            self.pos += 1;
        }
        None
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Finds `keyword` at a word boundary starting from `from`, skipping
/// string literals.
fn find_keyword(text: &str, keyword: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut pos = from;
    let mut in_string = false;
    while pos < bytes.len() {
        let b = bytes[pos];
        if in_string {
            if b == b'\\' {
                pos += 1;
            } else if b == b'"' {
                in_string = false;
            }
            pos += 1;
            continue;
        }
        if b == b'"' {
            in_string = true;
            pos += 1;
            continue;
        }
        if text[pos..].starts_with(keyword) {
            let before_ok = pos == 0 || !is_ident_char(bytes[pos - 1]);
            let after_ok = !bytes
                .get(pos + keyword.len())
                .is_some_and(|&b| is_ident_char(b));
            if before_ok && after_ok {
                return Some(pos);
            }
        }
        pos += 1;
    }
    None
}

/// Splits `text` at top-level occurrences of `sep`, returning each piece
/// with its byte offset relative to `text`. Nested `()[]{}` and string
/// literals are opaque.
fn split_top_level(text: &str, sep: u8) -> Vec<(usize, &str)> {
    let bytes = text.as_bytes();
    let mut pieces = Vec::new();
    let mut start = 0usize;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut pos = 0usize;
    while pos < bytes.len() {
        let b = bytes[pos];
        if in_string {
            if b == b'\\' {
                pos += 1;
            } else if b == b'"' {
                in_string = false;
            }
        } else {
            match b {
                b'"' => in_string = true,
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => depth = depth.saturating_sub(1),
                _ if b == sep && depth == 0 => {
                    pieces.push((start, &text[start..pos]));
                    start = pos + 1;
                }
                _ => {}
            }
        }
        pos += 1;
    }
    pieces.push((start, &text[start..]));
    pieces
}

/// Finds the offset of a top-level single `=` (not `==`, `<=`, `>=`, `!=`).
fn find_top_level_assign(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'=' if depth == 0 => {
                let prev = i.checked_sub(1).map(|j| bytes[j]);
                let next = bytes.get(i + 1).copied();
                if prev != Some(b'=')
                    && prev != Some(b'<')
                    && prev != Some(b'>')
                    && prev != Some(b'!')
                    && next != Some(b'=')
                {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

// ============================================================================
// Declaration tokens
// ============================================================================

/// A token within one declaration entry (the text left of any `=`).
#[derive(Debug, PartialEq)]
enum Tok<'a> {
    /// Identifier, keyword, or scoped/dotted name (`pkg::t`, `bus_if.master`).
    Word(&'a str),
    /// A `[...]` group, inner text.
    Dims(&'a str),
}

fn tokenize_decl(text: &str) -> Vec<Tok<'_>> {
    let bytes = text.as_bytes();
    let mut toks = Vec::new();
    let mut pos = 0usize;
    while pos < bytes.len() {
        let b = bytes[pos];
        if is_ident_start(b) {
            let start = pos;
            while pos < bytes.len() {
                let c = bytes[pos];
                if is_ident_char(c) {
                    pos += 1;
                } else if c == b':' && bytes.get(pos + 1) == Some(&b':') {
                    pos += 2;
                } else if c == b'.' && bytes.get(pos + 1).is_some_and(|&n| is_ident_start(n)) {
                    pos += 1;
                } else {
                    break;
                }
            }
            toks.push(Tok::Word(&text[start..pos]));
        } else if b == b'[' {
            let mut depth = 1usize;
            let start = pos + 1;
            pos += 1;
            while pos < bytes.len() && depth > 0 {
                match bytes[pos] {
                    b'[' => depth += 1,
                    b']' => depth -= 1,
                    _ => {}
                }
                pos += 1;
            }
            let end = if depth == 0 { pos - 1 } else { pos };
            toks.push(Tok::Dims(text[start..end].trim()));
        } else {
            pos += 1;
        }
    }
    toks
}

fn is_direction(word: &str) -> Option<Direction> {
    match word {
        "input" => Some(Direction::Input),
        "output" => Some(Direction::Output),
        "inout" => Some(Direction::Inout),
        _ => None,
    }
}

fn is_known_type(word: &str) -> bool {
    NET_AND_VAR_TYPES.contains(&word) || EXTRA_BUILTIN_TYPES.contains(&word)
}

/// Parses a `[...]` dimension into a range when it has a top-level colon.
fn dims_as_range(dims: &str) -> Option<PortRange> {
    let pieces = split_top_level(dims, b':');
    if pieces.len() == 2 {
        Some(PortRange::new(pieces[0].1.trim(), pieces[1].1.trim()))
    } else {
        None
    }
}

// ============================================================================
// Parameters
// ============================================================================

fn parse_parameter_list(
    text: &str,
    base: usize,
    file: FileId,
    sink: &DiagnosticSink,
    out: &mut Vec<Parameter>,
) {
    let mut sticky_local = false;
    for (offset, entry) in split_top_level(text, b',') {
        if entry.trim().is_empty() {
            continue;
        }
        match parse_parameter_entry(entry, &mut sticky_local) {
            Some(param) => out.push(param),
            None => sink.emit(Diagnostic::warning(
                code::MALFORMED_PARAMETER,
                format!("malformed parameter entry '{}' skipped", entry.trim()),
                entry_span(file, base + offset, entry),
            )),
        }
    }
}

/// Scans the module body for `parameter` / `localparam` statements.
fn parse_body_parameters(
    body: &str,
    base: usize,
    file: FileId,
    sink: &DiagnosticSink,
    out: &mut Vec<Parameter>,
) {
    let mut search = 0usize;
    loop {
        let kw_pos = match (
            find_keyword(body, "parameter", search),
            find_keyword(body, "localparam", search),
        ) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => break,
        };
        let stmt_end = split_top_level(&body[kw_pos..], b';')
            .first()
            .map(|(_, s)| kw_pos + s.len())
            .unwrap_or(body.len());
        parse_parameter_list(&body[kw_pos..stmt_end], base + kw_pos, file, sink, out);
        search = stmt_end + 1;
        if search >= body.len() {
            break;
        }
    }
}

fn parse_parameter_entry(entry: &str, sticky_local: &mut bool) -> Option<Parameter> {
    let (lhs, default) = match find_top_level_assign(entry) {
        Some(i) => (&entry[..i], Some(entry[i + 1..].trim().to_string())),
        None => (entry, None),
    };

    let mut toks = tokenize_decl(lhs);
    if let Some(Tok::Word(first)) = toks.first() {
        match *first {
            "parameter" => {
                *sticky_local = false;
                toks.remove(0);
            }
            "localparam" => {
                *sticky_local = true;
                toks.remove(0);
            }
            _ => {}
        }
    }

    // The name is the last word; everything before it is the type spec.
    let name_idx = toks
        .iter()
        .rposition(|t| matches!(t, Tok::Word(w) if is_plain_ident(w)))?;
    let name = match &toks[name_idx] {
        Tok::Word(w) => w.to_string(),
        _ => unreachable!(),
    };

    let mut type_parts = Vec::new();
    for tok in &toks[..name_idx] {
        match tok {
            Tok::Word(w) => type_parts.push((*w).to_string()),
            Tok::Dims(d) => type_parts.push(format!("[{d}]")),
        }
    }
    let type_spec = if type_parts.is_empty() {
        None
    } else {
        Some(type_parts.join(" "))
    };

    Some(Parameter {
        name,
        type_spec,
        default,
        is_local: *sticky_local,
    })
}

fn is_plain_ident(word: &str) -> bool {
    !word.contains("::") && !word.contains('.')
}

// ============================================================================
// Ports
// ============================================================================

fn is_ansi_port_list(text: &str) -> bool {
    split_top_level(text, b',').iter().any(|(_, entry)| {
        tokenize_decl(entry)
            .iter()
            .any(|t| matches!(t, Tok::Word(w) if is_direction(w).is_some() || w.contains('.')))
    })
}

/// Sticky declaration state carried across comma-separated entries, per
/// the SystemVerilog rule that direction and type hold until overridden.
#[derive(Default, Clone)]
struct StickyDecl {
    direction: Option<Direction>,
    signed: bool,
    range: Option<PortRange>,
    packed_dims: Vec<String>,
    type_name: Option<String>,
}

fn parse_ansi_ports(text: &str, base: usize, file: FileId, sink: &DiagnosticSink) -> Vec<Port> {
    let mut ports = Vec::new();
    let mut sticky = StickyDecl::default();
    for (offset, entry) in split_top_level(text, b',') {
        if entry.trim().is_empty() {
            continue;
        }
        match parse_port_entry(entry, &mut sticky) {
            Some(port) => ports.push(port),
            None => sink.emit(Diagnostic::warning(
                code::MALFORMED_PORT,
                format!("malformed port entry '{}' skipped", entry.trim()),
                entry_span(file, base + offset, entry),
            )),
        }
    }
    ports
}

/// Parses one ANSI-style entry, updating the sticky state. Returns `None`
/// for entries with no usable name.
fn parse_port_entry(entry: &str, sticky: &mut StickyDecl) -> Option<Port> {
    // An ANSI entry may carry a default (`output logic done = 0`); the
    // right-hand side contributes nothing to the port.
    let lhs = match find_top_level_assign(entry) {
        Some(i) => &entry[..i],
        None => entry,
    };
    let toks = tokenize_decl(lhs);
    if toks.is_empty() {
        return None;
    }

    // Interface reference: `bus_if.master name` (dotted first word).
    if let Tok::Word(first) = &toks[0] {
        if first.contains('.') {
            let name = toks.iter().skip(1).find_map(|t| match t {
                Tok::Word(w) if is_plain_ident(w) => Some((*w).to_string()),
                _ => None,
            })?;
            *sticky = StickyDecl::default();
            return Some(Port {
                name,
                direction: Direction::Inout,
                signed: false,
                range: None,
                packed_dims: Vec::new(),
                unpacked_dims: Vec::new(),
                type_name: Some((*first).to_string()),
                interface_ref: true,
            });
        }
    }

    let mut direction = None;
    let mut signed = sticky.signed;
    let mut range: Option<PortRange> = None;
    let mut packed_dims: Vec<String> = Vec::new();
    let mut type_name: Option<String> = None;
    let mut name: Option<String> = None;
    let mut unpacked_dims: Vec<String> = Vec::new();
    let mut saw_prefix = false;

    for tok in &toks {
        match tok {
            Tok::Word(w) => {
                if let Some(dir) = is_direction(w) {
                    direction = Some(dir);
                    signed = false;
                    saw_prefix = true;
                } else if MODIFIERS.contains(w) {
                    if *w == "signed" {
                        signed = true;
                    }
                    saw_prefix = true;
                } else if is_known_type(w) {
                    if !["wire", "reg", "logic", "bit", "var", "tri"].contains(w) {
                        type_name = Some((*w).to_string());
                    }
                    saw_prefix = true;
                } else if let Some(prev) = name.replace((*w).to_string()) {
                    // A user type followed by the real name; the last
                    // plain word wins as the name.
                    type_name = Some(prev);
                }
            }
            Tok::Dims(d) => {
                if name.is_none() {
                    match dims_as_range(d) {
                        Some(r) if range.is_none() => range = Some(r),
                        _ => packed_dims.push(d.to_string()),
                    }
                    saw_prefix = true;
                } else {
                    unpacked_dims.push(d.to_string());
                }
            }
        }
    }

    let name = name?;

    // A bare name (`input logic [7:0] a, b`) inherits the previous
    // entry's declaration prefix.
    let inherited = !saw_prefix && direction.is_none();
    if inherited {
        signed = sticky.signed;
        range = sticky.range.clone();
        packed_dims = sticky.packed_dims.clone();
        type_name = sticky.type_name.clone();
    }
    let direction = direction.or(sticky.direction)?;

    if !inherited {
        *sticky = StickyDecl {
            direction: Some(direction),
            signed,
            range: range.clone(),
            packed_dims: packed_dims.clone(),
            type_name: type_name.clone(),
        };
    }

    Some(Port {
        name,
        direction,
        signed,
        range,
        packed_dims,
        unpacked_dims,
        type_name,
        interface_ref: false,
    })
}

/// Non-ANSI style: names in the header, declarations in the body.
fn parse_non_ansi_ports(
    header: &str,
    header_base: usize,
    body: &str,
    body_base: usize,
    file: FileId,
    sink: &DiagnosticSink,
) -> Vec<Port> {
    // Collect body declarations into parsed ports keyed by name.
    let mut declared: Vec<Port> = Vec::new();
    let mut search = 0usize;
    loop {
        let kw_pos = DIRECTIONS
            .iter()
            .filter_map(|d| find_keyword(body, d, search))
            .min();
        let Some(kw_pos) = kw_pos else { break };
        let stmt = split_top_level(&body[kw_pos..], b';')
            .first()
            .map(|(_, s)| *s)
            .unwrap_or("");
        let mut sticky = StickyDecl::default();
        for (offset, entry) in split_top_level(stmt, b',') {
            if entry.trim().is_empty() {
                continue;
            }
            match parse_port_entry(entry, &mut sticky) {
                Some(port) => declared.push(port),
                None => sink.emit(Diagnostic::warning(
                    code::MALFORMED_PORT,
                    format!("malformed port declaration '{}' skipped", entry.trim()),
                    entry_span(file, body_base + kw_pos + offset, entry),
                )),
            }
        }
        search = kw_pos + stmt.len() + 1;
        if search >= body.len() {
            break;
        }
    }

    // Emit in header order; header names without a declaration are dropped.
    let mut ports = Vec::new();
    for (offset, entry) in split_top_level(header, b',') {
        let name = entry.trim();
        if name.is_empty() {
            continue;
        }
        match declared.iter().find(|p| p.name == name) {
            Some(port) => ports.push(port.clone()),
            None => sink.emit(Diagnostic::warning(
                code::MALFORMED_PORT,
                format!("port '{name}' has no declaration in the module body"),
                entry_span(file, header_base + offset, entry),
            )),
        }
    }
    ports
}

fn entry_span(file: FileId, offset: usize, entry: &str) -> Span {
    let lead = entry.len() - entry.trim_start().len();
    let start = (offset + lead) as u32;
    Span::new(file, start, start + entry.trim().len() as u32)
}
