//! Lexical preprocessor: comment blanking and conditional-section stripping.
//!
//! The output has exactly the same length as the input. Comments,
//! directive lines, backtick references, and inactive conditional regions
//! are overwritten with spaces (newlines kept), so byte offsets — and with
//! them every diagnostic span — stay valid against the original text.
//!
//! No macro table is evaluated: an `` `ifdef NAME`` with any name is taken
//! as false and an `` `ifndef`` as true. The tool would rather drop a port
//! hidden behind an undefined macro than invent one.

use ipforge_diagnostics::{code, Diagnostic, DiagnosticSink};
use ipforge_source::{FileId, Span};

/// Scanner states. String awareness keeps a `//` inside a literal from
/// opening a comment, and comment awareness keeps `input wire` inside a
/// comment from ever reaching the parser.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum State {
    Normal,
    LineComment,
    BlockComment,
    DquoteString,
}

/// One open `` `ifdef``/`` `ifndef`` frame.
struct CondFrame {
    /// Whether the currently-selected branch emits text, given that every
    /// enclosing frame emits.
    active: bool,
    /// Whether `` `else`` has been seen for this frame.
    seen_else: bool,
    /// Byte offset of the opening directive, for the unbalanced report.
    opened_at: u32,
}

/// Strips comments and inactive conditional regions from `source`.
///
/// Returns text of identical length with stripped bytes blanked.
/// Unterminated comments and unbalanced conditionals are reported to the
/// sink and recovered from; the result is always usable by the parser.
pub fn preprocess(source: &str, file: FileId, sink: &DiagnosticSink) -> String {
    Preprocessor {
        src: source.as_bytes(),
        out: source.as_bytes().to_vec(),
        pos: 0,
        file,
        sink,
        state: State::Normal,
        conds: Vec::new(),
    }
    .run()
}

struct Preprocessor<'a> {
    src: &'a [u8],
    out: Vec<u8>,
    pos: usize,
    file: FileId,
    sink: &'a DiagnosticSink,
    state: State,
    conds: Vec<CondFrame>,
}

impl Preprocessor<'_> {
    fn run(mut self) -> String {
        while self.pos < self.src.len() {
            match self.state {
                State::Normal => self.step_normal(),
                State::LineComment => self.step_line_comment(),
                State::BlockComment => self.step_block_comment(),
                State::DquoteString => self.step_string(),
            }
        }
        if self.state == State::BlockComment {
            self.warn(self.src.len() as u32, "unterminated block comment");
        }
        while let Some(frame) = self.conds.pop() {
            self.warn(
                frame.opened_at,
                "conditional directive is never closed with `endif",
            );
        }
        // Blanking never touches newlines, so this is still valid UTF-8
        // wherever the input was.
        String::from_utf8_lossy(&self.out).into_owned()
    }

    fn peek(&self, offset: usize) -> u8 {
        *self.src.get(self.pos + offset).unwrap_or(&0)
    }

    fn emitting(&self) -> bool {
        self.conds.iter().all(|f| f.active)
    }

    /// Blanks `self.out[from..to]`, preserving newlines.
    fn blank(&mut self, from: usize, to: usize) {
        for i in from..to.min(self.out.len()) {
            if self.out[i] != b'\n' && self.out[i] != b'\r' {
                self.out[i] = b' ';
            }
        }
    }

    fn warn(&self, offset: u32, message: &str) {
        self.sink.emit(Diagnostic::warning(
            code::PREPROCESSOR_RECOVERED,
            message,
            Span::at(self.file, offset),
        ));
    }

    fn step_normal(&mut self) {
        let b = self.peek(0);
        if b == b'/' && self.peek(1) == b'/' {
            self.state = State::LineComment;
            self.blank(self.pos, self.pos + 2);
            self.pos += 2;
        } else if b == b'/' && self.peek(1) == b'*' {
            self.state = State::BlockComment;
            self.blank(self.pos, self.pos + 2);
            self.pos += 2;
        } else if b == b'"' {
            self.state = State::DquoteString;
            if !self.emitting() {
                self.blank(self.pos, self.pos + 1);
            }
            self.pos += 1;
        } else if b == b'`' {
            self.directive();
        } else {
            if !self.emitting() {
                self.blank(self.pos, self.pos + 1);
            }
            self.pos += 1;
        }
    }

    fn step_line_comment(&mut self) {
        if self.peek(0) == b'\n' {
            self.state = State::Normal;
        } else {
            self.blank(self.pos, self.pos + 1);
        }
        self.pos += 1;
    }

    fn step_block_comment(&mut self) {
        if self.peek(0) == b'*' && self.peek(1) == b'/' {
            self.blank(self.pos, self.pos + 2);
            self.pos += 2;
            self.state = State::Normal;
        } else {
            self.blank(self.pos, self.pos + 1);
            self.pos += 1;
        }
    }

    fn step_string(&mut self) {
        let b = self.peek(0);
        if b == b'\\' {
            if !self.emitting() {
                self.blank(self.pos, self.pos + 2);
            }
            self.pos += 2;
            return;
        }
        if b == b'"' || b == b'\n' {
            self.state = State::Normal;
        }
        if !self.emitting() {
            self.blank(self.pos, self.pos + 1);
        }
        self.pos += 1;
    }

    /// Handles a backtick directive starting at `self.pos`.
    fn directive(&mut self) {
        let start = self.pos;
        self.pos += 1;
        let word_start = self.pos;
        while is_ident_char(self.peek(0)) {
            self.pos += 1;
        }
        let word = &self.src[word_start..self.pos];

        match word {
            b"ifdef" | b"ifndef" => {
                // No macro table: `ifdef picks the never-defined branch.
                let active = word == b"ifndef";
                self.conds.push(CondFrame {
                    active,
                    seen_else: false,
                    opened_at: start as u32,
                });
                self.blank_rest_of_line(start);
            }
            b"else" => {
                match self.conds.last_mut() {
                    Some(frame) if !frame.seen_else => {
                        frame.active = !frame.active;
                        frame.seen_else = true;
                    }
                    _ => self.warn(start as u32, "`else without matching `ifdef"),
                }
                self.blank_rest_of_line(start);
            }
            b"elsif" => {
                // `elsif NAME: the name is never defined, so the branch is
                // inactive; a frame that already emitted stays closed.
                match self.conds.last_mut() {
                    Some(frame) => frame.active = false,
                    None => self.warn(start as u32, "`elsif without matching `ifdef"),
                }
                self.blank_rest_of_line(start);
            }
            b"endif" => {
                if self.conds.pop().is_none() {
                    self.warn(start as u32, "`endif without matching `ifdef");
                }
                self.blank_rest_of_line(start);
            }
            b"define" | b"undef" | b"include" | b"timescale" | b"default_nettype"
            | b"resetall" | b"pragma" => {
                self.blank_directive_line(start);
            }
            _ => {
                // A `NAME reference: conservatively expands to nothing.
                self.blank(start, self.pos);
            }
        }
    }

    /// Blanks from `start` to end of line (conditional directives carry no
    /// continuation).
    fn blank_rest_of_line(&mut self, start: usize) {
        while self.pos < self.src.len() && self.peek(0) != b'\n' {
            self.pos += 1;
        }
        self.blank(start, self.pos);
    }

    /// Blanks a directive line, honoring `\` line continuations so a
    /// multi-line `define disappears entirely.
    fn blank_directive_line(&mut self, start: usize) {
        loop {
            while self.pos < self.src.len() && self.peek(0) != b'\n' {
                self.pos += 1;
            }
            let continued = self.pos > 0 && self.src[self.pos - 1] == b'\\';
            if !continued || self.pos >= self.src.len() {
                break;
            }
            self.pos += 1;
        }
        self.blank(start, self.pos);
    }
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
