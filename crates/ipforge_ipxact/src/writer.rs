//! Indenting XML writer.
//!
//! A small push/pop writer over any `io::Write`, emitting one element per
//! line with two-space indentation. All text and attribute values are
//! escaped on the way through, and output is a pure function of the call
//! sequence, which gives the serializer its byte-determinism.

use std::io::{self, Write};

/// XML writing helper with an indentation stack.
pub struct XmlWriter<'w> {
    dest: Box<dyn Write + 'w>,
    indent_level: usize,
    open_tags: Vec<String>,
}

impl<'w> XmlWriter<'w> {
    /// Creates a writer over the destination.
    pub fn new(dest: impl Write + 'w) -> Self {
        Self {
            dest: Box::new(dest),
            indent_level: 0,
            open_tags: Vec::new(),
        }
    }

    /// Writes the XML declaration header.
    pub fn declaration(&mut self) -> io::Result<()> {
        writeln!(self.dest, r#"<?xml version="1.0" encoding="UTF-8"?>"#)
    }

    /// Opens `<tag attr…>` and pushes an indentation level.
    pub fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) -> io::Result<()> {
        self.indent()?;
        write!(self.dest, "<{tag}")?;
        self.write_attrs(attrs)?;
        writeln!(self.dest, ">")?;
        self.indent_level += 1;
        self.open_tags.push(tag.to_string());
        Ok(())
    }

    /// Closes the innermost open tag.
    pub fn close(&mut self) -> io::Result<()> {
        let tag = self
            .open_tags
            .pop()
            .expect("close() without a matching open()");
        self.indent_level -= 1;
        self.indent()?;
        writeln!(self.dest, "</{tag}>")
    }

    /// Writes `<tag>text</tag>` on one line.
    pub fn leaf(&mut self, tag: &str, text: &str) -> io::Result<()> {
        self.indent()?;
        writeln!(self.dest, "<{tag}>{}</{tag}>", escape(text))
    }

    /// Writes an empty `<tag attr…/>` element.
    pub fn empty(&mut self, tag: &str, attrs: &[(&str, &str)]) -> io::Result<()> {
        self.indent()?;
        write!(self.dest, "<{tag}")?;
        self.write_attrs(attrs)?;
        writeln!(self.dest, "/>")
    }

    /// Flushes the destination. All tags must be closed.
    pub fn finish(mut self) -> io::Result<()> {
        debug_assert!(self.open_tags.is_empty(), "unclosed tags at finish()");
        self.dest.flush()
    }

    fn write_attrs(&mut self, attrs: &[(&str, &str)]) -> io::Result<()> {
        for (name, value) in attrs {
            write!(self.dest, " {name}=\"{}\"", escape(value))?;
        }
        Ok(())
    }

    fn indent(&mut self) -> io::Result<()> {
        for _ in 0..self.indent_level {
            write!(self.dest, "  ")?;
        }
        Ok(())
    }
}

/// Escapes the five XML special characters.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
