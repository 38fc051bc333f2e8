//! Field path tokenizer
//!
//! Splits Crossplane-style field paths such as `spec.forProvider.tags[0].key`
//! or `metadata.annotations["crossplane.io/external-name"]` into typed segments.
//!
//! Tokenizing never fails. Malformed input (stray `]`, unterminated brackets
//! or quotes) degrades to a best-effort segmentation.

use std::fmt;
use std::str::Chars;

/// Whether a segment addresses an object key or an element of an array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Object,
    Array { index: usize },
}

/// One element of a decomposed field path
///
/// An array segment names the field holding the array and the element index.
/// An array segment with an empty name indexes the array produced by the
/// previous segment (`matrix[0][1]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub name: String,
    pub kind: SegmentKind,
}

impl PathSegment {
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SegmentKind::Object,
        }
    }

    pub fn array(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            kind: SegmentKind::Array { index },
        }
    }

    /// Array index, if this is an array segment
    pub fn index(&self) -> Option<usize> {
        match self.kind {
            SegmentKind::Array { index } => Some(index),
            SegmentKind::Object => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, SegmentKind::Array { .. })
    }
}

/// A tokenized field path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Tokenize a path string
    pub fn parse(path: &str) -> Self {
        Tokenizer::default().run(path)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn first(&self) -> Option<&PathSegment> {
        self.segments.first()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter()
    }

    /// Path of an object field below this one
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::object(name));
        Self { segments }
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

#[derive(Default)]
struct Tokenizer {
    segments: Vec<PathSegment>,
    current: String,
    /// The last emitted segment sits directly before the cursor, so a
    /// following `[n]` indexes it instead of opening a fresh segment.
    adjacent: bool,
}

impl Tokenizer {
    fn run(mut self, path: &str) -> FieldPath {
        let mut chars = path.chars();

        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        self.current.push(escaped);
                    }
                }
                '.' => {
                    self.flush();
                    self.adjacent = false;
                }
                '"' | '\'' => read_quoted(&mut chars, c, &mut self.current),
                '[' => {
                    if !self.current.is_empty() {
                        self.flush();
                        self.adjacent = true;
                    }
                    let (content, quoted) = read_bracket(&mut chars);
                    self.bracket(content, quoted);
                }
                _ => self.current.push(c),
            }
        }
        self.flush();

        FieldPath {
            segments: self.segments,
        }
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            let name = std::mem::take(&mut self.current);
            self.segments.push(PathSegment::object(name));
        }
    }

    fn bracket(&mut self, content: String, quoted: bool) {
        if quoted {
            // `["a.b"][1]` indexes the quoted key itself
            self.segments.push(PathSegment::object(content));
            self.adjacent = true;
            return;
        }

        if let Some(index) = parse_index(&content) {
            match self.segments.last_mut() {
                Some(last) if self.adjacent && last.kind == SegmentKind::Object => {
                    last.kind = SegmentKind::Array { index };
                }
                _ => self.segments.push(PathSegment::array("", index)),
            }
            self.adjacent = false;
        } else if !content.is_empty() {
            self.segments.push(PathSegment::object(content));
            self.adjacent = true;
        }
    }
}

/// Read a quoted run up to the matching quote (or end of input)
fn read_quoted(chars: &mut Chars<'_>, quote: char, out: &mut String) {
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            c if c == quote => return,
            c => out.push(c),
        }
    }
}

/// Read bracket content up to the closing `]` (or end of input)
///
/// Returns the literal content and whether any part of it was quoted.
fn read_bracket(chars: &mut Chars<'_>) -> (String, bool) {
    let mut content = String::new();
    let mut quoted = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    content.push(escaped);
                }
            }
            '"' | '\'' => {
                quoted = true;
                read_quoted(chars, c, &mut content);
            }
            ']' => break,
            c => content.push(c),
        }
    }

    (content, quoted)
}

fn parse_index(content: &str) -> Option<usize> {
    if !content.is_empty() && content.bytes().all(|b| b.is_ascii_digit()) {
        content.parse().ok()
    } else {
        None
    }
}

fn needs_brackets(name: &str) -> bool {
    name.is_empty()
        || name
            .chars()
            .any(|c| matches!(c, '.' | '[' | ']' | '"' | '\'' | '\\'))
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut previous: Option<&PathSegment> = None;

        for segment in &self.segments {
            if segment.name.is_empty() && segment.is_array() {
                // `a.[0]` keeps the index from attaching to `a`
                if previous.is_some_and(|p| p.kind == SegmentKind::Object) {
                    f.write_str(".")?;
                }
            } else if needs_brackets(&segment.name) {
                f.write_str("[\"")?;
                for c in segment.name.chars() {
                    if matches!(c, '"' | '\\') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                f.write_str("\"]")?;
            } else {
                if previous.is_some() {
                    f.write_str(".")?;
                }
                f.write_str(&segment.name)?;
            }

            if let SegmentKind::Array { index } = segment.kind {
                write!(f, "[{}]", index)?;
            }
            previous = Some(segment);
        }

        Ok(())
    }
}
