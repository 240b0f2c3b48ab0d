//! Single-pass textual scan of one source file.
//!
//! This is not a preprocessor. Markers are matched literally at the start of
//! a line, so an `#include` inside a comment or a disabled `#if 0` block is
//! still registered.

const HEAD_PAT: &[u8] = b"//!";
const INCLUDE_PAT: &[u8] = b"#include ";
const MAIN_PAT: &[u8] = b"int main(";

/// What a scan extracts from one file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Text after `//!` on the first line, trimmed
    pub head: Option<String>,
    /// `"x"` includes are stored as `x`, `<x>` includes keep their brackets
    pub raw_deps: Vec<String>,
    pub has_entry_point: bool,
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Consumes `pat` if the buffer continues with it.
    fn eat(&mut self, pat: &[u8]) -> bool {
        if self.buf[self.pos..].starts_with(pat) {
            self.pos += pat.len();
            true
        } else {
            false
        }
    }

    /// Returns the rest of the current line and moves past its terminator.
    fn rest_of_line(&mut self) -> &'a [u8] {
        let start = self.pos;
        let end = self.buf[start..]
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')
            .map_or(self.buf.len(), |i| start + i);
        self.pos = (end + 1).min(self.buf.len());
        &self.buf[start..end]
    }

    fn skip_line(&mut self) {
        self.rest_of_line();
    }
}

/// Scans one file's bytes. `is_compiled` gates entry-point detection: headers
/// never count as program entry points.
pub fn scan_source(buf: &[u8], is_compiled: bool) -> ScanResult {
    let mut cursor = Cursor::new(buf);
    let mut result = ScanResult::default();

    if cursor.eat(HEAD_PAT) {
        let head = String::from_utf8_lossy(cursor.rest_of_line());
        let head = head.trim();
        if !head.is_empty() {
            result.head = Some(head.to_string());
        }
    }

    while !cursor.at_end() {
        if cursor.eat(INCLUDE_PAT) {
            if let Some(dep) = parse_include(cursor.rest_of_line()) {
                result.raw_deps.push(dep);
            }
        } else if cursor.eat(MAIN_PAT) {
            result.has_entry_point = true;
            cursor.skip_line();
        } else {
            cursor.skip_line();
        }
    }

    if !is_compiled {
        result.has_entry_point = false;
    }

    result
}

fn parse_include(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_start();

    if let Some(rest) = line.strip_prefix('"') {
        let (dep, _) = rest.split_once('"')?;
        Some(dep.to_string())
    } else if let Some(rest) = line.strip_prefix('<') {
        let (dep, _) = rest.split_once('>')?;
        Some(format!("<{}>", dep))
    } else {
        None
    }
}
