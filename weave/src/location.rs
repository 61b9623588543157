use std::fmt;

/// Where a control annotation starts in its document.
///
/// Assigned at scan time and never changed; the rewrite pass uses it as the
/// key to find the block it scanned during collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub source_id: usize,
    /// Byte offset of the annotation's opening token.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
}

impl SourceLocation {
    pub fn at(source: &str, source_id: usize, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
        SourceLocation {
            source_id,
            offset,
            line: line_of(source, offset),
            column: source[line_start..offset].chars().count() + 1,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Convert a byte offset in `source` to a 1-based line number.
pub fn line_of(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}
