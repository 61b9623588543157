use std::ops::Range;

use crate::location::{SourceLocation, line_of};
use crate::parser::error::ParseError;
use crate::syntax::Syntax;

/// One control annotation together with the code fence that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlockPair<'a> {
    pub location: SourceLocation,
    /// Annotation text including its delimiters.
    pub annotation: &'a str,
    /// Whitespace between the annotation and the fence.
    pub gap: &'a str,
    /// Fence text including the opening and closing tokens.
    pub fence: &'a str,
    pub annotation_span: Range<usize>,
    pub fence_span: Range<usize>,
}

/// Lazily yields every annotated fence of a document, in document order.
///
/// The scanner is stateless apart from its cursor, so cloning it (or calling
/// [`scan`] again) restarts the scan. After an error it yields nothing more.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    source_id: usize,
    syntax: &'a Syntax,
    cursor: usize,
    done: bool,
}

pub fn scan<'a>(source: &'a str, source_id: usize, syntax: &'a Syntax) -> Scanner<'a> {
    Scanner {
        source,
        source_id,
        syntax,
        cursor: 0,
        done: false,
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<RawBlockPair<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_match() {
            Ok(Some(pair)) => Some(Ok(pair)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }
}

impl<'a> Scanner<'a> {
    fn next_match(&mut self) -> Result<Option<RawBlockPair<'a>>, ParseError> {
        let syntax = self.syntax;
        let fence = syntax.fence.as_str();
        loop {
            let Some(start) = find_from(self.source, self.cursor, &syntax.annotation_open)
            else {
                return Ok(None);
            };

            // Ordinary fences are skipped whole so annotation-like text inside
            // them is never picked up. Only a fence that closes counts.
            match find_plain_fence(self.source, self.cursor, start, fence) {
                Some(plain) => {
                    if self.source[plain.clone()].contains(syntax.annotation_open.as_str()) {
                        log::warn!(
                            "ignoring control annotation inside the plain code fence on line {}",
                            line_of(self.source, plain.start)
                        );
                    }
                    self.cursor = plain.end;
                }
                None => return self.match_at(start).map(Some),
            }
        }
    }

    fn match_at(&mut self, start: usize) -> Result<RawBlockPair<'a>, ParseError> {
        let source = self.source;
        let syntax = self.syntax;
        let location = SourceLocation::at(source, self.source_id, start);
        let body_start = start + syntax.annotation_open.len();

        let close = find_from(source, body_start, &syntax.annotation_close).ok_or_else(|| {
            ParseError::scan("unterminated control annotation", start..body_start, location)
                .with_note(format!(
                    "expected '{}' to close the annotation",
                    syntax.annotation_close
                ))
        })?;
        let annotation_end = close + syntax.annotation_close.len();

        let rest = &source[annotation_end..];
        let gap_len = rest.len() - rest.trim_start_matches([' ', '\t', '\r', '\n']).len();
        let fence_start = annotation_end + gap_len;
        if !source[fence_start..].starts_with(syntax.fence.as_str()) {
            return Err(ParseError::scan(
                "control annotation is not followed by a code fence",
                start..annotation_end,
                location,
            ));
        }

        let fence_body = fence_start + syntax.fence.len();
        let fence_close = find_from(source, fence_body, &syntax.fence).ok_or_else(|| {
            ParseError::scan(
                "unterminated code fence",
                fence_start..fence_body,
                SourceLocation::at(source, self.source_id, fence_start),
            )
        })?;
        let fence_end = fence_close + syntax.fence.len();
        let fence_text = &source[fence_start..fence_end];
        if !fence_text.contains('\n') {
            return Err(ParseError::scan(
                "code fence must open and close on separate lines",
                fence_start..fence_end,
                SourceLocation::at(source, self.source_id, fence_start),
            ));
        }

        self.cursor = fence_end;
        log::trace!("control block at {}", location);
        Ok(RawBlockPair {
            location,
            annotation: &source[start..annotation_end],
            gap: &source[annotation_end..fence_start],
            fence: fence_text,
            annotation_span: start..annotation_end,
            fence_span: fence_start..fence_end,
        })
    }
}

fn find_from(source: &str, from: usize, pattern: &str) -> Option<usize> {
    source[from..].find(pattern).map(|i| i + from)
}

/// Span of the next complete unannotated fence whose opener lies before `limit`.
///
/// The opener starts a line (up to three spaces of indentation) and carries at
/// most a one-word info string. The closer also starts a line, is at least as
/// long as the opener and has nothing else on its line. An opener without a
/// closer is not a fence.
fn find_plain_fence(
    source: &str,
    from: usize,
    limit: usize,
    fence: &str,
) -> Option<Range<usize>> {
    if fence.is_empty() {
        return None;
    }
    let mut at = from;
    while let Some(pos) = find_from(source, at, fence) {
        if pos >= limit {
            return None;
        }
        let run = fence_run(source, pos, fence);
        if opens_line(source, pos) {
            let info = rest_of_line(source, pos + run);
            let info_word = info.trim();
            if !info_word.contains(char::is_whitespace)
                && !info_word.contains(fence)
                && let Some(end) = find_closing_fence(source, pos + run + info.len(), fence, run)
            {
                return Some(pos..end);
            }
        }
        at = pos + run;
    }
    None
}

fn find_closing_fence(source: &str, from: usize, fence: &str, min_run: usize) -> Option<usize> {
    let mut at = from;
    while let Some(pos) = find_from(source, at, fence) {
        let run = fence_run(source, pos, fence);
        if run >= min_run
            && opens_line(source, pos)
            && rest_of_line(source, pos + run).trim().is_empty()
        {
            return Some(pos + run);
        }
        at = pos + run;
    }
    None
}

/// Byte length of the fence run at `pos`. Tokens made of one repeated
/// character (three backticks, three tildes) may run longer than the token.
fn fence_run(source: &str, pos: usize, fence: &str) -> usize {
    let mut chars = fence.chars();
    match chars.next() {
        Some(c) if chars.all(|other| other == c) => source[pos..]
            .chars()
            .take_while(|&other| other == c)
            .count()
            * c.len_utf8(),
        _ => fence.len(),
    }
}

/// Whether `pos` is preceded on its line by at most three spaces.
fn opens_line(source: &str, pos: usize) -> bool {
    let line_start = source[..pos].rfind('\n').map_or(0, |i| i + 1);
    let indent = &source[line_start..pos];
    indent.len() <= 3 && indent.bytes().all(|b| b == b' ')
}

fn rest_of_line(source: &str, from: usize) -> &str {
    let end = source[from..].find('\n').map_or(source.len(), |i| from + i);
    &source[from..end]
}
