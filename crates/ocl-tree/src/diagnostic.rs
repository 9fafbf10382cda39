//! Diagnostic rendering for lexical errors.

use ariadne::{Color, Label, Report, ReportKind, Source};
use ocl_parse::{LexError, LexErrorKind, Position, Span};
use std::ops::Range;

/// A parse failure with source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The kind of error.
    pub kind: LexErrorKind,
    /// Source location.
    pub span: Span,
    /// Line and column where `span` starts.
    pub position: Position,
}

impl ParseError {
    /// Render this error with ariadne.
    ///
    /// Returns a string containing the formatted error message with source context.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| format!("{}", self))
    }

    /// Write the error report to a writer.
    pub fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, writer: W) {
        let report = self.build_report(filename, source);
        let _ = report
            .finish()
            .write((filename, Source::from(source)), writer);
    }

    fn build_report<'a>(
        &self,
        filename: &'a str,
        source: &str,
    ) -> ariadne::ReportBuilder<'static, (&'a str, Range<usize>)> {
        let range = char_range(source, self.span);

        match &self.kind {
            LexErrorKind::UnterminatedString => Report::build(ReportKind::Error, (filename, range.clone()))
                .with_message("unterminated string")
                .with_label(
                    Label::new((filename, range))
                        .with_message("string starts here")
                        .with_color(Color::Red),
                )
                .with_help("close the string with '\"' before the end of the line"),

            LexErrorKind::UnterminatedHeredoc => Report::build(ReportKind::Error, (filename, range.clone()))
                .with_message("unterminated heredoc")
                .with_label(
                    Label::new((filename, range))
                        .with_message("no terminator line after this")
                        .with_color(Color::Red),
                )
                .with_help("end the heredoc with its terminator on a line of its own"),

            LexErrorKind::InvalidHeredoc => Report::build(ReportKind::Error, (filename, range.clone()))
                .with_message("unexpected text after heredoc marker")
                .with_label(
                    Label::new((filename, range))
                        .with_message("heredoc opened here")
                        .with_color(Color::Red),
                )
                .with_help("the heredoc body starts on the line after '<<EOT'"),

            LexErrorKind::InvalidEscape(seq) => Report::build(ReportKind::Error, (filename, range.clone()))
                .with_message(format!("invalid escape sequence '{}'", seq))
                .with_label(
                    Label::new((filename, range))
                        .with_message("invalid escape")
                        .with_color(Color::Red),
                )
                .with_help("valid escapes are: \\\", \\\\, \\/, \\b, \\f, \\n, \\r, \\t, \\uXXXX"),
        }
    }
}

/// Character range covered by a byte span, clamped to `source`.
/// Ariadne indexes sources by character.
fn char_range(source: &str, span: Span) -> Range<usize> {
    let floor = |offset: u32| {
        let mut offset = (offset as usize).min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    };
    let start = floor(span.start);
    let end = floor(span.end).max(start);
    let first = source[..start].chars().count();
    first..first + source[start..end].chars().count()
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        Self {
            kind: err.kind,
            span: err.span,
            position: err.position,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.kind, self.position)
    }
}

impl std::error::Error for ParseError {}
