use std::ops::Range;
use std::sync::Arc;

/// Location of a statement, or part of one, within the text of its module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceSpan {
  /// Byte offset of the first byte
  pub start: usize,
  /// Byte offset one past the last byte
  pub end: usize,
  /// Zero-based line of the first byte
  pub start_line: usize,
  /// Zero-based line of the last byte
  pub end_line: usize,
}

impl SourceSpan {
  pub fn range(&self) -> Range<usize> {
    self.start..self.end
  }
}

/// Offsets at which every line of a text starts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineIndex {
  line_starts: Vec<usize>,
}

impl LineIndex {
  pub fn new(text: &str) -> Self {
    let mut line_starts = vec![0];
    line_starts.extend(text.match_indices('\n').map(|(offset, _)| offset + 1));
    Self { line_starts }
  }

  /// Zero-based line containing the byte at `offset`
  pub fn line_of(&self, offset: usize) -> usize {
    self
      .line_starts
      .partition_point(|line_start| *line_start <= offset)
      .saturating_sub(1)
  }

  pub fn span(&self, range: Range<usize>) -> SourceSpan {
    let last_byte = if range.end > range.start {
      range.end - 1
    } else {
      range.start
    };

    SourceSpan {
      start: range.start,
      end: range.end,
      start_line: self.line_of(range.start),
      end_line: self.line_of(last_byte),
    }
  }
}

/// The text of a module, shared between every stage that re-emits parts of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleSource {
  text: Arc<str>,
  lines: Arc<LineIndex>,
  /// Byte ranges of string and template literals that span several lines. Lines that start
  /// inside one of them belong to the literal's value and are emitted untouched.
  literal_ranges: Arc<[Range<usize>]>,
}

impl ModuleSource {
  pub fn new(text: impl Into<Arc<str>>, literal_ranges: Vec<Range<usize>>) -> Self {
    let text = text.into();
    let lines = Arc::new(LineIndex::new(&text));

    Self {
      text,
      lines,
      literal_ranges: literal_ranges.into(),
    }
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn lines(&self) -> &LineIndex {
    &self.lines
  }

  pub fn span(&self, range: Range<usize>) -> SourceSpan {
    self.lines.span(range)
  }

  pub fn slice(&self, span: &SourceSpan) -> &str {
    &self.text[span.range()]
  }

  pub fn is_inside_literal(&self, offset: usize) -> bool {
    self
      .literal_ranges
      .iter()
      .any(|range| range.start < offset && offset < range.end)
  }
}
