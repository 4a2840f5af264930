//! Run decomposition: splitting a document into plain and coded runs for
//! display.
//!
//! The runs of a document cover `[0, len)` exactly once, left to right, with
//! coded runs wrapping segments and plain runs filling every gap between them.

use serde::Serialize;

use crate::{
  document::{byte_offset, char_len},
  segment::Segment,
};

/// One renderable piece of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Run<'a> {
  /// Uncoded text over `[start, end)`.
  Plain {
    start: usize,
    end:   usize,
    text:  &'a str,
  },
  /// A coded segment.
  Coded { segment: &'a Segment },
}

impl<'a> Run<'a> {
  /// The `[start, end)` span of this run, in `char`s.
  pub fn span(&self) -> (usize, usize) {
    match *self {
      Self::Plain { start, end, .. } => (start, end),
      Self::Coded { segment } => (segment.start_offset, segment.end_offset),
    }
  }

  pub fn text(&self) -> &'a str {
    match *self {
      Self::Plain { text, .. } => text,
      Self::Coded { segment } => &segment.text,
    }
  }

  pub fn is_coded(&self) -> bool { matches!(self, Self::Coded { .. }) }
}

/// Lazy iterator over the runs of a document; see [`decompose`].
///
/// A clone resumes from the same position independently of the original, so
/// cloning a fresh iterator lets the runs be walked more than once.
#[derive(Debug, Clone)]
pub struct Runs<'a> {
  text:     &'a str,
  len:      usize,
  segments: std::vec::IntoIter<&'a Segment>,
  /// A coded run held back while the plain gap before it is emitted.
  pending:  Option<&'a Segment>,
  /// Position in `char`s.
  cursor:   usize,
  /// The same position in bytes.
  byte_at:  usize,
}

/// Decompose `text` into runs around `segments`.
///
/// Segments are visited in ascending `start_offset` order (ties keep their
/// input order). The cursor never moves backwards and never passes the end of
/// the text, so malformed input yields odd runs rather than a panic.
pub fn decompose<'a>(text: &'a str, segments: &'a [Segment]) -> Runs<'a> {
  let mut sorted: Vec<&Segment> = segments.iter().collect();
  sorted.sort_by_key(|s| s.start_offset);
  Runs {
    text,
    len: char_len(text),
    segments: sorted.into_iter(),
    pending: None,
    cursor: 0,
    byte_at: 0,
  }
}

impl<'a> Runs<'a> {
  fn advance_to(&mut self, to: usize) {
    let to = to.min(self.len);
    if to > self.cursor {
      self.byte_at += byte_offset(&self.text[self.byte_at..], to - self.cursor);
      self.cursor = to;
    }
  }

  fn plain_to(&mut self, to: usize) -> Run<'a> {
    let (start, from) = (self.cursor, self.byte_at);
    self.advance_to(to);
    Run::Plain {
      start,
      end: self.cursor,
      text: &self.text[from..self.byte_at],
    }
  }

  fn coded(&mut self, segment: &'a Segment) -> Run<'a> {
    self.advance_to(segment.end_offset);
    Run::Coded { segment }
  }
}

impl<'a> Iterator for Runs<'a> {
  type Item = Run<'a>;

  fn next(&mut self) -> Option<Run<'a>> {
    if let Some(segment) = self.pending.take() {
      return Some(self.coded(segment));
    }

    match self.segments.next() {
      Some(segment) => {
        if segment.start_offset.min(self.len) > self.cursor {
          self.pending = Some(segment);
          Some(self.plain_to(segment.start_offset))
        } else {
          Some(self.coded(segment))
        }
      }
      None if self.cursor < self.len => Some(self.plain_to(self.len)),
      None => None,
    }
  }
}
