//! Plain-text rendering of records for the terminal.

use std::{collections::HashMap, fmt::Write as _};

use gloss_annotate::DocumentCoding;
use gloss_core::{document::Code, runs::Run, suggestion::Suggestion};
use uuid::Uuid;

/// Code names by id, falling back to the id for unknown codes.
pub struct CodeNames(HashMap<Uuid, String>);

impl CodeNames {
  pub fn new(codes: &[Code]) -> Self {
    Self(codes.iter().map(|c| (c.code_id, c.name.clone())).collect())
  }

  fn get(&self, id: &Uuid) -> String {
    self.0.get(id).cloned().unwrap_or_else(|| id.to_string())
  }

  fn join(&self, ids: &[Uuid]) -> String {
    ids.iter().map(|id| self.get(id)).collect::<Vec<_>>().join(", ")
  }
}

/// Inline view of a document: coded runs are bracketed and tagged with their
/// code names.
pub fn coded_text(coding: &DocumentCoding, names: &CodeNames) -> String {
  let mut out = String::new();
  for run in coding.runs() {
    match run {
      Run::Plain { text, .. } => out.push_str(text),
      Run::Coded { segment } => {
        let _ = write!(out, "[{}]{{{}}}", segment.text, names.join(&segment.codes));
      }
    }
  }
  out
}

/// One line per segment: span, id and codes.
pub fn segment_table(coding: &DocumentCoding, names: &CodeNames) -> String {
  let mut out = String::new();
  for s in &coding.segments {
    let _ = writeln!(
      out,
      "{:>6}..{:<6} {}  {}",
      s.start_offset,
      s.end_offset,
      s.segment_id,
      names.join(&s.codes),
    );
  }
  out
}

pub fn code_line(code: &Code) -> String {
  let mut line = format!("{}  {}", code.code_id, code.name);
  if let Some(description) = &code.description {
    let _ = write!(line, " - {description}");
  }
  if !code.flags.is_empty() {
    let _ = write!(line, " [{}]", code.flags.join(", "));
  }
  line
}

pub fn suggestion_line(suggestion: &Suggestion, names: &CodeNames) -> String {
  let mut line = match suggestion {
    Suggestion::Existing { code_id, .. } => format!("existing  {}", names.get(code_id)),
    Suggestion::New { name, description, .. } => match description {
      Some(d) => format!("new       {name} - {d}"),
      None => format!("new       {name}"),
    },
  };
  if let Some(confidence) = suggestion.confidence() {
    let _ = write!(line, " ({confidence:.2})");
  }
  if let Some(rationale) = suggestion.rationale() {
    let _ = write!(line, ": {rationale}");
  }
  line
}
