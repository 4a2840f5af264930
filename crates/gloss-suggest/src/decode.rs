//! Tolerant decoder for provider replies.
//!
//! Pipeline:
//!   raw &str
//!     └─ reply_lines()   → cleaned, non-empty lines
//!          └─ decode_line() → Option<Suggestion>
//!               └─ take(limit) → Vec<Suggestion>
//!
//! Wire grammar, one record per line, fields separated by `|`:
//!
//! ```text
//! EXISTING | <index> | <confidence?> | <rationale...>
//! NEW      | <name>  | <description?> | <flags?> | <confidence?> | <rationale...>
//! ```
//!
//! A line that does not fit is skipped; it never aborts the rest of the reply.

use gloss_core::{
  document::normalize_flags, settings::SuggestionLimit, suggestion::Suggestion,
};
use strum::{AsRefStr, EnumString};

use crate::codebook::IndexedCodebook;

/// The leading keyword of a reply line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub(crate) enum RecordKind {
  Existing,
  New,
}

/// Decode at most `limit` suggestions from `raw`.
pub fn decode(
  raw: &str,
  codebook: &IndexedCodebook,
  limit: SuggestionLimit,
) -> Vec<Suggestion> {
  reply_lines(raw)
    .filter_map(|line| {
      let decoded = decode_line(line, codebook);
      if decoded.is_none() {
        tracing::debug!(line, "skipping undecodable suggestion line");
      }
      decoded
    })
    .take(limit.get())
    .collect()
}

/// Split `raw` into trimmed, non-empty lines.
///
/// Providers sometimes emit the two-character escapes `\n` / `\r` instead of
/// real line breaks, and sometimes prefix a line with a stray backslash; both
/// are undone here.
fn reply_lines(raw: &str) -> impl Iterator<Item = &str> + '_ {
  raw
    .split(['\n', '\r'])
    .flat_map(|line| line.split("\\r\\n"))
    .flat_map(|line| line.split("\\n"))
    .flat_map(|line| line.split("\\r"))
    .map(str::trim)
    .map(|line| line.strip_prefix('\\').unwrap_or(line).trim())
    .filter(|line| !line.is_empty())
}

fn decode_line(line: &str, codebook: &IndexedCodebook) -> Option<Suggestion> {
  let fields: Vec<&str> = line.split('|').map(str::trim).collect();
  let kind: RecordKind = fields.first()?.parse().ok()?;

  match kind {
    RecordKind::Existing => {
      if fields.len() < 4 {
        return None;
      }
      let index: usize = fields[1].parse().ok()?;
      let code = codebook.resolve(index)?;
      Some(Suggestion::Existing {
        code_id:    code.code_id,
        confidence: parse_confidence(fields[2]),
        rationale:  rejoin(&fields[3..]),
      })
    }
    RecordKind::New => {
      if fields.len() < 2 || fields[1].is_empty() {
        return None;
      }
      Some(Suggestion::New {
        name:        fields[1].to_owned(),
        description: fields.get(2).filter(|d| !d.is_empty()).map(|d| (*d).to_owned()),
        flags:       fields
          .get(3)
          .map(|f| normalize_flags(f.split(',')))
          .unwrap_or_default(),
        confidence:  fields.get(4).and_then(|c| parse_confidence(c)),
        rationale:   fields.get(5..).and_then(rejoin),
      })
    }
  }
}

/// A confidence is kept only if it is a finite number. It is not clamped.
fn parse_confidence(field: &str) -> Option<f64> {
  field.parse::<f64>().ok().filter(|c| c.is_finite())
}

/// Rejoin trailing free-text fields that were split on `|`.
fn rejoin(fields: &[&str]) -> Option<String> {
  if fields.iter().all(|f| f.is_empty()) {
    return None;
  }
  Some(fields.join(" | "))
}
