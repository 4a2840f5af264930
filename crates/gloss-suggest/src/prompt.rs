//! Prompt rendering for suggestion requests.
//!
//! The system instruction pins the reply grammar that [`crate::decode`]
//! understands; the user payload carries the project context, the indexed
//! codebook and the passage itself.

use std::fmt::Write as _;

use gloss_core::{project::Project, settings::SuggestionLimit};

use crate::{codebook::IndexedCodebook, decode::RecordKind};

/// A rendered request: one system instruction and one user payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
  pub system: String,
  pub user:   String,
}

/// Render the instruction and payload for `span`.
pub fn render(
  project: Option<&Project>,
  codebook: &IndexedCodebook,
  span: &str,
  limit: SuggestionLimit,
) -> Prompt {
  Prompt {
    system: system_instruction(limit),
    user:   user_payload(project, codebook, span),
  }
}

fn system_instruction(limit: SuggestionLimit) -> String {
  let existing = RecordKind::Existing.as_ref();
  let new = RecordKind::New.as_ref();
  format!(
    "You help a qualitative researcher code passages of text.\n\
     Suggest up to {limit} codes for the passage. Prefer codes from the \
     codebook; propose a new code only when none of them fits.\n\
     Reply with one suggestion per line and nothing else. Each line must use \
     exactly one of these forms:\n\
     {existing} | <codebook number> | <confidence between 0 and 1> | <rationale>\n\
     {new} | <name> | <description> | <comma-separated flags> | <confidence between 0 and 1> | <rationale>\n\
     Refer to codebook entries only by the number shown before them. Leave a \
     field empty rather than dropping it. Do not use markdown.",
    limit = limit.get(),
  )
}

fn user_payload(
  project: Option<&Project>,
  codebook: &IndexedCodebook,
  span: &str,
) -> String {
  let mut out = String::new();

  if let Some(project) = project {
    let _ = writeln!(out, "Project: {}", project.name);
    if let Some(description) = &project.description {
      let _ = writeln!(out, "Project description: {description}");
    }
    out.push('\n');
  }

  out.push_str("Codebook:\n");
  if codebook.is_empty() {
    out.push_str("(no codes yet)\n");
  }
  for (index, code) in codebook.iter() {
    let _ = write!(out, "{index}. {}", code.name);
    if let Some(description) = &code.description {
      let _ = write!(out, " - {description}");
    }
    if !code.flags.is_empty() {
      let _ = write!(out, " [flags: {}]", code.flags.join(", "));
    }
    out.push('\n');
  }

  let _ = write!(out, "\nPassage:\n\"\"\"\n{span}\n\"\"\"\n");
  out
}
