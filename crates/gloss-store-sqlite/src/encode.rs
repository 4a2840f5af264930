//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Code flags are stored as a
//! compact JSON array. UUIDs are stored as hyphenated lowercase strings;
//! offsets as `INTEGER`.

use chrono::{DateTime, Utc};
use gloss_core::{
  document::{Code, Document},
  project::Project,
  segment::Segment,
  settings::{Settings, SuggestionLimit},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Offsets ──────────────────────────────────────────────────────────────────

pub fn encode_offset(offset: usize) -> i64 { offset as i64 }

pub fn decode_offset(raw: i64) -> Result<usize> {
  usize::try_from(raw).map_err(|_| Error::Decode(format!("negative offset: {raw}")))
}

// ─── Flags ────────────────────────────────────────────────────────────────────

pub fn encode_flags(flags: &[String]) -> Result<String> {
  Ok(serde_json::to_string(flags)?)
}

pub fn decode_flags(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

// ─── Settings ─────────────────────────────────────────────────────────────────

pub fn decode_settings(ai_enabled: bool, limit: i64) -> Result<Settings> {
  let limit = u8::try_from(limit)
    .map_err(|_| Error::Decode(format!("suggestion limit out of range: {limit}")))?;
  Ok(Settings {
    ai_enabled,
    suggestion_limit: SuggestionLimit::new(limit)?,
  })
}

// ─── Row types ────────────────────────────────────────────────────────────────

/// Raw strings read directly from a `projects` row.
pub struct RawProject {
  pub project_id:  String,
  pub name:        String,
  pub description: Option<String>,
  pub created_at:  String,
}

impl RawProject {
  pub fn into_project(self) -> Result<Project> {
    Ok(Project {
      project_id:  decode_uuid(&self.project_id)?,
      name:        self.name,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `documents` row.
pub struct RawDocument {
  pub document_id: String,
  pub project_id:  String,
  pub name:        String,
  pub text:        String,
  pub created_at:  String,
}

impl RawDocument {
  pub fn into_document(self) -> Result<Document> {
    Ok(Document {
      document_id: decode_uuid(&self.document_id)?,
      project_id:  decode_uuid(&self.project_id)?,
      name:        self.name,
      text:        self.text,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `codes` row.
pub struct RawCode {
  pub code_id:     String,
  pub project_id:  String,
  pub name:        String,
  pub description: Option<String>,
  pub color:       Option<String>,
  pub flags:       String,
}

impl RawCode {
  pub fn into_code(self) -> Result<Code> {
    Ok(Code {
      code_id:     decode_uuid(&self.code_id)?,
      project_id:  decode_uuid(&self.project_id)?,
      name:        self.name,
      description: self.description,
      color:       self.color,
      flags:       decode_flags(&self.flags)?,
    })
  }
}

/// A `segments` row plus its `coded_segments` code ids in position order.
pub struct RawSegment {
  pub segment_id:   String,
  pub document_id:  String,
  pub start_offset: i64,
  pub end_offset:   i64,
  pub text:         String,
  pub created_at:   String,
  pub codes:        Vec<String>,
}

impl RawSegment {
  pub fn into_segment(self) -> Result<Segment> {
    Ok(Segment {
      segment_id:   decode_uuid(&self.segment_id)?,
      document_id:  decode_uuid(&self.document_id)?,
      start_offset: decode_offset(self.start_offset)?,
      end_offset:   decode_offset(self.end_offset)?,
      text:         self.text,
      created_at:   decode_dt(&self.created_at)?,
      codes:        self
        .codes
        .iter()
        .map(|c| decode_uuid(c))
        .collect::<Result<_>>()?,
    })
  }
}

/// A segment flattened to column values, ready to move into a database
/// closure.
pub struct SegmentRow {
  pub segment_id:   String,
  pub document_id:  String,
  pub start_offset: i64,
  pub end_offset:   i64,
  pub text:         String,
  pub created_at:   String,
  pub codes:        Vec<String>,
}

impl From<&Segment> for SegmentRow {
  fn from(s: &Segment) -> Self {
    Self {
      segment_id:   encode_uuid(s.segment_id),
      document_id:  encode_uuid(s.document_id),
      start_offset: encode_offset(s.start_offset),
      end_offset:   encode_offset(s.end_offset),
      text:         s.text.clone(),
      created_at:   encode_dt(s.created_at),
      codes:        s.codes.iter().copied().map(encode_uuid).collect(),
    }
  }
}
