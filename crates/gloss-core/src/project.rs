//! Project: the owner of documents and codes.
//!
//! Codes are only valid on documents of the same project; the project's name
//! and description are also offered to the suggestion provider as context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, document::non_blank};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
  pub project_id:  Uuid,
  pub name:        String,
  pub description: Option<String>,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::RecordStore::add_project`].
#[derive(Debug, Clone)]
pub struct NewProject {
  pub name:        String,
  pub description: Option<String>,
}

impl NewProject {
  /// Trim the name and description, reject a blank name and drop a blank
  /// description.
  pub fn normalized(self) -> Result<Self> {
    Ok(Self {
      name:        non_blank(&self.name).ok_or(Error::EmptyName)?,
      description: self.description.as_deref().and_then(non_blank),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_project_is_trimmed() {
    let project = NewProject {
      name:        "  Caregiver interviews ".into(),
      description: Some("\t".into()),
    }
    .normalized()
    .unwrap();
    assert_eq!(project.name, "Caregiver interviews");
    assert_eq!(project.description, None);
  }

  #[test]
  fn blank_project_name_is_rejected() {
    let r = NewProject { name: "   ".into(), description: None }.normalized();
    assert!(matches!(r, Err(Error::EmptyName)));
  }
}
