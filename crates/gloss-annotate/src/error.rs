//! The error taxonomy callers of [`crate::AnnotationService`] see.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("document not found: {0}")]
  DocumentNotFound(Uuid),

  #[error("code not found: {0}")]
  CodeNotFound(Uuid),

  #[error("segment not found: {0}")]
  SegmentNotFound(Uuid),

  /// A code id that is unknown or belongs to another project.
  #[error("code {0} does not belong to the document's project")]
  InvalidReference(Uuid),

  #[error("invalid range [{start}, {end}) for text of length {len}")]
  InvalidRange { start: usize, end: usize, len: usize },

  #[error("at least one code is required to create a segment")]
  EmptyCodes,

  /// Input rejected before reaching the store (blank names, bad limits).
  #[error("invalid input: {0}")]
  InvalidInput(String),

  /// The provider could not be reached, answered with a failure status, or
  /// did not answer in time.
  #[error("suggestion provider unavailable: {0}")]
  UpstreamUnavailable(String),

  /// The provider answered without usable text.
  #[error("suggestion provider returned a malformed response: {0}")]
  UpstreamMalformed(String),

  #[error("suggestions are disabled in settings")]
  SuggestionsDisabled,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

impl From<gloss_core::Error> for Error {
  fn from(e: gloss_core::Error) -> Self {
    use gloss_core::Error as Core;
    match e {
      Core::InvalidRange { start, end, len } => Self::InvalidRange { start, end, len },
      Core::InvalidReference(id) => Self::InvalidReference(id),
      Core::EmptyCodes => Self::EmptyCodes,
      e @ (Core::InvalidLimit(_) | Core::EmptyName) => Self::InvalidInput(e.to_string()),
      e @ Core::Serialization(_) => Self::store(e),
    }
  }
}

impl From<gloss_suggest::Error> for Error {
  fn from(e: gloss_suggest::Error) -> Self {
    use gloss_suggest::Error as Suggest;
    match e {
      e @ (Suggest::Unavailable(_) | Suggest::Client(_)) => {
        Self::UpstreamUnavailable(e.to_string())
      }
      e @ (Suggest::EmptyResponse | Suggest::InvalidBody(_)) => {
        Self::UpstreamMalformed(e.to_string())
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn core_errors_keep_their_kind() {
    let id = Uuid::new_v4();
    assert!(matches!(
      Error::from(gloss_core::Error::InvalidReference(id)),
      Error::InvalidReference(got) if got == id
    ));
    assert!(matches!(
      Error::from(gloss_core::Error::InvalidRange { start: 3, end: 2, len: 5 }),
      Error::InvalidRange { start: 3, end: 2, len: 5 }
    ));
    assert!(matches!(Error::from(gloss_core::Error::EmptyName), Error::InvalidInput(_)));
  }

  #[test]
  fn provider_errors_split_into_unavailable_and_malformed() {
    assert!(matches!(
      Error::from(gloss_suggest::Error::Unavailable("503".into())),
      Error::UpstreamUnavailable(_)
    ));
    assert!(matches!(
      Error::from(gloss_suggest::Error::EmptyResponse),
      Error::UpstreamMalformed(_)
    ));
    assert!(matches!(
      Error::from(gloss_suggest::Error::InvalidBody("eof".into())),
      Error::UpstreamMalformed(_)
    ));
  }
}
