//! The Gloss annotation service.
//!
//! Ties a [`gloss_core::store::RecordStore`] and a
//! [`gloss_suggest::SuggestionProvider`] together behind one
//! [`AnnotationService`]: interval operations run under per-document locks
//! nested in per-project locks, and suggestion requests are bounded by a
//! timeout.
//!
//! ```rust,ignore
//! let service = AnnotationService::new(Arc::new(store), provider)
//!   .with_timeout(Duration::from_secs(20));
//! let assignment = service.assign_codes(document_id, 0, 12, &[code_id]).await?;
//! ```

mod locks;
pub mod error;
pub mod service;

pub use error::{Error, Result};
pub use service::{AnnotationService, Assignment, DocumentCoding};
