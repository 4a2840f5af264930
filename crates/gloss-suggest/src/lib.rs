//! Suggestion plumbing for Gloss.
//!
//! Renders the prompt for a passage, sends it through a
//! [`SuggestionProvider`], and decodes the line-oriented reply back into
//! [`gloss_core::suggestion::Suggestion`]s.
//!
//! # Quick start
//!
//! ```no_run
//! use gloss_core::settings::SuggestionLimit;
//! use gloss_suggest::{IndexedCodebook, decode};
//!
//! let book = IndexedCodebook::default();
//! let reply = "NEW | Resilience | Bouncing back | affect | 0.8 | talks about recovery";
//! let suggestions = decode(reply, &book, SuggestionLimit::default());
//! println!("{} suggestions", suggestions.len());
//! ```

pub mod codebook;
pub mod decode;
pub mod error;
pub mod prompt;
pub mod provider;

pub use codebook::IndexedCodebook;
pub use decode::decode;
pub use error::{Error, Result};
pub use prompt::{Prompt, render};
pub use provider::{
  ChatCompletionsConfig, ChatCompletionsProvider, SuggestionProvider,
};
