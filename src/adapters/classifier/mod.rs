//! Sentiment classifier adapters. Implement ClassifierPort.
//!
//! Hosted inference adapter for production, word-list adapter for offline use and tests.

pub mod inference_api;
pub mod lexicon;

pub use inference_api::{DEFAULT_MODEL, InferenceApiClassifier, default_api_url};
pub use lexicon::LexiconClassifier;
