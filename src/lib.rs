//! emotion-journal: emoji journal with sentiment classification, using Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
