//! tserve Core - shared types for the model server configuration core
//!
//! This crate provides the error taxonomy and the metric record types used by
//! the configuration crate and the CLI.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod metric;

pub use error::{Result, TsError};
pub use metric::{Dimension, Metric};
