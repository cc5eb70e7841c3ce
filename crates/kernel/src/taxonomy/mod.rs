//! Error taxonomy.
//!
//! Internal error messages carry a fixed-width [`ErrorCode`] prefix. The
//! dispatcher reads the prefix, runs the paired diagnostic extractor and
//! produces a [`ClassifiedError`] with the HTTP status to report.

mod code;
mod database;
mod dispatch;

pub use code::ErrorCode;
pub use database::{tag_constraint_violation, tag_database_error};
pub use dispatch::{ClassifiedError, ErrorKind, ExtractorSet, classify};
