//! Library surface of the `ipforge` CLI: configuration, pipeline
//! orchestration, reporting, and the validation seam. The binary in
//! `main.rs` is a thin argument-parsing shell over this.

#![warn(missing_docs)]

pub mod config;
pub mod pipeline;
pub mod report;
pub mod validate;
