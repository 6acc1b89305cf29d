//! Two-phase batch resolution pipeline.

pub mod batch;

pub use batch::{BatchPipeline, DEFAULT_CONCURRENCY};
