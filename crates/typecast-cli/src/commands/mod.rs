//! Command implementations.

pub mod infer;
pub mod jobs;
pub mod serve;
pub mod update;
