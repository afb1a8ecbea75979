//! HTTP surface for inference jobs.

pub mod app;
pub mod error;
pub mod handlers;
pub mod state;
