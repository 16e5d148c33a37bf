/// Remote automation service client
///
/// Thin request layer over the service's workflow CRUD API: transparent
/// pagination on reads, read-only-field stripping on writes, and a typed error
/// taxonomy so orchestrators can abort on connectivity failures, surface
/// credential problems, and report per-definition validation rejections.

pub mod client;
pub mod error;

pub use client::{RemoteClient, write_body};
pub use error::ApiError;
