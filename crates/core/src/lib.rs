//! Core shared types and errors (renderer-agnostic).

pub use glam::{Vec3, vec3};

pub mod bounds;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Empty point set: bounds are undefined")]
    EmptyBounds,
    #[error("Non-finite coordinate in point set: {0:?}")]
    NonFinite([f32; 3]),
}

pub type CoreResult<T> = Result<T, CoreError>;
