//! Resource lifecycle and caching.
//!
//! A [`ResourceCache`] hands out shared [`Handle`]s and guarantees each key is
//! loaded and initialized at most once while it stays registered.

pub mod cache;
pub mod model;
pub mod resource;
pub mod texture;

pub use cache::{CacheError, Handle, ResourceCache};
pub use model::{Model, ModelFormat};
pub use resource::{
    Construct, IdGenerator, Resource, ResourceError, ResourceId, ResourceInfo, ResourceResult,
    ResourceState, ResourceType,
};
pub use texture::Texture;
