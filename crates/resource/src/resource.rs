//! Resource identity and the load/init/unload state machine.
//!
//! ```text
//! Unloaded -> Loading -> Loaded -> (init ok) stays Loaded
//!                    \-> Failed    (init err) -> Failed
//! Loaded | Failed -> Unloaded   (unload)
//! Failed -> Loading             (retry)
//! ```

use std::{
    fmt,
    path::{Path, PathBuf},
};

use asset::AssetError;
use thiserror::Error;

/// Asset category; selects the loading pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResourceType {
    #[default]
    Unknown,
    Model3D,
    Texture,
    Sound,
    Shader,
    Material,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResourceState {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

/// Unique per [`IdGenerator`], assigned at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id source. Owned by whoever owns the cache; ids start at 1.
#[derive(Debug)]
pub struct IdGenerator {
    next: u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> ResourceId {
        let id = ResourceId(self.next);
        self.next += 1;
        id
    }
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("Failed to initialize '{name}': {reason}")]
    Init { name: String, reason: String },
    #[error("Invalid state transition for '{name}': {from:?} -> {to:?}")]
    InvalidTransition {
        name: String,
        from: ResourceState,
        to: ResourceState,
    },
}

pub type ResourceResult<T> = Result<T, ResourceError>;

/// Metadata every resource carries.
#[derive(Clone, Debug)]
pub struct ResourceInfo {
    name: String,
    path: Option<PathBuf>,
    kind: ResourceType,
    state: ResourceState,
    id: ResourceId,
}

impl ResourceInfo {
    pub fn new(name: impl Into<String>, kind: ResourceType, id: ResourceId) -> Self {
        Self {
            name: name.into(),
            path: None,
            kind,
            state: ResourceState::Unloaded,
            id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source file of the last load attempt.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn kind(&self) -> ResourceType {
        self.kind
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Unloaded | Failed -> Loading.
    pub fn begin_load(&mut self, path: &Path) -> ResourceResult<()> {
        match self.state {
            ResourceState::Unloaded | ResourceState::Failed => {
                self.path = Some(path.to_path_buf());
                self.state = ResourceState::Loading;
                Ok(())
            }
            from => Err(self.invalid(from, ResourceState::Loading)),
        }
    }

    /// Loading -> Loaded.
    pub fn mark_loaded(&mut self) -> ResourceResult<()> {
        match self.state {
            ResourceState::Loading => {
                self.state = ResourceState::Loaded;
                Ok(())
            }
            from => Err(self.invalid(from, ResourceState::Loaded)),
        }
    }

    pub fn mark_failed(&mut self) {
        self.state = ResourceState::Failed;
    }

    pub fn reset(&mut self) {
        self.state = ResourceState::Unloaded;
    }

    fn invalid(&self, from: ResourceState, to: ResourceState) -> ResourceError {
        ResourceError::InvalidTransition {
            name: self.name.clone(),
            from,
            to,
        }
    }
}

/// A cacheable asset. `load` reads and decodes, `init` realizes whatever the
/// loaded data needs before use, `unload` drops the owned data.
pub trait Resource: 'static {
    fn info(&self) -> &ResourceInfo;

    fn load(&mut self, path: &Path) -> ResourceResult<()>;

    fn init(&mut self) -> ResourceResult<()>;

    fn unload(&mut self);

    /// Estimated bytes of owned data.
    fn size_in_bytes(&self) -> usize;

    fn state(&self) -> ResourceState {
        self.info().state()
    }
}

/// Construction on a cache miss.
pub trait Construct: Resource + Sized {
    type Args;

    fn construct(name: &str, id: ResourceId, args: Self::Args) -> Self;
}
