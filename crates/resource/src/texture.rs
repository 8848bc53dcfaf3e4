//! Texture resource backed by decoded RGBA8 pixels.

use std::path::Path;

use asset::TextureData;

use crate::resource::{
    Construct, Resource, ResourceError, ResourceId, ResourceInfo, ResourceResult, ResourceType,
};

#[derive(Debug)]
pub struct Texture {
    info: ResourceInfo,
    data: Option<TextureData>,
}

impl Texture {
    pub fn new(name: &str, id: ResourceId) -> Self {
        Self {
            info: ResourceInfo::new(name, ResourceType::Texture, id),
            data: None,
        }
    }

    pub fn data(&self) -> Option<&TextureData> {
        self.data.as_ref()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.data.as_ref().map(|d| (d.width, d.height))
    }
}

impl Resource for Texture {
    fn info(&self) -> &ResourceInfo {
        &self.info
    }

    fn load(&mut self, path: &Path) -> ResourceResult<()> {
        self.info.begin_load(path)?;
        match TextureData::load_rgba8(path) {
            Ok(data) => {
                self.data = Some(data);
                self.info.mark_loaded()
            }
            Err(e) => {
                self.info.mark_failed();
                Err(e.into())
            }
        }
    }

    fn init(&mut self) -> ResourceResult<()> {
        if self.data.as_ref().is_some_and(TextureData::is_valid) {
            return Ok(());
        }
        self.info.mark_failed();
        Err(ResourceError::Init {
            name: self.info.name().to_string(),
            reason: "texture has no valid pixel data".to_string(),
        })
    }

    fn unload(&mut self) {
        self.data = None;
        self.info.reset();
    }

    fn size_in_bytes(&self) -> usize {
        self.data.as_ref().map_or(0, TextureData::size_in_bytes)
    }
}

impl Construct for Texture {
    type Args = ();

    fn construct(name: &str, id: ResourceId, _args: ()) -> Self {
        Self::new(name, id)
    }
}
