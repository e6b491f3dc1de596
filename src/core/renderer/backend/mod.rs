// src/core/renderer/backend/mod.rs
#[cfg(feature = "vulkan")]
pub mod vulkan;

#[cfg(feature = "vulkan")]
pub use vulkan::VulkanRenderer;

use crate::core::renderer::api::Renderer;
use crate::error::{AppError, Result};
use smallvec::SmallVec;

/// Builds one unconfigured, uninitialized renderer.
pub type Constructor = Box<dyn Fn() -> Box<dyn Renderer>>;

/// Maps backend names to constructors; the factory only ever goes through here.
pub struct BackendRegistry {
    // A handful of backends at most; SmallVec keeps them inline
    entries: SmallVec<[(&'static str, Constructor); 4]>,
    default: Option<&'static str>,
}

impl BackendRegistry {
    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            entries: SmallVec::new(),
            default: None,
        }
    }

    /// Register `constructor` under `name`, replacing any previous entry.
    /// The first registered backend becomes the default.
    pub fn register<F>(&mut self, name: &'static str, constructor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Renderer> + 'static,
    {
        let constructor: Constructor = Box::new(constructor);
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = constructor,
            None => self.entries.push((name, constructor)),
        }
        if self.default.is_none() {
            self.default = Some(name);
        }
        self
    }

    pub fn set_default(&mut self, name: &str) -> Result<()> {
        let name = self.lookup(name)?.0;
        self.default = Some(name);
        Ok(())
    }

    pub fn default_backend(&self) -> Option<&'static str> {
        self.default
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| *n == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(n, _)| *n)
    }

    /// The requested name, or the default when none was requested.
    pub fn resolve(&self, requested: Option<&str>) -> Result<&'static str> {
        match requested {
            Some(name) => Ok(self.lookup(name)?.0),
            None => self
                .default
                .ok_or_else(|| AppError::UnknownBackend("<default>".to_owned())),
        }
    }

    /// Build a fresh renderer of the named backend.
    pub fn construct(&self, name: &str) -> Result<Box<dyn Renderer>> {
        let (_, constructor) = self.lookup(name)?;
        Ok(constructor())
    }

    fn lookup(&self, name: &str) -> Result<&(&'static str, Constructor)> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .ok_or_else(|| AppError::UnknownBackend(name.to_owned()))
    }
}

impl Default for BackendRegistry {
    /// Every backend compiled into this build.
    fn default() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::empty();
        #[cfg(feature = "vulkan")]
        registry.register(vulkan::NAME, || -> Box<dyn Renderer> {
            Box::new(VulkanRenderer::default())
        });
        registry
    }
}
