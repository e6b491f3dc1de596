// src/library.rs

use crate::config::RendererConfig;
use crate::core::renderer::api::Renderer;
use crate::core::renderer::backend::BackendRegistry;
use crate::core::renderer::factory;
use crate::error::Result;
use log::{info, warn};

/// Library-wide state. Renderers are created through a live `Library`, so
/// nothing can be created before initialization.
pub struct Library {
    registry: BackendRegistry,
    active: bool,
}

impl Library {
    /// Initialize with every backend compiled into this build.
    pub fn initialize() -> Result<Self> {
        Self::with_registry(BackendRegistry::default())
    }

    pub fn with_registry(registry: BackendRegistry) -> Result<Self> {
        info!("Initializing AquaVisual {}...", Self::version());
        let backends: Vec<&str> = registry.names().collect();
        if backends.is_empty() {
            warn!("No renderer backends registered; renderer creation will fail");
        } else {
            info!("Available backends: {backends:?}");
        }
        Ok(Self {
            registry,
            active: true,
        })
    }

    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut BackendRegistry {
        &mut self.registry
    }

    /// Create a ready renderer, or report why none could be created.
    pub fn create_renderer(&self, config: RendererConfig) -> Result<Box<dyn Renderer>> {
        factory::create(&self.registry, config)
    }

    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.active {
            self.active = false;
            info!("AquaVisual shutdown complete");
        }
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        self.teardown();
    }
}
