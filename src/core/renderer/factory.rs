// src/core/renderer/factory.rs

use crate::config::RendererConfig;
use crate::core::renderer::api::Renderer;
use crate::core::renderer::backend::BackendRegistry;
use crate::error::Result;
use log::{info, warn};

/// Construct, configure and initialize a renderer.
///
/// The backend is `config.backend` if set, otherwise the registry default.
/// On success the caller owns a ready renderer. On failure the instance has
/// already been shut down and dropped; nothing stays allocated.
pub fn create(registry: &BackendRegistry, config: RendererConfig) -> Result<Box<dyn Renderer>> {
    let name = registry.resolve(config.backend.as_deref())?;
    let mut renderer = registry.construct(name)?;

    renderer.set_config(config);

    if let Err(e) = renderer.initialize() {
        warn!("{name} renderer could not be created: {e}");
        renderer.shutdown();
        return Err(e);
    }

    info!("🎉 {name} renderer created");
    Ok(renderer)
}
