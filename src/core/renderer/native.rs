// src/core/renderer/native.rs

use crate::config::RendererConfig;
use crate::core::renderer::api::Renderer;
use crate::error::{AppError, Result};
use log::{debug, info, warn};

/// The boundary to a native graphics API.
pub trait NativeBackend {
    /// Name the backend is registered under.
    const NAME: &'static str;

    /// Ready-to-use device/session handle owned by the renderer.
    type Context;

    /// Feature identifiers the API supports. An empty list is a valid answer
    /// and means the backend cannot be used.
    fn query_capabilities(&mut self) -> Result<Vec<String>>;

    /// Must release anything it acquired before returning an error.
    fn create_context(&mut self, config: &RendererConfig) -> Result<Self::Context>;

    fn destroy_context(&mut self, context: Self::Context);
}

/// `Renderer` implementation shared by every native backend.
pub struct NativeRenderer<B: NativeBackend> {
    backend: B,
    config: RendererConfig,
    capabilities: Vec<String>,
    context: Option<B::Context>, // Some only while initialized
}

impl<B: NativeBackend + Default> Default for NativeRenderer<B> {
    fn default() -> Self {
        Self::new(B::default())
    }
}

impl<B: NativeBackend> NativeRenderer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: RendererConfig::default(),
            capabilities: Vec::new(),
            context: None,
        }
    }

    pub fn context(&self) -> Option<&B::Context> {
        self.context.as_ref()
    }
}

impl<B: NativeBackend> Renderer for NativeRenderer<B> {
    fn backend_name(&self) -> &'static str {
        B::NAME
    }

    fn set_config(&mut self, config: RendererConfig) {
        if self.context.is_some() {
            warn!(
                "{}: configuration changed while initialized; applies after the next initialize",
                B::NAME
            );
        }
        self.config = config;
    }

    fn config(&self) -> &RendererConfig {
        &self.config
    }

    fn initialize(&mut self) -> Result<()> {
        if self.context.is_some() {
            return Err(AppError::AlreadyInitialized);
        }

        info!(
            "{}: initializing {}x{} '{}' (validation: {}, vsync: {})",
            B::NAME,
            self.config.width,
            self.config.height,
            self.config.title,
            self.config.enable_validation,
            self.config.enable_vsync
        );

        let capabilities = self.backend.query_capabilities()?;
        debug!("{}: {} supported features", B::NAME, capabilities.len());
        if capabilities.is_empty() {
            return Err(AppError::Unavailable(format!(
                "{} reports no supported features",
                B::NAME
            )));
        }

        let context = self.backend.create_context(&self.config)?;
        self.capabilities = capabilities;
        self.context = Some(context);
        info!("✅ {} renderer ready", B::NAME);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.context.is_some()
    }

    fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    fn shutdown(&mut self) {
        // take() guarantees a single release per context
        if let Some(context) = self.context.take() {
            self.backend.destroy_context(context);
            self.capabilities.clear();
            info!("{} renderer shut down", B::NAME);
        }
    }
}

impl<B: NativeBackend> Drop for NativeRenderer<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Tally {
        features: usize,
        live: Rc<Cell<i32>>,
        destroyed: Rc<Cell<u32>>,
    }

    impl NativeBackend for Tally {
        const NAME: &'static str = "tally";
        type Context = u32;

        fn query_capabilities(&mut self) -> Result<Vec<String>> {
            Ok((0..self.features).map(|i| format!("feature_{i}")).collect())
        }

        fn create_context(&mut self, _config: &RendererConfig) -> Result<u32> {
            self.live.set(self.live.get() + 1);
            Ok(7)
        }

        fn destroy_context(&mut self, context: u32) {
            assert_eq!(context, 7);
            self.live.set(self.live.get() - 1);
            self.destroyed.set(self.destroyed.get() + 1);
        }
    }

    fn tallying(features: usize) -> (NativeRenderer<Tally>, Rc<Cell<i32>>, Rc<Cell<u32>>) {
        let live = Rc::new(Cell::new(0));
        let destroyed = Rc::new(Cell::new(0));
        let renderer = NativeRenderer::new(Tally {
            features,
            live: live.clone(),
            destroyed: destroyed.clone(),
        });
        (renderer, live, destroyed)
    }

    #[test]
    fn starts_uninitialized() {
        let (renderer, live, _) = tallying(1);
        assert!(!renderer.is_initialized());
        assert!(renderer.capabilities().is_empty());
        assert!(renderer.context().is_none());
        assert_eq!(renderer.backend_name(), "tally");
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn zero_features_is_unavailable() {
        let (mut renderer, live, _) = tallying(0);
        assert!(matches!(renderer.initialize(), Err(AppError::Unavailable(_))));
        assert!(!renderer.is_initialized());
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn second_initialize_is_rejected_without_new_resources() {
        let (mut renderer, live, _) = tallying(2);
        renderer.initialize().unwrap();
        assert!(matches!(renderer.initialize(), Err(AppError::AlreadyInitialized)));
        assert!(renderer.is_initialized());
        assert_eq!(live.get(), 1);
    }

    #[test]
    fn reinitialize_after_shutdown() {
        let (mut renderer, live, destroyed) = tallying(1);
        renderer.initialize().unwrap();
        renderer.shutdown();
        renderer.initialize().unwrap();
        assert_eq!(live.get(), 1);
        assert_eq!(destroyed.get(), 1);
        assert_eq!(renderer.capabilities(), ["feature_0".to_owned()]);
    }

    #[test]
    fn config_set_while_initialized_is_stored() {
        let (mut renderer, _, _) = tallying(1);
        renderer.initialize().unwrap();
        renderer.set_config(RendererConfig::default().with_title("late"));
        assert_eq!(renderer.config().title, "late");
        assert!(renderer.is_initialized());
    }

    #[test]
    fn drop_releases_context() {
        let (mut renderer, live, destroyed) = tallying(1);
        renderer.initialize().unwrap();
        drop(renderer);
        assert_eq!(live.get(), 0);
        assert_eq!(destroyed.get(), 1);
    }

    #[test]
    fn drop_without_initialize_releases_nothing() {
        let (renderer, _, destroyed) = tallying(1);
        drop(renderer);
        assert_eq!(destroyed.get(), 0);
    }
}
