use crate::config::RendererConfig;
use crate::error::Result;

/// Abstract rendering surface, owned by exactly one caller.
///
/// Lifecycle: configure, `initialize`, use, `shutdown`. Implementations must
/// release in `shutdown` everything acquired in `initialize`, and must treat
/// `shutdown` on a renderer that never initialized as a no-op.
pub trait Renderer {
    /// Registry name of the backend behind this renderer.
    fn backend_name(&self) -> &'static str;

    /// Store the configuration used by the next `initialize`.
    fn set_config(&mut self, config: RendererConfig);

    fn config(&self) -> &RendererConfig;

    /// Acquire the native context described by the stored configuration.
    fn initialize(&mut self) -> Result<()>;

    fn is_initialized(&self) -> bool;

    /// Feature identifiers reported by the native API at initialization.
    fn capabilities(&self) -> &[String];

    /// Release native resources. Safe to call any number of times.
    fn shutdown(&mut self);
}
