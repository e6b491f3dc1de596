//! AquaVisual renderer core: configuration, the `Renderer` abstraction and
//! the backend factory.

pub mod config;
pub mod core;
pub mod error;
pub mod library;

pub use crate::config::{RendererConfig, SurfaceTarget};
pub use crate::core::renderer::api::Renderer;
pub use crate::core::renderer::backend::BackendRegistry;
pub use crate::core::renderer::factory::create;
pub use crate::core::renderer::native::{NativeBackend, NativeRenderer};
pub use crate::error::{AppError, Result};
pub use crate::library::Library;
