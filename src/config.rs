// src/config.rs

use crate::error::{Result, ResultExt};
use winit::raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};

/// Native window a renderer presents into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceTarget {
    display: RawDisplayHandle,
    window: RawWindowHandle,
}

impl SurfaceTarget {
    /// # Safety
    ///
    /// `window` must stay alive until every renderer created with this
    /// target has been shut down.
    pub unsafe fn from_window<W>(window: &W) -> Result<Self>
    where
        W: HasWindowHandle + HasDisplayHandle + ?Sized,
    {
        let display = window.display_handle().or_init_failure("display handle")?.as_raw();
        let window = window.window_handle().or_init_failure("window handle")?.as_raw();
        Ok(Self { display, window })
    }

    /// # Safety
    ///
    /// Same contract as [`SurfaceTarget::from_window`].
    pub unsafe fn from_raw(display: RawDisplayHandle, window: RawWindowHandle) -> Self {
        Self { display, window }
    }

    pub fn display(&self) -> RawDisplayHandle {
        self.display
    }

    pub fn window(&self) -> RawWindowHandle {
        self.window
    }
}

/// Describes how a renderer should be created.
///
/// Moved into the renderer by the factory; backends validate the fields they
/// care about during `initialize`. Size, vsync and frames in flight only
/// matter when a `surface` is set; headless contexts ignore them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub enable_validation: bool, // validation layers + debug messenger
    pub enable_vsync: bool,
    pub max_frames_in_flight: u32,
    pub backend: Option<String>,        // None = registry default
    pub surface: Option<SurfaceTarget>, // None = headless, no swapchain
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "AquaVisual MVP".to_owned(),
            enable_validation: cfg!(debug_assertions),
            enable_vsync: true,
            max_frames_in_flight: 2,
            backend: None,
            surface: None,
        }
    }
}

impl RendererConfig {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.enable_validation = enabled;
        self
    }

    pub fn with_vsync(mut self, enabled: bool) -> Self {
        self.enable_vsync = enabled;
        self
    }

    pub fn with_max_frames_in_flight(mut self, frames: u32) -> Self {
        self.max_frames_in_flight = frames;
        self
    }

    pub fn with_backend(mut self, name: impl Into<String>) -> Self {
        self.backend = Some(name.into());
        self
    }

    /// Present into `target`. Size, vsync and frame count shape the swapchain.
    pub fn with_surface(mut self, target: SurfaceTarget) -> Self {
        self.surface = Some(target);
        self
    }

    /// Width over height, 0.0 for a zero-height surface.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}
