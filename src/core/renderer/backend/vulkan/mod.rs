// src/core/renderer/backend/vulkan/mod.rs
mod debug;
mod swapchain;
#[allow(clippy::module_inception)]
mod vulkan;

pub use vulkan::{NAME, VulkanApi, VulkanContext, VulkanRenderer};
