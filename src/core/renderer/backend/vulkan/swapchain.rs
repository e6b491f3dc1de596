// src/core/renderer/backend/vulkan/swapchain.rs

use vulkanalia::vk;

/// SRGB BGRA when offered, otherwise whatever the surface lists first.
pub(super) fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<&vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|f| {
            f.format == vk::Format::B8G8R8A8_SRGB
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first())
}

/// FIFO is vsync and always available; without vsync prefer MAILBOX, then IMMEDIATE.
pub(super) fn choose_present_mode(available: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
    if vsync {
        return vk::PresentModeKHR::FIFO;
    }
    [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE]
        .into_iter()
        .find(|mode| available.contains(mode))
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// The surface's fixed extent, or the requested size clamped to its limits.
pub(super) fn choose_extent(caps: &vk::SurfaceCapabilitiesKHR, width: u32, height: u32) -> vk::Extent2D {
    if caps.current_extent.width != u32::MAX {
        return caps.current_extent;
    }
    vk::Extent2D {
        width: width
            .max(caps.min_image_extent.width)
            .min(caps.max_image_extent.width),
        height: height
            .max(caps.min_image_extent.height)
            .min(caps.max_image_extent.height),
    }
}

/// One image more than the minimum, at least one per frame in flight.
/// A `max_image_count` of 0 means unbounded.
pub(super) fn choose_image_count(caps: &vk::SurfaceCapabilitiesKHR, frames_in_flight: u32) -> u32 {
    let desired = (caps.min_image_count + 1).max(frames_in_flight);
    if caps.max_image_count > 0 {
        desired.min(caps.max_image_count)
    } else {
        desired
    }
}
