// src/core/renderer/backend/vulkan/debug.rs
//! Validation-layer output forwarded into `log`.

use crate::error::{Result, ResultExt};
use log::Level;
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::ExtDebugUtilsExtension;

type Severity = vk::DebugUtilsMessageSeverityFlagsEXT;

fn log_level(severity: Severity) -> Level {
    if severity.contains(Severity::ERROR) {
        Level::Error
    } else if severity.contains(Severity::WARNING) {
        Level::Warn
    } else if severity.contains(Severity::INFO) {
        Level::Info
    } else {
        Level::Debug
    }
}

unsafe extern "system" fn forward_to_log(
    severity: Severity,
    kind: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let message = unsafe { std::ffi::CStr::from_ptr((*data).message) };
    log::log!(log_level(severity), "[{kind:?}] {}", message.to_string_lossy());
    vk::FALSE
}

/// Also chained into instance creation so create/destroy calls get reported.
/// Chatty severities are requested only when `debug` logging is on.
pub(super) fn messenger_info() -> vk::DebugUtilsMessengerCreateInfoEXTBuilder<'static> {
    let mut severity = Severity::WARNING | Severity::ERROR;
    if log::log_enabled!(Level::Debug) {
        severity |= Severity::INFO | Severity::VERBOSE;
    }

    vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(severity)
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .user_callback(Some(forward_to_log))
}

pub(super) fn create_messenger(
    instance: &Instance,
    info: &vk::DebugUtilsMessengerCreateInfoEXT,
) -> Result<vk::DebugUtilsMessengerEXT> {
    unsafe { instance.create_debug_utils_messenger_ext(info, None) }
        .or_init_failure("vkCreateDebugUtilsMessengerEXT")
}

pub(super) fn destroy_messenger(instance: &Instance, messenger: vk::DebugUtilsMessengerEXT) {
    unsafe { instance.destroy_debug_utils_messenger_ext(messenger, None) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_severity_bit_picks_the_level() {
        assert_eq!(log_level(Severity::ERROR | Severity::WARNING), Level::Error);
        assert_eq!(log_level(Severity::WARNING), Level::Warn);
        assert_eq!(log_level(Severity::INFO), Level::Info);
        assert_eq!(log_level(Severity::VERBOSE), Level::Debug);
    }
}
