use super::{debug, swapchain};
use crate::config::{RendererConfig, SurfaceTarget};
use crate::core::renderer::native::{NativeBackend, NativeRenderer};
use crate::error::{AppError, Result, ResultExt};
use log::{debug, info};
use smallvec::SmallVec;
use std::ffi::{CStr, CString, c_char};
use std::fmt;

use vulkanalia::loader::{LIBRARY, LibloadingLoader};
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::{EntryV1_1, KhrSurfaceExtension, KhrSwapchainExtension};
use vulkanalia::window as vk_window;
use winit::raw_window_handle::{DisplayHandle, HasDisplayHandle, HasWindowHandle, WindowHandle};

/// Registry name of this backend.
pub const NAME: &str = "vulkan";

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";
const DEBUG_UTILS_EXTENSION: &str = "VK_EXT_debug_utils";
const SWAPCHAIN_EXTENSION: &str = "VK_KHR_swapchain";

// Portability extension needed on some platforms (e.g., macOS + MoltenVK)
const KHR_PORTABILITY_SUBSET_EXTENSION_NAME: &CStr = c"VK_KHR_portability_subset";

/// Vulkan renderer. Headless unless the config carries a surface target, in
/// which case it also owns the surface and a swapchain sized from the config.
pub type VulkanRenderer = NativeRenderer<VulkanApi>;

/// Runtime-loaded Vulkan entry points.
#[derive(Default)]
pub struct VulkanApi {
    entry: Option<Entry>,    // loaded on first capability query
    extensions: Vec<String>, // instance extensions from the last query
}

impl VulkanApi {
    fn entry(&mut self) -> Result<&Entry> {
        let entry = match self.entry.take() {
            Some(entry) => entry,
            None => {
                let loader = unsafe { LibloadingLoader::new(LIBRARY) }
                    .or_unavailable("loading the Vulkan library")?;
                let entry = unsafe { Entry::new(loader) }
                    .or_unavailable("loading Vulkan entry points")?;
                info!("Vulkan library loaded ({LIBRARY})");
                entry
            }
        };
        Ok(self.entry.insert(entry))
    }
}

/// Copies a NUL-terminated name reported by the driver.
///
/// # Safety
///
/// `raw` must point at a NUL-terminated string.
unsafe fn driver_string(raw: *const c_char) -> String {
    let name = unsafe { CStr::from_ptr(raw) };
    name.to_string_lossy().into_owned()
}

/// Everything `create_context` acquired. Fields are filled in creation order
/// and released in reverse; a partially built context releases what it has.
#[derive(Default)]
pub struct VulkanContext {
    instance: Option<Instance>,                    // Vulkan instance
    messenger: Option<vk::DebugUtilsMessengerEXT>, // Only with validation
    surface: Option<vk::SurfaceKHR>,               // Only with a surface target
    physical_device: Option<vk::PhysicalDevice>,   // Chosen physical GPU
    device: Option<Device>,                        // Logical device
    graphics_family: u32,
    present_family: u32,
    device_name: String,

    swapchain: Option<vk::SwapchainKHR>,
    // Usually 2-3 images; SmallVec avoids heap allocation for small counts
    image_views: SmallVec<[vk::ImageView; 4]>,
    swapchain_format: Option<vk::Format>,
    swapchain_extent: Option<vk::Extent2D>,
    present_mode: Option<vk::PresentModeKHR>,
}

impl VulkanContext {
    /// Creates the swapchain and one image view per swapchain image.
    fn create_swapchain(&mut self, config: &RendererConfig) -> Result<()> {
        let (Some(instance), Some(device), Some(surface), Some(physical_device)) =
            (&self.instance, &self.device, self.surface, self.physical_device)
        else {
            return Err(AppError::Initialization {
                stage: "swapchain",
                reason: "no surface or device to build on".to_owned(),
            });
        };

        let caps = unsafe { instance.get_physical_device_surface_capabilities_khr(physical_device, surface) }
            .or_init_failure("vkGetPhysicalDeviceSurfaceCapabilitiesKHR")?;
        let formats = unsafe { instance.get_physical_device_surface_formats_khr(physical_device, surface) }
            .or_init_failure("vkGetPhysicalDeviceSurfaceFormatsKHR")?;
        let present_modes =
            unsafe { instance.get_physical_device_surface_present_modes_khr(physical_device, surface) }
                .or_init_failure("vkGetPhysicalDeviceSurfacePresentModesKHR")?;

        let format = swapchain::choose_surface_format(&formats).ok_or_else(|| {
            AppError::Initialization {
                stage: "swapchain",
                reason: "surface reports no formats".to_owned(),
            }
        })?;
        let present_mode = swapchain::choose_present_mode(&present_modes, config.enable_vsync);
        let extent = swapchain::choose_extent(&caps, config.width, config.height);
        let image_count = swapchain::choose_image_count(&caps, config.max_frames_in_flight);

        let families = [self.graphics_family, self.present_family];
        let mut info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(format.format)
            .image_color_space(format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true);
        if self.graphics_family != self.present_family {
            info = info
                .image_sharing_mode(vk::SharingMode::CONCURRENT)
                .queue_family_indices(&families);
        }

        let handle = unsafe { device.create_swapchain_khr(&info, None) }
            .or_init_failure("vkCreateSwapchainKHR")?;
        self.swapchain = Some(handle);
        self.swapchain_format = Some(format.format);
        self.swapchain_extent = Some(extent);
        self.present_mode = Some(present_mode);

        let images = unsafe { device.get_swapchain_images_khr(handle) }
            .or_init_failure("vkGetSwapchainImagesKHR")?;
        for image in images {
            let view_info = vk::ImageViewCreateInfo::builder()
                .image(image)
                .view_type(vk::ImageViewType::_2D)
                .format(format.format)
                .components(vk::ComponentMapping::default())
                .subresource_range(
                    vk::ImageSubresourceRange::builder()
                        .aspect_mask(vk::ImageAspectFlags::COLOR)
                        .base_mip_level(0)
                        .level_count(1)
                        .base_array_layer(0)
                        .layer_count(1)
                        .build(),
                );
            let view = unsafe { device.create_image_view(&view_info, None) }
                .or_init_failure("vkCreateImageView")?;
            self.image_views.push(view);
        }
        Ok(())
    }

    /// Safe to call multiple times, called automatically in Drop.
    fn release(&mut self) {
        unsafe {
            if let Some(device) = &self.device {
                // Wait until GPU is idle before tearing down
                device.device_wait_idle().ok();

                for view in self.image_views.drain(..) {
                    device.destroy_image_view(view, None);
                }
                if let Some(swapchain) = self.swapchain.take() {
                    device.destroy_swapchain_khr(swapchain, None);
                }
            }

            if let Some(device) = self.device.take() {
                device.destroy_device(None);
            }

            if let Some(instance) = &self.instance {
                if let Some(surface) = self.surface.take() {
                    instance.destroy_surface_khr(surface, None);
                }
                if let Some(messenger) = self.messenger.take() {
                    debug::destroy_messenger(instance, messenger);
                }
            }

            if let Some(instance) = self.instance.take() {
                instance.destroy_instance(None);
            }
        }

        self.physical_device = None;
        self.swapchain_format = None;
        self.swapchain_extent = None;
        self.present_mode = None;
    }
}

impl fmt::Display for VulkanContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (graphics family {}, present family {})",
            self.device_name, self.graphics_family, self.present_family
        )?;
        if let (Some(format), Some(extent), Some(mode)) =
            (self.swapchain_format, self.swapchain_extent, self.present_mode)
        {
            write!(
                f,
                ", swapchain {}x{} {format:?} {mode:?} with {} images",
                extent.width,
                extent.height,
                self.image_views.len()
            )?;
        }
        Ok(())
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        // Must not panic.
        self.release();
    }
}

impl NativeBackend for VulkanApi {
    const NAME: &'static str = NAME;
    type Context = VulkanContext;

    fn query_capabilities(&mut self) -> Result<Vec<String>> {
        let entry = self.entry()?;
        let properties = unsafe { entry.enumerate_instance_extension_properties(None) }
            .or_unavailable("vkEnumerateInstanceExtensionProperties")?;

        let extensions: Vec<String> = properties
            .iter()
            .map(|p| unsafe { driver_string(p.extension_name.as_ptr()) })
            .collect();
        debug!("Vulkan instance extensions: {extensions:?}");

        self.extensions = extensions.clone();
        Ok(extensions)
    }

    fn create_context(&mut self, config: &RendererConfig) -> Result<VulkanContext> {
        let debug_utils =
            config.enable_validation && self.extensions.iter().any(|e| e == DEBUG_UTILS_EXTENSION);
        let entry = self.entry()?;

        let application_name =
            CString::new(config.title.as_str()).or_init_failure("application name")?;

        // Validation layer is optional even when requested
        let has_validation_layer = config.enable_validation
            && unsafe { entry.enumerate_instance_layer_properties() }
                .or_init_failure("vkEnumerateInstanceLayerProperties")?
                .iter()
                .any(|p| unsafe { CStr::from_ptr(p.layer_name.as_ptr()) } == VALIDATION_LAYER);

        let mut layers: SmallVec<[*const c_char; 4]> = SmallVec::new();
        if has_validation_layer {
            layers.push(VALIDATION_LAYER.as_ptr());
            info!("✅ Validation layer enabled");
        }

        // Borrowed handles for the window named in the config
        let handles: Option<(DisplayHandle<'_>, WindowHandle<'_>)> =
            config.surface.map(|target: SurfaceTarget| unsafe {
                (
                    DisplayHandle::borrow_raw(target.display()),
                    WindowHandle::borrow_raw(target.window()),
                )
            });

        let mut exts: SmallVec<[*const c_char; 8]> = SmallVec::new();
        if let Some((_, window)) = &handles {
            exts.extend(
                vk_window::get_required_instance_extensions(window)
                    .iter()
                    .map(|e| e.as_ptr()),
            );
        }
        if debug_utils {
            exts.push(vk::EXT_DEBUG_UTILS_EXTENSION.name.as_ptr());
        }

        // On macOS, require portability extension
        #[cfg(target_os = "macos")]
        exts.push(vk::KHR_PORTABILITY_ENUMERATION_EXTENSION.name.as_ptr());

        #[allow(unused_mut)]
        let mut flags = vk::InstanceCreateFlags::empty();
        #[cfg(target_os = "macos")]
        {
            flags |= vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR;
        }

        let api_version = unsafe { entry.enumerate_instance_version() }
            .or_init_failure("vkEnumerateInstanceVersion")?;

        let app_info = vk::ApplicationInfo::builder()
            .application_name(application_name.as_bytes_with_nul())
            .engine_name(b"AquaVisual\0")
            .api_version(api_version);

        let mut debug_info = debug::messenger_info();
        let mut create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&exts)
            .enabled_layer_names(&layers)
            .flags(flags);
        if debug_utils {
            create_info = create_info.push_next(&mut debug_info);
        }

        // From here on, early returns drop `context` and release what it holds
        let mut context = VulkanContext::default();
        let instance = context.instance.insert(
            unsafe { entry.create_instance(&create_info, None) }.or_init_failure("vkCreateInstance")?,
        );
        info!("Vulkan instance ready");

        if debug_utils {
            context.messenger = Some(debug::create_messenger(instance, &debug_info)?);
        }

        if let Some((display, window)) = &handles {
            let surface = unsafe {
                vk_window::create_surface(
                    instance,
                    display as &dyn HasDisplayHandle,
                    window as &dyn HasWindowHandle,
                )
            }
            .or_init_failure("window surface")?;
            context.surface = Some(surface);
            info!("✅ Window surface bound");
        }

        let choice = pick_physical_device(instance, context.surface)?;
        context.physical_device = Some(choice.physical_device);
        context.graphics_family = choice.graphics_family;
        context.present_family = choice.present_family;
        context.device_name = choice.name;

        let mut device_exts: SmallVec<[*const c_char; 2]> = SmallVec::new();
        if context.surface.is_some() {
            device_exts.push(vk::KHR_SWAPCHAIN_EXTENSION.name.as_ptr());
        }
        if choice.portability_subset {
            device_exts.push(KHR_PORTABILITY_SUBSET_EXTENSION_NAME.as_ptr());
            info!("✅ VK_KHR_portability_subset enabled");
        }

        // One queue per distinct family (graphics + present)
        let mut unique_families: SmallVec<[u32; 2]> = SmallVec::new();
        unique_families.push(choice.graphics_family);
        if choice.present_family != choice.graphics_family {
            unique_families.push(choice.present_family);
        }

        let queue_priorities = [1.0_f32];
        let queue_create_infos: SmallVec<[vk::DeviceQueueCreateInfo; 2]> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&queue_priorities)
                    .build()
            })
            .collect();

        let device_create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&device_exts);

        let device =
            unsafe { instance.create_device(choice.physical_device, &device_create_info, None) }
                .or_init_failure("vkCreateDevice")?;
        context.device = Some(device);

        if context.surface.is_some() {
            context.create_swapchain(config)?;
        }

        info!("✅ Vulkan device ready: {context}");
        Ok(context)
    }

    fn destroy_context(&mut self, mut context: VulkanContext) {
        context.release();
        info!("Vulkan context destroyed");
    }
}

struct DeviceChoice {
    physical_device: vk::PhysicalDevice,
    graphics_family: u32,
    present_family: u32,
    name: String,
    discrete: bool,
    portability_subset: bool,
}

/// Discrete GPUs first; with a surface, only devices that can present to it.
fn pick_physical_device(instance: &Instance, surface: Option<vk::SurfaceKHR>) -> Result<DeviceChoice> {
    let devices = unsafe { instance.enumerate_physical_devices() }
        .or_init_failure("vkEnumeratePhysicalDevices")?;

    devices
        .iter()
        .filter_map(|&dev| inspect_device(instance, dev, surface))
        .min_by_key(|choice| !choice.discrete)
        .ok_or_else(|| AppError::Initialization {
            stage: "physical device selection",
            reason: format!(
                "none of {} devices offers graphics{}",
                devices.len(),
                if surface.is_some() { " and presentation" } else { "" }
            ),
        })
}

fn inspect_device(
    instance: &Instance,
    dev: vk::PhysicalDevice,
    surface: Option<vk::SurfaceKHR>,
) -> Option<DeviceChoice> {
    let families = unsafe { instance.get_physical_device_queue_family_properties(dev) };
    let graphics_family = families
        .iter()
        .position(|f| f.queue_flags.contains(vk::QueueFlags::GRAPHICS))? as u32;

    let extensions: Vec<String> =
        unsafe { instance.enumerate_device_extension_properties(dev, None) }
            .ok()?
            .iter()
            .map(|e| unsafe { driver_string(e.extension_name.as_ptr()) })
            .collect();

    let present_family = match surface {
        None => graphics_family,
        Some(surface) => {
            if !extensions.iter().any(|e| e == SWAPCHAIN_EXTENSION) {
                return None;
            }
            // Prefer presenting from the graphics family
            std::iter::once(graphics_family)
                .chain(0..families.len() as u32)
                .find(|&index| {
                    unsafe { instance.get_physical_device_surface_support_khr(dev, index, surface) }
                        .unwrap_or(false)
                })?
        }
    };

    let props = unsafe { instance.get_physical_device_properties(dev) };
    let portability_name = KHR_PORTABILITY_SUBSET_EXTENSION_NAME.to_string_lossy();
    Some(DeviceChoice {
        physical_device: dev,
        graphics_family,
        present_family,
        name: unsafe { driver_string(props.device_name.as_ptr()) },
        discrete: props.device_type == vk::PhysicalDeviceType::DISCRETE_GPU,
        portability_subset: extensions.iter().any(|e| *e == portability_name),
    })
}
