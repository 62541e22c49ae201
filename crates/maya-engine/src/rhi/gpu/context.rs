use std::sync::Arc;

use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::GpuInit;
use super::surface;
use crate::rhi::{NativeWindow, SurfaceErrorAction};

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Where frames end up.
enum ColorTarget {
    /// Swapchain bound to a window.
    Surface {
        window: Arc<Window>,
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    /// Plain texture for headless rendering.
    Offscreen { texture: wgpu::Texture },
}

/// A color view to render into for one frame.
///
/// Holding the surface texture prevents acquisition of subsequent frames, so
/// this must be presented promptly.
pub(crate) struct AcquiredFrame {
    surface_texture: Option<wgpu::SurfaceTexture>,
    pub view: wgpu::TextureView,
}

/// Owns wgpu core objects and the frame targets.
///
/// This type is the low-level rendering context:
/// - creates and stores Adapter/Device/Queue
/// - creates and configures the Surface (swapchain), or an offscreen texture
/// - owns the depth buffer matching the color target
pub(crate) struct Gpu {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    target: ColorTarget,
    format: wgpu::TextureFormat,
    depth_view: wgpu::TextureView,

    /// Current drawable size in physical pixels.
    size: PhysicalSize<u32>,
}

impl Gpu {
    /// Creates a GPU context for a window, or an offscreen one for `Headless`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: &NativeWindow, init: &GpuInit) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let (surface, size) = match window {
            NativeWindow::Winit(w) => {
                let size = w.inner_size();
                anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");
                let surface = instance
                    .create_surface(w.clone())
                    .context("failed to create wgpu surface")?;
                (Some((w.clone(), surface)), size)
            }
            NativeWindow::Headless => {
                let (w, h) = init.headless_size;
                anyhow::ensure!(w > 0 && h > 0, "headless size must be non-zero");
                (None, PhysicalSize::new(w, h))
            }
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: surface.as_ref().map(|(_, s)| s),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("maya device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let (target, format) = match surface {
            Some((window, surface)) => {
                let caps = surface.get_capabilities(&adapter);
                let format = surface::choose_surface_format(&caps, init.prefer_srgb)
                    .context("no supported surface formats")?;
                let alpha_mode = surface::choose_alpha_mode(&caps, init.alpha_mode);

                let config = wgpu::SurfaceConfiguration {
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    format,
                    width: size.width,
                    height: size.height,
                    present_mode: init.present_mode,
                    alpha_mode,
                    view_formats: vec![],
                    desired_maximum_frame_latency: init.desired_maximum_frame_latency,
                };
                surface.configure(&device, &config);

                (
                    ColorTarget::Surface {
                        window,
                        surface,
                        config,
                    },
                    format,
                )
            }
            None => {
                let format = surface::offscreen_format(init.prefer_srgb);
                let texture = create_offscreen(&device, format, size);
                (ColorTarget::Offscreen { texture }, format)
            }
        };

        let depth_view = create_depth_view(&device, size);

        Ok(Self {
            adapter,
            device,
            queue,
            target,
            format,
            depth_view,
            size,
        })
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Returns the color target format.
    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    /// Reconfigures the color and depth targets after a resize.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        match &mut self.target {
            ColorTarget::Surface {
                surface, config, ..
            } => {
                if !surface::apply_resize(config, &mut self.size, new_size) {
                    return;
                }
                surface.configure(&self.device, config);
            }
            ColorTarget::Offscreen { texture } => {
                self.size = new_size;
                if new_size.width == 0 || new_size.height == 0 {
                    return;
                }
                *texture = create_offscreen(&self.device, self.format, new_size);
            }
        }
        self.depth_view = create_depth_view(&self.device, new_size);
    }

    /// Acquires the next color target.
    pub fn acquire(&self) -> std::result::Result<AcquiredFrame, SurfaceError> {
        match &self.target {
            ColorTarget::Surface { surface, .. } => {
                let surface_texture = surface.get_current_texture()?;
                let view = surface_texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                Ok(AcquiredFrame {
                    surface_texture: Some(surface_texture),
                    view,
                })
            }
            ColorTarget::Offscreen { texture } => Ok(AcquiredFrame {
                surface_texture: None,
                view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            }),
        }
    }

    /// Submits the recorded commands and presents the frame.
    pub fn submit(&self, frame: AcquiredFrame, commands: wgpu::CommandBuffer) {
        self.queue.submit(std::iter::once(commands));
        drop(frame.view);
        if let Some(surface_texture) = frame.surface_texture {
            if let ColorTarget::Surface { window, .. } = &self.target {
                window.pre_present_notify();
            }
            surface_texture.present();
        }
    }

    /// Converts a `SurfaceError` into a higher-level action.
    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        match &self.target {
            ColorTarget::Surface {
                surface, config, ..
            } => surface::map_surface_error(surface, &self.device, config, self.size, err),
            ColorTarget::Offscreen { .. } => SurfaceErrorAction::SkipFrame,
        }
    }
}

fn create_offscreen(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    size: PhysicalSize<u32>,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("maya offscreen color"),
        size: wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

fn create_depth_view(device: &wgpu::Device, size: PhysicalSize<u32>) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("maya depth"),
        size: wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
