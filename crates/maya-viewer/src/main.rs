//! Model viewer: flies a camera around an OBJ file (or a cube).
//!
//! Usage: `maya-viewer [model.obj] [texture.png]`
//!
//! WASD to move, Space/Shift for up/down, mouse to look, Escape to quit.

use std::path::PathBuf;

use anyhow::{Context, Result};
use maya_engine::assets;
use maya_engine::camera::{Camera, CameraConfig};
use maya_engine::core::{App, AppControl, FrameCtx};
use maya_engine::input::{InputProvider, Key};
use maya_engine::logging::{LoggingConfig, init_logging};
use maya_engine::render::{
    MESH_SHADER, Mesh, MeshData, Texture, TransformBuffer, TransformUniforms,
};
use maya_engine::rhi::{GpuInit, GraphicsDevice};
use maya_engine::window::{Runtime, RuntimeConfig};
use maya_math::{Quat, Vec3};

/// Radians per second.
const SPIN_SPEED: f32 = 0.5;

struct Viewer {
    model_path: Option<PathBuf>,
    texture_path: Option<PathBuf>,
    camera: Camera,
    spin: f32,
    scene: Option<Scene>,
}

struct Scene {
    mesh: Mesh,
    texture: Texture,
    transforms: TransformBuffer,
}

impl Viewer {
    fn new(model_path: Option<PathBuf>, texture_path: Option<PathBuf>) -> Self {
        Self {
            model_path,
            texture_path,
            camera: Camera::from_config(&CameraConfig::default()),
            spin: 0.0,
            scene: None,
        }
    }
}

impl App for Viewer {
    fn on_initialize(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        device
            .create_pipeline(MESH_SHADER)
            .context("mesh shader rejected")?;

        let mesh = match &self.model_path {
            Some(path) => {
                log::info!("loading model {}", path.display());
                assets::load_obj(device, path)
                    .with_context(|| format!("failed to load model `{}`", path.display()))?
            }
            None => {
                log::info!("no model given; showing the built-in cube");
                Mesh::from_data(device, &MeshData::cube())?
            }
        };
        log::info!("mesh ready: {} triangles", mesh.index_count() / 3);

        let texture = match &self.texture_path {
            Some(path) => {
                log::info!("loading texture {}", path.display());
                Texture::from_image_file(device, path)?
            }
            None => {
                log::debug!("no texture given; using a checkerboard");
                Texture::checkerboard(device, 64, 8, [230, 230, 230, 255], [60, 90, 160, 255])?
            }
        };

        let transforms = TransformBuffer::new(device)?;

        self.scene = Some(Scene {
            mesh,
            texture,
            transforms,
        });
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut FrameCtx<'_>) -> Result<AppControl> {
        if ctx.input.is_key_pressed(Key::Escape) {
            log::info!("escape pressed; exiting");
            return Ok(AppControl::Exit);
        }
        self.camera.update(ctx.input, ctx.dt());
        self.spin = (self.spin + SPIN_SPEED * ctx.dt()) % std::f32::consts::TAU;
        Ok(AppControl::Continue)
    }

    fn on_render(&mut self, ctx: &mut FrameCtx<'_>) -> Result<AppControl> {
        let Some(scene) = &self.scene else {
            return Ok(AppControl::Continue);
        };

        let model = Quat::from_axis_angle(Vec3::Y, self.spin).to_mat4();
        let uniforms = TransformUniforms::new(
            model,
            self.camera.view_matrix(),
            self.camera.projection_matrix(),
        );

        scene.transforms.write(ctx.device, &uniforms)?;
        scene.transforms.bind(ctx.device, 0)?;
        scene.texture.bind(ctx.device, 0)?;
        scene.mesh.draw(ctx.device)?;
        Ok(AppControl::Continue)
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
    }

    fn on_shutdown(&mut self, _device: &mut dyn GraphicsDevice) {
        log::debug!("releasing scene");
        self.scene = None;
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let model_path = args.next();
    let texture_path = args.next();

    let config = RuntimeConfig {
        title: "Maya Viewer".to_string(),
        grab_cursor: true,
        ..Default::default()
    };

    Runtime::run(config, GpuInit::default(), Viewer::new(model_path, texture_path))
}

#[cfg(test)]
mod tests {
    use maya_engine::rhi::{NativeWindow, NullDevice};

    use super::*;

    fn device() -> NullDevice {
        let mut device = NullDevice::new();
        device.initialize(NativeWindow::Headless).unwrap();
        device
    }

    #[test]
    fn falls_back_to_cube() {
        let mut device = device();
        let mut viewer = Viewer::new(None, None);
        viewer.on_initialize(&mut device).unwrap();

        let scene = viewer.scene.as_ref().unwrap();
        assert_eq!(scene.mesh.index_count(), 36);
        assert_eq!(scene.texture.size(), (64, 64));
    }

    #[test]
    fn missing_model_names_the_path() {
        let mut device = device();
        let mut viewer = Viewer::new(Some(PathBuf::from("no/such/model.obj")), None);
        let err = viewer.on_initialize(&mut device).unwrap_err();
        assert!(format!("{err:#}").contains("no/such/model.obj"));
        assert!(viewer.scene.is_none());
    }
}
