//! Smoke test of the wgpu backend rendering offscreen.
//!
//! Skips itself when the machine has no usable adapter.

use maya_engine::render::{
    MESH_SHADER, Mesh, MeshData, Texture, TransformBuffer, TransformUniforms,
};
use maya_engine::rhi::{DeviceError, DeviceState, GpuInit, GraphicsDevice, NativeWindow, WgpuDevice};
use maya_math::{Mat4, Vec3};

#[test]
fn headless_frame_round_trip() {
    let mut device = WgpuDevice::new(GpuInit::default());
    match device.initialize(NativeWindow::Headless) {
        Ok(()) => {}
        Err(DeviceError::Setup(reason)) => {
            eprintln!("skipping: no wgpu adapter ({reason})");
            return;
        }
        Err(other) => panic!("unexpected initialize error: {other}"),
    }
    assert_eq!(device.surface_size(), (256, 256));

    device.create_pipeline(MESH_SHADER).unwrap();
    assert!(matches!(
        device.create_pipeline("not wgsl"),
        Err(DeviceError::Shader(_))
    ));

    let mesh = Mesh::from_data(&mut device, &MeshData::cube()).unwrap();
    let texture = Texture::checkerboard(&mut device, 8, 2, [255; 4], [0, 0, 0, 255]).unwrap();
    let transforms = TransformBuffer::new(&mut device).unwrap();

    let view = Mat4::look_at(Vec3::new(2.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y);
    let projection = Mat4::perspective(45f32.to_radians(), 1.0, 0.1, 100.0);

    for frame in 0..2 {
        let model = Mat4::translate(Vec3::new(frame as f32 * 0.1, 0.0, 0.0));
        device.begin_frame().unwrap();
        transforms
            .write(&mut device, &TransformUniforms::new(model, view, projection))
            .unwrap();
        transforms.bind(&mut device, 0).unwrap();
        texture.bind(&mut device, 0).unwrap();
        mesh.draw(&mut device).unwrap();
        mesh.draw(&mut device).unwrap();
        device.end_frame().unwrap();
    }

    // Frames without draws still clear and submit.
    device.resize(64, 32).unwrap();
    assert_eq!(device.surface_size(), (64, 32));
    device.begin_frame().unwrap();
    device.end_frame().unwrap();

    device.shutdown();
    assert_eq!(device.state(), DeviceState::Shutdown);
}
