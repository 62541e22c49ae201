//! End-to-end checks of the device contract against the CPU backend.

use maya_engine::render::{MESH_SHADER, Mesh, MeshData, TransformBuffer, TransformUniforms};
use maya_engine::rhi::{
    DeviceError, DeviceLimits, DeviceState, GraphicsDevice, INVALID_HANDLE, NativeWindow,
    NullDevice, ResourceKind, TextureHandle, UniformBufferHandle,
};

const FLAT: &str = r#"
struct Tint { color: vec4<f32> };
@group(0) @binding(0) var<uniform> tint: Tint;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return tint.color;
}
"#;

fn ready() -> NullDevice {
    let mut device = NullDevice::with_size(800, 600);
    device.initialize(NativeWindow::Headless).unwrap();
    device
}

#[test]
fn creation_before_initialize_fails() {
    let mut device = NullDevice::new();
    assert_eq!(device.state(), DeviceState::Uninitialized);
    assert_eq!(device.surface_size(), (0, 0));

    assert!(matches!(device.create_pipeline(FLAT), Err(DeviceError::NotInitialized)));
    assert!(matches!(device.create_vertex_buffer(&[0; 48]), Err(DeviceError::NotInitialized)));
    assert!(matches!(device.create_index_buffer(&[0; 12]), Err(DeviceError::NotInitialized)));
    assert!(matches!(device.create_uniform_buffer(16), Err(DeviceError::NotInitialized)));
    assert!(matches!(
        device.create_texture(&[255; 4], 1, 1),
        Err(DeviceError::NotInitialized)
    ));
    assert!(matches!(device.begin_frame(), Err(DeviceError::NotInitialized)));
}

#[test]
fn bad_shader_leaves_device_usable() {
    let mut device = ready();

    let good = device.create_pipeline(FLAT).unwrap();
    assert!(good.is_valid());

    let err = device.create_pipeline("fn vs_main( {").unwrap_err();
    assert!(matches!(err, DeviceError::Shader(_)));
    assert_eq!(device.bound_pipeline(), Some(good));

    // Still creates resources and records frames.
    let mesh = Mesh::from_data(&mut device, &MeshData::cube()).unwrap();
    let tint = device.create_uniform_buffer(16).unwrap();
    device.begin_frame().unwrap();
    device.bind_uniform_buffer(tint, 0).unwrap();
    mesh.draw(&mut device).unwrap();
    device.end_frame().unwrap();

    device.shutdown();
    assert_eq!(device.state(), DeviceState::Shutdown);
}

#[test]
fn mismatched_vertex_input_is_rejected() {
    let mut device = ready();
    let good = device.create_pipeline(FLAT).unwrap();

    // Valid WGSL, but the layout feeds f32 positions.
    let int_position = r#"
@vertex
fn vs_main(@location(0) position: vec3<i32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(vec3<f32>(position), 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 1.0, 1.0);
}
"#;
    let err = device.create_pipeline(int_position).unwrap_err();
    assert!(matches!(err, DeviceError::Shader(_)));
    assert!(err.to_string().contains("@location(0)"));

    // uv is two floats wide.
    let wide_uv = FLAT.replace(
        "@location(0) position: vec3<f32>",
        "@location(3) position: vec3<f32>",
    );
    assert!(device.create_pipeline(&wide_uv).is_err());

    assert_eq!(device.bound_pipeline(), Some(good));
    assert!(device.create_pipeline(MESH_SHADER).is_ok());
}

#[test]
fn limits_are_enforced() {
    let mut device = NullDevice::with_size(800, 600).with_limits(DeviceLimits {
        max_texture_dimension: 2,
        max_uniform_size: 16,
        ..DeviceLimits::default()
    });
    device.initialize(NativeWindow::Headless).unwrap();

    assert!(matches!(
        device.create_texture(&[255; 36], 3, 3),
        Err(DeviceError::ExtentTooLarge { max: 2, .. })
    ));
    assert!(matches!(
        device.create_uniform_buffer(32),
        Err(DeviceError::TooLarge { kind: ResourceKind::UniformBuffer, .. })
    ));
    // The mesh shader reads three matrices, more than 16 bytes.
    assert!(matches!(device.create_pipeline(MESH_SHADER), Err(DeviceError::Shader(_))));
    assert_eq!(device.resource_count(), 0);

    assert!(device.create_texture(&[255; 16], 2, 2).is_ok());
    assert!(device.create_pipeline(FLAT).is_ok());
}

#[test]
fn handles_are_unique_and_never_zero() {
    let mut device = ready();
    let mut raw = vec![
        device.create_pipeline(FLAT).unwrap().raw(),
        device.create_vertex_buffer(&[0; 48]).unwrap().raw(),
        device.create_index_buffer(&[0; 12]).unwrap().raw(),
        device.create_uniform_buffer(16).unwrap().raw(),
        device.create_texture(&[255; 4], 1, 1).unwrap().raw(),
    ];
    assert!(!raw.contains(&INVALID_HANDLE));
    raw.sort_unstable();
    raw.dedup();
    assert_eq!(raw.len(), 5);
}

#[test]
fn handles_survive_reinitialize_as_unknown() {
    let mut device = ready();
    let old = device.create_uniform_buffer(16).unwrap();
    device.shutdown();
    device.initialize(NativeWindow::Headless).unwrap();

    let new = device.create_uniform_buffer(16).unwrap();
    assert!(new.raw() > old.raw());

    let err = device.update_uniform_buffer(old, &[0; 16]).unwrap_err();
    assert!(matches!(
        err,
        DeviceError::UnknownHandle {
            kind: ResourceKind::UniformBuffer,
            ..
        }
    ));
}

#[test]
fn frame_bracket_is_enforced() {
    let mut device = ready();
    let texture = device.create_texture(&[255; 4], 1, 1).unwrap();

    assert!(matches!(
        device.bind_texture(texture, 0),
        Err(DeviceError::NotRecording { .. })
    ));
    assert!(matches!(device.end_frame(), Err(DeviceError::NotRecording { .. })));

    device.begin_frame().unwrap();
    assert_eq!(device.state(), DeviceState::Recording);
    assert!(matches!(device.begin_frame(), Err(DeviceError::FrameInProgress)));
    device.end_frame().unwrap();
    assert_eq!(device.state(), DeviceState::Idle);
}

#[test]
fn slot_and_handle_errors() {
    let mut device = ready();
    device.begin_frame().unwrap();

    let stray = TextureHandle::from_raw(999);
    assert!(matches!(
        device.bind_texture(stray, 0),
        Err(DeviceError::UnknownHandle { .. })
    ));
    assert!(matches!(
        device.bind_uniform_buffer(UniformBufferHandle::NONE, 0),
        Err(DeviceError::UnknownHandle { .. })
    ));

    let ub = device.create_uniform_buffer(16).unwrap();
    assert!(matches!(
        device.bind_uniform_buffer(ub, 4),
        Err(DeviceError::SlotOutOfRange { limit: 4, .. })
    ));
    device.end_frame().unwrap();
}

#[test]
fn draw_requires_pipeline_and_vertex_buffer() {
    let mut device = ready();
    let vb = device.create_vertex_buffer(&[0; 48 * 3]).unwrap();
    let ib = device.create_index_buffer(bytemuck::cast_slice(&[0u32, 1, 2])).unwrap();

    device.begin_frame().unwrap();
    assert!(matches!(device.draw_indexed(ib, 3), Err(DeviceError::NoPipeline)));

    device.create_pipeline(FLAT).unwrap();
    assert!(matches!(device.draw_indexed(ib, 3), Err(DeviceError::NoVertexBuffer)));

    device.bind_vertex_buffer(vb, 0).unwrap();
    assert!(matches!(
        device.draw_indexed(ib, 4),
        Err(DeviceError::IndexCountOutOfRange {
            requested: 4,
            available: 3
        })
    ));
    device.draw_indexed(ib, 3).unwrap();
    device.end_frame().unwrap();
    assert_eq!(device.last_frame().map(<[_]>::len), Some(1));
}

#[test]
fn undersized_uniform_is_rejected_at_draw() {
    let mut device = ready();
    device.create_pipeline(MESH_SHADER).unwrap();
    let mesh = Mesh::from_data(&mut device, &MeshData::cube()).unwrap();
    let small = device.create_uniform_buffer(64).unwrap();

    device.begin_frame().unwrap();
    device.bind_uniform_buffer(small, 0).unwrap();
    let err = mesh.draw(&mut device).unwrap_err();
    assert!(matches!(
        err,
        DeviceError::UniformTooSmall {
            slot: 0,
            required: TransformUniforms::SIZE,
            actual: 64
        }
    ));

    let transforms = TransformBuffer::new(&mut device).unwrap();
    transforms.bind(&mut device, 0).unwrap();
    mesh.draw(&mut device).unwrap();
    device.end_frame().unwrap();
}

#[test]
fn bindings_persist_across_frames() {
    let mut device = ready();
    device.create_pipeline(FLAT).unwrap();
    let mesh = Mesh::from_data(&mut device, &MeshData::cube()).unwrap();
    let tint = device.create_uniform_buffer(16).unwrap();

    device.begin_frame().unwrap();
    device.bind_uniform_buffer(tint, 0).unwrap();
    mesh.draw(&mut device).unwrap();
    device.end_frame().unwrap();

    device.begin_frame().unwrap();
    device.draw_indexed(mesh.index_buffer(), mesh.index_count()).unwrap();
    device.end_frame().unwrap();

    let frames = device.submitted_frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1][0].bindings.uniform_buffer(0), Some(tint));
    assert_eq!(frames[1][0].bindings.vertex_buffer(0), Some(mesh.vertex_buffer()));
}

#[test]
fn draws_snapshot_latest_binding() {
    let mut device = ready();
    device.create_pipeline(FLAT).unwrap();
    let mesh = Mesh::from_data(&mut device, &MeshData::cube()).unwrap();
    let a = device.create_uniform_buffer(16).unwrap();
    let b = device.create_uniform_buffer(16).unwrap();

    device.begin_frame().unwrap();
    device.bind_uniform_buffer(a, 0).unwrap();
    mesh.draw(&mut device).unwrap();
    device.bind_uniform_buffer(b, 0).unwrap();
    mesh.draw(&mut device).unwrap();
    device.end_frame().unwrap();

    let frame = device.last_frame().unwrap();
    assert_eq!(frame[0].bindings.uniform_buffer(0), Some(a));
    assert_eq!(frame[1].bindings.uniform_buffer(0), Some(b));
}

#[test]
fn uniform_updates_check_size() {
    let mut device = ready();
    let transforms = TransformBuffer::new(&mut device).unwrap();
    transforms
        .write(&mut device, &TransformUniforms::default())
        .unwrap();

    assert!(matches!(
        device.update_uniform_buffer(transforms.handle(), &[0; 16]),
        Err(DeviceError::SizeMismatch { .. })
    ));
    assert!(matches!(
        device.create_uniform_buffer(10),
        Err(DeviceError::Misaligned { .. })
    ));
}

#[test]
fn shutdown_is_idempotent_and_reinitialize_works() {
    let mut device = ready();
    device.shutdown();
    device.shutdown();
    assert_eq!(device.state(), DeviceState::Shutdown);
    assert!(matches!(device.create_uniform_buffer(16), Err(DeviceError::NotInitialized)));

    device.initialize(NativeWindow::Headless).unwrap();
    assert!(matches!(
        device.initialize(NativeWindow::Headless),
        Err(DeviceError::AlreadyInitialized)
    ));
    assert_eq!(device.resource_count(), 0);
    assert_eq!(device.bound_pipeline(), None);
}
