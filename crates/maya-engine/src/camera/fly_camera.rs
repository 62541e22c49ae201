use maya_math::{Mat4, Vec2, Vec3, to_radians};

use crate::input::{InputProvider, Key};

const PITCH_LIMIT: f32 = 89.0;

/// Camera tuning.
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// World units per second.
    pub movement_speed: f32,
    /// Degrees per logical pixel of cursor travel.
    pub mouse_sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 45.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
            movement_speed: 2.5,
            mouse_sensitivity: 0.1,
        }
    }
}

/// Free-flying perspective camera.
///
/// Mouse-look is driven by the absolute cursor position: the camera keeps the
/// previous sample and derives its own delta. The first sample after
/// construction (or [`reset_mouse`](Self::reset_mouse)) only seeds that
/// history, so the view does not jump.
///
/// Input is not validated; a NaN cursor position propagates into the
/// orientation.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    front: Vec3,
    right: Vec3,
    up: Vec3,
    world_up: Vec3,

    /// Degrees. -90 looks down -Z.
    yaw: f32,
    /// Degrees, clamped to ±89.
    pitch: f32,

    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,

    movement_speed: f32,
    mouse_sensitivity: f32,

    last_mouse: Option<Vec2>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl Camera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::from_config(&CameraConfig {
            fov,
            aspect,
            near,
            far,
            ..CameraConfig::default()
        })
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            front: -Vec3::Z,
            right: Vec3::X,
            up: Vec3::Y,
            world_up: Vec3::Y,
            yaw: -90.0,
            pitch: 0.0,
            fov: config.fov,
            aspect: config.aspect,
            near: config.near,
            far: config.far,
            movement_speed: config.movement_speed,
            mouse_sensitivity: config.mouse_sensitivity,
            last_mouse: None,
        };
        camera.update_vectors();
        camera
    }

    /// Applies one frame of keyboard movement and mouse-look.
    ///
    /// A re-acquired cursor reseeds the mouse history instead of rotating.
    pub fn update(&mut self, input: &dyn InputProvider, delta_time: f32) {
        self.process_keyboard(input, delta_time);
        if input.cursor_reacquired() {
            self.reset_mouse();
        }
        self.process_mouse(input.mouse_position());
    }

    fn process_keyboard(&mut self, input: &dyn InputProvider, delta_time: f32) {
        let velocity = self.movement_speed * delta_time;

        if input.is_key_down(Key::W) {
            self.position += self.front * velocity;
        }
        if input.is_key_down(Key::S) {
            self.position -= self.front * velocity;
        }
        if input.is_key_down(Key::A) {
            self.position -= self.right * velocity;
        }
        if input.is_key_down(Key::D) {
            self.position += self.right * velocity;
        }
        if input.is_key_down(Key::Space) {
            self.position += self.world_up * velocity;
        }
        if input.is_key_down(Key::Shift) {
            self.position -= self.world_up * velocity;
        }
    }

    /// Feeds an absolute cursor position (logical pixels, +Y down).
    pub fn process_mouse(&mut self, position: Vec2) {
        let Some(last) = self.last_mouse.replace(position) else {
            return;
        };

        let x_offset = (position.x - last.x) * self.mouse_sensitivity;
        // Screen Y grows downward; pitch grows upward.
        let y_offset = (last.y - position.y) * self.mouse_sensitivity;

        self.yaw += x_offset;
        self.pitch = (self.pitch + y_offset).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    /// Forgets the previous cursor sample, e.g. after the cursor was
    /// re-captured.
    pub fn reset_mouse(&mut self) {
        self.last_mouse = None;
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (to_radians(self.yaw), to_radians(self.pitch));
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalized();
        self.right = self.front.cross(self.world_up).normalized();
        self.up = self.right.cross(self.front).normalized();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.position + self.front, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(to_radians(self.fov), self.aspect, self.near, self.far)
    }

    /// `projection * view`.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Sets the aspect from a drawable size; zero extents are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ButtonState, InputEvent, InputState};
    use approx::assert_abs_diff_eq;
    use maya_math::Vec4;

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-4);
        assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-4);
        assert_abs_diff_eq!(a.z, b.z, epsilon = 1e-4);
    }

    fn press(input: &mut InputState, key: Key) {
        input.apply_event(InputEvent::Key {
            key,
            state: ButtonState::Pressed,
            repeat: false,
        });
    }

    #[test]
    fn initial_state() {
        let cam = Camera::new(60.0, 1.0, 0.1, 100.0);
        assert_eq!(cam.position(), Vec3::new(0.0, 0.0, 3.0));
        assert_vec_eq(cam.front(), Vec3::new(0.0, 0.0, -1.0));
        assert_vec_eq(cam.right(), Vec3::X);
        assert_vec_eq(cam.up(), Vec3::Y);
    }

    #[test]
    fn view_moves_eye_to_origin() {
        let cam = Camera::new(60.0, 1.0, 0.1, 100.0);
        let view = cam.view_matrix();
        assert_eq!(view.element(3, 3), 1.0);
        let p = view * Vec4::new(0.0, 0.0, 3.0, 1.0);
        assert_abs_diff_eq!(p.z, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn set_position_roundtrip() {
        let mut cam = Camera::default();
        cam.set_position(Vec3::new(10.0, 5.0, -2.0));
        assert_eq!(cam.position(), Vec3::new(10.0, 5.0, -2.0));
    }

    #[test]
    fn keyboard_moves_along_basis() {
        let mut cam = Camera::default();
        let mut input = InputState::new();
        press(&mut input, Key::W);
        press(&mut input, Key::D);
        cam.update(&input, 1.0);
        // First update only seeds the mouse, so orientation is unchanged.
        assert_vec_eq(cam.position(), Vec3::new(2.5, 0.0, 0.5));
    }

    #[test]
    fn vertical_flight() {
        let mut cam = Camera::default();
        let mut input = InputState::new();
        press(&mut input, Key::Space);
        cam.update(&input, 0.4);
        assert_abs_diff_eq!(cam.position().y, 1.0, epsilon = 1e-5);

        let mut input = InputState::new();
        press(&mut input, Key::Shift);
        cam.update(&input, 0.4);
        assert_abs_diff_eq!(cam.position().y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn first_mouse_sample_does_not_rotate() {
        let mut cam = Camera::default();
        cam.process_mouse(Vec2::new(400.0, 300.0));
        assert_eq!(cam.yaw(), -90.0);
        assert_eq!(cam.pitch(), 0.0);

        cam.process_mouse(Vec2::new(500.0, 300.0));
        assert_abs_diff_eq!(cam.yaw(), -80.0, epsilon = 1e-4);
    }

    #[test]
    fn mouse_up_pitches_up() {
        let mut cam = Camera::default();
        cam.process_mouse(Vec2::new(0.0, 100.0));
        cam.process_mouse(Vec2::new(0.0, 50.0));
        assert_abs_diff_eq!(cam.pitch(), 5.0, epsilon = 1e-4);
        assert!(cam.front().y > 0.0);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = Camera::default();
        cam.process_mouse(Vec2::new(0.0, 10_000.0));
        cam.process_mouse(Vec2::new(0.0, 0.0));
        assert_eq!(cam.pitch(), 89.0);

        cam.process_mouse(Vec2::new(0.0, 20_000.0));
        assert_eq!(cam.pitch(), -89.0);
    }

    #[test]
    fn reset_mouse_reseeds() {
        let mut cam = Camera::default();
        cam.process_mouse(Vec2::new(0.0, 0.0));
        cam.reset_mouse();
        cam.process_mouse(Vec2::new(900.0, 900.0));
        assert_eq!(cam.yaw(), -90.0);
    }

    #[test]
    fn refocus_does_not_jump() {
        let mut cam = Camera::default();
        let mut input = InputState::new();
        input.apply_event(InputEvent::CursorMoved { x: 100.0, y: 100.0 });
        cam.update(&input, 0.016);
        input.update();

        input.apply_event(InputEvent::Focused(false));
        cam.update(&input, 0.016);
        input.update();

        // The cursor moved elsewhere while the window was in the background.
        input.apply_event(InputEvent::Focused(true));
        input.apply_event(InputEvent::CursorMoved { x: 900.0, y: 100.0 });
        cam.update(&input, 0.016);
        input.update();
        assert_eq!(cam.yaw(), -90.0);

        input.apply_event(InputEvent::CursorMoved { x: 910.0, y: 100.0 });
        cam.update(&input, 0.016);
        assert_abs_diff_eq!(cam.yaw(), -89.0, epsilon = 1e-4);
    }

    #[test]
    fn basis_stays_orthonormal() {
        let mut cam = Camera::default();
        cam.process_mouse(Vec2::new(0.0, 0.0));
        cam.process_mouse(Vec2::new(137.0, -61.0));
        assert_abs_diff_eq!(cam.front().length(), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(cam.front().dot(cam.right()), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(cam.up().dot(cam.front()), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn view_projection_order() {
        let cam = Camera::new(60.0, 1.5, 0.1, 50.0);
        let expected = cam.projection_matrix() * cam.view_matrix();
        assert_eq!(cam.view_projection_matrix(), expected);

        // A point on the near plane straight ahead lands at depth 0.
        let ahead = cam.position() + cam.front() * 0.1;
        let clip = cam.view_projection_matrix().transform_point(ahead);
        assert_abs_diff_eq!(clip.z, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn viewport_sets_aspect() {
        let mut cam = Camera::default();
        cam.set_viewport(800, 400);
        assert_eq!(cam.aspect(), 2.0);
        cam.set_viewport(0, 400);
        assert_eq!(cam.aspect(), 2.0);
    }
}
