/// Camera system with FPS-style controls
/// Left-handed: +X right, +Y up, +Z into the screen
use glam::{Mat4, Quat, Vec3};

/// Matrices handed to the vertex stage, refreshed once per frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub projection: Mat4,
    pub inverse_view: Mat4,
    /// Camera position in world space.
    pub origin: Vec3,
}

impl CameraMatrices {
    pub fn identity() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            inverse_view: Mat4::IDENTITY,
            origin: Vec3::ZERO,
        }
    }

    #[inline]
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,   // Rotation around Y axis (radians)
    pub pitch: f32, // Rotation around X axis (radians), positive looks down
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub aspect_ratio: f32,

    // Movement state
    pub move_speed: f32,
    pub mouse_sensitivity: f32,
}

impl Camera {
    pub const DEFAULT_FOV_DEGREES: f32 = 45.0;
    pub const DEFAULT_NEAR: f32 = 0.1;
    pub const DEFAULT_FAR: f32 = 100.0;

    pub fn new(position: Vec3, aspect_ratio: f32) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            fov: Self::DEFAULT_FOV_DEGREES.to_radians(),
            near: Self::DEFAULT_NEAR,
            far: Self::DEFAULT_FAR,
            aspect_ratio,
            move_speed: 10.0,
            mouse_sensitivity: 0.002,
        }
    }

    /// Point the camera at `target` by recomputing yaw and pitch.
    pub fn look_at(&mut self, target: Vec3) {
        let dir = (target - self.position).normalize_or_zero();
        if dir == Vec3::ZERO {
            return;
        }
        self.yaw = dir.x.atan2(dir.z);
        self.pitch = (-dir.y).asin();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_lh(self.position, self.forward(), self.up())
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_lh(self.fov, self.aspect_ratio, self.near, self.far)
    }

    pub fn matrices(&self) -> CameraMatrices {
        let view = self.view_matrix();
        CameraMatrices {
            view,
            projection: self.projection_matrix(),
            inverse_view: view.inverse(),
            origin: self.position,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation_quat() * Vec3::Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation_quat() * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation_quat() * Vec3::Y
    }

    fn rotation_quat(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }

    /// Update camera orientation from mouse delta (pixels, y down)
    pub fn rotate(&mut self, mouse_delta_x: f32, mouse_delta_y: f32) {
        self.yaw += mouse_delta_x * self.mouse_sensitivity;
        self.pitch += mouse_delta_y * self.mouse_sensitivity;

        // Clamp pitch to prevent gimbal lock
        const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;
        self.pitch = self.pitch.clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Move camera in local space
    pub fn move_local(&mut self, forward: f32, right: f32, up: f32, dt: f32) {
        let move_vec = self.forward() * forward + self.right() * right + Vec3::Y * up;
        self.position += move_vec * self.move_speed * dt;
    }

    /// Update aspect ratio (call when window resizes)
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }
}

/// Camera controller - handles input state
#[derive(Debug, Default)]
pub struct CameraController {
    pub forward_pressed: bool,
    pub backward_pressed: bool,
    pub left_pressed: bool,
    pub right_pressed: bool,
    pub up_pressed: bool,
    pub down_pressed: bool,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update camera based on controller state
    pub fn update_camera(&self, camera: &mut Camera, dt: f32) {
        let axis = |pos: bool, neg: bool| (pos as i32 - neg as i32) as f32;
        let forward = axis(self.forward_pressed, self.backward_pressed);
        let right = axis(self.right_pressed, self.left_pressed);
        let up = axis(self.up_pressed, self.down_pressed);

        if forward != 0.0 || right != 0.0 || up != 0.0 {
            camera.move_local(forward, right, up, dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_ahead_lands_in_depth_range() {
        let camera = Camera::new(Vec3::ZERO, 800.0 / 480.0);
        let m = camera.matrices();
        let clip = m.view_projection() * Vec3::new(0.0, 0.0, 50.0).extend(1.0);
        assert!((clip.w - 50.0).abs() < 1e-4);
        let z = clip.z / clip.w;
        assert!(z > 0.99 && z < 1.0);
        // Behind the camera w goes negative
        let behind = m.view_projection() * Vec3::new(0.0, 0.0, -5.0).extend(1.0);
        assert!(behind.w < 0.0);
    }

    #[test]
    fn positive_yaw_turns_right() {
        let mut camera = Camera::new(Vec3::ZERO, 1.0);
        camera.rotate(100.0, 0.0);
        assert!(camera.forward().x > 0.0);
    }

    #[test]
    fn look_at_faces_target() {
        let mut camera = Camera::new(Vec3::new(0.0, 5.0, 0.0), 1.0);
        let target = Vec3::new(3.0, 0.0, 10.0);
        camera.look_at(target);
        let expected = (target - camera.position).normalize();
        assert!(camera.forward().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn inverse_view_recovers_origin() {
        let mut camera = Camera::new(Vec3::new(1.0, 2.0, 3.0), 1.0);
        camera.rotate(40.0, -25.0);
        let m = camera.matrices();
        let origin = m.inverse_view.transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(m.origin, 1e-4));
    }

    #[test]
    fn controller_moves_forward() {
        let mut camera = Camera::new(Vec3::ZERO, 1.0);
        let controller = CameraController {
            forward_pressed: true,
            ..Default::default()
        };
        controller.update_camera(&mut camera, 0.5);
        assert!(camera.position.abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-5));
    }
}
