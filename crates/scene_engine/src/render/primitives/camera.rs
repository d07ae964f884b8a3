//! # Fly Camera
//!
//! First-person camera driven by keyboard movement.
//!
//! ## Coordinate System
//! Right-handed, Y-up world space. The camera looks along `front`; `right` and
//! `up` are re-derived from `front` and the world up vector whenever the
//! orientation changes, so the basis stays orthonormal.

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// Default starting position
const DEFAULT_POSITION: [f32; 3] = [0.0, 5.0, 10.0];

/// Default movement speed in world units per second
const DEFAULT_SPEED: f32 = 2.0;

/// First-person camera
///
/// Position and orientation only; projection parameters live in the owning
/// [`RenderContext`](crate::render::RenderContext).
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Unit view direction
    pub front: Vec3,

    /// Unit up vector of the camera basis
    pub up: Vec3,

    /// Unit right vector of the camera basis
    pub right: Vec3,

    /// World up reference used to rebuild the basis
    pub world_up: Vec3,

    /// Movement speed in world units per second
    pub speed: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::looking_at(DEFAULT_POSITION.into(), Vec3::zeros())
    }
}

impl Camera {
    /// Camera at `position` looking towards `target`
    ///
    /// If `target` coincides with `position` the camera looks down -Z.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let mut camera = Self {
            position,
            front: -Vec3::z(),
            up: Vec3::y(),
            right: Vec3::x(),
            world_up: Vec3::y(),
            speed: DEFAULT_SPEED,
        };
        camera.set_front(target - position);
        camera
    }

    /// Point the camera along `direction`
    ///
    /// Zero-length directions are ignored.
    pub fn set_front(&mut self, direction: Vec3) {
        let Some(front) = direction.try_normalize(f32::EPSILON) else {
            log::trace!("Ignoring zero-length camera direction");
            return;
        };
        self.front = front;
        self.right = front
            .cross(&self.world_up)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vec3::x);
        self.up = self.right.cross(&self.front);
    }

    /// View matrix looking from `position` along `front`
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(&self.position, &(self.position + self.front), &self.up)
    }

    /// Move along the view direction
    pub fn move_forward(&mut self, dt: f32) {
        self.position += self.front * self.step(dt);
    }

    /// Move against the view direction
    pub fn move_backward(&mut self, dt: f32) {
        self.position -= self.front * self.step(dt);
    }

    /// Strafe left
    pub fn move_left(&mut self, dt: f32) {
        self.position -= self.right * self.step(dt);
    }

    /// Strafe right
    pub fn move_right(&mut self, dt: f32) {
        self.position += self.right * self.step(dt);
    }

    /// Move towards -Z regardless of orientation
    pub fn move_forward_z(&mut self, dt: f32) {
        self.position.z -= self.step(dt);
    }

    /// Move towards +Z regardless of orientation
    pub fn move_backward_z(&mut self, dt: f32) {
        self.position.z += self.step(dt);
    }

    fn step(&self, dt: f32) -> f32 {
        self.speed * dt
    }
}
