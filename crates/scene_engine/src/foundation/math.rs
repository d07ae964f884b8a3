//! Math utilities and types
//!
//! Provides the nalgebra aliases used across the renderer plus the handful of
//! OpenGL-convention matrix builders the scene code needs.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}

/// Extension trait for Mat4 with the OpenGL-convention builders
pub trait Mat4Ext {
    /// Translation matrix
    fn translation(offset: &Vec3) -> Mat4;

    /// Rotation of `degrees` around `axis`; the axis does not need to be normalized
    fn rotation_degrees(degrees: f32, axis: &Vec3) -> Mat4;

    /// Right-handed perspective projection with clip-space z in [-1, 1]
    ///
    /// `fov_y` is in radians.
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed look-at view matrix
    fn look_at(eye: &Vec3, target: &Vec3, up: &Vec3) -> Mat4;

    /// Copy of the matrix with its translation removed (upper 3x3 kept)
    fn without_translation(&self) -> Mat4;

    /// Length of the longest basis vector, i.e. the largest axis scale
    fn max_axis_scale(&self) -> f32;
}

impl Mat4Ext for Mat4 {
    fn translation(offset: &Vec3) -> Mat4 {
        Mat4::new_translation(offset)
    }

    fn rotation_degrees(degrees: f32, axis: &Vec3) -> Mat4 {
        match Unit::try_new(*axis, f32::EPSILON) {
            Some(axis) => Mat4::from_axis_angle(&axis, utils::deg_to_rad(degrees)),
            None => Mat4::identity(),
        }
    }

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let f = 1.0 / (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = f / aspect;
        result[(1, 1)] = f;
        result[(2, 2)] = (far + near) / (near - far);
        result[(2, 3)] = (2.0 * far * near) / (near - far);
        result[(3, 2)] = -1.0;
        result
    }

    fn look_at(eye: &Vec3, target: &Vec3, up: &Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(up).normalize();
        let camera_up = right.cross(&forward);

        Mat4::new(
            right.x, right.y, right.z, -right.dot(eye),
            camera_up.x, camera_up.y, camera_up.z, -camera_up.dot(eye),
            -forward.x, -forward.y, -forward.z, forward.dot(eye),
            0.0, 0.0, 0.0, 1.0,
        )
    }

    fn without_translation(&self) -> Mat4 {
        let upper: Mat3 = self.fixed_view::<3, 3>(0, 0).into_owned();
        upper.to_homogeneous()
    }

    fn max_axis_scale(&self) -> f32 {
        (0..3)
            .map(|c| self.fixed_view::<3, 1>(0, c).norm())
            .fold(0.0, f32::max)
    }
}
