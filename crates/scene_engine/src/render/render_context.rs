//! Render contexts
//!
//! A [`RenderContext`] is one logical viewport: a rectangle of the window, the
//! camera looking through it, its projection and the view frustum used for
//! culling. The [`GlContext`](crate::render::GlContext) owns them and draws
//! each one in turn.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3, Vec4};
use crate::render::frustum::{Frustum, Ray};
use crate::render::primitives::Camera;

/// Height of the ground plane that [`RenderContext::cast_ray`] picks against
const GROUND_HEIGHT: f32 = 0.0;

/// Window-space rectangle in pixels, origin at the bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge
    pub x: f32,
    /// Bottom edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Width divided by height, 1.0 for degenerate heights
    pub fn aspect_ratio(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// One viewport with its camera, projection and frustum
#[derive(Debug, Clone)]
pub struct RenderContext {
    viewport: Viewport,
    fov: f32,
    near: f32,
    far: f32,

    /// Camera looking through this viewport
    pub camera: Camera,

    projection: Mat4,
    frustum: Frustum,
}

impl RenderContext {
    /// Create a render context with a default camera
    ///
    /// `fov` is the vertical field of view in degrees.
    pub fn new(viewport: Viewport, fov: f32, near: f32, far: f32) -> Self {
        let projection = Mat4::perspective(
            utils::deg_to_rad(fov),
            viewport.aspect_ratio(),
            near,
            far,
        );
        let camera = Camera::default();
        let frustum = Frustum::from_matrix(&(projection * camera.view_matrix()));

        Self {
            viewport,
            fov,
            near,
            far,
            camera,
            projection,
            frustum,
        }
    }

    /// Recompute the frustum planes in the object space of `model`
    ///
    /// Later culling tests use these planes until the next call, so this must
    /// run before each object is tested.
    pub fn update_frustum(&mut self, model: &Mat4) {
        self.frustum = Frustum::from_matrix(&(self.projection * self.view() * model));
    }

    /// Frustum from the last [`update_frustum`](Self::update_frustum)
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Whether a sphere is at least partly inside the current frustum
    pub fn sphere_is_inside_frustum(&self, center: &Vec3, radius: f32) -> bool {
        self.frustum.contains_sphere(center, radius)
    }

    /// Whether a point is inside the current frustum
    pub fn point_is_inside_frustum(&self, point: &Vec3) -> bool {
        self.frustum.contains_point(point)
    }

    /// World-space frustum of the camera, independent of any model matrix
    pub fn view_frustum(&self) -> Frustum {
        Frustum::from_matrix(&(self.projection * self.view()))
    }

    /// Pick the point on the ground plane under a window-space position
    ///
    /// `screen_y` grows upwards from the bottom of the window. Returns `None`
    /// when the viewport has no area or the ray runs parallel to the ground
    /// or away from it.
    pub fn cast_ray(&self, screen_x: f32, screen_y: f32) -> Option<Vec3> {
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            return None;
        }
        let ndc_x = 2.0 * (screen_x - self.viewport.x) / self.viewport.width - 1.0;
        let ndc_y = 2.0 * (screen_y - self.viewport.y) / self.viewport.height - 1.0;

        let inverse = (self.projection * self.view()).try_inverse()?;
        let unproject = |ndc_z: f32| -> Option<Vec3> {
            let p = inverse * Vec4::new(ndc_x, ndc_y, ndc_z, 1.0);
            (p.w.abs() > f32::EPSILON).then(|| p.xyz() / p.w)
        };

        let ray = Ray::through(unproject(-1.0)?, unproject(1.0)?)?;
        ray.intersect_horizontal_plane(GROUND_HEIGHT)
    }

    /// Projection matrix
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Current view matrix of the camera
    pub fn view(&self) -> Mat4 {
        self.camera.view_matrix()
    }

    /// Move to a new window rectangle and rebuild the projection for its aspect
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.projection = Mat4::perspective(
            utils::deg_to_rad(self.fov),
            viewport.aspect_ratio(),
            self.near,
            self.far,
        );
    }

    /// Viewport rectangle
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Vertical field of view in degrees
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Near and far clip distances
    pub fn clip_range(&self) -> (f32, f32) {
        (self.near, self.far)
    }
}
