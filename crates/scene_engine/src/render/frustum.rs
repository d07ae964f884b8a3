//! View frustum and bounding volumes for visibility culling

use crate::foundation::math::{Mat4, Mat4Ext, Vec3, Vec4};

/// Plane defined by normal and distance from origin
///
/// Points `p` with `normal · p + distance >= 0` are on the inner side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal pointing into the frustum
    pub normal: Vec3,
    /// Signed distance term
    pub distance: f32,
}

impl Plane {
    /// Plane from an unnormalized `(a, b, c, d)` equation
    ///
    /// Degenerate equations (zero normal) produce a plane that contains
    /// everything, so a broken projection never culls.
    pub fn from_equation(equation: Vec4) -> Self {
        let normal = Vec3::new(equation.x, equation.y, equation.z);
        let length = normal.norm();
        if length <= f32::EPSILON {
            return Self { normal: Vec3::zeros(), distance: 0.0 };
        }
        Self {
            normal: normal / length,
            distance: equation.w / length,
        }
    }

    /// Signed distance from the plane to a point
    pub fn distance_to_point(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// Six clip planes (left, right, bottom, top, near, far)
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Planes with normals pointing inward
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract the planes of a clip matrix (Gribb/Hartmann)
    ///
    /// With `projection * view` the planes are in world space; with
    /// `projection * view * model` they are in that model's object space.
    pub fn from_matrix(clip: &Mat4) -> Self {
        let row = |i: usize| -> Vec4 { clip.row(i).transpose() };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_equation(r3 + r0),
                Plane::from_equation(r3 - r0),
                Plane::from_equation(r3 + r1),
                Plane::from_equation(r3 - r1),
                Plane::from_equation(r3 + r2),
                Plane::from_equation(r3 - r2),
            ],
        }
    }

    /// A frustum that contains everything
    pub fn unbounded() -> Self {
        Self::from_matrix(&Mat4::zeros())
    }

    /// Whether a sphere is at least partly inside
    ///
    /// The sphere is rejected only when it lies entirely behind one plane, so
    /// spheres near a frustum corner may pass while being outside.
    pub fn contains_sphere(&self, center: &Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(center) >= -radius)
    }

    /// Whether a point is inside
    pub fn contains_point(&self, point: &Vec3) -> bool {
        self.contains_sphere(point, 0.0)
    }

    /// Test an object-space sphere placed in the world by `model`
    ///
    /// `self` must be a world-space frustum (built from `projection * view`).
    /// The radius grows with the model's largest axis scale.
    pub fn intersects_sphere(&self, model: &Mat4, local_center: &Vec3, radius: f32) -> bool {
        let center = model.transform_point(&(*local_center).into()).coords;
        self.contains_sphere(&center, radius * model.max_axis_scale())
    }
}

/// Sphere enclosing a set of points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Center in object space
    pub center: Vec3,
    /// Radius
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere around the midpoint of the points' bounding box
    ///
    /// Returns `None` for an empty point set.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
        I::IntoIter: Clone,
    {
        let points = points.into_iter();
        let (min, max) = points.clone().fold(None, |acc: Option<(Vec3, Vec3)>, p| {
            Some(match acc {
                None => (p, p),
                Some((min, max)) => (min.inf(&p), max.sup(&p)),
            })
        })?;

        let center = (min + max) * 0.5;
        let radius = points.map(|p| (p - center).norm()).fold(0.0, f32::max);
        Some(Self { center, radius })
    }
}

/// Ray with an origin and a unit direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Starting point
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    /// Ray through two points; `None` if they coincide
    pub fn through(from: Vec3, to: Vec3) -> Option<Self> {
        let direction = (to - from).try_normalize(f32::EPSILON)?;
        Some(Self { origin: from, direction })
    }

    /// Point at distance `t` along the ray
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// First hit with the horizontal plane `y = height`
    pub fn intersect_horizontal_plane(&self, height: f32) -> Option<Vec3> {
        if self.direction.y.abs() <= f32::EPSILON {
            return None;
        }
        let t = (height - self.origin.y) / self.direction.y;
        (t >= 0.0).then(|| self.point_at(t))
    }
}
