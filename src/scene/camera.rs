use nalgebra as na;
use na::{Matrix4, Point3};

/// Camera as seen by the pipeline - a view matrix and a field of view scalar.
/// `fov` is tan(angle / 2), the half-height of the view plane at distance 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub view_matrix: Matrix4<f32>, // Local/world space to camera space.
    pub fov: f32,
}

impl Camera {
    /// Camera at `origin` looking down +z with a vertical field of view of `fov_angle` degrees.
    pub fn new(fov_angle: f32, origin: Point3<f32>) -> Self {
        return Self {
            view_matrix: Matrix4::new_translation(&(-origin.coords)),
            fov: (fov_angle.to_radians() / 2.0).tan(),
        };
    }

    /// Camera from an externally built view matrix and fov scalar.
    pub fn from_view(view_matrix: Matrix4<f32>, fov: f32) -> Self {
        return Self { view_matrix, fov };
    }
}

impl Default for Camera {
    /// 60 degrees, 10 units behind the origin.
    fn default() -> Self {
        return Camera::new(60.0, Point3::new(0.0, 0.0, -10.0));
    }
}
