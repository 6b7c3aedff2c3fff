use nalgebra as na;
use na::vector;

use super::camera::Camera;
use super::mesh::{Mesh, Vertex, VertexOut};
use crate::util::{from_hom_point, to_hom_point};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("Vertex {vertex} lies at camera space depth 0, perspective divide is undefined")]
    ZeroDepth { vertex: usize },
}

/// Size of the raster target in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn aspect_ratio(&self) -> f32 {
        return self.width as f32 / self.height as f32;
    }
}

/// Transforms local space vertices to raster space, writing them to `output`.
/// `output` is cleared first, on success it has one vertex per input vertex in the same order.
pub fn transform_vertices(
    input: &[Vertex],
    output: &mut Vec<VertexOut>,
    camera: &Camera,
    viewport: Viewport,
) -> Result<(), TransformError> {
    output.clear();
    output.reserve(input.len());

    let aspect_ratio = viewport.aspect_ratio();
    let width = viewport.width as f32;
    let height = viewport.height as f32;
    for (index, vertex) in input.iter().enumerate() {
        // To view space.
        let view = from_hom_point(camera.view_matrix * to_hom_point(vertex.position));
        if view.z == 0.0 {
            output.clear();
            return Err(TransformError::ZeroDepth { vertex: index });
        }

        // To projection space.
        let mut x = view.x / view.z;
        let mut y = view.y / view.z;
        x /= camera.fov * aspect_ratio;
        y /= camera.fov;

        // To raster space, y flipped since raster origin is the top left corner.
        // View space z is kept as is, it is only ever compared against other depths.
        output.push(VertexOut {
            position: vector![(x + 1.0) / 2.0 * width, (1.0 - y) / 2.0 * height, view.z, 1.0],
            color: vertex.color,
        });
    }

    return Ok(());
}

/// Runs the vertex transformation for every mesh.
pub fn transform_meshes(meshes: &mut [Mesh], camera: &Camera, viewport: Viewport) -> Result<(), TransformError> {
    for mesh in meshes.iter_mut() {
        let (input, output) = mesh.transform_targets();
        transform_vertices(input, output, camera, viewport)?;
    }

    return Ok(());
}
