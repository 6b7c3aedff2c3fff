use log::trace;
use nalgebra as na;
use na::{vector, Vector2, Vector3};

use super::buffer::BandView;
use super::color::ColorRGB;
use super::mesh::{Mesh, VertexOut};
use crate::error::{Error, Result};
use crate::util::{cross_2d, BoundingBox, PixelRange};

/// Everything the pixel loop needs to know about one triangle, computed once per triangle.
#[derive(Debug, Clone, Copy)]
pub struct TriangleSetup {
    v0: Vector2<f32>,
    v1: Vector2<f32>,
    v2: Vector2<f32>,
    edge01: Vector2<f32>,
    edge12: Vector2<f32>,
    edge20: Vector2<f32>,
    depths: Vector3<f32>,   // Camera space z of every vertex.
    colors: [ColorRGB; 3],
    area: f32,              // Signed, (v1 - v0) x (v2 - v0).
    pixels: PixelRange,     // Candidate pixel centers, already clipped to the viewport.
}

impl TriangleSetup {
    /// Prepares a triangle for a `width` x `height` target.
    /// Returns None if the triangle can't cover any pixel center: zero or negative area (degenerate
    /// or facing away under the clockwise-in-raster-space convention), non-finite coordinates or
    /// a bounding box outside of the viewport.
    pub fn new(a: &VertexOut, b: &VertexOut, c: &VertexOut, width: usize, height: usize) -> Option<Self> {
        let v0 = a.position.xy();
        let v1 = b.position.xy();
        let v2 = c.position.xy();
        if ![v0, v1, v2].iter().all(|v| v.x.is_finite() && v.y.is_finite()) {
            return None;
        }

        let area = cross_2d(v1 - v0, v2 - v0);
        // Also rules out NaN, weights are normalized by the area.
        if !(area > 0.0) {
            return None;
        }
        let pixels = BoundingBox::from_triangle(v0, v1, v2).pixel_range(width, height)?;

        return Some(Self {
            v0,
            v1,
            v2,
            edge01: v1 - v0,
            edge12: v2 - v1,
            edge20: v0 - v2,
            depths: vector![a.position.z, b.position.z, c.position.z],
            colors: [a.color, b.color, c.color],
            area,
            pixels,
        });
    }

    /// Barycentric weights (v0, v1, v2) of point `p`, or None if `p` is outside of the triangle.
    /// Every edge function has to be non-negative, the first negative one rejects the point.
    pub fn weights(&self, p: Vector2<f32>) -> Option<Vector3<f32>> {
        let weight_v2 = cross_2d(self.edge01, p - self.v0);
        if weight_v2 < 0.0 {
            return None;
        }
        let weight_v0 = cross_2d(self.edge12, p - self.v1);
        if weight_v0 < 0.0 {
            return None;
        }
        let weight_v1 = cross_2d(self.edge20, p - self.v2);
        if weight_v1 < 0.0 {
            return None;
        }

        return Some(vector![weight_v0, weight_v1, weight_v2] / self.area);
    }
}

/// Counters of a single rasterization pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RasterStats {
    pub triangles: usize, // Triangles that reached the pixel loop.
    pub skipped: usize,   // Degenerate, facing away or off screen.
}

/// Prepares every triangle of every mesh in submission order.
/// Meshes must have been run through the transformer for the current frame.
pub fn setup_triangles(meshes: &[Mesh], width: usize, height: usize) -> Result<(Vec<TriangleSetup>, RasterStats)> {
    let mut setups = Vec::with_capacity(meshes.iter().map(|mesh| mesh.triangle_count()).sum());
    let mut stats = RasterStats::default();
    for (mesh_index, mesh) in meshes.iter().enumerate() {
        if !mesh.is_transformed() {
            return Err(Error::NotTransformed(mesh_index));
        }
        let vertices = mesh.vertices_out();
        for triangle in mesh.triangles() {
            let setup = TriangleSetup::new(
                &vertices[triangle.idx0],
                &vertices[triangle.idx1],
                &vertices[triangle.idx2],
                width,
                height,
            );
            match setup {
                Some(setup) => {
                    stats.triangles += 1;
                    setups.push(setup);
                }
                None => {
                    trace!(
                        "Skipping triangle ({}, {}, {}) of mesh {}, {:?} winding",
                        triangle.idx0,
                        triangle.idx1,
                        triangle.idx2,
                        mesh_index,
                        triangle.winding
                    );
                    stats.skipped += 1;
                }
            }
        }
    }

    return Ok((setups, stats));
}

/// Fills the pixels of one triangle that fall into `target`, with depth testing.
pub fn rasterize_triangle(setup: &TriangleSetup, target: &mut BandView) {
    let range = match setup.pixels.clip_rows(target.row_start, target.row_end()) {
        Some(range) => range,
        None => return,
    };
    let [color_v0, color_v1, color_v2] = setup.colors;

    for py in range.y_min..=range.y_max {
        let row_offset = (py - target.row_start) * target.width;
        for px in range.x_min..=range.x_max {
            // Pixel center is taken at integer coordinates.
            let weights = match setup.weights(vector![px as f32, py as f32]) {
                Some(weights) => weights,
                None => continue,
            };

            let index = row_offset + px;
            let depth = weights.dot(&setup.depths);
            if depth > target.depth[index] {
                // Something closer already owns this pixel.
                continue;
            }
            target.depth[index] = depth;

            let color = color_v0 * weights.x + color_v1 * weights.y + color_v2 * weights.z;
            target.pixels[index] = color.max_to_one().to_packed();
        }
    }
}

/// Rasterizes triangles into `target` in the given order.
pub fn rasterize_band(setups: &[TriangleSetup], target: &mut BandView) {
    for setup in setups {
        rasterize_triangle(setup, target);
    }
}
