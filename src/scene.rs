pub mod buffer;
pub mod camera;
pub mod color;
pub mod mesh;
pub mod raster;
pub mod transform;

use std::sync::{mpsc, Arc};

use log::{debug, info};
use threadpool::ThreadPool;

use crate::error::{Error, Result};
use buffer::FrameBuffer;
use camera::Camera;
use color::ColorRGB;
use mesh::Mesh;
use raster::{rasterize_band, setup_triangles, RasterStats};
use transform::{transform_meshes, Viewport};

/// Settings the rasterizer is created with.
#[derive(Debug, Clone)]
pub struct RasterConfig {
    pub width: usize,
    pub height: usize,
    pub background: ColorRGB, // Color the frame is cleared to.
    pub workers: usize,       // 0 or 1 rasterizes on the calling thread.
    pub band_rows: usize,     // Height of the horizontal slices handed to workers.
}

impl Default for RasterConfig {
    fn default() -> Self {
        return Self {
            width: 640,
            height: 480,
            background: ColorRGB::from_rgb8(100, 100, 100),
            workers: 1,
            band_rows: 32,
        };
    }
}

/// Owns the frame buffer and runs the transform and raster stages over it once per frame.
pub struct Rasterizer {
    config: RasterConfig,
    buffer: FrameBuffer,
    pool: Option<ThreadPool>,
}

impl Rasterizer {
    /// Allocates frame buffers for the configured viewport. Fails before any frame is rendered if
    /// the viewport is empty or the buffers can't be allocated.
    pub fn new(config: RasterConfig) -> Result<Self> {
        let buffer = FrameBuffer::new(config.width, config.height)?;
        let pool = match config.workers {
            0 | 1 => None,
            workers => Some(ThreadPool::with_name("rasterizer".to_string(), workers)),
        };
        info!(
            "Rasterizer ready: {}x{}, {} worker(s), {} rows per band",
            config.width,
            config.height,
            config.workers.max(1),
            config.band_rows
        );

        return Ok(Self { config, buffer, pool });
    }

    pub fn viewport(&self) -> Viewport {
        return Viewport {
            width: self.buffer.width(),
            height: self.buffer.height(),
        };
    }

    pub fn buffer(&self) -> &FrameBuffer {
        return &self.buffer;
    }

    /// Renders one frame: clears the buffers, transforms every mesh with `camera` and
    /// rasterizes them in order.
    pub fn render(&mut self, meshes: &mut [Mesh], camera: &Camera) -> Result<RasterStats> {
        self.buffer.clear(self.config.background);
        transform_meshes(meshes, camera, self.viewport())?;
        return self.rasterize(meshes);
    }

    /// Rasterizes already transformed meshes on top of the current buffer contents.
    /// Depth is only meaningful if the buffer was cleared at the start of the frame.
    pub fn rasterize(&mut self, meshes: &[Mesh]) -> Result<RasterStats> {
        let (setups, stats) = setup_triangles(meshes, self.buffer.width(), self.buffer.height())?;

        match &self.pool {
            None => rasterize_band(&setups, &mut self.buffer.as_view()),
            Some(pool) => {
                // Every band sees every triangle in submission order, so the result matches
                // the single threaded path pixel for pixel.
                let setups = Arc::new(setups);
                let bands = self.buffer.split_bands(self.config.band_rows);
                let band_count = bands.len();
                let (sender, receiver) = mpsc::channel();
                for mut band in bands {
                    let setups = Arc::clone(&setups);
                    let sender = sender.clone();
                    pool.execute(move || {
                        rasterize_band(&setups, &mut band.as_view());
                        // Receiver outlives the jobs, it is only dropped after all bands arrive.
                        let _ = sender.send(band);
                    });
                }
                drop(sender);

                let mut merged = 0;
                for band in receiver.iter() {
                    self.buffer.merge_band(&band);
                    merged += 1;
                }
                if merged != band_count {
                    return Err(Error::WorkerLost(band_count - merged));
                }
            }
        }
        debug!("Rasterized {} triangles, skipped {}", stats.triangles, stats.skipped);

        return Ok(stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh::{demo, Topology, Vertex};
    use nalgebra::{Matrix4, Point3};

    fn config(width: usize, height: usize) -> RasterConfig {
        return RasterConfig {
            width,
            height,
            background: ColorRGB::BLACK,
            ..Default::default()
        };
    }

    /// Camera at the origin looking down +z, ndc equals x / z and y / z on a square viewport.
    fn unit_camera() -> Camera {
        return Camera::from_view(Matrix4::identity(), 1.0);
    }

    fn channels(packed: u32) -> [u8; 3] {
        return ColorRGB::unpack_rgb8(packed);
    }

    /// Red apex at the top, green and blue base. Raster space (50, 10), (90, 90), (10, 90).
    fn red_top_triangle(depth: f32) -> Mesh {
        return Mesh::new(
            vec![
                Vertex::with_color(0.0, 0.8 * depth, depth, ColorRGB::RED),
                Vertex::with_color(0.8 * depth, -0.8 * depth, depth, ColorRGB::GREEN),
                Vertex::with_color(-0.8 * depth, -0.8 * depth, depth, ColorRGB::BLUE),
            ],
            vec![0, 1, 2],
            Topology::TriangleList,
        )
        .unwrap();
    }

    fn solid_triangle(depth: f32, half_size: f32, color: ColorRGB) -> Mesh {
        return Mesh::new(
            vec![
                Vertex::with_color(0.0, half_size * depth, depth, color),
                Vertex::with_color(half_size * depth, -half_size * depth, depth, color),
                Vertex::with_color(-half_size * depth, -half_size * depth, depth, color),
            ],
            vec![0, 1, 2],
            Topology::TriangleList,
        )
        .unwrap();
    }

    #[test]
    fn single_triangle_interpolates_from_apex() {
        let mut rasterizer = Rasterizer::new(config(100, 100)).unwrap();
        let mut meshes = vec![red_top_triangle(1.0)];
        let stats = rasterizer.render(&mut meshes, &unit_camera()).unwrap();
        assert_eq!(stats, RasterStats { triangles: 1, skipped: 0 });
        let buffer = rasterizer.buffer();

        // Red fades going down the center column, towards the base edge.
        let reds: Vec<u8> = [20, 40, 60, 80].iter().map(|&y| channels(buffer.pixel(50, y))[0]).collect();
        assert!(reds.windows(2).all(|pair| pair[0] > pair[1]), "{:?}", reds);
        assert!(channels(buffer.pixel(50, 12))[0] > 240);

        // Left side of the base leans blue, right side green.
        let left = channels(buffer.pixel(20, 88));
        let right = channels(buffer.pixel(80, 88));
        assert!(left[2] > left[1]);
        assert!(right[1] > right[2]);

        // Nothing outside the edges.
        for (x, y) in [(5, 5), (95, 5), (20, 30), (80, 30), (50, 95), (2, 95)] {
            assert_eq!(buffer.pixel(x, y), ColorRGB::BLACK.to_packed(), "pixel ({}, {})", x, y);
            assert_eq!(buffer.depth(x, y), f32::MAX);
        }
    }

    #[test]
    fn nearer_triangle_wins_regardless_of_order() {
        for near_first in [true, false] {
            let near = solid_triangle(2.0, 0.5, ColorRGB::RED);
            let far = solid_triangle(6.0, 0.8, ColorRGB::BLUE);
            let mut meshes = if near_first { vec![near, far] } else { vec![far, near] };
            let mut rasterizer = Rasterizer::new(config(100, 100)).unwrap();
            rasterizer.render(&mut meshes, &unit_camera()).unwrap();
            let buffer = rasterizer.buffer();
            // Overlap.
            assert_eq!(buffer.pixel(50, 50), ColorRGB::RED.to_packed());
            assert!((buffer.depth(50, 50) - 2.0).abs() < 1e-4);
            // Only the bigger, farther triangle reaches here.
            assert_eq!(buffer.pixel(50, 85), ColorRGB::BLUE.to_packed());
        }
    }

    #[test]
    fn every_mesh_uses_its_own_vertices() {
        let left = Mesh::new(
            vec![
                Vertex::with_color(-0.9, 0.5, 1.0, ColorRGB::GREEN),
                Vertex::with_color(-0.1, -0.5, 1.0, ColorRGB::GREEN),
                Vertex::with_color(-0.9, -0.5, 1.0, ColorRGB::GREEN),
            ],
            vec![0, 1, 2],
            Topology::TriangleList,
        )
        .unwrap();
        let right = Mesh::new(
            vec![
                Vertex::with_color(0.1, 0.5, 1.0, ColorRGB::BLUE),
                Vertex::with_color(0.9, 0.5, 1.0, ColorRGB::BLUE),
                Vertex::with_color(0.1, -0.5, 1.0, ColorRGB::BLUE),
                Vertex::with_color(0.9, -0.5, 1.0, ColorRGB::BLUE),
            ],
            vec![0, 1, 2, 3],
            Topology::TriangleStrip,
        )
        .unwrap();
        let mut meshes = vec![left, right];
        let mut rasterizer = Rasterizer::new(config(100, 100)).unwrap();
        rasterizer.render(&mut meshes, &unit_camera()).unwrap();
        let buffer = rasterizer.buffer();
        assert_eq!(buffer.pixel(15, 60), ColorRGB::GREEN.to_packed());
        assert_eq!(buffer.pixel(80, 50), ColorRGB::BLUE.to_packed());
    }

    #[test]
    fn parallel_bands_match_single_thread() {
        for topology in [Topology::TriangleList, Topology::TriangleStrip] {
            let camera = Camera::new(60.0, Point3::new(0.5, -0.25, -10.0));
            let mut meshes = vec![demo::quad_grid(topology).unwrap()];

            let mut single = Rasterizer::new(config(160, 120)).unwrap();
            let single_stats = single.render(&mut meshes, &camera).unwrap();

            let parallel_config = RasterConfig { workers: 4, band_rows: 7, ..config(160, 120) };
            let mut parallel = Rasterizer::new(parallel_config).unwrap();
            let parallel_stats = parallel.render(&mut meshes, &camera).unwrap();

            assert_eq!(single_stats, parallel_stats);
            assert_eq!(single.buffer().pixels(), parallel.buffer().pixels());
            assert_eq!(single.buffer().depths(), parallel.buffer().depths());
        }
    }

    #[test]
    fn strip_connectors_are_skipped_as_degenerate() {
        let mut rasterizer = Rasterizer::new(config(160, 120)).unwrap();
        let mut meshes = vec![demo::quad_grid(Topology::TriangleStrip).unwrap()];
        let stats = rasterizer.render(&mut meshes, &Camera::default()).unwrap();
        assert_eq!(stats, RasterStats { triangles: 8, skipped: 4 });
    }

    #[test]
    fn list_and_strip_grids_agree_on_the_center() {
        for topology in [Topology::TriangleList, Topology::TriangleStrip] {
            let mut rasterizer = Rasterizer::new(config(160, 120)).unwrap();
            rasterizer.render(&mut [demo::quad_grid(topology).unwrap()], &Camera::default()).unwrap();
            let buffer = rasterizer.buffer();
            // White center vertex of the grid projects exactly onto (80, 60).
            assert_eq!(buffer.pixel(80, 60), ColorRGB::WHITE.to_packed());
            assert!((buffer.depth(80, 60) - 8.0).abs() < 1e-4);
            assert_eq!(buffer.pixel(2, 2), ColorRGB::BLACK.to_packed());
            assert_eq!(buffer.pixel(157, 117), ColorRGB::BLACK.to_packed());
        }
    }

    #[test]
    fn frames_do_not_leak_into_each_other() {
        let mut rasterizer = Rasterizer::new(config(100, 100)).unwrap();
        rasterizer.render(&mut [red_top_triangle(1.0)], &unit_camera()).unwrap();
        let stats = rasterizer.render(&mut [], &unit_camera()).unwrap();
        assert_eq!(stats, RasterStats::default());
        assert!(rasterizer.buffer().pixels().iter().all(|&p| p == ColorRGB::BLACK.to_packed()));
        assert!(rasterizer.buffer().depths().iter().all(|&z| z == f32::MAX));
    }

    #[test]
    fn zero_depth_vertex_aborts_the_frame() {
        let mut rasterizer = Rasterizer::new(config(10, 10)).unwrap();
        let mesh = Mesh::new(
            vec![Vertex::new(0.0, 0.0, 0.0), Vertex::new(1.0, 0.0, 1.0), Vertex::new(0.0, 1.0, 1.0)],
            vec![0, 1, 2],
            Topology::TriangleList,
        )
        .unwrap();
        let result = rasterizer.render(&mut [mesh], &unit_camera());
        assert!(matches!(result, Err(Error::Transform(_))));
    }

    #[test]
    fn empty_viewport_fails_at_init() {
        assert!(matches!(Rasterizer::new(config(0, 480)), Err(Error::EmptyViewport(0, 480))));
    }
}
