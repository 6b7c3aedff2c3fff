use std::path::PathBuf;
use std::time;

use log::{debug, info, warn};
use nalgebra::Point3;
use show_image::{create_window, event, ImageInfo, ImageView, WindowOptions};

use crate::error::{Error, Result};
use crate::scene::camera::Camera;
use crate::scene::mesh::{demo, Mesh, Topology};
use crate::scene::{RasterConfig, Rasterizer};

/// Everything `run` needs to know, filled from the command line.
pub struct Params {
    pub width: usize,
    pub height: usize,
    pub print_fps: bool,
    pub obj_path: Option<PathBuf>, // Demo grid is rendered when not set.
    pub topology: Topology,        // Topology of the demo grid.
    pub fov_angle: f32,            // Degrees.
    pub camera_z: f32,
    pub workers: usize,
    pub band_rows: usize,
    pub export_path: PathBuf,
    pub headless: bool,
    pub frames: usize,             // Frames rendered before exporting in headless mode.
    pub show_depth: bool,
}

/// Helper, checking whether the event is a release of the given key.
fn is_key_released(window_event: &event::WindowEvent, key: event::VirtualKeyCode) -> bool {
    if let event::WindowEvent::KeyboardInput(event) = window_event {
        return event.input.key_code == Some(key) && event.input.state.is_released();
    }

    return false;
}

fn window_error<E: std::fmt::Display>(error: E) -> Error {
    return Error::Window(error.to_string());
}

fn load_meshes(params: &Params) -> Result<Vec<Mesh>> {
    let mesh = match &params.obj_path {
        Some(path) => {
            info!("Loading {}", path.display());
            Mesh::from_obj(path)?
        }
        None => demo::quad_grid(params.topology)?,
    };
    info!(
        "Mesh: {} vertices, {} indices, {:?}",
        mesh.vertices().len(),
        mesh.indices().len(),
        mesh.topology()
    );

    return Ok(vec![mesh]);
}

/// Sets up the rasterizer and runs the frame loop, either in a window or headless.
pub fn run(params: Params) -> Result<()> {
    let mut rasterizer = Rasterizer::new(RasterConfig {
        width: params.width,
        height: params.height,
        workers: params.workers,
        band_rows: params.band_rows,
        ..Default::default()
    })?;
    let mut meshes = load_meshes(&params)?;
    let camera = Camera::new(params.fov_angle, Point3::new(0.0, 0.0, params.camera_z));

    if params.headless {
        for _ in 0..params.frames.max(1) {
            rasterizer.render(&mut meshes, &camera)?;
        }
        rasterizer.buffer().save_bmp(&params.export_path)?;
        info!("Color buffer written to {}", params.export_path.display());
        return Ok(());
    }

    let window_options = WindowOptions {
        size: Some([params.width as u32, params.height as u32]),
        ..Default::default()
    };
    let window = create_window("tiny_rasterizer", window_options).map_err(window_error)?;
    let event_channel = window.event_channel().map_err(window_error)?;

    let mut frame_counter_time_begin = time::Instant::now();
    let mut frame_counter: u32 = 0;
    loop {
        let stats = rasterizer.render(&mut meshes, &camera)?;
        debug!("Frame done: {:?}", stats);

        let frame_data = match params.show_depth {
            true => rasterizer.buffer().depth_to_rgb8(),
            false => rasterizer.buffer().to_rgb8(),
        };
        let image_info = ImageInfo::rgb8(params.width as u32, params.height as u32);
        window
            .set_image("frame", ImageView::new(image_info, &frame_data))
            .map_err(window_error)?;

        // Unloading everything that has piled up in the event channel since the last frame.
        let mut exit = false;
        let mut export = false;
        for window_event in event_channel.try_iter() {
            exit |= is_key_released(&window_event, event::VirtualKeyCode::Escape);
            export |= is_key_released(&window_event, event::VirtualKeyCode::X);
        }
        if export {
            match rasterizer.buffer().save_bmp(&params.export_path) {
                Ok(()) => info!("Color buffer written to {}", params.export_path.display()),
                Err(error) => warn!("Export failed: {}", error),
            }
        }
        if exit {
            break;
        }

        if params.print_fps {
            // Counting frames to printout stats every second.
            frame_counter += 1;
            if frame_counter_time_begin.elapsed().as_secs_f32() > 1.0 {
                info!("FPS --- {}", frame_counter);
                frame_counter_time_begin = time::Instant::now();
                frame_counter = 0;
            }
        }
    }

    return Ok(());
}
