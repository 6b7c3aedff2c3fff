mod app;
mod error;
mod scene;
mod util;

use std::path::PathBuf;

use clap::{Parser, ValueHint};

use scene::mesh::Topology;

#[derive(Debug, Parser)]
#[command(author, version, about = "Software triangle rasterizer")]
struct Cli {
    /// Logging output filters; comma-separated
    #[arg(short, long, default_value = "info", env = "RUST_LOG")]
    log_filter: String,
    /// Viewport width in pixels
    #[arg(long, default_value_t = 640)]
    width: usize,
    /// Viewport height in pixels
    #[arg(long, default_value_t = 480)]
    height: usize,
    /// Wavefront obj to render instead of the demo grid
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    obj: Option<PathBuf>,
    /// Topology of the demo grid: list or strip
    #[arg(short, long, default_value = "list")]
    topology: String,
    /// Vertical field of view in degrees
    #[arg(long, default_value_t = 60.0)]
    fov: f32,
    /// Camera position along z, the camera looks down +z
    #[arg(long, default_value_t = -10.0, allow_negative_numbers = true)]
    camera_z: f32,
    /// Rasterizer threads, 1 keeps everything on the main thread
    #[arg(short, long, default_value_t = 1)]
    workers: usize,
    /// Rows per band when rasterizing with several workers
    #[arg(long, default_value_t = 32)]
    band_rows: usize,
    /// Where the color buffer is exported to, on `X` in the window or after a headless run
    #[arg(short, long, default_value = "Rasterizer_ColorBuffer.bmp", value_hint = ValueHint::FilePath)]
    export: PathBuf,
    /// Render without a window and export the last frame
    #[arg(long)]
    headless: bool,
    /// Frames to render in headless mode
    #[arg(long, default_value_t = 1)]
    frames: usize,
    /// Print frames per second
    #[arg(long)]
    print_fps: bool,
    /// Display the depth buffer instead of colors
    #[arg(long)]
    show_depth: bool,
}

#[show_image::main]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .parse_filters(&cli.log_filter)
        .format_timestamp_micros()
        .init();

    // Unknown topology is a broken mesh definition, nothing sensible can be drawn from it.
    let topology: Topology = cli.topology.parse()?;

    let params = app::Params {
        width: cli.width,
        height: cli.height,
        print_fps: cli.print_fps,
        obj_path: cli.obj,
        topology,
        fov_angle: cli.fov,
        camera_z: cli.camera_z,
        workers: cli.workers,
        band_rows: cli.band_rows,
        export_path: cli.export,
        headless: cli.headless,
        frames: cli.frames,
        show_depth: cli.show_depth,
    };

    app::run(params)?;

    return Ok(());
}
