use std::collections::TryReserveError;

use crate::scene::mesh::MeshError;
use crate::scene::transform::TransformError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error("Viewport has no pixels: {0}x{1}")]
    EmptyViewport(usize, usize),
    #[error("Viewport {0}x{1} does not fit in memory")]
    ViewportTooLarge(usize, usize),
    #[error("Failed to allocate frame buffers: {0}")]
    Allocation(#[from] TryReserveError),
    #[error("Mesh {0} was submitted for rasterization before its vertices were transformed")]
    NotTransformed(usize),
    #[error("{0} raster band(s) were lost to a panicking worker")]
    WorkerLost(usize),
    #[error("Failed to export the color buffer: {0}")]
    Image(#[from] image::ImageError),
    #[error("Window error: {0}")]
    Window(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
