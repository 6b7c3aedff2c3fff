use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use nalgebra as na;
use na::{Point3, Vector4};
use obj::{load_obj, Obj};

use super::color::ColorRGB;

#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("Triangle list needs a multiple of 3 indices, got {0}")]
    IndexCountNotMultipleOfThree(usize),
    #[error("Triangle strip needs at least 3 indices, got {0}")]
    StripTooShort(usize),
    #[error("Index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        index: u32,
        position: usize,
        vertex_count: usize,
    },
    #[error("Unknown primitive topology: {0:?}")]
    UnknownTopology(String),
    #[error("Failed to read mesh: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse obj: {0}")]
    Obj(#[from] obj::ObjError),
}

/// How the index list of a mesh is grouped into triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    TriangleList,
    TriangleStrip,
}

impl FromStr for Topology {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s.trim().to_ascii_lowercase().as_str() {
            "list" | "trianglelist" | "triangle_list" => Ok(Topology::TriangleList),
            "strip" | "trianglestrip" | "triangle_strip" => Ok(Topology::TriangleStrip),
            _ => Err(MeshError::UnknownTopology(s.to_string())),
        };
    }
}

/// Input vertex in local (model) space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub color: ColorRGB,
}

impl Vertex {
    /// Black vertex at the given position.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        return Self {
            position: Point3::new(x, y, z),
            color: ColorRGB::BLACK,
        };
    }

    pub fn with_color(x: f32, y: f32, z: f32, color: ColorRGB) -> Self {
        return Self {
            position: Point3::new(x, y, z),
            color,
        };
    }
}

/// Vertex after transformation to raster space.
/// x, y are pixel coordinates, z is camera space depth used for depth testing and w is always 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOut {
    pub position: Vector4<f32>,
    pub color: ColorRGB,
}

/// Whether the two trailing indices of a triangle were swapped when it was read from a strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    Preserved,
    Swapped,
}

/// Vertex indices of one triangle, ready for coverage testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangleIndices {
    pub idx0: usize,
    pub idx1: usize,
    pub idx2: usize,
    pub winding: Winding,
}

/// Indexed triangle mesh. Construction validates indices against topology and vertex count,
/// so any mesh that exists can be traversed without bounds surprises.
#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    vertices_out: Vec<VertexOut>, // Filled by the transformer every frame.
    indices: Vec<u32>,
    topology: Topology,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>, topology: Topology) -> Result<Self, MeshError> {
        match topology {
            Topology::TriangleList if indices.len() % 3 != 0 => {
                return Err(MeshError::IndexCountNotMultipleOfThree(indices.len()));
            }
            Topology::TriangleStrip if indices.len() < 3 => {
                return Err(MeshError::StripTooShort(indices.len()));
            }
            _ => (),
        }
        if let Some((position, &index)) = indices
            .iter()
            .enumerate()
            .find(|&(_, &index)| index as usize >= vertices.len())
        {
            return Err(MeshError::IndexOutOfRange {
                index,
                position,
                vertex_count: vertices.len(),
            });
        }

        return Ok(Self {
            vertices_out: Vec::with_capacity(vertices.len()),
            vertices,
            indices,
            topology,
        });
    }

    /// Loads a wavefront obj file as a triangle list.
    /// Obj has no vertex colors, so normals are mapped to colors to keep faces distinguishable.
    pub fn from_obj<P: AsRef<Path>>(path: P) -> Result<Self, MeshError> {
        let model: Obj<obj::Vertex, u32> = load_obj(BufReader::new(File::open(path)?))?;
        let vertices = model
            .vertices
            .iter()
            .map(|vertex| {
                let [x, y, z] = vertex.position;
                let [nx, ny, nz] = vertex.normal;
                let color = ColorRGB::new((nx + 1.0) / 2.0, (ny + 1.0) / 2.0, (nz + 1.0) / 2.0);
                Vertex::with_color(x, y, z, color)
            })
            .collect();

        return Mesh::new(vertices, model.indices, Topology::TriangleList);
    }

    pub fn vertices(&self) -> &[Vertex] {
        return &self.vertices;
    }

    pub fn vertices_out(&self) -> &[VertexOut] {
        return &self.vertices_out;
    }

    pub fn indices(&self) -> &[u32] {
        return &self.indices;
    }

    pub fn topology(&self) -> Topology {
        return self.topology;
    }

    /// True once the transformer produced an output vertex for every input vertex.
    pub fn is_transformed(&self) -> bool {
        return self.vertices_out.len() == self.vertices.len();
    }

    /// Input vertices together with the output buffer, for the transformer to fill.
    pub(crate) fn transform_targets(&mut self) -> (&[Vertex], &mut Vec<VertexOut>) {
        return (&self.vertices, &mut self.vertices_out);
    }

    /// Iterates over triangles of the mesh according to its topology.
    pub fn triangles(&self) -> Triangles<'_> {
        return Triangles {
            indices: &self.indices,
            topology: self.topology,
            position: 0,
        };
    }

    /// Number of triangles `triangles()` yields, degenerate ones included.
    pub fn triangle_count(&self) -> usize {
        return match self.topology {
            Topology::TriangleList => self.indices.len() / 3,
            Topology::TriangleStrip => self.indices.len().saturating_sub(2),
        };
    }
}

/// Iterator over triangles of an index list.
///
/// A list is consumed in independent groups of 3. A strip yields a triangle for every index but
/// the last two, each new triangle reusing the previous two vertices. Every odd triangle of a
/// strip has its last two indices swapped, so all triangles share the winding of the first.
pub struct Triangles<'a> {
    indices: &'a [u32],
    topology: Topology,
    position: usize, // Position in the index list where the next triangle starts.
}

impl<'a> Iterator for Triangles<'a> {
    type Item = TriangleIndices;

    fn next(&mut self) -> Option<TriangleIndices> {
        let window = self.indices.get(self.position..self.position + 3)?;
        let (a, b, c) = (window[0] as usize, window[1] as usize, window[2] as usize);
        let triangle = match self.topology {
            Topology::TriangleList => {
                self.position += 3;
                TriangleIndices { idx0: a, idx1: b, idx2: c, winding: Winding::Preserved }
            }
            Topology::TriangleStrip => {
                let odd = self.position % 2 == 1;
                self.position += 1;
                if odd {
                    TriangleIndices { idx0: a, idx1: c, idx2: b, winding: Winding::Swapped }
                } else {
                    TriangleIndices { idx0: a, idx1: b, idx2: c, winding: Winding::Preserved }
                }
            }
        };

        return Some(triangle);
    }
}

/// Built-in meshes, handy when no obj file is given.
pub mod demo {
    use super::{Mesh, MeshError, Topology, Vertex};
    use crate::scene::color::ColorRGB;

    /// 3x3 grid of vertices in the z = -2 plane, spanning [-3, 3] in x and y, split into 8
    /// triangles. Corners are colored so interpolation is visible.
    pub fn quad_grid(topology: Topology) -> Result<Mesh, MeshError> {
        let vertices = vec![
            Vertex::with_color(-3.0,  3.0, -2.0, ColorRGB::RED),
            Vertex::with_color( 0.0,  3.0, -2.0, ColorRGB::new(1.0, 1.0, 0.0)),
            Vertex::with_color( 3.0,  3.0, -2.0, ColorRGB::GREEN),
            Vertex::with_color(-3.0,  0.0, -2.0, ColorRGB::new(1.0, 0.0, 1.0)),
            Vertex::with_color( 0.0,  0.0, -2.0, ColorRGB::WHITE),
            Vertex::with_color( 3.0,  0.0, -2.0, ColorRGB::new(0.0, 1.0, 1.0)),
            Vertex::with_color(-3.0, -3.0, -2.0, ColorRGB::BLUE),
            Vertex::with_color( 0.0, -3.0, -2.0, ColorRGB::new(0.5, 0.0, 1.0)),
            Vertex::with_color( 3.0, -3.0, -2.0, ColorRGB::new(0.0, 0.5, 0.5)),
        ];
        let indices = match topology {
            Topology::TriangleList => vec![
                3, 0, 1,    1, 4, 3,    4, 1, 2,
                2, 5, 4,    6, 3, 4,    4, 7, 6,
                7, 4, 5,    5, 8, 7,
            ],
            // Two rows joined through degenerate triangles on the repeated 2 and 6.
            Topology::TriangleStrip => vec![
                3, 0, 4, 1, 5, 2,
                2, 6,
                6, 3, 7, 4, 8, 5,
            ],
        };

        return Mesh::new(vertices, indices, topology);
    }
}
