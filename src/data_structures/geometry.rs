//! Decoded model geometry: attribute arrays, primitives and meshes.
//!
//! Geometry is stored the way the archive describes it: every attribute lives
//! in its own array and each vertex of a primitive is a [`VertexDescriptor`]
//! holding one index per attribute. The index builder turns this into
//! GPU-friendly buffers, the OBJ exporter walks it as-is.

/// Number of color channels a vertex can carry.
pub const COLOR_CHANNELS: usize = 2;
/// Number of texture coordinate channels a vertex can carry.
pub const TEX_COORD_CHANNELS: usize = 7;

/// Primitive topology as encoded in the display lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topology {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
    /// Anything else. Skipped when indexing, exported as degenerate points.
    Other(u8),
}

impl Topology {
    /// Decodes a GX draw opcode. The low three bits select the vertex format
    /// and are ignored.
    pub fn from_opcode(opcode: u8) -> Self {
        match opcode & 0xF8 {
            0x80 => Topology::Quads,
            0x90 => Topology::Triangles,
            0x98 => Topology::TriangleStrip,
            0xA0 => Topology::TriangleFan,
            0xA8 => Topology::Lines,
            0xB0 => Topology::LineStrip,
            0xB8 => Topology::Points,
            _ => Topology::Other(opcode),
        }
    }

    /// Vertices per face. `None` for topologies the renderer can't draw.
    pub fn arity(self) -> Option<usize> {
        match self {
            Topology::Points => Some(1),
            Topology::Lines | Topology::LineStrip => Some(2),
            Topology::Triangles | Topology::TriangleStrip | Topology::TriangleFan => Some(3),
            Topology::Quads => Some(4),
            Topology::Other(_) => None,
        }
    }
}

/// Per-attribute indices of one logical vertex.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VertexDescriptor {
    pub position: u16,
    pub normal: u16,
    pub color: [u16; COLOR_CHANNELS],
    pub tex_coord: [u16; TEX_COORD_CHANNELS],
}

impl VertexDescriptor {
    /// A descriptor whose every attribute points at the same slot.
    pub fn uniform(index: u16) -> Self {
        Self {
            position: index,
            normal: index,
            color: [index; COLOR_CHANNELS],
            tex_coord: [index; TEX_COORD_CHANNELS],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Primitive {
    pub topology: Topology,
    pub vertices: Vec<VertexDescriptor>,
}

/// A group of primitives drawn with one material.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub material: u32,
    pub pivot: [f32; 3],
    pub primitives: Vec<Primitive>,
}

/// The independently indexed attribute arrays of a model.
///
/// Colors are packed RGBA8 (`0xRRGGBBAA`). `lightmap_coords` is the separate
/// array lightmapped materials read texture channel 0 from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexAttributes {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub colors: Vec<u32>,
    pub tex_coords: Vec<[f32; 2]>,
    pub lightmap_coords: Vec<[f32; 2]>,
}

/// Axis aligned bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl BoundingBox {
    pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    pub fn corners(&self) -> [[f32; 3]; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            [lo[0], lo[1], lo[2]],
            [hi[0], lo[1], lo[2]],
            [hi[0], hi[1], lo[2]],
            [lo[0], hi[1], lo[2]],
            [lo[0], lo[1], hi[2]],
            [hi[0], lo[1], hi[2]],
            [hi[0], hi[1], hi[2]],
            [lo[0], hi[1], hi[2]],
        ]
    }

    /// The 12 edges as a line list (24 points).
    pub fn edges(&self) -> [[f32; 3]; 24] {
        const EDGES: [(usize, usize); 12] = [
            (0, 1), (1, 2), (2, 3), (3, 0),
            (4, 5), (5, 6), (6, 7), (7, 4),
            (0, 4), (1, 5), (2, 6), (3, 7),
        ];
        let corners = self.corners();
        let mut lines = [[0.0; 3]; 24];
        for (i, (a, b)) in EDGES.iter().enumerate() {
            lines[i * 2] = corners[*a];
            lines[i * 2 + 1] = corners[*b];
        }
        lines
    }
}
