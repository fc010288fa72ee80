//! Wavefront OBJ export.
//!
//! Export walks the decoded meshes and primitives directly, independent of
//! indexing, so a model can be exported before it was ever drawn. Records
//! use 1-based indices offset by an [`ObjOffsets`] that is advanced after each
//! model, which lets several models share one file.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use cgmath::{Matrix3, Vector3};

use crate::data_structures::{
    geometry::{Mesh, Topology, VertexAttributes, VertexDescriptor},
    model::Model,
};

/// Running 1-based offsets into the arrays already written to an OBJ file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjOffsets {
    pub position: usize,
    pub tex_coord: usize,
    pub normal: usize,
    /// Meshes written so far, used to name `o` records.
    pub objects: usize,
}

impl Default for ObjOffsets {
    fn default() -> Self {
        Self {
            position: 1,
            tex_coord: 1,
            normal: 1,
            objects: 0,
        }
    }
}

/// Rotation applied to exported positions: 90 degrees about -X, turning the
/// archive's Z-up space into Y-up.
fn export_rotation() -> Matrix3<f32> {
    Matrix3::new(1.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 1.0, 0.0)
}

pub fn rotate_position(position: [f32; 3]) -> [f32; 3] {
    (export_rotation() * Vector3::from(position)).into()
}

struct RecordWriter<'a, W> {
    out: &'a mut W,
    offsets: ObjOffsets,
}

impl<W: Write> RecordWriter<'_, W> {
    fn position(&self, desc: &VertexDescriptor) -> usize {
        self.offsets.position + desc.position as usize
    }

    fn corner(&self, desc: &VertexDescriptor) -> String {
        format!(
            "{}/{}/{}",
            self.position(desc),
            self.offsets.tex_coord + desc.tex_coord[0] as usize,
            self.offsets.normal + desc.normal as usize
        )
    }

    fn face(
        &mut self,
        a: &VertexDescriptor,
        b: &VertexDescriptor,
        c: &VertexDescriptor,
    ) -> io::Result<()> {
        writeln!(self.out, "f {} {} {}", self.corner(a), self.corner(b), self.corner(c))
    }

    fn line(&mut self, a: &VertexDescriptor, b: &VertexDescriptor) -> io::Result<()> {
        let corner = |desc: &VertexDescriptor| {
            format!(
                "{}/{}",
                self.position(desc),
                self.offsets.tex_coord + desc.tex_coord[0] as usize
            )
        };
        let (a, b) = (corner(a), corner(b));
        writeln!(self.out, "l {a} {b}")
    }

    fn point(&mut self, desc: &VertexDescriptor) -> io::Result<()> {
        let p = self.position(desc);
        writeln!(self.out, "f {p} {p} {p}")
    }

    fn primitive(&mut self, topology: Topology, vertices: &[VertexDescriptor]) -> io::Result<()> {
        match topology {
            Topology::Lines => {
                for pair in vertices.chunks_exact(2) {
                    self.line(&pair[0], &pair[1])?;
                }
            }
            Topology::LineStrip => {
                for pair in vertices.windows(2) {
                    self.line(&pair[0], &pair[1])?;
                }
            }
            Topology::Triangles => {
                for tri in vertices.chunks_exact(3) {
                    self.face(&tri[0], &tri[1], &tri[2])?;
                }
            }
            Topology::TriangleStrip => {
                for i in 2..vertices.len() {
                    // odd triangles swap their trailing corners to keep the winding
                    let odd = i & 1;
                    self.face(&vertices[i - 2], &vertices[i - (1 - odd)], &vertices[i - odd])?;
                }
            }
            Topology::TriangleFan => {
                if let Some((pivot, rest)) = vertices.split_first() {
                    for pair in rest.windows(2) {
                        self.face(pivot, &pair[0], &pair[1])?;
                    }
                }
            }
            Topology::Quads => {
                for quad in vertices.chunks_exact(4) {
                    self.face(&quad[0], &quad[1], &quad[2])?;
                    self.face(&quad[0], &quad[2], &quad[3])?;
                }
            }
            Topology::Points | Topology::Other(_) => {
                for desc in vertices {
                    self.point(desc)?;
                }
            }
        }
        Ok(())
    }
}

/// Writes one model's arrays and records, then advances `offsets` past them.
pub fn write_model<W: Write>(
    out: &mut W,
    attributes: &VertexAttributes,
    meshes: &[Mesh],
    offsets: &mut ObjOffsets,
) -> io::Result<()> {
    writeln!(out, "# vertex positions")?;
    for &position in &attributes.positions {
        let [x, y, z] = rotate_position(position);
        writeln!(out, "v {x} {y} {z}")?;
    }
    writeln!(out, "# texture coordinates")?;
    for [u, v] in &attributes.tex_coords {
        writeln!(out, "vt {u} {v}")?;
    }
    writeln!(out, "# vertex normals")?;
    for [x, y, z] in &attributes.normals {
        writeln!(out, "vn {x} {y} {z}")?;
    }

    let mut records = RecordWriter {
        out,
        offsets: *offsets,
    };
    for mesh in meshes {
        writeln!(records.out, "o mesh_{}", offsets.objects)?;
        offsets.objects += 1;
        for primitive in &mesh.primitives {
            records.primitive(primitive.topology, &primitive.vertices)?;
        }
    }

    offsets.position += attributes.positions.len();
    offsets.tex_coord += attributes.tex_coords.len();
    offsets.normal += attributes.normals.len();
    Ok(())
}

/// Exports `models` into a single OBJ file at `path`.
pub fn export_models_to_obj(path: &Path, models: &[&Model]) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    let mut offsets = ObjOffsets::default();
    for model in models {
        model.data().export(&mut out, &mut offsets)?;
    }
    out.flush()?;
    log::info!("exported {} model(s) to {}", models.len(), path.display());
    Ok(())
}
