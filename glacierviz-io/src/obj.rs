//! OBJ format support
//!
//! Vertex colors use the common `v x y z r g b` extension with channels in
//! `[0, 1]`; normals share the vertex indices (`f a//a b//b c//c`).

use crate::MeshWriter;
use glacierviz_core::{Result, TriangleMesh};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct ObjWriter;

impl ObjWriter {
    /// Write a mesh as OBJ text into any writer
    pub fn write_to<W: Write>(mesh: &TriangleMesh, out: &mut W) -> Result<()> {
        writeln!(out, "# glacierviz surface mesh")?;
        writeln!(out, "# vertices: {} faces: {}", mesh.vertex_count(), mesh.face_count())?;

        for (i, v) in mesh.vertices.iter().enumerate() {
            match mesh.colors.as_ref().and_then(|c| c.get(i)) {
                Some(c) => writeln!(
                    out,
                    "v {} {} {} {:.4} {:.4} {:.4}",
                    v.x,
                    v.y,
                    v.z,
                    c[0] as f32 / 255.0,
                    c[1] as f32 / 255.0,
                    c[2] as f32 / 255.0
                )?,
                None => writeln!(out, "v {} {} {}", v.x, v.y, v.z)?,
            }
        }

        let has_normals = mesh.normals.as_ref().is_some_and(|n| n.len() == mesh.vertices.len());
        if let Some(normals) = mesh.normals.as_ref().filter(|_| has_normals) {
            for n in normals {
                writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
            }
        }

        // OBJ indices are 1-based
        for face in &mesh.faces {
            let [a, b, c] = face.map(|i| i + 1);
            if has_normals {
                writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?;
            } else {
                writeln!(out, "f {a} {b} {c}")?;
            }
        }
        Ok(())
    }
}

impl MeshWriter for ObjWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        Self::write_to(mesh, &mut writer)?;
        writer.flush()?;
        tracing::debug!("Wrote OBJ mesh to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glacierviz_core::{Point3f, Vector3f};

    #[test]
    fn test_obj_text_layout() {
        let mut mesh = TriangleMesh::from_vertices_and_faces(
            vec![Point3f::new(0.0, 0.0, 0.0), Point3f::new(1.0, 0.0, 0.0), Point3f::new(0.5, 1.0, 2.0)],
            vec![[0, 1, 2]],
        );
        mesh.set_colors(vec![[255, 0, 0], [0, 255, 0], [0, 0, 255]]);

        let mut buffer = Vec::new();
        ObjWriter::write_to(&mesh, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("v 1 0 0 0.0000 1.0000 0.0000"));
        assert!(text.contains("v 0.5 1 2 0.0000 0.0000 1.0000"));
        assert!(text.lines().any(|l| l == "f 1 2 3"));
        assert!(!text.contains("vn "));
    }

    #[test]
    fn test_obj_with_normals() {
        let mut mesh = TriangleMesh::from_vertices_and_faces(
            vec![Point3f::new(0.0, 0.0, 0.0), Point3f::new(1.0, 0.0, 0.0), Point3f::new(0.0, 1.0, 0.0)],
            vec![[0, 1, 2]],
        );
        mesh.set_normals(vec![Vector3f::z(); 3]);

        let mut buffer = Vec::new();
        ObjWriter::write_to(&mesh, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert_eq!(text.lines().filter(|l| l.starts_with("vn ")).count(), 3);
        assert!(text.lines().any(|l| l == "f 1//1 2//2 3//3"));
    }
}
