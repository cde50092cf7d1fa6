//! I/O operations for glacier series, meshes and rendered frames
//!
//! This crate reads glacier data (series JSON, ESRI ASCII grids) and writes
//! scene output: PLY and OBJ meshes, still images and animated GIFs.

pub mod ply;
pub mod obj;
pub mod series;
pub mod ascii_grid;
pub mod frames;
pub mod error;

pub use error::*;
pub use series::{read_series, write_series};
pub use ascii_grid::{AsciiGrid, read_ascii_grid};
pub use frames::{write_frame, write_gif};

use glacierviz_core::{Result, TriangleMesh};

/// Trait for reading meshes from files
pub trait MeshReader {
    fn read_mesh<P: AsRef<std::path::Path>>(path: P) -> Result<TriangleMesh>;
}

/// Trait for writing meshes to files
pub trait MeshWriter {
    fn write_mesh<P: AsRef<std::path::Path>>(mesh: &TriangleMesh, path: P) -> Result<()>;
}

/// Auto-detect format and write a mesh
pub fn write_mesh<P: AsRef<std::path::Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("ply") => ply::PlyWriter::write_mesh(mesh, path),
        Some("obj") => obj::ObjWriter::write_mesh(mesh, path),
        _ => Err(glacierviz_core::Error::UnsupportedFormat(
            format!("Unsupported mesh format: {:?}", path.extension())
        )),
    }
}

/// Auto-detect format and read a mesh
pub fn read_mesh<P: AsRef<std::path::Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("ply") => ply::PlyReader::read_mesh(path),
        _ => Err(glacierviz_core::Error::UnsupportedFormat(
            format!("Unsupported mesh format: {:?}", path.extension())
        )),
    }
}

pub(crate) fn extension(path: &std::path::Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glacierviz_core::Point3f;

    fn triangle() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![Point3f::new(0.0, 0.0, 0.0), Point3f::new(1.0, 0.0, 0.0), Point3f::new(0.5, 1.0, 0.0)],
            vec![[0, 1, 2]],
        )
    }

    #[test]
    fn test_auto_detect_write_and_read() {
        let path = std::env::temp_dir().join("glacierviz_auto_detect.PLY");
        write_mesh(&triangle(), &path).unwrap();
        let loaded = read_mesh(&path).unwrap();
        assert_eq!(loaded.vertex_count(), 3);
        assert_eq!(loaded.face_count(), 1);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_unsupported_format() {
        let result = write_mesh(&triangle(), "mesh.stl");
        assert!(matches!(result, Err(glacierviz_core::Error::UnsupportedFormat(_))));

        let result = read_mesh("mesh.obj");
        assert!(result.is_err());
    }
}
