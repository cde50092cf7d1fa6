//! PLY format support
//!
//! Meshes are written with positions, optional normals (`nx ny nz`),
//! optional vertex colors (`red green blue`) and an optional per-vertex
//! `scalar` property carrying the mesh's scalar field.

use crate::{MeshReader, MeshWriter};
use glacierviz_core::{Result, TriangleMesh, Point3f, Vector3f};
use std::path::Path;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use ply_rs::{
    parser::Parser,
    writer::Writer,
    ply::{Property, PropertyDef, PropertyType, ScalarType, ElementDef, Ply, Addable, DefaultElement},
};

/// Name of the PLY vertex property holding the scalar field
pub const SCALAR_PROPERTY: &str = "scalar";

pub struct PlyReader;
pub struct PlyWriter;

impl MeshReader for PlyReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let parser = Parser::<DefaultElement>::new();
        let ply = parser.read_ply(&mut reader)?;

        let empty = Vec::new();
        let vertex_elements = ply.payload.get("vertex").unwrap_or(&empty);

        let mut vertices = Vec::with_capacity(vertex_elements.len());
        for vertex in vertex_elements {
            let x = extract_property_value(vertex, "x")?;
            let y = extract_property_value(vertex, "y")?;
            let z = extract_property_value(vertex, "z")?;
            vertices.push(Point3f::new(x, y, z));
        }

        let mut faces = Vec::new();
        if let Some(face_element) = ply.payload.get("face") {
            for face in face_element {
                let indices = extract_face_indices(face, vertices.len())?;
                if indices.len() >= 3 {
                    faces.push([indices[0], indices[1], indices[2]]);
                }
            }
        }

        // Optional attributes are only kept when every vertex carries them
        let normals: Option<Vec<Vector3f>> = vertex_elements
            .iter()
            .map(|v| {
                Some(Vector3f::new(
                    extract_property_value(v, "nx").ok()?,
                    extract_property_value(v, "ny").ok()?,
                    extract_property_value(v, "nz").ok()?,
                ))
            })
            .collect();

        let colors: Option<Vec<[u8; 3]>> = vertex_elements
            .iter()
            .map(|v| {
                Some([
                    extract_color_channel(v, "red")?,
                    extract_color_channel(v, "green")?,
                    extract_color_channel(v, "blue")?,
                ])
            })
            .collect();

        let scalars: Option<Vec<f32>> = vertex_elements
            .iter()
            .map(|v| extract_property_value(v, SCALAR_PROPERTY).ok())
            .collect();

        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
        if !mesh.vertices.is_empty() {
            if let Some(normals) = normals {
                mesh.set_normals(normals);
            }
            if let Some(colors) = colors {
                mesh.set_colors(colors);
            }
            if let Some(scalars) = scalars {
                mesh.set_scalars(scalars);
            }
        }

        Ok(mesh)
    }
}

impl MeshWriter for PlyWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let mut ply = Ply::<DefaultElement>::new();
        ply.header.comments.push("glacierviz surface mesh".to_string());

        // Define vertex element
        let mut vertex_element = ElementDef::new("vertex".to_string());
        vertex_element.count = mesh.vertices.len();
        for name in ["x", "y", "z"] {
            vertex_element.properties.add(float_property(name));
        }
        if mesh.normals.is_some() {
            for name in ["nx", "ny", "nz"] {
                vertex_element.properties.add(float_property(name));
            }
        }
        if mesh.colors.is_some() {
            for name in ["red", "green", "blue"] {
                vertex_element.properties.add(PropertyDef::new(
                    name.to_string(),
                    PropertyType::Scalar(ScalarType::UChar),
                ));
            }
        }
        if mesh.scalars.is_some() {
            vertex_element.properties.add(float_property(SCALAR_PROPERTY));
        }
        ply.header.elements.add(vertex_element);

        // Define face element
        let mut face_element = ElementDef::new("face".to_string());
        face_element.count = mesh.faces.len();
        face_element.properties.add(PropertyDef::new(
            "vertex_indices".to_string(),
            PropertyType::List(ScalarType::UChar, ScalarType::Int),
        ));
        ply.header.elements.add(face_element);

        // Add vertex data
        let mut vertices = Vec::with_capacity(mesh.vertices.len());
        for (i, vertex) in mesh.vertices.iter().enumerate() {
            let mut element = DefaultElement::new();
            element.insert("x".to_string(), Property::Float(vertex.x));
            element.insert("y".to_string(), Property::Float(vertex.y));
            element.insert("z".to_string(), Property::Float(vertex.z));

            if let Some(normal) = mesh.normals.as_ref().and_then(|n| n.get(i)) {
                element.insert("nx".to_string(), Property::Float(normal.x));
                element.insert("ny".to_string(), Property::Float(normal.y));
                element.insert("nz".to_string(), Property::Float(normal.z));
            }
            if let Some(color) = mesh.colors.as_ref().and_then(|c| c.get(i)) {
                element.insert("red".to_string(), Property::UChar(color[0]));
                element.insert("green".to_string(), Property::UChar(color[1]));
                element.insert("blue".to_string(), Property::UChar(color[2]));
            }
            if let Some(&value) = mesh.scalars.as_ref().and_then(|s| s.get(i)) {
                element.insert(SCALAR_PROPERTY.to_string(), Property::Float(value));
            }

            vertices.push(element);
        }
        ply.payload.insert("vertex".to_string(), vertices);

        // Add face data
        let mut faces = Vec::with_capacity(mesh.faces.len());
        for face in &mesh.faces {
            let mut element = DefaultElement::new();
            let indices = face.iter().map(|&i| i as i32).collect();
            element.insert("vertex_indices".to_string(), Property::ListInt(indices));
            faces.push(element);
        }
        ply.payload.insert("face".to_string(), faces);

        let writer_instance = Writer::new();
        writer_instance.write_ply(&mut writer, &mut ply)?;

        tracing::debug!(
            "Wrote PLY mesh with {} vertices and {} faces to {}",
            mesh.vertex_count(),
            mesh.face_count(),
            path.display()
        );
        Ok(())
    }
}

fn float_property(name: &str) -> PropertyDef {
    PropertyDef::new(name.to_string(), PropertyType::Scalar(ScalarType::Float))
}

/// Extract a property value as f32 from a PLY element
fn extract_property_value(element: &DefaultElement, name: &str) -> Result<f32> {
    match element.get(name) {
        Some(Property::Float(val)) => Ok(*val),
        Some(Property::Double(val)) => Ok(*val as f32),
        Some(Property::Int(val)) => Ok(*val as f32),
        Some(Property::UInt(val)) => Ok(*val as f32),
        Some(Property::UChar(val)) => Ok(*val as f32),
        _ => Err(glacierviz_core::Error::InvalidData(
            format!("Property '{}' not found or invalid type", name)
        )),
    }
}

fn extract_color_channel(element: &DefaultElement, name: &str) -> Option<u8> {
    match element.get(name) {
        Some(Property::UChar(val)) => Some(*val),
        Some(Property::Float(val)) => Some((val.clamp(0.0, 1.0) * 255.0).round() as u8),
        _ => None,
    }
}

/// Extract face indices from a PLY face element, checked against the vertex count
fn extract_face_indices(element: &DefaultElement, vertex_count: usize) -> Result<Vec<usize>> {
    let raw: Vec<i64> = match element.get("vertex_indices").or_else(|| element.get("vertex_index")) {
        Some(Property::ListInt(indices)) => indices.iter().map(|&idx| idx as i64).collect(),
        Some(Property::ListUInt(indices)) => indices.iter().map(|&idx| idx as i64).collect(),
        _ => {
            return Err(glacierviz_core::Error::InvalidData(
                "Face indices not found".to_string()
            ))
        }
    };

    raw.into_iter()
        .map(|idx| {
            usize::try_from(idx)
                .ok()
                .filter(|&i| i < vertex_count)
                .ok_or_else(|| glacierviz_core::Error::InvalidData(format!(
                    "Face index {} out of range for {} vertices",
                    idx, vertex_count
                )))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glacierviz_core::{grid_surface, GridGeometry};
    use ndarray::array;
    use std::fs;

    #[test]
    fn test_surface_mesh_keeps_colors_and_scalars() {
        let temp_file = std::env::temp_dir().join("glacierviz_surface_attrs.ply");

        let mut mesh = grid_surface(&GridGeometry::unit(), &array![[0.0, 1.0], [2.0, 3.0]], 1.0);
        mesh.set_colors(vec![[10, 20, 30], [40, 50, 60], [70, 80, 90], [100, 110, 120]]);
        mesh.set_scalars(vec![0.0, 12.5, 30.0, 0.5]);

        PlyWriter::write_mesh(&mesh, &temp_file).unwrap();
        let loaded = PlyReader::read_mesh(&temp_file).unwrap();

        assert_eq!(loaded.vertex_count(), 4);
        assert_eq!(loaded.faces, mesh.faces);
        assert!(loaded.normals.is_some());
        assert_eq!(loaded.colors.as_ref().unwrap()[2], [70, 80, 90]);
        assert_eq!(loaded.scalars.as_deref(), Some(&[0.0, 12.5, 30.0, 0.5][..]));

        let _ = fs::remove_file(temp_file);
    }

    #[test]
    fn test_plain_mesh_has_no_optional_attributes() {
        let temp_file = std::env::temp_dir().join("glacierviz_plain.ply");
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![Point3f::new(0.0, 0.0, 0.0), Point3f::new(1.0, 0.0, 0.0), Point3f::new(0.0, 1.0, 0.0)],
            vec![[0, 1, 2]],
        );

        PlyWriter::write_mesh(&mesh, &temp_file).unwrap();
        let loaded = PlyReader::read_mesh(&temp_file).unwrap();

        assert!(loaded.normals.is_none());
        assert!(loaded.colors.is_none());
        assert!(loaded.scalars.is_none());

        let _ = fs::remove_file(temp_file);
    }

    #[test]
    fn test_ascii_face_list_parsing() {
        let temp_file = std::env::temp_dir().join("glacierviz_ascii_faces.ply");
        let ply_content = "ply\nformat ascii 1.0\nelement vertex 4\nproperty float x\nproperty float y\nproperty float z\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n4 0 1 2 3\n";
        fs::write(&temp_file, ply_content).unwrap();

        let mesh = PlyReader::read_mesh(&temp_file).unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);

        let _ = fs::remove_file(temp_file);
    }

    #[test]
    fn test_invalid_face_indices_are_rejected() {
        let header = "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nproperty float y\nproperty float z\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n0 0 0\n1 0 0\n0 1 0\n";

        for (name, face) in [("negative", "3 0 -1 2\n"), ("past_end", "3 0 1 3\n")] {
            let temp_file = std::env::temp_dir().join(format!("glacierviz_bad_face_{}.ply", name));
            fs::write(&temp_file, format!("{}{}", header, face)).unwrap();

            let result = PlyReader::read_mesh(&temp_file);
            assert!(
                matches!(result, Err(glacierviz_core::Error::InvalidData(ref m)) if m.contains("out of range")),
                "{}: {:?}",
                name,
                result
            );

            let _ = fs::remove_file(temp_file);
        }
    }
}
