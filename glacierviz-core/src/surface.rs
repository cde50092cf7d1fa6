//! Grid to surface mesh conversion
//!
//! Every grid node becomes one vertex (row-major order) and every grid cell
//! two triangles, so a `rows x cols` grid produces `rows * cols` vertices and
//! `2 * (rows - 1) * (cols - 1)` faces. Vertex z is the elevation scaled by a
//! vertical exaggeration factor.

use crate::error::{Error, Result};
use crate::grid::GridGeometry;
use crate::mesh::TriangleMesh;
use crate::point::Point3f;
use ndarray::Array2;

/// Build a surface mesh from an elevation grid
pub fn grid_surface(geometry: &GridGeometry, elevation: &Array2<f32>, z_scale: f32) -> TriangleMesh {
    let (rows, cols) = elevation.dim();

    let nodata = elevation.iter().filter(|z| !z.is_finite()).count();
    if nodata > 0 {
        tracing::warn!("{} of {} elevation nodes are not finite, using 0", nodata, elevation.len());
    }

    let vertices = elevation
        .indexed_iter()
        .map(|((row, col), &z)| {
            Point3f::new(
                geometry.x(col) as f32,
                geometry.y(row) as f32,
                finite_or_zero(z) * z_scale,
            )
        })
        .collect();

    let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, grid_faces(rows, cols));
    mesh.compute_vertex_normals();
    mesh
}

/// Rewrite the heights of a mesh produced by [`grid_surface`].
///
/// X/Y positions and connectivity are left alone; normals are recomputed.
pub fn update_surface_heights(
    mesh: &mut TriangleMesh,
    elevation: &Array2<f32>,
    z_scale: f32,
) -> Result<()> {
    if mesh.vertex_count() != elevation.len() {
        return Err(Error::InvalidData(format!(
            "Surface has {} vertices but the elevation grid has {} nodes",
            mesh.vertex_count(),
            elevation.len()
        )));
    }

    for (vertex, &z) in mesh.vertices.iter_mut().zip(elevation.iter()) {
        vertex.z = finite_or_zero(z) * z_scale;
    }
    mesh.compute_vertex_normals();
    Ok(())
}

/// Row-major flattening of a grid, the vertex order of [`grid_surface`]
pub fn grid_scalars(grid: &Array2<f32>) -> Vec<f32> {
    grid.iter().copied().collect()
}

/// Triangle connectivity of a `rows x cols` node grid
pub fn grid_faces(rows: usize, cols: usize) -> Vec<[usize; 3]> {
    if rows < 2 || cols < 2 {
        return Vec::new();
    }

    let mut faces = Vec::with_capacity(2 * (rows - 1) * (cols - 1));
    for row in 0..rows - 1 {
        for col in 0..cols - 1 {
            let i00 = row * cols + col;
            let i01 = i00 + 1;
            let i10 = i00 + cols;
            let i11 = i10 + 1;
            faces.push([i00, i01, i11]);
            faces.push([i00, i11, i10]);
        }
    }
    faces
}

// Nodata cells (NaN) are flattened to sea level rather than poisoning normals
fn finite_or_zero(z: f32) -> f32 {
    if z.is_finite() {
        z
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_grid_surface_topology() {
        let elevation = Array2::from_shape_fn((3, 4), |(r, c)| (r * 10 + c) as f32);
        let mesh = grid_surface(&GridGeometry::new((0.0, 0.0), (2.0, -3.0), ""), &elevation, 1.0);

        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.face_count(), 2 * 2 * 3);

        // Row-major vertex order
        assert_eq!(mesh.vertices[5], Point3f::new(2.0, -3.0, 11.0));
        assert!(mesh.faces.iter().flatten().all(|&i| i < 12));
        assert!(mesh.normals.is_some());
    }

    #[test]
    fn test_single_row_grid_has_no_faces() {
        let mesh = grid_surface(&GridGeometry::unit(), &array![[1.0, 2.0, 3.0]], 1.0);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.face_count(), 0);
    }

    #[test]
    fn test_vertical_exaggeration_and_nodata() {
        let mesh = grid_surface(&GridGeometry::unit(), &array![[10.0, f32::NAN], [0.0, 1.0]], 2.5);
        assert_relative_eq!(mesh.vertices[0].z, 25.0);
        assert_eq!(mesh.vertices[1].z, 0.0);
    }

    #[test]
    fn test_update_surface_heights() {
        let geometry = GridGeometry::unit();
        let mut mesh = grid_surface(&geometry, &Array2::zeros((2, 2)), 1.0);
        update_surface_heights(&mut mesh, &array![[1.0, 2.0], [3.0, 4.0]], 1.0).unwrap();
        let heights: Vec<f32> = mesh.vertices.iter().map(|v| v.z).collect();
        assert_eq!(heights, vec![1.0, 2.0, 3.0, 4.0]);

        let result = update_surface_heights(&mut mesh, &Array2::zeros((3, 3)), 1.0);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }
}
