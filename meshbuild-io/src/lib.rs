//! I/O operations for oriented point clouds and meshes
//!
//! Point clouds are read from PLY or plain-text XYZ files, with one normal per
//! point. Meshes are written as ASCII PLY.

pub mod ply;
pub mod xyz;

use meshbuild_core::{Error, NormalPoint3f, PointCloud, Result, TriangleMesh};
use std::path::Path;
use tracing::info;

/// Trait for reading oriented point clouds from files
pub trait OrientedCloudReader {
    fn read_oriented_cloud<P: AsRef<Path>>(path: P) -> Result<PointCloud<NormalPoint3f>>;
}

/// Trait for writing meshes to files
pub trait MeshWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()>;
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}

/// Auto-detect format and read an oriented point cloud
pub fn read_oriented_cloud<P: AsRef<Path>>(path: P) -> Result<PointCloud<NormalPoint3f>> {
    let path = path.as_ref();
    let cloud = match extension(path).as_deref() {
        Some("ply") => ply::PlyReader::read_oriented_cloud(path)?,
        Some("xyz") | Some("xyzn") | Some("txt") => xyz::XyzReader::read_oriented_cloud(path)?,
        _ => {
            return Err(Error::UnsupportedFormat(format!(
                "Unsupported point cloud format: {:?}",
                path.extension()
            )))
        }
    };

    info!(points = cloud.len(), path = %path.display(), "Loaded oriented point cloud");
    Ok(cloud)
}

/// Auto-detect format and write a mesh
pub fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("ply") => ply::PlyWriter::write_mesh(mesh, path)?,
        _ => {
            return Err(Error::UnsupportedFormat(format!(
                "Unsupported mesh format: {:?}",
                path.extension()
            )))
        }
    }

    info!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        path = %path.display(),
        "Wrote mesh"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshbuild_core::{Point3f, Vector3f};
    use std::fs;

    #[test]
    fn test_dispatch_by_extension() {
        let temp_file = "test_dispatch.XYZ";
        fs::write(temp_file, "0 0 0 0 0 1\n1 0 0 0 0 1\n").unwrap();

        let cloud = read_oriented_cloud(temp_file).unwrap();
        assert_eq!(cloud.len(), 2);

        let _ = fs::remove_file(temp_file);
    }

    #[test]
    fn test_unsupported_formats() {
        assert!(matches!(
            read_oriented_cloud("cloud.las"),
            Err(Error::UnsupportedFormat(_))
        ));

        let mesh = TriangleMesh::from_vertices_and_faces(vec![Point3f::origin()], vec![]);
        assert!(matches!(write_mesh(&mesh, "mesh.stl"), Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_written_mesh_is_readable_as_cloud() {
        let temp_file = "test_written_mesh.ply";

        let vertices = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ];
        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, vec![[0, 1, 2]]);
        mesh.set_normals(vec![Vector3f::z(); 3]);

        write_mesh(&mesh, temp_file).unwrap();
        let cloud = read_oriented_cloud(temp_file).unwrap();

        assert_eq!(cloud.len(), 3);
        assert_eq!(cloud[1].position, Point3f::new(1.0, 0.0, 0.0));
        assert_eq!(cloud[2].normal, Vector3f::z());

        let _ = fs::remove_file(temp_file);
    }
}
