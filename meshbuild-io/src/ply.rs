//! PLY format support
//!
//! Oriented clouds take their normals from `nx`/`ny`/`nz` when every vertex
//! has them. Otherwise the normals are derived from the file's faces: each
//! vertex gets the sum of the unnormalised normals of its incident faces, so
//! larger faces weigh more.

use crate::{MeshWriter, OrientedCloudReader};
use meshbuild_core::{Error, NormalPoint3f, Point3f, PointCloud, Result, TriangleMesh, Vector3f};
use ply_rs::{
    parser::Parser,
    ply::{Addable, DefaultElement, ElementDef, Ply, Property, PropertyDef, PropertyType, ScalarType},
    writer::Writer,
};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{debug, warn};

/// Added to the length of a summed face normal before dividing by it.
const NORMAL_EPSILON: f32 = 1e-5;

pub struct PlyReader;
pub struct PlyWriter;

impl OrientedCloudReader for PlyReader {
    fn read_oriented_cloud<P: AsRef<Path>>(path: P) -> Result<PointCloud<NormalPoint3f>> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let parser = Parser::<DefaultElement>::new();
        let ply = parser.read_ply(&mut reader)?;
        oriented_cloud_from_ply(&ply)
    }
}

/// Build an oriented cloud from a parsed PLY document
pub fn oriented_cloud_from_ply(ply: &Ply<DefaultElement>) -> Result<PointCloud<NormalPoint3f>> {
    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| Error::InvalidData("PLY file has no vertex element".to_string()))?;

    let positions = vertex_element
        .iter()
        .map(|vertex| {
            Ok(Point3f::new(
                extract_property_value(vertex, "x")?,
                extract_property_value(vertex, "y")?,
                extract_property_value(vertex, "z")?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let normals = match read_vertex_normals(vertex_element) {
        Some(normals) => normals,
        None => {
            let face_element = ply.payload.get("face").ok_or_else(|| {
                Error::InvalidData("PLY file has neither vertex normals nor faces".to_string())
            })?;
            let faces = face_element
                .iter()
                .map(extract_face_indices)
                .collect::<Result<Vec<_>>>()?;

            debug!(faces = faces.len(), "Deriving vertex normals from faces");
            let normals = derive_vertex_normals(&positions, &faces)?;
            let incompatible = count_incompatible_faces(&positions, &faces, &normals);
            if incompatible > 0 {
                warn!(incompatible, "Faces disagree with the derived vertex normals");
            }
            normals
        }
    };

    Ok(positions
        .into_iter()
        .zip(normals)
        .map(|(position, normal)| NormalPoint3f::new(position, normal))
        .collect())
}

/// Normals stored on the vertices, if every vertex has all three components
fn read_vertex_normals(vertex_element: &[DefaultElement]) -> Option<Vec<Vector3f>> {
    vertex_element
        .iter()
        .map(|vertex| {
            Some(Vector3f::new(
                extract_property_value(vertex, "nx").ok()?,
                extract_property_value(vertex, "ny").ok()?,
                extract_property_value(vertex, "nz").ok()?,
            ))
        })
        .collect()
}

/// Unnormalised normal of the face `(a, b, c)`
fn face_normal(positions: &[Point3f], face: [usize; 3]) -> Vector3f {
    let [a, b, c] = face.map(|i| positions[i]);
    (b - a).cross(&(c - b))
}

/// First three corners of every face, checked against the vertex count
fn triangles(faces: &[Vec<usize>], vertex_count: usize) -> Result<Vec<[usize; 3]>> {
    faces
        .iter()
        .filter(|face| face.len() >= 3)
        .map(|face| {
            let triangle = [face[0], face[1], face[2]];
            if let Some(&bad) = triangle.iter().find(|&&i| i >= vertex_count) {
                return Err(Error::InvalidData(format!(
                    "Face refers to vertex {} but only {} vertices exist",
                    bad, vertex_count
                )));
            }
            Ok(triangle)
        })
        .collect()
}

/// Area-weighted vertex normals from the faces around each vertex
///
/// Vertices on no face get a zero normal.
pub fn derive_vertex_normals(positions: &[Point3f], faces: &[Vec<usize>]) -> Result<Vec<Vector3f>> {
    let mut sums = vec![Vector3f::zeros(); positions.len()];
    for triangle in triangles(faces, positions.len())? {
        let normal = face_normal(positions, triangle);
        for i in triangle {
            sums[i] += normal;
        }
    }

    Ok(sums
        .into_iter()
        .map(|sum| sum / (sum.norm() + NORMAL_EPSILON))
        .collect())
}

/// Faces whose own normal points against one of their vertices' normals
pub fn count_incompatible_faces(positions: &[Point3f], faces: &[Vec<usize>], normals: &[Vector3f]) -> usize {
    let Ok(checked) = triangles(faces, positions.len().min(normals.len())) else {
        return 0;
    };
    checked
        .into_iter()
        .filter(|&triangle| {
            let normal = face_normal(positions, triangle);
            triangle.iter().any(|&i| normal.dot(&normals[i]) < -NORMAL_EPSILON)
        })
        .count()
}

fn float_property(name: &str) -> PropertyDef {
    PropertyDef::new(name.to_string(), PropertyType::Scalar(ScalarType::Float))
}

impl MeshWriter for PlyWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let mut ply = Ply::<DefaultElement>::new();
        let normals = mesh
            .normals
            .as_ref()
            .filter(|normals| normals.len() == mesh.vertices.len());

        let mut vertex_element = ElementDef::new("vertex".to_string());
        vertex_element.count = mesh.vertices.len();
        let names: &[&str] = if normals.is_some() {
            &["x", "y", "z", "nx", "ny", "nz"]
        } else {
            &["x", "y", "z"]
        };
        for name in names {
            vertex_element.properties.add(float_property(name));
        }
        ply.header.elements.add(vertex_element);

        let mut face_element = ElementDef::new("face".to_string());
        face_element.count = mesh.faces.len();
        face_element.properties.add(PropertyDef::new(
            "vertex_indices".to_string(),
            PropertyType::List(ScalarType::UChar, ScalarType::Int),
        ));
        ply.header.elements.add(face_element);

        let vertices = mesh
            .vertices
            .iter()
            .enumerate()
            .map(|(i, vertex)| {
                let mut values = vec![vertex.x, vertex.y, vertex.z];
                if let Some(normals) = normals {
                    values.extend_from_slice(normals[i].as_slice());
                }

                let mut element = DefaultElement::new();
                for (name, value) in names.iter().zip(values) {
                    element.insert(name.to_string(), Property::Float(value));
                }
                element
            })
            .collect();
        ply.payload.insert("vertex".to_string(), vertices);

        let faces = mesh
            .faces
            .iter()
            .map(|face| {
                let mut element = DefaultElement::new();
                let indices = face.iter().map(|&i| i as i32).collect();
                element.insert("vertex_indices".to_string(), Property::ListInt(indices));
                element
            })
            .collect();
        ply.payload.insert("face".to_string(), faces);

        let writer_instance = Writer::new();
        writer_instance.write_ply(&mut writer, &mut ply)?;

        Ok(())
    }
}

/// Extract a property value as f32 from a PLY element
fn extract_property_value(element: &DefaultElement, name: &str) -> Result<f32> {
    match element.get(name) {
        Some(Property::Float(val)) => Ok(*val),
        Some(Property::Double(val)) => Ok(*val as f32),
        Some(Property::Int(val)) => Ok(*val as f32),
        Some(Property::UInt(val)) => Ok(*val as f32),
        Some(Property::Short(val)) => Ok(*val as f32),
        Some(Property::UShort(val)) => Ok(*val as f32),
        _ => Err(Error::InvalidData(format!(
            "Property '{}' not found or invalid type",
            name
        ))),
    }
}

/// Extract face indices from a PLY face element
fn extract_face_indices(element: &DefaultElement) -> Result<Vec<usize>> {
    match element.get("vertex_indices").or_else(|| element.get("vertex_index")) {
        Some(Property::ListInt(indices)) => Ok(indices.iter().map(|&idx| idx as usize).collect()),
        Some(Property::ListUInt(indices)) => Ok(indices.iter().map(|&idx| idx as usize).collect()),
        Some(Property::ListUChar(indices)) => Ok(indices.iter().map(|&idx| idx as usize).collect()),
        _ => Err(Error::InvalidData("Face indices not found".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::fs;

    const HEADER_WITH_NORMALS: &str = "ply
format ascii 1.0
element vertex 3
property float x
property float y
property float z
property float nx
property float ny
property float nz
end_header
";

    #[test]
    fn test_reads_vertex_normals() {
        let temp_file = "test_ply_vertex_normals.ply";
        let body = "0 0 0 0 0 1\n1 0 0 0 0 1\n0 1 0 0 1 0\n";
        fs::write(temp_file, format!("{}{}", HEADER_WITH_NORMALS, body)).unwrap();

        let cloud = PlyReader::read_oriented_cloud(temp_file).unwrap();
        assert_eq!(cloud.len(), 3);
        assert_eq!(cloud[1].position, Point3f::new(1.0, 0.0, 0.0));
        assert_eq!(cloud[2].normal, Vector3f::new(0.0, 1.0, 0.0));

        let _ = fs::remove_file(temp_file);
    }

    #[test]
    fn test_derives_normals_from_faces() {
        let temp_file = "test_ply_face_normals.ply";
        let content = "ply
format ascii 1.0
element vertex 4
property float x
property float y
property float z
element face 2
property list uchar int vertex_indices
end_header
0 0 0
1 0 0
1 1 0
0 1 0
3 0 1 2
3 0 2 3
";
        fs::write(temp_file, content).unwrap();

        let cloud = PlyReader::read_oriented_cloud(temp_file).unwrap();
        assert_eq!(cloud.len(), 4);
        for point in cloud.iter() {
            assert_relative_eq!(point.normal.z, 1.0, epsilon = 1e-4);
            assert_relative_eq!(point.normal.x, 0.0);
        }

        let _ = fs::remove_file(temp_file);
    }

    #[test]
    fn test_needs_normals_or_faces() {
        let temp_file = "test_ply_no_normals.ply";
        let content = "ply
format ascii 1.0
element vertex 1
property float x
property float y
property float z
end_header
0 0 0
";
        fs::write(temp_file, content).unwrap();

        let result = PlyReader::read_oriented_cloud(temp_file);
        assert!(matches!(result, Err(Error::InvalidData(_))));

        let _ = fs::remove_file(temp_file);
    }

    #[test]
    fn test_derived_normals_are_area_weighted() {
        let positions = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(2.0, 0.0, 0.0),
            Point3f::new(0.0, 2.0, 0.0),
            Point3f::new(0.0, 0.0, 0.1),
        ];
        // A large face in the xy plane and a thin one in the xz plane, both on vertex 0.
        let faces = vec![vec![0, 1, 2], vec![0, 3, 1]];
        let normals = derive_vertex_normals(&positions, &faces).unwrap();

        assert!(normals[0].z > 0.9);
        assert!(normals[0].y > 0.0);
        assert_relative_eq!(normals[2].z, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_counts_incompatible_faces() {
        let positions = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ];
        let up = vec![Vector3f::z(); 3];
        assert_eq!(count_incompatible_faces(&positions, &[vec![0, 1, 2]], &up), 0);
        assert_eq!(count_incompatible_faces(&positions, &[vec![0, 2, 1]], &up), 1);
    }

    #[test]
    fn test_face_index_out_of_range() {
        let positions = vec![Point3f::origin(); 3];
        let result = derive_vertex_normals(&positions, &[vec![0, 1, 7]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_writer_emits_ascii_with_normals() {
        let temp_file = "test_ply_writer.ply";
        let vertices = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ];
        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, vec![[0, 1, 2]]);
        mesh.set_normals(vec![Vector3f::z(); 3]);

        PlyWriter::write_mesh(&mesh, temp_file).unwrap();
        let text = fs::read_to_string(temp_file).unwrap();

        assert!(text.starts_with("ply"));
        assert!(text.contains("format ascii 1.0"));
        assert!(text.contains("element vertex 3"));
        assert!(text.contains("property float nz"));
        assert!(text.contains("element face 1"));
        assert!(text.contains("property list uchar int vertex_indices"));
        assert!(text.contains("3 0 1 2"));

        let _ = fs::remove_file(temp_file);
    }
}
