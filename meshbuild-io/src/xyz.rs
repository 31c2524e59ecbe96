//! Plain-text oriented point clouds
//!
//! One point per line as `x y z nx ny nz`, separated by whitespace or commas.
//! Blank lines and lines starting with `#` are skipped; extra columns after
//! the sixth are ignored.

use crate::OrientedCloudReader;
use meshbuild_core::{Error, NormalPoint3f, Point3f, PointCloud, Result, Vector3f};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub struct XyzReader;

impl OrientedCloudReader for XyzReader {
    fn read_oriented_cloud<P: AsRef<Path>>(path: P) -> Result<PointCloud<NormalPoint3f>> {
        let file = File::open(path)?;
        parse_oriented_cloud(BufReader::new(file))
    }
}

/// Parse an oriented cloud from any buffered reader
pub fn parse_oriented_cloud<R: BufRead>(reader: R) -> Result<PointCloud<NormalPoint3f>> {
    let mut cloud = PointCloud::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        cloud.push(parse_line(line, line_number + 1)?);
    }

    Ok(cloud)
}

fn parse_line(line: &str, line_number: usize) -> Result<NormalPoint3f> {
    let values = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .take(6)
        .map(|part| {
            part.parse::<f32>().map_err(|_| {
                Error::InvalidData(format!("Line {}: '{}' is not a number", line_number, part))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    match values[..] {
        [x, y, z, nx, ny, nz] => Ok(NormalPoint3f::new(Point3f::new(x, y, z), Vector3f::new(nx, ny, nz))),
        _ => Err(Error::InvalidData(format!(
            "Line {}: expected 6 values (x y z nx ny nz), found {}",
            line_number,
            values.len()
        ))),
    }
}
