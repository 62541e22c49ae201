//! Wavefront OBJ subset: `v`, `vt`, `vn` and triangular `f` records.
//!
//! Corners that reference the same `(position, uv, normal)` triple share a
//! vertex, so the output vertex count equals the number of distinct triples.

use std::collections::HashMap;
use std::path::Path;

use maya_math::{Vec2, Vec3, Vec4};

use super::error::ModelError;
use super::fs::read_text;
use crate::render::{Mesh, MeshData};
use crate::rhi::{GraphicsDevice, Vertex};

/// Zero-based deduplication key for one face corner.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ObjIndex {
    pub position: u32,
    pub uv: Option<u32>,
    pub normal: Option<u32>,
}

/// Parses OBJ text into indexed geometry.
///
/// Texture V is flipped (`1 - v`). Missing uvs and normals are zero, vertex
/// color is white. Unsupported directives are skipped.
pub fn parse_obj(source: &str) -> Result<MeshData, ModelError> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut uvs: Vec<Vec2> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();

    let mut data = MeshData::default();
    let mut seen: HashMap<ObjIndex, u32> = HashMap::new();

    for (i, raw) in source.lines().enumerate() {
        let line = i + 1;
        let content = raw.split('#').next().unwrap_or_default();
        let mut fields = content.split_whitespace();
        let Some(directive) = fields.next() else {
            continue;
        };

        match directive {
            "v" => {
                let [x, y, z] = parse_floats::<3>(line, &mut fields, "v")?;
                positions.push(Vec3::new(x, y, z));
            }
            "vt" => {
                let [u, v] = parse_floats::<2>(line, &mut fields, "vt")?;
                uvs.push(Vec2::new(u, 1.0 - v));
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>(line, &mut fields, "vn")?;
                normals.push(Vec3::new(x, y, z));
            }
            "f" => {
                let corners: Vec<&str> = fields.collect();
                if corners.len() != 3 {
                    return Err(ModelError::NonTriangle {
                        line,
                        corners: corners.len(),
                    });
                }

                // Resolve every corner first so a bad face adds nothing.
                let mut keys = [None; 3];
                for (slot, corner) in keys.iter_mut().zip(&corners) {
                    *slot = Some(parse_corner(line, corner, &positions, &uvs, &normals)?);
                }

                for key in keys.into_iter().flatten() {
                    let index = match seen.get(&key) {
                        Some(&index) => index,
                        None => {
                            let index = data.vertices.len() as u32;
                            data.vertices.push(make_vertex(key, &positions, &uvs, &normals));
                            seen.insert(key, index);
                            index
                        }
                    };
                    data.indices.push(index);
                }
            }
            _ => log::trace!("obj line {line}: skipping `{directive}`"),
        }
    }

    if data.indices.is_empty() {
        return Err(ModelError::Empty);
    }

    log::debug!(
        "obj parsed: {} positions, {} uvs, {} normals -> {} vertices, {} triangles",
        positions.len(),
        uvs.len(),
        normals.len(),
        data.vertices.len(),
        data.triangle_count()
    );

    Ok(data)
}

/// Reads, parses and uploads an OBJ file. Nothing is uploaded on failure.
pub fn load_obj(
    device: &mut dyn GraphicsDevice,
    path: impl AsRef<Path>,
) -> Result<Mesh, ModelError> {
    let path = path.as_ref();
    let source = read_text(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let data = parse_obj(&source)?;
    let mesh = Mesh::from_data(device, &data)?;
    log::info!(
        "loaded `{}` ({} vertices, {} triangles)",
        path.display(),
        data.vertices.len(),
        data.triangle_count()
    );
    Ok(mesh)
}

fn parse_floats<'a, const N: usize>(
    line: usize,
    fields: &mut impl Iterator<Item = &'a str>,
    directive: &str,
) -> Result<[f32; N], ModelError> {
    let mut out = [0.0; N];
    for (i, value) in out.iter_mut().enumerate() {
        let field = fields.next().ok_or_else(|| {
            ModelError::parse(line, format!("`{directive}` needs {} components, found {i}", N))
        })?;
        *value = field
            .parse()
            .map_err(|_| ModelError::parse(line, format!("invalid number `{field}`")))?;
    }
    Ok(out)
}

/// Parses `p`, `p/t`, `p//n` or `p/t/n` into a zero-based key.
fn parse_corner(
    line: usize,
    corner: &str,
    positions: &[Vec3],
    uvs: &[Vec2],
    normals: &[Vec3],
) -> Result<ObjIndex, ModelError> {
    let mut parts = corner.split('/');
    let p = parts.next().unwrap_or_default();
    let t = parts.next().filter(|s| !s.is_empty());
    let n = parts.next();
    if parts.next().is_some() {
        return Err(ModelError::parse(line, format!("malformed face corner `{corner}`")));
    }
    if n == Some("") {
        return Err(ModelError::parse(line, format!("missing normal index in `{corner}`")));
    }

    Ok(ObjIndex {
        position: resolve(line, p, "position", positions.len())?,
        uv: t.map(|t| resolve(line, t, "uv", uvs.len())).transpose()?,
        normal: n.map(|n| resolve(line, n, "normal", normals.len())).transpose()?,
    })
}

fn resolve(line: usize, field: &str, kind: &'static str, count: usize) -> Result<u32, ModelError> {
    let index: i64 = field
        .parse()
        .map_err(|_| ModelError::parse(line, format!("invalid {kind} index `{field}`")))?;
    if index < 1 || index as usize > count {
        return Err(ModelError::IndexOutOfRange {
            line,
            kind,
            index,
            count,
        });
    }
    Ok((index - 1) as u32)
}

fn make_vertex(key: ObjIndex, positions: &[Vec3], uvs: &[Vec2], normals: &[Vec3]) -> Vertex {
    let position = positions[key.position as usize];
    let uv = key.uv.map_or(Vec2::ZERO, |i| uvs[i as usize]);
    let normal = key.normal.map_or(Vec3::ZERO, |i| normals[i as usize]);
    Vertex::new(position, normal, Vec4::ONE, uv)
}
