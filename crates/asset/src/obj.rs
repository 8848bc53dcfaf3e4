//! OBJ parser producing a canonical indexed mesh.
//!
//! Parsing is two-phase. The first pass fills the raw attribute pools and records
//! every triangulated face corner as a `(position, texcoord, normal)` key. The
//! second pass resolves each distinct key into one [`MeshVertex`] in first-seen
//! order, so faces may reference attributes declared further down the file.

use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use crate::{
    error::{AssetError, AssetResult},
    mesh::{DEFAULT_NORMAL, DEFAULT_UV, MeshData, MeshVertex},
};

/// How a face corner without a `vt`/`vn` reference is resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingAttributes {
    /// Treat the missing reference as index 0, i.e. reuse the first declared
    /// texcoord/normal. Falls back to the default value only if none was declared.
    #[default]
    FirstDeclared,
    /// Always use [`DEFAULT_UV`]/[`DEFAULT_NORMAL`].
    Default,
}

/// Parser behavior switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjOptions {
    /// Store `1 - v` for every `vt` (top-left texture origin).
    pub flip_v: bool,
    pub missing_attributes: MissingAttributes,
}

impl Default for ObjOptions {
    fn default() -> Self {
        Self {
            flip_v: true,
            missing_attributes: MissingAttributes::FirstDeclared,
        }
    }
}

/// Load an OBJ mesh from a file path.
pub fn load_obj_from_path(path: impl AsRef<Path>, options: &ObjOptions) -> AssetResult<MeshData> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| AssetError::Io {
        action: "open OBJ file",
        path: path.to_path_buf(),
        source,
    })?;
    let mesh = parse_obj(BufReader::new(file), options, path)?;
    log::info!(
        "Loaded OBJ {}: {} vertices, {} indices",
        path.display(),
        mesh.vertex_count(),
        mesh.index_count()
    );
    Ok(mesh)
}

/// Load an OBJ mesh from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(reader: R, options: &ObjOptions) -> AssetResult<MeshData> {
    parse_obj(reader, options, Path::new(STREAM_SOURCE))
}

/// Convenience helper to parse an OBJ string literal with default options.
pub fn load_obj_from_str(contents: &str) -> AssetResult<MeshData> {
    load_obj_from_str_with(contents, &ObjOptions::default())
}

pub fn load_obj_from_str_with(contents: &str, options: &ObjOptions) -> AssetResult<MeshData> {
    parse_obj(io::Cursor::new(contents), options, Path::new(STREAM_SOURCE))
}

/// Source name reported for read failures when there is no file path.
const STREAM_SOURCE: &str = "<stream>";

/// Composite vertex key; indices are 0-based into the raw pools.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
struct VertexKey {
    position: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
}

/// Scratch state for one parse call.
#[derive(Default)]
struct RawPools {
    positions: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    /// Triangulated corners with the 1-based line they came from.
    corners: Vec<(VertexKey, usize)>,
    name: Option<String>,
}

fn parse_obj<R: BufRead>(
    mut reader: R,
    options: &ObjOptions,
    source: &Path,
) -> AssetResult<MeshData> {
    let mut pools = RawPools::default();
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| AssetError::Io {
                action: "read OBJ file",
                path: source.to_path_buf(),
                source: e,
            })?;
        if read == 0 {
            break;
        }
        line_no += 1;
        parse_line(buf.trim_ascii(), line_no, options, &mut pools)?;
    }

    canonicalize(pools)
}

/// Handle one raw line. Only the directives we consume need to be UTF-8.
fn parse_line(
    line: &[u8],
    line_no: usize,
    options: &ObjOptions,
    pools: &mut RawPools,
) -> AssetResult<()> {
    if line.is_empty() || line[0] == b'#' {
        return Ok(());
    }

    let tag_len = line
        .iter()
        .position(u8::is_ascii_whitespace)
        .unwrap_or(line.len());
    let (tag, rest) = line.split_at(tag_len);
    let text = move || {
        std::str::from_utf8(rest)
            .map_err(|e| AssetError::parse(line_no, format!("line is not valid UTF-8: {e}")))
    };

    match tag {
        b"v" => {
            let mut parts = text()?.split_whitespace();
            let x = parse_f32(parts.next(), line_no, "x coordinate")?;
            let y = parse_f32(parts.next(), line_no, "y coordinate")?;
            let z = parse_f32(parts.next(), line_no, "z coordinate")?;
            pools.positions.push([x, y, z]);
        }
        b"vt" => {
            let mut parts = text()?.split_whitespace();
            let u = parse_f32(parts.next(), line_no, "u coordinate")?;
            let v = match parts.next() {
                Some(token) => parse_f32(Some(token), line_no, "v coordinate")?,
                None => 0.0,
            };
            let v = if options.flip_v { 1.0 - v } else { v };
            pools.texcoords.push([u, v]);
        }
        b"vn" => {
            let mut parts = text()?.split_whitespace();
            let nx = parse_f32(parts.next(), line_no, "nx coordinate")?;
            let ny = parse_f32(parts.next(), line_no, "ny coordinate")?;
            let nz = parse_f32(parts.next(), line_no, "nz coordinate")?;
            pools.normals.push([nx, ny, nz]);
        }
        b"f" => {
            let face = text()?
                .split_whitespace()
                .map(|token| parse_face_vertex(token, pools, options, line_no))
                .collect::<AssetResult<Vec<_>>>()?;
            if face.len() < 3 {
                log::warn!(
                    "Skipping face with {} vertices on line {}",
                    face.len(),
                    line_no
                );
                return Ok(());
            }
            // Fan around the first corner: n-2 triangles.
            for i in 1..face.len() - 1 {
                pools.corners.push((face[0], line_no));
                pools.corners.push((face[i], line_no));
                pools.corners.push((face[i + 1], line_no));
            }
        }
        b"o" if pools.name.is_none() => {
            pools.name = String::from_utf8_lossy(rest)
                .split_whitespace()
                .next()
                .map(str::to_owned);
        }
        _ => {
            // Ignore other directives (g/s/usemtl/mtllib/etc.)
        }
    }
    Ok(())
}

/// Resolve every triangulated corner into a deduplicated vertex + index buffer.
fn canonicalize(pools: RawPools) -> AssetResult<MeshData> {
    let mut unique: HashMap<VertexKey, u32> = HashMap::new();
    let mut vertices: Vec<MeshVertex> = Vec::new();
    let mut indices: Vec<u32> = Vec::with_capacity(pools.corners.len());

    for &(key, line_no) in &pools.corners {
        let index = match unique.get(&key) {
            Some(&idx) => idx,
            None => {
                let position = pools.positions.get(key.position).copied().ok_or_else(|| {
                    AssetError::parse(
                        line_no,
                        format!(
                            "position index {} out of bounds (len={})",
                            key.position + 1,
                            pools.positions.len()
                        ),
                    )
                })?;
                let uv = key
                    .texcoord
                    .and_then(|i| pools.texcoords.get(i).copied())
                    .unwrap_or(DEFAULT_UV);
                let normal = key
                    .normal
                    .and_then(|i| pools.normals.get(i).copied())
                    .unwrap_or(DEFAULT_NORMAL);

                let idx = u32::try_from(vertices.len()).map_err(|_| {
                    AssetError::parse(line_no, format!("too many vertices in OBJ (>{})", u32::MAX))
                })?;
                vertices.push(MeshVertex::new(position, normal, uv));
                unique.insert(key, idx);
                idx
            }
        };
        indices.push(index);
    }

    let mut mesh = MeshData::new(vertices, indices);
    mesh.name = pools.name;
    Ok(mesh)
}

fn parse_f32(value: Option<&str>, line_no: usize, what: &str) -> AssetResult<f32> {
    let token = value.ok_or_else(|| AssetError::parse(line_no, format!("missing {what}")))?;
    token
        .parse::<f32>()
        .map_err(|e| AssetError::parse(line_no, format!("invalid {what} '{token}': {e}")))
}

/// `pos`, `pos/tex`, `pos//norm` or `pos/tex/norm`.
fn parse_face_vertex(
    token: &str,
    pools: &RawPools,
    options: &ObjOptions,
    line_no: usize,
) -> AssetResult<VertexKey> {
    let mut split = token.split('/');
    let position = match split.next() {
        Some(value) if !value.is_empty() => resolve_index(value, pools.positions.len(), line_no)?,
        _ => {
            return Err(AssetError::parse(
                line_no,
                format!("malformed face element '{token}'"),
            ));
        }
    };

    let texcoord = match split.next() {
        Some(value) if !value.is_empty() => {
            Some(resolve_index(value, pools.texcoords.len(), line_no)?)
        }
        _ => None,
    };

    let normal = match split.next() {
        Some(value) if !value.is_empty() => Some(resolve_index(value, pools.normals.len(), line_no)?),
        _ => None,
    };

    if split.next().is_some() {
        return Err(AssetError::parse(
            line_no,
            format!("too many components in face element '{token}'"),
        ));
    }

    let fallback = match options.missing_attributes {
        MissingAttributes::FirstDeclared => Some(0),
        MissingAttributes::Default => None,
    };

    Ok(VertexKey {
        position,
        texcoord: texcoord.or(fallback),
        normal: normal.or(fallback),
    })
}

/// 1-based (or negative, relative to `len`) OBJ index to 0-based.
fn resolve_index(token: &str, len: usize, line_no: usize) -> AssetResult<usize> {
    let raw = token
        .parse::<i64>()
        .map_err(|e| AssetError::parse(line_no, format!("invalid index '{token}': {e}")))?;
    if raw == 0 {
        return Err(AssetError::parse(line_no, "OBJ indices are 1-based; found 0"));
    }

    if raw > 0 {
        return Ok((raw - 1) as usize);
    }

    let idx = len as i64 + raw;
    if idx < 0 {
        return Err(AssetError::parse(
            line_no,
            format!("relative index {raw} resolved out of bounds (len={len})"),
        ));
    }
    Ok(idx as usize)
}
