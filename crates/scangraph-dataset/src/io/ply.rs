use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::pointcloud::ScanCloud;

/// Error types for the PLY reader.
#[derive(Debug, thiserror::Error)]
pub enum PlyError {
    /// Failed to read the PLY file
    #[error("failed to read PLY file")]
    Io(#[from] std::io::Error),

    /// The file does not start with the `ply` magic line
    #[error("missing `ply` magic line")]
    MissingMagic,

    /// The header declares a layout this reader does not handle
    #[error("unsupported PLY layout: {0}")]
    Unsupported(String),

    /// A required vertex property is absent
    #[error("vertex property `{0}` is missing")]
    MissingProperty(&'static str),

    /// A vertex of an ASCII body cannot be parsed
    #[error("vertex {vertex}: {reason}")]
    MalformedVertex {
        /// 0-based vertex ordinal.
        vertex: usize,
        /// What was wrong with the vertex line.
        reason: String,
    },

    /// The body holds fewer vertices than the header declares
    #[error("vertex data ends before the declared vertex count")]
    TruncatedBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarType {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "char" | "int8" => Some(Self::I8),
            "uchar" | "uint8" => Some(Self::U8),
            "short" | "int16" => Some(Self::I16),
            "ushort" | "uint16" => Some(Self::U16),
            "int" | "int32" => Some(Self::I32),
            "uint" | "uint32" => Some(Self::U32),
            "float" | "float32" => Some(Self::F32),
            "double" | "float64" => Some(Self::F64),
            _ => None,
        }
    }

    fn size(&self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /// Read one little-endian value starting at `bytes[0]` and widen to f64.
    fn read_le(&self, bytes: &[u8]) -> f64 {
        match self {
            Self::I8 => bytes[0] as i8 as f64,
            Self::U8 => bytes[0] as f64,
            Self::I16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            Self::U16 => u16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            Self::I32 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            Self::U32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            Self::F32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            Self::F64 => f64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
        }
    }
}

/// One scalar vertex property: its byte offset within a binary vertex
/// record and its column within an ASCII vertex line.
#[derive(Debug, Clone)]
struct VertexProperty {
    name: String,
    ty: ScalarType,
    offset: usize,
    column: usize,
}

#[derive(Debug)]
struct PlyHeader {
    format: PlyFormat,
    vertex_count: usize,
    properties: Vec<VertexProperty>,
    stride: usize,
}

fn parse_header<R: BufRead>(reader: &mut R) -> Result<PlyHeader, PlyError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 || line.trim() != "ply" {
        return Err(PlyError::MissingMagic);
    }

    let mut format = None;
    let mut vertex_count = None;
    let mut properties = Vec::new();
    let mut stride = 0;
    // which element block the property lines currently belong to
    let mut in_vertex_element = false;
    let mut past_vertex_element = false;

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(PlyError::Unsupported("header is not terminated".to_string()));
        }
        let trimmed = line.trim();

        if trimmed == "end_header" {
            break;
        }
        if trimmed.is_empty() || trimmed.starts_with("comment") || trimmed.starts_with("obj_info")
        {
            continue;
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        match parts.as_slice() {
            ["format", kind, "1.0"] => {
                format = Some(match *kind {
                    "ascii" => PlyFormat::Ascii,
                    "binary_little_endian" => PlyFormat::BinaryLittleEndian,
                    other => {
                        return Err(PlyError::Unsupported(format!("format {}", other)));
                    }
                });
            }
            ["element", "vertex", count] => {
                let count = count
                    .parse()
                    .map_err(|_| PlyError::Unsupported(format!("vertex count {:?}", count)))?;
                vertex_count = Some(count);
                in_vertex_element = true;
            }
            ["element", ..] => {
                if vertex_count.is_none() {
                    // the vertex data would no longer be the first block in
                    // the body, so its offset is unknowable
                    return Err(PlyError::Unsupported(
                        "vertex element is not the first element".to_string(),
                    ));
                }
                in_vertex_element = false;
                past_vertex_element = true;
            }
            ["property", "list", ..] => {
                if in_vertex_element {
                    return Err(PlyError::Unsupported(
                        "list property in vertex element".to_string(),
                    ));
                }
            }
            ["property", ty, name] => {
                if !in_vertex_element {
                    if past_vertex_element {
                        continue;
                    }
                    return Err(PlyError::Unsupported(
                        "property declared outside any element".to_string(),
                    ));
                }
                let ty = ScalarType::parse(ty)
                    .ok_or_else(|| PlyError::Unsupported(format!("property type {}", ty)))?;
                properties.push(VertexProperty {
                    name: name.to_string(),
                    ty,
                    offset: stride,
                    column: properties.len(),
                });
                stride += ty.size();
            }
            _ => {
                return Err(PlyError::Unsupported(format!("header line {:?}", trimmed)));
            }
        }
    }

    let format = format.ok_or_else(|| PlyError::Unsupported("no format line".to_string()))?;
    let vertex_count =
        vertex_count.ok_or_else(|| PlyError::Unsupported("no vertex element".to_string()))?;

    Ok(PlyHeader {
        format,
        vertex_count,
        properties,
        stride,
    })
}

/// The properties the decoder extracts: positions always, colors and
/// normals when the full triple is present.
struct VertexLayout {
    position: [VertexProperty; 3],
    color: Option<[VertexProperty; 3]>,
    normal: Option<[VertexProperty; 3]>,
}

impl VertexLayout {
    fn locate(header: &PlyHeader) -> Result<Self, PlyError> {
        let find = |name: &str| header.properties.iter().find(|p| p.name == name).cloned();
        let coord = |name: &'static str| find(name).ok_or(PlyError::MissingProperty(name));

        let position = [coord("x")?, coord("y")?, coord("z")?];
        let color = match (find("red"), find("green"), find("blue")) {
            (Some(r), Some(g), Some(b)) => Some([r, g, b]),
            _ => None,
        };
        let normal = match (find("nx"), find("ny"), find("nz")) {
            (Some(x), Some(y), Some(z)) => Some([x, y, z]),
            _ => None,
        };

        let used =
            3 + color.as_ref().map_or(0, |_| 3) + normal.as_ref().map_or(0, |_| 3);
        if header.properties.len() > used {
            log::debug!(
                "skipping {} vertex properties",
                header.properties.len() - used
            );
        }

        Ok(Self {
            position,
            color,
            normal,
        })
    }
}

/// Read a PLY scan from disk. ASCII and binary little-endian layouts are
/// supported; vertex properties beyond positions, colors, and normals are
/// skipped.
pub fn read_ply(path: impl AsRef<Path>) -> Result<ScanCloud, PlyError> {
    let file = File::open(path.as_ref())?;
    let cloud = decode_ply(BufReader::new(file))?;
    log::debug!(
        "decoded {} points from {}",
        cloud.len(),
        path.as_ref().display()
    );
    Ok(cloud)
}

/// Decode a PLY scan from any buffered reader.
pub fn decode_ply<R: BufRead>(mut reader: R) -> Result<ScanCloud, PlyError> {
    let header = parse_header(&mut reader)?;
    let layout = VertexLayout::locate(&header)?;

    match header.format {
        PlyFormat::Ascii => decode_ascii(reader, &header, &layout),
        PlyFormat::BinaryLittleEndian => decode_binary(reader, &header, &layout),
    }
}

fn decode_ascii<R: BufRead>(
    reader: R,
    header: &PlyHeader,
    layout: &VertexLayout,
) -> Result<ScanCloud, PlyError> {
    let mut points = Vec::with_capacity(header.vertex_count);
    let mut colors = layout.color.as_ref().map(|_| Vec::with_capacity(header.vertex_count));
    let mut normals = layout
        .normal
        .as_ref()
        .map(|_| Vec::with_capacity(header.vertex_count));

    let mut lines = reader.lines().filter(|l| match l {
        Ok(text) => !text.trim().is_empty(),
        Err(_) => true,
    });

    for vertex in 0..header.vertex_count {
        let line = lines.next().ok_or(PlyError::TruncatedBody)??;
        let columns: Vec<&str> = line.split_whitespace().collect();

        let value = |p: &VertexProperty| -> Result<f64, PlyError> {
            let token = columns
                .get(p.column)
                .ok_or_else(|| PlyError::MalformedVertex {
                    vertex,
                    reason: format!("missing column for property `{}`", p.name),
                })?;
            token.parse().map_err(|_| PlyError::MalformedVertex {
                vertex,
                reason: format!("value {:?} is not a number", token),
            })
        };

        let triple = |props: &[VertexProperty; 3]| -> Result<[f64; 3], PlyError> {
            Ok([value(&props[0])?, value(&props[1])?, value(&props[2])?])
        };

        points.push(triple(&layout.position)?);
        if let (Some(colors), Some(props)) = (colors.as_mut(), layout.color.as_ref()) {
            let rgb = triple(props)?;
            colors.push([rgb[0] as u8, rgb[1] as u8, rgb[2] as u8]);
        }
        if let (Some(normals), Some(props)) = (normals.as_mut(), layout.normal.as_ref()) {
            normals.push(triple(props)?);
        }
    }

    Ok(ScanCloud::new(points, colors, normals))
}

fn decode_binary<R: Read>(
    mut reader: R,
    header: &PlyHeader,
    layout: &VertexLayout,
) -> Result<ScanCloud, PlyError> {
    let mut points = Vec::with_capacity(header.vertex_count);
    let mut colors = layout.color.as_ref().map(|_| Vec::with_capacity(header.vertex_count));
    let mut normals = layout
        .normal
        .as_ref()
        .map(|_| Vec::with_capacity(header.vertex_count));

    let mut buffer = vec![0u8; header.stride];
    for _ in 0..header.vertex_count {
        if let Err(e) = reader.read_exact(&mut buffer) {
            return match e.kind() {
                std::io::ErrorKind::UnexpectedEof => Err(PlyError::TruncatedBody),
                _ => Err(PlyError::Io(e)),
            };
        }

        let value = |p: &VertexProperty| p.ty.read_le(&buffer[p.offset..]);
        let triple =
            |props: &[VertexProperty; 3]| [value(&props[0]), value(&props[1]), value(&props[2])];

        points.push(triple(&layout.position));
        if let (Some(colors), Some(props)) = (colors.as_mut(), layout.color.as_ref()) {
            let rgb = triple(props);
            colors.push([rgb[0] as u8, rgb[1] as u8, rgb[2] as u8]);
        }
        if let (Some(normals), Some(props)) = (normals.as_mut(), layout.normal.as_ref()) {
            normals.push(triple(props));
        }
    }

    Ok(ScanCloud::new(points, colors, normals))
}
