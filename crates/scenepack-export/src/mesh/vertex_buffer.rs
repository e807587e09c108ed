//! Binary vertex-buffer format
//!
//! Layout (little-endian):
//!
//! | Offset | Field | Type |
//! |--------|-------|------|
//! | 0  | format major (1) | u32 |
//! | 4  | format minor (0) | u32 |
//! | 8  | attribute flags  | u32 |
//! | 12 | vertex count     | u32 |
//! | 16 | vertices         | 11 x f32 each |
//!
//! Vertices form an unindexed triangle list: position, uv, normal, tangent.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use scenepack_core::{Error, Result};

pub const FORMAT_MAJOR: u32 = 1;
pub const FORMAT_MINOR: u32 = 0;

/// Header size in bytes
pub const HEADER_SIZE: usize = 16;

/// Floats per vertex record
pub const FLOATS_PER_VERTEX: usize = 11;

/// Bytes per vertex record
pub const VERTEX_STRIDE: usize = FLOATS_PER_VERTEX * 4;

/// Attribute bitmask stored in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeFlags(pub u32);

impl AttributeFlags {
    pub const POSITION: Self = Self(1 << 0);
    pub const UV: Self = Self(1 << 1);
    pub const NORMAL: Self = Self(1 << 2);
    pub const TANGENT: Self = Self(1 << 3);
    /// Reserved, never written
    pub const COLOR: Self = Self(1 << 4);

    /// Attributes every buffer carries
    pub const STANDARD: Self = Self(0b1111);

    const KNOWN: u32 = 0b1_1111;

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for AttributeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One vertex record
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
}

impl Vertex {
    /// Fields in file order
    pub fn to_floats(&self) -> [f32; FLOATS_PER_VERTEX] {
        let [px, py, pz] = self.position;
        let [u, v] = self.uv;
        let [nx, ny, nz] = self.normal;
        let [tx, ty, tz] = self.tangent;
        [px, py, pz, u, v, nx, ny, nz, tx, ty, tz]
    }

    pub fn from_floats(f: &[f32; FLOATS_PER_VERTEX]) -> Self {
        Self {
            position: [f[0], f[1], f[2]],
            uv: [f[3], f[4]],
            normal: [f[5], f[6], f[7]],
            tangent: [f[8], f[9], f[10]],
        }
    }
}

/// An unindexed triangle list
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBuffer {
    pub flags: AttributeFlags,
    pub vertices: Vec<Vertex>,
}

impl VertexBuffer {
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Self {
            flags: AttributeFlags::STANDARD,
            vertices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Size of the encoded file
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.vertices.len() * VERTEX_STRIDE
    }

    /// Encode into any writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let count = u32::try_from(self.vertices.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "vertex count exceeds u32")
        })?;

        writer.write_u32::<LittleEndian>(FORMAT_MAJOR)?;
        writer.write_u32::<LittleEndian>(FORMAT_MINOR)?;
        writer.write_u32::<LittleEndian>(self.flags.bits())?;
        writer.write_u32::<LittleEndian>(count)?;

        for vertex in &self.vertices {
            for value in vertex.to_floats() {
                writer.write_f32::<LittleEndian>(value)?;
            }
        }
        Ok(())
    }

    /// Encode into a fresh byte vector
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Decode from a reader, consuming it to the end
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut offset = 0u64;

        let major = read_u32(reader, &mut offset)?;
        let minor = read_u32(reader, &mut offset)?;
        if major != FORMAT_MAJOR {
            return Err(Error::UnsupportedVersion {
                version: format!("{major}.{minor}"),
                supported: format!("{FORMAT_MAJOR}.x"),
            });
        }

        let flags = AttributeFlags(read_u32(reader, &mut offset)?);
        if flags.bits() & !AttributeFlags::KNOWN != 0 {
            return Err(Error::invalid_data(format!("unknown attribute flags 0x{:08X}", flags.bits())));
        }
        if !flags.contains(AttributeFlags::STANDARD) {
            return Err(Error::invalid_data(format!(
                "attribute flags 0x{:02X} lack position/uv/normal/tangent",
                flags.bits()
            )));
        }
        if flags.contains(AttributeFlags::COLOR) {
            return Err(Error::invalid_data("vertex colors are reserved and not supported"));
        }

        let count = read_u32(reader, &mut offset)? as usize;
        let mut vertices = Vec::with_capacity(count.min(1 << 20));
        let mut floats = [0.0f32; FLOATS_PER_VERTEX];
        for _ in 0..count {
            for value in floats.iter_mut() {
                *value = read_f32(reader, &mut offset)?;
            }
            vertices.push(Vertex::from_floats(&floats));
        }

        let mut probe = [0u8; 1];
        if reader.read(&mut probe)? != 0 {
            return Err(Error::invalid_data(format!("trailing bytes after {count} vertices")));
        }

        Ok(Self { flags, vertices })
    }

    /// Decode an in-memory buffer
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = io::Cursor::new(bytes);
        Self::read_from(&mut cursor)
    }
}

fn eof_at(offset: u64) -> impl FnOnce(io::Error) -> Error {
    move |e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::UnexpectedEof { offset },
        _ => Error::Io(e),
    }
}

fn read_u32<R: Read>(reader: &mut R, offset: &mut u64) -> Result<u32> {
    let value = reader.read_u32::<LittleEndian>().map_err(eof_at(*offset))?;
    *offset += 4;
    Ok(value)
}

fn read_f32<R: Read>(reader: &mut R, offset: &mut u64) -> Result<f32> {
    let value = reader.read_f32::<LittleEndian>().map_err(eof_at(*offset))?;
    *offset += 4;
    Ok(value)
}
