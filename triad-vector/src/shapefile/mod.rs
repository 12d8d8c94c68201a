/*
This code is part of the ShpTriad Shapefile library.
Created: 16/10/2026
Last Modified: 16/10/2026
License: MIT

Notes: The logic behind working with the ESRI Shapefile format. A dataset
is three files sharing a stem: the geometries (.shp), a fixed-size offset
index into them (.shx) and an attribute table (.dbf). Record i of each
file describes the same feature.
*/

pub mod attributes;
pub mod error;
pub mod geometry;
mod reader;
mod writer;

pub use self::reader::Reader;
pub use self::writer::Writer;

use self::attributes::Attributes;
use self::error::{Result, ShapefileError};
use self::geometry::{BoundingBox, Shape, ShapeType};
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use std::ffi::OsString;
use std::fmt;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use triad_common::utils::{ByteOrderReader, Endianness};

/// Magic number at the start of .shp and .shx files.
pub const FILE_CODE: u32 = 9994;
/// Format version written into the header.
pub const VERSION: i32 = 1000;
/// Size of the .shp/.shx file header in bytes.
pub const HEADER_LENGTH: usize = 100;
/// Size of the record number + content length that frames every .shp record.
pub const RECORD_HEADER_LENGTH: usize = 8;

// 100 bytes in size
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ShapefileHeader {
    pub file_code: u32,        // BigEndian; value is 9994
    pub file_length: u32,      // BigEndian; in 16-bit words
    pub version: i32,          // LittleEndian
    pub shape_type: ShapeType, // LittleEndian
    pub x_min: f64,            // LittleEndian
    pub y_min: f64,            // LittleEndian
    pub x_max: f64,            // LittleEndian
    pub y_max: f64,            // LittleEndian
    pub z_min: f64,            // LittleEndian; 0f64 if shapeType not z or measured
    pub z_max: f64,            // LittleEndian; 0f64 if shapeType not z or measured
    pub m_min: f64,            // LittleEndian; 0f64 if shapeType not z or measured
    pub m_max: f64,            // LittleEndian; 0f64 if shapeType not z or measured
}

impl ShapefileHeader {
    pub(crate) fn new(shape_type: ShapeType, file_length: u32, bbox: &BoundingBox) -> ShapefileHeader {
        ShapefileHeader {
            file_code: FILE_CODE,
            file_length,
            version: VERSION,
            shape_type,
            x_min: bbox.x_min,
            y_min: bbox.y_min,
            x_max: bbox.x_max,
            y_max: bbox.y_max,
            z_min: bbox.z_min,
            z_max: bbox.z_max,
            m_min: bbox.m_min,
            m_max: bbox.m_max,
        }
    }

    /// File length in bytes.
    pub fn byte_length(&self) -> usize {
        self.file_length as usize * 2
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox {
            x_min: self.x_min,
            y_min: self.y_min,
            x_max: self.x_max,
            y_max: self.y_max,
            z_min: self.z_min,
            z_max: self.z_max,
            m_min: self.m_min,
            m_max: self.m_max,
        }
    }

    /// Parses the 100-byte header. Leaves the reader little-endian, positioned
    /// at the first record.
    pub(crate) fn read(bor: &mut ByteOrderReader<Cursor<Vec<u8>>>) -> Result<ShapefileHeader> {
        // Note: the shapefile format uses mixed endianness. The two leading
        // words are big-endian and the rest of the header is little-endian.
        bor.set_byte_order(Endianness::BigEndian);
        bor.seek(0)?;
        let file_code = bor.read_u32()?;
        if file_code != FILE_CODE {
            return Err(ShapefileError::Format { found: file_code });
        }
        bor.seek(24)?;
        let file_length = bor.read_u32()?;

        bor.set_byte_order(Endianness::LittleEndian);
        let version = bor.read_i32()?;
        let st = bor.read_i32()?;
        let shape_type = ShapeType::from_int(st).ok_or(ShapefileError::UnsupportedShapeType(st))?;

        Ok(ShapefileHeader {
            file_code,
            file_length,
            version,
            shape_type,
            x_min: bor.read_f64()?,
            y_min: bor.read_f64()?,
            x_max: bor.read_f64()?,
            y_max: bor.read_f64()?,
            z_min: bor.read_f64()?,
            z_max: bor.read_f64()?,
            m_min: bor.read_f64()?,
            m_max: bor.read_f64()?,
        })
    }

    pub(crate) fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        // magic number
        writer.write_u32::<BigEndian>(self.file_code)?;
        // unused header bytes
        for _ in 0..5 {
            writer.write_u32::<BigEndian>(0u32)?;
        }
        writer.write_u32::<BigEndian>(self.file_length)?;
        writer.write_i32::<LittleEndian>(self.version)?;
        writer.write_i32::<LittleEndian>(self.shape_type.to_int())?;
        for v in [
            self.x_min, self.y_min, self.x_max, self.y_max, self.z_min, self.z_max, self.m_min,
            self.m_max,
        ] {
            writer.write_f64::<LittleEndian>(v)?;
        }
        Ok(())
    }
}

impl fmt::Display for ShapefileHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "file_code: {}
file_length: {}
version: {}
shape_type: {}
x_min: {}
x_max: {}
y_min: {}
y_max: {}
z_min: {}
z_max: {}
m_min: {}
m_max: {}",
            self.file_code,
            self.file_length,
            self.version,
            self.shape_type,
            self.x_min,
            self.x_max,
            self.y_min,
            self.y_max,
            self.z_min,
            self.z_max,
            self.m_min,
            self.m_max
        )
    }
}

/// A geometry and its attribute row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub shape: Shape,
    pub attributes: Attributes,
}

impl Record {
    pub fn new(shape: Shape, attributes: Attributes) -> Record {
        Record { shape, attributes }
    }
}

/// Strips a trailing .shp, .shx or .dbf extension (any case) from `path`.
pub fn base_name<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext)
            if ["shp", "shx", "dbf"]
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known)) =>
        {
            path.with_extension("")
        }
        _ => path.to_path_buf(),
    }
}

/// Appends `.ext` to a stem. Unlike `Path::with_extension`, dots already in
/// the stem are kept.
pub(crate) fn sibling_file(stem: &Path, ext: &str) -> PathBuf {
    let mut s = OsString::from(stem.as_os_str());
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}
