/*
This code is part of the ShpTriad Shapefile library.
Created: 16/10/2026
Last Modified: 16/10/2026
License: MIT
*/
use super::attributes::{AttributeField, Attributes, FieldData, FieldDataType};
use super::error::{Result, ShapefileError};
use super::geometry::{BoundingBox, Shape, ShapeType};
use super::reader::Reader;
use super::{
    base_name, sibling_file, Record, ShapefileHeader, HEADER_LENGTH, RECORD_HEADER_LENGTH,
};
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use chrono::{Datelike, Local};
use std::fs::File;
use std::io::prelude::*;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::debug;

const DBF_VERSION: u8 = 3;
const FIELD_TERMINATOR: u8 = 0x0d;
const ROW_NOT_DELETED: u8 = 0x20;
const DBF_EOF: u8 = 0x1a;

/// Builds a Shapefile dataset in memory and writes it out as a .shp/.shx/.dbf triad.
///
/// ```no_run
/// use std::collections::HashMap;
/// use triad_vector::{FieldData, FieldDataType, Shape, ShapeType, Writer};
///
/// let mut output = Writer::new("wells.shp", ShapeType::Point)?;
/// output.add_field("NAME", FieldDataType::Character, 20, 0)?;
/// output.add_field("DEPTH", FieldDataType::Numeric, 8, 2)?;
///
/// let mut attributes = HashMap::new();
/// attributes.insert("NAME".to_string(), FieldData::Text("North".to_string()));
/// attributes.insert("DEPTH".to_string(), FieldData::Real(31.5));
/// output.add_record(Shape::point(512_000.0, 4_810_000.0), attributes)?;
/// output.write()?;
/// # Ok::<(), triad_vector::ShapefileError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Writer {
    stem: PathBuf,
    shape_type: ShapeType,
    fields: Vec<AttributeField>,
    records: Vec<Record>,
    bbox: BoundingBox,
    /// Well-known text written to `<stem>.prj` when not empty.
    pub projection: String,
}

impl Writer {
    /// Creates an empty dataset holding shapes of one type. Only the
    /// two-dimensional types (and Null) can be written.
    pub fn new<P: AsRef<Path>>(file_name: P, shape_type: ShapeType) -> Result<Writer> {
        if !shape_type.is_writable() {
            return Err(ShapefileError::UnsupportedShapeType(shape_type.to_int()));
        }
        Ok(Writer {
            stem: base_name(file_name),
            shape_type,
            fields: vec![],
            records: vec![],
            bbox: BoundingBox::default(),
            projection: String::new(),
        })
    }

    /// Creates an empty dataset that shares `other`'s projection and,
    /// optionally, its attribute fields.
    pub fn initialize_using<P: AsRef<Path>>(
        file_name: P,
        other: &Reader,
        shape_type: ShapeType,
        copy_fields: bool,
    ) -> Result<Writer> {
        let mut w = Writer::new(file_name, shape_type)?;
        w.projection = other.projection.clone();
        if copy_fields {
            for f in &other.fields {
                w.add_field(&f.name, f.field_type, f.field_length, f.decimal_count)?;
            }
        }
        Ok(w)
    }

    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    /// The extent of every vertex added so far.
    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn fields(&self) -> &[AttributeField] {
        &self.fields
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn num_records(&self) -> usize {
        self.records.len()
    }

    /// Path of one of the dataset's files, e.g. `file_path("shx")`.
    pub fn file_path(&self, ext: &str) -> PathBuf {
        sibling_file(&self.stem, ext)
    }

    /// Appends a field to the attribute schema. The schema is frozen once
    /// the first record has been added.
    pub fn add_field(
        &mut self,
        name: &str,
        field_type: FieldDataType,
        width: u8,
        decimals: u8,
    ) -> Result<()> {
        if !self.records.is_empty() {
            return Err(ShapefileError::SchemaFrozen {
                field: name.to_string(),
            });
        }
        let field = AttributeField::new(name, field_type, width, decimals);
        if field.name.is_empty() {
            return Err(ShapefileError::InvalidField("field names cannot be empty".to_string()));
        }
        if width == 0 {
            return Err(ShapefileError::InvalidField(format!(
                "field '{}' must be at least one byte wide",
                field.name
            )));
        }
        if self.fields.iter().any(|f| f.name == field.name) {
            return Err(ShapefileError::InvalidField(format!(
                "duplicate field name '{}'",
                field.name
            )));
        }
        self.fields.push(field);
        Ok(())
    }

    /// Appends a record and folds its vertices into the dataset extent.
    pub fn add_record(&mut self, shape: Shape, attributes: Attributes) -> Result<()> {
        if shape.shape_type != self.shape_type && shape.shape_type != ShapeType::Null {
            return Err(ShapefileError::ShapeTypeMismatch {
                expected: self.shape_type,
                found: shape.shape_type,
            });
        }
        shape.validate()?;
        for p in &shape.points {
            self.bbox.update_point(p);
        }
        self.records.push(Record::new(shape, attributes));
        Ok(())
    }

    /// Writes the .shp, .shx and (when there are fields) .dbf files. Every
    /// attribute value is encoded before any file is created, so a value
    /// that does not fit its field leaves the file system untouched.
    pub fn write(&self) -> Result<()> {
        let rows = self.encode_rows()?;

        let mut content_lengths = Vec::with_capacity(self.records.len());
        let mut shp_bytes = HEADER_LENGTH;
        for record in &self.records {
            let len = record.shape.content_length();
            content_lengths.push(to_words(len)?);
            shp_bytes += RECORD_HEADER_LENGTH + len;
        }
        let shx_bytes = HEADER_LENGTH + RECORD_HEADER_LENGTH * self.records.len();

        self.write_shp(to_words(shp_bytes)?, &content_lengths)?;
        self.write_shx(to_words(shx_bytes)?, &content_lengths)?;
        if self.fields.is_empty() {
            debug!(
                "{} has no attribute fields; no .dbf written",
                self.stem.display()
            );
        } else {
            self.write_dbf(&rows)?;
        }
        if !self.projection.is_empty() {
            let mut f = BufWriter::new(File::create(self.file_path("prj"))?);
            f.write_all(self.projection.as_bytes())?;
            f.flush()?;
        }
        debug!(
            "wrote {} {} records to {}",
            self.records.len(),
            self.shape_type,
            self.file_path("shp").display()
        );
        Ok(())
    }

    fn encode_rows(&self) -> Result<Vec<Vec<u8>>> {
        let record_length = 1 + self
            .fields
            .iter()
            .map(|f| f.field_length as usize)
            .sum::<usize>();
        let mut rows = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let mut row = Vec::with_capacity(record_length);
            row.push(ROW_NOT_DELETED);
            for field in &self.fields {
                let value = record.attributes.get(&field.name).unwrap_or(&FieldData::Null);
                row.extend_from_slice(field.encode(value)?.as_bytes());
            }
            rows.push(row);
        }
        Ok(rows)
    }

    fn write_shp(&self, file_length: u32, content_lengths: &[u32]) -> Result<()> {
        let f = File::create(self.file_path("shp"))?;
        let mut writer = BufWriter::new(f);
        ShapefileHeader::new(self.shape_type, file_length, &self.bbox).write(&mut writer)?;
        for (i, record) in self.records.iter().enumerate() {
            writer.write_u32::<BigEndian>(i as u32 + 1)?; // record number
            writer.write_u32::<BigEndian>(content_lengths[i])?; // content length in 16-bit words
            write_shape(&mut writer, &record.shape)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_shx(&self, file_length: u32, content_lengths: &[u32]) -> Result<()> {
        let f = File::create(self.file_path("shx"))?;
        let mut writer = BufWriter::new(f);
        ShapefileHeader::new(self.shape_type, file_length, &self.bbox).write(&mut writer)?;
        let mut offset = (HEADER_LENGTH / 2) as u32;
        for len in content_lengths {
            writer.write_u32::<BigEndian>(offset)?;
            writer.write_u32::<BigEndian>(*len)?;
            offset += len + (RECORD_HEADER_LENGTH / 2) as u32;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_dbf(&self, rows: &[Vec<u8>]) -> Result<()> {
        let header_length = 32 + 32 * self.fields.len() + 1;
        let record_length = 1 + self
            .fields
            .iter()
            .map(|f| f.field_length as usize)
            .sum::<usize>();
        let header_length = u16::try_from(header_length).map_err(|_| {
            ShapefileError::InvalidField(format!("{} fields do not fit a .dbf header", self.fields.len()))
        })?;
        let record_length = u16::try_from(record_length).map_err(|_| {
            ShapefileError::InvalidField(format!(
                "rows of {} bytes are too long for a .dbf file",
                record_length
            ))
        })?;
        let num_records = u32::try_from(rows.len()).map_err(|_| {
            ShapefileError::InvalidField(format!("{} rows is too many for a .dbf file", rows.len()))
        })?;

        let f = File::create(self.file_path("dbf"))?;
        let mut writer = BufWriter::new(f);

        let today = Local::now();
        writer.write_u8(DBF_VERSION)?;
        writer.write_u8((today.year() - 1900).clamp(0, 255) as u8)?;
        writer.write_u8(today.month() as u8)?;
        writer.write_u8(today.day() as u8)?;
        writer.write_u32::<LittleEndian>(num_records)?;
        writer.write_u16::<LittleEndian>(header_length)?;
        writer.write_u16::<LittleEndian>(record_length)?;
        writer.write_all(&[0u8; 20])?; // reserved

        for field in &self.fields {
            let mut name = [0u8; 11];
            let bytes = field.name.as_bytes();
            name[..bytes.len()].copy_from_slice(bytes);
            writer.write_all(&name)?;
            writer.write_u8(field.field_type.to_char() as u8)?;
            writer.write_u32::<LittleEndian>(0u32)?; // field data address
            writer.write_u8(field.field_length)?;
            writer.write_u8(field.decimal_count)?;
            writer.write_all(&[0u8; 14])?; // reserved
        }
        writer.write_u8(FIELD_TERMINATOR)?;

        for row in rows {
            writer.write_all(row)?;
        }
        writer.write_u8(DBF_EOF)?;
        writer.flush()?;
        Ok(())
    }
}

/// Converts a byte count to 16-bit words.
fn to_words(bytes: usize) -> Result<u32> {
    u32::try_from(bytes / 2).map_err(|_| {
        ShapefileError::InvalidGeometry(format!("{} bytes exceed the Shapefile size limit", bytes))
    })
}

fn write_bounds<W: Write>(writer: &mut W, bbox: &BoundingBox) -> Result<()> {
    writer.write_f64::<LittleEndian>(bbox.x_min)?;
    writer.write_f64::<LittleEndian>(bbox.y_min)?;
    writer.write_f64::<LittleEndian>(bbox.x_max)?;
    writer.write_f64::<LittleEndian>(bbox.y_max)?;
    Ok(())
}

fn write_shape<W: Write>(writer: &mut W, shape: &Shape) -> Result<()> {
    writer.write_i32::<LittleEndian>(shape.shape_type.to_int())?;
    match shape.shape_type {
        ShapeType::Null => {}
        ShapeType::Point => {
            let p = shape.points[0];
            writer.write_f64::<LittleEndian>(p.x)?;
            writer.write_f64::<LittleEndian>(p.y)?;
        }
        ShapeType::PolyLine | ShapeType::Polygon => {
            write_bounds(writer, &shape.effective_bbox())?;
            writer.write_i32::<LittleEndian>(shape.parts.len() as i32)?;
            writer.write_i32::<LittleEndian>(shape.points.len() as i32)?;
            for part in &shape.parts {
                writer.write_i32::<LittleEndian>(*part)?;
            }
            for p in &shape.points {
                writer.write_f64::<LittleEndian>(p.x)?;
                writer.write_f64::<LittleEndian>(p.y)?;
            }
        }
        ShapeType::MultiPoint => {
            write_bounds(writer, &shape.effective_bbox())?;
            writer.write_i32::<LittleEndian>(shape.points.len() as i32)?;
            for p in &shape.points {
                writer.write_f64::<LittleEndian>(p.x)?;
                writer.write_f64::<LittleEndian>(p.y)?;
            }
        }
        ShapeType::PointZ
        | ShapeType::PolyLineZ
        | ShapeType::PolygonZ
        | ShapeType::MultiPointZ
        | ShapeType::PointM
        | ShapeType::PolyLineM
        | ShapeType::PolygonM
        | ShapeType::MultiPointM
        | ShapeType::MultiPatch => {
            return Err(ShapefileError::UnsupportedShapeType(shape.shape_type.to_int()))
        }
    }
    Ok(())
}
