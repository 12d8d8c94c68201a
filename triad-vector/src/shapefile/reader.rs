/*
This code is part of the ShpTriad Shapefile library.
Created: 16/10/2026
Last Modified: 16/10/2026
License: MIT
*/
use super::attributes::{AttributeField, AttributeHeader, Attributes, FieldDataType};
use super::error::{Result, ShapefileError};
use super::geometry::{BoundingBox, Shape, ShapeType, ShapeTypeDimension};
use super::{base_name, sibling_file, Record, ShapefileHeader, HEADER_LENGTH};
use std::fs;
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use triad_common::structures::Point2D;
use triad_common::utils::{ByteOrderReader, Endianness};

type Bor = ByteOrderReader<Cursor<Vec<u8>>>;

/// Size of one .dbf field descriptor.
const FIELD_DESCRIPTOR_LENGTH: usize = 32;
const DELETED_ROW: u8 = b'*';
const FIELD_TERMINATOR: u8 = 0x0d;

/// An in-memory copy of an existing Shapefile dataset.
///
/// ```no_run
/// use triad_vector::Reader;
///
/// let input = Reader::open("rivers.shp")?;
/// for record in &input.records {
///     println!("{} {:?}", record.shape.shape_type, record.attributes.get("NAME"));
/// }
/// # Ok::<(), triad_vector::ShapefileError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Reader {
    pub file_name: PathBuf,
    pub header: ShapefileHeader,
    pub records: Vec<Record>,
    /// Present only when a .dbf file accompanied the .shp.
    pub attribute_header: Option<AttributeHeader>,
    pub fields: Vec<AttributeField>,
    pub projection: String,
    unread_bytes: usize,
}

impl Reader {
    /// Reads `<stem>.shp` and, when they exist, `<stem>.dbf` and `<stem>.prj`.
    pub fn open<P: AsRef<Path>>(file_name: P) -> Result<Reader> {
        let stem = base_name(file_name);
        let mut reader = Reader {
            file_name: sibling_file(&stem, "shp"),
            ..Default::default()
        };
        reader.read_geometries()?;
        reader.read_projection(&sibling_file(&stem, "prj"))?;
        reader.read_attributes(&sibling_file(&stem, "dbf"))?;
        Ok(reader)
    }

    pub fn shape_type(&self) -> ShapeType {
        self.header.shape_type
    }

    /// The dataset extent as stored in the .shp header.
    pub fn bbox(&self) -> BoundingBox {
        self.header.bbox()
    }

    pub fn num_records(&self) -> usize {
        self.records.len()
    }

    /// Returns the Record for a specified index, starting at zero.
    pub fn get_record(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn get_field_num(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn get_total_num_parts(&self) -> usize {
        self.records.iter().map(|r| r.shape.num_parts()).sum()
    }

    pub fn get_total_num_points(&self) -> usize {
        self.records.iter().map(|r| r.shape.num_points()).sum()
    }

    /// Bytes of the .shp file lying past the length declared in its header.
    /// These are never decoded.
    pub fn unread_bytes(&self) -> usize {
        self.unread_bytes
    }

    /// Returns `(geometry records, attribute rows)` when the .dbf declares a
    /// different number of rows than the .shp holds.
    pub fn row_count_mismatch(&self) -> Option<(usize, usize)> {
        let header = self.attribute_header.as_ref()?;
        let rows = header.num_records as usize;
        if rows == self.records.len() {
            return None;
        }
        Some((self.records.len(), rows))
    }

    fn read_geometries(&mut self) -> Result<()> {
        let buffer = fs::read(&self.file_name)?;
        let mut bor = ByteOrderReader::new(Cursor::new(buffer), Endianness::BigEndian)?;
        self.header = ShapefileHeader::read(&mut bor)?;

        let end = self.header.byte_length().min(bor.len());
        if end < self.header.byte_length() {
            warn!(
                "{}: header declares {} bytes but the file holds {}",
                self.file_name.display(),
                self.header.byte_length(),
                bor.len()
            );
        }
        self.unread_bytes = bor.len() - end;
        if self.unread_bytes > 0 {
            warn!(
                "{}: ignoring {} bytes past the declared file length of {} bytes",
                self.file_name.display(),
                self.unread_bytes,
                self.header.byte_length()
            );
        }
        bor.seek(HEADER_LENGTH)?;
        while bor.pos() < end {
            bor.set_byte_order(Endianness::BigEndian);
            let _record_number = bor.read_u32()?;
            let content_length = bor.read_u32()? as usize * 2; // in bytes
            let record_end = bor.pos() + content_length;

            bor.set_byte_order(Endianness::LittleEndian);
            let shape = read_shape(&mut bor, content_length)?;
            // the declared length frames the record, whatever the body held
            bor.seek(record_end)?;
            self.records.push(Record::new(shape, Attributes::new()));
        }
        debug!(
            "{}: read {} {} records",
            self.file_name.display(),
            self.records.len(),
            self.header.shape_type
        );
        Ok(())
    }

    fn read_projection(&mut self, prj_file: &Path) -> Result<()> {
        match fs::read_to_string(prj_file) {
            Ok(text) => self.projection = text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Projection file not located: {}", prj_file.display())
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn read_attributes(&mut self, dbf_file: &Path) -> Result<()> {
        let buffer = match fs::read(dbf_file) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No attribute table found at {}", dbf_file.display());
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let mut bor = ByteOrderReader::new(Cursor::new(buffer), Endianness::LittleEndian)?;
        if bor.is_empty() {
            warn!("{} is empty; records keep no attributes", dbf_file.display());
            return Ok(());
        }

        let header = AttributeHeader {
            version: bor.read_u8()?,
            year: 1900u32 + bor.read_u8()? as u32,
            month: bor.read_u8()?,
            day: bor.read_u8()?,
            num_records: bor.read_u32()?,
            bytes_in_header: bor.read_u16()?,
            bytes_in_record: bor.read_u16()?,
        };
        // 20 reserved bytes
        bor.seek(32)?;

        // read the field descriptors
        let header_len = header.bytes_in_header as usize;
        let mut fields = vec![];
        while bor.pos() + 1 < header_len
            && bor.remaining() >= FIELD_DESCRIPTOR_LENGTH
            && bor.peek_u8()? != FIELD_TERMINATOR
        {
            fields.push(read_field_descriptor(&mut bor)?);
        }

        let record_len = header.bytes_in_record as usize;
        let rows_in_file = if record_len == 0 {
            0
        } else {
            bor.len().saturating_sub(header_len) / record_len
        };
        let num_rows = (header.num_records as usize)
            .min(self.records.len())
            .min(rows_in_file);

        for i in 0..num_rows {
            // rows after a deleted one keep their place
            bor.seek(header_len + i * record_len)?;
            if bor.read_u8()? == DELETED_ROW {
                continue;
            }
            let mut attributes = Attributes::with_capacity(fields.len());
            for field in &fields {
                let raw = bor.read_bytes(field.field_length as usize)?;
                attributes.insert(field.name.clone(), field.decode(&raw));
            }
            self.records[i].attributes = attributes;
        }

        if header.num_records as usize != self.records.len() {
            warn!(
                "{} has {} attribute rows for {} geometry records",
                dbf_file.display(),
                header.num_records,
                self.records.len()
            );
        }
        if num_rows < (header.num_records as usize).min(self.records.len()) {
            warn!(
                "{} is truncated: only {} complete rows",
                dbf_file.display(),
                rows_in_file
            );
        }

        self.fields = fields;
        self.attribute_header = Some(header);
        Ok(())
    }
}

fn read_field_descriptor(bor: &mut Bor) -> Result<AttributeField> {
    let raw_name = bor.read_utf8(11)?;
    let name = raw_name.split('\0').next().unwrap_or_default().trim().to_string();
    let field_type = FieldDataType::from_char(char::from(bor.read_u8()?));
    // field data address
    bor.inc_pos(4)?;
    let field_length = bor.read_u8()?;
    let decimal_count = bor.read_u8()?;
    // reserved bytes
    bor.inc_pos(14)?;
    Ok(AttributeField {
        name,
        field_type,
        field_length,
        decimal_count,
    })
}

/// Reads a non-negative count, refusing values that could not fit in the
/// rest of the record.
fn read_count(bor: &mut Bor, bytes_per_item: usize, what: &str) -> Result<usize> {
    let n = bor.read_i32()?;
    if n < 0 || n as usize * bytes_per_item > bor.remaining() {
        return Err(ShapefileError::InvalidGeometry(format!(
            "record at byte {} declares {} {}",
            bor.pos(),
            n,
            what
        )));
    }
    Ok(n as usize)
}

fn read_bounds(bor: &mut Bor) -> Result<BoundingBox> {
    Ok(BoundingBox::new(
        bor.read_f64()?,
        bor.read_f64()?,
        bor.read_f64()?,
        bor.read_f64()?,
    ))
}

fn read_points(bor: &mut Bor, n: usize) -> Result<Vec<Point2D>> {
    let mut points = Vec::with_capacity(n);
    for _ in 0..n {
        points.push(Point2D::new(bor.read_f64()?, bor.read_f64()?));
    }
    Ok(points)
}

fn read_values(bor: &mut Bor, n: usize) -> Result<Vec<f64>> {
    let mut values = Vec::with_capacity(n);
    for _ in 0..n {
        values.push(bor.read_f64()?);
    }
    Ok(values)
}

fn read_parts(bor: &mut Bor, n: usize) -> Result<Vec<i32>> {
    let mut parts = Vec::with_capacity(n);
    for _ in 0..n {
        parts.push(bor.read_i32()?);
    }
    Ok(parts)
}

/// Reads a (min, max) range followed by one value per point.
fn read_range(bor: &mut Bor, n: usize) -> Result<(f64, f64, Vec<f64>)> {
    let min = bor.read_f64()?;
    let max = bor.read_f64()?;
    Ok((min, max, read_values(bor, n)?))
}

/// Decodes one record body, starting at its shape type. `content_length`
/// is the declared body size in bytes and decides whether the optional
/// measures of a Z record are present.
fn read_shape(bor: &mut Bor, content_length: usize) -> Result<Shape> {
    let code = bor.read_i32()?;
    let shape_type = ShapeType::from_int(code).ok_or(ShapefileError::UnsupportedShapeType(code))?;
    let mut shape = Shape::new(shape_type);

    match shape_type {
        ShapeType::Null => {}

        ShapeType::Point | ShapeType::PointM | ShapeType::PointZ => {
            shape.points = read_points(bor, 1)?;
            if shape_type == ShapeType::PointZ {
                shape.z_array.push(bor.read_f64()?);
            }
            // PointZ carries a measure only when its record is 36 bytes
            if shape_type == ShapeType::PointM
                || (shape_type == ShapeType::PointZ && content_length >= 36)
            {
                shape.m_array.push(bor.read_f64()?);
            }
        }

        ShapeType::PolyLine
        | ShapeType::Polygon
        | ShapeType::PolyLineM
        | ShapeType::PolygonM
        | ShapeType::PolyLineZ
        | ShapeType::PolygonZ => {
            shape.bbox = read_bounds(bor)?;
            let num_parts = read_count(bor, 4, "parts")?;
            let num_points = read_count(bor, 16, "points")?;
            shape.parts = read_parts(bor, num_parts)?;
            shape.points = read_points(bor, num_points)?;
            let length_without_m = 44 + 4 * num_parts + 16 * num_points;
            read_z_and_m(bor, &mut shape, content_length, length_without_m)?;
        }

        ShapeType::MultiPoint | ShapeType::MultiPointM | ShapeType::MultiPointZ => {
            shape.bbox = read_bounds(bor)?;
            let num_points = read_count(bor, 16, "points")?;
            shape.points = read_points(bor, num_points)?;
            let length_without_m = 40 + 16 * num_points;
            read_z_and_m(bor, &mut shape, content_length, length_without_m)?;
        }

        ShapeType::MultiPatch => return Err(ShapefileError::UnsupportedShapeType(code)),
    }
    Ok(shape)
}

/// Reads the z and measure blocks that trail the xy body of a multi-vertex
/// record. `xy_length` is the record length up to the end of the points.
fn read_z_and_m(
    bor: &mut Bor,
    shape: &mut Shape,
    content_length: usize,
    xy_length: usize,
) -> Result<()> {
    let n = shape.points.len();
    let block_length = 16 + 8 * n;
    let mut has_m = shape.shape_type.dimension() == ShapeTypeDimension::Measure;
    if shape.shape_type.dimension() == ShapeTypeDimension::Z {
        let (z_min, z_max, z_array) = read_range(bor, n)?;
        shape.bbox.z_min = z_min;
        shape.bbox.z_max = z_max;
        shape.z_array = z_array;
        // measures are optional in Z records
        has_m = content_length >= xy_length + 2 * block_length;
    }
    if has_m {
        let (m_min, m_max, m_array) = read_range(bor, n)?;
        shape.bbox.m_min = m_min;
        shape.bbox.m_max = m_max;
        shape.m_array = m_array;
    }
    Ok(())
}
