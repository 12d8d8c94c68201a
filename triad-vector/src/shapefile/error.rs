/*
This code is part of the ShpTriad Shapefile library.
Created: 16/10/2026
Last Modified: 16/10/2026
License: MIT
*/
use super::geometry::ShapeType;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShapefileError>;

#[derive(Debug, Error)]
pub enum ShapefileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file code at offset 0 was not 9994.
    #[error("not a Shapefile: expected file code 9994, found {found}")]
    Format { found: u32 },

    #[error("unsupported shape type code {0}")]
    UnsupportedShapeType(i32),

    #[error("cannot add field '{field}' after records have been added")]
    SchemaFrozen { field: String },

    #[error("value '{value}' does not fit in field '{field}' of width {width}")]
    FieldOverflow {
        field: String,
        width: u8,
        value: String,
    },

    #[error("record of type {found} cannot be added to a {expected} dataset")]
    ShapeTypeMismatch {
        expected: ShapeType,
        found: ShapeType,
    },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid field: {0}")]
    InvalidField(String),
}
