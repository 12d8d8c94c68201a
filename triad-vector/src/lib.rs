/*
This code is part of the ShpTriad Shapefile library.
Created: 16/10/2026
Last Modified: 16/10/2026
License: MIT
*/

pub mod shapefile;

pub use crate::shapefile::attributes::{
    decode_field, encode_field, AttributeField, AttributeHeader, Attributes, FieldData,
    FieldDataType,
};
pub use crate::shapefile::error::{Result, ShapefileError};
pub use crate::shapefile::geometry::{BoundingBox, Shape, ShapeType, ShapeTypeDimension};
pub use crate::shapefile::{base_name, Reader, Record, ShapefileHeader, Writer};
pub use triad_common::structures::Point2D;
