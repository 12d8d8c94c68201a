/*
This code is part of the ShpTriad Shapefile library.
Created: 16/10/2026
Last Modified: 16/10/2026
License: MIT

NOTE: Structures and functions for handling the Shapefile attribute table info
contained with the associated .dbf file.
*/
use super::error::{Result, ShapefileError};
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use std::fmt;

/// Longest field name a dBASE descriptor can hold.
pub const MAX_FIELD_NAME_LEN: usize = 10;

/// One attribute row, keyed by field name.
pub type Attributes = HashMap<String, FieldData>;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AttributeHeader {
    pub version: u8,
    pub year: u32,
    pub month: u8,
    pub day: u8,
    pub num_records: u32,
    pub bytes_in_header: u16,
    pub bytes_in_record: u16,
}

impl fmt::Display for AttributeHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "version: {}
last update: {:04}-{:02}-{:02}
num_records: {}
bytes_in_header: {}
bytes_in_record: {}",
            self.version,
            self.year,
            self.month,
            self.day,
            self.num_records,
            self.bytes_in_header,
            self.bytes_in_record
        )
    }
}

/// The dBASE type code of a field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FieldDataType {
    Numeric,
    Float,
    Character,
    Logical,
    Date,
    /// Any other code found in a file; decoded as text.
    Other(char),
}

impl FieldDataType {
    pub fn from_char(code: char) -> FieldDataType {
        match code {
            'N' => FieldDataType::Numeric,
            'F' => FieldDataType::Float,
            'C' => FieldDataType::Character,
            'L' => FieldDataType::Logical,
            'D' => FieldDataType::Date,
            c => FieldDataType::Other(c),
        }
    }

    pub fn to_char(&self) -> char {
        match self {
            FieldDataType::Numeric => 'N',
            FieldDataType::Float => 'F',
            FieldDataType::Character => 'C',
            FieldDataType::Logical => 'L',
            FieldDataType::Date => 'D',
            FieldDataType::Other(c) => *c,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldDataType::Numeric | FieldDataType::Float)
    }
}

/// A field value. The variant, not the declared field type, says what the
/// value is; the declared type decides how it is written.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    Null,
    Int(i64),
    Real(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
}

impl FieldData {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldData::Null)
    }

    fn as_f64(&self) -> Option<f64> {
        let v = match self {
            FieldData::Int(v) => *v as f64,
            FieldData::Real(v) => *v,
            FieldData::Text(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        if v.is_finite() {
            Some(v)
        } else {
            None
        }
    }

    /// The value as whole-number text, truncated toward zero. Reals beyond
    /// the i64 range keep all of their digits rather than saturating.
    fn as_integer_text(&self) -> Option<String> {
        let v = match self {
            FieldData::Int(v) => return Some(v.to_string()),
            FieldData::Text(s) => {
                if let Ok(v) = s.trim().parse::<i64>() {
                    return Some(v.to_string());
                }
                self.as_f64()?
            }
            _ => self.as_f64()?,
        };
        let v = v.trunc();
        if v >= i64::MIN as f64 && v < i64::MAX as f64 {
            Some((v as i64).to_string())
        } else {
            Some(format!("{:.0}", v))
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            FieldData::Bool(b) => Some(*b),
            FieldData::Int(v) => Some(*v != 0),
            FieldData::Real(v) => Some(*v != 0f64),
            FieldData::Text(s) => Some(is_true_code(s.trim())),
            _ => None,
        }
    }
}

impl fmt::Display for FieldData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldData::Null => write!(f, "null"),
            FieldData::Int(v) => write!(f, "{}", v),
            FieldData::Real(v) => write!(f, "{}", v),
            FieldData::Bool(v) => write!(f, "{}", v),
            FieldData::Text(v) => write!(f, "{}", v),
            FieldData::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeField {
    pub name: String,
    pub field_type: FieldDataType,
    pub field_length: u8,
    pub decimal_count: u8,
}

impl AttributeField {
    /// Creates a field, truncating the name to the 10 bytes a descriptor can hold.
    pub fn new(
        name: &str,
        field_type: FieldDataType,
        field_length: u8,
        decimal_count: u8,
    ) -> AttributeField {
        AttributeField {
            name: truncate_to_bytes(name, MAX_FIELD_NAME_LEN).to_string(),
            field_type,
            field_length,
            decimal_count,
        }
    }

    /// Decodes the raw bytes of this field from a .dbf row.
    pub fn decode(&self, raw: &[u8]) -> FieldData {
        decode_field(raw, self.field_type)
    }

    /// Encodes a value into exactly `field_length` bytes of row text.
    pub fn encode(&self, value: &FieldData) -> Result<String> {
        encode_field(value, self)
    }
}

fn is_true_code(s: &str) -> bool {
    matches!(s, "T" | "t" | "Y" | "y")
}

/// Returns the longest prefix of `s` no longer than `max` bytes that ends on a char boundary.
fn truncate_to_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Left-justifies `s` in `width` bytes. Padding by bytes keeps multi-byte text in its column.
fn pad_right(s: &str, width: usize) -> String {
    let mut out = String::with_capacity(width.max(s.len()));
    out.push_str(s);
    out.push_str(&" ".repeat(width.saturating_sub(s.len())));
    out
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = s[0..4].parse::<i32>().ok()?;
    let month = s[4..6].parse::<u32>().ok()?;
    let day = s[6..8].parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Decodes one field of a .dbf row.
///
/// Blank fields are null. Text that cannot be read as the declared type
/// is also null rather than an error.
pub fn decode_field(raw: &[u8], field_type: FieldDataType) -> FieldData {
    let text = String::from_utf8_lossy(raw);
    let value = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    if value.is_empty() {
        return FieldData::Null;
    }
    match field_type {
        FieldDataType::Numeric | FieldDataType::Float => {
            let parsed = if value.contains('.') {
                value.parse::<f64>().ok().map(FieldData::Real)
            } else {
                value.parse::<i64>().ok().map(FieldData::Int)
            };
            parsed.unwrap_or(FieldData::Null)
        }
        FieldDataType::Logical => FieldData::Bool(is_true_code(value)),
        FieldDataType::Date => {
            if value == "00000000" {
                return FieldData::Null;
            }
            parse_date(value).map_or(FieldData::Null, FieldData::Date)
        }
        FieldDataType::Character | FieldDataType::Other(_) => FieldData::Text(value.to_string()),
    }
}

/// Encodes one value for a .dbf row. The result is always exactly
/// `field.field_length` bytes long.
pub fn encode_field(value: &FieldData, field: &AttributeField) -> Result<String> {
    let width = field.field_length as usize;
    if value.is_null() {
        return Ok(" ".repeat(width));
    }
    let mismatch = || {
        ShapefileError::InvalidField(format!(
            "value '{}' cannot be stored in {} field '{}'",
            value,
            field.field_type.to_char(),
            field.name
        ))
    };
    let overflow = |s: String| ShapefileError::FieldOverflow {
        field: field.name.clone(),
        width: field.field_length,
        value: s,
    };
    match field.field_type {
        FieldDataType::Numeric | FieldDataType::Float => {
            let s = if field.decimal_count > 0 {
                let v = value.as_f64().ok_or_else(mismatch)?;
                format!("{:>w$.d$}", v, w = width, d = field.decimal_count as usize)
            } else {
                let v = value.as_integer_text().ok_or_else(mismatch)?;
                format!("{:>w$}", v, w = width)
            };
            if s.len() > width {
                return Err(overflow(s));
            }
            Ok(s)
        }
        FieldDataType::Logical => {
            let code = if value.as_bool().ok_or_else(mismatch)? { "T" } else { "F" };
            if width < 1 {
                return Err(overflow(code.to_string()));
            }
            Ok(pad_right(code, width))
        }
        FieldDataType::Date => match value {
            FieldData::Date(d) => {
                let s = format!("{:04}{:02}{:02}", d.year(), d.month(), d.day());
                if s.len() > width {
                    return Err(overflow(s));
                }
                Ok(pad_right(&s, width))
            }
            _ => Ok(" ".repeat(width)),
        },
        FieldDataType::Character | FieldDataType::Other(_) => {
            let text = value.to_string();
            Ok(pad_right(truncate_to_bytes(&text, width), width))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn field(field_type: FieldDataType, width: u8, decimals: u8) -> AttributeField {
        AttributeField::new("VALUE", field_type, width, decimals)
    }

    #[test]
    fn test_fixed_point_encoding() {
        let area = AttributeField::new("AREA", FieldDataType::Numeric, 10, 2);
        let s = area.encode(&FieldData::Real(100.0)).unwrap();
        assert_eq!(s, "    100.00");
        assert_eq!(area.decode(s.as_bytes()), FieldData::Real(100.0));
        assert_eq!(
            area.encode(&FieldData::Int(-3)).unwrap(),
            "     -3.00"
        );
    }

    #[test]
    fn test_integer_encoding() {
        let fid = field(FieldDataType::Numeric, 6, 0);
        assert_eq!(fid.encode(&FieldData::Int(42)).unwrap(), "    42");
        assert_eq!(fid.encode(&FieldData::Real(7.9)).unwrap(), "     7");
        assert_eq!(fid.encode(&FieldData::Text(" 15 ".to_string())).unwrap(), "    15");
        assert_eq!(fid.decode(b"    42"), FieldData::Int(42));
    }

    #[test]
    fn test_numeric_overflow() {
        let fid = field(FieldDataType::Numeric, 3, 0);
        match fid.encode(&FieldData::Int(12345)) {
            Err(ShapefileError::FieldOverflow { field, width, value }) => {
                assert_eq!(field, "VALUE");
                assert_eq!(width, 3);
                assert_eq!(value, "12345");
            }
            other => panic!("expected overflow, got {:?}", other),
        }
        let real = field(FieldDataType::Float, 5, 2);
        assert!(matches!(
            real.encode(&FieldData::Real(1000.0)),
            Err(ShapefileError::FieldOverflow { .. })
        ));
        assert_eq!(real.encode(&FieldData::Real(99.994)).unwrap(), "99.99");
    }

    #[test]
    fn test_huge_reals_overflow_integer_fields() {
        let big = AttributeField::new("BIG", FieldDataType::Numeric, 25, 0);
        match big.encode(&FieldData::Real(1e30)) {
            Err(ShapefileError::FieldOverflow { value, .. }) => {
                assert_eq!(value, "1000000000000000019884624838656");
            }
            other => panic!("expected overflow, got {:?}", other),
        }
        assert!(matches!(
            big.encode(&FieldData::Text("-4e40".to_string())),
            Err(ShapefileError::FieldOverflow { .. })
        ));
        let wide = AttributeField::new("WIDE", FieldDataType::Numeric, 40, 0);
        let s = wide.encode(&FieldData::Real(-1e30)).unwrap();
        assert_eq!(s.trim_start(), "-1000000000000000019884624838656");
        assert_eq!(
            big.encode(&FieldData::Real(-9.0e18)).unwrap().trim_start(),
            "-9000000000000000000"
        );
        assert!(matches!(
            big.encode(&FieldData::Real(f64::INFINITY)),
            Err(ShapefileError::InvalidField(_))
        ));
        assert!(matches!(
            field(FieldDataType::Numeric, 10, 2).encode(&FieldData::Real(f64::NAN)),
            Err(ShapefileError::InvalidField(_))
        ));
    }

    #[test]
    fn test_numeric_type_mismatch() {
        let fid = field(FieldDataType::Numeric, 6, 0);
        assert!(matches!(
            fid.encode(&FieldData::Text("abc".to_string())),
            Err(ShapefileError::InvalidField(_))
        ));
        assert!(fid.encode(&FieldData::Bool(true)).is_err());
    }

    #[test]
    fn test_null_is_blank() {
        for ft in [
            FieldDataType::Numeric,
            FieldDataType::Character,
            FieldDataType::Logical,
            FieldDataType::Date,
        ] {
            let f = field(ft, 8, 0);
            assert_eq!(f.encode(&FieldData::Null).unwrap(), "        ");
            assert_eq!(f.decode(b"        "), FieldData::Null);
        }
        assert_eq!(decode_field(b"\0\0\0", FieldDataType::Character), FieldData::Null);
    }

    #[test]
    fn test_numeric_decoding() {
        assert_eq!(decode_field(b"  3.25", FieldDataType::Float), FieldData::Real(3.25));
        assert_eq!(decode_field(b" -17", FieldDataType::Numeric), FieldData::Int(-17));
        assert_eq!(decode_field(b" 1.2.3", FieldDataType::Numeric), FieldData::Null);
        assert_eq!(decode_field(b"  n/a ", FieldDataType::Numeric), FieldData::Null);
    }

    #[test]
    fn test_logical() {
        let flag = field(FieldDataType::Logical, 1, 0);
        assert_eq!(flag.encode(&FieldData::Bool(true)).unwrap(), "T");
        assert_eq!(flag.encode(&FieldData::Bool(false)).unwrap(), "F");
        assert_eq!(flag.encode(&FieldData::Int(0)).unwrap(), "F");
        for code in [b"T", b"t", b"Y", b"y"] {
            assert_eq!(flag.decode(code), FieldData::Bool(true));
        }
        for code in [b"F", b"N", b"?"] {
            assert_eq!(flag.decode(code), FieldData::Bool(false));
        }
        assert_eq!(flag.decode(b" "), FieldData::Null);
    }

    #[test]
    fn test_dates() {
        let d = field(FieldDataType::Date, 8, 0);
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(d.encode(&FieldData::Date(date)).unwrap(), "20240229");
        assert_eq!(d.decode(b"20240229"), FieldData::Date(date));
        assert_eq!(d.decode(b"00000000"), FieldData::Null);
        assert_eq!(d.decode(b"20230229"), FieldData::Null);
        assert_eq!(d.decode(b"2024-1-1"), FieldData::Null);
        // only calendar dates are written as dates
        assert_eq!(d.encode(&FieldData::Text("20240101".to_string())).unwrap(), "        ");
        assert_eq!(d.encode(&FieldData::Int(5)).unwrap(), "        ");
    }

    #[test]
    fn test_character() {
        let name = field(FieldDataType::Character, 5, 0);
        assert_eq!(name.encode(&FieldData::Text("A".to_string())).unwrap(), "A    ");
        assert_eq!(
            name.encode(&FieldData::Text("Kilimanjaro".to_string())).unwrap(),
            "Kilim"
        );
        assert_eq!(name.encode(&FieldData::Int(12)).unwrap(), "12   ");
        assert_eq!(name.decode(b"  Kilim "), FieldData::Text("Kilim".to_string()));

        // never split a multi-byte character
        let s = name.encode(&FieldData::Text("Zürich".to_string())).unwrap();
        assert_eq!(s, "Züri");
        assert_eq!(s.len(), 5);
        let narrow = field(FieldDataType::Character, 2, 0);
        assert_eq!(narrow.encode(&FieldData::Text("Zü".to_string())).unwrap(), "Z ");

        let other = field(FieldDataType::Other('M'), 4, 0);
        assert_eq!(other.decode(b"memo"), FieldData::Text("memo".to_string()));
    }

    #[test]
    fn test_field_names_and_codes() {
        let f = AttributeField::new("POPULATION_2020", FieldDataType::Numeric, 10, 0);
        assert_eq!(f.name, "POPULATION");
        for c in ['N', 'F', 'C', 'L', 'D', 'M'] {
            assert_eq!(FieldDataType::from_char(c).to_char(), c);
        }
        assert!(FieldDataType::Float.is_numeric());
        assert!(!FieldDataType::Date.is_numeric());
    }
}
