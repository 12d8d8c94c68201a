/*
This code is part of the ShpTriad Shapefile library.
Created: 16/10/2026
Last Modified: 16/10/2026
License: MIT

NOTE: Geometry records and extents for the .shp/.shx files.
*/
use super::error::{Result, ShapefileError};
use std::fmt;
use triad_common::structures::Point2D;

/// A 2-D extent with optional z and measure ranges.
///
/// A freshly created box is all zeros, and a minimum that is exactly zero
/// counts as unset: the next `update` replaces it regardless of the incoming
/// value. Maxima have no such rule and only grow. A true zero extremum is
/// therefore not stably tracked.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
    pub m_min: f64,
    pub m_max: f64,
}

impl BoundingBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> BoundingBox {
        BoundingBox {
            x_min,
            y_min,
            x_max,
            y_max,
            ..Default::default()
        }
    }

    /// Folds one point into the extent.
    pub fn update(&mut self, x: f64, y: f64, z: Option<f64>, m: Option<f64>) {
        if x < self.x_min || self.x_min == 0f64 {
            self.x_min = x;
        }
        if y < self.y_min || self.y_min == 0f64 {
            self.y_min = y;
        }
        if x > self.x_max {
            self.x_max = x;
        }
        if y > self.y_max {
            self.y_max = y;
        }
        if let Some(z) = z {
            if z < self.z_min || self.z_min == 0f64 {
                self.z_min = z;
            }
            if z > self.z_max {
                self.z_max = z;
            }
        }
        if let Some(m) = m {
            if m < self.m_min || self.m_min == 0f64 {
                self.m_min = m;
            }
            if m > self.m_max {
                self.m_max = m;
            }
        }
    }

    pub fn update_point(&mut self, p: &Point2D) {
        self.update(p.x, p.y, None, None);
    }

    /// True while the x range still holds its zeroed default.
    pub fn is_unset(&self) -> bool {
        self.x_min == 0f64 && self.x_max == 0f64
    }

    pub fn from_points(points: &[Point2D]) -> BoundingBox {
        let mut bb = BoundingBox::default();
        for p in points {
            bb.update_point(p);
        }
        bb
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "({}, {}) - ({}, {})",
            self.x_min, self.y_min, self.x_max, self.y_max
        )
    }
}

/// One geometry record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Shape {
    pub shape_type: ShapeType,
    pub points: Vec<Point2D>,
    /// Index into `points` where each part (ring or line) begins.
    pub parts: Vec<i32>,
    pub bbox: BoundingBox,
    pub z_array: Vec<f64>,
    pub m_array: Vec<f64>,
}

impl Shape {
    /// Shape constructor method.
    pub fn new(shape_type: ShapeType) -> Shape {
        Shape {
            shape_type,
            ..Default::default()
        }
    }

    /// A point shape at (x, y).
    pub fn point(x: f64, y: f64) -> Shape {
        let mut sh = Shape::new(ShapeType::Point);
        sh.add_point(Point2D::new(x, y));
        sh
    }

    /// A single-part polyline or polygon.
    pub fn with_part(shape_type: ShapeType, points: &[Point2D]) -> Shape {
        let mut sh = Shape::new(shape_type);
        sh.add_part(points);
        sh
    }

    /// Adds a single Point2D to the Shape's points array.
    pub fn add_point(&mut self, p: Point2D) {
        self.points.push(p);
        self.bbox.update_point(&p);
    }

    /// Adds a part of Point2Ds to the Shape.
    pub fn add_part(&mut self, points: &[Point2D]) {
        self.parts.push(self.points.len() as i32);
        for p in points {
            self.add_point(*p);
        }
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn num_parts(&self) -> usize {
        self.parts.len()
    }

    pub fn has_m_data(&self) -> bool {
        !self.m_array.is_empty()
    }

    /// The extent to write: the shape's own box, or one computed from its
    /// points when the box was never filled in.
    pub fn effective_bbox(&self) -> BoundingBox {
        if self.bbox.is_unset() {
            return BoundingBox::from_points(&self.points);
        }
        self.bbox
    }

    /// Returns the length of the record content in bytes, including the
    /// 4-byte shape type but not the 8-byte record header.
    pub fn content_length(&self) -> usize {
        let parts = self.parts.len();
        let points = self.points.len();
        let m_len = if self.has_m_data() { 16 + 8 * points } else { 0 };
        4 + match self.shape_type {
            ShapeType::Null => 0,
            ShapeType::Point => 16,
            ShapeType::MultiPoint => 36 + 16 * points,
            ShapeType::PolyLine | ShapeType::Polygon => 40 + 4 * parts + 16 * points,
            ShapeType::PointM => 24,
            ShapeType::MultiPointM => 52 + 24 * points,
            ShapeType::PolyLineM | ShapeType::PolygonM => 56 + 4 * parts + 24 * points,
            ShapeType::PointZ => 24 + if self.has_m_data() { 8 } else { 0 },
            ShapeType::MultiPointZ => 52 + 24 * points + m_len,
            ShapeType::PolyLineZ | ShapeType::PolygonZ => 56 + 4 * parts + 24 * points + m_len,
            // part types are one i32 per part
            ShapeType::MultiPatch => 56 + 8 * parts + 24 * points + m_len,
        }
    }

    /// Checks the part and vertex structure against the shape type.
    pub fn validate(&self) -> Result<()> {
        match self.shape_type.base_shape_type() {
            ShapeType::Null => {
                if !self.points.is_empty() || !self.parts.is_empty() {
                    return Err(ShapefileError::InvalidGeometry(format!(
                        "a null shape cannot hold vertices, found {}",
                        self.points.len()
                    )));
                }
            }
            ShapeType::Point => {
                if self.points.len() != 1 {
                    return Err(ShapefileError::InvalidGeometry(format!(
                        "a point shape needs exactly one vertex, found {}",
                        self.points.len()
                    )));
                }
            }
            ShapeType::PolyLine | ShapeType::Polygon | ShapeType::MultiPatch => {
                if self.points.is_empty() && self.parts.is_empty() {
                    return Ok(());
                }
                if self.parts.first() != Some(&0) {
                    return Err(ShapefileError::InvalidGeometry(
                        "the first part must start at vertex 0".to_string(),
                    ));
                }
                for w in self.parts.windows(2) {
                    if w[1] <= w[0] {
                        return Err(ShapefileError::InvalidGeometry(format!(
                            "part indices must be strictly increasing ({} then {})",
                            w[0], w[1]
                        )));
                    }
                }
                if let Some(&last) = self.parts.last() {
                    if last as usize >= self.points.len() {
                        return Err(ShapefileError::InvalidGeometry(format!(
                            "part index {} is out of range for {} vertices",
                            last,
                            self.points.len()
                        )));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "shape_type: {}
bbox: {}
num_parts: {}
num_points: {}
parts: {:?}",
            self.shape_type,
            self.effective_bbox(),
            self.parts.len(),
            self.points.len(),
            self.parts
        )
    }
}

#[repr(u16)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ShapeType {
    #[default]
    Null = 0,
    Point = 1,
    PolyLine = 3,
    Polygon = 5,
    MultiPoint = 8,
    PointZ = 11,
    PolyLineZ = 13,
    PolygonZ = 15,
    MultiPointZ = 18,
    PointM = 21,
    PolyLineM = 23,
    PolygonM = 25,
    MultiPointM = 28,
    MultiPatch = 31,
}

impl ShapeType {
    pub fn from_int(value: i32) -> Option<ShapeType> {
        match value {
            0 => Some(ShapeType::Null),
            1 => Some(ShapeType::Point),
            3 => Some(ShapeType::PolyLine),
            5 => Some(ShapeType::Polygon),
            8 => Some(ShapeType::MultiPoint),
            11 => Some(ShapeType::PointZ),
            13 => Some(ShapeType::PolyLineZ),
            15 => Some(ShapeType::PolygonZ),
            18 => Some(ShapeType::MultiPointZ),
            21 => Some(ShapeType::PointM),
            23 => Some(ShapeType::PolyLineM),
            25 => Some(ShapeType::PolygonM),
            28 => Some(ShapeType::MultiPointM),
            31 => Some(ShapeType::MultiPatch),
            _ => None,
        }
    }

    pub fn to_int(&self) -> i32 {
        *self as i32
    }

    pub fn base_shape_type(&self) -> ShapeType {
        match self {
            ShapeType::Null => ShapeType::Null,
            ShapeType::Point | ShapeType::PointZ | ShapeType::PointM => ShapeType::Point,
            ShapeType::PolyLine | ShapeType::PolyLineZ | ShapeType::PolyLineM => {
                ShapeType::PolyLine
            }
            ShapeType::Polygon | ShapeType::PolygonZ | ShapeType::PolygonM => ShapeType::Polygon,
            ShapeType::MultiPoint | ShapeType::MultiPointZ | ShapeType::MultiPointM => {
                ShapeType::MultiPoint
            }
            ShapeType::MultiPatch => ShapeType::MultiPatch,
        }
    }

    pub fn dimension(&self) -> ShapeTypeDimension {
        match self {
            ShapeType::Null
            | ShapeType::MultiPoint
            | ShapeType::Point
            | ShapeType::Polygon
            | ShapeType::PolyLine => ShapeTypeDimension::XY,
            ShapeType::MultiPointM
            | ShapeType::PointM
            | ShapeType::PolygonM
            | ShapeType::PolyLineM => ShapeTypeDimension::Measure,
            ShapeType::MultiPointZ
            | ShapeType::PointZ
            | ShapeType::PolygonZ
            | ShapeType::PolyLineZ
            | ShapeType::MultiPatch => ShapeTypeDimension::Z,
        }
    }

    /// Whether records of this type can be emitted by the writer.
    pub fn is_writable(&self) -> bool {
        self.dimension() == ShapeTypeDimension::XY
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShapeTypeDimension {
    XY,
    Measure,
    Z,
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let printable = match *self {
            ShapeType::Null => "Null",
            ShapeType::Point => "Point",
            ShapeType::PolyLine => "PolyLine",
            ShapeType::Polygon => "Polygon",
            ShapeType::MultiPoint => "MultiPoint",
            ShapeType::PointZ => "PointZ",
            ShapeType::PolyLineZ => "PolyLineZ",
            ShapeType::PolygonZ => "PolygonZ",
            ShapeType::MultiPointZ => "MultiPointZ",
            ShapeType::PointM => "PointM",
            ShapeType::PolyLineM => "PolyLineM",
            ShapeType::PolygonM => "PolygonM",
            ShapeType::MultiPointM => "MultiPointM",
            ShapeType::MultiPatch => "MultiPatch",
        };
        write!(f, "{}", printable)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    fn square() -> Vec<Point2D> {
        vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(10.0, 10.0),
            Point2D::new(0.0, 10.0),
            Point2D::new(0.0, 0.0),
        ]
    }

    #[test]
    fn test_bbox_tracks_extremes() {
        let mut bb = BoundingBox::default();
        for (x, y) in [(3.0, 4.0), (-1.0, 7.5), (2.0, -6.0), (9.0, 1.0)] {
            bb.update(x, y, None, None);
        }
        assert_eq!(bb.x_min, -1.0);
        assert_eq!(bb.y_min, -6.0);
        assert_eq!(bb.x_max, 9.0);
        assert_eq!(bb.y_max, 7.5);
        assert_eq!(bb.z_min, 0.0);
        assert_eq!(bb.m_max, 0.0);
    }

    #[test]
    fn test_bbox_zero_minimum_is_overwritten() {
        let mut bb = BoundingBox::default();
        bb.update(0.0, 0.0, None, None);
        bb.update(5.0, 5.0, None, None);
        // the true minimum (0, 0) is lost
        assert_eq!(bb.x_min, 5.0);
        assert_eq!(bb.y_min, 5.0);
        assert_eq!(bb.x_max, 5.0);

        // maxima start at zero, so all-negative input never raises them
        let mut bb = BoundingBox::default();
        bb.update(-3.0, -2.0, None, None);
        bb.update(-8.0, -1.0, None, None);
        assert_eq!(bb.x_min, -8.0);
        assert_eq!(bb.y_min, -2.0);
        assert_eq!(bb.x_max, 0.0);
        assert_eq!(bb.y_max, 0.0);
    }

    #[test]
    fn test_bbox_z_and_m() {
        let mut bb = BoundingBox::default();
        bb.update(1.0, 1.0, Some(12.0), Some(3.0));
        bb.update(2.0, 2.0, Some(10.0), None);
        bb.update(3.0, 3.0, None, Some(7.0));
        assert_eq!((bb.z_min, bb.z_max), (10.0, 12.0));
        assert_eq!((bb.m_min, bb.m_max), (3.0, 7.0));
    }

    #[test]
    fn test_content_length() {
        assert_eq!(Shape::new(ShapeType::Null).content_length(), 4);
        assert_eq!(Shape::point(1.0, 2.0).content_length(), 20);
        let poly = Shape::with_part(ShapeType::Polygon, &square());
        assert_eq!(poly.content_length(), 44 + 4 + 16 * 5);
        let mut mp = Shape::new(ShapeType::MultiPoint);
        mp.add_point(Point2D::new(1.0, 1.0));
        mp.add_point(Point2D::new(2.0, 2.0));
        assert_eq!(mp.content_length(), 40 + 32);
        let mut pz = Shape::point(1.0, 2.0);
        pz.shape_type = ShapeType::PointZ;
        pz.z_array.push(3.0);
        assert_eq!(pz.content_length(), 28);
        pz.m_array.push(4.0);
        assert_eq!(pz.content_length(), 36);
    }

    #[test]
    fn test_effective_bbox() {
        let poly = Shape::with_part(ShapeType::Polygon, &square());
        assert_eq!(poly.bbox, BoundingBox::new(0.0, 0.0, 10.0, 10.0));

        let mut line = Shape::new(ShapeType::PolyLine);
        line.parts.push(0);
        line.points = vec![Point2D::new(0.0, 0.0), Point2D::new(5.0, 5.0)];
        assert!(line.bbox.is_unset());
        // the zero minimum is forgotten once (5, 5) arrives
        assert_eq!(line.effective_bbox(), BoundingBox::new(5.0, 5.0, 5.0, 5.0));

        line.bbox = BoundingBox::new(0.0, 0.0, 5.0, 5.0);
        assert_eq!(line.effective_bbox(), BoundingBox::new(0.0, 0.0, 5.0, 5.0));
    }

    #[test]
    fn test_validate_parts() {
        let mut line = Shape::new(ShapeType::PolyLine);
        line.add_part(&square()[0..2]);
        line.add_part(&square()[2..5]);
        assert_eq!(line.parts, vec![0, 2]);
        assert!(line.validate().is_ok());

        line.parts = vec![0, 2, 2];
        assert!(matches!(line.validate(), Err(ShapefileError::InvalidGeometry(_))));
        line.parts = vec![1];
        assert!(line.validate().is_err());
        line.parts = vec![0, 5];
        assert!(line.validate().is_err());

        assert!(Shape::new(ShapeType::PolyLine).validate().is_ok());
        assert!(Shape::new(ShapeType::Point).validate().is_err());
        assert!(Shape::new(ShapeType::Null).validate().is_ok());
        let mut null = Shape::new(ShapeType::Null);
        null.add_point(Point2D::new(4.0, 5.0));
        assert!(matches!(null.validate(), Err(ShapefileError::InvalidGeometry(_))));
    }

    #[test]
    fn test_shape_type_codes() {
        let codes = [0, 1, 3, 5, 8, 11, 13, 15, 18, 21, 23, 25, 28, 31];
        for code in codes {
            let st = ShapeType::from_int(code).unwrap();
            assert_eq!(st.to_int(), code);
        }
        assert_eq!(ShapeType::from_int(2), None);
        assert_eq!(ShapeType::from_int(-1), None);
        assert_eq!(ShapeType::PolygonZ.base_shape_type(), ShapeType::Polygon);
        assert!(ShapeType::MultiPoint.is_writable());
        assert!(!ShapeType::PointM.is_writable());
        assert!(!ShapeType::MultiPatch.is_writable());
        assert_eq!(ShapeType::PolyLineM.to_string(), "PolyLineM");
    }

    fn nonzero() -> impl Strategy<Value = f64> {
        prop_oneof![-1.0e9f64..-1.0e-9, 1.0e-9f64..1.0e9]
    }

    fn extremes(values: &[f64]) -> (f64, f64) {
        values.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
    }

    proptest! {
        // Without zero inputs the minima are exact. Maxima start at zero,
        // so they never fall below it.
        #[test]
        fn test_bbox_matches_true_extremes(
            points in prop::collection::vec((nonzero(), nonzero(), nonzero(), nonzero()), 1..64)
        ) {
            let mut bb = BoundingBox::default();
            for &(x, y, z, m) in &points {
                bb.update(x, y, Some(z), Some(m));
            }
            let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
            let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
            let zs: Vec<f64> = points.iter().map(|p| p.2).collect();
            let ms: Vec<f64> = points.iter().map(|p| p.3).collect();
            for (values, lo, hi) in [
                (&xs, bb.x_min, bb.x_max),
                (&ys, bb.y_min, bb.y_max),
                (&zs, bb.z_min, bb.z_max),
                (&ms, bb.m_min, bb.m_max),
            ] {
                let (min, max) = extremes(values);
                prop_assert_eq!(lo, min);
                prop_assert_eq!(hi, max.max(0.0));
            }
        }

        #[test]
        fn test_bbox_from_points_agrees_with_update(
            coords in prop::collection::vec((nonzero(), nonzero()), 1..64)
        ) {
            let points: Vec<Point2D> = coords.iter().map(|&c| Point2D::from(c)).collect();
            let mut shape = Shape::new(ShapeType::MultiPoint);
            for p in &points {
                shape.add_point(*p);
            }
            prop_assert_eq!(shape.bbox, BoundingBox::from_points(&points));
        }
    }
}
