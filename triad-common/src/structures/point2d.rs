/*
This code is part of the ShpTriad Shapefile library.
Created: 16/10/2026
Last Modified: 16/10/2026
License: MIT
*/
use std::fmt;

/// A 2-D point, with x and y fields.
#[derive(Default, Copy, Clone, Debug, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl fmt::Display for Point2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(x: {}, y: {})", self.x, self.y)
    }
}

impl Point2D {
    /// Creates a new Point2D,
    pub fn new(x: f64, y: f64) -> Point2D {
        Point2D { x, y }
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(xy: (f64, f64)) -> Point2D {
        Point2D::new(xy.0, xy.1)
    }
}
