//! Typed parameter values and their text encoding.
//!
//! Instruction parameters travel as comma-separated ASCII fields inside each
//! fixed 32-byte record. This module implements the per-type parse/format
//! rules and the two-state point reference that gains its coordinate only
//! after the resolver has seen the point table.

use serde::Serialize;

use crate::error::ConversionError;
use crate::opcode::ParamType;

/// A 2-D point from the program's point table.
///
/// Stored on the wire as two unsigned 16-bit values with one implied decimal
/// digit (raw / 10.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Construct a point from its raw fixed-point wire values.
    pub fn from_raw(raw_x: u16, raw_y: u16) -> Self {
        Self {
            x: f64::from(raw_x) / 10.0,
            y: f64::from(raw_y) / 10.0,
        }
    }
}

/// Reference into the point table.
///
/// A reference starts out unresolved, carrying only the index parsed from the
/// parameter text. The resolver binds it to its coordinate once the point
/// table is known; only the resolved state exposes the point, so reading a
/// coordinate too early is unrepresentable rather than a runtime surprise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PointRef {
    /// Index parsed from the wire, not yet checked against the point table.
    Unresolved(usize),
    /// Index bound to its coordinate by the resolver.
    Resolved { index: usize, point: Point },
}

impl PointRef {
    /// Create an unresolved reference to `index`.
    pub fn new(index: usize) -> Self {
        Self::Unresolved(index)
    }

    /// The referenced point-table index, bound or not.
    pub fn index(&self) -> usize {
        match *self {
            Self::Unresolved(index) | Self::Resolved { index, .. } => index,
        }
    }

    /// The bound coordinate, or `None` before resolution.
    pub fn point(&self) -> Option<Point> {
        match *self {
            Self::Unresolved(_) => None,
            Self::Resolved { point, .. } => Some(point),
        }
    }

    /// Whether the reference has been bound to a coordinate.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    /// Bind the reference to its coordinate.
    pub fn bind(&mut self, point: Point) {
        *self = Self::Resolved {
            index: self.index(),
            point,
        };
    }
}

/// A single typed parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ParamValue {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    PointRef(PointRef),
    NameRef(String),
}

impl ParamType {
    /// Human-readable type name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            ParamType::Integer => "integer",
            ParamType::Float => "float",
            ParamType::String => "string",
            ParamType::Boolean => "boolean",
            ParamType::PointRef => "point reference",
            ParamType::NameRef => "name",
        }
    }

    /// Parse one comma-separated field as a value of this type.
    pub fn parse(self, text: &str) -> Result<ParamValue, ConversionError> {
        let invalid = || ConversionError::Invalid {
            expected: self.name(),
            text: text.to_string(),
        };
        match self {
            ParamType::Integer => text
                .trim()
                .parse::<i64>()
                .map(ParamValue::Integer)
                .map_err(|_| invalid()),
            ParamType::Float => text
                .trim()
                .parse::<f64>()
                .map(ParamValue::Float)
                .map_err(|_| invalid()),
            ParamType::String => Ok(ParamValue::String(text.to_string())),
            ParamType::Boolean => {
                let raw = text.trim().parse::<i64>().map_err(|_| invalid())?;
                Ok(ParamValue::Boolean(raw != 0))
            }
            ParamType::PointRef => {
                let index = text.trim().parse::<i64>().map_err(|_| invalid())?;
                if index < 0 {
                    return Err(ConversionError::NegativePointIndex {
                        text: text.to_string(),
                    });
                }
                Ok(ParamValue::PointRef(PointRef::new(index as usize)))
            }
            ParamType::NameRef => Ok(ParamValue::NameRef(text.to_string())),
        }
    }
}

impl ParamValue {
    /// Format the value back into its wire text.
    ///
    /// Floats always carry exactly one fractional digit; booleans become
    /// `0`/`1`; point references format as their bare index whether bound
    /// or not.
    pub fn format(&self) -> String {
        match self {
            ParamValue::Integer(value) => value.to_string(),
            ParamValue::Float(value) => format!("{value:.1}"),
            ParamValue::String(text) | ParamValue::NameRef(text) => text.clone(),
            ParamValue::Boolean(value) => if *value { "1" } else { "0" }.to_string(),
            ParamValue::PointRef(reference) => reference.index().to_string(),
        }
    }
}
