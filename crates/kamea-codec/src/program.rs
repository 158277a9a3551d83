//! Program structures: instructions and the point table.

use indexmap::IndexMap;
use serde::Serialize;

use crate::opcode::InstructionKind;
use crate::param::{ParamValue, Point};
use crate::registry::spec_for;
use crate::SPEED_DEFAULT;

/// A single program instruction.
///
/// Parameters are kept in schema order under their schema names, so iterating
/// the map always matches the wire layout. Speed is `0` when the optional
/// trailing field was absent, meaning the device default applies. `pen_down`
/// is populated only for the one kind whose record embeds a pen-state byte.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instruction {
    /// Kind of the instruction.
    pub kind: InstructionKind,
    /// Required parameters in schema order.
    pub params: IndexMap<&'static str, ParamValue>,
    /// Optional speed in 1..=8, or 0 for "use device default".
    pub speed: u8,
    /// Pen state for the pen-motion kind, `None` for every other kind.
    pub pen_down: Option<bool>,
}

impl Instruction {
    /// Build an instruction from parameter values in schema order.
    ///
    /// Speed defaults to unspecified and the pen defaults to down for the
    /// pen-motion kind. The value count must match the kind's schema.
    pub fn new(kind: InstructionKind, values: impl IntoIterator<Item = ParamValue>) -> Self {
        let spec = spec_for(kind);
        let params: IndexMap<&'static str, ParamValue> = spec
            .params
            .iter()
            .map(|param| param.name)
            .zip(values)
            .collect();
        debug_assert_eq!(
            params.len(),
            spec.params.len(),
            "parameter count mismatch for {}",
            spec.mnemonic
        );
        Self {
            kind,
            params,
            speed: SPEED_DEFAULT,
            pen_down: spec.has_pen_flag.then_some(true),
        }
    }

    /// Set the trailing speed field.
    pub fn with_speed(mut self, speed: u8) -> Self {
        self.speed = speed;
        self
    }

    /// Set the pen state (pen-motion kind only).
    pub fn with_pen_down(mut self, down: bool) -> Self {
        self.pen_down = Some(down);
        self
    }

    /// Look up a parameter by its schema name.
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }
}

/// A decoded program: instructions in execution order plus the point table.
///
/// Programs come out of the decoder with unresolved point references; running
/// [`crate::resolver::resolve`] validates all cross-references and binds each
/// point reference to its coordinate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Program {
    /// Instructions in file order, which is execution order.
    pub instructions: Vec<Instruction>,
    /// Point table addressed by point-reference parameters.
    pub points: Vec<Point>,
}

impl Program {
    /// Create an empty program.
    pub fn new() -> Self {
        Self::default()
    }
}
