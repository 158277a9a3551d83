//! Instruction kinds and schema metadata for Kamea program files.
//!
//! This module defines the closed instruction set of the Kamea controller and
//! the metadata describing each instruction's wire shape. Instruction kinds are
//! **data, not behavior**: the decoder, resolver, and encoder all drive off the
//! schema table in [`crate::registry`] instead of hard-coding per-opcode logic
//! in match statements.
//!
//! # Instruction Categories
//!
//! - **Point motion** - `PP_LINE`, `PP_ARC`, `PR_ARC`, `PZ_ARC`, `PRZ_ARC`,
//!   `SPLINE` (address the trailing point table by index)
//! - **Relative motion** - `LINE`, `ARC`, `REL_ARC`
//! - **Device** - `ON`, `OFF`, `SPEED`, `SET_PARK`, `GO_PARK`, `SET_ZERO`,
//!   `GO_ZERO`
//! - **Geometry state** - `SCALE_X`, `SCALE_Y`, `SCALE_Z`, `TURN`
//! - **Flow control** - `LABEL`, `GOTO`, `SUB`, `CALL`, `RET`, `LOOP`,
//!   `ENDLOOP`
//! - **Lifecycle** - `STOP`, `FINISH`, `PAUSE`
//! - **Annotation** - `COMMENT`

use std::fmt;

use serde::Serialize;

use crate::registry::spec_for;

/// Kind of a single program instruction.
///
/// Each variant corresponds to exactly one wire opcode byte. The parameter
/// layout, speed eligibility, and symbol role of every kind are described by
/// its [`OpcodeSpec`], looked up through the schema registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum InstructionKind {
    /// Tool motion between two table points with a depth delta.
    ///
    /// The only kind carrying the embedded pen-state byte (see
    /// [`OpcodeSpec::has_pen_flag`]).
    PpLine,
    /// Arc through three table points.
    PpArc,
    /// Arc between two table points with an explicit radius.
    PrArc,
    /// Arc through two table points with a depth delta.
    PzArc,
    /// Relative straight move.
    Line,
    /// Arc described by radius and two angles.
    Arc,
    /// Arc described by a relative endpoint and radius.
    RelArc,
    /// Record the current position as the park position.
    SetPark,
    /// Move to the park position.
    GoPark,
    /// Record the current position as the workpiece origin.
    SetZero,
    /// Move to the workpiece origin.
    GoZero,
    /// Switch a device (spindle) on.
    On,
    /// Switch a device off.
    Off,
    /// Set the default motion speed.
    Speed,
    /// Rescale the X axis.
    ScaleX,
    /// Rescale the Y axis.
    ScaleY,
    /// Rescale the Z axis.
    ScaleZ,
    /// Mirror and/or rotate the coordinate system.
    Turn,
    /// Define a jump label.
    Label,
    /// Call a named subroutine.
    Call,
    /// Return from the current subroutine.
    Ret,
    /// Jump to a named label.
    Goto,
    /// Begin a counted loop.
    Loop,
    /// Close the innermost loop.
    EndLoop,
    /// Halt the program, position is kept.
    Stop,
    /// Finish the program.
    Finish,
    /// Free-text annotation, ignored by the controller.
    Comment,
    /// Pause for a delay in seconds.
    Pause,
    /// Arc between two table points with radius and depth delta.
    PrzArc,
    /// Define a named subroutine.
    Sub,
    /// Cubic spline through four table points.
    Spline,
}

/// Total number of instruction kinds.
///
/// Must match the number of variants in [`InstructionKind`]. Used to size the
/// registry's kind-indexed lookup table.
pub const KIND_COUNT: usize = 31;

impl InstructionKind {
    /// Wire opcode byte for this kind.
    pub fn opcode(self) -> u8 {
        spec_for(self).opcode
    }

    /// Canonical mnemonic, e.g. `"PP_LINE"`.
    pub fn mnemonic(self) -> &'static str {
        spec_for(self).mnemonic
    }

    /// Schema describing this kind's parameter layout and flags.
    pub fn spec(self) -> &'static OpcodeSpec {
        spec_for(self)
    }
}

impl fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Declared type of an instruction parameter.
///
/// Type tags drive the parameter codec in [`crate::param`]: the decoder parses
/// each comma-separated field with the tag the schema declares for its
/// position, and the encoder formats values back through the same rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParamType {
    /// Plain base-10 integer.
    Integer,
    /// Decimal number, formatted with exactly one fractional digit.
    Float,
    /// Verbatim text.
    String,
    /// Integer truthiness on read, `0`/`1` on write.
    Boolean,
    /// Non-negative index into the trailing point table.
    PointRef,
    /// Opaque symbol naming a subroutine or label.
    NameRef,
}

/// One named, typed slot in an instruction's parameter layout.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    /// Parameter name, unique within one instruction kind.
    pub name: &'static str,
    /// Declared type of the parameter.
    pub ty: ParamType,
}

/// Role an instruction kind plays in symbol resolution.
///
/// Kept in the schema table so the reference resolver stays table-driven
/// instead of matching on kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolRole {
    /// Introduces a subroutine name (`SUB`).
    DefineSubroutine,
    /// Introduces a label name (`LABEL`).
    DefineLabel,
    /// References a subroutine name (`CALL`).
    CallSubroutine,
    /// References a label name (`GOTO`).
    JumpToLabel,
}

/// Complete wire schema for one instruction kind.
///
/// Specs are immutable and registered once in [`crate::registry`]; all lookups
/// return `'static` references into that table.
#[derive(Debug, Clone)]
pub struct OpcodeSpec {
    /// The instruction kind this spec covers.
    pub kind: InstructionKind,
    /// Wire opcode byte.
    pub opcode: u8,
    /// Canonical mnemonic.
    pub mnemonic: &'static str,
    /// Required parameters in wire order.
    pub params: &'static [ParamSpec],
    /// Whether an optional trailing speed field may follow the parameters.
    pub has_speed: bool,
    /// Whether the last raw byte of the parameter region carries the pen
    /// state instead of parameter text. Only `PP_LINE` sets this.
    pub has_pen_flag: bool,
    /// Symbol-resolution role, if any.
    pub symbol: Option<SymbolRole>,
}
