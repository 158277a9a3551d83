//! Codec for Kamea CNC program files.
//!
//! A program file is a fixed little-endian container holding motion and
//! control instructions for an engraving controller, followed by a table of
//! 2-D points the point-motion instructions address by index:
//!
//! ```text
//! u16              instruction count
//! repeat N:
//!   u8             opcode
//!   u8             param length (<= 30)
//!   byte[len]      parameter text    // ASCII, comma-separated fields
//!   byte[30-len]   padding           // ignored on read, zero on write
//! u16              point count
//! repeat M:
//!   u16            raw x
//!   u16            raw y             // point = (raw_x / 10.0, raw_y / 10.0)
//! ```
//!
//! # Architecture
//!
//! - [`opcode`] - instruction kinds and schema metadata types
//! - [`registry`] - the immutable opcode -> schema table
//! - [`param`] - typed parameter values and their text codec
//! - [`program`] - instructions, points, and the program container
//! - [`decoder`] - byte stream -> program (fail-fast, offset-tagged errors)
//! - [`resolver`] - cross-reference validation and point binding (aggregated)
//! - [`error`] - the full error taxonomy
//! - [`encoder`] - instruction list -> byte stream
//!
//! # Decoding and resolving
//!
//! Decoding is byte-local and fail-fast; resolution is a separate pass over
//! the whole decoded program that checks symbol and point references and
//! reports every semantic error at once. [`read_program`] chains both.
//!
//! The instruction set is fixed and closed: this is not a general
//! serialization framework, and unknown opcodes are structural errors.
//!
//! All state lives in the single decode or encode call; the schema registry
//! is immutable, so independent programs can be decoded concurrently without
//! synchronization.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod opcode;
pub mod param;
pub mod program;
pub mod registry;
pub mod resolver;

use std::io::{Read, Write};

pub use decoder::decode;
pub use encoder::encode;
pub use error::{
    ConversionError, DecodeError, EncodeError, SemanticError, StructuralError,
    TypeConversionError, ValidationReport,
};
pub use opcode::{InstructionKind, OpcodeSpec, ParamSpec, ParamType, SymbolRole};
pub use param::{ParamValue, Point, PointRef};
pub use program::{Instruction, Program};
pub use registry::{opcode_specs, spec_for, spec_for_opcode};
pub use resolver::resolve;

/// Capacity of the parameter text region inside each record.
pub const MAX_PARAM_LEN: usize = 30;

/// Highest instruction count the two-byte header can express.
pub const MAX_INSTRUCTIONS: usize = 65535;

/// Lowest valid explicit speed value.
pub const SPEED_MIN: u8 = 1;

/// Highest valid explicit speed value.
pub const SPEED_MAX: u8 = 8;

/// Speed value meaning "no speed specified, use the device default".
pub const SPEED_DEFAULT: u8 = 0;

/// Total size of one instruction record: opcode, length, parameter region.
pub(crate) const RECORD_LEN: usize = 2 + MAX_PARAM_LEN;

/// Decode a program and resolve all cross-references in one call.
///
/// # Errors
///
/// Fails fast with a [`DecodeError`] on structural or type problems; semantic
/// problems across the whole program are aggregated into
/// [`DecodeError::Validation`].
pub fn read_program<R: Read>(reader: R) -> Result<Program, DecodeError> {
    let mut program = decoder::decode(reader)?;
    resolver::resolve(&mut program)?;
    Ok(program)
}

/// Encode a program's instructions into the file layout.
///
/// The point table is not re-serialized; see [`encoder::encode`].
pub fn write_program<W: Write>(program: &Program, writer: W) -> Result<(), EncodeError> {
    encoder::encode(&program.instructions, writer)
}
