//! Error types for program file decode, validation, and encode.
//!
//! # Error Categories
//!
//! - **Structural**: [`StructuralError`] - the byte stream itself is broken
//!   (truncation, unknown opcode, oversized parameter region). Always fatal,
//!   reported fail-fast with the byte offset of the offending record.
//! - **Type**: [`TypeConversionError`] - a parameter field does not parse as
//!   its declared type. Fatal, same offset context.
//! - **Semantic**: [`SemanticError`] - the program is well-formed but
//!   inconsistent (bad speed, duplicate or unresolved symbols, out-of-range
//!   point indices). The resolver aggregates these into a
//!   [`ValidationReport`] instead of stopping at the first one.
//! - **Encoding**: [`EncodeError`] - the instruction list cannot be
//!   represented in the fixed layout.
//!
//! Nothing is recovered internally: the codec never drops or repairs
//! malformed data.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::opcode::InstructionKind;

/// The byte stream violates the fixed file layout.
#[derive(Debug, Error)]
pub enum StructuralError {
    /// The two-byte instruction count header is missing.
    #[error("truncated header: file ends before the instruction count")]
    TruncatedHeader,

    /// The stream ended inside a 32-byte instruction record.
    #[error("truncated instruction record at offset {offset:#x}")]
    TruncatedRecord {
        /// Offset at which the stream ended.
        offset: u64,
    },

    /// The stream ended inside the point table or its count header.
    #[error("truncated point table at offset {offset:#x}")]
    TruncatedPointTable {
        /// Offset at which the stream ended.
        offset: u64,
    },

    /// The opcode byte does not name any known instruction.
    #[error("unknown opcode {opcode:#04x} at offset {offset:#x}")]
    UnknownOpcode {
        /// The unrecognized opcode byte.
        opcode: u8,
        /// Offset of the record carrying it.
        offset: u64,
    },

    /// The declared parameter length exceeds the 30-byte region.
    #[error("parameter length {len} exceeds the 30-byte record capacity at offset {offset:#x}")]
    ParamLengthOverflow {
        /// The declared parameter length.
        len: u8,
        /// Offset of the record carrying it.
        offset: u64,
    },

    /// The parameter text holds fewer fields than the schema requires.
    #[error("missing required parameters for {kind} at offset {offset:#x}")]
    MissingParameters {
        /// Kind whose schema was not satisfied.
        kind: InstructionKind,
        /// Offset of the record carrying it.
        offset: u64,
    },
}

/// A single field failed to parse as its declared parameter type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The text is not valid for the declared type.
    #[error("cannot parse {text:?} as {expected}")]
    Invalid {
        /// Human-readable name of the declared type.
        expected: &'static str,
        /// The offending field text.
        text: String,
    },

    /// A point reference carried a negative index.
    #[error("invalid point reference {text:?}: index must be non-negative")]
    NegativePointIndex {
        /// The offending field text.
        text: String,
    },
}

/// A [`ConversionError`] with the instruction context it occurred in.
#[derive(Debug, Error)]
#[error("invalid parameter {param:?} for {kind} at offset {offset:#x}")]
pub struct TypeConversionError {
    /// Kind of the instruction being decoded.
    pub kind: InstructionKind,
    /// Schema name of the parameter that failed.
    pub param: &'static str,
    /// Offset of the record carrying it.
    pub offset: u64,
    /// The underlying conversion failure.
    #[source]
    pub source: ConversionError,
}

/// The program is structurally sound but semantically inconsistent.
///
/// Semantic errors cite the offending instruction by its position in the
/// program rather than a byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    /// An explicit speed field lies outside the valid 1..=8 range.
    #[error("invalid speed value {speed} in instruction {index} (valid range 1..=8)")]
    SpeedOutOfRange {
        /// The out-of-range speed value as written.
        speed: i64,
        /// Position of the instruction in the program.
        index: usize,
    },

    /// A subroutine name was defined more than once.
    #[error("subroutine {name:?} redefined by instruction {index}")]
    DuplicateSubroutine { name: String, index: usize },

    /// A label name was defined more than once.
    #[error("label {name:?} redefined by instruction {index}")]
    DuplicateLabel { name: String, index: usize },

    /// A call targets a subroutine no instruction defines.
    #[error("call to undefined subroutine {name:?} in instruction {index}")]
    UndefinedSubroutine { name: String, index: usize },

    /// A goto targets a label no instruction defines.
    #[error("goto to undefined label {name:?} in instruction {index}")]
    UndefinedLabel { name: String, index: usize },

    /// A point reference indexes past the end of the point table.
    #[error("point index {point} out of range (table holds {count}) in instruction {index}")]
    PointIndexOutOfRange {
        /// The referenced point index.
        point: usize,
        /// Number of points in the table.
        count: usize,
        /// Position of the instruction in the program.
        index: usize,
    },
}

/// Every semantic error found across one whole program.
///
/// The resolver walks the full program before reporting, so a single run
/// surfaces all duplicate definitions, unresolved targets, and bad point
/// indices at once.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// The collected errors, in program order.
    pub errors: Vec<SemanticError>,
}

impl ValidationReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one semantic error.
    pub fn push(&mut self, error: SemanticError) {
        self.errors.push(error);
    }

    /// Whether no errors were recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok` when empty, otherwise the report itself as the error.
    pub fn into_result(self) -> Result<(), ValidationReport> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "program validation failed ({} errors)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

/// Any failure while reading a program from a byte stream.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The byte stream violates the file layout.
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// A parameter field failed to parse as its declared type.
    #[error(transparent)]
    Type(#[from] TypeConversionError),

    /// A semantic check that runs during the decode scan failed.
    #[error(transparent)]
    Semantic(#[from] SemanticError),

    /// Cross-reference validation failed after decoding.
    #[error(transparent)]
    Validation(#[from] ValidationReport),

    /// The underlying stream failed outside of end-of-file conditions.
    #[error("i/o error while reading program")]
    Io(#[from] io::Error),
}

/// Any failure while writing a program to a byte stream.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// More instructions than the two-byte count header can express.
    ///
    /// Detected before any bytes are written.
    #[error("program holds {count} instructions, the format allows at most 65535")]
    TooManyInstructions {
        /// Number of instructions in the rejected list.
        count: usize,
    },

    /// One instruction's formatted parameter text does not fit its record.
    #[error("parameter text {text:?} for {kind} is {len} bytes, the record allows 30")]
    ParamsTooLong {
        /// Kind of the oversized instruction.
        kind: InstructionKind,
        /// The formatted parameter text.
        text: String,
        /// Its encoded byte length, including the pen byte when present.
        len: usize,
    },

    /// An instruction is missing a parameter its schema requires.
    #[error("instruction {kind} is missing required parameter {param:?}")]
    MissingParameter {
        /// Kind of the incomplete instruction.
        kind: InstructionKind,
        /// Schema name of the absent parameter.
        param: &'static str,
    },

    /// The underlying stream failed.
    #[error("i/o error while writing program")]
    Io(#[from] io::Error),
}
