//! Program to byte stream encoding.
//!
//! The encoder re-serializes an instruction list into the fixed record
//! layout. It is the inverse of the decoder for instruction data, but it does
//! not regenerate the point table: the trailing point count is always written
//! as zero, matching the device tooling this format comes from. Callers are
//! expected to hand it instructions that already satisfy the program
//! invariants; cross-reference consistency is not re-checked here.

use std::io::Write;

use tracing::debug;

use crate::error::EncodeError;
use crate::program::Instruction;
use crate::registry::spec_for;
use crate::{MAX_INSTRUCTIONS, MAX_PARAM_LEN, RECORD_LEN, SPEED_DEFAULT};

/// Encode an instruction list into the program file layout.
///
/// The instruction count is checked before anything is written, and every
/// record is assembled in memory before it is committed, so a failing
/// instruction leaves no partial record in the output.
///
/// # Errors
///
/// Returns [`EncodeError::TooManyInstructions`] when the list exceeds the
/// two-byte count header, and [`EncodeError::ParamsTooLong`] when one
/// instruction's formatted text exceeds its 30-byte record region.
pub fn encode<W: Write>(instructions: &[Instruction], mut writer: W) -> Result<(), EncodeError> {
    if instructions.len() > MAX_INSTRUCTIONS {
        return Err(EncodeError::TooManyInstructions {
            count: instructions.len(),
        });
    }

    writer.write_all(&(instructions.len() as u16).to_le_bytes())?;
    for instruction in instructions {
        let record = encode_record(instruction)?;
        writer.write_all(&record)?;
    }
    // The writer never re-emits the point table.
    writer.write_all(&0u16.to_le_bytes())?;

    debug!(instructions = instructions.len(), "encoded program");
    Ok(())
}

/// Assemble one fixed 32-byte record.
fn encode_record(instruction: &Instruction) -> Result<[u8; RECORD_LEN], EncodeError> {
    let spec = spec_for(instruction.kind);

    let mut fields = Vec::with_capacity(spec.params.len() + 1);
    for param in spec.params {
        let value = instruction
            .params
            .get(param.name)
            .ok_or(EncodeError::MissingParameter {
                kind: spec.kind,
                param: param.name,
            })?;
        fields.push(value.format());
    }
    if spec.has_speed && instruction.speed != SPEED_DEFAULT {
        fields.push(instruction.speed.to_string());
    }

    let text = fields.join(",");
    let pen_byte = spec
        .has_pen_flag
        .then(|| if instruction.pen_down == Some(true) { 0u8 } else { 1u8 });
    let param_len = text.len() + usize::from(pen_byte.is_some());
    if param_len > MAX_PARAM_LEN {
        return Err(EncodeError::ParamsTooLong {
            kind: spec.kind,
            text,
            len: param_len,
        });
    }

    let mut record = [0u8; RECORD_LEN];
    record[0] = spec.opcode;
    record[1] = param_len as u8;
    record[2..2 + text.len()].copy_from_slice(text.as_bytes());
    if let Some(pen) = pen_byte {
        record[2 + text.len()] = pen;
    }
    Ok(record)
}
