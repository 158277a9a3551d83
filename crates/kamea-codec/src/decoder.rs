//! Byte stream to program decoding.
//!
//! Decoding is fail-fast: the first structural or type error aborts with the
//! byte offset of the offending record. Cross-reference checks that need the
//! whole program (point binding, symbol resolution) live in
//! [`crate::resolver`] instead.

use std::io::{ErrorKind, Read};

use tracing::{debug, trace};

use crate::error::{ConversionError, DecodeError, SemanticError, StructuralError, TypeConversionError};
use crate::param::Point;
use crate::program::{Instruction, Program};
use crate::registry::spec_for_opcode;
use crate::{MAX_PARAM_LEN, RECORD_LEN, SPEED_DEFAULT, SPEED_MAX, SPEED_MIN};

/// Decode a program from a byte stream.
///
/// The returned program carries unresolved point references; run
/// [`crate::resolver::resolve`] (or use [`crate::read_program`]) to validate
/// and bind them.
///
/// # Errors
///
/// Returns a [`DecodeError`] on the first structural violation, parameter
/// type mismatch, or out-of-range explicit speed. I/O failures other than
/// end-of-file propagate as [`DecodeError::Io`].
pub fn decode<R: Read>(reader: R) -> Result<Program, DecodeError> {
    Decoder { reader, offset: 0 }.run()
}

struct Decoder<R> {
    reader: R,
    offset: u64,
}

impl<R: Read> Decoder<R> {
    fn run(mut self) -> Result<Program, DecodeError> {
        let mut count = [0u8; 2];
        self.fill(&mut count, |_| StructuralError::TruncatedHeader)?;
        let count = u16::from_le_bytes(count);

        let mut program = Program::new();
        program.instructions.reserve(count as usize);
        for index in 0..count as usize {
            let record_offset = self.offset;
            let mut record = [0u8; RECORD_LEN];
            self.fill(&mut record, |offset| StructuralError::TruncatedRecord {
                offset,
            })?;
            let instruction = parse_record(&record, record_offset, index)?;
            trace!(index, kind = %instruction.kind, offset = record_offset, "decoded instruction");
            program.instructions.push(instruction);
        }

        let mut count = [0u8; 2];
        self.fill(&mut count, |offset| StructuralError::TruncatedPointTable {
            offset,
        })?;
        let point_count = u16::from_le_bytes(count);
        program.points.reserve(point_count as usize);
        for _ in 0..point_count {
            let mut raw = [0u8; 4];
            self.fill(&mut raw, |offset| StructuralError::TruncatedPointTable {
                offset,
            })?;
            let raw_x = u16::from_le_bytes([raw[0], raw[1]]);
            let raw_y = u16::from_le_bytes([raw[2], raw[3]]);
            program.points.push(Point::from_raw(raw_x, raw_y));
        }

        debug!(
            instructions = program.instructions.len(),
            points = program.points.len(),
            "decoded program"
        );
        Ok(program)
    }

    /// Read exactly `buf.len()` bytes, mapping end-of-file to the structural
    /// error built by `truncated` from the offset reached so far.
    fn fill(
        &mut self,
        buf: &mut [u8],
        truncated: impl FnOnce(u64) -> StructuralError,
    ) -> Result<(), DecodeError> {
        match self.reader.read_exact(buf) {
            Ok(()) => {
                self.offset += buf.len() as u64;
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => Err(truncated(self.offset).into()),
            Err(err) => Err(DecodeError::Io(err)),
        }
    }
}

/// Parse one fixed 32-byte instruction record.
fn parse_record(record: &[u8], offset: u64, index: usize) -> Result<Instruction, DecodeError> {
    let opcode = record[0];
    let spec =
        spec_for_opcode(opcode).ok_or(StructuralError::UnknownOpcode { opcode, offset })?;

    let param_len = record[1] as usize;
    if param_len > MAX_PARAM_LEN {
        return Err(StructuralError::ParamLengthOverflow {
            len: record[1],
            offset,
        }
        .into());
    }
    let mut raw = &record[2..2 + param_len];

    // The pen byte sits in the raw parameter region, before sanitization.
    let mut pen_down = None;
    if spec.has_pen_flag && !raw.is_empty() {
        pen_down = Some(raw[raw.len() - 1] == 0);
        raw = &raw[..raw.len() - 1];
    }

    let text: String = raw
        .iter()
        .copied()
        .filter(|byte| (0x20..=0x7e).contains(byte))
        .map(char::from)
        .collect();
    let fields: Vec<&str> = text.split(',').collect();
    if fields.len() < spec.params.len() {
        return Err(StructuralError::MissingParameters {
            kind: spec.kind,
            offset,
        }
        .into());
    }

    let mut params = indexmap::IndexMap::with_capacity(spec.params.len());
    for (param, field) in spec.params.iter().zip(&fields) {
        let value = param.ty.parse(field).map_err(|source| TypeConversionError {
            kind: spec.kind,
            param: param.name,
            offset,
            source,
        })?;
        params.insert(param.name, value);
    }

    let mut speed = SPEED_DEFAULT;
    if spec.has_speed {
        if let Some(field) = fields.get(spec.params.len()) {
            let value = field.trim().parse::<i64>().map_err(|_| TypeConversionError {
                kind: spec.kind,
                param: "speed",
                offset,
                source: ConversionError::Invalid {
                    expected: "integer",
                    text: field.to_string(),
                },
            })?;
            if value < i64::from(SPEED_MIN) || value > i64::from(SPEED_MAX) {
                return Err(SemanticError::SpeedOutOfRange {
                    speed: value,
                    index,
                }
                .into());
            }
            speed = value as u8;
        }
    }

    Ok(Instruction {
        kind: spec.kind,
        params,
        speed,
        pen_down,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::opcode::InstructionKind;
    use crate::param::ParamValue;

    fn record(opcode: u8, params: &[u8]) -> Vec<u8> {
        let mut bytes = vec![opcode, params.len() as u8];
        bytes.extend_from_slice(params);
        bytes.resize(RECORD_LEN, 0);
        bytes
    }

    fn one_record_file(opcode: u8, params: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0x01, 0x00];
        bytes.extend(record(opcode, params));
        bytes.extend([0x00, 0x00]);
        bytes
    }

    #[test]
    fn empty_file_decodes_to_empty_program() {
        let program = decode(&[0x00, 0x00, 0x00, 0x00][..]).unwrap();
        assert!(program.instructions.is_empty());
        assert!(program.points.is_empty());
    }

    #[test]
    fn missing_header_is_structural() {
        let err = decode(&[][..]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Structural(StructuralError::TruncatedHeader)
        ));
    }

    #[test]
    fn truncated_record_reports_offset() {
        let err = decode(&[0x01, 0x00][..]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Structural(StructuralError::TruncatedRecord { offset: 2 })
        ));
    }

    #[test]
    fn missing_point_table_is_structural() {
        let err = decode(&[0x00, 0x00][..]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Structural(StructuralError::TruncatedPointTable { .. })
        ));
    }

    #[test]
    fn truncated_point_record_is_structural() {
        let err = decode(&[0x00, 0x00, 0x01, 0x00][..]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Structural(StructuralError::TruncatedPointTable { offset: 4 })
        ));
    }

    #[test]
    fn unknown_opcode_reports_record_offset() {
        let err = decode(one_record_file(0xab, b"").as_slice()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Structural(StructuralError::UnknownOpcode {
                opcode: 0xab,
                offset: 2,
            })
        ));
    }

    #[test]
    fn oversized_param_length_is_structural() {
        let mut bytes = vec![0x01, 0x00, 0x00, 0x55];
        bytes.resize(2 + RECORD_LEN + 2, 0);
        let err = decode(bytes.as_slice()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Structural(StructuralError::ParamLengthOverflow {
                len: 0x55,
                offset: 2,
            })
        ));
    }

    #[test]
    fn param_length_of_thirty_decodes() {
        // COMMENT with the full 30-byte region used.
        let text = [b'x'; 30];
        let program = decode(one_record_file(0x1b, &text).as_slice()).unwrap();
        assert_eq!(
            program.instructions[0].param("text"),
            Some(&ParamValue::String("x".repeat(30)))
        );
    }

    #[test]
    fn missing_required_parameters() {
        let err = decode(one_record_file(0x00, b"1\x01").as_slice()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Structural(StructuralError::MissingParameters {
                kind: InstructionKind::PpLine,
                offset: 2,
            })
        ));
    }

    #[test]
    fn pen_byte_is_stripped_before_parsing() {
        let program = decode(one_record_file(0x00, b"4,2,1,3\x00").as_slice()).unwrap();
        let instruction = &program.instructions[0];
        assert_eq!(instruction.kind, InstructionKind::PpLine);
        assert_eq!(instruction.pen_down, Some(true));
        assert_eq!(instruction.speed, 3);
        assert_eq!(instruction.param("dz"), Some(&ParamValue::Float(1.0)));
    }

    #[test]
    fn nonzero_pen_byte_means_pen_up() {
        let program = decode(one_record_file(0x00, b"4,2,1\x01").as_slice()).unwrap();
        assert_eq!(program.instructions[0].pen_down, Some(false));
        assert_eq!(program.instructions[0].speed, SPEED_DEFAULT);
    }

    #[test]
    fn control_bytes_are_sanitized_out() {
        let program = decode(one_record_file(0x04, b"10,\x0120,2").as_slice()).unwrap();
        assert_eq!(
            program.instructions[0].param("dy"),
            Some(&ParamValue::Float(20.0))
        );
    }

    #[test]
    fn float_conversion_failure_is_typed() {
        let err = decode(one_record_file(0x00, b"0,0,a\x01").as_slice()).unwrap_err();
        assert!(matches!(err, DecodeError::Type(_)));
    }

    #[test]
    fn speed_conversion_failure_is_typed() {
        let err = decode(one_record_file(0x00, b"0,0,1,a\x01").as_slice()).unwrap_err();
        assert!(matches!(err, DecodeError::Type(_)));
    }

    #[test]
    fn explicit_zero_speed_is_rejected() {
        let err = decode(one_record_file(0x00, b"0,0,1,0\x01").as_slice()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Semantic(SemanticError::SpeedOutOfRange { speed: 0, index: 0 })
        ));
    }

    #[test]
    fn omitted_speed_defaults_to_unspecified() {
        let program = decode(one_record_file(0x04, b"10,20,2").as_slice()).unwrap();
        assert_eq!(program.instructions[0].speed, SPEED_DEFAULT);
    }

    #[test]
    fn negative_point_reference_is_typed() {
        let err = decode(one_record_file(0x00, b"0,-1,1,1\x01").as_slice()).unwrap_err();
        match err {
            DecodeError::Type(inner) => assert!(matches!(
                inner.source,
                crate::error::ConversionError::NegativePointIndex { .. }
            )),
            other => panic!("expected type error, got {other:?}"),
        }
    }

    #[test]
    fn point_table_is_decoded_with_fixed_point_scaling() {
        let bytes = [
            0x00, 0x00, 0x02, 0x00, 0x55, 0x00, 0x01, 0x00, 0x44, 0x00, 0x21, 0x00,
        ];
        let program = decode(&bytes[..]).unwrap();
        assert_eq!(
            program.points,
            vec![
                Point { x: 8.5, y: 0.1 },
                Point { x: 6.8, y: 3.3 },
            ]
        );
    }
}
