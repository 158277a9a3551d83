//! End-to-end program file scenarios: real byte fixtures through decode,
//! resolve, and encode.

use kamea_codec::{
    decode, encode, read_program, DecodeError, Instruction, InstructionKind, ParamValue, Point,
    PointRef, SemanticError,
};

/// One 32-byte record: opcode, length, parameter bytes, zero padding.
fn record(opcode: u8, params: &[u8]) -> Vec<u8> {
    assert!(params.len() <= 30);
    let mut bytes = vec![opcode, params.len() as u8];
    bytes.extend_from_slice(params);
    bytes.resize(32, 0);
    bytes
}

/// A whole file from instruction records and raw point-table halfwords.
fn file(records: &[Vec<u8>], points: &[(u16, u16)]) -> Vec<u8> {
    let mut bytes = (records.len() as u16).to_le_bytes().to_vec();
    for rec in records {
        bytes.extend_from_slice(rec);
    }
    bytes.extend((points.len() as u16).to_le_bytes());
    for (x, y) in points {
        bytes.extend(x.to_le_bytes());
        bytes.extend(y.to_le_bytes());
    }
    bytes
}

#[test]
fn empty_file_reads_as_empty_program() {
    let program = read_program(&[0x00, 0x00, 0x00, 0x00][..]).unwrap();
    assert!(program.instructions.is_empty());
    assert!(program.points.is_empty());
}

#[test]
fn pen_motion_instruction_resolves_against_the_point_table() {
    let bytes = file(&[record(0x00, b"0,1,2,3\x00")], &[(0, 1), (0, 5)]);
    let program = read_program(bytes.as_slice()).unwrap();

    assert_eq!(program.points, vec![Point { x: 0.0, y: 0.1 }, Point { x: 0.0, y: 0.5 }]);
    let instruction = &program.instructions[0];
    assert_eq!(instruction.kind, InstructionKind::PpLine);
    assert_eq!(instruction.speed, 3);
    assert_eq!(instruction.pen_down, Some(true));
    assert_eq!(instruction.param("dz"), Some(&ParamValue::Float(2.0)));

    let Some(ParamValue::PointRef(start)) = instruction.param("start_point") else {
        panic!("missing start_point");
    };
    let Some(ParamValue::PointRef(end)) = instruction.param("end_point") else {
        panic!("missing end_point");
    };
    assert_eq!(start.point(), Some(Point { x: 0.0, y: 0.1 }));
    assert_eq!(end.point(), Some(Point { x: 0.0, y: 0.5 }));
}

#[test]
fn point_reference_past_the_table_fails_validation() {
    let bytes = file(&[record(0x00, b"0,1,2,3\x00")], &[(0, 1)]);
    let err = read_program(bytes.as_slice()).unwrap_err();
    let DecodeError::Validation(report) = err else {
        panic!("expected validation failure, got {err:?}");
    };
    assert_eq!(
        report.errors,
        vec![SemanticError::PointIndexOutOfRange {
            point: 1,
            count: 1,
            index: 0,
        }]
    );
}

#[test]
fn subroutine_call_resolves_regardless_of_definition_order() {
    let bytes = file(
        &[
            record(0x14, b"abc"), // CALL before its SUB
            record(0x1f, b"abc"),
            record(0x15, b""),
        ],
        &[],
    );
    read_program(bytes.as_slice()).unwrap();
}

#[test]
fn call_to_undefined_subroutine_fails_validation() {
    let bytes = file(
        &[record(0x1f, b"abc"), record(0x15, b""), record(0x14, b"abd")],
        &[],
    );
    let err = read_program(bytes.as_slice()).unwrap_err();
    let DecodeError::Validation(report) = err else {
        panic!("expected validation failure, got {err:?}");
    };
    assert_eq!(
        report.errors,
        vec![SemanticError::UndefinedSubroutine {
            name: "abd".to_string(),
            index: 2,
        }]
    );
}

#[test]
fn redefined_subroutine_fails_validation() {
    let bytes = file(&[record(0x1f, b"abc"), record(0x1f, b"abc")], &[]);
    assert!(matches!(
        read_program(bytes.as_slice()),
        Err(DecodeError::Validation(_))
    ));
}

#[test]
fn goto_resolves_against_labels_only() {
    let valid = file(&[record(0x16, b"abc"), record(0x13, b"abc")], &[]);
    read_program(valid.as_slice()).unwrap();

    let invalid = file(&[record(0x16, b"abc"), record(0x13, b"abd")], &[]);
    assert!(matches!(
        read_program(invalid.as_slice()),
        Err(DecodeError::Validation(_))
    ));
}

#[test]
fn encode_then_decode_round_trips_the_instruction_list() {
    let instructions = vec![
        Instruction::new(
            InstructionKind::Line,
            vec![
                ParamValue::Float(10.0),
                ParamValue::Float(20.0),
                ParamValue::Float(2.0),
            ],
        )
        .with_speed(4),
        Instruction::new(
            InstructionKind::PpLine,
            vec![
                ParamValue::PointRef(PointRef::new(0)),
                ParamValue::PointRef(PointRef::new(1)),
                ParamValue::Float(-1.5),
            ],
        )
        .with_pen_down(false),
        Instruction::new(InstructionKind::Sub, vec![ParamValue::NameRef("abc".into())]),
        Instruction::new(InstructionKind::Ret, vec![]),
        Instruction::new(
            InstructionKind::Turn,
            vec![
                ParamValue::Boolean(true),
                ParamValue::Boolean(false),
                ParamValue::Float(90.0),
            ],
        ),
        Instruction::new(
            InstructionKind::Comment,
            vec![ParamValue::String("test comment".into())],
        ),
        Instruction::new(InstructionKind::Finish, vec![]),
    ];

    let mut bytes = Vec::new();
    encode(&instructions, &mut bytes).unwrap();
    let decoded = decode(bytes.as_slice()).unwrap();

    assert_eq!(decoded.instructions, instructions);
    // The writer never re-emits the point table.
    assert!(decoded.points.is_empty());
    assert_eq!(&bytes[bytes.len() - 2..], [0x00, 0x00]);
}

#[test]
fn decoded_fixture_re_encodes_byte_for_byte() {
    let original = file(
        &[record(0x04, b"10.0,20.0,2.0,4"), record(0x1b, b"test comment")],
        &[],
    );
    let program = read_program(original.as_slice()).unwrap();
    let mut rewritten = Vec::new();
    encode(&program.instructions, &mut rewritten).unwrap();
    assert_eq!(rewritten, original);
}
