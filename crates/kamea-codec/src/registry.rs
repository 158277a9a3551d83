//! Schema registry mapping opcode bytes to instruction schemas.
//!
//! The registry is the single source of truth for the wire format: the decoder
//! uses it to turn opcode bytes into typed parameter layouts, the encoder to
//! turn kinds back into bytes, and the resolver to find symbol roles. It is
//! built once on first use and never mutated, so concurrent decode/encode
//! calls can share it freely.

use std::sync::OnceLock;

use crate::opcode::{InstructionKind, OpcodeSpec, ParamSpec, ParamType, SymbolRole, KIND_COUNT};

/// Retrieves the global list of all registered opcode specs.
///
/// The list is lazily initialized on the first call and covers every
/// [`InstructionKind`] exactly once.
pub fn opcode_specs() -> &'static [OpcodeSpec] {
    static SPECS: OnceLock<Vec<OpcodeSpec>> = OnceLock::new();
    SPECS.get_or_init(build_specs)
}

/// Retrieves the spec for an instruction kind in O(1) time.
///
/// # Panics
///
/// Panics if the kind has not been registered in the spec table, which would
/// mean [`KIND_COUNT`] and [`build_specs`] are out of sync.
pub fn spec_for(kind: InstructionKind) -> &'static OpcodeSpec {
    static BY_KIND: OnceLock<[&'static OpcodeSpec; KIND_COUNT]> = OnceLock::new();
    BY_KIND.get_or_init(|| {
        let mut table: [Option<&'static OpcodeSpec>; KIND_COUNT] = [None; KIND_COUNT];
        for spec in opcode_specs() {
            table[spec.kind as usize] = Some(spec);
        }
        std::array::from_fn(|index| {
            table[index].unwrap_or_else(|| panic!("missing opcode spec for kind index {index}"))
        })
    })[kind as usize]
}

/// Retrieves the spec for a wire opcode byte, or `None` for unknown opcodes.
pub fn spec_for_opcode(opcode: u8) -> Option<&'static OpcodeSpec> {
    static BY_OPCODE: OnceLock<[Option<&'static OpcodeSpec>; 256]> = OnceLock::new();
    BY_OPCODE.get_or_init(|| {
        let mut table = [None; 256];
        for spec in opcode_specs() {
            table[spec.opcode as usize] = Some(spec);
        }
        table
    })[opcode as usize]
}

/// Master list of opcode specs, pairing each kind with its wire layout.
fn build_specs() -> Vec<OpcodeSpec> {
    use InstructionKind::*;

    macro_rules! op {
        ($kind:ident, $opcode:expr, $mnemonic:literal, [$(($name:literal, $ty:ident)),*]) => {
            op!(@spec $kind, $opcode, $mnemonic, [$(($name, $ty)),*], false, false, None)
        };
        ($kind:ident, $opcode:expr, $mnemonic:literal, [$(($name:literal, $ty:ident)),*], speed) => {
            op!(@spec $kind, $opcode, $mnemonic, [$(($name, $ty)),*], true, false, None)
        };
        ($kind:ident, $opcode:expr, $mnemonic:literal, [$(($name:literal, $ty:ident)),*], speed, pen) => {
            op!(@spec $kind, $opcode, $mnemonic, [$(($name, $ty)),*], true, true, None)
        };
        ($kind:ident, $opcode:expr, $mnemonic:literal, [$(($name:literal, $ty:ident)),*], $role:ident) => {
            op!(@spec $kind, $opcode, $mnemonic, [$(($name, $ty)),*], false, false, Some(SymbolRole::$role))
        };
        (@spec $kind:ident, $opcode:expr, $mnemonic:literal, [$(($name:literal, $ty:ident)),*],
         $speed:expr, $pen:expr, $symbol:expr) => {
            OpcodeSpec {
                kind: $kind,
                opcode: $opcode,
                mnemonic: $mnemonic,
                params: &[$(ParamSpec { name: $name, ty: ParamType::$ty }),*],
                has_speed: $speed,
                has_pen_flag: $pen,
                symbol: $symbol,
            }
        };
    }

    vec![
        op!(
            PpLine,
            0x00,
            "PP_LINE",
            [
                ("start_point", PointRef),
                ("end_point", PointRef),
                ("dz", Float)
            ],
            speed,
            pen
        ),
        op!(
            PpArc,
            0x01,
            "PP_ARC",
            [
                ("start_point", PointRef),
                ("mid_point", PointRef),
                ("end_point", PointRef)
            ],
            speed
        ),
        op!(
            PrArc,
            0x02,
            "PR_ARC",
            [
                ("start_point", PointRef),
                ("end_point", PointRef),
                ("radius", Float)
            ],
            speed
        ),
        op!(
            PzArc,
            0x03,
            "PZ_ARC",
            [
                ("start_point", PointRef),
                ("mid_point", PointRef),
                ("dz", Float)
            ],
            speed
        ),
        op!(
            Line,
            0x04,
            "LINE",
            [("dx", Float), ("dy", Float), ("dz", Float)],
            speed
        ),
        op!(
            Arc,
            0x06,
            "ARC",
            [("radius", Float), ("al", Float), ("fi", Float)],
            speed
        ),
        op!(
            RelArc,
            0x07,
            "REL_ARC",
            [("dx", Float), ("dy", Float), ("radius", Float)],
            speed
        ),
        op!(SetPark, 0x08, "SET_PARK", []),
        op!(GoPark, 0x09, "GO_PARK", []),
        op!(SetZero, 0x0a, "SET_ZERO", []),
        op!(GoZero, 0x0b, "GO_ZERO", []),
        op!(On, 0x0c, "ON", [("device", Integer)]),
        op!(Off, 0x0d, "OFF", [("device", Integer)]),
        op!(Speed, 0x0e, "SPEED", [("speed", Integer)]),
        op!(
            ScaleX,
            0x0f,
            "SCALE_X",
            [("old_scale", Integer), ("new_scale", Integer)]
        ),
        op!(
            ScaleY,
            0x10,
            "SCALE_Y",
            [("old_scale", Integer), ("new_scale", Integer)]
        ),
        op!(
            ScaleZ,
            0x11,
            "SCALE_Z",
            [("old_scale", Integer), ("new_scale", Integer)]
        ),
        op!(
            Turn,
            0x12,
            "TURN",
            [
                ("mirror_x", Boolean),
                ("mirror_y", Boolean),
                ("angle", Float)
            ]
        ),
        op!(Label, 0x13, "LABEL", [("name", NameRef)], DefineLabel),
        op!(Call, 0x14, "CALL", [("name", NameRef)], CallSubroutine),
        op!(Ret, 0x15, "RET", []),
        op!(Goto, 0x16, "GOTO", [("name", NameRef)], JumpToLabel),
        op!(Loop, 0x17, "LOOP", [("count", Integer)]),
        op!(EndLoop, 0x18, "ENDLOOP", []),
        op!(Stop, 0x19, "STOP", []),
        op!(Finish, 0x1a, "FINISH", []),
        op!(Comment, 0x1b, "COMMENT", [("text", String)]),
        op!(Pause, 0x1c, "PAUSE", [("delay", Float)]),
        op!(
            PrzArc,
            0x1e,
            "PRZ_ARC",
            [
                ("start_point", PointRef),
                ("end_point", PointRef),
                ("radius", Float),
                ("dz", Float)
            ],
            speed
        ),
        op!(Sub, 0x1f, "SUB", [("name", NameRef)], DefineSubroutine),
        op!(
            Spline,
            0x28,
            "SPLINE",
            [
                ("p1", PointRef),
                ("p2", PointRef),
                ("p3", PointRef),
                ("p4", PointRef)
            ]
        ),
    ]
}
