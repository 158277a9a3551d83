//! Cross-reference validation and binding.
//!
//! The resolver runs over a fully decoded program, after the point table is
//! known. It validates the program-wide invariants the byte-local decoder
//! cannot check: unique subroutine and label definitions, resolvable call and
//! goto targets, and in-range point indices. Point references that check out
//! are bound to their coordinates in place.
//!
//! Unlike decoding, resolution aggregates: the whole program is walked and
//! every semantic error is collected into one [`ValidationReport`], so a
//! single run surfaces everything a program author has to fix. Definition
//! order does not matter; calling a subroutine defined later in the file is
//! valid.

use indexmap::IndexSet;
use tracing::debug;

use crate::error::{SemanticError, ValidationReport};
use crate::opcode::SymbolRole;
use crate::param::ParamValue;
use crate::program::Program;
use crate::registry::spec_for;

/// Validate all cross-references and bind point references to coordinates.
///
/// On success every point reference in the program is in the resolved state.
/// On failure the program is left partially bound and the report lists every
/// semantic error found.
pub fn resolve(program: &mut Program) -> Result<(), ValidationReport> {
    let mut report = ValidationReport::new();

    // Pass 1: collect definitions. Duplicates are reported but the first
    // definition stays authoritative for reference checks.
    let mut subroutines: IndexSet<String> = IndexSet::new();
    let mut labels: IndexSet<String> = IndexSet::new();
    for (index, instruction) in program.instructions.iter().enumerate() {
        let Some(role) = spec_for(instruction.kind).symbol else {
            continue;
        };
        let Some(ParamValue::NameRef(name)) = instruction.param("name") else {
            continue;
        };
        match role {
            SymbolRole::DefineSubroutine => {
                if !subroutines.insert(name.clone()) {
                    report.push(SemanticError::DuplicateSubroutine {
                        name: name.clone(),
                        index,
                    });
                }
            }
            SymbolRole::DefineLabel => {
                if !labels.insert(name.clone()) {
                    report.push(SemanticError::DuplicateLabel {
                        name: name.clone(),
                        index,
                    });
                }
            }
            SymbolRole::CallSubroutine | SymbolRole::JumpToLabel => {}
        }
    }

    // Pass 2: check references and bind points.
    let points = &program.points;
    for (index, instruction) in program.instructions.iter_mut().enumerate() {
        for value in instruction.params.values_mut() {
            if let ParamValue::PointRef(reference) = value {
                match points.get(reference.index()) {
                    Some(point) => reference.bind(*point),
                    None => report.push(SemanticError::PointIndexOutOfRange {
                        point: reference.index(),
                        count: points.len(),
                        index,
                    }),
                }
            }
        }

        let role = spec_for(instruction.kind).symbol;
        if let Some(ParamValue::NameRef(name)) = instruction.param("name") {
            match role {
                Some(SymbolRole::CallSubroutine) if !subroutines.contains(name) => {
                    report.push(SemanticError::UndefinedSubroutine {
                        name: name.clone(),
                        index,
                    });
                }
                Some(SymbolRole::JumpToLabel) if !labels.contains(name) => {
                    report.push(SemanticError::UndefinedLabel {
                        name: name.clone(),
                        index,
                    });
                }
                _ => {}
            }
        }
    }

    debug!(
        subroutines = subroutines.len(),
        labels = labels.len(),
        errors = report.errors.len(),
        "resolved program references"
    );
    report.into_result()
}
