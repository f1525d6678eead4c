//! Structured Text emitters: mirror routine and register presets

use std::fmt::Write;

use crate::mapping::{st_literal, DataType, IoDirection, WordLiteral};
use crate::session::{Assignment, ProjectOutput};

/// Emit the mirror routine (`<project>_map.st`)
///
/// Paste the result into a Structured Text block that runs every scan.
pub fn emit_map_st(project: &ProjectOutput) -> String {
    let mut out = String::new();
    writeln!(out, "(* AUTOGEN MAPPINGS *)").unwrap();

    for assignment in &project.assignments {
        for line in assignment_lines(assignment) {
            writeln!(out, "{}", line).unwrap();
        }
    }

    out
}

/// Statements that mirror one I/O point to its register
///
/// Inputs copy the register into the symbol (BOOL tests for non-zero);
/// outputs copy the symbol into the register (BOOL expands to IF/ELSE).
pub fn assignment_lines(assignment: &Assignment) -> Vec<String> {
    let Assignment {
        direction,
        data_type,
        tag_symbol: tag,
        register: reg,
        description: desc,
    } = assignment;

    match (direction, data_type) {
        (IoDirection::Input, DataType::Bool) => {
            vec![format!("{tag} := {reg} <> 0; (* {desc} *)")]
        }
        (IoDirection::Input, _) => vec![format!("{tag} := {reg}; (* {desc} *)")],
        (IoDirection::Output, DataType::Bool) => vec![
            format!("IF {tag} THEN"),
            format!("   {reg} := 1;"),
            "ELSE".to_string(),
            format!("   {reg} := 0;"),
            format!("END_IF; (* {desc} *)"),
        ],
        (IoDirection::Output, _) => vec![format!("{reg} := {tag}; (* {desc} *)")],
    }
}

/// Emit the register presets (`<project>_init.st`), one line per register in symbol order
///
/// Meant to run once on power-up.
pub fn emit_init_st(project: &ProjectOutput, word: WordLiteral) -> String {
    let mut out = String::new();
    writeln!(out, "(* AUTOGEN REGISTER PRESETS - call once on power-up *)").unwrap();

    for var in project.registers.values() {
        writeln!(
            out,
            "   {} := {}; (* {} *)",
            var.symbol,
            st_literal(var.data_type, &var.initial_value, word),
            var.tag_symbol
        )
        .unwrap();
    }

    out
}
