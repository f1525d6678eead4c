//! Identifier, comment and file-name sanitizing

use regex::Regex;
use std::sync::LazyLock;

use crate::parser::DEFAULT_PROJECT;

/// Characters that are not allowed in a Structured Text identifier
static NON_IDENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());

/// Runs of characters that are not safe in a file name
static NON_FILE_SAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]+").unwrap());

/// Turn a free-text name into an upper-case Structured Text identifier
///
/// Examples:
/// - "Start PB" → "START_PB"
/// - "2nd pump" → "X_2ND_PUMP"
/// - "" → "X"
pub fn st_safe(text: &str) -> String {
    let ident = NON_IDENT.replace_all(text.trim(), "_");

    let ident = if ident.is_empty() {
        "X".to_string()
    } else if ident.starts_with(|c: char| c.is_ascii_digit()) {
        format!("X_{ident}")
    } else {
        ident.into_owned()
    };

    ident.to_uppercase()
}

/// Make text safe to embed in a `(* ... *)` comment
pub fn esc_comment(text: &str) -> String {
    text.replace("*)", ")*").trim().to_string()
}

/// File stem used for every artifact of a project
///
/// Blank project names fall back to `DEFAULT`; anything outside
/// `[A-Za-z0-9_.-]` collapses to `_`.
pub fn project_stem(project: &str) -> String {
    let project = project.trim();
    if project.is_empty() {
        return DEFAULT_PROJECT.to_string();
    }
    NON_FILE_SAFE.replace_all(project, "_").into_owned()
}

/// Register address as a symbol name ("%R01019" → "R01019")
pub fn register_symbol(register: &str) -> String {
    register.replace('%', "")
}

/// Which way a PLC tag is mirrored to its register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoDirection {
    /// Discrete/analog inputs and internal memory: register → symbol
    Input,
    /// Discrete/analog outputs: symbol → register
    Output,
}

impl IoDirection {
    /// Classify a normalized PLC tag by its address area, `None` for unknown areas
    pub fn from_tag(tag: &str) -> Option<Self> {
        const INPUT_AREAS: [&str; 4] = ["%I", "%AI", "%R", "%M"];
        const OUTPUT_AREAS: [&str; 2] = ["%Q", "%AQ"];

        if INPUT_AREAS.iter().any(|area| tag.starts_with(area)) {
            Some(IoDirection::Input)
        } else if OUTPUT_AREAS.iter().any(|area| tag.starts_with(area)) {
            Some(IoDirection::Output)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_st_safe() {
        assert_eq!(st_safe("Start PB"), "START_PB");
        assert_eq!(st_safe("  motor-1.run "), "MOTOR_1_RUN");
        assert_eq!(st_safe("2nd pump"), "X_2ND_PUMP");
        assert_eq!(st_safe(""), "X");
        assert_eq!(st_safe("%I00017"), "_I00017");
        assert_eq!(st_safe("Temp°C"), "TEMP_C");
    }

    #[test]
    fn test_esc_comment() {
        assert_eq!(esc_comment(" level (high) *) "), "level (high) )*");
        assert_eq!(esc_comment(""), "");
    }

    #[test]
    fn test_project_stem() {
        assert_eq!(project_stem("Line1"), "Line1");
        assert_eq!(project_stem(" Line 1/Area:B "), "Line_1_Area_B");
        assert_eq!(project_stem("v1.2-rc"), "v1.2-rc");
        assert_eq!(project_stem("   "), "DEFAULT");
    }

    #[test]
    fn test_register_symbol() {
        assert_eq!(register_symbol("%R01019"), "R01019");
        assert_eq!(register_symbol("R00001"), "R00001");
    }

    #[test]
    fn test_direction() {
        assert_eq!(IoDirection::from_tag("%I00001"), Some(IoDirection::Input));
        assert_eq!(IoDirection::from_tag("%AI0003"), Some(IoDirection::Input));
        assert_eq!(IoDirection::from_tag("%R00100"), Some(IoDirection::Input));
        assert_eq!(IoDirection::from_tag("%M00010"), Some(IoDirection::Input));
        assert_eq!(IoDirection::from_tag("%Q00001"), Some(IoDirection::Output));
        assert_eq!(IoDirection::from_tag("%AQ0002"), Some(IoDirection::Output));
        assert_eq!(IoDirection::from_tag("%T00001"), None);
        assert_eq!(IoDirection::from_tag(""), None);
    }
}
