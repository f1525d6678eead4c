//! Data types and type-directed Structured Text literals

/// Data types accepted in the sheet; anything else (REAL, DINT, ...) is skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataType {
    Bool,
    Int,
    Word,
    String,
}

impl DataType {
    /// Parse a data type cell, `None` for unsupported types
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "BOOL" => Some(DataType::Bool),
            "INT" => Some(DataType::Int),
            "WORD" => Some(DataType::Word),
            "STRING" => Some(DataType::String),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Bool => "BOOL",
            DataType::Int => "INT",
            DataType::Word => "WORD",
            DataType::String => "STRING",
        }
    }

    /// Type of the mirroring %R variable: INT and STRING keep their type, the rest become WORD
    pub fn register_type(&self) -> DataType {
        match self {
            DataType::Int => DataType::Int,
            DataType::String => DataType::String,
            DataType::Bool | DataType::Word => DataType::Word,
        }
    }
}

/// How WORD initial values are written in generated Structured Text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordLiteral {
    /// Plain decimal numeral (`42`)
    #[default]
    Decimal,
    /// Type-qualified literal (`WORD#42`)
    Typed,
}

/// Format an initial value as a Structured Text literal for `data_type`
///
/// - BOOL: `1`, `TRUE`, `T`, `YES` (any case) → `1`, everything else → `0`
/// - STRING: single-quoted, embedded quotes doubled
/// - INT/WORD: integer per [`parse_int`], `0` when malformed
pub fn st_literal(data_type: DataType, value: &str, word: WordLiteral) -> String {
    let value = value.trim();

    match data_type {
        DataType::Bool => {
            let truthy = matches!(value.to_uppercase().as_str(), "1" | "TRUE" | "T" | "YES");
            let literal = if truthy { "1" } else { "0" };
            literal.to_string()
        }
        DataType::String => format!("'{}'", value.replace('\'', "''")),
        DataType::Int => parse_int(value).unwrap_or(0).to_string(),
        DataType::Word => {
            let num = parse_int(value).unwrap_or(0);
            match word {
                WordLiteral::Decimal => num.to_string(),
                WordLiteral::Typed => format!("WORD#{num}"),
            }
        }
    }
}

/// Parse an integer in decimal, `0x`/`0o`/`0b` prefix or IEC `16#FF` radix notation
///
/// Underscore digit separators and a leading sign are accepted.
pub fn parse_int(value: &str) -> Option<i64> {
    let value = value.trim().replace('_', "");

    let (negative, unsigned) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(&value)),
    };

    let (radix, digits) = split_radix(unsigned)?;
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }

    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn split_radix(value: &str) -> Option<(u32, &str)> {
    if let Some((radix, digits)) = value.split_once('#') {
        let radix = match radix {
            "2" => 2,
            "8" => 8,
            "10" => 10,
            "16" => 16,
            _ => return None,
        };
        return Some((radix, digits));
    }

    let prefixed = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)];
    for (prefix, radix) in prefixed {
        if let Some(digits) = value.strip_prefix(prefix) {
            return Some((radix, digits));
        }
    }

    Some((10, value))
}
