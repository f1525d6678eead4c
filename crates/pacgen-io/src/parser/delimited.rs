//! Dialect sniffing and loose header matching for spreadsheet CSV exports

use anyhow::{Context, Result};
use csv::StringRecord;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// How much of the file is inspected when sniffing the delimiter
const SNIFF_BYTES: usize = 2048;

/// Delimiters Excel exports in practice, in order of preference on ties
const CANDIDATES: [u8; 3] = [b',', b';', b'\t'];

/// Read a spreadsheet export into memory, dropping a leading UTF-8 BOM
pub fn read_source(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read source file: {}", path.display()))?;

    Ok(match content.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => content,
    })
}

/// Guess the field delimiter from the start of the file
///
/// For each candidate, the most common non-zero per-line count (outside of
/// double quotes) is taken; the candidate whose count is shared by the most
/// lines wins. Falls back to `,` when no candidate shows up at all.
pub fn sniff_delimiter(content: &str) -> u8 {
    let mut end = content.len().min(SNIFF_BYTES);
    while !content.is_char_boundary(end) {
        end -= 1;
    }

    let mut lines: Vec<&str> = content[..end]
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();

    // The last line of a truncated sample is most likely cut in half
    if end < content.len() && lines.len() > 1 {
        lines.pop();
    }

    let mut best: Option<(usize, usize, u8)> = None;

    for delim in CANDIDATES {
        let mut frequency: HashMap<usize, usize> = HashMap::new();
        for line in &lines {
            let count = count_unquoted(line, delim);
            if count > 0 {
                *frequency.entry(count).or_default() += 1;
            }
        }

        let Some((count, consistent)) = frequency
            .into_iter()
            .max_by_key(|&(count, consistent)| (consistent, count))
        else {
            continue;
        };

        if best.map_or(true, |(c, n, _)| (consistent, count) > (c, n)) {
            best = Some((consistent, count, delim));
        }
    }

    best.map(|(_, _, delim)| delim).unwrap_or(b',')
}

fn count_unquoted(line: &str, delim: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;

    for byte in line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if byte == delim && !in_quotes {
            count += 1;
        }
    }

    count
}

/// Build a headerless, flexible CSV reader over `content` using the sniffed delimiter
pub fn delimited_reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(content))
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes())
}

/// Normalize a header cell for loose matching: drop all whitespace, lower-case the rest
///
/// `"Data Type"`, `" datatype "` and `"DataType"` all become `"datatype"`.
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Column lookup over a header record using loose name matching
#[derive(Debug, Default, Clone)]
pub struct HeaderIndex {
    columns: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn new(header: &StringRecord) -> Self {
        let mut columns = HashMap::new();
        for (idx, cell) in header.iter().enumerate() {
            columns.entry(normalize_header(cell)).or_insert(idx);
        }
        Self { columns }
    }

    /// Find a column by loose name
    pub fn find(&self, name: &str) -> Option<usize> {
        self.columns.get(&normalize_header(name)).copied()
    }

    /// Resolve every name, or return the loose keys that could not be found
    pub fn require(&self, names: &[&str]) -> Result<Vec<usize>, Vec<String>> {
        let mut found = Vec::with_capacity(names.len());
        let mut missing = Vec::new();

        for name in names {
            match self.find(name) {
                Some(idx) => found.push(idx),
                None => missing.push(normalize_header(name)),
            }
        }

        if missing.is_empty() {
            Ok(found)
        } else {
            Err(missing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3\n"), b',');
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3\n"), b';');
        assert_eq!(sniff_delimiter("a\tb\tc\n1\t2\t3\n"), b'\t');
    }

    #[test]
    fn test_sniff_ignores_quoted_delimiters() {
        let content = "Name;Description\n\"A\";\"pump, left\"\n\"B\";\"fan, right\"\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_prefers_consistent_counts() {
        // Commas only appear inside one free-text field, semicolons on every line
        let content = "a;b;c\n1;2,5;3\n4;5;6\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_fallback() {
        assert_eq!(sniff_delimiter(""), b',');
        assert_eq!(sniff_delimiter("single column\nvalue\n"), b',');
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Data Type"), "datatype");
        assert_eq!(normalize_header("  Register PLC "), "registerplc");
        assert_eq!(normalize_header("Initial\tValue"), "initialvalue");
    }

    #[test]
    fn test_header_index() {
        let header = StringRecord::from(vec!["Project Name", "PLC Tag", "Extra"]);
        let index = HeaderIndex::new(&header);

        assert_eq!(index.find("projectname"), Some(0));
        assert_eq!(index.find("PLC tag"), Some(1));
        assert_eq!(index.find("missing"), None);

        assert_eq!(index.require(&["plctag", "projectname"]), Ok(vec![1, 0]));
        assert_eq!(
            index.require(&["plctag", "Data Type", "name"]),
            Err(vec!["datatype".to_string(), "name".to_string()])
        );
    }

    #[test]
    fn test_delimited_reader() {
        let mut reader = delimited_reader("a;b\n1;\"x;y\"\n");
        let records: Vec<StringRecord> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[1][1], "x;y");
    }
}
