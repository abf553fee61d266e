use serde::Serialize;

/// A single parsed header line.
///
/// Header blocks are the wire-adjacent string form host applications
/// exchange: one `name: value` pair per line. Parsing preserves order and
/// keeps duplicate names as separate entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Parse a raw header block into ordered entries.
///
/// Each non-blank line is split at the first `:`; name and value are
/// trimmed. A line with no colon becomes an entry with an empty value.
/// An empty or absent block contributes no entries.
pub fn parse_header_block(block: &str) -> Vec<HeaderEntry> {
    block
        .split('\n')
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let entry = match line.split_once(':') {
                Some((name, value)) => HeaderEntry::new(name.trim(), value.trim()),
                None => HeaderEntry::new(line, ""),
            };
            Some(entry)
        })
        .collect()
}

/// Normalize a configuration-sourced header block before parsing.
///
/// Attribute-delivered configuration encodes the line separator as the
/// two-character literal `\n`. Only the first occurrence is substituted,
/// matching the behavior host applications already depend on.
pub fn normalize_header_block(block: &str) -> String {
    block.replacen("\\n", "\n", 1)
}

/// Merge a fixed (component-configured) header block with a caller block.
///
/// All fixed entries come first, unconditionally. A caller entry is kept
/// only when its name is not already present among the fixed names; the
/// match is case-sensitive on the names as parsed. Fixed headers shadow
/// caller headers, never the other way around.
pub fn merge_headers(fixed_block: Option<&str>, caller_block: Option<&str>) -> Vec<HeaderEntry> {
    let fixed = fixed_block
        .map(|b| parse_header_block(&normalize_header_block(b)))
        .unwrap_or_default();
    let fixed_names: Vec<&str> = fixed.iter().map(|e| e.name.as_str()).collect();

    let mut merged = fixed.clone();
    if let Some(block) = caller_block {
        for entry in parse_header_block(block) {
            if fixed_names.iter().any(|n| *n == entry.name) {
                continue;
            }
            merged.push(entry);
        }
    }
    merged
}
