//! Group-code level reading of ASCII DXF.
//!
//! An ASCII DXF file is a flat list of lines alternating between an integer
//! group code and its value. Code `0` introduces a new record (a section
//! marker or an entity); the other codes are the record's fields.

use geoconv_core::{ConvertError, Result};
use tracing::debug;

/// One `(group code, value)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupPair<'a> {
    /// Integer group code.
    pub code: i32,
    /// Value with surrounding whitespace removed.
    pub value: &'a str,
    /// 1-indexed line of the code.
    pub line: usize,
}

/// A record: the pairs from one code-0 pair up to (not including) the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// Record type, the code-0 value (e.g. `LINE`).
    pub kind: &'a str,
    /// Field pairs following the code-0 pair.
    pub fields: &'a [GroupPair<'a>],
}

/// Split DXF text into group pairs.
///
/// Accepts `\n` and `\r\n` line endings. Blank code lines are ignored
/// wherever they appear, and a trailing code without a value is dropped.
/// A pair whose code is not an integer is skipped so one damaged record
/// cannot sink the rest of the file.
pub fn read_pairs(text: &str) -> Vec<GroupPair<'_>> {
    let mut pairs = Vec::new();
    let mut lines = text.lines().enumerate();
    while let Some((idx, code_line)) = lines.next() {
        let code_line = code_line.trim();
        if code_line.is_empty() {
            continue;
        }
        let Some((_, value)) = lines.next() else {
            break;
        };
        match code_line.parse::<i32>() {
            Ok(code) => pairs.push(GroupPair {
                code,
                value: value.trim(),
                line: idx + 1,
            }),
            Err(_) => debug!(line = idx + 1, code = code_line, "skipping invalid group code"),
        }
    }
    pairs
}

/// Check the coarse markers every DXF with drawable content has.
///
/// Fails with `DXF_MISSING_SECTION` when no `SECTION` line exists and with
/// `DXF_MISSING_ENTITIES` when no `ENTITIES` line exists.
pub fn validate_markers(text: &str) -> Result<()> {
    let mut has_section = false;
    let mut has_entities = false;
    for line in text.lines() {
        match line.trim() {
            "SECTION" => has_section = true,
            "ENTITIES" => has_entities = true,
            _ => {}
        }
        if has_section && has_entities {
            return Ok(());
        }
    }
    if !has_section {
        return Err(ConvertError::validation(
            "DXF_MISSING_SECTION",
            "Invalid DXF file: Missing SECTION marker",
        ));
    }
    Err(ConvertError::validation(
        "DXF_MISSING_ENTITIES",
        "Invalid DXF file: Missing ENTITIES section",
    ))
}

/// The pairs inside the `ENTITIES` section, excluding the section
/// markers themselves.
///
/// A section left open at end of file runs to the last pair.
pub fn entities_section<'a>(pairs: &'a [GroupPair<'a>]) -> Result<&'a [GroupPair<'a>]> {
    let start = pairs
        .windows(2)
        .position(|w| {
            w[0].code == 0 && w[0].value == "SECTION" && w[1].code == 2 && w[1].value == "ENTITIES"
        })
        .map(|i| i + 2)
        .ok_or_else(|| {
            ConvertError::validation("DXF_MISSING_ENTITIES", "No ENTITIES section found")
        })?;
    let len = pairs[start..]
        .iter()
        .position(|p| p.code == 0 && p.value == "ENDSEC")
        .unwrap_or(pairs.len() - start);
    Ok(&pairs[start..start + len])
}

/// Group pairs into records at each code-0 pair.
///
/// Pairs before the first code-0 pair are dropped.
pub fn records<'a>(pairs: &'a [GroupPair<'a>]) -> Vec<Record<'a>> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < pairs.len() {
        if pairs[i].code != 0 {
            i += 1;
            continue;
        }
        let kind = pairs[i].value;
        let start = i + 1;
        let end = pairs[start..]
            .iter()
            .position(|p| p.code == 0)
            .map_or(pairs.len(), |n| start + n);
        out.push(Record {
            kind,
            fields: &pairs[start..end],
        });
        i = end;
    }
    out
}
