//! Source map v3 generation.
//!
//! Mappings are recorded while printing: each statement and expression start
//! maps its generated position back to the start of its source span. The
//! `mappings` field uses the standard Base64 VLQ encoding; lines are
//! separated by `;` and segments by `,`. All columns count UTF-16 units.

use serde::{Deserialize, Serialize};

use ecmaform_types::Position;

/// The serialized map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    pub file: String,
    pub sources: Vec<String>,
    pub sources_content: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(data: &str) -> Option<Self> {
        serde_json::from_str(data).ok()
    }
}

/// One decoded segment: generated position, original position, and an
/// optional index into `names`. Lines and columns are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub generated_line: u32,
    pub generated_column: u32,
    pub source_line: u32,
    pub source_column: u32,
    pub name: Option<u32>,
}

/// Accumulates mappings during emission.
#[derive(Debug, Default)]
pub struct SourceMapBuilder {
    mappings: Vec<Mapping>,
    names: Vec<String>,
}

impl SourceMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map the generated position to `source` (1-based, as produced by
    /// [`SourceFile::position`](ecmaform_types::SourceFile::position)).
    pub fn add(&mut self, generated_line: u32, generated_column: u32, source: Position, name: Option<&str>) {
        let name = name.map(|n| self.name_index(n));
        if let Some(last) = self.mappings.last_mut() {
            if last.generated_line == generated_line && last.generated_column == generated_column {
                // An identifier starting its statement names the segment.
                if last.name.is_none() {
                    last.name = name;
                }
                return;
            }
        }
        self.mappings.push(Mapping {
            generated_line,
            generated_column,
            source_line: source.line.saturating_sub(1),
            source_column: source.column.saturating_sub(1),
            name,
        });
    }

    fn name_index(&mut self, name: &str) -> u32 {
        match self.names.iter().position(|n| n == name) {
            Some(i) => i as u32,
            None => {
                self.names.push(name.to_string());
                (self.names.len() - 1) as u32
            }
        }
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn build(self, file: &str, source_name: &str, source_content: &str) -> SourceMap {
        SourceMap {
            version: 3,
            file: file.to_string(),
            sources: vec![source_name.to_string()],
            sources_content: vec![source_content.to_string()],
            mappings: encode_mappings(&self.mappings),
            names: self.names,
        }
    }
}

fn encode_mappings(mappings: &[Mapping]) -> String {
    let mut out = String::new();
    let mut line = 0;
    let mut prev_gen_col = 0i64;
    let mut prev_src_line = 0i64;
    let mut prev_src_col = 0i64;
    let mut prev_name = 0i64;
    let mut first_in_line = true;
    for m in mappings {
        while line < m.generated_line {
            out.push(';');
            line += 1;
            prev_gen_col = 0;
            first_in_line = true;
        }
        if !first_in_line {
            out.push(',');
        }
        first_in_line = false;
        encode_vlq(&mut out, m.generated_column as i64 - prev_gen_col);
        prev_gen_col = m.generated_column as i64;
        // Single source: index delta is always zero.
        encode_vlq(&mut out, 0);
        encode_vlq(&mut out, m.source_line as i64 - prev_src_line);
        prev_src_line = m.source_line as i64;
        encode_vlq(&mut out, m.source_column as i64 - prev_src_col);
        prev_src_col = m.source_column as i64;
        if let Some(name) = m.name {
            encode_vlq(&mut out, name as i64 - prev_name);
            prev_name = name as i64;
        }
    }
    out
}

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Append one Base64 VLQ value.
pub fn encode_vlq(out: &mut String, value: i64) {
    let mut vlq = if value < 0 {
        ((-value as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };
    loop {
        let mut digit = (vlq & 0b11111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b100000;
        }
        out.push(BASE64[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

/// Decode a `mappings` string back into absolute segments.
pub fn decode_mappings(mappings: &str) -> Option<Vec<Mapping>> {
    let mut out = Vec::new();
    let (mut src_line, mut src_col, mut name) = (0i64, 0i64, 0i64);
    for (line, segments) in mappings.split(';').enumerate() {
        let mut gen_col = 0i64;
        for segment in segments.split(',').filter(|s| !s.is_empty()) {
            let fields = decode_vlq_segment(segment)?;
            if fields.len() < 4 {
                return None;
            }
            gen_col += fields[0];
            src_line += fields[2];
            src_col += fields[3];
            let name_index = match fields.get(4) {
                Some(delta) => {
                    name += delta;
                    Some(name as u32)
                }
                None => None,
            };
            out.push(Mapping {
                generated_line: line as u32,
                generated_column: gen_col as u32,
                source_line: src_line as u32,
                source_column: src_col as u32,
                name: name_index,
            });
        }
    }
    Some(out)
}

fn decode_vlq_segment(segment: &str) -> Option<Vec<i64>> {
    let mut values = Vec::new();
    let mut shift = 0;
    let mut acc: u64 = 0;
    for byte in segment.bytes() {
        let digit = BASE64.iter().position(|&b| b == byte)? as u64;
        acc |= (digit & 0b11111) << shift;
        if digit & 0b100000 != 0 {
            shift += 5;
            continue;
        }
        let value = (acc >> 1) as i64;
        values.push(if acc & 1 == 1 { -value } else { value });
        acc = 0;
        shift = 0;
    }
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlq(value: i64) -> String {
        let mut s = String::new();
        encode_vlq(&mut s, value);
        s
    }

    #[test]
    fn test_vlq_known_values() {
        assert_eq!(vlq(0), "A");
        assert_eq!(vlq(1), "C");
        assert_eq!(vlq(-1), "D");
        assert_eq!(vlq(15), "e");
        assert_eq!(vlq(16), "gB");
        assert_eq!(vlq(-16), "hB");
        assert_eq!(vlq(1000), "w+B");
    }

    #[test]
    fn test_mappings_decode_to_recorded_positions() {
        let mut builder = SourceMapBuilder::new();
        builder.add(0, 0, Position { line: 1, column: 1 }, None);
        builder.add(0, 4, Position { line: 1, column: 7 }, Some("x"));
        builder.add(2, 4, Position { line: 3, column: 5 }, Some("x"));
        let recorded = builder.mappings().to_vec();
        let map = builder.build("out.js", "in.js", "source");
        assert_eq!(map.mappings, "AAAA,IAAMA;;IAEAA");
        assert_eq!(decode_mappings(&map.mappings), Some(recorded));
        assert_eq!(map.names, vec!["x"]);
    }

    #[test]
    fn test_duplicate_positions_are_skipped() {
        let mut builder = SourceMapBuilder::new();
        builder.add(0, 0, Position { line: 1, column: 1 }, None);
        builder.add(0, 0, Position { line: 1, column: 3 }, None);
        assert_eq!(builder.mappings().len(), 1);
    }

    #[test]
    fn test_json_shape() {
        let map = SourceMapBuilder::new().build("a.js", "a.ts", "let a;");
        let json = map.to_json().expect("serializes");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["version"], 3);
        assert_eq!(value["sources"][0], "a.ts");
        assert_eq!(value["sourcesContent"][0], "let a;");
        assert!(value["names"].is_array());
        assert_eq!(SourceMap::from_json(&json), Some(map));
    }
}
