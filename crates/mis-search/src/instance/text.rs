//! Conversion of the legacy whitespace text format into instance JSON.
//!
//! ```text
//! types_machine types_parts
//! num_machine num_parts
//! id num V U S L W H              (one line per machine type)
//! id num_part num_orientation volume
//! l w h support                   (num_orientation lines per part type)
//! ```
//!
//! Blank lines are ignored.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use super::schema::{InstanceFile, MachineSpec, OrientationSpec, PartSpec, ScalarId};
use crate::error::{Result, SearchError};

struct Lines<'a> {
    lines: Vec<&'a str>,
    next: usize,
}

impl<'a> Lines<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            lines: content.lines().map(str::trim).filter(|l| !l.is_empty()).collect(),
            next: 0,
        }
    }

    /// Tokens of the next line, which must hold at least `min` of them.
    fn take(&mut self, what: &str, min: usize) -> std::result::Result<Vec<&'a str>, String> {
        let line = self
            .lines
            .get(self.next)
            .ok_or_else(|| format!("unexpected end of input, expected {}", what))?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < min {
            return Err(format!("line {}: expected {}, got '{}'", self.next + 1, what, line));
        }
        self.next += 1;
        Ok(tokens)
    }
}

fn number<T: FromStr>(token: &str, what: &str) -> std::result::Result<T, String> {
    token
        .parse()
        .map_err(|_| format!("invalid {} '{}'", what, token))
}

fn parse(content: &str) -> std::result::Result<InstanceFile, String> {
    let mut lines = Lines::new(content);

    let header = lines.take("types_machine types_parts", 2)?;
    let types_machine: u32 = number(header[0], "types_machine")?;
    let types_parts: u32 = number(header[1], "types_parts")?;

    let counts = lines.take("num_machine num_parts", 2)?;
    let num_machine: u32 = number(counts[0], "num_machine")?;
    let num_parts: u32 = number(counts[1], "num_parts")?;

    let mut machines = Vec::new();
    for _ in 0..types_machine {
        let t = lines.take("machine line 'id num V U S L W H'", 8)?;
        let values = t[2..8]
            .iter()
            .map(|v| number::<f64>(v, "machine value"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        machines.push(MachineSpec {
            machine_id: ScalarId::Int(number(t[0], "machine id")?),
            num_machine: number(t[1], "machine count")?,
            v: values[0],
            u: values[1],
            s: values[2],
            length: values[3],
            width: values[4],
            height: values[5],
        });
    }

    let mut parts = Vec::new();
    for _ in 0..types_parts {
        let t = lines.take("part line 'id num_part num_orientation volume'", 4)?;
        let num_orientation: u32 = number(t[2], "num_orientation")?;

        let mut orientations = Vec::new();
        for _ in 0..num_orientation {
            let o = lines.take("orientation line 'l w h support'", 4)?;
            orientations.push(OrientationSpec {
                l: number(o[0], "length")?,
                w: number(o[1], "width")?,
                h: number(o[2], "height")?,
                support: number(o[3], "support")?,
            });
        }

        parts.push(PartSpec {
            part_id: ScalarId::Int(number(t[0], "part id")?),
            num_part: number(t[1], "part count")?,
            num_orientation: Some(num_orientation),
            volume: number(t[3], "volume")?,
            orientations,
        });
    }

    Ok(InstanceFile {
        machines,
        parts,
        types_machine: Some(types_machine),
        types_parts: Some(types_parts),
        num_machine: Some(num_machine),
        num_parts: Some(num_parts),
    })
}

/// Parse legacy text content; `path` is only used for error reporting.
pub fn parse_text_instance(path: &Path, content: &str) -> Result<InstanceFile> {
    parse(content).map_err(|reason| SearchError::malformed(path, reason))
}

/// Convert one `.txt` instance into pretty-printed JSON at `dest`.
pub fn convert_text_file(source: &Path, dest: &Path) -> Result<()> {
    let content = fs::read_to_string(source)?;
    let file = parse_text_instance(source, &content)?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, serde_json::to_string_pretty(&file)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::load_instance;
    use tempfile::TempDir;

    const SAMPLE: &str = "1 2\n\n1 3\n1 1 0 0 0 10 10 5\n1 2 2 16\n4 4 1 1\n4 1 4 0\n2 1 1 64\n8 8 1 1\n";

    #[test]
    fn test_parse_text() {
        let file = parse_text_instance(Path::new("s.txt"), SAMPLE).unwrap();
        assert_eq!(file.types_machine, Some(1));
        assert_eq!(file.num_parts, Some(3));
        assert_eq!(file.machines[0].length, 10.0);
        assert_eq!(file.parts.len(), 2);
        assert_eq!(file.parts[0].orientations.len(), 2);
        assert_eq!(file.parts[1].orientations[0].l, 8.0);
    }

    #[test]
    fn test_truncated_input() {
        let err = parse_text_instance(Path::new("s.txt"), "1 1\n1 1\n1 1 0 0 0 10 10 5\n1 1 2 4\n2 2 1 1\n").unwrap_err();
        assert!(err.to_string().contains("orientation"));

        let err = parse_text_instance(Path::new("s.txt"), "1 1\n1 1\n1 1 0 0 10 10\n").unwrap_err();
        assert!(matches!(err, SearchError::MalformedInstance { .. }));
    }

    #[test]
    fn test_oversized_counts_are_malformed() {
        for content in [
            "4000000000 1\n1 1\n",
            "0 4000000000\n0 1\n",
            "0 1\n0 1\n1 1 4000000000 4\n1 1 1 1\n",
        ] {
            let err = parse_text_instance(Path::new("big.txt"), content).unwrap_err();
            assert!(err.to_string().contains("unexpected end of input"), "{}", err);
        }
    }

    #[test]
    fn test_convert_round_trips_through_reader() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("s.txt");
        let dest = dir.path().join("json").join("s.json");
        fs::write(&source, SAMPLE).unwrap();

        convert_text_file(&source, &dest).unwrap();
        let instance = load_instance(&dest).unwrap();
        let keys: Vec<&str> = instance.items.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["1-1", "1-2", "2-1"]);
        assert_eq!(instance.containers[0].id.as_str(), "1");
    }
}
