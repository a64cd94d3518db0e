//! Serde model of a prepared instance file.
//!
//! ```json
//! {
//!   "machines": [{"machine_id": 1, "num_machine": 1, "V": 0, "U": 0, "S": 0, "L": 10, "W": 10, "H": 5}],
//!   "parts": [{"part_id": 1, "num_part": 2, "num_orientation": 1, "volume": 8,
//!              "orientations": [{"l": 4, "w": 4, "h": 0.5, "support": 1}]}],
//!   "types_machine": 1, "types_parts": 1, "num_machine": 1, "num_parts": 2
//! }
//! ```
//!
//! Only `machine_id`, `L`, `W`, `part_id`, `num_part` and the first
//! orientation's `l` and `w` are needed for the search; the rest is carried
//! so that converted files keep every field of the source.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `machine_id` or `part_id`, written back in the form it was read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarId {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ScalarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarId::Int(n) => write!(f, "{}", n),
            ScalarId::Float(x) => write!(f, "{}", x),
            ScalarId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceFile {
    #[serde(default)]
    pub machines: Vec<MachineSpec>,

    #[serde(default)]
    pub parts: Vec<PartSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types_machine: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types_parts: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_machine: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_parts: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSpec {
    pub machine_id: ScalarId,

    #[serde(default = "default_count")]
    pub num_machine: u32,

    #[serde(rename = "V", default)]
    pub v: f64,

    #[serde(rename = "U", default)]
    pub u: f64,

    #[serde(rename = "S", default)]
    pub s: f64,

    #[serde(rename = "L")]
    pub length: f64,

    #[serde(rename = "W")]
    pub width: f64,

    #[serde(rename = "H", default)]
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartSpec {
    pub part_id: ScalarId,

    #[serde(default = "default_count")]
    pub num_part: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_orientation: Option<u32>,

    #[serde(default)]
    pub volume: f64,

    #[serde(default)]
    pub orientations: Vec<OrientationSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationSpec {
    pub l: f64,
    pub w: f64,

    #[serde(default)]
    pub h: f64,

    #[serde(default)]
    pub support: f64,
}

fn default_count() -> u32 {
    1
}
