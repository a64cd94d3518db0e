//! Problem instances: prepared JSON input, legacy text conversion and task
//! export.

mod reader;
mod schema;
mod tasks;
mod text;

pub use reader::{discover_files, discover_instances, instance_name, load_instance, parse_instance};
pub use schema::{InstanceFile, MachineSpec, OrientationSpec, PartSpec, ScalarId};
pub use tasks::{export_tasks, Task, TaskList};
pub use text::{convert_text_file, parse_text_instance};

use indexmap::IndexMap;
use std::path::PathBuf;

use crate::model::{Combination, Container, Dimensions};

/// A parsed instance: its containers and the items to pack into them.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub name: String,
    pub path: PathBuf,
    pub containers: Vec<Container>,
    /// Item key to dimensions, in file order.
    pub items: IndexMap<String, Dimensions>,
}

impl Instance {
    /// Item keys in file order.
    pub fn keys(&self) -> Vec<String> {
        self.items.keys().cloned().collect()
    }

    /// Dimensions of the combination's items, in the combination's order.
    pub fn dimensions_of(&self, combo: &Combination) -> Vec<Dimensions> {
        combo
            .keys()
            .iter()
            .filter_map(|k| self.items.get(k).copied())
            .collect()
    }
}
