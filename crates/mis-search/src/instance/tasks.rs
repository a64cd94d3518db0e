use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::Instance;
use crate::enumerate::{Combinations, Strategy};
use crate::model::{ContainerId, Dimensions};

/// One (container, combination) feasibility question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Task {
    pub machine_id: ContainerId,
    #[serde(rename = "L")]
    pub length: f64,
    #[serde(rename = "W")]
    pub width: f64,
    pub combination: Vec<String>,
    pub items: IndexMap<String, Dimensions>,
}

/// Every task of one instance, in enumeration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TaskList {
    pub instance: String,
    pub strategy: Strategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_combination_size: Option<usize>,
    pub tasks: Vec<Task>,
}

/// List the tasks a sweep of `instance` would consider, container by
/// container.
pub fn export_tasks(instance: &Instance, strategy: Strategy, max_size: Option<usize>) -> TaskList {
    let keys = instance.keys();
    let mut tasks = Vec::new();

    for container in &instance.containers {
        for combo in Combinations::new(&keys, strategy, max_size) {
            tasks.push(Task {
                machine_id: container.id.clone(),
                length: container.length,
                width: container.width,
                items: combo
                    .keys()
                    .iter()
                    .filter_map(|k| instance.items.get(k).map(|d| (k.clone(), *d)))
                    .collect(),
                combination: combo.keys().to_vec(),
            });
        }
    }

    TaskList {
        instance: instance.name.clone(),
        strategy,
        max_combination_size: max_size,
        tasks,
    }
}
