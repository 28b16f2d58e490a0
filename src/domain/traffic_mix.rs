//! Traffic Mix
//!
//! Expected distribution of load derived from a scenario model: how users are
//! spread over the concrete user classes, how task executions are spread over
//! tasks, and how often each endpoint is hit.

use crate::domain::model::{ScenarioModel, UserClassModel};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrafficMix {
    /// Non-abstract user classes in declaration order.
    pub classes: Vec<ClassShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassShare {
    pub name: String,
    pub weight: u32,
    /// Fraction of spawned users running this class.
    pub share: f64,
    pub tasks: Vec<TaskShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskShare {
    pub name: String,
    pub weight: u32,
    /// Probability of picking this task within its class.
    pub share_in_class: f64,
    /// `share_in_class` scaled by the class share.
    pub overall_share: f64,
    /// Labels of the task's call sites (`GET /`), in lexical order.
    pub endpoints: Vec<String>,
}

impl TrafficMix {
    pub fn from_model(model: &ScenarioModel) -> Self {
        let concrete: Vec<&UserClassModel> =
            model.user_classes.iter().filter(|c| !c.is_abstract).collect();
        let total_class_weight: u64 = concrete.iter().map(|c| u64::from(c.weight)).sum();

        let classes = concrete
            .into_iter()
            .map(|class| {
                let share = ratio(u64::from(class.weight), total_class_weight);
                let total_task_weight = class.total_task_weight();
                let tasks = class
                    .tasks
                    .iter()
                    .map(|task| {
                        let share_in_class = ratio(u64::from(task.weight), total_task_weight);
                        TaskShare {
                            name: task.name.clone(),
                            weight: task.weight,
                            share_in_class,
                            overall_share: share_in_class * share,
                            endpoints: task.calls.iter().map(|c| c.label()).collect(),
                        }
                    })
                    .collect();

                ClassShare {
                    name: class.name.clone(),
                    weight: class.weight,
                    share,
                    tasks,
                }
            })
            .collect();

        TrafficMix { classes }
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Expected requests per endpoint for one task execution picked across
    /// the whole mix.
    pub fn endpoint_rates(&self) -> BTreeMap<String, f64> {
        let mut rates = BTreeMap::new();
        for task in self.classes.iter().flat_map(|c| c.tasks.iter()) {
            for endpoint in &task.endpoints {
                *rates.entry(endpoint.clone()).or_insert(0.0) += task.overall_share;
            }
        }
        rates
    }
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}
