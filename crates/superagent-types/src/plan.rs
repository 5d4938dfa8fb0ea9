use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{StepId, TaskId};

/// Resolves the Open Question in spec §9 about two conflicting
/// `TaskPriority` definitions in the original source: this is the single
/// priority type for the whole core. Registration call sites that would
/// otherwise accept a second, conflicting priority schema must reject it
/// (see `superagent-executor`'s tool/task registration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Normal,
    High,
    Critical,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Normal
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub priority: TaskPriority,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub success_criteria: Vec<String>,
    pub max_steps: usize,
    pub timeout_s: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepType {
    Think,
    Act,
    Observe,
    Reflect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_args: Value,
    #[serde(default)]
    pub dependencies: Vec<StepId>,
    #[serde(default)]
    pub priority: TaskPriority,
    pub success_probability: f32,
    pub max_retries: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_group: Option<String>,
    /// Output produced after this step runs; absent until then.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PlanValidationError {
    #[error("step {0} depends on unknown step {1}")]
    UnknownDependency(String, String),
    #[error("plan dependency graph contains a cycle involving step {0}")]
    Cycle(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub task_id: TaskId,
    pub steps: Vec<Step>,
    pub reasoning: String,
    /// step_id -> [step_id] it depends on. Redundant with `Step::dependencies`
    /// but kept as its own field per spec §3 so callers can query it without
    /// re-deriving from `steps`.
    pub dependency_graph: HashMap<StepId, Vec<StepId>>,
    pub parallel_groups: HashMap<String, Vec<StepId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u64>,
    pub success_probability: f32,
}

impl Plan {
    /// Build dependency_graph + parallel_groups from the explicit
    /// `dependencies`/`parallel_group` fields on each step, and validate the
    /// DAG invariant from spec §8 property 1: acyclic, every dependency id
    /// resolves to a step in the same plan.
    pub fn from_steps(
        task_id: TaskId,
        steps: Vec<Step>,
        reasoning: String,
        success_probability: f32,
    ) -> Result<Plan, PlanValidationError> {
        let ids: HashSet<&StepId> = steps.iter().map(|s| &s.id).collect();
        let mut dependency_graph = HashMap::new();
        for step in &steps {
            for dep in &step.dependencies {
                if !ids.contains(dep) {
                    return Err(PlanValidationError::UnknownDependency(
                        step.id.to_string(),
                        dep.to_string(),
                    ));
                }
            }
            dependency_graph.insert(step.id.clone(), step.dependencies.clone());
        }
        validate_acyclic(&dependency_graph)?;

        let parallel_groups = derive_parallel_groups(&steps);

        Ok(Plan {
            task_id,
            steps,
            reasoning,
            dependency_graph,
            parallel_groups,
            estimated_duration: None,
            success_probability,
        })
    }

    pub fn step(&self, id: &StepId) -> Option<&Step> {
        self.steps.iter().find(|s| &s.id == id)
    }

    /// Topological order of step ids, ready for an executor to walk.
    pub fn topological_order(&self) -> Result<Vec<StepId>, PlanValidationError> {
        topo_sort(&self.dependency_graph)
    }
}

fn validate_acyclic(graph: &HashMap<StepId, Vec<StepId>>) -> Result<(), PlanValidationError> {
    topo_sort(graph).map(|_| ())
}

fn topo_sort(graph: &HashMap<StepId, Vec<StepId>>) -> Result<Vec<StepId>, PlanValidationError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Temp,
        Perm,
    }
    let mut marks: HashMap<&StepId, Mark> = HashMap::new();
    let mut order = Vec::new();

    fn visit<'a>(
        node: &'a StepId,
        graph: &'a HashMap<StepId, Vec<StepId>>,
        marks: &mut HashMap<&'a StepId, Mark>,
        order: &mut Vec<StepId>,
    ) -> Result<(), PlanValidationError> {
        match marks.get(node) {
            Some(Mark::Perm) => return Ok(()),
            Some(Mark::Temp) => return Err(PlanValidationError::Cycle(node.to_string())),
            None => {}
        }
        marks.insert(node, Mark::Temp);
        if let Some(deps) = graph.get(node) {
            for dep in deps {
                visit(dep, graph, marks, order)?;
            }
        }
        marks.insert(node, Mark::Perm);
        order.push(node.clone());
        Ok(())
    }

    for node in graph.keys() {
        visit(node, graph, &mut marks, &mut order)?;
    }
    Ok(order)
}

/// Derive parallel groups: (i) explicit `parallel_group` labels and (ii)
/// maximal sets of steps sharing the same dependency set that are not
/// already in an explicit group (spec §4.3 PlannerAgent).
fn derive_parallel_groups(steps: &[Step]) -> HashMap<String, Vec<StepId>> {
    let mut groups: HashMap<String, Vec<StepId>> = HashMap::new();
    for step in steps {
        if let Some(label) = &step.parallel_group {
            groups.entry(label.clone()).or_default().push(step.id.clone());
        }
    }

    let mut by_deps: HashMap<Vec<StepId>, Vec<StepId>> = HashMap::new();
    for step in steps {
        if step.parallel_group.is_some() {
            continue;
        }
        let mut deps = step.dependencies.clone();
        deps.sort();
        by_deps.entry(deps).or_default().push(step.id.clone());
    }
    let mut auto_idx = 0usize;
    for (_, members) in by_deps {
        if members.len() > 1 {
            groups.insert(format!("auto-{auto_idx}"), members);
            auto_idx += 1;
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: &str, deps: &[&str], group: Option<&str>) -> Step {
        Step {
            id: StepId::new(id),
            step_type: StepType::Act,
            description: id.to_string(),
            tool_name: None,
            tool_args: Value::Null,
            dependencies: deps.iter().map(|d| StepId::new(*d)).collect(),
            priority: TaskPriority::Normal,
            success_probability: 0.9,
            max_retries: 3,
            parallel_group: group.map(|g| g.to_string()),
            output: None,
        }
    }

    #[test]
    fn builds_dag_and_detects_unknown_dependency() {
        let steps = vec![step("s1", &["missing"], None)];
        let err = Plan::from_steps(TaskId::new("t1"), steps, String::new(), 0.5).unwrap_err();
        assert!(matches!(err, PlanValidationError::UnknownDependency(_, _)));
    }

    #[test]
    fn detects_cycles() {
        let steps = vec![step("s1", &["s2"], None), step("s2", &["s1"], None)];
        let err = Plan::from_steps(TaskId::new("t1"), steps, String::new(), 0.5).unwrap_err();
        assert!(matches!(err, PlanValidationError::Cycle(_)));
    }

    #[test]
    fn derives_explicit_parallel_group() {
        let steps = vec![
            step("s1", &[], None),
            step("s2", &["s1"], Some("g")),
            step("s3", &["s1"], Some("g")),
        ];
        let plan = Plan::from_steps(TaskId::new("t1"), steps, String::new(), 0.5).unwrap();
        assert_eq!(plan.parallel_groups.get("g").unwrap().len(), 2);
    }

    #[test]
    fn derives_implicit_parallel_group_from_shared_dependencies() {
        let steps = vec![
            step("s1", &[], None),
            step("s2", &["s1"], None),
            step("s3", &["s1"], None),
        ];
        let plan = Plan::from_steps(TaskId::new("t1"), steps, String::new(), 0.5).unwrap();
        assert_eq!(plan.parallel_groups.len(), 1);
        let (_, members) = plan.parallel_groups.iter().next().unwrap();
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn topological_order_respects_dependencies() {
        let steps = vec![step("s1", &[], None), step("s2", &["s1"], None)];
        let plan = Plan::from_steps(TaskId::new("t1"), steps, String::new(), 0.5).unwrap();
        let order = plan.topological_order().unwrap();
        let pos = |id: &str| order.iter().position(|s| s.as_str() == id).unwrap();
        assert!(pos("s1") < pos("s2"));
    }
}
