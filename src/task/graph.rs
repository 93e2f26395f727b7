//! Named tasks with declared dependencies.
//!
//! ```text
//! build ─▶ dist:rev ─▶ dist:assets ─▶ dist:clean
//! ```
//!
//! `plan(target)` returns the dependencies-first order of exactly the tasks
//! `target` needs. Ties are broken by registration order, so a plan is always
//! the same for the same graph.

use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use thiserror::Error;

use crate::log;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("unknown task `{0}`")]
    Unknown(String),

    #[error("task `{task}` depends on unknown task `{dependency}`")]
    UnknownDependency { task: String, dependency: String },

    #[error("dependency cycle between tasks: {}", .0.join(", "))]
    Cycle(Vec<String>),

    #[error("task `{task}` failed")]
    Failed {
        task: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Index of a task in its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(usize);

/// What a task did, for the final exit status.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskOutcome {
    /// Per-file failures; output was still produced for the rest.
    pub failures: usize,
}

impl TaskOutcome {
    pub const OK: Self = Self { failures: 0 };

    pub fn with_failures(failures: usize) -> Self {
        Self { failures }
    }
}

type Action<C> = Box<dyn Fn(&C) -> anyhow::Result<TaskOutcome> + Send + Sync>;

struct Task<C> {
    name: String,
    dependencies: Vec<String>,
    action: Action<C>,
}

/// Summary of a completed run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub executed: Vec<String>,
    pub failures: usize,
}

impl RunReport {
    pub fn is_ok(&self) -> bool {
        self.failures == 0
    }
}

/// Task graph over a context `C` handed to every action.
pub struct TaskGraph<C> {
    tasks: Vec<Task<C>>,
    index: FxHashMap<String, TaskId>,
}

impl<C> Default for TaskGraph<C> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<C> fmt::Debug for TaskGraph<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.tasks.iter().map(|t| (&t.name, &t.dependencies)))
            .finish()
    }
}

impl<C> TaskGraph<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`. Re-registering a name replaces the earlier task.
    pub fn task<F>(&mut self, name: &str, dependencies: &[&str], action: F) -> &mut Self
    where
        F: Fn(&C) -> anyhow::Result<TaskOutcome> + Send + Sync + 'static,
    {
        let task = Task {
            name: name.to_string(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            action: Box::new(action),
        };
        match self.index.get(name) {
            Some(&TaskId(i)) => self.tasks[i] = task,
            None => {
                self.index.insert(name.to_string(), TaskId(self.tasks.len()));
                self.tasks.push(task);
            }
        }
        self
    }

    pub fn name(&self, id: TaskId) -> &str {
        &self.tasks[id.0].name
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    fn id(&self, name: &str) -> Result<TaskId, TaskError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| TaskError::Unknown(name.to_string()))
    }

    fn dependency_ids(&self, id: TaskId) -> Result<Vec<TaskId>, TaskError> {
        let task = &self.tasks[id.0];
        task.dependencies
            .iter()
            .map(|dep| {
                self.index
                    .get(dep)
                    .copied()
                    .ok_or_else(|| TaskError::UnknownDependency {
                        task: task.name.clone(),
                        dependency: dep.clone(),
                    })
            })
            .collect()
    }

    /// Dependencies-first order of the tasks `target` needs, `target` last.
    pub fn plan(&self, target: &str) -> Result<Vec<TaskId>, TaskError> {
        // tasks reachable from the target
        let root = self.id(target)?;
        let mut needed = FxHashSet::default();
        let mut stack = vec![root];
        let mut deps: FxHashMap<TaskId, Vec<TaskId>> = FxHashMap::default();
        while let Some(id) = stack.pop() {
            if !needed.insert(id) {
                continue;
            }
            let ids = self.dependency_ids(id)?;
            stack.extend(ids.iter().copied());
            deps.insert(id, ids);
        }

        // Kahn's algorithm over the needed subgraph
        let mut in_degree: FxHashMap<TaskId, usize> =
            needed.iter().map(|&id| (id, deps[&id].len())).collect();
        let mut dependents: FxHashMap<TaskId, Vec<TaskId>> = FxHashMap::default();
        for (&id, ids) in &deps {
            for &dep in ids {
                dependents.entry(dep).or_default().push(id);
            }
        }

        let mut ready: BinaryHeap<Reverse<TaskId>> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(&id, _)| Reverse(id))
            .collect();
        let mut order = Vec::with_capacity(needed.len());
        while let Some(Reverse(id)) = ready.pop() {
            order.push(id);
            for &next in dependents.get(&id).into_iter().flatten() {
                let degree = in_degree.entry(next).or_default();
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if order.len() != needed.len() {
            let mut stuck: Vec<TaskId> = needed
                .into_iter()
                .filter(|id| !order.contains(id))
                .collect();
            stuck.sort();
            return Err(TaskError::Cycle(
                stuck.into_iter().map(|id| self.name(id).to_string()).collect(),
            ));
        }
        Ok(order)
    }

    /// Execute the plan of `target`, stopping at the first failing task.
    pub fn run(&self, target: &str, ctx: &C) -> Result<RunReport, TaskError> {
        let plan = self.plan(target)?;
        let mut report = RunReport::default();

        for id in plan {
            let task = &self.tasks[id.0];
            log!("task"; "{}", task.name);
            let outcome = (task.action)(ctx).map_err(|source| TaskError::Failed {
                task: task.name.clone(),
                source,
            })?;
            report.failures += outcome.failures;
            report.executed.push(task.name.clone());
        }
        Ok(report)
    }
}
