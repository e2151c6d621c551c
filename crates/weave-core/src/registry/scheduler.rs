//! Dependency-ordered startup.
//!
//! One coordinating loop owns the per-node counters of unfinished
//! requirements. Ready nodes are `init`-ed by the coordinator and their `run`
//! spawned onto a [`JoinSet`]; completions are consumed one at a time, so a
//! dependent is released exactly once, by the coordinator, after its last
//! requirement finished.
//!
//! Nodes already running when startup begins (started on demand through
//! `Registry::run_component`) count as done from the outset and are not
//! spawned again.
//!
//! On the first failure no further nodes are started. Runs already in flight
//! are allowed to finish; their failures are recorded as secondary.
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::component::{ComponentError, ComponentState, ManagedComponent};
use crate::kernel::error::{Error, Result};
use crate::registry::error::RegistryError;
use crate::registry::graph::DependencyGraph;
use crate::registry::component_registry::Registry;

pub(crate) struct StartupScheduler {
    registry: Registry,
    graph: DependencyGraph,
    components: BTreeMap<String, Arc<ManagedComponent>>,
    timeout: Option<Duration>,
}

struct FailureLog {
    first: Option<(String, Error)>,
    also_failed: Vec<String>,
}

impl FailureLog {
    fn record(&mut self, component: String, error: Error) {
        if self.first.is_none() {
            log::error!("Startup failed in component '{}': {}", component, error);
            self.first = Some((component, error));
        } else {
            log::error!("Component '{}' also failed during startup: {}", component, error);
            self.also_failed.push(component);
        }
    }

    fn has_failed(&self) -> bool {
        self.first.is_some()
    }
}

impl StartupScheduler {
    pub(crate) fn new(
        registry: Registry,
        graph: DependencyGraph,
        components: BTreeMap<String, Arc<ManagedComponent>>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            registry,
            graph,
            components,
            timeout,
        }
    }

    /// Drive every node to `Running`. Returns the order in which components
    /// became ready, or the first failure.
    pub(crate) async fn run(self) -> Result<Vec<String>> {
        let mut remaining = self.graph.in_degrees();
        let mut ready: VecDeque<String> = remaining
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| name.clone())
            .collect();
        let mut tasks: JoinSet<(String, Result<()>)> = JoinSet::new();
        let mut completed: Vec<String> = Vec::with_capacity(self.components.len());
        let mut failures = FailureLog {
            first: None,
            also_failed: Vec::new(),
        };

        let already_running: BTreeSet<String> = self
            .components
            .iter()
            .filter(|(_, managed)| managed.state() == ComponentState::Running)
            .map(|(name, _)| name.clone())
            .collect();
        for name in &already_running {
            log::debug!("'{}' is already running, releasing its dependents", name);
            self.release(name, &mut remaining, &mut ready);
        }

        loop {
            while !failures.has_failed() {
                let Some(name) = ready.pop_front() else { break };
                if already_running.contains(&name) {
                    continue;
                }
                if let Err(e) = self.start(&name, &mut tasks) {
                    failures.record(name, e);
                }
            }

            let Some(joined) = tasks.join_next().await else { break };
            match joined {
                Ok((name, Ok(()))) => {
                    if !failures.has_failed() {
                        self.release(&name, &mut remaining, &mut ready);
                    }
                    completed.push(name);
                }
                Ok((name, Err(e))) => failures.record(name, e),
                Err(join_error) => failures.record(
                    "<scheduler>".to_string(),
                    RegistryError::InternalError(format!("startup task aborted: {}", join_error)).into(),
                ),
            }
        }

        match failures.first {
            None => Ok(completed),
            Some((component, source)) => {
                let abandoned: Vec<&str> = self
                    .components
                    .values()
                    .filter(|managed| managed.state() == ComponentState::Configured)
                    .map(|managed| managed.name())
                    .collect();
                if !abandoned.is_empty() {
                    log::warn!("Startup abandoned before starting: {}", abandoned.join(", "));
                }
                Err(RegistryError::StartupFailed {
                    component,
                    source: Box::new(source),
                    also_failed: failures.also_failed,
                }
                .into())
            }
        }
    }

    /// Count `name` as done for each dependent, queueing those left with no
    /// unfinished requirement.
    fn release(&self, name: &str, remaining: &mut BTreeMap<String, usize>, ready: &mut VecDeque<String>) {
        for dependent in self.graph.dependents_of(name) {
            if let Some(degree) = remaining.get_mut(dependent) {
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    log::debug!("'{}' unblocked by '{}'", dependent, name);
                    ready.push_back(dependent.clone());
                }
            }
        }
    }

    /// Initialize `name` and spawn its `run`.
    fn start(&self, name: &str, tasks: &mut JoinSet<(String, Result<()>)>) -> Result<()> {
        let managed = self
            .components
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::ComponentNotFound { name: name.to_string() })?;
        let ctx = self.registry.context_for(&managed);
        managed.init(&ctx)?;

        let timeout = self.timeout;
        let name = name.to_string();
        tasks.spawn(async move {
            let watched = managed.clone();
            // Inner task so a panicking `run` is still attributed to its component.
            let handle = tokio::spawn(async move { managed.run(&ctx, timeout).await });
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    watched.mark_failed();
                    Err(ComponentError::failed(
                        watched.name(),
                        format!("run did not complete: {}", join_error),
                    )
                    .into())
                }
            };
            (name, outcome)
        });
        Ok(())
    }
}
