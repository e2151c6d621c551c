use std::collections::{BTreeMap, VecDeque};

use crate::component::ManagedComponent;
use crate::registry::error::RegistryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// The "requires" graph of a set of components.
///
/// Nodes are kept in sorted order so that validation errors and startup plans
/// are deterministic regardless of registration order.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// node -> the nodes it requires
    requirements: BTreeMap<String, Vec<String>>,
    /// node -> the nodes requiring it
    dependents: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for a set of registered components.
    pub fn from_components<'a, I>(components: I) -> Self
    where
        I: IntoIterator<Item = &'a ManagedComponent>,
    {
        let mut graph = Self::new();
        for component in components {
            graph.add_node(component.name(), component.requirements());
        }
        graph
    }

    /// Add a node with its requirements. Duplicate requirements are ignored.
    pub fn add_node(&mut self, name: &str, requirements: &[String]) {
        let entry = self.requirements.entry(name.to_string()).or_default();
        for requirement in requirements {
            if entry.contains(requirement) {
                continue;
            }
            entry.push(requirement.clone());
            self.dependents
                .entry(requirement.clone())
                .or_default()
                .push(name.to_string());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.requirements.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &String> {
        self.requirements.keys()
    }

    pub fn requirements_of(&self, name: &str) -> &[String] {
        self.requirements.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.dependents.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of (deduplicated) requirements per node.
    pub fn in_degrees(&self) -> BTreeMap<String, usize> {
        self.requirements
            .iter()
            .map(|(name, requirements)| (name.clone(), requirements.len()))
            .collect()
    }

    /// First requirement naming an unknown node, as `(component, dependency)`.
    pub fn missing_dependency(&self) -> Option<(String, String)> {
        self.requirements.iter().find_map(|(name, requirements)| {
            requirements
                .iter()
                .find(|requirement| !self.requirements.contains_key(*requirement))
                .map(|missing| (name.clone(), missing.clone()))
        })
    }

    /// Find a cycle with a three-colour depth-first traversal.
    ///
    /// Returns the cycle path closed on its first member, e.g.
    /// `["a", "b", "a"]`.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut marks: BTreeMap<&str, Mark> = self
            .requirements
            .keys()
            .map(|name| (name.as_str(), Mark::Unvisited))
            .collect();
        let mut path: Vec<&str> = Vec::new();

        for name in self.requirements.keys() {
            if marks.get(name.as_str()) == Some(&Mark::Unvisited) {
                if let Some(cycle) = self.visit(name, &mut marks, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn visit<'a>(
        &'a self,
        node: &'a str,
        marks: &mut BTreeMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        marks.insert(node, Mark::InProgress);
        path.push(node);

        for requirement in self.requirements_of(node) {
            match marks.get(requirement.as_str()) {
                Some(Mark::Unvisited) => {
                    if let Some(cycle) = self.visit(requirement, marks, path) {
                        return Some(cycle);
                    }
                }
                Some(Mark::InProgress) => {
                    // Back edge: the cycle is the path suffix starting at `requirement`.
                    let start = path.iter().position(|n| *n == requirement.as_str()).unwrap_or(0);
                    let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                    cycle.push(requirement.clone());
                    return Some(cycle);
                }
                // Done, or unknown (reported by `missing_dependency`)
                _ => {}
            }
        }

        path.pop();
        marks.insert(node, Mark::Done);
        None
    }

    /// Reject missing dependencies first, then cycles.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if let Some((component, dependency)) = self.missing_dependency() {
            return Err(RegistryError::MissingDependency {
                component,
                dependency,
            });
        }
        if let Some(cycle) = self.find_cycle() {
            return Err(RegistryError::CyclicDependency { cycle });
        }
        Ok(())
    }

    /// Nodes grouped into layers: every node's requirements sit in earlier
    /// layers, and nodes within a layer may start concurrently.
    pub fn layers(&self) -> Result<Vec<Vec<String>>, RegistryError> {
        self.validate()?;

        let mut remaining = self.in_degrees();
        let mut current: Vec<String> = remaining
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| name.clone())
            .collect();
        let mut layers = Vec::new();

        while !current.is_empty() {
            let mut next = Vec::new();
            for name in &current {
                for dependent in self.dependents_of(name) {
                    if let Some(degree) = remaining.get_mut(dependent) {
                        *degree -= 1;
                        if *degree == 0 {
                            next.push(dependent.clone());
                        }
                    }
                }
            }
            next.sort();
            layers.push(std::mem::replace(&mut current, next));
        }
        Ok(layers)
    }

    /// A single dependency-first order (Kahn's algorithm).
    pub fn topological_order(&self) -> Result<Vec<String>, RegistryError> {
        self.validate()?;

        let mut remaining = self.in_degrees();
        let mut queue: VecDeque<String> = remaining
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| name.clone())
            .collect();
        let mut order = Vec::with_capacity(self.len());

        while let Some(name) = queue.pop_front() {
            for dependent in self.dependents_of(&name) {
                if let Some(degree) = remaining.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(dependent.clone());
                    }
                }
            }
            order.push(name);
        }
        Ok(order)
    }
}
