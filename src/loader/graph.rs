// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Dependency graph over pool indices.
//!
//! Nodes are indices into the loader's record list; edges point from a
//! module to the pool members it references. References to anything outside
//! the pool, and self-references, are dropped when the graph is built.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::LoadError;

/// Index-based dependency graph.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    names: Vec<String>,
    dependencies: Vec<Vec<usize>>,
    dependents: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Builds the graph from `(name, references)` pairs; node `i` is the
    /// `i`-th pair.
    pub fn build<'a, I, R>(nodes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, R)>,
        R: IntoIterator<Item = &'a str>,
    {
        let nodes: Vec<(&str, Vec<&str>)> = nodes
            .into_iter()
            .map(|(name, refs)| (name, refs.into_iter().collect()))
            .collect();

        let index: BTreeMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (*name, i))
            .collect();

        let mut dependencies = vec![Vec::new(); nodes.len()];
        let mut dependents = vec![Vec::new(); nodes.len()];

        for (i, (_, refs)) in nodes.iter().enumerate() {
            let targets: BTreeSet<usize> = refs
                .iter()
                .filter_map(|r| index.get(r).copied())
                .filter(|&j| j != i)
                .collect();
            for j in targets {
                dependencies[i].push(j);
                dependents[j].push(i);
            }
        }

        Self {
            names: nodes.into_iter().map(|(name, _)| name.to_string()).collect(),
            dependencies,
            dependents,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn name(&self, node: usize) -> &str {
        &self.names[node]
    }

    /// Pool members `node` references.
    #[must_use]
    pub fn dependencies(&self, node: usize) -> &[usize] {
        &self.dependencies[node]
    }

    /// Kahn's algorithm; among ready nodes the smallest name goes first.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::DependencyCycle` naming every module that sits on
    /// a cycle.
    pub fn topological_order(&self) -> Result<Vec<usize>, LoadError> {
        let mut pending: Vec<usize> = self.dependencies.iter().map(Vec::len).collect();
        let mut ready: BTreeSet<(&str, usize)> = pending
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count == 0)
            .map(|(i, _)| (self.names[i].as_str(), i))
            .collect();

        let mut order = Vec::with_capacity(self.len());
        while let Some((_, node)) = ready.pop_first() {
            order.push(node);
            for &dependent in &self.dependents[node] {
                pending[dependent] -= 1;
                if pending[dependent] == 0 {
                    ready.insert((self.names[dependent].as_str(), dependent));
                }
            }
        }

        if order.len() == self.len() {
            return Ok(order);
        }

        let stuck: BTreeSet<usize> = (0..self.len()).filter(|&i| pending[i] > 0).collect();
        let mut members: Vec<String> = stuck
            .iter()
            .filter(|&&node| self.reaches_itself(node, &stuck))
            .map(|&node| self.names[node].clone())
            .collect();
        members.sort();

        Err(LoadError::DependencyCycle { members })
    }

    /// Depth-first search from `start` through `within`.
    fn reaches_itself(&self, start: usize, within: &BTreeSet<usize>) -> bool {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<usize> = self.dependencies[start].clone();
        while let Some(node) = stack.pop() {
            if node == start {
                return true;
            }
            if within.contains(&node) && seen.insert(node) {
                stack.extend(self.dependencies[node].iter().copied());
            }
        }
        false
    }
}
