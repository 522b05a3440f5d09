//! Provider ordering.
//!
//! Turns the providers' declared [`Relationship`]s into a graph and sorts it:
//! - every owned binding becomes a node mapped back to its provider
//! - a provider with edges but no bindings gets one virtual node
//! - `dependencies` add edges from the dependency to every node of the
//!   provider; `provide_for` adds edges from every node of the provider to
//!   every node of the target's owner; keys nobody owns are ignored
//!
//! The order comes from Kahn's algorithm. When it cannot consume every node,
//! a depth-first search finds the cycle to report.
//!
//! Nodes live in an arena indexed in input order, and successor sets are
//! ordered, so both the order and the reported cycle are deterministic.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};
use std::fmt;

use tartib_support::rendering::shorten_type_name;
use tracing::{debug, instrument, warn};

use crate::error::{CycleError, ProviderError};
use crate::key::BindingKey;
use crate::provider::{ProviderRef, Relationship};

/// Label of a graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    /// A binding owned by a provider.
    Binding(BindingKey),
    /// Stand-in for a provider with relationships but no bindings.
    /// Holds the provider's input index, so it can never equal a binding.
    Virtual(usize),
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Binding(key) => write!(f, "{key}"),
            Node::Virtual(index) => write!(f, "<virtual #{index}>"),
        }
    }
}

#[derive(Debug)]
struct NodeEntry {
    node: Node,
    /// Index of the owning provider in the input slice
    provider: usize,
}

/// Dependency graph over one provider set.
pub(crate) struct ProviderGraph<'a> {
    providers: &'a [ProviderRef],
    nodes: Vec<NodeEntry>,
    successors: Vec<BTreeSet<usize>>,
    /// Providers outside the graph, in input order
    detached: Vec<usize>,
}

impl<'a> ProviderGraph<'a> {
    /// Builds nodes and edges for `providers`.
    pub fn build(providers: &'a [ProviderRef]) -> Self {
        let relationships: Vec<Option<Relationship>> =
            providers.iter().map(|p| p.relationship()).collect();

        let mut nodes: Vec<NodeEntry> = Vec::new();
        let mut lookup: HashMap<BindingKey, usize> = HashMap::new();
        let mut owned: Vec<Vec<usize>> = vec![Vec::new(); providers.len()];
        let mut detached = Vec::new();

        for (index, relationship) in relationships.iter().enumerate() {
            let Some(relationship) = relationship else {
                detached.push(index);
                continue;
            };

            for binding in &relationship.bindings {
                if let Some(&existing) = lookup.get(binding) {
                    warn!(
                        binding = %binding,
                        owner = providers[nodes[existing].provider].name(),
                        ignored = providers[index].name(),
                        "Binding declared by two providers, keeping the first"
                    );
                    continue;
                }
                lookup.insert(binding.clone(), nodes.len());
                owned[index].push(nodes.len());
                nodes.push(NodeEntry {
                    node: Node::Binding(binding.clone()),
                    provider: index,
                });
            }

            if owned[index].is_empty() {
                if relationship.has_edges() {
                    owned[index].push(nodes.len());
                    nodes.push(NodeEntry {
                        node: Node::Virtual(index),
                        provider: index,
                    });
                } else {
                    detached.push(index);
                }
            }
        }

        let mut successors = vec![BTreeSet::new(); nodes.len()];
        for (index, relationship) in relationships.iter().enumerate() {
            let Some(relationship) = relationship else {
                continue;
            };

            for dependency in &relationship.dependencies {
                if let Some(&from) = lookup.get(dependency) {
                    for &to in &owned[index] {
                        successors[from].insert(to);
                    }
                }
            }

            // same edges as the target's provider listing each of our
            // bindings as a dependency
            for target in &relationship.provide_for {
                if let Some(&target) = lookup.get(target) {
                    let dependent = nodes[target].provider;
                    for &from in &owned[index] {
                        for &to in &owned[dependent] {
                            successors[from].insert(to);
                        }
                    }
                }
            }
        }

        debug!(
            providers = providers.len(),
            nodes = nodes.len(),
            edges = successors.iter().map(BTreeSet::len).sum::<usize>(),
            detached = detached.len(),
            "Built provider graph"
        );

        Self {
            providers,
            nodes,
            successors,
            detached,
        }
    }

    /// Sorts the providers.
    ///
    /// Graph providers come first in topological order, each at the position
    /// of its first node; providers outside the graph follow in input order.
    ///
    /// # Errors
    /// [`ProviderError::CycleDetected`] if the relationships are circular.
    #[instrument(skip(self), name = "provider_sort", fields(providers = self.providers.len()))]
    pub fn sort(&self) -> Result<Vec<ProviderRef>, ProviderError> {
        let order = self.topological_order().map_err(|unresolved| {
            let chain = self.cycle_chain(&unresolved);
            warn!(cycle = ?chain, "Circular provider dependency detected!");
            ProviderError::CycleDetected(CycleError { chain })
        })?;

        let mut placed = vec![false; self.providers.len()];
        let mut sorted = Vec::with_capacity(self.providers.len());

        for node in order {
            let provider = self.nodes[node].provider;
            if !placed[provider] {
                placed[provider] = true;
                sorted.push(self.providers[provider].clone());
            }
        }
        sorted.extend(self.detached.iter().map(|&index| self.providers[index].clone()));

        Ok(sorted)
    }

    /// Kahn's algorithm. Ready nodes leave in arena order, which keeps
    /// unconstrained providers in input order.
    ///
    /// On failure returns the nodes that were never freed.
    fn topological_order(&self) -> Result<Vec<usize>, Vec<usize>> {
        let mut in_degree = vec![0usize; self.nodes.len()];
        for successors in &self.successors {
            for &next in successors {
                in_degree[next] += 1;
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(node, _)| Reverse(node))
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(Reverse(node)) = ready.pop() {
            order.push(node);
            for &next in &self.successors[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if order.len() == self.nodes.len() {
            Ok(order)
        } else {
            Err((0..self.nodes.len()).filter(|&n| in_degree[n] > 0).collect())
        }
    }

    /// Provider names along the first cycle found, consecutive repeats
    /// collapsed.
    fn cycle_chain(&self, unresolved: &[usize]) -> Vec<String> {
        let mut search = CycleSearch::new(&self.successors);
        let nodes = search.find().unwrap_or_else(|| unresolved.to_vec());

        for &node in &nodes {
            debug!(node = %self.nodes[node].node, "Cycle member");
        }

        let mut chain: Vec<String> = nodes
            .iter()
            .map(|&node| shorten_type_name(self.providers[self.nodes[node].provider].name()))
            .collect();
        chain.dedup();
        chain
    }
}

/// Depth-first cycle search.
///
/// Maintains the current path to rebuild the cycle at the first back-edge.
struct CycleSearch<'g> {
    successors: &'g [BTreeSet<usize>],
    /// On the current path
    visiting: Vec<bool>,
    /// Fully explored
    done: Vec<bool>,
    path: Vec<usize>,
}

impl<'g> CycleSearch<'g> {
    fn new(successors: &'g [BTreeSet<usize>]) -> Self {
        Self {
            successors,
            visiting: vec![false; successors.len()],
            done: vec![false; successors.len()],
            path: Vec::new(),
        }
    }

    /// Returns the first cycle as `[n0, n1, ..., n0]`.
    fn find(&mut self) -> Option<Vec<usize>> {
        (0..self.successors.len()).find_map(|start| {
            if self.done[start] {
                None
            } else {
                self.visit(start)
            }
        })
    }

    fn visit(&mut self, node: usize) -> Option<Vec<usize>> {
        let successors = self.successors;
        self.visiting[node] = true;
        self.path.push(node);

        for &next in &successors[node] {
            if self.visiting[next] {
                let start = self.path.iter().position(|&n| n == next).unwrap_or(0);
                let mut cycle = self.path[start..].to_vec();
                cycle.push(next);
                return Some(cycle);
            }
            if !self.done[next] {
                if let Some(cycle) = self.visit(next) {
                    return Some(cycle);
                }
            }
        }

        self.path.pop();
        self.visiting[node] = false;
        self.done[node] = true;
        None
    }
}
