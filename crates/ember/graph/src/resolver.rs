//! Dependency graph construction and ordering

use crate::order::{CircularDependency, DeploymentOrder};
use crate::path::normalize_dependency;
use crate::validation::GraphValidation;
use ember_types::FunctionDescriptor;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::warn;

/// One function in the graph arena.
#[derive(Debug, Clone)]
struct GraphNode {
    path: String,
    name: String,
}

/// Dependency resolver over one scan set of function descriptors.
///
/// `build_graph` discards all previous state; the graph is never partially
/// mutated. Nodes live in an arena and edges are adjacency lists of arena
/// indices, so cyclic graphs are just edges with no ownership problem.
#[derive(Debug, Default)]
pub struct DependencyResolver {
    nodes: Vec<GraphNode>,
    index: HashMap<String, usize>,
    /// `dependencies[i]` = nodes that must be deployed before node `i`.
    dependencies: Vec<Vec<usize>>,
    /// `dependents[i]` = nodes that require node `i` first (reverse edges).
    dependents: Vec<Vec<usize>>,
    /// Declared targets that did not resolve to a scanned function.
    dropped: Vec<(String, String)>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the graph from a fresh descriptor snapshot.
    ///
    /// Dependency targets are normalized against the declaring function's
    /// directory; targets that do not resolve to a scanned function are
    /// dropped with a warning (external references are not deployable here
    /// and not an error).
    pub fn build_graph(&mut self, descriptors: &[FunctionDescriptor]) {
        self.nodes.clear();
        self.index.clear();
        self.dependencies.clear();
        self.dependents.clear();
        self.dropped.clear();

        for descriptor in descriptors {
            if self.index.contains_key(&descriptor.path) {
                warn!(path = %descriptor.path, "duplicate function path in scan set, keeping first");
                continue;
            }
            let idx = self.nodes.len();
            self.nodes.push(GraphNode {
                path: descriptor.path.clone(),
                name: descriptor.name.clone(),
            });
            self.index.insert(descriptor.path.clone(), idx);
            self.dependencies.push(Vec::new());
            self.dependents.push(Vec::new());
        }

        for descriptor in descriptors {
            let Some(&source) = self.index.get(&descriptor.path) else {
                continue;
            };
            for target in &descriptor.dependencies {
                let normalized = normalize_dependency(descriptor.directory(), target);
                match self.index.get(&normalized) {
                    Some(&dep) => {
                        if !self.dependencies[source].contains(&dep) {
                            self.dependencies[source].push(dep);
                            self.dependents[dep].push(source);
                        }
                    }
                    None => {
                        warn!(
                            source = %descriptor.path,
                            target = %normalized,
                            "dependency target not in scan set, dropping edge"
                        );
                        self.dropped.push((descriptor.path.clone(), normalized));
                    }
                }
            }
        }
    }

    /// Number of functions in the current graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the given path is part of the current graph.
    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Direct dependencies of a function; empty when unknown.
    pub fn direct_dependencies(&self, path: &str) -> Vec<String> {
        self.adjacent(path, &self.dependencies)
    }

    /// Direct dependents of a function; empty when unknown.
    pub fn direct_dependents(&self, path: &str) -> Vec<String> {
        self.adjacent(path, &self.dependents)
    }

    fn adjacent(&self, path: &str, edges: &[Vec<usize>]) -> Vec<String> {
        match self.index.get(path) {
            Some(&idx) => edges[idx].iter().map(|&i| self.nodes[i].path.clone()).collect(),
            None => Vec::new(),
        }
    }

    /// Breadth-first reachability along dependency edges. Reflexive: every
    /// known function reaches itself.
    pub fn has_dependency_path(&self, source: &str, target: &str) -> bool {
        let (Some(&start), Some(&goal)) = (self.index.get(source), self.index.get(target)) else {
            return false;
        };
        if start == goal {
            return true;
        }
        let mut visited = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([start]);
        visited[start] = true;
        while let Some(current) = queue.pop_front() {
            for &next in &self.dependencies[current] {
                if next == goal {
                    return true;
                }
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        false
    }

    /// Whether two functions are mutually reachable.
    pub fn has_circular_dependency(&self, a: &str, b: &str) -> bool {
        self.has_dependency_path(a, b) && self.has_dependency_path(b, a)
    }

    /// Compute the deployment plan for the current graph.
    ///
    /// Cycles are detected first and recorded on the returned order; they
    /// never abort the run. The sequence is dependency-first (post-order
    /// DFS), and batches group functions whose dependencies are all already
    /// satisfied. When a cycle leaves no eligible function, the
    /// lexicographically smallest remaining path is forced into its own
    /// batch so the partition always terminates deterministically.
    pub fn calculate_deployment_order(&self) -> DeploymentOrder {
        let cycles = self.detect_cycles();
        let functions = self.topological_order();
        let batches = self.compute_batches();
        DeploymentOrder {
            functions,
            batches,
            cycles,
        }
    }

    fn detect_cycles(&self) -> Vec<CircularDependency> {
        let mut cycles = Vec::new();
        let mut visited = vec![false; self.nodes.len()];
        let mut on_stack = vec![false; self.nodes.len()];
        let mut stack = Vec::new();

        for start in 0..self.nodes.len() {
            if !visited[start] {
                self.cycle_dfs(start, &mut visited, &mut on_stack, &mut stack, &mut cycles);
            }
        }
        cycles
    }

    fn cycle_dfs(
        &self,
        node: usize,
        visited: &mut [bool],
        on_stack: &mut [bool],
        stack: &mut Vec<usize>,
        cycles: &mut Vec<CircularDependency>,
    ) {
        visited[node] = true;
        on_stack[node] = true;
        stack.push(node);

        for &next in &self.dependencies[node] {
            if !visited[next] {
                self.cycle_dfs(next, visited, on_stack, stack, cycles);
            } else if on_stack[next] {
                // Back edge: the cycle is the stack slice from the first
                // occurrence of the target, closed by repeating it.
                let from = stack
                    .iter()
                    .position(|&n| n == next)
                    .unwrap_or(stack.len() - 1);
                let mut cycle: Vec<String> = stack[from..]
                    .iter()
                    .map(|&i| self.nodes[i].path.clone())
                    .collect();
                cycle.push(self.nodes[next].path.clone());
                cycles.push(CircularDependency::new(cycle));
            }
        }

        stack.pop();
        on_stack[node] = false;
    }

    fn topological_order(&self) -> Vec<String> {
        let mut visited = vec![false; self.nodes.len()];
        let mut ordered = Vec::with_capacity(self.nodes.len());
        for start in 0..self.nodes.len() {
            if !visited[start] {
                self.topo_dfs(start, &mut visited, &mut ordered);
            }
        }
        ordered.iter().map(|&i| self.nodes[i].path.clone()).collect()
    }

    /// Post-order: all dependencies are appended before the node itself,
    /// which yields a dependency-first sequence with no reversal.
    fn topo_dfs(&self, node: usize, visited: &mut [bool], ordered: &mut Vec<usize>) {
        visited[node] = true;
        for &dep in &self.dependencies[node] {
            if !visited[dep] {
                self.topo_dfs(dep, visited, ordered);
            }
        }
        ordered.push(node);
    }

    fn compute_batches(&self) -> Vec<Vec<String>> {
        let mut deployed: HashSet<usize> = HashSet::new();
        let mut remaining: Vec<usize> = (0..self.nodes.len()).collect();
        // Lexicographic scan order makes both batch contents and the forced
        // cycle-break deterministic for a fixed input graph.
        remaining.sort_by(|&a, &b| self.nodes[a].path.cmp(&self.nodes[b].path));
        let mut batches = Vec::new();

        while !remaining.is_empty() {
            let ready: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|&node| {
                    self.dependencies[node]
                        .iter()
                        .all(|dep| deployed.contains(dep))
                })
                .collect();

            let batch = if ready.is_empty() {
                // Only reachable when an unresolved cycle remains; force the
                // smallest remaining node through so the loop terminates.
                vec![remaining[0]]
            } else {
                ready
            };

            remaining.retain(|node| !batch.contains(node));
            deployed.extend(batch.iter().copied());
            batches.push(batch.iter().map(|&i| self.nodes[i].path.clone()).collect());
        }
        batches
    }

    /// Report graph inconsistencies without blocking order computation.
    ///
    /// Cycles are errors; dropped edges and isolated functions (no edges in
    /// either direction) are warnings.
    pub fn validate(&self) -> GraphValidation {
        let mut validation = GraphValidation::default();

        for cycle in self.detect_cycles() {
            validation
                .errors
                .push(format!("circular dependency: {}", cycle.cycle.join(" -> ")));
        }

        for (source, target) in &self.dropped {
            validation.warnings.push(format!(
                "{} depends on {}, which is not in the scan set",
                source, target
            ));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            if self.dependencies[idx].is_empty() && self.dependents[idx].is_empty() {
                validation.warnings.push(format!(
                    "{} ({}) has no dependencies and no dependents",
                    node.path, node.name
                ));
            }
        }

        validation
    }
}
