use crate::error::{Result, VibecraftError};
use crate::module::Module;
use crate::registry::ModuleSource;
use std::collections::{BTreeSet, HashMap};

// ---------------------------------------------------------------------------
// DependencyGraph
// ---------------------------------------------------------------------------

/// Directed graph over module names. An edge runs from a dependency to the
/// module that depends on it (`database -> auth` when auth depends on
/// database), so a topological order lists dependencies first.
///
/// Nodes keep insertion order and edges are deduplicated, which makes every
/// traversal below deterministic for a given input.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    edges: Vec<Vec<usize>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every module becomes a node, then one edge per declared dependency.
    /// A dependency that is not a declared module still becomes a bare node.
    pub fn from_modules(modules: &[Module]) -> Self {
        let mut graph = Self::new();
        for m in modules {
            graph.add_node(&m.name);
        }
        for m in modules {
            for dep in &m.dependencies {
                graph.add_edge(dep, &m.name);
            }
        }
        graph
    }

    pub fn add_node(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.nodes.len();
        self.nodes.push(name.to_string());
        self.index.insert(name.to_string(), i);
        self.edges.push(Vec::new());
        i
    }

    pub fn add_edge(&mut self, from: &str, to: &str) {
        let a = self.add_node(from);
        let b = self.add_node(to);
        if !self.edges[a].contains(&b) {
            self.edges[a].push(b);
        }
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => self.edges[a].contains(&b),
            _ => false,
        }
    }

    /// Nodes reached by an outgoing edge (the dependents), sorted by name.
    pub fn successors(&self, name: &str) -> Vec<&str> {
        let Some(&i) = self.index.get(name) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self.edges[i].iter().map(|&j| self.nodes[j].as_str()).collect();
        out.sort_unstable();
        out
    }

    /// Nodes with an edge into `name` (the dependencies), sorted by name.
    pub fn predecessors(&self, name: &str) -> Vec<&str> {
        let Some(&target) = self.index.get(name) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .edges
            .iter()
            .enumerate()
            .filter(|(_, succ)| succ.contains(&target))
            .map(|(i, _)| self.nodes[i].as_str())
            .collect();
        out.sort_unstable();
        out
    }

    /// Iterative three-colour DFS over every node. Returns the first cycle
    /// found as a path along edge direction, with the start node repeated at
    /// the end (`[a, a]` for a self-loop).
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut color = vec![Color::White; self.nodes.len()];
        for start in 0..self.nodes.len() {
            if color[start] != Color::White {
                continue;
            }
            color[start] = Color::Gray;
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

            while let Some(frame) = stack.last_mut() {
                let (node, next) = *frame;
                match self.edges[node].get(next) {
                    Some(&succ) => {
                        frame.1 += 1;
                        match color[succ] {
                            Color::White => {
                                color[succ] = Color::Gray;
                                stack.push((succ, 0));
                            }
                            Color::Gray => {
                                let pos = stack.iter().position(|&(n, _)| n == succ).unwrap_or(0);
                                let mut cycle: Vec<String> = stack[pos..]
                                    .iter()
                                    .map(|&(n, _)| self.nodes[n].clone())
                                    .collect();
                                cycle.push(self.nodes[succ].clone());
                                return Some(cycle);
                            }
                            Color::Black => {}
                        }
                    }
                    None => {
                        color[node] = Color::Black;
                        stack.pop();
                    }
                }
            }
        }
        None
    }

    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Kahn's algorithm; the ready set is ordered by name so ties always
    /// break the same way. `None` when the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<String>> {
        let n = self.nodes.len();
        let mut in_degree = vec![0usize; n];
        for succ in &self.edges {
            for &s in succ {
                in_degree[s] += 1;
            }
        }

        let mut ready: BTreeSet<(&str, usize)> = (0..n)
            .filter(|&i| in_degree[i] == 0)
            .map(|i| (self.nodes[i].as_str(), i))
            .collect();

        let mut order = Vec::with_capacity(n);
        while let Some((name, node)) = ready.pop_first() {
            order.push(name.to_string());
            for &succ in &self.edges[node] {
                in_degree[succ] -= 1;
                if in_degree[succ] == 0 {
                    ready.insert((self.nodes[succ].as_str(), succ));
                }
            }
        }

        (order.len() == n).then_some(order)
    }
}

// ---------------------------------------------------------------------------
// DependencyAnalyzer
// ---------------------------------------------------------------------------

/// Answers validation and ordering questions about a snapshot of modules.
///
/// The graph is built once at construction and never patched. Build a new
/// analyzer to see registry changes.
#[derive(Debug, Clone)]
pub struct DependencyAnalyzer {
    modules: Vec<Module>,
    graph: DependencyGraph,
}

impl DependencyAnalyzer {
    pub fn new<S: ModuleSource + ?Sized>(source: &S) -> Result<Self> {
        Ok(Self::from_modules(source.get_all_modules()?))
    }

    pub fn from_modules(modules: Vec<Module>) -> Self {
        let graph = DependencyGraph::from_modules(&modules);
        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built dependency graph"
        );
        Self { modules, graph }
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Every `(module, dependency)` pair whose dependency is not a declared
    /// module, in declaration order.
    pub fn missing_dependencies(&self) -> Vec<(String, String)> {
        let declared: std::collections::HashSet<&str> =
            self.modules.iter().map(|m| m.name.as_str()).collect();
        self.modules
            .iter()
            .flat_map(|m| {
                m.dependencies
                    .iter()
                    .filter(|d| !declared.contains(d.as_str()))
                    .map(move |d| (m.name.clone(), d.clone()))
            })
            .collect()
    }

    /// Check that every dependency names a declared module, then that the
    /// graph is acyclic. A missing dependency is reported before a cycle.
    pub fn validate_dependencies(&self) -> Result<()> {
        if let Some((module, dependency)) = self.missing_dependencies().into_iter().next() {
            return Err(VibecraftError::MissingDependency { module, dependency });
        }
        if let Some(cycle) = self.find_cycle() {
            return Err(VibecraftError::CyclicDependency(format!(
                "Circular dependencies detected: {}",
                cycle.join(" -> ")
            )));
        }
        Ok(())
    }

    pub fn has_cycle(&self) -> bool {
        self.graph.has_cycle()
    }

    /// One cycle, written in "depends on" direction: `[a, b, a]` reads
    /// "a depends on b, which depends on a".
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        self.graph.find_cycle().map(|mut path| {
            path.reverse();
            path
        })
    }

    /// Dependencies before dependents. Undeclared dependency names appear as
    /// bare entries: call [`Self::validate_dependencies`] first when they
    /// must be rejected.
    pub fn get_build_order(&self) -> Result<Vec<String>> {
        if let Some(cycle) = self.find_cycle() {
            return Err(VibecraftError::CyclicDependency(format!(
                "Cannot determine build order: circular dependencies detected ({})",
                cycle.join(" -> ")
            )));
        }
        self.graph.topological_order().ok_or_else(|| {
            VibecraftError::CyclicDependency(
                "Cannot determine build order: circular dependencies detected".to_string(),
            )
        })
    }

    pub fn dependencies_of(&self, name: &str) -> Vec<String> {
        self.graph
            .predecessors(name)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.graph
            .successors(name)
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
