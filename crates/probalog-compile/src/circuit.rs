//! Compiled circuits in deterministic decomposable negation normal form
//!
//! Nodes live in an arena and children always precede their parents, so a single
//! forward pass over [`Circuit::nodes`] evaluates the circuit bottom-up.

use crate::error::{CompileError, Resource};
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;

/// 0-based index of a node in a circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CircuitId(usize);

impl CircuitId {
    pub fn get(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CircuitNode {
    True,
    False,
    Literal(i32),
    And(Vec<CircuitId>),
    /// Children are pairwise inconsistent; `decision` is the variable they split on
    Or {
        decision: u32,
        children: Vec<CircuitId>,
    },
}

impl CircuitNode {
    pub fn children(&self) -> &[CircuitId] {
        match self {
            CircuitNode::And(children) | CircuitNode::Or { children, .. } => children,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Circuit {
    nodes: Vec<CircuitNode>,
    root: CircuitId,
    num_vars: usize,
}

/// Hash-consing arena used while a circuit is built
#[derive(Debug)]
pub(crate) struct CircuitBuilder {
    nodes: Vec<CircuitNode>,
    index: HashMap<CircuitNode, CircuitId>,
    max_nodes: usize,
}

impl CircuitBuilder {
    pub(crate) fn new(max_nodes: usize) -> Self {
        CircuitBuilder {
            nodes: Vec::new(),
            index: HashMap::new(),
            max_nodes,
        }
    }

    fn push(&mut self, node: CircuitNode) -> Result<CircuitId, CompileError> {
        if let Some(id) = self.index.get(&node) {
            return Ok(*id);
        }
        if self.nodes.len() >= self.max_nodes {
            return Err(CompileError::ResourceExhausted {
                resource: Resource::Nodes,
                limit: self.max_nodes,
            });
        }
        let id = CircuitId(self.nodes.len());
        self.nodes.push(node.clone());
        self.index.insert(node, id);
        Ok(id)
    }

    fn is(&self, id: CircuitId, node: &CircuitNode) -> bool {
        self.nodes.get(id.0) == Some(node)
    }

    pub(crate) fn constant(&mut self, value: bool) -> Result<CircuitId, CompileError> {
        self.push(if value {
            CircuitNode::True
        } else {
            CircuitNode::False
        })
    }

    pub(crate) fn literal(&mut self, lit: i32) -> Result<CircuitId, CompileError> {
        self.push(CircuitNode::Literal(lit))
    }

    pub(crate) fn and(&mut self, children: Vec<CircuitId>) -> Result<CircuitId, CompileError> {
        let mut kept = Vec::with_capacity(children.len());
        for child in children {
            if self.is(child, &CircuitNode::False) {
                return self.constant(false);
            }
            if !self.is(child, &CircuitNode::True) {
                kept.push(child);
            }
        }
        kept.sort();
        kept.dedup();
        match kept.len() {
            0 => self.constant(true),
            1 => Ok(kept[0]),
            _ => self.push(CircuitNode::And(kept)),
        }
    }

    pub(crate) fn or(
        &mut self,
        decision: u32,
        children: Vec<CircuitId>,
    ) -> Result<CircuitId, CompileError> {
        let mut kept = Vec::with_capacity(children.len());
        for child in children {
            if self.is(child, &CircuitNode::True) {
                return self.constant(true);
            }
            if !self.is(child, &CircuitNode::False) {
                kept.push(child);
            }
        }
        match kept.len() {
            0 => self.constant(false),
            1 => Ok(kept[0]),
            _ => self.push(CircuitNode::Or {
                decision,
                children: kept,
            }),
        }
    }

    /// `v OR NOT v`
    fn tautology(&mut self, var: u32) -> Result<CircuitId, CompileError> {
        let pos = self.literal(var as i32)?;
        let neg = self.literal(-(var as i32))?;
        self.or(var, vec![pos, neg])
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn finish(self, root: CircuitId, num_vars: usize) -> Circuit {
        Circuit {
            nodes: self.nodes,
            root,
            num_vars,
        }
    }
}

impl Circuit {
    pub fn root(&self) -> CircuitId {
        self.root
    }

    pub fn node(&self, id: CircuitId) -> Option<&CircuitNode> {
        self.nodes.get(id.0)
    }

    /// All nodes, children before parents
    pub fn nodes(&self) -> impl Iterator<Item = (CircuitId, &CircuitNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (CircuitId(i), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.children().len()).sum()
    }

    /// Variables mentioned below each node
    pub fn variable_sets(&self) -> Vec<BTreeSet<u32>> {
        let mut sets: Vec<BTreeSet<u32>> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let set = match node {
                CircuitNode::True | CircuitNode::False => BTreeSet::new(),
                CircuitNode::Literal(lit) => BTreeSet::from([lit.unsigned_abs()]),
                CircuitNode::And(children) | CircuitNode::Or { children, .. } => children
                    .iter()
                    .flat_map(|c| sets[c.0].iter().copied())
                    .collect(),
            };
            sets.push(set);
        }
        sets
    }

    /// Reachable nodes, indexed like the arena
    fn reachable(&self) -> Vec<bool> {
        let mut reachable = vec![false; self.nodes.len()];
        if let Some(flag) = reachable.get_mut(self.root.0) {
            *flag = true;
        }
        for i in (0..self.nodes.len()).rev() {
            if reachable[i] {
                for child in self.nodes[i].children() {
                    reachable[child.0] = true;
                }
            }
        }
        reachable
    }

    /// Every AND node's children mention pairwise disjoint variables
    pub fn check_decomposable(&self) -> bool {
        let sets = self.variable_sets();
        self.nodes.iter().all(|node| match node {
            CircuitNode::And(children) => {
                let mut seen = BTreeSet::new();
                children
                    .iter()
                    .flat_map(|c| sets[c.0].iter())
                    .all(|var| seen.insert(*var))
            }
            _ => true,
        })
    }

    /// Every OR node has at most one true child under each assignment of its
    /// variables. OR nodes over more than `max_vars` variables are not checked.
    pub fn check_deterministic(&self, max_vars: usize) -> bool {
        let sets = self.variable_sets();
        let mut assignment = vec![false; self.num_vars];

        for (i, node) in self.nodes.iter().enumerate() {
            let CircuitNode::Or { children, .. } = node else {
                continue;
            };
            let vars: Vec<u32> = sets[i].iter().copied().collect();
            if vars.len() > max_vars || vars.len() >= usize::BITS as usize {
                continue;
            }
            for mask in 0usize..(1 << vars.len()) {
                for (bit, var) in vars.iter().enumerate() {
                    if let Some(slot) = assignment.get_mut(*var as usize - 1) {
                        *slot = mask & (1 << bit) != 0;
                    }
                }
                let values = self.evaluate_nodes(&assignment);
                if children.iter().filter(|c| values[c.0]).count() > 1 {
                    return false;
                }
            }
        }
        true
    }

    /// Every OR child mentions the OR's variables, and the root mentions all of them
    pub fn is_smooth(&self) -> bool {
        let sets = self.variable_sets();
        let ors_smooth = self.nodes.iter().enumerate().all(|(i, node)| match node {
            CircuitNode::Or { children, .. } => children.iter().all(|c| sets[c.0] == sets[i]),
            _ => true,
        });
        let root_vars = sets.get(self.root.0).map_or(0, |s| s.len());
        ors_smooth && (root_vars == self.num_vars || self.is(self.root, &CircuitNode::False))
    }

    fn is(&self, id: CircuitId, node: &CircuitNode) -> bool {
        self.nodes.get(id.0) == Some(node)
    }

    fn evaluate_nodes(&self, assignment: &[bool]) -> Vec<bool> {
        let mut values: Vec<bool> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let value = match node {
                CircuitNode::True => true,
                CircuitNode::False => false,
                CircuitNode::Literal(lit) => {
                    let value = (lit.unsigned_abs() as usize)
                        .checked_sub(1)
                        .and_then(|i| assignment.get(i))
                        .copied()
                        .unwrap_or(false);
                    if *lit > 0 {
                        value
                    } else {
                        !value
                    }
                }
                CircuitNode::And(children) => children.iter().all(|c| values[c.0]),
                CircuitNode::Or { children, .. } => children.iter().any(|c| values[c.0]),
            };
            values.push(value);
        }
        values
    }

    /// Truth value of the circuit; `assignment[v - 1]` is the value of variable `v`
    pub fn evaluate_boolean(&self, assignment: &[bool]) -> bool {
        self.evaluate_nodes(assignment)
            .get(self.root.0)
            .copied()
            .unwrap_or(false)
    }

    /// c2d-style NNF text
    pub fn to_nnf(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "nnf {} {} {}",
            self.nodes.len(),
            self.edge_count(),
            self.num_vars
        );
        for node in &self.nodes {
            let _ = match node {
                CircuitNode::True => writeln!(out, "A 0"),
                CircuitNode::False => writeln!(out, "O 0 0"),
                CircuitNode::Literal(lit) => writeln!(out, "L {}", lit),
                CircuitNode::And(children) => {
                    let _ = write!(out, "A {}", children.len());
                    for child in children {
                        let _ = write!(out, " {}", child.0);
                    }
                    writeln!(out)
                }
                CircuitNode::Or { decision, children } => {
                    let _ = write!(out, "O {} {}", decision, children.len());
                    for child in children {
                        let _ = write!(out, " {}", child.0);
                    }
                    writeln!(out)
                }
            };
        }
        out
    }

    /// Rebuild the reachable part so every OR child and the root mention the same
    /// variables, adding `(v OR NOT v)` factors for the missing ones
    pub(crate) fn smooth(&self, max_nodes: usize) -> Result<Circuit, CompileError> {
        let sets = self.variable_sets();
        let reachable = self.reachable();
        let mut builder = CircuitBuilder::new(max_nodes);
        let mut mapped: Vec<Option<CircuitId>> = vec![None; self.nodes.len()];

        for (i, node) in self.nodes.iter().enumerate() {
            if !reachable[i] {
                continue;
            }
            // children of a reachable node are reachable and come first
            let child = |c: &CircuitId| mapped[c.0];
            let id = match node {
                CircuitNode::True => builder.constant(true)?,
                CircuitNode::False => builder.constant(false)?,
                CircuitNode::Literal(lit) => builder.literal(*lit)?,
                CircuitNode::And(children) => {
                    let children = children.iter().filter_map(child).collect();
                    builder.and(children)?
                }
                CircuitNode::Or { decision, children } => {
                    let mut smoothed = Vec::with_capacity(children.len());
                    for c in children {
                        let Some(mapped_child) = child(c) else {
                            continue;
                        };
                        let mut factors = vec![mapped_child];
                        for var in sets[i].difference(&sets[c.0]) {
                            factors.push(builder.tautology(*var)?);
                        }
                        smoothed.push(builder.and(factors)?);
                    }
                    builder.or(*decision, smoothed)?
                }
            };
            mapped[i] = Some(id);
        }

        let mut factors = vec![match mapped.get(self.root.0).copied().flatten() {
            Some(root) => root,
            None => builder.constant(false)?,
        }];
        let root_vars = sets.get(self.root.0).cloned().unwrap_or_default();
        for var in 1..=self.num_vars as u32 {
            if !root_vars.contains(&var) {
                factors.push(builder.tautology(var)?);
            }
        }
        let root = builder.and(factors)?;
        Ok(builder.finish(root, self.num_vars))
    }
}
