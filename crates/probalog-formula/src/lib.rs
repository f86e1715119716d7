//! Ground logic formula
//!
//! A [`LogicFormula`] is an arena DAG of propositional nodes produced by grounding.
//! Leaves are probabilistic atoms; internal nodes are conjunctions and disjunctions.
//! Negation is not a node kind: a [`NodeRef`] carries a sign, so `¬n` is `Neg(n)`.
//!
//! # Invariants
//!
//! - Node ids are 1-based and every child reference points at a smaller id, so the
//!   arena order is a topological order.
//! - AND/OR nodes are hash-consed on their child list and constant-folded on insertion.
//! - Atoms sharing a [`GroupId`] are mutually exclusive choices of one annotated
//!   disjunction instance.
//!
//! # Example
//!
//! ```ignore
//! let mut formula = LogicFormula::new();
//! let a = formula.add_atom(Atom::new("a", vec![]), 0.3, None);
//! let b = formula.add_atom(Atom::new("b", vec![]), 0.6, None);
//! let both = formula.add_and(vec![a, b.negate()]);
//! formula.add_name(Atom::new("q", vec![]), both, Label::Query);
//! ```

mod dump;

pub use dump::{parse_atom, DumpError};

use probalog_ast::Atom;
use std::collections::HashMap;
use std::fmt;

/// 1-based index of a node in the formula arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn get(self) -> usize {
        self.0
    }

    fn slot(self) -> usize {
        self.0 - 1
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A signed reference to a node, or one of the two constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeRef {
    True,
    False,
    Pos(NodeId),
    Neg(NodeId),
}

impl NodeRef {
    pub fn negate(self) -> NodeRef {
        match self {
            NodeRef::True => NodeRef::False,
            NodeRef::False => NodeRef::True,
            NodeRef::Pos(id) => NodeRef::Neg(id),
            NodeRef::Neg(id) => NodeRef::Pos(id),
        }
    }

    /// The referenced node, if this is not a constant
    pub fn node(self) -> Option<NodeId> {
        match self {
            NodeRef::Pos(id) | NodeRef::Neg(id) => Some(id),
            NodeRef::True | NodeRef::False => None,
        }
    }

    pub fn is_constant(self) -> bool {
        matches!(self, NodeRef::True | NodeRef::False)
    }

    /// Signed integer form used by the dump: `n` or `-n`
    pub fn signed(self) -> Option<i64> {
        match self {
            NodeRef::Pos(id) => Some(id.0 as i64),
            NodeRef::Neg(id) => Some(-(id.0 as i64)),
            NodeRef::True | NodeRef::False => None,
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::True => write!(f, "true"),
            NodeRef::False => write!(f, "false"),
            NodeRef::Pos(id) => write!(f, "{}", id),
            NodeRef::Neg(id) => write!(f, "-{}", id),
        }
    }
}

/// 1-based identifier of an annotated-disjunction choice group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(usize);

impl GroupId {
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A probabilistic choice
#[derive(Debug, Clone, PartialEq)]
pub struct AtomNode {
    pub name: Atom,
    pub probability: f64,
    pub group: Option<GroupId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Atom(AtomNode),
    Conj(Vec<NodeRef>),
    Disj(Vec<NodeRef>),
}

impl Node {
    pub fn children(&self) -> &[NodeRef] {
        match self {
            Node::Atom(_) => &[],
            Node::Conj(children) | Node::Disj(children) => children,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Query,
    EvidencePositive,
    EvidenceNegative,
}

impl Label {
    pub fn evidence(value: bool) -> Label {
        if value {
            Label::EvidencePositive
        } else {
            Label::EvidenceNegative
        }
    }

    /// Required truth value of an evidence label
    pub fn evidence_value(self) -> Option<bool> {
        match self {
            Label::Query => None,
            Label::EvidencePositive => Some(true),
            Label::EvidenceNegative => Some(false),
        }
    }
}

/// A named formula root (query or evidence)
#[derive(Debug, Clone, PartialEq)]
pub struct Name {
    pub atom: Atom,
    pub node: NodeRef,
    pub label: Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum GateKind {
    And,
    Or,
}

/// Node counts of a formula
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormulaStats {
    pub atoms: usize,
    pub conjunctions: usize,
    pub disjunctions: usize,
    pub groups: usize,
    pub queries: usize,
    pub evidence: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LogicFormula {
    nodes: Vec<Node>,
    groups: Vec<Vec<NodeId>>,
    names: Vec<Name>,
    gates: HashMap<(GateKind, Vec<NodeRef>), NodeId>,
}

impl LogicFormula {
    pub fn new() -> Self {
        LogicFormula {
            nodes: Vec::new(),
            groups: Vec::new(),
            names: Vec::new(),
            gates: HashMap::new(),
        }
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len())
    }

    /// Add a probabilistic atom leaf. Leaves are never shared: every call creates a
    /// new independent choice.
    pub fn add_atom(&mut self, name: Atom, probability: f64, group: Option<GroupId>) -> NodeRef {
        let id = self.push(Node::Atom(AtomNode {
            name,
            probability,
            group,
        }));
        if let Some(members) = group.and_then(|g| self.groups.get_mut(g.0 - 1)) {
            members.push(id);
        }
        NodeRef::Pos(id)
    }

    /// Reserve a new, empty choice group
    pub fn new_group(&mut self) -> GroupId {
        self.groups.push(Vec::new());
        GroupId(self.groups.len())
    }

    /// Add all alternatives of one annotated-disjunction instance as a group
    pub fn add_group(&mut self, members: Vec<(Atom, f64)>) -> (GroupId, Vec<NodeRef>) {
        let group = self.new_group();
        let refs = members
            .into_iter()
            .map(|(name, probability)| self.add_atom(name, probability, Some(group)))
            .collect();
        (group, refs)
    }

    pub fn add_and(&mut self, children: Vec<NodeRef>) -> NodeRef {
        self.add_gate(GateKind::And, children)
    }

    pub fn add_or(&mut self, children: Vec<NodeRef>) -> NodeRef {
        self.add_gate(GateKind::Or, children)
    }

    pub fn add_not(&self, child: NodeRef) -> NodeRef {
        child.negate()
    }

    fn add_gate(&mut self, kind: GateKind, children: Vec<NodeRef>) -> NodeRef {
        // AND absorbs True and is annihilated by False; OR is the dual
        let (unit, absorbing) = match kind {
            GateKind::And => (NodeRef::True, NodeRef::False),
            GateKind::Or => (NodeRef::False, NodeRef::True),
        };

        let mut kept: Vec<NodeRef> = Vec::with_capacity(children.len());
        for child in children {
            if child == absorbing {
                return absorbing;
            }
            if child == unit || kept.contains(&child) {
                continue;
            }
            if kept.contains(&child.negate()) {
                return absorbing;
            }
            kept.push(child);
        }

        match kept.len() {
            0 => unit,
            1 => kept[0],
            _ => {
                let key = (kind, kept);
                if let Some(id) = self.gates.get(&key) {
                    return NodeRef::Pos(*id);
                }
                let node = match kind {
                    GateKind::And => Node::Conj(key.1.clone()),
                    GateKind::Or => Node::Disj(key.1.clone()),
                };
                let id = self.push(node);
                self.gates.insert(key, id);
                NodeRef::Pos(id)
            }
        }
    }

    pub fn add_name(&mut self, atom: Atom, node: NodeRef, label: Label) {
        self.names.push(Name { atom, node, label });
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.slot())
    }

    /// All nodes in id order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i + 1), node))
    }

    /// Atom leaves in id order
    pub fn atoms(&self) -> impl Iterator<Item = (NodeId, &AtomNode)> {
        self.nodes().filter_map(|(id, node)| match node {
            Node::Atom(atom) => Some((id, atom)),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn names(&self) -> &[Name] {
        &self.names
    }

    pub fn queries(&self) -> impl Iterator<Item = &Name> {
        self.names.iter().filter(|n| n.label == Label::Query)
    }

    pub fn evidence(&self) -> impl Iterator<Item = &Name> {
        self.names.iter().filter(|n| n.label != Label::Query)
    }

    /// The node named `atom`: a query/evidence name first, otherwise an atom leaf
    pub fn lookup(&self, atom: &Atom) -> Option<NodeRef> {
        self.names
            .iter()
            .find(|n| &n.atom == atom)
            .map(|n| n.node)
            .or_else(|| {
                self.atoms()
                    .find(|(_, leaf)| &leaf.name == atom)
                    .map(|(id, _)| NodeRef::Pos(id))
            })
    }

    pub fn group(&self, group: GroupId) -> Option<&[NodeId]> {
        self.groups.get(group.0 - 1).map(Vec::as_slice)
    }

    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &[NodeId])> {
        self.groups
            .iter()
            .enumerate()
            .map(|(i, members)| (GroupId(i + 1), members.as_slice()))
    }

    /// Probability that no member of the group is chosen
    pub fn group_residual(&self, group: GroupId) -> f64 {
        let mut residual = 1.0;
        for member in self.group(group).unwrap_or(&[]) {
            if let Some(Node::Atom(atom)) = self.node(*member) {
                residual -= atom.probability;
            }
        }
        residual
    }

    /// Nodes reachable from `roots`, children before parents, each exactly once
    pub fn reachable<I>(&self, roots: I) -> Vec<NodeId>
    where
        I: IntoIterator<Item = NodeRef>,
    {
        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        // (node, children already pushed)
        let mut stack: Vec<(NodeId, bool)> = Vec::new();

        for root in roots {
            let Some(root) = root.node() else {
                continue;
            };
            stack.push((root, false));
            while let Some((id, expanded)) = stack.pop() {
                if expanded {
                    order.push(id);
                    continue;
                }
                if visited[id.slot()] {
                    continue;
                }
                visited[id.slot()] = true;
                stack.push((id, true));
                for child in self.nodes[id.slot()].children().iter().rev() {
                    if let Some(child) = child.node() {
                        if !visited[child.slot()] {
                            stack.push((child, false));
                        }
                    }
                }
            }
        }
        order
    }

    /// Nodes reachable from any query or evidence name
    pub fn reachable_from_names(&self) -> Vec<NodeId> {
        self.reachable(self.names.iter().map(|n| n.node))
    }

    pub fn stats(&self) -> FormulaStats {
        let mut stats = FormulaStats {
            groups: self.groups.len(),
            queries: self.queries().count(),
            evidence: self.evidence().count(),
            ..FormulaStats::default()
        };
        for node in &self.nodes {
            match node {
                Node::Atom(_) => stats.atoms += 1,
                Node::Conj(_) => stats.conjunctions += 1,
                Node::Disj(_) => stats.disjunctions += 1,
            }
        }
        stats
    }
}

impl fmt::Display for LogicFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dump::write_dump(self, f)
    }
}

#[cfg(test)]
#[path = "../tests/unit/formula_tests.rs"]
mod tests;
