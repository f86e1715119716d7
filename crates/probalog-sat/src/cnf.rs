//! Tseitin encoding of a ground formula
//!
//! Every node reachable from a query or evidence name gets one variable. Gates are
//! defined by the usual equivalence clauses; negation is literal negation. Choice
//! groups touched by the reachable nodes are encoded as a whole, with an extra "none"
//! variable when the group leaves probability mass unassigned.

use probalog_ast::Atom;
use probalog_formula::{GroupId, Label, LogicFormula, Node, NodeId, NodeRef};
use std::collections::HashMap;
use std::fmt::Write;
use tracing::debug;

/// Residual group mass below this is treated as zero
const RESIDUAL_EPSILON: f64 = 1e-12;

/// A CNF literal, or a constant for names that folded to `true`/`false`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CnfLit {
    True,
    False,
    Lit(i32),
}

impl CnfLit {
    pub fn negate(self) -> CnfLit {
        match self {
            CnfLit::True => CnfLit::False,
            CnfLit::False => CnfLit::True,
            CnfLit::Lit(l) => CnfLit::Lit(-l),
        }
    }
}

/// What a CNF variable stands for
#[derive(Debug, Clone, PartialEq)]
pub enum VarKind {
    /// A probabilistic atom leaf, possibly a member of a choice group
    Atom {
        node: NodeId,
        name: Atom,
        probability: f64,
        group: Option<GroupId>,
    },
    /// "No member chosen" for a group with positive residual mass
    GroupNone { group: GroupId, residual: f64 },
    /// Tseitin variable of an AND/OR node
    Gate { node: NodeId },
}

/// Weights of the positive and negative literal of a variable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weight {
    pub positive: f64,
    pub negative: f64,
}

/// A query or evidence name, translated to a literal
#[derive(Debug, Clone, PartialEq)]
pub struct NamedLiteral {
    pub atom: Atom,
    pub literal: CnfLit,
    pub label: Label,
}

#[derive(Debug, Clone, Default)]
pub struct Cnf {
    clauses: Vec<Vec<i32>>,
    kinds: Vec<VarKind>,
    weights: Vec<Weight>,
    node_vars: HashMap<NodeId, i32>,
    names: Vec<NamedLiteral>,
}

impl Cnf {
    /// Encode the part of `formula` reachable from its names
    pub fn encode(formula: &LogicFormula) -> Cnf {
        let mut cnf = Cnf::default();
        let mut touched: Vec<GroupId> = Vec::new();

        for id in formula.reachable_from_names() {
            match formula.node(id) {
                Some(Node::Atom(atom)) => {
                    cnf.atom_var(id, atom.name.clone(), atom.probability, atom.group);
                    if let Some(group) = atom.group {
                        if !touched.contains(&group) {
                            touched.push(group);
                        }
                    }
                }
                Some(Node::Conj(children)) => {
                    let var = cnf.gate_var(id);
                    let lits: Vec<CnfLit> = children.iter().map(|c| cnf.literal(*c)).collect();
                    // n -> c_i
                    for lit in &lits {
                        cnf.push_clause(vec![CnfLit::Lit(-var), *lit]);
                    }
                    // c_1 & ... & c_k -> n
                    let mut clause = vec![CnfLit::Lit(var)];
                    clause.extend(lits.iter().map(|l| l.negate()));
                    cnf.push_clause(clause);
                }
                Some(Node::Disj(children)) => {
                    let var = cnf.gate_var(id);
                    let lits: Vec<CnfLit> = children.iter().map(|c| cnf.literal(*c)).collect();
                    // c_i -> n
                    for lit in &lits {
                        cnf.push_clause(vec![CnfLit::Lit(var), lit.negate()]);
                    }
                    // n -> c_1 | ... | c_k
                    let mut clause = vec![CnfLit::Lit(-var)];
                    clause.extend(lits.iter().copied());
                    cnf.push_clause(clause);
                }
                None => {}
            }
        }

        for group in touched {
            cnf.encode_group(formula, group);
        }

        for name in formula.names() {
            let literal = cnf.literal(name.node);
            cnf.names.push(NamedLiteral {
                atom: name.atom.clone(),
                literal,
                label: name.label,
            });
        }

        debug!(
            vars = cnf.num_vars(),
            clauses = cnf.clauses.len(),
            "encoded formula as CNF"
        );
        cnf
    }

    fn new_var(&mut self, kind: VarKind, weight: Weight) -> i32 {
        self.kinds.push(kind);
        self.weights.push(weight);
        self.kinds.len() as i32
    }

    fn atom_var(
        &mut self,
        node: NodeId,
        name: Atom,
        probability: f64,
        group: Option<GroupId>,
    ) -> i32 {
        if let Some(var) = self.node_vars.get(&node) {
            return *var;
        }
        let negative = match group {
            Some(_) => 1.0,
            None => 1.0 - probability,
        };
        let var = self.new_var(
            VarKind::Atom {
                node,
                name,
                probability,
                group,
            },
            Weight {
                positive: probability,
                negative,
            },
        );
        self.node_vars.insert(node, var);
        var
    }

    fn gate_var(&mut self, node: NodeId) -> i32 {
        let var = self.new_var(
            VarKind::Gate { node },
            Weight {
                positive: 1.0,
                negative: 1.0,
            },
        );
        self.node_vars.insert(node, var);
        var
    }

    /// Exactly one of the members or "none" holds
    fn encode_group(&mut self, formula: &LogicFormula, group: GroupId) {
        let mut vars = Vec::new();
        for member in formula.group(group).unwrap_or(&[]) {
            if let Some(Node::Atom(atom)) = formula.node(*member) {
                vars.push(self.atom_var(
                    *member,
                    atom.name.clone(),
                    atom.probability,
                    atom.group,
                ));
            }
        }

        let residual = formula.group_residual(group);
        if residual > RESIDUAL_EPSILON {
            vars.push(self.new_var(
                VarKind::GroupNone { group, residual },
                Weight {
                    positive: residual,
                    negative: 1.0,
                },
            ));
        }

        self.clauses.push(vars.clone());
        for (i, a) in vars.iter().enumerate() {
            for b in &vars[i + 1..] {
                self.clauses.push(vec![-a, -b]);
            }
        }
    }

    /// Add a clause, dropping it when a constant satisfies it
    fn push_clause(&mut self, literals: Vec<CnfLit>) {
        let mut clause = Vec::with_capacity(literals.len());
        for literal in literals {
            match literal {
                CnfLit::True => return,
                CnfLit::False => {}
                CnfLit::Lit(l) => {
                    if clause.contains(&-l) {
                        return;
                    }
                    if !clause.contains(&l) {
                        clause.push(l);
                    }
                }
            }
        }
        self.clauses.push(clause);
    }

    /// Literal for a node reference of the encoded formula.
    ///
    /// References to nodes outside the reachable part map to `False`.
    pub fn literal(&self, node: NodeRef) -> CnfLit {
        match node {
            NodeRef::True => CnfLit::True,
            NodeRef::False => CnfLit::False,
            NodeRef::Pos(id) => self.node_vars.get(&id).map_or(CnfLit::False, |v| CnfLit::Lit(*v)),
            NodeRef::Neg(id) => self.node_vars.get(&id).map_or(CnfLit::True, |v| CnfLit::Lit(-v)),
        }
    }

    /// Literal of a named atom: query/evidence names first, then probabilistic atoms
    pub fn lookup(&self, atom: &Atom) -> Option<CnfLit> {
        self.names
            .iter()
            .find(|n| &n.atom == atom)
            .map(|n| n.literal)
            .or_else(|| {
                self.kinds.iter().enumerate().find_map(|(i, kind)| match kind {
                    VarKind::Atom { name, .. } if name == atom => Some(CnfLit::Lit(i as i32 + 1)),
                    _ => None,
                })
            })
    }

    pub fn var_of(&self, node: NodeId) -> Option<i32> {
        self.node_vars.get(&node).copied()
    }

    pub fn num_vars(&self) -> usize {
        self.kinds.len()
    }

    pub fn clauses(&self) -> &[Vec<i32>] {
        &self.clauses
    }

    pub fn kind(&self, var: i32) -> Option<&VarKind> {
        slot(var).and_then(|i| self.kinds.get(i))
    }

    pub fn weight(&self, var: i32) -> Option<Weight> {
        slot(var).and_then(|i| self.weights.get(i)).copied()
    }

    /// Weights indexed by `var - 1`
    pub fn weights(&self) -> &[Weight] {
        &self.weights
    }

    pub fn names(&self) -> &[NamedLiteral] {
        &self.names
    }

    pub fn queries(&self) -> impl Iterator<Item = &NamedLiteral> {
        self.names.iter().filter(|n| n.label == Label::Query)
    }

    pub fn evidence(&self) -> impl Iterator<Item = &NamedLiteral> {
        self.names.iter().filter(|n| n.label != Label::Query)
    }

    /// DIMACS text with names and weights as comment lines
    pub fn to_dimacs(&self) -> String {
        let mut out = String::new();
        for name in &self.names {
            let keyword = match name.label {
                Label::Query => "query",
                Label::EvidencePositive => "evidence+",
                Label::EvidenceNegative => "evidence-",
            };
            let literal = match name.literal {
                CnfLit::True => "true".to_string(),
                CnfLit::False => "false".to_string(),
                CnfLit::Lit(l) => l.to_string(),
            };
            let _ = writeln!(out, "c {} {} {}", keyword, name.atom, literal);
        }
        for (i, (kind, weight)) in self.kinds.iter().zip(&self.weights).enumerate() {
            let var = i + 1;
            let _ = match kind {
                VarKind::Atom { name, .. } => writeln!(
                    out,
                    "c weight {} {:?} {:?} {}",
                    var, weight.positive, weight.negative, name
                ),
                VarKind::GroupNone { group, .. } => writeln!(
                    out,
                    "c weight {} {:?} {:?} none(group={})",
                    var, weight.positive, weight.negative, group
                ),
                VarKind::Gate { .. } => Ok(()),
            };
        }
        let _ = writeln!(out, "p cnf {} {}", self.num_vars(), self.clauses.len());
        for clause in &self.clauses {
            for lit in clause {
                let _ = write!(out, "{} ", lit);
            }
            out.push_str("0\n");
        }
        out
    }
}

fn slot(var: i32) -> Option<usize> {
    (var.unsigned_abs() as usize).checked_sub(1)
}
