//! The ground program: derived ground atoms and their derivations
//!
//! Resolution records, for every derived ground atom, the set of bodies that derive
//! it. A body is a conjunction of [`GroundLit`]s: probabilistic leaves already in the
//! formula, or (possibly negated) references to other derived atoms. This table may
//! contain cycles; [`GroundProgram::components`] exposes its strongly connected
//! components so cycles can be handled when the acyclic formula is built.

use probalog_ast::Atom;
use probalog_formula::NodeRef;
use std::collections::{HashMap, HashSet};

pub type AtomIdx = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroundLit {
    Leaf(NodeRef),
    Derived { atom: AtomIdx, positive: bool },
}

#[derive(Debug, Clone, Default)]
pub struct GroundProgram {
    atoms: Vec<Atom>,
    index: HashMap<Atom, AtomIdx>,
    derivations: Vec<Vec<Vec<GroundLit>>>,
    seen: HashSet<(AtomIdx, Vec<GroundLit>)>,
}

impl GroundProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, atom: Atom) -> AtomIdx {
        if let Some(idx) = self.index.get(&atom) {
            return *idx;
        }
        let idx = self.atoms.len();
        self.atoms.push(atom.clone());
        self.index.insert(atom, idx);
        self.derivations.push(Vec::new());
        idx
    }

    /// Record a derivation; returns false if it was already known
    pub fn add_derivation(&mut self, atom: AtomIdx, body: Vec<GroundLit>) -> bool {
        if !self.seen.insert((atom, body.clone())) {
            return false;
        }
        self.derivations[atom].push(body);
        true
    }

    pub fn lookup(&self, atom: &Atom) -> Option<AtomIdx> {
        self.index.get(atom).copied()
    }

    pub fn atom(&self, idx: AtomIdx) -> &Atom {
        &self.atoms[idx]
    }

    pub fn derivations(&self, idx: AtomIdx) -> &[Vec<GroundLit>] {
        &self.derivations[idx]
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn derivation_count(&self) -> usize {
        self.derivations.iter().map(Vec::len).sum()
    }

    /// Dependency edges `(target, positive)` of an atom, in derivation order
    pub fn dependencies(&self, idx: AtomIdx) -> impl Iterator<Item = (AtomIdx, bool)> + '_ {
        self.derivations[idx].iter().flatten().filter_map(|lit| match lit {
            GroundLit::Derived { atom, positive } => Some((*atom, *positive)),
            GroundLit::Leaf(_) => None,
        })
    }

    /// Strongly connected components of the dependency graph (Tarjan)
    pub fn components(&self) -> Components {
        let n = self.atoms.len();
        let successors: Vec<Vec<AtomIdx>> = (0..n)
            .map(|idx| self.dependencies(idx).map(|(target, _)| target).collect())
            .collect();

        const UNVISITED: usize = usize::MAX;
        let mut index = vec![UNVISITED; n];
        let mut lowlink = vec![0; n];
        let mut on_stack = vec![false; n];
        let mut stack: Vec<AtomIdx> = Vec::new();
        let mut component = vec![0; n];
        let mut members: Vec<Vec<AtomIdx>> = Vec::new();
        let mut counter = 0;

        for start in 0..n {
            if index[start] != UNVISITED {
                continue;
            }
            // (node, next successor to look at)
            let mut work: Vec<(AtomIdx, usize)> = vec![(start, 0)];
            while let Some((v, next)) = work.pop() {
                if next == 0 && index[v] == UNVISITED {
                    index[v] = counter;
                    lowlink[v] = counter;
                    counter += 1;
                    stack.push(v);
                    on_stack[v] = true;
                }

                if let Some(&w) = successors[v].get(next) {
                    work.push((v, next + 1));
                    if index[w] == UNVISITED {
                        work.push((w, 0));
                    } else if on_stack[w] {
                        lowlink[v] = lowlink[v].min(index[w]);
                    }
                    continue;
                }

                if lowlink[v] == index[v] {
                    let id = members.len();
                    let mut scc = Vec::new();
                    while let Some(w) = stack.pop() {
                        on_stack[w] = false;
                        component[w] = id;
                        scc.push(w);
                        if w == v {
                            break;
                        }
                    }
                    scc.reverse();
                    members.push(scc);
                }
                if let Some(&(parent, _)) = work.last() {
                    lowlink[parent] = lowlink[parent].min(lowlink[v]);
                }
            }
        }

        let cyclic = members
            .iter()
            .map(|scc| scc.len() > 1 || successors[scc[0]].contains(&scc[0]))
            .collect();

        Components { component, cyclic }
    }
}

/// Strongly connected components, numbered in reverse topological order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Components {
    component: Vec<usize>,
    cyclic: Vec<bool>,
}

impl Components {
    pub fn of(&self, atom: AtomIdx) -> usize {
        self.component[atom]
    }

    /// Does the component contain a cycle (more than one atom, or a self-loop)?
    pub fn is_cyclic(&self, component: usize) -> bool {
        self.cyclic[component]
    }
}

#[cfg(test)]
#[path = "../tests/unit/ground_program_tests.rs"]
mod tests;
