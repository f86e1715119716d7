//! Building the acyclic formula from the ground program
//!
//! Each derived atom becomes the OR of its derivations, each derivation the AND of
//! its literals. Atoms in a cyclic component are expanded relative to the atoms of the
//! same component already being expanded above them; re-entering one of those yields
//! `False` under [`CyclePolicy::BreakAsFalse`]. Nodes are memoized by the atom and that
//! in-component ancestor set, which is always empty outside cycles.

use crate::config::{CyclePolicy, GroundingConfig};
use crate::error::GroundingError;
use crate::ground_program::{AtomIdx, Components, GroundLit, GroundProgram};
use probalog_ast::Atom;
use probalog_formula::{LogicFormula, NodeRef};
use std::collections::HashMap;

pub(crate) struct FormulaBuilder<'a> {
    program: &'a GroundProgram,
    components: Components,
    max_depth: usize,
    memo: HashMap<(AtomIdx, Vec<AtomIdx>), NodeRef>,
}

impl<'a> FormulaBuilder<'a> {
    /// Check the ground program against the cycle policy and stratification
    pub(crate) fn new(
        program: &'a GroundProgram,
        config: &GroundingConfig,
    ) -> Result<Self, GroundingError> {
        let components = program.components();

        for idx in 0..program.len() {
            let component = components.of(idx);
            for (target, positive) in program.dependencies(idx) {
                if components.of(target) == component && !positive {
                    return Err(GroundingError::UnstratifiedNegation {
                        atom: program.atom(target).to_string(),
                    });
                }
            }
            if config.cycle_policy == CyclePolicy::Reject && components.is_cyclic(component) {
                return Err(GroundingError::PositiveCycle {
                    atom: program.atom(idx).to_string(),
                });
            }
        }

        Ok(FormulaBuilder {
            program,
            components,
            max_depth: config.max_depth,
            memo: HashMap::new(),
        })
    }

    /// Formula node for a ground atom; `False` if it was never derived
    pub(crate) fn node_for(
        &mut self,
        formula: &mut LogicFormula,
        atom: &Atom,
    ) -> Result<NodeRef, GroundingError> {
        match self.program.lookup(atom) {
            Some(idx) => self.build(formula, idx, &[], 0),
            None => Ok(NodeRef::False),
        }
    }

    fn build(
        &mut self,
        formula: &mut LogicFormula,
        idx: AtomIdx,
        ancestors: &[AtomIdx],
        depth: usize,
    ) -> Result<NodeRef, GroundingError> {
        let key = (idx, ancestors.to_vec());
        if let Some(node) = self.memo.get(&key) {
            return Ok(*node);
        }
        if depth > self.max_depth {
            return Err(GroundingError::DepthExceeded {
                goal: self.program.atom(idx).to_string(),
                limit: self.max_depth,
            });
        }

        let component = self.components.of(idx);
        let mut inner = ancestors.to_vec();
        if let Err(pos) = inner.binary_search(&idx) {
            inner.insert(pos, idx);
        }

        let program = self.program;
        let mut alternatives = Vec::with_capacity(program.derivations(idx).len());
        for body in program.derivations(idx) {
            let mut children = Vec::with_capacity(body.len());
            for lit in body {
                let child = match *lit {
                    GroundLit::Leaf(node) => node,
                    GroundLit::Derived { atom, positive } => {
                        let node = if self.components.of(atom) != component {
                            self.build(formula, atom, &[], depth + 1)?
                        } else if inner.binary_search(&atom).is_ok() {
                            // re-entrant occurrence inside a positive cycle
                            NodeRef::False
                        } else {
                            self.build(formula, atom, &inner, depth + 1)?
                        };
                        if positive {
                            node
                        } else {
                            node.negate()
                        }
                    }
                };
                if child == NodeRef::False {
                    children = vec![NodeRef::False];
                    break;
                }
                children.push(child);
            }
            alternatives.push(formula.add_and(children));
        }

        let node = formula.add_or(alternatives);
        self.memo.insert(key, node);
        Ok(node)
    }
}
