//! Bottom-up weighted model counting with evidence
//!
//! Evidence is applied as literal weights: the literal contradicting an observed
//! value weighs zero. The normalization `Z` is the weighted count under the evidence
//! alone; a query is counted with its own literal fixed as well and divided by `Z`.

use crate::error::EvalError;
use crate::semiring::{ProbabilitySemiring, Semiring};
use crate::QueryProbabilities;
use probalog_ast::Atom;
use probalog_compile::{CircuitNode, CompiledFormula};
use probalog_sat::{CnfLit, VarKind};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
struct Observation {
    atom: Atom,
    literal: CnfLit,
    value: bool,
}

pub struct Evaluator<'a, S: Semiring> {
    compiled: &'a CompiledFormula,
    semiring: S,
    /// (positive, negative) literal weights, indexed by `var - 1`
    weights: Vec<(S::Value, S::Value)>,
    evidence: Vec<Observation>,
    fixed: HashMap<u32, bool>,
    consistent: bool,
    z: S::Value,
}

impl<'a, S: Semiring> Evaluator<'a, S> {
    /// Load weights and the formula's own evidence, and compute the normalization
    pub fn new(compiled: &'a CompiledFormula, semiring: S) -> Result<Self, EvalError> {
        let cnf = compiled.cnf();
        let weights = (1..=cnf.num_vars() as i32)
            .map(|var| match cnf.kind(var) {
                Some(VarKind::Atom {
                    probability,
                    group: None,
                    ..
                }) => {
                    let p = semiring.weight(*probability);
                    let not_p = semiring.complement(&p);
                    (p, not_p)
                }
                Some(VarKind::Atom {
                    probability,
                    group: Some(_),
                    ..
                }) => (semiring.weight(*probability), semiring.one()),
                Some(VarKind::GroupNone { residual, .. }) => {
                    (semiring.weight(*residual), semiring.one())
                }
                Some(VarKind::Gate { .. }) | None => (semiring.one(), semiring.one()),
            })
            .collect();

        let evidence = cnf
            .evidence()
            .filter_map(|name| {
                name.label.evidence_value().map(|value| Observation {
                    atom: name.atom.clone(),
                    literal: name.literal,
                    value,
                })
            })
            .collect();

        let z = semiring.zero();
        let mut evaluator = Evaluator {
            compiled,
            semiring,
            weights,
            evidence,
            fixed: HashMap::new(),
            consistent: true,
            z,
        };
        evaluator.refresh()?;
        Ok(evaluator)
    }

    /// Observe a query/evidence name or a probabilistic atom. Replaces an earlier
    /// observation of the same atom; on inconsistency the previous evidence is kept.
    pub fn set_evidence(&mut self, atom: &Atom, value: bool) -> Result<(), EvalError> {
        let literal = self.literal(atom)?;
        let previous = self.evidence.clone();

        self.evidence.retain(|o| &o.atom != atom);
        self.evidence.push(Observation {
            atom: atom.clone(),
            literal,
            value,
        });

        if let Err(err) = self.refresh() {
            self.evidence = previous;
            let _ = self.refresh();
            return Err(err);
        }
        Ok(())
    }

    /// Drop all evidence, including the evidence named in the formula
    pub fn clear_evidence(&mut self) -> Result<(), EvalError> {
        self.evidence.clear();
        self.refresh()
    }

    /// The weighted count of the evidence; with probabilities this is `P(evidence)`
    pub fn normalization(&self) -> &S::Value {
        &self.z
    }

    /// Probability of a named atom or probabilistic atom given the evidence
    pub fn probability(&self, atom: &Atom) -> Result<S::Value, EvalError> {
        let literal = self.literal(atom)?;
        Ok(self.semiring.normalize(&self.count_with(literal), &self.z))
    }

    /// Every query of the formula, in order
    pub fn evaluate_all(&self) -> Result<Vec<(Atom, S::Value)>, EvalError> {
        let results: Vec<(Atom, S::Value)> = self
            .compiled
            .cnf()
            .queries()
            .map(|name| {
                let value = self
                    .semiring
                    .normalize(&self.count_with(name.literal), &self.z);
                (name.atom.clone(), value)
            })
            .collect();
        debug!(queries = results.len(), "evaluated queries");
        Ok(results)
    }

    fn literal(&self, atom: &Atom) -> Result<CnfLit, EvalError> {
        self.compiled
            .cnf()
            .lookup(atom)
            .ok_or_else(|| EvalError::UnknownAtom {
                atom: atom.to_string(),
            })
    }

    /// Recompute fixed literals and `Z` from the evidence list
    fn refresh(&mut self) -> Result<(), EvalError> {
        self.fixed.clear();
        self.consistent = true;
        for observation in &self.evidence {
            match observation.literal {
                CnfLit::True => self.consistent &= observation.value,
                CnfLit::False => self.consistent &= !observation.value,
                CnfLit::Lit(lit) => {
                    let value = (lit > 0) == observation.value;
                    let previous = self.fixed.insert(lit.unsigned_abs(), value);
                    if previous.is_some_and(|p| p != value) {
                        self.consistent = false;
                    }
                }
            }
        }

        self.z = if self.consistent {
            self.count(&self.fixed)
        } else {
            self.semiring.zero()
        };

        if self.semiring.is_zero(&self.z) {
            return Err(EvalError::InconsistentEvidence {
                evidence: self
                    .evidence
                    .iter()
                    .map(|o| format!("{}={}", o.atom, o.value))
                    .collect(),
            });
        }
        Ok(())
    }

    /// Weighted count with `literal` true in addition to the evidence
    fn count_with(&self, literal: CnfLit) -> S::Value {
        match literal {
            CnfLit::True => self.z.clone(),
            CnfLit::False => self.semiring.zero(),
            CnfLit::Lit(lit) => {
                let var = lit.unsigned_abs();
                let value = lit > 0;
                match self.fixed.get(&var) {
                    Some(fixed) if *fixed != value => self.semiring.zero(),
                    Some(_) => self.z.clone(),
                    None => {
                        let mut fixed = self.fixed.clone();
                        fixed.insert(var, value);
                        self.count(&fixed)
                    }
                }
            }
        }
    }

    /// One bottom-up pass over the circuit
    fn count(&self, fixed: &HashMap<u32, bool>) -> S::Value {
        let circuit = self.compiled.circuit();
        let mut values: Vec<S::Value> = Vec::with_capacity(circuit.len());
        for (_, node) in circuit.nodes() {
            let value = match node {
                CircuitNode::True => self.semiring.one(),
                CircuitNode::False => self.semiring.zero(),
                CircuitNode::Literal(lit) => self.literal_weight(*lit, fixed),
                CircuitNode::And(children) => {
                    children.iter().fold(self.semiring.one(), |acc, c| {
                        self.semiring.times(&acc, &values[c.get()])
                    })
                }
                CircuitNode::Or { children, .. } => {
                    children.iter().fold(self.semiring.zero(), |acc, c| {
                        self.semiring.plus(&acc, &values[c.get()])
                    })
                }
            };
            values.push(value);
        }
        values
            .get(circuit.root().get())
            .cloned()
            .unwrap_or_else(|| self.semiring.one())
    }

    fn literal_weight(&self, lit: i32, fixed: &HashMap<u32, bool>) -> S::Value {
        let var = lit.unsigned_abs();
        if let Some(value) = fixed.get(&var) {
            if *value != (lit > 0) {
                return self.semiring.zero();
            }
        }
        match self.weights.get(var as usize - 1) {
            Some((positive, _)) if lit > 0 => positive.clone(),
            Some((_, negative)) => negative.clone(),
            None => self.semiring.one(),
        }
    }
}

impl Evaluator<'_, ProbabilitySemiring> {
    /// Probabilities of every query, conditioned on the evidence
    pub fn query_probabilities(&self) -> Result<QueryProbabilities, EvalError> {
        Ok(QueryProbabilities::new(self.evaluate_all()?))
    }
}
