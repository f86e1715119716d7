//! Top-down compilation of a CNF into a d-DNNF circuit
//!
//! The search is a DPLL-style exhaustive one:
//!
//! - unit propagation fixes forced literals (a conflict yields `False`);
//! - the remaining clauses are split into components sharing no variable, compiled
//!   independently and joined by a decomposable AND;
//! - a component is compiled by deciding its most frequent variable, giving an OR of
//!   two AND branches with opposite decision literals, which are deterministic by
//!   construction;
//! - compiled components are cached by their canonical clause set.

use crate::circuit::{Circuit, CircuitBuilder, CircuitId};
use crate::config::CompileConfig;
use crate::error::{CompileError, Resource};
use probalog_sat::Cnf;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::{debug, info_span};

type Clause = Vec<i32>;

struct Compiler<'a> {
    config: &'a CompileConfig,
    builder: CircuitBuilder,
    cache: HashMap<Vec<Clause>, CircuitId>,
    decisions: usize,
    cache_hits: usize,
    started: Instant,
}

/// Compile the CNF into a smoothed d-DNNF over all of its variables
pub fn compile(cnf: &Cnf, config: &CompileConfig) -> Result<Circuit, CompileError> {
    let _span = info_span!(
        "compile",
        vars = cnf.num_vars(),
        clauses = cnf.clauses().len()
    )
    .entered();

    let mut compiler = Compiler {
        config,
        builder: CircuitBuilder::new(config.max_nodes),
        cache: HashMap::new(),
        decisions: 0,
        cache_hits: 0,
        started: Instant::now(),
    };

    let clauses: Vec<Clause> = cnf.clauses().iter().filter_map(|c| normalize(c)).collect();
    let root = compiler.compile_clauses(clauses, 0)?;
    debug!(
        nodes = compiler.builder.len(),
        decisions = compiler.decisions,
        cache_hits = compiler.cache_hits,
        "search finished"
    );

    let circuit = compiler.builder.finish(root, cnf.num_vars());
    let smoothed = circuit.smooth(config.max_nodes)?;
    debug!(
        nodes = smoothed.len(),
        edges = smoothed.edge_count(),
        "circuit smoothed"
    );
    Ok(smoothed)
}

impl Compiler<'_> {
    fn check_limits(&self, depth: usize) -> Result<(), CompileError> {
        if depth > self.config.max_depth {
            return Err(CompileError::ResourceExhausted {
                resource: Resource::Depth,
                limit: self.config.max_depth,
            });
        }
        if let Some(timeout) = self.config.timeout {
            let elapsed = self.started.elapsed();
            if elapsed >= timeout {
                return Err(CompileError::Timeout { elapsed });
            }
        }
        Ok(())
    }

    fn compile_clauses(
        &mut self,
        clauses: Vec<Clause>,
        depth: usize,
    ) -> Result<CircuitId, CompileError> {
        self.check_limits(depth)?;

        let Some((units, residual)) = propagate(clauses) else {
            return self.builder.constant(false);
        };

        let mut children = Vec::with_capacity(units.len() + 1);
        for unit in units {
            children.push(self.builder.literal(unit)?);
        }
        for component in components(residual) {
            children.push(self.compile_component(component, depth)?);
        }
        self.builder.and(children)
    }

    fn compile_component(
        &mut self,
        mut clauses: Vec<Clause>,
        depth: usize,
    ) -> Result<CircuitId, CompileError> {
        clauses.sort();
        clauses.dedup();
        if let Some(id) = self.cache.get(&clauses) {
            self.cache_hits += 1;
            return Ok(*id);
        }

        self.decisions += 1;
        if self.decisions > self.config.max_decisions {
            return Err(CompileError::ResourceExhausted {
                resource: Resource::Decisions,
                limit: self.config.max_decisions,
            });
        }

        let var = most_frequent_variable(&clauses);
        let mut branches = Vec::with_capacity(2);
        for lit in [var as i32, -(var as i32)] {
            let Some(conditioned) = condition(&clauses, lit) else {
                continue;
            };
            let body = self.compile_clauses(conditioned, depth + 1)?;
            let decision = self.builder.literal(lit)?;
            branches.push(self.builder.and(vec![decision, body])?);
        }
        let node = self.builder.or(var, branches)?;

        self.cache.insert(clauses, node);
        Ok(node)
    }
}

/// Sort literals by variable, drop duplicates; `None` for a tautology
fn normalize(clause: &[i32]) -> Option<Clause> {
    let mut clause = clause.to_vec();
    clause.sort_by_key(|lit| (lit.unsigned_abs(), *lit < 0));
    clause.dedup();
    if clause.windows(2).any(|w| w[0] == -w[1]) {
        return None;
    }
    Some(clause)
}

/// Assume `lit`: drop satisfied clauses and the opposite literal elsewhere.
/// `None` if a clause becomes empty.
fn condition(clauses: &[Clause], lit: i32) -> Option<Vec<Clause>> {
    let mut result = Vec::with_capacity(clauses.len());
    for clause in clauses {
        if clause.contains(&lit) {
            continue;
        }
        let reduced: Clause = clause.iter().copied().filter(|l| *l != -lit).collect();
        if reduced.is_empty() {
            return None;
        }
        result.push(reduced);
    }
    Some(result)
}

/// Forced literals and the clauses left after assuming them; `None` on conflict
fn propagate(mut clauses: Vec<Clause>) -> Option<(Vec<i32>, Vec<Clause>)> {
    let mut units = Vec::new();
    if clauses.iter().any(|c| c.is_empty()) {
        return None;
    }
    while let Some(unit) = clauses.iter().find(|c| c.len() == 1).map(|c| c[0]) {
        units.push(unit);
        clauses = condition(&clauses, unit)?;
    }
    Some((units, clauses))
}

/// Split clauses into groups that share no variable, ordered by smallest variable
fn components(clauses: Vec<Clause>) -> Vec<Vec<Clause>> {
    let mut parent: HashMap<u32, u32> = HashMap::new();

    fn find(parent: &mut HashMap<u32, u32>, var: u32) -> u32 {
        let mut root = var;
        while let Some(&next) = parent.get(&root) {
            if next == root {
                break;
            }
            root = next;
        }
        // path compression
        let mut current = var;
        while current != root {
            let next = parent.get(&current).copied().unwrap_or(root);
            parent.insert(current, root);
            current = next;
        }
        root
    }

    for clause in &clauses {
        let mut vars = clause.iter().map(|l| l.unsigned_abs());
        let Some(first) = vars.next() else {
            continue;
        };
        parent.entry(first).or_insert(first);
        for var in vars {
            parent.entry(var).or_insert(var);
            let a = find(&mut parent, first);
            let b = find(&mut parent, var);
            if a != b {
                parent.insert(a.max(b), a.min(b));
            }
        }
    }

    // keyed by the smallest variable of the component, which is its root
    let mut groups: BTreeMap<u32, Vec<Clause>> = BTreeMap::new();
    for clause in clauses {
        let Some(first) = clause.first() else {
            continue;
        };
        let root = find(&mut parent, first.unsigned_abs());
        groups.entry(root).or_default().push(clause);
    }
    groups.into_values().collect()
}

/// Variable with the most occurrences; ties go to the smallest variable
fn most_frequent_variable(clauses: &[Clause]) -> u32 {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for lit in clauses.iter().flatten() {
        *counts.entry(lit.unsigned_abs()).or_default() += 1;
    }
    let mut best = (0, 0);
    for (var, count) in counts {
        if count > best.1 {
            best = (var, count);
        }
    }
    best.0
}
