//! Goal-directed resolution with call tabling
//!
//! Every call is tabled by its variant. A call is evaluated by resolving it against
//! each candidate clause and solving the body left to right; each solution records an
//! answer for the call and a derivation for the ground answer atom.
//!
//! # Recursion
//!
//! Calls are numbered in the order they are created (`dfn`) and kept on a completion
//! stack until they are complete. Re-entering a call that is still being evaluated
//! returns the answers found so far and lowers the caller's `lowlink`, in the manner
//! of Tarjan's algorithm. A call whose `lowlink` equals its own `dfn` leads its SCC:
//! it re-runs its clauses until a pass adds no new answer or derivation anywhere, then
//! marks every call above it on the completion stack complete.
//!
//! Incomplete calls that are not on the active stack are re-evaluated once per leader
//! pass (tracked with `epoch`), so they observe answers added since.

use crate::config::GroundingConfig;
use crate::error::GroundingError;
use crate::ground_program::{GroundLit, GroundProgram};
use probalog_ast::{Atom, Literal, Term};
use probalog_core::{
    eval_builtin, parse_builtin, unify_atoms, variant_key, BuiltinError, Clause, ClauseDatabase,
    ClauseId, ClauseKind, DisjunctionId, Renamer, Substitution,
};
use probalog_formula::{LogicFormula, NodeRef};
use std::collections::{HashMap, HashSet};
use tracing::trace;

type CallId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallState {
    Active,
    Incomplete,
    Complete,
}

#[derive(Debug)]
struct CallEntry {
    goal: Atom,
    answers: Vec<Atom>,
    answer_set: HashSet<Atom>,
    state: CallState,
    dfn: usize,
    lowlink: usize,
    /// Saw an active or incomplete call during its last evaluation
    recursive: bool,
    epoch: u64,
}

/// Partial solutions of a clause body: bindings plus the ground literals used so far
type Solutions = Vec<(Substitution, Vec<GroundLit>)>;

pub(crate) struct Grounder<'a> {
    db: &'a ClauseDatabase,
    config: &'a GroundingConfig,
    formula: LogicFormula,
    program: GroundProgram,
    renamer: Renamer,
    calls: HashMap<Atom, CallId>,
    table: Vec<CallEntry>,
    active: Vec<CallId>,
    completion: Vec<CallId>,
    epoch: u64,
    changes: u64,
    leaves: HashMap<(ClauseId, Vec<Term>), NodeRef>,
    groups: HashMap<(DisjunctionId, Vec<Term>), Vec<NodeRef>>,
}

impl<'a> Grounder<'a> {
    pub(crate) fn new(db: &'a ClauseDatabase, config: &'a GroundingConfig) -> Self {
        Grounder {
            db,
            config,
            formula: LogicFormula::new(),
            program: GroundProgram::new(),
            renamer: Renamer::new(),
            calls: HashMap::new(),
            table: Vec::new(),
            active: Vec::new(),
            completion: Vec::new(),
            epoch: 0,
            changes: 0,
            leaves: HashMap::new(),
            groups: HashMap::new(),
        }
    }

    /// Ground a top-level goal and return its ground answers
    pub(crate) fn solve(&mut self, goal: &Atom) -> Result<Vec<Atom>, GroundingError> {
        let (_, answers) = self.call(goal, 0)?;
        Ok(answers)
    }

    pub(crate) fn call_count(&self) -> usize {
        self.table.len()
    }

    pub(crate) fn finish(self) -> (LogicFormula, GroundProgram) {
        (self.formula, self.program)
    }

    fn call(&mut self, goal: &Atom, depth: usize) -> Result<(CallId, Vec<Atom>), GroundingError> {
        if depth > self.config.max_depth {
            return Err(GroundingError::DepthExceeded {
                goal: goal.to_string(),
                limit: self.config.max_depth,
            });
        }

        let key = variant_key(goal);
        let id = match self.calls.get(&key).copied() {
            None => {
                let id = self.table.len();
                let dfn = self.completion.len();
                self.table.push(CallEntry {
                    goal: goal.clone(),
                    answers: Vec::new(),
                    answer_set: HashSet::new(),
                    state: CallState::Incomplete,
                    dfn,
                    lowlink: dfn,
                    recursive: false,
                    epoch: self.epoch,
                });
                self.completion.push(id);
                self.calls.insert(key, id);
                trace!(goal = %goal, depth, "new call");
                self.evaluate(id, depth)?;
                id
            }
            Some(id) => {
                match self.table[id].state {
                    CallState::Complete => {}
                    CallState::Active => self.note_dependency(self.table[id].dfn),
                    CallState::Incomplete => {
                        if self.table[id].epoch < self.epoch {
                            self.evaluate(id, depth)?;
                        } else {
                            self.note_dependency(self.table[id].lowlink);
                        }
                    }
                }
                id
            }
        };

        Ok((id, self.table[id].answers.clone()))
    }

    /// The innermost active call depends on an incomplete call numbered `lowlink`
    fn note_dependency(&mut self, lowlink: usize) {
        if let Some(&top) = self.active.last() {
            let entry = &mut self.table[top];
            entry.lowlink = entry.lowlink.min(lowlink);
            entry.recursive = true;
        }
    }

    fn evaluate(&mut self, id: CallId, depth: usize) -> Result<(), GroundingError> {
        let dfn = self.table[id].dfn;
        {
            let entry = &mut self.table[id];
            entry.state = CallState::Active;
            entry.lowlink = dfn;
            entry.recursive = false;
        }
        self.active.push(id);

        loop {
            let before = self.changes;
            self.table[id].epoch = self.epoch;
            self.resolve(id, depth)?;

            let entry = &self.table[id];
            if entry.lowlink < dfn || !entry.recursive || self.changes == before {
                break;
            }
            // Leader of a recursive component: run another pass
            self.epoch += 1;
        }

        self.active.pop();
        let lowlink = self.table[id].lowlink;
        if lowlink == dfn {
            for call in self.completion.drain(dfn..) {
                self.table[call].state = CallState::Complete;
            }
            trace!(
                goal = %self.table[id].goal,
                answers = self.table[id].answers.len(),
                "call complete"
            );
        } else {
            self.table[id].state = CallState::Incomplete;
            self.note_dependency(lowlink);
        }
        Ok(())
    }

    /// One pass over the clauses matching the call's goal
    fn resolve(&mut self, id: CallId, depth: usize) -> Result<(), GroundingError> {
        let db = self.db;
        let goal = self.table[id].goal.clone();

        for clause in db.candidates(&goal) {
            let renaming = self.renamer.fresh_substitution(&clause.variables);
            let head = renaming.apply_atom(&clause.head);
            let mut subst = Substitution::new();
            if !unify_atoms(&head, &goal, &mut subst) {
                continue;
            }

            let body: Vec<Literal> = clause
                .body
                .iter()
                .map(|literal| renaming.apply_literal(literal))
                .collect();

            for (subst, mut lits) in self.solve_body(&body, subst, depth)? {
                let answer = subst.apply_atom(&head);
                if !answer.is_ground() {
                    return Err(GroundingError::NonGroundAnswer {
                        atom: answer.to_string(),
                    });
                }

                match clause.kind {
                    ClauseKind::Deterministic => {}
                    ClauseKind::Probabilistic { probability } => {
                        let bindings = instance_bindings(clause, &renaming, &subst, &answer)?;
                        if let Some(leaf) =
                            self.probabilistic_leaf(clause.id, bindings, &answer, probability)
                        {
                            lits.push(GroundLit::Leaf(leaf));
                        }
                    }
                    ClauseKind::Annotated {
                        disjunction,
                        choice,
                    } => {
                        let bindings = instance_bindings(clause, &renaming, &subst, &answer)?;
                        let group =
                            self.annotated_group(disjunction, bindings, &renaming, &subst)?;
                        lits.push(GroundLit::Leaf(group[choice]));
                    }
                }

                self.record(id, answer, lits);
            }
        }
        Ok(())
    }

    fn record(&mut self, id: CallId, answer: Atom, lits: Vec<GroundLit>) {
        let atom = self.program.intern(answer.clone());
        if self.program.add_derivation(atom, lits) {
            self.changes += 1;
        }
        let entry = &mut self.table[id];
        if entry.answer_set.insert(answer.clone()) {
            entry.answers.push(answer);
            self.changes += 1;
        }
    }

    /// Independent choice of one probabilistic clause instance; `None` when certain
    fn probabilistic_leaf(
        &mut self,
        clause: ClauseId,
        bindings: Vec<Term>,
        answer: &Atom,
        probability: f64,
    ) -> Option<NodeRef> {
        if probability == 1.0 {
            return None;
        }
        let formula = &mut self.formula;
        Some(
            *self
                .leaves
                .entry((clause, bindings))
                .or_insert_with(|| formula.add_atom(answer.clone(), probability, None)),
        )
    }

    /// All heads of one annotated-disjunction instance, created together as a group
    fn annotated_group(
        &mut self,
        disjunction: DisjunctionId,
        bindings: Vec<Term>,
        renaming: &Substitution,
        subst: &Substitution,
    ) -> Result<Vec<NodeRef>, GroundingError> {
        let key = (disjunction, bindings);
        if let Some(group) = self.groups.get(&key) {
            return Ok(group.clone());
        }

        let db = self.db;
        let heads = &db.disjunctions()[disjunction].heads;
        let mut members = Vec::with_capacity(heads.len());
        for head in heads {
            let atom = subst.apply_atom(&renaming.apply_atom(&head.atom));
            if !atom.is_ground() {
                return Err(GroundingError::NonGroundAnswer {
                    atom: atom.to_string(),
                });
            }
            members.push((atom, head.probability));
        }

        let (_, refs) = self.formula.add_group(members);
        self.groups.insert(key, refs.clone());
        Ok(refs)
    }

    fn solve_body(
        &mut self,
        body: &[Literal],
        subst: Substitution,
        depth: usize,
    ) -> Result<Solutions, GroundingError> {
        let mut partial: Solutions = vec![(subst, Vec::new())];
        for literal in body {
            let mut next = Vec::new();
            for (subst, lits) in partial {
                for (extended, lit) in self.solve_literal(literal, &subst, depth)? {
                    let mut lits = lits.clone();
                    lits.extend(lit);
                    next.push((extended, lits));
                }
            }
            partial = next;
            if partial.is_empty() {
                break;
            }
        }
        Ok(partial)
    }

    fn solve_literal(
        &mut self,
        literal: &Literal,
        subst: &Substitution,
        depth: usize,
    ) -> Result<Vec<(Substitution, Option<GroundLit>)>, GroundingError> {
        let atom = subst.apply_atom(literal.atom());

        if let Some(builtin) = parse_builtin(&atom) {
            let result = eval_builtin(&builtin, subst).map_err(|e| builtin_error(&atom, e))?;
            return Ok(match (literal, result) {
                (Literal::Positive(_), Some(extended)) => vec![(extended, None)],
                (Literal::Negative(_), None) => vec![(subst.clone(), None)],
                _ => Vec::new(),
            });
        }

        match literal {
            Literal::Positive(_) => {
                let (_, answers) = self.call(&atom, depth + 1)?;
                let mut solutions = Vec::new();
                for answer in answers {
                    let mut extended = subst.clone();
                    if unify_atoms(&atom, &answer, &mut extended) {
                        let idx = self.program.intern(answer);
                        solutions.push((
                            extended,
                            Some(GroundLit::Derived {
                                atom: idx,
                                positive: true,
                            }),
                        ));
                    }
                }
                Ok(solutions)
            }
            Literal::Negative(_) => {
                if !atom.is_ground() {
                    return Err(GroundingError::Floundering {
                        literal: Literal::Negative(atom).to_string(),
                    });
                }
                let (id, answers) = self.call(&atom, depth + 1)?;
                if self.table[id].state != CallState::Complete {
                    return Err(GroundingError::UnstratifiedNegation {
                        atom: atom.to_string(),
                    });
                }
                if answers.is_empty() {
                    return Ok(vec![(subst.clone(), None)]);
                }
                let idx = self.program.intern(atom);
                Ok(vec![(
                    subst.clone(),
                    Some(GroundLit::Derived {
                        atom: idx,
                        positive: false,
                    }),
                )])
            }
        }
    }
}

/// Ground values of the variables identifying a clause instance
fn instance_bindings(
    clause: &Clause,
    renaming: &Substitution,
    subst: &Substitution,
    answer: &Atom,
) -> Result<Vec<Term>, GroundingError> {
    clause
        .variables
        .iter()
        .map(|var| {
            let value = subst.apply(&renaming.apply(&Term::Variable(*var)));
            if value.is_ground() {
                Ok(value)
            } else {
                Err(GroundingError::NonGroundAnswer {
                    atom: answer.to_string(),
                })
            }
        })
        .collect()
}

fn builtin_error(goal: &Atom, error: BuiltinError) -> GroundingError {
    match error {
        BuiltinError::Instantiation(_) => GroundingError::Instantiation {
            goal: goal.to_string(),
        },
        other => GroundingError::Arithmetic {
            goal: goal.to_string(),
            reason: other.to_string(),
        },
    }
}
