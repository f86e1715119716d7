//! Clause database indexed by predicate and arity
//!
//! Every program statement that can derive an atom (facts, rules, probabilistic
//! clauses, annotated-disjunction heads) becomes a [`Clause`]. Resolution looks up
//! candidate clauses for a goal by its `(predicate, arity)` key.
//!
//! An annotated disjunction contributes one clause per head. All of them point at the
//! same [`Disjunction`] so that the grounder can create the mutually exclusive choices
//! of one instance together.

use probalog_ast::{clause_variables, AnnotatedHead, Atom, Literal, Program, Statement, Symbol};
use std::collections::HashMap;

pub type ClauseId = usize;
pub type DisjunctionId = usize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClauseKind {
    Deterministic,
    /// Each ground instance is an independent choice with this weight
    Probabilistic { probability: f64 },
    /// Head `choice` of annotated disjunction `disjunction`
    Annotated {
        disjunction: DisjunctionId,
        choice: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub id: ClauseId,
    pub head: Atom,
    pub body: Vec<Literal>,
    pub kind: ClauseKind,
    /// Variables that identify a ground instance, in first-occurrence order.
    /// For annotated heads these are the variables of the whole disjunction.
    pub variables: Vec<Symbol>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Disjunction {
    pub id: DisjunctionId,
    pub heads: Vec<AnnotatedHead>,
    pub body: Vec<Literal>,
    pub variables: Vec<Symbol>,
}

/// All clauses of a program, indexed by `(predicate, arity)`
#[derive(Debug, Clone, Default)]
pub struct ClauseDatabase {
    clauses: Vec<Clause>,
    disjunctions: Vec<Disjunction>,
    index: HashMap<(Symbol, usize), Vec<ClauseId>>,
}

impl ClauseDatabase {
    pub fn new() -> Self {
        ClauseDatabase {
            clauses: Vec::new(),
            disjunctions: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Collect the clauses of a program in statement order
    pub fn from_program(program: &Program) -> Self {
        let mut db = ClauseDatabase::new();
        for statement in &program.statements {
            match statement {
                Statement::Fact(fact) => {
                    db.push(fact.atom.clone(), Vec::new(), ClauseKind::Deterministic, None);
                }
                Statement::Rule(rule) => {
                    db.push(
                        rule.head.clone(),
                        rule.body.clone(),
                        ClauseKind::Deterministic,
                        None,
                    );
                }
                Statement::Probabilistic(clause) => {
                    db.push(
                        clause.head.clone(),
                        clause.body.clone(),
                        ClauseKind::Probabilistic {
                            probability: clause.probability,
                        },
                        None,
                    );
                }
                Statement::AnnotatedDisjunction(ad) => {
                    db.push_disjunction(ad.heads.clone(), ad.body.clone());
                }
                Statement::Query(_) | Statement::Evidence(_) => {}
            }
        }
        db
    }

    fn push(
        &mut self,
        head: Atom,
        body: Vec<Literal>,
        kind: ClauseKind,
        variables: Option<Vec<Symbol>>,
    ) {
        let id = self.clauses.len();
        let variables = variables.unwrap_or_else(|| clause_variables(&head, &body));
        self.index
            .entry((head.predicate, head.arity()))
            .or_default()
            .push(id);
        self.clauses.push(Clause {
            id,
            head,
            body,
            kind,
            variables,
        });
    }

    fn push_disjunction(&mut self, heads: Vec<AnnotatedHead>, body: Vec<Literal>) {
        let id = self.disjunctions.len();

        let mut variables: Vec<Symbol> = Vec::new();
        for head in &heads {
            for var in clause_variables(&head.atom, &body) {
                if !variables.contains(&var) {
                    variables.push(var);
                }
            }
        }

        for (choice, head) in heads.iter().enumerate() {
            self.push(
                head.atom.clone(),
                body.clone(),
                ClauseKind::Annotated {
                    disjunction: id,
                    choice,
                },
                Some(variables.clone()),
            );
        }

        self.disjunctions.push(Disjunction {
            id,
            heads,
            body,
            variables,
        });
    }

    /// Clauses whose head has the goal's predicate and arity, in program order
    pub fn candidates<'a>(&'a self, goal: &Atom) -> impl Iterator<Item = &'a Clause> + 'a {
        self.index
            .get(&(goal.predicate, goal.arity()))
            .into_iter()
            .flatten()
            .map(move |id| &self.clauses[*id])
    }

    pub fn clause(&self, id: ClauseId) -> Option<&Clause> {
        self.clauses.get(id)
    }

    pub fn disjunction(&self, id: DisjunctionId) -> Option<&Disjunction> {
        self.disjunctions.get(id)
    }

    pub fn disjunctions(&self) -> &[Disjunction] {
        &self.disjunctions
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

#[cfg(test)]
#[path = "../tests/unit/clause_db_tests.rs"]
mod tests;
