//! Shared resolution machinery for Probalog
//!
//! - [`unification`]: substitutions, unification, renaming apart, call variants
//! - [`clause_db`]: clauses indexed by `(predicate, arity)`
//! - [`builtins`]: built-in predicates and arithmetic
//! - [`validate`]: structural program checks

pub mod builtins;
pub mod clause_db;
pub mod unification;
pub mod validate;

pub use builtins::{eval_arith, eval_builtin, is_builtin, parse_builtin, BuiltIn, BuiltinError, CompOp};
pub use clause_db::{Clause, ClauseDatabase, ClauseId, ClauseKind, Disjunction, DisjunctionId};
pub use unification::{unify, unify_atoms, variant_key, Renamer, Substitution};
pub use validate::{validate_program, ProgramError};
