use super::*;
use probalog_compile::{compile_formula, CompileConfig};
use probalog_formula::{Label, LogicFormula, NodeRef};

fn atom(name: &str) -> Atom {
    Atom::new(name, vec![])
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}

/// alarm = (burglary AND 0.9) OR (earthquake AND 0.3)
fn alarm_formula() -> LogicFormula {
    let mut formula = LogicFormula::new();
    let burglary = formula.add_atom(atom("burglary"), 0.1, None);
    let earthquake = formula.add_atom(atom("earthquake"), 0.2, None);
    let by_burglary = formula.add_atom(atom("alarm"), 0.9, None);
    let by_earthquake = formula.add_atom(atom("alarm"), 0.3, None);
    let b = formula.add_and(vec![burglary, by_burglary]);
    let e = formula.add_and(vec![earthquake, by_earthquake]);
    let alarm = formula.add_or(vec![b, e]);
    formula.add_name(atom("burglary"), burglary, Label::Query);
    formula.add_name(atom("alarm"), alarm, Label::Query);
    formula
}

fn compiled(formula: &LogicFormula) -> CompiledFormula {
    compile_formula(formula, &CompileConfig::default()).unwrap()
}

const P_ALARM: f64 = 1.0 - (1.0 - 0.1 * 0.9) * (1.0 - 0.2 * 0.3);

#[test]
fn test_marginals_without_evidence() {
    let compiled = compiled(&alarm_formula());
    let evaluator = Evaluator::new(&compiled, ProbabilitySemiring).unwrap();

    assert!(close(*evaluator.normalization(), 1.0));
    assert!(close(evaluator.probability(&atom("burglary")).unwrap(), 0.1));
    assert!(close(evaluator.probability(&atom("alarm")).unwrap(), P_ALARM));
    assert!(close(evaluator.probability(&atom("earthquake")).unwrap(), 0.2));
}

#[test]
fn test_formula_evidence_conditions_queries() {
    let mut formula = alarm_formula();
    let alarm = formula.lookup(&atom("alarm")).unwrap();
    formula.add_name(atom("alarm"), alarm, Label::EvidencePositive);
    let compiled = compiled(&formula);

    let evaluator = Evaluator::new(&compiled, ProbabilitySemiring).unwrap();
    assert!(close(*evaluator.normalization(), P_ALARM));

    let joint = 0.1 * (1.0 - (1.0 - 0.9) * (1.0 - 0.2 * 0.3));
    let results = evaluator.query_probabilities().unwrap();
    assert_eq!(results.len(), 2);
    assert!(close(results.get(&atom("burglary")).unwrap(), joint / P_ALARM));
    assert_eq!(results.get(&atom("alarm")), Some(1.0));
}

#[test]
fn test_set_and_clear_evidence() {
    let compiled = compiled(&alarm_formula());
    let mut evaluator = Evaluator::new(&compiled, ProbabilitySemiring).unwrap();

    evaluator.set_evidence(&atom("burglary"), true).unwrap();
    let expected = 1.0 - (1.0 - 0.9) * (1.0 - 0.2 * 0.3);
    assert!(close(evaluator.probability(&atom("alarm")).unwrap(), expected));

    // a later observation of the same atom replaces the earlier one
    evaluator.set_evidence(&atom("burglary"), false).unwrap();
    assert!(close(evaluator.probability(&atom("alarm")).unwrap(), 0.2 * 0.3));

    evaluator.clear_evidence().unwrap();
    assert!(close(evaluator.probability(&atom("alarm")).unwrap(), P_ALARM));
}

#[test]
fn test_inconsistent_evidence_is_an_error() {
    let compiled = compiled(&alarm_formula());
    let mut evaluator = Evaluator::new(&compiled, ProbabilitySemiring).unwrap();

    evaluator.set_evidence(&atom("burglary"), false).unwrap();
    evaluator.set_evidence(&atom("earthquake"), false).unwrap();
    let err = evaluator.set_evidence(&atom("alarm"), true).unwrap_err();
    assert_eq!(
        err,
        EvalError::InconsistentEvidence {
            evidence: vec![
                "burglary=false".to_string(),
                "earthquake=false".to_string(),
                "alarm=true".to_string(),
            ]
        }
    );

    // the rejected observation is not kept
    assert!(close(evaluator.probability(&atom("alarm")).unwrap(), 0.0));
    assert!(close(*evaluator.normalization(), 0.9 * 0.8));
}

#[test]
fn test_constant_evidence() {
    let mut formula = alarm_formula();
    formula.add_name(atom("impossible"), NodeRef::False, Label::EvidencePositive);
    let rejected = compiled(&formula);
    assert!(matches!(
        Evaluator::new(&rejected, ProbabilitySemiring),
        Err(EvalError::InconsistentEvidence { .. })
    ));

    let mut formula = alarm_formula();
    formula.add_name(atom("certain"), NodeRef::True, Label::EvidencePositive);
    formula.add_name(atom("always"), NodeRef::True, Label::Query);
    let compiled = compiled(&formula);
    let evaluator = Evaluator::new(&compiled, ProbabilitySemiring).unwrap();
    assert_eq!(evaluator.probability(&atom("always")).unwrap(), 1.0);
    assert!(close(evaluator.probability(&atom("burglary")).unwrap(), 0.1));
}

#[test]
fn test_negated_names() {
    let mut formula = alarm_formula();
    let alarm = formula.lookup(&atom("alarm")).unwrap();
    formula.add_name(atom("quiet"), alarm.negate(), Label::Query);
    let compiled = compiled(&formula);

    let results = evaluate(&compiled).unwrap();
    assert!(close(results.get(&atom("quiet")).unwrap(), 1.0 - P_ALARM));
}

#[test]
fn test_unknown_atom() {
    let compiled = compiled(&alarm_formula());
    let mut evaluator = Evaluator::new(&compiled, ProbabilitySemiring).unwrap();
    assert_eq!(
        evaluator.probability(&atom("fire")),
        Err(EvalError::UnknownAtom {
            atom: "fire".to_string()
        })
    );
    assert!(evaluator.set_evidence(&atom("fire"), true).is_err());
}

#[test]
fn test_annotated_disjunction_probabilities() {
    let mut formula = LogicFormula::new();
    let (_, members) = formula.add_group(vec![(atom("red"), 0.2), (atom("blue"), 0.5)]);
    formula.add_name(atom("red"), members[0], Label::Query);
    formula.add_name(atom("blue"), members[1], Label::Query);
    let compiled = compiled(&formula);

    let mut evaluator = Evaluator::new(&compiled, ProbabilitySemiring).unwrap();
    assert!(close(evaluator.probability(&atom("red")).unwrap(), 0.2));
    assert!(close(evaluator.probability(&atom("blue")).unwrap(), 0.5));

    // exclusive: observing red rules out blue
    evaluator.set_evidence(&atom("red"), true).unwrap();
    assert_eq!(evaluator.probability(&atom("blue")).unwrap(), 0.0);

    evaluator.set_evidence(&atom("red"), false).unwrap();
    assert!(close(evaluator.probability(&atom("blue")).unwrap(), 0.5 / 0.8));
}

#[test]
fn test_symbolic_counting_polynomial() {
    let mut formula = LogicFormula::new();
    let a = formula.add_atom(atom("a"), 0.3, None);
    formula.add_name(atom("a"), a, Label::Query);
    let compiled = compiled(&formula);

    let evaluator = Evaluator::new(&compiled, SymbolicSemiring).unwrap();
    assert_eq!(evaluator.normalization(), "0.3+(1-0.3)");
    assert_eq!(
        evaluator.probability(&atom("a")).unwrap(),
        "0.3/(0.3+(1-0.3))"
    );
}

#[test]
fn test_query_probabilities_display() {
    let results = QueryProbabilities::new(vec![(atom("a"), 0.25), (atom("b"), 1.0)]);
    assert_eq!(results.to_string(), "a: 0.25\nb: 1\n");
}
