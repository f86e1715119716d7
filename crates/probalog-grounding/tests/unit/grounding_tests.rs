use super::*;
use probalog_ast::{Literal, Term};
use probalog_formula::{Node, NodeId};
use std::collections::HashMap;

fn var(name: &str) -> Term {
    Term::variable(name)
}

fn int(n: i64) -> Term {
    Term::integer(n)
}

fn cst(name: &str) -> Term {
    Term::constant(name)
}

fn atom(pred: &str, terms: Vec<Term>) -> Atom {
    Atom::new(pred, terms)
}

fn prop(pred: &str) -> Atom {
    Atom::new(pred, vec![])
}

fn pos(pred: &str, terms: Vec<Term>) -> Literal {
    Literal::Positive(Atom::new(pred, terms))
}

fn neg(pred: &str, terms: Vec<Term>) -> Literal {
    Literal::Negative(Atom::new(pred, terms))
}

fn edge_program() -> Program {
    let mut program = Program::new();
    for (from, to, p) in [
        (1, 2, 0.6),
        (1, 3, 0.1),
        (2, 5, 0.4),
        (2, 6, 0.3),
        (3, 4, 0.3),
        (4, 5, 0.8),
        (5, 6, 0.2),
        (7, 7, 0.1),
    ] {
        program.probabilistic_fact(p, atom("edge", vec![int(from), int(to)]));
    }
    program
        .rule(
            atom("path", vec![var("X"), var("Y")]),
            vec![pos("edge", vec![var("X"), var("Y")])],
        )
        .rule(
            atom("path", vec![var("X"), var("Y")]),
            vec![
                pos("edge", vec![var("X"), var("Z")]),
                pos("\\=", vec![var("Y"), var("Z")]),
                pos("path", vec![var("Z"), var("Y")]),
            ],
        );
    program
}

fn evaluate(formula: &LogicFormula, node: NodeRef, world: &HashMap<NodeId, bool>) -> bool {
    match node {
        NodeRef::True => true,
        NodeRef::False => false,
        NodeRef::Neg(id) => !evaluate(formula, NodeRef::Pos(id), world),
        NodeRef::Pos(id) => match formula.node(id) {
            Some(Node::Atom(_)) => world[&id],
            Some(Node::Conj(children)) => children.iter().all(|c| evaluate(formula, *c, world)),
            Some(Node::Disj(children)) => children.iter().any(|c| evaluate(formula, *c, world)),
            None => panic!("dangling node {}", id),
        },
    }
}

/// Probability of a node by enumerating every assignment of the leaves
fn brute_force(formula: &LogicFormula, node: NodeRef) -> f64 {
    let leaves: Vec<_> = formula.atoms().map(|(id, leaf)| (id, leaf.clone())).collect();
    assert!(leaves.len() <= 16, "too many leaves to enumerate");

    let mut total = 0.0;
    for mask in 0u32..(1 << leaves.len()) {
        let world: HashMap<NodeId, bool> = leaves
            .iter()
            .enumerate()
            .map(|(i, (id, _))| (*id, mask & (1 << i) != 0))
            .collect();

        let mut weight = 1.0;
        let mut chosen: HashMap<_, usize> = HashMap::new();
        for (id, leaf) in &leaves {
            match leaf.group {
                None => {
                    weight *= if world[id] {
                        leaf.probability
                    } else {
                        1.0 - leaf.probability
                    };
                }
                Some(group) => {
                    let count = chosen.entry(group).or_insert(0);
                    if world[id] {
                        *count += 1;
                        weight *= leaf.probability;
                    }
                }
            }
        }
        for (group, count) in chosen {
            match count {
                0 => weight *= formula.group_residual(group),
                1 => {}
                _ => weight = 0.0,
            }
        }

        if weight > 0.0 && evaluate(formula, node, &world) {
            total += weight;
        }
    }
    total
}

fn query_node(formula: &LogicFormula, query: &Atom) -> NodeRef {
    formula
        .queries()
        .find(|name| &name.atom == query)
        .map(|name| name.node)
        .unwrap_or_else(|| panic!("no query named {}", query))
}

fn leaf_names(formula: &LogicFormula) -> Vec<String> {
    let mut names: Vec<String> = formula.atoms().map(|(_, leaf)| leaf.name.to_string()).collect();
    names.sort();
    names
}

#[test]
fn test_edge_path_touches_only_relevant_edges() {
    let program = edge_program();
    let query = atom("path", vec![int(1), int(3)]);
    let formula =
        ground_queries(&program, &[query.clone()], &[], &GroundingConfig::default()).unwrap();

    assert_eq!(
        leaf_names(&formula),
        vec!["edge(1,2)", "edge(1,3)", "edge(2,5)", "edge(2,6)", "edge(5,6)"]
    );

    let node = query_node(&formula, &query);
    assert_eq!(node, formula.lookup(&atom("edge", vec![int(1), int(3)])).unwrap());
    assert!((brute_force(&formula, node) - 0.1).abs() < 1e-12);
}

#[test]
fn test_evidence_is_named_with_its_value() {
    let program = edge_program();
    let query = atom("path", vec![int(1), int(3)]);
    let evidence = atom("path", vec![int(1), int(5)]);
    let formula = ground_queries(
        &program,
        &[query],
        &[(evidence.clone(), false)],
        &GroundingConfig::default(),
    )
    .unwrap();

    let names: Vec<_> = formula.evidence().collect();
    assert_eq!(names.len(), 1);
    assert_eq!(names[0].atom, evidence);
    assert_eq!(names[0].label, Label::EvidenceNegative);

    // path(1,5) = e12*e25 + (1 - e12*e25) * e13*e34*e45
    let direct = 0.6 * 0.4;
    let expected = direct + (1.0 - direct) * 0.1 * 0.3 * 0.8;
    assert!((brute_force(&formula, names[0].node) - expected).abs() < 1e-12);
}

#[test]
fn test_program_queries_and_evidence() {
    let mut program = Program::new();
    program
        .probabilistic_fact(0.1, prop("burglary"))
        .probabilistic_fact(0.2, prop("earthquake"))
        .probabilistic_rule(0.9, prop("alarm"), vec![pos("burglary", vec![])])
        .probabilistic_rule(0.3, prop("alarm"), vec![pos("earthquake", vec![])])
        .query(prop("burglary"))
        .evidence(prop("alarm"), true)
        .evidence(prop("nothing"), false);

    let formula = ground_program(&program, &GroundingConfig::default()).unwrap();
    let stats = formula.stats();
    assert_eq!(stats.queries, 1);
    assert_eq!(stats.evidence, 2);
    assert_eq!(stats.atoms, 4);

    let evidence: Vec<_> = formula.evidence().collect();
    assert_eq!(evidence[0].label, Label::EvidencePositive);
    let expected = 1.0 - (1.0 - 0.1 * 0.9) * (1.0 - 0.2 * 0.3);
    assert!((brute_force(&formula, evidence[0].node) - expected).abs() < 1e-12);

    assert_eq!(evidence[1].atom, prop("nothing"));
    assert_eq!(evidence[1].node, NodeRef::False);
}

#[test]
fn test_shared_subderivations_are_one_node() {
    let mut program = Program::new();
    program
        .probabilistic_fact(0.5, prop("x"))
        .probabilistic_fact(0.5, prop("y"))
        .probabilistic_fact(0.5, prop("z"))
        .probabilistic_fact(0.5, prop("w"))
        .rule(prop("a"), vec![pos("x", vec![]), pos("y", vec![])])
        .rule(prop("q1"), vec![pos("a", vec![]), pos("z", vec![])])
        .rule(prop("q2"), vec![pos("a", vec![]), pos("w", vec![])])
        .query(prop("q1"))
        .query(prop("q2"))
        .query(prop("a"));

    let formula = ground_program(&program, &GroundingConfig::default()).unwrap();
    let shared = query_node(&formula, &prop("a"));
    for query in ["q1", "q2"] {
        let node = query_node(&formula, &prop(query));
        let children = formula.node(node.node().unwrap()).unwrap().children();
        assert!(children.contains(&shared), "{} does not reuse a", query);
    }
    assert_eq!(formula.stats().conjunctions, 3);
    assert_eq!(formula.stats().atoms, 4);
}

#[test]
fn test_non_ground_query_names_every_answer() {
    let mut program = Program::new();
    program
        .probabilistic_fact(0.5, atom("edge", vec![int(1), int(2)]))
        .probabilistic_fact(0.5, atom("edge", vec![int(2), int(3)]))
        .rule(
            atom("path", vec![var("X"), var("Y")]),
            vec![pos("edge", vec![var("X"), var("Y")])],
        )
        .rule(
            atom("path", vec![var("X"), var("Y")]),
            vec![
                pos("edge", vec![var("X"), var("Z")]),
                pos("path", vec![var("Z"), var("Y")]),
            ],
        )
        .query(atom("path", vec![int(1), var("Y")]));

    let formula = ground_program(&program, &GroundingConfig::default()).unwrap();
    let answers: Vec<String> = formula.queries().map(|n| n.atom.to_string()).collect();
    assert_eq!(answers, vec!["path(1,2)", "path(1,3)"]);

    let far = query_node(&formula, &atom("path", vec![int(1), int(3)]));
    assert!((brute_force(&formula, far) - 0.25).abs() < 1e-12);
}

#[test]
fn test_query_without_answers_is_false() {
    let program = edge_program();
    let query = atom("path", vec![int(6), var("Y")]);
    let formula =
        ground_queries(&program, &[query.clone()], &[], &GroundingConfig::default()).unwrap();

    assert_eq!(query_node(&formula, &query), NodeRef::False);
}

#[test]
fn test_certain_probabilistic_fact_is_true() {
    let mut program = Program::new();
    program.probabilistic_fact(1.0, prop("sure")).query(prop("sure"));

    let formula = ground_program(&program, &GroundingConfig::default()).unwrap();
    assert_eq!(query_node(&formula, &prop("sure")), NodeRef::True);
    assert!(formula.is_empty());
}

#[test]
fn test_each_clause_instance_is_an_independent_choice() {
    let mut program = Program::new();
    program
        .fact(atom("coin", vec![int(1)]))
        .fact(atom("coin", vec![int(2)]))
        .probabilistic_rule(0.5, prop("heads"), vec![pos("coin", vec![var("C")])])
        .query(prop("heads"));

    let formula = ground_program(&program, &GroundingConfig::default()).unwrap();
    assert_eq!(formula.stats().atoms, 2);
    let node = query_node(&formula, &prop("heads"));
    assert!((brute_force(&formula, node) - 0.75).abs() < 1e-12);
}

#[test]
fn test_stratified_negation() {
    let mut program = Program::new();
    program
        .probabilistic_fact(0.3, prop("rain"))
        .rule(prop("dry"), vec![neg("rain", vec![])])
        .rule(prop("safe"), vec![neg("danger", vec![])])
        .query(prop("dry"))
        .query(prop("safe"));

    let formula = ground_program(&program, &GroundingConfig::default()).unwrap();
    let rain = formula.lookup(&prop("rain")).unwrap();
    assert_eq!(query_node(&formula, &prop("dry")), rain.negate());
    assert_eq!(query_node(&formula, &prop("safe")), NodeRef::True);
}

#[test]
fn test_annotated_disjunction_creates_one_group() {
    let mut program = Program::new();
    program
        .probabilistic_fact(0.9, prop("paint"))
        .annotated_disjunction(
            vec![
                (0.2, atom("colour", vec![cst("red")])),
                (0.5, atom("colour", vec![cst("blue")])),
            ],
            vec![pos("paint", vec![])],
        )
        .rule(prop("coloured"), vec![pos("colour", vec![var("C")])])
        .query(atom("colour", vec![cst("red")]))
        .query(prop("coloured"));

    let formula = ground_program(&program, &GroundingConfig::default()).unwrap();
    let groups: Vec<_> = formula.groups().collect();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].1.len(), 2);
    assert!((formula.group_residual(groups[0].0) - 0.3).abs() < 1e-12);

    let red = query_node(&formula, &atom("colour", vec![cst("red")]));
    assert!((brute_force(&formula, red) - 0.18).abs() < 1e-12);
    let coloured = query_node(&formula, &prop("coloured"));
    assert!((brute_force(&formula, coloured) - 0.63).abs() < 1e-12);
}

#[test]
fn test_annotated_disjunction_group_per_instance() {
    let mut program = Program::new();
    program
        .fact(atom("coin", vec![cst("a")]))
        .fact(atom("coin", vec![cst("b")]))
        .annotated_disjunction(
            vec![
                (0.5, atom("heads", vec![var("C")])),
                (0.5, atom("tails", vec![var("C")])),
            ],
            vec![pos("coin", vec![var("C")])],
        )
        .query(atom("heads", vec![cst("a")]))
        .query(atom("tails", vec![cst("a")]))
        .query(atom("tails", vec![cst("b")]));

    let formula = ground_program(&program, &GroundingConfig::default()).unwrap();
    assert_eq!(formula.groups().count(), 2);
    assert_eq!(formula.stats().atoms, 4);
}

#[test]
fn test_positive_cycle_is_broken() {
    let mut program = Program::new();
    program
        .probabilistic_fact(0.4, prop("e"))
        .rule(prop("p"), vec![pos("q", vec![])])
        .rule(prop("q"), vec![pos("p", vec![])])
        .rule(prop("q"), vec![pos("e", vec![])])
        .query(prop("p"));

    let formula = ground_program(&program, &GroundingConfig::default()).unwrap();
    let e = formula.lookup(&prop("e")).unwrap();
    assert_eq!(query_node(&formula, &prop("p")), e);

    let config = GroundingConfig::default().with_cycle_policy(CyclePolicy::Reject);
    assert!(matches!(
        ground_program(&program, &config),
        Err(GroundingError::PositiveCycle { .. })
    ));
}

#[test]
fn test_cyclic_graph_reachability() {
    let mut program = Program::new();
    program
        .probabilistic_fact(0.5, atom("edge", vec![int(1), int(2)]))
        .probabilistic_fact(0.7, atom("edge", vec![int(2), int(1)]))
        .probabilistic_fact(0.4, atom("edge", vec![int(2), int(3)]))
        .rule(
            atom("path", vec![var("X"), var("Y")]),
            vec![
                pos("path", vec![var("X"), var("Z")]),
                pos("edge", vec![var("Z"), var("Y")]),
            ],
        )
        .rule(
            atom("path", vec![var("X"), var("Y")]),
            vec![pos("edge", vec![var("X"), var("Y")])],
        )
        .query(atom("path", vec![int(1), var("Y")]));

    let formula = ground_program(&program, &GroundingConfig::default()).unwrap();
    let mut answers: Vec<String> = formula.queries().map(|n| n.atom.to_string()).collect();
    answers.sort();
    assert_eq!(answers, vec!["path(1,1)", "path(1,2)", "path(1,3)"]);

    let expected = [("path(1,1)", 0.35), ("path(1,2)", 0.5), ("path(1,3)", 0.2)];
    for (name, p) in expected {
        let node = formula
            .queries()
            .find(|n| n.atom.to_string() == name)
            .unwrap()
            .node;
        assert!((brute_force(&formula, node) - p).abs() < 1e-12, "{}", name);
    }
}

#[test]
fn test_negation_through_recursion_is_rejected() {
    let mut program = Program::new();
    program
        .rule(prop("p"), vec![neg("q", vec![])])
        .rule(prop("q"), vec![pos("p", vec![])])
        .query(prop("p"));

    assert!(matches!(
        ground_program(&program, &GroundingConfig::default()),
        Err(GroundingError::UnstratifiedNegation { .. })
    ));
}

#[test]
fn test_non_ground_negation_flounders() {
    let mut program = Program::new();
    program
        .fact(atom("r", vec![int(1)]))
        .rule(
            prop("p"),
            vec![neg("q", vec![var("X")]), pos("r", vec![var("X")])],
        )
        .query(prop("p"));

    assert!(matches!(
        ground_program(&program, &GroundingConfig::default()),
        Err(GroundingError::Floundering { .. })
    ));
}

#[test]
fn test_unbound_comparison_is_an_instantiation_error() {
    let mut program = Program::new();
    program
        .fact(atom("num", vec![int(1)]))
        .rule(
            atom("small", vec![var("X")]),
            vec![pos("<", vec![var("X"), int(3)]), pos("num", vec![var("X")])],
        )
        .query(atom("small", vec![var("Y")]));

    assert!(matches!(
        ground_program(&program, &GroundingConfig::default()),
        Err(GroundingError::Instantiation { .. })
    ));
}

#[test]
fn test_division_by_zero_is_reported() {
    let mut program = Program::new();
    program
        .rule(
            atom("ratio", vec![var("X")]),
            vec![pos(
                "is",
                vec![var("X"), Term::compound("/", vec![int(1), int(0)])],
            )],
        )
        .query(atom("ratio", vec![var("X")]));

    assert!(matches!(
        ground_program(&program, &GroundingConfig::default()),
        Err(GroundingError::Arithmetic { .. })
    ));
}

#[test]
fn test_depth_limit() {
    let mut program = Program::new();
    program
        .rule(
            atom("p", vec![var("X")]),
            vec![pos("q", vec![Term::compound("s", vec![var("X")])])],
        )
        .rule(atom("q", vec![var("X")]), vec![pos("p", vec![var("X")])])
        .query(atom("p", vec![cst("z")]));

    let config = GroundingConfig::default().with_max_depth(20);
    assert!(matches!(
        ground_program(&program, &config),
        Err(GroundingError::DepthExceeded { limit: 20, .. })
    ));
}

/// `0.99::edge(i, i+1)` for `i < n`, with the transitive `path/2` rules
fn chain_program(n: i64) -> Program {
    let mut program = Program::new();
    for i in 0..n {
        program.probabilistic_fact(0.99, atom("edge", vec![int(i), int(i + 1)]));
    }
    program
        .rule(
            atom("path", vec![var("X"), var("Y")]),
            vec![pos("edge", vec![var("X"), var("Y")])],
        )
        .rule(
            atom("path", vec![var("X"), var("Y")]),
            vec![
                pos("edge", vec![var("X"), var("Z")]),
                pos("\\=", vec![var("Y"), var("Z")]),
                pos("path", vec![var("Z"), var("Y")]),
            ],
        );
    program
}

#[test]
fn test_default_depth_limit_fits_a_spawned_thread() {
    let limit = GroundingConfig::default().max_depth as i64;

    let within = std::thread::spawn(move || {
        let query = atom("path", vec![int(0), int(limit - 1)]);
        let formula = ground_queries(
            &chain_program(limit - 1),
            &[query.clone()],
            &[],
            &GroundingConfig::default(),
        )
        .unwrap();
        let node = query_node(&formula, &query);
        (node, formula.stats().atoms)
    })
    .join()
    .expect("grounding thread completes");
    assert_ne!(within.0, NodeRef::False);
    assert_eq!(within.1, (limit - 1) as usize);

    let beyond = std::thread::spawn(move || {
        let query = atom("path", vec![int(0), int(limit + 50)]);
        ground_queries(
            &chain_program(limit + 50),
            &[query],
            &[],
            &GroundingConfig::default(),
        )
    })
    .join()
    .expect("grounding thread completes");
    assert!(matches!(
        beyond,
        Err(GroundingError::DepthExceeded { .. })
    ));
}

#[test]
fn test_invalid_program_is_rejected_before_grounding() {
    let mut program = Program::new();
    program.probabilistic_fact(1.5, prop("a")).query(prop("a"));
    assert!(matches!(
        ground_program(&program, &GroundingConfig::default()),
        Err(GroundingError::InvalidProgram(ProgramError::InvalidWeight { .. }))
    ));

    let program = edge_program();
    let evidence = atom("path", vec![int(1), var("Y")]);
    assert!(matches!(
        ground_queries(&program, &[], &[(evidence, true)], &GroundingConfig::default()),
        Err(GroundingError::InvalidProgram(ProgramError::NonGroundEvidence { .. }))
    ));
}

#[test]
fn test_grounding_is_deterministic() {
    let program = edge_program();
    let queries = [
        atom("path", vec![int(1), int(6)]),
        atom("path", vec![int(1), int(3)]),
    ];
    let evidence = [(atom("path", vec![int(1), int(5)]), false)];
    let config = GroundingConfig::default();

    let first = ground_queries(&program, &queries, &evidence, &config).unwrap();
    let second = ground_queries(&program, &queries, &evidence, &config).unwrap();
    assert_eq!(first.to_dump(), second.to_dump());
}
