//! Textual dump of a formula and its parser
//!
//! ```text
//! 1: atom 0.6 edge(1,2)
//! 2: atom 0.3 group=1 colour(red)
//! 3: and 1 -2
//! 4: or 3 1
//! query path(1,3) 4
//! evidence- path(1,5) -4
//! ```
//!
//! Probabilities use the shortest round-trip float formatting, so a parsed dump
//! evaluates to bit-identical results. Blank lines and lines starting with `%` are
//! ignored by the parser.

use crate::{GroupId, Label, LogicFormula, Node, NodeRef};
use chumsky::prelude::*;
use internment::Intern;
use probalog_ast::{Atom, Term, Value};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Slack allowed when summing the probabilities of a group
const MASS_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DumpError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("line {line}: reference to undefined node {node}")]
    DanglingReference { line: usize, node: usize },
    #[error("line {line}: node {node} is defined twice")]
    DuplicateNode { line: usize, node: usize },
    #[error("line {line}: probability {value} is not in [0, 1]")]
    InvalidProbability { line: usize, value: f64 },
    #[error("line {line}: group {group} has total probability {total}, more than 1")]
    GroupMass { line: usize, group: usize, total: f64 },
}

pub(crate) fn write_dump(formula: &LogicFormula, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (id, node) in formula.nodes() {
        match node {
            Node::Atom(atom) => {
                write!(f, "{}: atom {:?}", id, atom.probability)?;
                if let Some(group) = atom.group {
                    write!(f, " group={}", group)?;
                }
                writeln!(f, " {}", atom.name)?;
            }
            Node::Conj(children) => write_gate(f, id, "and", children)?,
            Node::Disj(children) => write_gate(f, id, "or", children)?,
        }
    }
    for name in formula.names() {
        let keyword = match name.label {
            Label::Query => "query",
            Label::EvidencePositive => "evidence+",
            Label::EvidenceNegative => "evidence-",
        };
        writeln!(f, "{} {} {}", keyword, name.atom, name.node)?;
    }
    Ok(())
}

fn write_gate(
    f: &mut fmt::Formatter<'_>,
    id: crate::NodeId,
    keyword: &str,
    children: &[NodeRef],
) -> fmt::Result {
    write!(f, "{}: {}", id, keyword)?;
    for child in children {
        write!(f, " {}", child)?;
    }
    writeln!(f)
}

impl LogicFormula {
    pub fn to_dump(&self) -> String {
        self.to_string()
    }

    /// Rebuild a formula from its dump.
    ///
    /// Node numbers in the text are only labels: references are resolved through
    /// them, and the rebuilt formula applies the usual hash-consing and folding.
    pub fn parse_dump(text: &str) -> Result<LogicFormula, DumpError> {
        let parser = line().then_ignore(end());
        let mut formula = LogicFormula::new();
        let mut nodes: HashMap<usize, NodeRef> = HashMap::new();
        let mut groups: HashMap<usize, GroupId> = HashMap::new();
        let mut mass: HashMap<usize, f64> = HashMap::new();

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('%') {
                continue;
            }

            let parsed = parser.parse(trimmed).map_err(|errors| DumpError::Syntax {
                line: line_no,
                message: errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            })?;

            let resolve = |raw: RawRef, nodes: &HashMap<usize, NodeRef>| match raw {
                RawRef::True => Ok(NodeRef::True),
                RawRef::False => Ok(NodeRef::False),
                RawRef::Node { negated, id } => nodes
                    .get(&id)
                    .map(|r| if negated { r.negate() } else { *r })
                    .ok_or(DumpError::DanglingReference {
                        line: line_no,
                        node: id,
                    }),
            };

            match parsed {
                Line::Atom {
                    id,
                    probability,
                    group,
                    name,
                } => {
                    if nodes.contains_key(&id) {
                        return Err(DumpError::DuplicateNode {
                            line: line_no,
                            node: id,
                        });
                    }
                    if !(0.0..=1.0).contains(&probability) {
                        return Err(DumpError::InvalidProbability {
                            line: line_no,
                            value: probability,
                        });
                    }
                    if let Some(g) = group {
                        let total = mass.entry(g).or_insert(0.0);
                        *total += probability;
                        if *total > 1.0 + MASS_TOLERANCE {
                            return Err(DumpError::GroupMass {
                                line: line_no,
                                group: g,
                                total: *total,
                            });
                        }
                    }
                    let group =
                        group.map(|g| *groups.entry(g).or_insert_with(|| formula.new_group()));
                    let node = formula.add_atom(name, probability, group);
                    nodes.insert(id, node);
                }
                Line::Gate { id, kind, children } => {
                    if nodes.contains_key(&id) {
                        return Err(DumpError::DuplicateNode {
                            line: line_no,
                            node: id,
                        });
                    }
                    let children = children
                        .into_iter()
                        .map(|c| resolve(c, &nodes))
                        .collect::<Result<Vec<_>, _>>()?;
                    let node = match kind {
                        GateKeyword::And => formula.add_and(children),
                        GateKeyword::Or => formula.add_or(children),
                    };
                    nodes.insert(id, node);
                }
                Line::Name { label, atom, node } => {
                    let node = resolve(node, &nodes)?;
                    formula.add_name(atom, node, label);
                }
            }
        }

        Ok(formula)
    }
}

/// Parse a single ground atom written the way the dump writes it
pub fn parse_atom(text: &str) -> Result<Atom, DumpError> {
    atom()
        .padded()
        .then_ignore(end())
        .parse(text)
        .map_err(|errors| DumpError::Syntax {
            line: 1,
            message: errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RawRef {
    True,
    False,
    Node { negated: bool, id: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GateKeyword {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
enum NodeBody {
    Atom(f64, Option<usize>, Atom),
    Gate(GateKeyword, Vec<RawRef>),
}

#[derive(Debug, Clone, PartialEq)]
enum Line {
    Atom {
        id: usize,
        probability: f64,
        group: Option<usize>,
        name: Atom,
    },
    Gate {
        id: usize,
        kind: GateKeyword,
        children: Vec<RawRef>,
    },
    Name {
        label: Label,
        atom: Atom,
        node: RawRef,
    },
}

type ParseError = Simple<char>;

fn gap() -> impl Parser<char, (), Error = ParseError> + Clone {
    filter(|c: &char| c.is_whitespace())
        .repeated()
        .at_least(1)
        .ignored()
}

fn unsigned() -> impl Parser<char, usize, Error = ParseError> + Clone {
    text::int(10)
        .try_map(|s: String, span| {
            s.parse::<usize>()
                .map_err(|_| ParseError::custom(span, "invalid node number"))
        })
        .labelled("unsigned integer")
}

/// Integer or float; a fraction or exponent makes it a float
fn number() -> impl Parser<char, Value, Error = ParseError> + Clone {
    let sign = just('-').or_not();
    let fraction = just('.').ignore_then(text::digits(10));
    let exponent = one_of("eE")
        .ignore_then(one_of("+-").or_not())
        .then(text::digits(10));

    sign.then(text::int(10))
        .then(fraction.or_not())
        .then(exponent.or_not())
        .try_map(|(((sign, whole), fraction), exponent), span| {
            let mut text = String::new();
            if sign.is_some() {
                text.push('-');
            }
            text.push_str(&whole);

            if fraction.is_none() && exponent.is_none() {
                return text
                    .parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|_| ParseError::custom(span, "invalid integer"));
            }
            if let Some(fraction) = fraction {
                text.push('.');
                text.push_str(&fraction);
            }
            if let Some((exp_sign, digits)) = exponent {
                text.push('e');
                if let Some(exp_sign) = exp_sign {
                    text.push(exp_sign);
                }
                text.push_str(&digits);
            }
            text.parse::<f64>()
                .map(Value::Float)
                .map_err(|_| ParseError::custom(span, "invalid float"))
        })
        .labelled("number")
}

fn quoted(delimiter: char) -> impl Parser<char, String, Error = ParseError> + Clone {
    let escape = just('\\').ignore_then(choice((
        just(delimiter),
        just('\\'),
        just('n').to('\n'),
        just('t').to('\t'),
    )));
    let plain = filter(move |c: &char| *c != delimiter && *c != '\\' && *c != '\n');

    just(delimiter)
        .ignore_then(choice((escape, plain)).repeated())
        .then_ignore(just(delimiter))
        .collect::<String>()
}

/// A bare lowercase identifier or a single-quoted name
fn symbol() -> impl Parser<char, String, Error = ParseError> + Clone {
    let bare = text::ident().try_map(|s: String, span| {
        if s.starts_with(|c: char| c.is_ascii_lowercase()) {
            Ok(s)
        } else {
            Err(ParseError::custom(span, "expected lowercase identifier"))
        }
    });
    choice((bare, quoted('\''))).labelled("symbol")
}

fn term() -> impl Parser<char, Term, Error = ParseError> + Clone {
    recursive(|term| {
        let args = term
            .padded()
            .separated_by(just(','))
            .at_least(1)
            .delimited_by(just('('), just(')'));

        let compound_or_constant = symbol().then(args.or_not()).map(|(name, args)| match args {
            Some(args) => Term::Compound(Intern::new(name), args),
            None => Term::Constant(Value::Atom(Intern::new(name))),
        });

        choice((
            number().map(Term::Constant),
            quoted('"').map(|s| Term::Constant(Value::String(Intern::new(s)))),
            compound_or_constant,
        ))
    })
}

/// A ground atom: a symbol with optional arguments
fn atom() -> impl Parser<char, Atom, Error = ParseError> + Clone {
    term()
        .try_map(|term, span| match term {
            Term::Compound(predicate, terms) => Ok(Atom { predicate, terms }),
            Term::Constant(Value::Atom(predicate)) => Ok(Atom {
                predicate,
                terms: Vec::new(),
            }),
            _ => Err(ParseError::custom(span, "expected an atom")),
        })
        .labelled("atom")
}

fn node_ref() -> impl Parser<char, RawRef, Error = ParseError> + Clone {
    choice((
        just("true").to(RawRef::True),
        just("false").to(RawRef::False),
        just('-')
            .or_not()
            .then(unsigned())
            .map(|(sign, id)| RawRef::Node {
                negated: sign.is_some(),
                id,
            }),
    ))
    .labelled("node reference")
}

fn probability() -> impl Parser<char, f64, Error = ParseError> + Clone {
    number()
        .try_map(|value, span| match value {
            Value::Float(p) => Ok(p),
            Value::Integer(i) => Ok(i as f64),
            _ => Err(ParseError::custom(span, "expected a probability")),
        })
        .labelled("probability")
}

fn line() -> impl Parser<char, Line, Error = ParseError> + Clone {
    let atom_line = just("atom")
        .ignore_then(gap())
        .ignore_then(probability())
        .then(
            gap()
                .ignore_then(just("group="))
                .ignore_then(unsigned())
                .or_not(),
        )
        .then_ignore(gap())
        .then(atom());

    let gate_keyword = choice((
        just("and").to(GateKeyword::And),
        just("or").to(GateKeyword::Or),
    ));
    let gate_line = gate_keyword.then(gap().ignore_then(node_ref()).repeated().at_least(1));

    let node_line = unsigned()
        .then_ignore(just(':'))
        .then_ignore(gap())
        .then(choice((
            atom_line.map(|((probability, group), name)| NodeBody::Atom(probability, group, name)),
            gate_line.map(|(kind, children)| NodeBody::Gate(kind, children)),
        )))
        .map(|(id, body)| match body {
            NodeBody::Atom(probability, group, name) => Line::Atom {
                id,
                probability,
                group,
                name,
            },
            NodeBody::Gate(kind, children) => Line::Gate { id, kind, children },
        });

    let label = choice((
        just("query").to(Label::Query),
        just("evidence+").to(Label::EvidencePositive),
        just("evidence-").to(Label::EvidenceNegative),
    ));
    let name_line = label
        .then_ignore(gap())
        .then(atom())
        .then_ignore(gap())
        .then(node_ref())
        .map(|((label, atom), node)| Line::Name { label, atom, node });

    choice((node_line, name_line)).then_ignore(text::whitespace())
}
