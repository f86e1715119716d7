use probalog::{
    parse_atom, Atom, Cnf, Evaluator, InferenceConfig, InferenceError, LogicFormula,
    ProbabilitySemiring,
};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

fn load(path: &Path) -> Result<LogicFormula, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("failed to read '{}': {}", path.display(), e))?;
    LogicFormula::parse_dump(&content)
        .map_err(|e| format!("failed to parse '{}': {}", path.display(), e))
}

/// `ATOM=true` or `ATOM=false`
fn parse_evidence(text: &str) -> Result<(Atom, bool), String> {
    let (atom, value) = text
        .rsplit_once('=')
        .ok_or_else(|| format!("evidence '{}' must have the form ATOM=true|false", text))?;
    let value = match value.trim() {
        "true" => true,
        "false" => false,
        other => return Err(format!("evidence value '{}' must be true or false", other)),
    };
    let atom = parse_atom(atom).map_err(|e| format!("invalid evidence atom '{}': {}", atom, e))?;
    Ok((atom, value))
}

fn failed(e: impl Into<InferenceError>) -> String {
    e.into().to_string()
}

pub fn evaluate(
    path: &Path,
    evidence: &[String],
    max_nodes: Option<usize>,
    timeout_ms: Option<u64>,
) -> Result<String, String> {
    let formula = load(path)?;
    let evidence = evidence
        .iter()
        .map(|text| parse_evidence(text))
        .collect::<Result<Vec<_>, _>>()?;

    let mut config = InferenceConfig::default();
    if let Some(max_nodes) = max_nodes {
        config = config.with_max_nodes(max_nodes);
    }
    if let Some(ms) = timeout_ms {
        config = config.with_timeout(Duration::from_millis(ms));
    }

    debug!(file = %path.display(), evidence = evidence.len(), "evaluating");
    let compiled = probalog::compile(&formula, &config).map_err(failed)?;
    let mut evaluator = Evaluator::new(&compiled, ProbabilitySemiring).map_err(failed)?;
    for (atom, value) in &evidence {
        evaluator.set_evidence(atom, *value).map_err(failed)?;
    }
    let results = evaluator.query_probabilities().map_err(failed)?;
    Ok(results.to_string())
}

pub fn cnf(path: &Path) -> Result<String, String> {
    let formula = load(path)?;
    Ok(Cnf::encode(&formula).to_dimacs())
}

pub fn nnf(path: &Path) -> Result<String, String> {
    let formula = load(path)?;
    let compiled = probalog::compile(&formula, &InferenceConfig::default()).map_err(failed)?;
    Ok(compiled.circuit().to_nnf())
}

pub fn stats(path: &Path) -> Result<String, String> {
    let formula = load(path)?;
    let stats = formula.stats();
    let compiled = probalog::compile(&formula, &InferenceConfig::default()).map_err(failed)?;
    let cnf = compiled.cnf();
    let circuit = compiled.circuit();

    let mut out = String::new();
    let rows = [
        ("atoms", stats.atoms),
        ("conjunctions", stats.conjunctions),
        ("disjunctions", stats.disjunctions),
        ("groups", stats.groups),
        ("queries", stats.queries),
        ("evidence", stats.evidence),
        ("cnf variables", cnf.num_vars()),
        ("cnf clauses", cnf.clauses().len()),
        ("circuit nodes", circuit.len()),
        ("circuit edges", circuit.edge_count()),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "{}: {}", label, value);
    }
    Ok(out)
}
