//! Semirings for weighted model counting
//!
//! The evaluator only combines values through this trait: literal weights are
//! multiplied under AND nodes and summed under OR nodes.

use std::fmt;

pub trait Semiring {
    type Value: Clone + fmt::Debug;

    fn one(&self) -> Self::Value;
    fn zero(&self) -> Self::Value;
    fn plus(&self, a: &Self::Value, b: &Self::Value) -> Self::Value;
    fn times(&self, a: &Self::Value, b: &Self::Value) -> Self::Value;
    /// Value of a probability weight
    fn weight(&self, probability: f64) -> Self::Value;
    /// `1 - a`
    fn complement(&self, a: &Self::Value) -> Self::Value;
    /// `a / z`, the reported result of a query
    fn normalize(&self, a: &Self::Value, z: &Self::Value) -> Self::Value;
    fn is_zero(&self, a: &Self::Value) -> bool;
}

/// Ordinary probabilities
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbabilitySemiring;

impl Semiring for ProbabilitySemiring {
    type Value = f64;

    fn one(&self) -> f64 {
        1.0
    }

    fn zero(&self) -> f64 {
        0.0
    }

    fn plus(&self, a: &f64, b: &f64) -> f64 {
        a + b
    }

    fn times(&self, a: &f64, b: &f64) -> f64 {
        a * b
    }

    fn weight(&self, probability: f64) -> f64 {
        probability
    }

    fn complement(&self, a: &f64) -> f64 {
        1.0 - a
    }

    /// Rounding can push a ratio slightly outside `[0, 1]`; reported values are clamped
    fn normalize(&self, a: &f64, z: &f64) -> f64 {
        (a / z).clamp(0.0, 1.0)
    }

    fn is_zero(&self, a: &f64) -> bool {
        *a <= 0.0
    }
}

/// Counting polynomial as text, e.g. `0.3*(1-0.6)`
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolicSemiring;

fn group(expr: &str) -> String {
    if expr.contains(['+', '*', '/']) {
        format!("({})", expr)
    } else {
        expr.to_string()
    }
}

impl Semiring for SymbolicSemiring {
    type Value = String;

    fn one(&self) -> String {
        "1".to_string()
    }

    fn zero(&self) -> String {
        "0".to_string()
    }

    fn plus(&self, a: &String, b: &String) -> String {
        match (a.as_str(), b.as_str()) {
            ("0", _) => b.clone(),
            (_, "0") => a.clone(),
            _ => format!("{}+{}", a, b),
        }
    }

    fn times(&self, a: &String, b: &String) -> String {
        match (a.as_str(), b.as_str()) {
            ("0", _) | (_, "0") => self.zero(),
            ("1", _) => b.clone(),
            (_, "1") => a.clone(),
            _ => format!("{}*{}", group(a), group(b)),
        }
    }

    fn weight(&self, probability: f64) -> String {
        format!("{:?}", probability)
    }

    fn complement(&self, a: &String) -> String {
        match a.as_str() {
            "0" => self.one(),
            "1" => self.zero(),
            _ => format!("(1-{})", a),
        }
    }

    fn normalize(&self, a: &String, z: &String) -> String {
        match (a.as_str(), z.as_str()) {
            ("0", _) => self.zero(),
            (_, "1") => a.clone(),
            _ => format!("{}/{}", group(a), group(z)),
        }
    }

    fn is_zero(&self, a: &String) -> bool {
        a == "0"
    }
}
