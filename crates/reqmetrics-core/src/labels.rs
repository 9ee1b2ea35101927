//! Label schema and name validation.
//!
//! A vector fixes its ordered label names at creation; every observation then
//! supplies values positionally. Names follow the exposition grammar
//! (`[a-zA-Z_][a-zA-Z0-9_]*`, `__` prefix reserved).

use crate::error::{MetricsError, Result};

/// A single exported `name="value"` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelPair {
    pub name: String,
    pub value: String,
}

impl LabelPair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ordered, immutable label names of a vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSchema {
    names: Vec<String>,
}

impl LabelSchema {
    /// Validate and freeze a list of label names.
    /// `reserved` lists names the metric kind claims for itself (e.g. `le`).
    pub fn new(names: &[String], reserved: &[&str]) -> Result<Self> {
        let mut seen: Vec<&str> = Vec::with_capacity(names.len());
        for n in names {
            validate_label_name(n)?;
            if reserved.contains(&n.as_str()) {
                return Err(MetricsError::InvalidName(format!("label name {n} is reserved")));
            }
            if seen.contains(&n.as_str()) {
                return Err(MetricsError::InvalidName(format!("duplicate label name {n}")));
            }
            seen.push(n);
        }
        Ok(Self {
            names: names.to_vec(),
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Check arity and build the child key.
    pub fn key(&self, values: &[&str]) -> Result<Vec<String>> {
        if values.len() != self.names.len() {
            return Err(MetricsError::InconsistentCardinality {
                expected: self.names.len(),
                got: values.len(),
            });
        }
        Ok(values.iter().map(|v| v.to_string()).collect())
    }

    /// Zip names with a stored key.
    pub fn pairs(&self, key: &[String]) -> Vec<LabelPair> {
        self.names
            .iter()
            .zip(key)
            .map(|(n, v)| LabelPair::new(n.clone(), v.clone()))
            .collect()
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn validate_label_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let ok = match chars.next() {
        Some(c) => is_name_start(c) && chars.all(is_name_char),
        None => false,
    };
    if !ok || name.starts_with("__") {
        return Err(MetricsError::InvalidName(format!("invalid label name: {name:?}")));
    }
    Ok(())
}

/// Metric names additionally allow `:`.
pub fn validate_metric_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let ok = match chars.next() {
        Some(c) => is_name_start(c) || c == ':',
        None => false,
    } && chars.all(|c| is_name_char(c) || c == ':');
    if !ok {
        return Err(MetricsError::InvalidName(format!("invalid metric name: {name:?}")));
    }
    Ok(())
}

/// Join `namespace`, `subsystem` and `name` with `_`, skipping empty parts.
pub fn fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn fq_name_skips_empty_parts() {
        assert_eq!(fq_name("gfast", "request", "server_handle_total"), "gfast_request_server_handle_total");
        assert_eq!(fq_name("", "request", "x"), "request_x");
        assert_eq!(fq_name("gfast", "", "x"), "gfast_x");
    }

    #[test]
    fn schema_rejects_bad_names() {
        let names = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert!(LabelSchema::new(&names(&["method", "type"]), &[]).is_ok());
        assert!(LabelSchema::new(&names(&["1abc"]), &[]).is_err());
        assert!(LabelSchema::new(&names(&["__internal"]), &[]).is_err());
        assert!(LabelSchema::new(&names(&["a", "a"]), &[]).is_err());
        assert!(LabelSchema::new(&names(&["le"]), &["le"]).is_err());
    }

    #[test]
    fn key_checks_arity() {
        let schema = LabelSchema::new(&["a".to_string(), "b".to_string()], &[]).unwrap();
        assert_eq!(schema.key(&["x", "y"]).unwrap(), vec!["x", "y"]);
        let err = schema.key(&["x"]).unwrap_err();
        assert!(matches!(err, MetricsError::InconsistentCardinality { expected: 2, got: 1 }));
    }
}
