//! Typed step references
//!
//! Cross-step data wiring uses a single textual convention: a step input
//! whose string value has the exact form `${<stepId>.<dot.separated.path>}`
//! is replaced by the value at that path within the referenced step's
//! result. Any other string is a literal. References are parsed once at
//! workflow construction time, not re-parsed on every dispatch.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::step::StepId;

/// Anchored pattern for `${stepId.path.to.field}`. The whole string must
/// match; partial matches are literals.
static REFERENCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$\{([a-zA-Z0-9][a-zA-Z0-9-]*)\.([a-zA-Z0-9_][a-zA-Z0-9_.-]*)\}$").unwrap()
});

/// A parsed reference to another step's result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReference {
    /// The referenced step
    step: StepId,
    /// Dot-separated path segments within the step's result
    path: Vec<String>,
    /// The original textual form, kept so a permissive resolver can leave
    /// the literal in place
    raw: String,
}

impl StepReference {
    /// Parse a string as a reference. Returns `None` for literals.
    pub fn parse(input: &str) -> Option<Self> {
        let caps = REFERENCE_PATTERN.captures(input)?;
        let step = StepId::new(caps.get(1)?.as_str()).ok()?;
        let path = caps
            .get(2)?
            .as_str()
            .split('.')
            .map(str::to_string)
            .collect();

        Some(Self {
            step,
            path,
            raw: input.to_string(),
        })
    }

    pub fn step(&self) -> &StepId {
        &self.step
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Resolve this reference's path within the referenced step's result
    pub fn lookup<'a>(&self, result: &'a Value) -> Option<&'a Value> {
        lookup_path(result, &self.path)
    }
}

/// Collect every reference appearing in an input value, recursing into
/// arrays and objects.
pub fn extract_references(value: &Value) -> Vec<StepReference> {
    let mut refs = Vec::new();
    collect(value, &mut refs);
    refs
}

fn collect(value: &Value, out: &mut Vec<StepReference>) {
    match value {
        Value::String(s) => {
            if let Some(reference) = StepReference::parse(s) {
                out.push(reference);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect(item, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect(item, out);
            }
        }
        _ => {}
    }
}

/// Walk a JSON value using path segments; object keys and array indices
/// are both supported.
pub fn lookup_path<'a>(value: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = value;

    for segment in path {
        match current {
            Value::Object(map) => {
                current = map.get(segment)?;
            }
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                current = items.get(index)?;
            }
            _ => return None,
        }
    }

    Some(current)
}
