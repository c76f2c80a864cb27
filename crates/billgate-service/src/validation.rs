//! Declarative request validation
//!
//! A [`ValidationSpec`] is plain data: a list of field rules, each holding the
//! constraints that apply to one field. Specs are evaluated against the JSON
//! form of a bound value so the same engine serves every DTO.
//!
//! Field paths use dots for nesting and `*` to address every element of an
//! array (`rates.*.percent_fee`). Violations are reported with concrete
//! paths (`rates[2].percent_fee`).

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

/// String formats understood by [`Constraint::Format`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Uuid,
    Email,
    Url,
    /// 24 hexadecimal characters
    ObjectId,
    /// ISO 3166-1 alpha-2 country code
    Alpha2,
}

impl Format {
    fn name(self) -> &'static str {
        match self {
            Format::Uuid => "uuid",
            Format::Email => "email",
            Format::Url => "url",
            Format::ObjectId => "objectid",
            Format::Alpha2 => "alpha2",
        }
    }

    fn matches(self, raw: &str) -> bool {
        match self {
            Format::Uuid => uuid::Uuid::parse_str(raw).is_ok(),
            Format::Email => email_regex().is_match(raw),
            Format::Url => url::Url::parse(raw)
                .map(|u| !u.cannot_be_a_base() && u.has_host())
                .unwrap_or(false),
            Format::ObjectId => raw.len() == 24 && raw.bytes().all(|b| b.is_ascii_hexdigit()),
            Format::Alpha2 => raw.len() == 2 && raw.bytes().all(|b| b.is_ascii_uppercase()),
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)+$")
            .expect("email pattern is valid")
    })
}

/// A single named constraint
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Present and not the zero value (`""`, `0`, `false`, `[]`, `{}`)
    Required,
    Format(Format),
    /// Character count for strings, element count for arrays
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    OneOf(Vec<String>),
    /// Inclusive numeric bounds
    Range { min: Option<f64>, max: Option<f64> },
    /// Required when the other field is set
    RequiredWith(String),
    /// Must be empty when the other field is set
    ExcludedWith(String),
}

impl Constraint {
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Constraint::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn length(min: usize, max: usize) -> Self {
        Constraint::Length {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn min(min: f64) -> Self {
        Constraint::Range {
            min: Some(min),
            max: None,
        }
    }

    pub fn range(min: f64, max: f64) -> Self {
        Constraint::Range {
            min: Some(min),
            max: Some(max),
        }
    }
}

/// Constraints attached to one field path
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub field: String,
    pub constraints: Vec<Constraint>,
}

/// One failed constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub constraint: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.constraint)
    }
}

/// Every violation found in one value, in rule order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    /// Whether any violation concerns `field`
    pub fn contains_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    fn push(&mut self, field: &str, constraint: impl Into<String>) {
        self.0.push(Violation {
            field: field.to_string(),
            constraint: constraint.into(),
        });
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

/// Ordered list of field rules
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationSpec {
    rules: Vec<FieldRule>,
}

impl ValidationSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for `field`
    pub fn field(
        mut self,
        field: impl Into<String>,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> Self {
        self.rules.push(FieldRule {
            field: field.into(),
            constraints: constraints.into_iter().collect(),
        });
        self
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Evaluate every rule against `value`, collecting all violations
    pub fn check(&self, value: &Value) -> Result<(), Violations> {
        let mut violations = Violations::default();

        for rule in &self.rules {
            let parent_path = parent_of(&rule.field);
            for (name, field_value) in resolve(value, &rule.field) {
                let scope = scope_for(value, parent_path, &name);
                for constraint in &rule.constraints {
                    check_constraint(constraint, &name, field_value, scope, &mut violations);
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// Types that carry their own validation rules
pub trait Validate: Serialize {
    fn validation_spec() -> ValidationSpec;

    fn validate(&self) -> Result<(), Violations> {
        match serde_json::to_value(self) {
            Ok(value) => Self::validation_spec().check(&value),
            Err(_) => {
                let mut violations = Violations::default();
                violations.push("$", "serializable");
                Err(violations)
            }
        }
    }
}

fn check_constraint(
    constraint: &Constraint,
    name: &str,
    value: Option<&Value>,
    scope: Option<&Value>,
    violations: &mut Violations,
) {
    let present = value.map(is_set).unwrap_or(false);

    match constraint {
        Constraint::Required => {
            if !present {
                violations.push(name, "required");
            }
        }
        Constraint::RequiredWith(other) => {
            if !present && sibling_is_set(scope, other) {
                violations.push(name, format!("required_with={}", other));
            }
        }
        Constraint::ExcludedWith(other) => {
            if present && sibling_is_set(scope, other) {
                violations.push(name, format!("excluded_with={}", other));
            }
        }
        // Remaining constraints only look at values that are set.
        _ if !present => {}
        Constraint::Format(format) => {
            let ok = value
                .and_then(Value::as_str)
                .map(|raw| format.matches(raw))
                .unwrap_or(false);
            if !ok {
                violations.push(name, format.name());
            }
        }
        Constraint::Length { min, max } => {
            let len = match value {
                Some(Value::String(s)) => s.chars().count(),
                Some(Value::Array(items)) => items.len(),
                Some(Value::Object(map)) => map.len(),
                _ => 0,
            };
            if let Some(min) = min.filter(|min| len < *min) {
                violations.push(name, format!("min={}", min));
            } else if let Some(max) = max.filter(|max| len > *max) {
                violations.push(name, format!("max={}", max));
            }
        }
        Constraint::OneOf(allowed) => {
            let raw = match value {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            if !allowed.iter().any(|a| *a == raw) {
                violations.push(name, format!("oneof={}", allowed.join(" ")));
            }
        }
        Constraint::Range { min, max } => match value.and_then(Value::as_f64) {
            Some(n) => {
                if let Some(min) = min.filter(|min| n < *min) {
                    violations.push(name, format!("gte={}", min));
                } else if let Some(max) = max.filter(|max| n > *max) {
                    violations.push(name, format!("lte={}", max));
                }
            }
            None => violations.push(name, "numeric"),
        },
    }
}

/// Whether a value differs from its zero value
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn sibling_is_set(scope: Option<&Value>, other: &str) -> bool {
    scope
        .and_then(|s| s.get(other))
        .map(is_set)
        .unwrap_or(false)
}

fn parent_of(path: &str) -> Option<&str> {
    path.rsplit_once('.').map(|(parent, _)| parent)
}

/// Object holding the field `name`, used for cross-field lookups
fn scope_for<'a>(root: &'a Value, parent_path: Option<&str>, name: &str) -> Option<&'a Value> {
    let Some(parent_path) = parent_path else {
        return Some(root);
    };

    let concrete_parent = name.rsplit_once('.').map(|(parent, _)| parent)?;
    resolve(root, parent_path)
        .into_iter()
        .find(|(resolved, _)| resolved == concrete_parent)
        .and_then(|(_, v)| v)
}

/// Expand a rule path into concrete `(name, value)` pairs
fn resolve<'a>(root: &'a Value, path: &str) -> Vec<(String, Option<&'a Value>)> {
    let mut current: Vec<(String, Option<&'a Value>)> = vec![(String::new(), Some(root))];

    for segment in path.split('.') {
        let mut next = Vec::new();
        for (name, value) in current {
            if segment == "*" {
                if let Some(Value::Array(items)) = value {
                    for (i, item) in items.iter().enumerate() {
                        next.push((format!("{}[{}]", name, i), Some(item)));
                    }
                }
                continue;
            }

            let child = value.and_then(|v| v.get(segment));
            let child_name = if name.is_empty() {
                segment.to_string()
            } else {
                format!("{}.{}", name, segment)
            };
            next.push((child_name, child));
        }
        current = next;
    }

    current
}
