use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for version parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// A component was empty or not a non-negative integer
    #[error("Invalid version format: '{0}'")]
    InvalidVersion(String),
}

/// Comparison operator at the head of a version requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `*` or no requirement at all
    Any,
    /// `~>` keeps every leading component fixed, the last one may grow
    Pessimistic,
    GreaterOrEqual,
    Greater,
    LessOrEqual,
    Less,
    /// `=` or `==`, textual equality after trimming
    Equal,
    /// Bare string, textual equality after trimming
    Exact,
}

impl Operator {
    /// Returns the textual form of the operator (empty for `Exact`)
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Any => "*",
            Operator::Pessimistic => "~>",
            Operator::GreaterOrEqual => ">=",
            Operator::Greater => ">",
            Operator::LessOrEqual => "<=",
            Operator::Less => "<",
            Operator::Equal => "=",
            Operator::Exact => "",
        }
    }
}

/// Operators recognised at the start of a requirement, longest token first.
const OPERATOR_TOKENS: &[(&str, Operator)] = &[
    ("~>", Operator::Pessimistic),
    (">=", Operator::GreaterOrEqual),
    ("<=", Operator::LessOrEqual),
    ("==", Operator::Equal),
    (">", Operator::Greater),
    ("<", Operator::Less),
    ("=", Operator::Equal),
];

/// Dotted numeric version arithmetic.
///
/// Versions are sequences of non-negative integers separated by dots
/// (`"1"`, `"1.2"`, `"1.2.3.4"`). Shorter versions are padded with zeros when
/// compared, so `"1.1"` and `"1.1.0"` are equal.
pub struct VersionComparator;

impl VersionComparator {
    /// Parses a version into its numeric components
    pub fn parse(version: &str) -> Result<Vec<u64>, VersionError> {
        version
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(VersionError::InvalidVersion(version.to_string()));
                }
                part.parse::<u64>()
                    .map_err(|_| VersionError::InvalidVersion(version.to_string()))
            })
            .collect()
    }

    /// Compares two versions component-wise after zero padding
    pub fn compare(a: &str, b: &str) -> Result<Ordering, VersionError> {
        let parts_a = Self::parse(a)?;
        let parts_b = Self::parse(b)?;
        Ok(Self::compare_parts(&parts_a, &parts_b))
    }

    fn compare_parts(a: &[u64], b: &[u64]) -> Ordering {
        let len = a.len().max(b.len());
        for i in 0..len {
            let left = a.get(i).copied().unwrap_or(0);
            let right = b.get(i).copied().unwrap_or(0);
            match left.cmp(&right) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }

    /// Splits a requirement into operator and version, trimming whitespace.
    ///
    /// A requirement without a recognised operator is an exact match on the
    /// whole trimmed string.
    pub fn parse_requirement(requirement: &str) -> (Operator, String) {
        let trimmed = requirement.trim();
        if trimmed == "*" {
            return (Operator::Any, String::new());
        }

        for (token, operator) in OPERATOR_TOKENS {
            if let Some(rest) = trimmed.strip_prefix(token) {
                let rest = rest.trim();
                if !rest.is_empty() {
                    return (*operator, rest.to_string());
                }
                break;
            }
        }

        (Operator::Exact, trimmed.to_string())
    }

    /// Checks whether `version` satisfies `requirement`.
    ///
    /// `None` and `"*"` are satisfied by any version.
    pub fn satisfies(version: &str, requirement: Option<&str>) -> Result<bool, VersionError> {
        let Some(requirement) = requirement else {
            return Ok(true);
        };
        let (operator, required) = Self::parse_requirement(requirement);
        Self::evaluate(version, operator, &required)
    }

    fn evaluate(version: &str, operator: Operator, required: &str) -> Result<bool, VersionError> {
        match operator {
            Operator::Any => Ok(true),
            Operator::Pessimistic => Self::pessimistic(version, required),
            Operator::GreaterOrEqual => Ok(Self::compare(version, required)? != Ordering::Less),
            Operator::Greater => Ok(Self::compare(version, required)? == Ordering::Greater),
            Operator::LessOrEqual => Ok(Self::compare(version, required)? != Ordering::Greater),
            Operator::Less => Ok(Self::compare(version, required)? == Ordering::Less),
            Operator::Equal | Operator::Exact => Ok(version.trim() == required),
        }
    }

    /// `~> X.Y`: all requirement components but the last must match exactly,
    /// the version component at the last position must be at least `Y`.
    fn pessimistic(version: &str, required: &str) -> Result<bool, VersionError> {
        let required_parts = Self::parse(required)?;
        let version_parts = Self::parse(version)?;

        if version_parts.len() < required_parts.len() {
            return Ok(false);
        }

        let last = required_parts.len() - 1;
        if required_parts[..last] != version_parts[..last] {
            return Ok(false);
        }

        Ok(version_parts[last] >= required_parts[last])
    }
}

/// A parsed version requirement such as `"~> 1.2"` or `">= 2.0"`.
///
/// Keeps the original text for display and error messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct VersionConstraint {
    raw: String,
    operator: Operator,
    version: String,
}

impl VersionConstraint {
    /// Creates a constraint from a requirement string
    pub fn new(requirement: &str) -> Self {
        let (operator, version) = VersionComparator::parse_requirement(requirement);
        Self {
            raw: requirement.trim().to_string(),
            operator,
            version,
        }
    }

    /// Constraint that accepts every version
    pub fn any() -> Self {
        Self::new("*")
    }

    /// Checks if a version satisfies this constraint
    pub fn matches(&self, version: &str) -> Result<bool, VersionError> {
        VersionComparator::evaluate(version, self.operator, &self.version)
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The version part of the requirement, without the operator
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the original constraint string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the constraint accepts every version
    pub fn is_any(&self) -> bool {
        self.operator == Operator::Any
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for VersionConstraint {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(VersionConstraint::new(s))
    }
}

impl From<&str> for VersionConstraint {
    fn from(s: &str) -> Self {
        VersionConstraint::new(s)
    }
}

impl From<String> for VersionConstraint {
    fn from(s: String) -> Self {
        VersionConstraint::new(&s)
    }
}

impl From<VersionConstraint> for String {
    fn from(constraint: VersionConstraint) -> Self {
        constraint.raw
    }
}
