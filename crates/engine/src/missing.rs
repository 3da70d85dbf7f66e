//! User-missing value specifications.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cell::CellValue;
use crate::variable::{ScalarValue, VariableType};

/// Maximum number of discrete missing values.
pub const MAX_DISCRETE_MISSING: usize = 3;

/// How a variable declares user-missing values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissingValuesSpec {
    #[default]
    None,
    /// One to three explicit values.
    Discrete { values: Vec<ScalarValue> },
    /// An inclusive numeric range plus an optional extra value outside it.
    Range {
        low: f64,
        high: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        discrete: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MissingSpecError {
    /// Discrete list is empty or longer than three values.
    DiscreteCount(usize),
    /// Range form on a string variable.
    RangeOnString,
    /// `low` is greater than `high`.
    InvertedRange { low: f64, high: f64 },
    /// The extra discrete value falls inside the range.
    DiscreteInsideRange(f64),
    /// A numeric variable was given a string missing value.
    TextOnNumeric(String),
}

impl fmt::Display for MissingSpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DiscreteCount(n) => {
                write!(f, "discrete missing values must have 1 to {MAX_DISCRETE_MISSING} entries, got {n}")
            }
            Self::RangeOnString => write!(f, "range of missing values is not allowed for string variables"),
            Self::InvertedRange { low, high } => write!(f, "missing range low {low} exceeds high {high}"),
            Self::DiscreteInsideRange(v) => {
                write!(f, "discrete missing value {v} must lie outside the range")
            }
            Self::TextOnNumeric(v) => write!(f, "missing value '{v}' is not numeric"),
        }
    }
}

impl std::error::Error for MissingSpecError {}

impl MissingValuesSpec {
    pub fn is_none(&self) -> bool {
        matches!(self, MissingValuesSpec::None)
    }

    /// Check the missing-value declaration against the type of the variable it belongs to.
    pub fn validate(&self, var_type: VariableType) -> Result<(), MissingSpecError> {
        match self {
            MissingValuesSpec::None => Ok(()),
            MissingValuesSpec::Discrete { values } => {
                if values.is_empty() || values.len() > MAX_DISCRETE_MISSING {
                    return Err(MissingSpecError::DiscreteCount(values.len()));
                }
                if var_type != VariableType::String {
                    if let Some(ScalarValue::Text(s)) =
                        values.iter().find(|v| matches!(v, ScalarValue::Text(_)))
                    {
                        return Err(MissingSpecError::TextOnNumeric(s.clone()));
                    }
                }
                Ok(())
            }
            MissingValuesSpec::Range { low, high, discrete } => {
                if var_type == VariableType::String {
                    return Err(MissingSpecError::RangeOnString);
                }
                if low > high {
                    return Err(MissingSpecError::InvertedRange { low: *low, high: *high });
                }
                match discrete {
                    Some(d) if d >= low && d <= high => Err(MissingSpecError::DiscreteInsideRange(*d)),
                    _ => Ok(()),
                }
            }
        }
    }

    /// Whether a committed cell value is declared user-missing.
    pub fn is_missing(&self, value: &CellValue) -> bool {
        match (self, value) {
            (MissingValuesSpec::None, _) | (_, CellValue::Empty) => false,
            (MissingValuesSpec::Discrete { values }, CellValue::Number(n)) => values
                .iter()
                .any(|v| matches!(v, ScalarValue::Number(m) if m == n)),
            (MissingValuesSpec::Discrete { values }, CellValue::Text(s)) => values
                .iter()
                .any(|v| matches!(v, ScalarValue::Text(t) if t == s)),
            (MissingValuesSpec::Range { low, high, discrete }, CellValue::Number(n)) => {
                (n >= low && n <= high) || discrete.is_some_and(|d| d == *n)
            }
            (MissingValuesSpec::Range { .. }, CellValue::Text(_)) => false,
        }
    }

    /// Short text for the variable view, e.g. `9, 99` or `90 - 99, 0`.
    pub fn summary(&self) -> String {
        match self {
            MissingValuesSpec::None => "None".to_string(),
            MissingValuesSpec::Discrete { values } => values
                .iter()
                .map(ScalarValue::display)
                .collect::<Vec<_>>()
                .join(", "),
            MissingValuesSpec::Range { low, high, discrete } => {
                let range = format!(
                    "{} - {}",
                    crate::cell::format_number(*low),
                    crate::cell::format_number(*high)
                );
                match discrete {
                    Some(d) => format!("{range}, {}", crate::cell::format_number(*d)),
                    None => range,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discrete(values: Vec<ScalarValue>) -> MissingValuesSpec {
        MissingValuesSpec::Discrete { values }
    }

    #[test]
    fn test_discrete_count_bounds() {
        assert_eq!(
            discrete(vec![]).validate(VariableType::Numeric),
            Err(MissingSpecError::DiscreteCount(0))
        );
        let four = (0..4).map(|i| ScalarValue::Number(i as f64)).collect();
        assert_eq!(
            discrete(four).validate(VariableType::Numeric),
            Err(MissingSpecError::DiscreteCount(4))
        );
        let three = (0..3).map(|i| ScalarValue::Number(i as f64)).collect();
        assert!(discrete(three).validate(VariableType::Numeric).is_ok());
    }

    #[test]
    fn test_range_rejected_for_string() {
        let spec = MissingValuesSpec::Range { low: 1.0, high: 5.0, discrete: None };
        assert_eq!(spec.validate(VariableType::String), Err(MissingSpecError::RangeOnString));
        assert!(spec.validate(VariableType::Numeric).is_ok());
    }

    #[test]
    fn test_range_discrete_must_be_outside() {
        let inside = MissingValuesSpec::Range { low: 1.0, high: 5.0, discrete: Some(5.0) };
        assert_eq!(
            inside.validate(VariableType::Numeric),
            Err(MissingSpecError::DiscreteInsideRange(5.0))
        );
        let outside = MissingValuesSpec::Range { low: 1.0, high: 5.0, discrete: Some(9.0) };
        assert!(outside.validate(VariableType::Numeric).is_ok());
    }

    #[test]
    fn test_text_missing_on_numeric_rejected() {
        let spec = discrete(vec![ScalarValue::Text("NA".into())]);
        assert!(matches!(spec.validate(VariableType::Numeric), Err(MissingSpecError::TextOnNumeric(_))));
        assert!(spec.validate(VariableType::String).is_ok());
    }

    #[test]
    fn test_is_missing() {
        let spec = MissingValuesSpec::Range { low: 90.0, high: 99.0, discrete: Some(-1.0) };
        assert!(spec.is_missing(&CellValue::Number(95.0)));
        assert!(spec.is_missing(&CellValue::Number(-1.0)));
        assert!(!spec.is_missing(&CellValue::Number(10.0)));
        assert!(!spec.is_missing(&CellValue::Empty));

        let spec = discrete(vec![ScalarValue::blank_sentinel()]);
        assert!(spec.is_missing(&CellValue::Text(" ".into())));
        assert!(!spec.is_missing(&CellValue::Text("x".into())));
    }

    #[test]
    fn test_summary() {
        let spec = MissingValuesSpec::Range { low: 90.0, high: 99.0, discrete: Some(0.0) };
        assert_eq!(spec.summary(), "90 - 99, 0");
        assert_eq!(MissingValuesSpec::None.summary(), "None");
    }
}
