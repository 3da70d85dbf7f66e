use serde::{Deserialize, Serialize};

/// A committed cell in the data store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CellValue {
    /// Committed but blank.
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn raw_display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
        }
    }
}

/// A cell as the grid renders it.
///
/// `Spare` marks padding outside the committed extent. It is never the same
/// thing as `Value(CellValue::Empty)`, which is a committed blank.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum GridCell {
    #[default]
    Spare,
    Value(CellValue),
}

impl GridCell {
    pub fn is_spare(&self) -> bool {
        matches!(self, GridCell::Spare)
    }

    pub fn value(&self) -> Option<&CellValue> {
        match self {
            GridCell::Spare => None,
            GridCell::Value(v) => Some(v),
        }
    }
}

/// A raw value proposed by the grid widget for a cell.
///
/// The widget sends `null`, numbers, or strings; `null` is carried as `None`
/// wherever an `Option<EditValue>` is used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EditValue {
    Number(f64),
    Text(String),
}

impl EditValue {
    /// Text form used for type inference and parsing.
    pub fn as_text(&self) -> String {
        match self {
            EditValue::Number(n) => format_number(*n),
            EditValue::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for EditValue {
    fn from(s: &str) -> Self {
        EditValue::Text(s.to_string())
    }
}

impl From<f64> for EditValue {
    fn from(n: f64) -> Self {
        EditValue::Number(n)
    }
}

/// True for `null` and the empty string.
pub fn is_empty_like(value: &Option<EditValue>) -> bool {
    match value {
        None => true,
        Some(EditValue::Text(s)) => s.is_empty(),
        Some(EditValue::Number(_)) => false,
    }
}

/// Format a number without a trailing `.0` for integral values.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_like() {
        assert!(is_empty_like(&None));
        assert!(is_empty_like(&Some(EditValue::Text(String::new()))));
        assert!(!is_empty_like(&Some(EditValue::Text(" ".into()))));
        assert!(!is_empty_like(&Some(EditValue::Number(0.0))));
    }

    #[test]
    fn test_raw_display() {
        assert_eq!(CellValue::Number(12.0).raw_display(), "12");
        assert_eq!(CellValue::Number(3.5).raw_display(), "3.5");
        assert_eq!(CellValue::Empty.raw_display(), "");
        assert_eq!(CellValue::Text("abc".into()).raw_display(), "abc");
    }

    #[test]
    fn test_spare_is_not_committed_blank() {
        assert_ne!(GridCell::Spare, GridCell::Value(CellValue::Empty));
        assert!(GridCell::Spare.value().is_none());
        assert_eq!(GridCell::Value(CellValue::Empty).value(), Some(&CellValue::Empty));
    }

    #[test]
    fn test_edit_value_deserializes_untagged() {
        let v: Vec<Option<EditValue>> = serde_json::from_str(r#"[null, 12, "abc"]"#).unwrap();
        assert_eq!(v, vec![None, Some(EditValue::Number(12.0)), Some(EditValue::Text("abc".into()))]);
    }
}
