//! Table structure derivation.
//!
//! Pure functions from store snapshots to what the grid widget renders:
//! headers, per-column configuration and a padded display matrix. The
//! widget re-reads these on every store change, so identical inputs must
//! give `==` outputs.

use serde::{Deserialize, Serialize};

use crate::cell::{CellValue, GridCell};
use crate::table::{TableSettings, TableSnapshot};
use crate::validation::{parse_spss_date, ValidationFailureReason};
use crate::variable::{Alignment, Variable, VariableType};

/// Header shown for unnamed and spare columns.
pub const HEADER_PLACEHOLDER: &str = "var";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Text,
    Date,
}

/// A fixed validator attached to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellValidator {
    /// `DD-MM-YYYY`, on or after 15-10-1582.
    SpssDate,
}

impl CellValidator {
    pub fn validate(&self, value: &str) -> Result<(), ValidationFailureReason> {
        match self {
            CellValidator::SpssDate => parse_spss_date(value)
                .map(|_| ())
                .map_err(ValidationFailureReason::Date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub kind: ColumnKind,
    pub read_only: bool,
    pub align: Alignment,
    /// Pixel width.
    pub width: u32,
    pub validator: Option<CellValidator>,
    /// Past the committed extent.
    pub spare: bool,
}

impl ColumnConfig {
    fn for_variable(var: &Variable) -> Self {
        let (kind, validator) = match var.var_type {
            VariableType::String => (ColumnKind::Text, None),
            VariableType::Date => (ColumnKind::Date, Some(CellValidator::SpssDate)),
            _ => (ColumnKind::Numeric, None),
        };
        Self { kind, read_only: false, align: var.align, width: var.columns, validator, spare: false }
    }

    fn committed_default(settings: &TableSettings) -> Self {
        Self {
            kind: ColumnKind::Numeric,
            read_only: false,
            align: Alignment::Right,
            width: settings.default_column_width,
            validator: None,
            spare: false,
        }
    }

    fn spare(settings: &TableSettings) -> Self {
        Self {
            kind: ColumnKind::Text,
            spare: true,
            align: Alignment::Left,
            ..Self::committed_default(settings)
        }
    }

    pub fn class_name(&self) -> &'static str {
        self.align.class_name()
    }
}

/// Everything the data grid needs to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStructure {
    pub headers: Vec<String>,
    pub columns: Vec<ColumnConfig>,
    /// `display_rows` x `display_cols`, row-major.
    pub display: Vec<Vec<GridCell>>,
    pub actual_rows: usize,
    pub actual_cols: usize,
}

impl TableStructure {
    pub fn display_rows(&self) -> usize {
        self.display.len()
    }

    pub fn display_cols(&self) -> usize {
        self.headers.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&GridCell> {
        self.display.get(row).and_then(|r| r.get(col))
    }
}

/// Derive headers, column configs and the padded display matrix.
///
/// The display is `max(actual, minimum) + 1` in each dimension. Cells
/// inside the actual extent carry their committed value; every other cell
/// is [`GridCell::Spare`].
pub fn build_table_structure(snapshot: &TableSnapshot, settings: &TableSettings) -> TableStructure {
    let actual_rows = snapshot.actual_rows();
    let actual_cols = snapshot.actual_cols();
    let display_rows = actual_rows.max(settings.min_rows) + 1;
    let display_cols = actual_cols.max(settings.min_columns) + 1;

    let mut headers = Vec::with_capacity(display_cols);
    let mut columns = Vec::with_capacity(display_cols);
    for col in 0..display_cols {
        let var = snapshot.variable_at(col);
        let header = match var {
            Some(v) if !v.name.trim().is_empty() => v.name.clone(),
            _ => HEADER_PLACEHOLDER.to_string(),
        };
        let config = match var {
            Some(v) => ColumnConfig::for_variable(v),
            None if col < actual_cols => ColumnConfig::committed_default(settings),
            None => ColumnConfig::spare(settings),
        };
        headers.push(header);
        columns.push(config);
    }

    let display = (0..display_rows)
        .map(|row| {
            (0..display_cols)
                .map(|col| {
                    if row < actual_rows && col < actual_cols {
                        GridCell::Value(snapshot.cell(row, col).cloned().unwrap_or_default())
                    } else {
                        GridCell::Spare
                    }
                })
                .collect()
        })
        .collect();

    TableStructure { headers, columns, display, actual_rows, actual_cols }
}

// ============================================================================
// Variable view
// ============================================================================

/// Column headers of the variable view, in order.
pub const VARIABLE_VIEW_HEADERS: [&str; 11] = [
    "Name", "Type", "Width", "Decimals", "Label", "Values", "Missing", "Columns", "Align", "Measure",
    "Role",
];

/// The variable-metadata grid: row `i` describes column index `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableTable {
    pub headers: Vec<String>,
    pub display: Vec<Vec<GridCell>>,
    pub actual_rows: usize,
}

/// Derive the variable view. Indices without a variable render as spare.
pub fn build_variable_table(variables: &[Variable], settings: &TableSettings) -> VariableTable {
    let actual_rows = variables.iter().map(|v| v.column_index + 1).max().unwrap_or(0);
    let display_rows = actual_rows.max(settings.min_rows) + 1;

    let display = (0..display_rows)
        .map(|row| match variables.iter().find(|v| v.column_index == row) {
            Some(var) => variable_row(var)
                .into_iter()
                .map(|text| GridCell::Value(CellValue::Text(text)))
                .collect(),
            None => vec![GridCell::Spare; VARIABLE_VIEW_HEADERS.len()],
        })
        .collect();

    VariableTable {
        headers: VARIABLE_VIEW_HEADERS.iter().map(|h| h.to_string()).collect(),
        display,
        actual_rows,
    }
}

fn variable_row(var: &Variable) -> Vec<String> {
    let values = match var.values.as_slice() {
        [] => "None".to_string(),
        [first] => format!("{{{}, {}}}", first.value.display(), first.label),
        [first, ..] => format!("{{{}, {}}}...", first.value.display(), first.label),
    };
    vec![
        var.name.clone(),
        var.var_type.label().to_string(),
        var.width.to_string(),
        var.decimals.to_string(),
        var.label.clone(),
        values,
        var.missing.summary(),
        var.columns.to_string(),
        format!("{:?}", var.align),
        format!("{:?}", var.measure),
        format!("{:?}", var.role),
    ]
}
