//! Variable metadata: one record per data column.
//!
//! `column_index` is the only stable join key between a variable and the data
//! matrix. Names may be blank or duplicated while the user is editing, so
//! nothing in the engine looks variables up by name.

use serde::{Deserialize, Serialize};

use crate::missing::MissingValuesSpec;

/// Display width for new numeric variables.
pub const DEFAULT_NUMERIC_WIDTH: u32 = 8;

/// Decimals for new numeric variables.
pub const DEFAULT_DECIMALS: u32 = 2;

/// Lower bound on the inferred width of a new string variable.
pub const MIN_STRING_WIDTH: u32 = 8;

/// Visual column width for new variables.
pub const DEFAULT_COLUMNS: u32 = 64;

/// Variable storage/display type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VariableType {
    #[default]
    Numeric,
    Comma,
    Dot,
    Scientific,
    Date,
    Dollar,
    Custom,
    String,
}

impl VariableType {
    /// Types whose cells hold numbers.
    pub fn is_numeric_family(&self) -> bool {
        !matches!(self, VariableType::String | VariableType::Date)
    }

    pub fn label(&self) -> &'static str {
        match self {
            VariableType::Numeric => "Numeric",
            VariableType::Comma => "Comma",
            VariableType::Dot => "Dot",
            VariableType::Scientific => "Scientific",
            VariableType::Date => "Date",
            VariableType::Dollar => "Dollar",
            VariableType::Custom => "Custom",
            VariableType::String => "String",
        }
    }
}

/// Horizontal alignment of a variable's cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    #[default]
    Right,
}

impl Alignment {
    pub fn default_for(var_type: VariableType) -> Self {
        if var_type == VariableType::String {
            Alignment::Left
        } else {
            Alignment::Right
        }
    }

    /// CSS class the grid widget uses for this alignment.
    pub fn class_name(&self) -> &'static str {
        match self {
            Alignment::Left => "htLeft",
            Alignment::Center => "htCenter",
            Alignment::Right => "htRight",
        }
    }
}

/// Level of measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    #[default]
    Unknown,
    Nominal,
    Ordinal,
    Scale,
}

impl Measure {
    pub fn default_for(var_type: VariableType) -> Self {
        if var_type == VariableType::String {
            Measure::Nominal
        } else {
            Measure::Scale
        }
    }
}

/// Role of a variable in analysis dialogs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Input,
    Target,
    Both,
    None,
    Partition,
    Split,
}

/// A number or string appearing in value labels and missing-value lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Number(f64),
    Text(String),
}

impl ScalarValue {
    /// The single-space string that stands for "blank as data".
    pub fn blank_sentinel() -> Self {
        ScalarValue::Text(" ".to_string())
    }

    pub fn display(&self) -> String {
        match self {
            ScalarValue::Number(n) => crate::cell::format_number(*n),
            ScalarValue::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueLabel {
    pub value: ScalarValue,
    pub label: String,
}

/// Metadata for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub name: String,
    pub column_index: usize,
    #[serde(rename = "type")]
    pub var_type: VariableType,
    pub width: u32,
    pub decimals: u32,
    pub columns: u32,
    pub align: Alignment,
    pub measure: Measure,
    pub role: Role,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub values: Vec<ValueLabel>,
    #[serde(default)]
    pub missing: MissingValuesSpec,
}

impl Variable {
    /// `var<N+1>` for a zero-based column index.
    pub fn default_name(column_index: usize) -> String {
        format!("var{}", column_index + 1)
    }

    pub fn numeric(column_index: usize) -> Self {
        Self {
            name: Self::default_name(column_index),
            column_index,
            var_type: VariableType::Numeric,
            width: DEFAULT_NUMERIC_WIDTH,
            decimals: DEFAULT_DECIMALS,
            columns: DEFAULT_COLUMNS,
            align: Alignment::Right,
            measure: Measure::Scale,
            role: Role::Input,
            label: String::new(),
            values: Vec::new(),
            missing: MissingValuesSpec::None,
        }
    }

    pub fn string(column_index: usize, width: u32) -> Self {
        Self {
            var_type: VariableType::String,
            width,
            decimals: 0,
            align: Alignment::Left,
            measure: Measure::Nominal,
            ..Self::numeric(column_index)
        }
    }

    /// Build a full record from a partial one, filling unset fields with the
    /// defaults for the resolved type.
    pub fn from_descriptor(descriptor: VariableDescriptor, column_index: usize) -> Self {
        let var_type = descriptor.var_type.unwrap_or_default();
        let base = if var_type == VariableType::String {
            Variable::string(column_index, MIN_STRING_WIDTH)
        } else {
            Variable { var_type, ..Variable::numeric(column_index) }
        };
        let decimals = if var_type.is_numeric_family() { base.decimals } else { 0 };

        Self {
            name: descriptor
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(base.name),
            column_index,
            var_type,
            width: descriptor.width.unwrap_or(base.width),
            decimals: descriptor.decimals.unwrap_or(decimals),
            columns: descriptor.columns.unwrap_or(base.columns),
            align: descriptor.align.unwrap_or_else(|| Alignment::default_for(var_type)),
            measure: descriptor.measure.unwrap_or_else(|| Measure::default_for(var_type)),
            role: descriptor.role.unwrap_or(base.role),
            label: descriptor.label.unwrap_or_default(),
            values: descriptor.values.unwrap_or_default(),
            missing: descriptor.missing.unwrap_or_default(),
        }
    }

    /// Apply a single-field update.
    pub fn apply(&mut self, field: VariableField) {
        match field {
            VariableField::Name(name) => self.name = name,
            VariableField::Type { var_type, width, decimals } => {
                self.var_type = var_type;
                self.width = width;
                self.decimals = if var_type.is_numeric_family() { decimals } else { 0 };
            }
            VariableField::Width(w) => self.width = w,
            VariableField::Decimals(d) => self.decimals = d,
            VariableField::Label(label) => self.label = label,
            VariableField::Values(values) => self.values = values,
            VariableField::Missing(missing) => self.missing = missing,
            VariableField::Columns(c) => self.columns = c,
            VariableField::Align(a) => self.align = a,
            VariableField::Measure(m) => self.measure = m,
            VariableField::Role(r) => self.role = r,
        }
    }
}

/// A partial variable record, as accepted by `VariableStore::add_variable`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VariableDescriptor {
    pub name: Option<String>,
    pub column_index: Option<usize>,
    #[serde(rename = "type")]
    pub var_type: Option<VariableType>,
    pub width: Option<u32>,
    pub decimals: Option<u32>,
    pub columns: Option<u32>,
    pub align: Option<Alignment>,
    pub measure: Option<Measure>,
    pub role: Option<Role>,
    pub label: Option<String>,
    pub values: Option<Vec<ValueLabel>>,
    pub missing: Option<MissingValuesSpec>,
}

impl VariableDescriptor {
    pub fn at(column_index: usize) -> Self {
        Self { column_index: Some(column_index), ..Self::default() }
    }
}

/// One field of a variable, tagged with its new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum VariableField {
    Name(String),
    Type { var_type: VariableType, width: u32, decimals: u32 },
    Width(u32),
    Decimals(u32),
    Label(String),
    Values(Vec<ValueLabel>),
    Missing(MissingValuesSpec),
    Columns(u32),
    Align(Alignment),
    Measure(Measure),
    Role(Role),
}

impl VariableField {
    pub fn name(&self) -> &'static str {
        match self {
            VariableField::Name(_) => "name",
            VariableField::Type { .. } => "type",
            VariableField::Width(_) => "width",
            VariableField::Decimals(_) => "decimals",
            VariableField::Label(_) => "label",
            VariableField::Values(_) => "values",
            VariableField::Missing(_) => "missing",
            VariableField::Columns(_) => "columns",
            VariableField::Align(_) => "align",
            VariableField::Measure(_) => "measure",
            VariableField::Role(_) => "role",
        }
    }
}
