//! New-column schema inference.
//!
//! Every growth path (row+column, column only, implicit gap columns) calls
//! [`infer_column_schema`], so a pasted block always produces the same
//! variables no matter which branch the reconciler takes.

use std::collections::BTreeMap;

use crate::cell::is_empty_like;
use crate::reconcile::ResolvedEdit;
use crate::table::TableSettings;
use crate::validation::parse_numeric_input;
use crate::variable::{Alignment, Measure, VariableDescriptor, VariableType};

/// What the values seen in one new column say about its type.
#[derive(Debug, Default)]
struct ColumnEvidence {
    all_numeric: bool,
    longest: usize,
    seen: usize,
}

/// Descriptors for every column at or past `actual_cols` that receives a
/// non-empty value, sorted by column index.
///
/// A column is STRING as soon as one of its values fails to parse as a
/// number; its width is the longest value seen, but never below
/// `settings.min_string_width`. Otherwise it is NUMERIC with the configured
/// default width and decimals.
pub fn infer_column_schema(
    actual_cols: usize,
    edits: &[ResolvedEdit],
    settings: &TableSettings,
) -> Vec<VariableDescriptor> {
    let mut evidence: BTreeMap<usize, ColumnEvidence> = BTreeMap::new();

    for edit in edits.iter().filter(|e| e.col >= actual_cols) {
        if is_empty_like(&edit.new) {
            continue;
        }
        let Some(value) = edit.new.as_ref() else {
            continue;
        };
        let text = value.as_text();
        let entry = evidence
            .entry(edit.col)
            .or_insert(ColumnEvidence { all_numeric: true, ..ColumnEvidence::default() });
        entry.seen += 1;
        entry.longest = entry.longest.max(text.chars().count());
        if parse_numeric_input(&text).is_err() {
            entry.all_numeric = false;
        }
    }

    evidence
        .into_iter()
        .map(|(col, ev)| describe(col, &ev, settings))
        .collect()
}

fn describe(col: usize, evidence: &ColumnEvidence, settings: &TableSettings) -> VariableDescriptor {
    // Name left unset: the store picks a default that is not yet taken
    let base = VariableDescriptor::at(col);

    if evidence.all_numeric {
        VariableDescriptor {
            var_type: Some(VariableType::Numeric),
            width: Some(settings.numeric_width),
            decimals: Some(settings.numeric_decimals),
            align: Some(Alignment::Right),
            measure: Some(Measure::Scale),
            ..base
        }
    } else {
        let longest = u32::try_from(evidence.longest).unwrap_or(u32::MAX);
        VariableDescriptor {
            var_type: Some(VariableType::String),
            width: Some(longest.max(settings.min_string_width)),
            decimals: Some(0),
            align: Some(Alignment::Left),
            measure: Some(Measure::Nominal),
            ..base
        }
    }
}
