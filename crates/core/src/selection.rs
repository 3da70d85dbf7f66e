use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// A rectangular block of grid cells, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl Range {
    /// Corners may come in any order; the result is normalized.
    pub fn new(r1: usize, c1: usize, r2: usize, c2: usize) -> Self {
        Self {
            start_row: r1.min(r2),
            start_col: c1.min(c2),
            end_row: r1.max(r2),
            end_col: c1.max(c2),
        }
    }

    /// Build a range from grid coordinates where `-1` marks a header click.
    ///
    /// Header coordinates clamp to 0, so clicking a column header yields a
    /// range that starts on the first row of that column.
    pub fn from_grid(r1: isize, c1: isize, r2: isize, c2: isize) -> Self {
        let clamp = |v: isize| v.max(0) as usize;
        Self::new(clamp(r1), clamp(c1), clamp(r2), clamp(c2))
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.row_span().contains(&row) && self.col_span().contains(&col)
    }

    pub fn row_span(&self) -> RangeInclusive<usize> {
        self.start_row..=self.end_row
    }

    pub fn col_span(&self) -> RangeInclusive<usize> {
        self.start_col..=self.end_col
    }
}

/// What the user has highlighted: one or more ranges, the last one active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    ranges: Vec<Range>,
}

impl Selection {
    pub fn from_range(range: Range) -> Self {
        Self { ranges: vec![range] }
    }

    /// Add another block (ctrl+drag) without dropping the existing ones.
    pub fn add_range(&mut self, range: Range) {
        self.ranges.push(range);
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    /// The most recently added range.
    pub fn active(&self) -> Option<&Range> {
        self.ranges.last()
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.ranges.iter().any(|r| r.contains(row, col))
    }

    /// Every row index touched by any range, ascending.
    pub fn rows(&self) -> BTreeSet<usize> {
        self.ranges.iter().flat_map(Range::row_span).collect()
    }

    /// Every column index touched by any range, ascending.
    pub fn columns(&self) -> BTreeSet<usize> {
        self.ranges.iter().flat_map(Range::col_span).collect()
    }
}
