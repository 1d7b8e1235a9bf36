#![forbid(unsafe_code)]

//! Sorting for the item tables.
//!
//! Two independent modes: `Default` orders by a caller-chosen numeric field
//! with missing values pushed to a configured end, `DecisionMargin` orders
//! by `|classifier score|` ascending so the least certain items come first.
//! Both sorts are stable.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Default,
    DecisionMargin,
}

impl SortMode {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Default => Self::DecisionMargin,
            Self::DecisionMargin => Self::Default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Where items without a value go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullsPlacement {
    First,
    #[default]
    Last,
}

/// Sort settings of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SortState {
    pub mode: SortMode,
    pub direction: SortDirection,
    pub nulls: NullsPlacement,
}

impl SortState {
    /// Flip between the two modes. Nothing else changes.
    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }

    /// Sort `items` with the active mode. `field` feeds `Default`,
    /// `classifier` feeds `DecisionMargin`.
    pub fn sort<T, F, C>(&self, items: &mut [T], field: F, classifier: C)
    where
        F: Fn(&T) -> Option<f64>,
        C: Fn(&T) -> Option<f64>,
    {
        match self.mode {
            SortMode::Default => sort_by_field(items, field, self.direction, self.nulls),
            SortMode::DecisionMargin => sort_by_decision_margin(items, classifier),
        }
    }
}

fn present(v: Option<f64>) -> Option<f64> {
    v.filter(|x| !x.is_nan())
}

/// Stable sort by `field`. NaN counts as missing.
pub fn sort_by_field<T, F>(
    items: &mut [T],
    field: F,
    direction: SortDirection,
    nulls: NullsPlacement,
) where
    F: Fn(&T) -> Option<f64>,
{
    items.sort_by(|a, b| match (present(field(a)), present(field(b))) {
        (Some(x), Some(y)) => match direction {
            SortDirection::Ascending => x.total_cmp(&y),
            SortDirection::Descending => y.total_cmp(&x),
        },
        (None, None) => Ordering::Equal,
        (None, Some(_)) => match nulls {
            NullsPlacement::First => Ordering::Less,
            NullsPlacement::Last => Ordering::Greater,
        },
        (Some(_), None) => match nulls {
            NullsPlacement::First => Ordering::Greater,
            NullsPlacement::Last => Ordering::Less,
        },
    });
}

/// Stable sort by `|score|` ascending; unscored items go last.
pub fn sort_by_decision_margin<T, C>(items: &mut [T], classifier: C)
where
    C: Fn(&T) -> Option<f64>,
{
    sort_by_field(
        items,
        |item| classifier(item).map(f64::abs),
        SortDirection::Ascending,
        NullsPlacement::Last,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        similarity: Option<f64>,
        margin: Option<f64>,
    }

    fn row(id: u32, similarity: Option<f64>, margin: Option<f64>) -> Row {
        Row {
            id,
            similarity,
            margin,
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            row(1, Some(0.4), Some(-2.0)),
            row(2, None, Some(0.1)),
            row(3, Some(0.9), None),
            row(4, Some(f64::NAN), Some(-0.5)),
            row(5, Some(0.4), Some(1.0)),
        ]
    }

    fn ids(rows: &[Row]) -> Vec<u32> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn default_mode_sorts_by_field_with_nulls_last() {
        let mut r = rows();
        SortState::default().sort(&mut r, |r: &Row| r.similarity, |r: &Row| r.margin);
        assert_eq!(ids(&r), vec![3, 1, 5, 2, 4]);
    }

    #[test]
    fn nulls_first_ascending() {
        let mut r = rows();
        sort_by_field(
            &mut r,
            |r: &Row| r.similarity,
            SortDirection::Ascending,
            NullsPlacement::First,
        );
        assert_eq!(ids(&r), vec![2, 4, 1, 5, 3]);
    }

    #[test]
    fn decision_margin_puts_uncertain_first() {
        let mut state = SortState::default();
        state.toggle_mode();
        assert_eq!(state.mode, SortMode::DecisionMargin);
        let mut r = rows();
        state.sort(&mut r, |r: &Row| r.similarity, |r: &Row| r.margin);
        assert_eq!(ids(&r), vec![2, 4, 5, 1, 3]);
        state.toggle_mode();
        assert_eq!(state.mode, SortMode::Default);
    }
}
