//! Read-only copies of buffer history.

use std::sync::Arc;

use rtvars_registry::{VariableKind, VariableValue};
use serde::Serialize;

/// Name and kind of one buffer column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    /// Full dotted name of the bound variable
    pub name: String,
    /// Kind of the bound variable
    pub kind: VariableKind,
}

/// Consecutive rows copied out of a history buffer.
///
/// Rows are addressed `0..len()`; row `i` was written at tick
/// `first_tick() + i`. The window owns its data and never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    first_tick: u64,
    rows: usize,
    layout: Arc<[ColumnInfo]>,
    columns: Vec<Vec<u64>>,
}

impl Window {
    pub(crate) fn new(first_tick: u64, layout: Arc<[ColumnInfo]>, columns: Vec<Vec<u64>>) -> Self {
        let rows = columns.first().map_or(0, Vec::len);
        Self {
            first_tick,
            rows,
            layout,
            columns,
        }
    }

    /// Rows for a buffer with no columns still carry a tick range.
    pub(crate) fn empty_columns(first_tick: u64, rows: usize) -> Self {
        Self {
            first_tick,
            rows,
            layout: Arc::from(Vec::new()),
            columns: Vec::new(),
        }
    }

    /// Tick number of row 0.
    pub fn first_tick(&self) -> u64 {
        self.first_tick
    }

    /// One past the tick number of the last row.
    pub fn end_tick(&self) -> u64 {
        self.first_tick.saturating_add(self.rows as u64)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// True if the window holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.layout.len()
    }

    /// Column layout, in binding order.
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.layout
    }

    /// Index of the column bound to `full_name`.
    pub fn column_index(&self, full_name: &str) -> Option<usize> {
        self.layout.iter().position(|c| c.name == full_name)
    }

    /// One cell.
    pub fn value(&self, row: usize, column: usize) -> Option<VariableValue> {
        let kind = self.layout.get(column)?.kind;
        let bits = *self.columns.get(column)?.get(row)?;
        Some(VariableValue::from_bits(kind, bits))
    }

    /// All values of one column, oldest first.
    pub fn column(&self, column: usize) -> Option<Vec<VariableValue>> {
        let kind = self.layout.get(column)?.kind;
        let cells = self.columns.get(column)?;
        Some(
            cells
                .iter()
                .map(|&bits| VariableValue::from_bits(kind, bits))
                .collect(),
        )
    }

    /// Column values widened to `f64`.
    pub fn column_f64(&self, column: usize) -> Option<Vec<f64>> {
        self.column_iter_f64(column).map(Iterator::collect)
    }

    /// Column bound to the variable with this full name.
    pub fn column_by_name(&self, full_name: &str) -> Option<Vec<VariableValue>> {
        self.column(self.column_index(full_name)?)
    }

    /// All values of one row, in column order.
    pub fn row(&self, row: usize) -> Option<Vec<VariableValue>> {
        if row >= self.rows {
            return None;
        }
        (0..self.column_count())
            .map(|column| self.value(row, column))
            .collect()
    }

    /// Iterate rows as `(tick, values)`.
    pub fn rows(&self) -> impl Iterator<Item = (u64, Vec<VariableValue>)> + '_ {
        (0..self.rows).filter_map(move |i| {
            let tick = self.first_tick.saturating_add(i as u64);
            self.row(i).map(|values| (tick, values))
        })
    }

    /// Smallest and largest value in a column, ignoring NaN.
    ///
    /// `None` for an unknown column or one with no comparable values.
    pub fn column_bounds(&self, column: usize) -> Option<(f64, f64)> {
        self.column_iter_f64(column)?
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
            })
    }

    /// Mean of a column, ignoring NaN.
    pub fn column_average(&self, column: usize) -> Option<f64> {
        let mut mean = 0.0;
        let mut n = 0.0;
        for v in self.column_iter_f64(column)?.filter(|v| !v.is_nan()) {
            n += 1.0;
            mean += (v - mean) / n;
        }
        (n > 0.0).then_some(mean)
    }

    fn column_iter_f64(&self, column: usize) -> Option<impl Iterator<Item = f64> + '_> {
        let kind = self.layout.get(column)?.kind;
        let cells = self.columns.get(column)?;
        Some(
            cells
                .iter()
                .map(move |&bits| VariableValue::from_bits(kind, bits).as_f64()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Window {
        let layout: Arc<[ColumnInfo]> = Arc::from(vec![
            ColumnInfo {
                name: "root.x".to_owned(),
                kind: VariableKind::Double,
            },
            ColumnInfo {
                name: "root.on".to_owned(),
                kind: VariableKind::Boolean,
            },
        ]);
        let xs = [1.0f64, f64::NAN, 3.0, -2.0].map(f64::to_bits).to_vec();
        let flags = vec![1, 0, 1, 1];
        Window::new(10, layout, vec![xs, flags])
    }

    #[test]
    fn test_shape() {
        let w = sample();
        assert_eq!(w.len(), 4);
        assert_eq!(w.first_tick(), 10);
        assert_eq!(w.end_tick(), 14);
        assert_eq!(w.column_count(), 2);
        assert_eq!(w.column_index("root.on"), Some(1));
    }

    #[test]
    fn test_row_and_column_access() {
        let w = sample();
        assert_eq!(
            w.row(2),
            Some(vec![VariableValue::Double(3.0), VariableValue::Boolean(true)])
        );
        assert_eq!(w.row(4), None);
        assert_eq!(
            w.column_by_name("root.on"),
            Some(vec![
                VariableValue::Boolean(true),
                VariableValue::Boolean(false),
                VariableValue::Boolean(true),
                VariableValue::Boolean(true),
            ])
        );
        assert!(w.column(2).is_none());
    }

    #[test]
    fn test_statistics_skip_nan() {
        let w = sample();
        assert_eq!(w.column_bounds(0), Some((-2.0, 3.0)));
        let avg = w.column_average(0).unwrap_or(f64::NAN);
        assert!((avg - 2.0 / 3.0).abs() < 1e-12);
        let duty = w.column_average(1).unwrap_or(f64::NAN);
        assert!((duty - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_rows_iterator_carries_ticks() {
        let w = sample();
        let ticks: Vec<u64> = w.rows().map(|(t, _)| t).collect();
        assert_eq!(ticks, [10, 11, 12, 13]);
    }

    #[test]
    fn test_empty_columns_window() {
        let w = Window::empty_columns(5, 3);
        assert_eq!(w.len(), 3);
        assert_eq!(w.row(0), Some(Vec::new()));
        assert_eq!(w.column_bounds(0), None);
    }
}
