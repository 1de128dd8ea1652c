//! Grouped totals and top-N tables.
//!
//! Rows are grouped by a categorical key into an insertion-ordered map, so
//! a stable sort on the totals keeps first-seen order between equal groups.

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Label of the synthetic residual category.
pub const OTHERS_LABEL: &str = "Others";

/// One bar of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub label: String,
    pub value: f64,
}

impl ChartEntry {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        ChartEntry {
            label: label.into(),
            value,
        }
    }
}

/// Running totals per category, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct GroupTotals {
    totals: IndexMap<String, f64>,
}

impl GroupTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` to the total of `key`.
    pub fn add(&mut self, key: &str, value: f64) {
        match self.totals.get_mut(key) {
            Some(total) => *total += value,
            None => {
                self.totals.insert(key.to_string(), value);
            }
        }
    }

    /// Counts one occurrence of `key`.
    pub fn count(&mut self, key: &str) {
        self.add(key, 1.0);
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Groups sorted by total, descending; ties keep first-seen order.
    pub fn sorted_desc(&self) -> Vec<(String, f64)> {
        let mut groups: Vec<(String, f64)> = self
            .totals
            .iter()
            .map(|(key, total)| (key.clone(), *total))
            .collect();
        groups.sort_by(|a, b| descending(a.1, b.1));
        groups
    }

    /// Builds the top-`n` table from these totals.
    pub fn top_n(&self, n: usize, fold_others: bool) -> TopN {
        TopN::from_totals(self.sorted_desc(), n, fold_others)
    }
}

impl<'a> FromIterator<(&'a str, f64)> for GroupTotals {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        let mut totals = GroupTotals::new();
        for (key, value) in iter {
            totals.add(key, value);
        }
        totals
    }
}

/// Top-N groups, optionally followed by an "Others" entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TopN {
    top: Vec<ChartEntry>,
    others: Option<f64>,
}

impl TopN {
    /// Truncates already-sorted totals to `n`, folding the rest when asked.
    ///
    /// "Others" is only produced when more than `n` groups exist.
    pub fn from_totals(sorted: Vec<(String, f64)>, n: usize, fold_others: bool) -> Self {
        let others = if fold_others && sorted.len() > n {
            Some(sorted[n..].iter().map(|(_, total)| total).sum())
        } else {
            None
        };
        let top = sorted
            .into_iter()
            .take(n)
            .map(|(label, total)| ChartEntry::new(label, total))
            .collect();
        TopN { top, others }
    }

    pub fn top(&self) -> &[ChartEntry] {
        &self.top
    }

    pub fn others(&self) -> Option<f64> {
        self.others
    }

    /// All entries in chart order, "Others" last.
    pub fn entries(&self) -> Vec<ChartEntry> {
        let mut entries = self.top.clone();
        if let Some(total) = self.others {
            entries.push(ChartEntry::new(OTHERS_LABEL, total));
        }
        entries
    }

    pub fn len(&self) -> usize {
        self.top.len() + usize::from(self.others.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sorts rows by `value` descending (stable) and keeps the first `n`.
///
/// No grouping happens: every row keeps its identity.
pub fn top_rows_by<T, F>(rows: &[T], n: usize, value: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> f64,
{
    let mut sorted: Vec<&T> = rows.iter().collect();
    sorted.sort_by(|a, b| descending(value(a), value(b)));
    sorted.into_iter().take(n).cloned().collect()
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn abundances() -> GroupTotals {
        [("A", 40.0), ("B", 30.0), ("C", 20.0), ("D", 5.0), ("E", 5.0)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_top_n_with_others() {
        let top = abundances().top_n(3, true);

        assert_eq!(top.len(), 4);
        assert_eq!(
            top.top(),
            &[
                ChartEntry::new("A", 40.0),
                ChartEntry::new("B", 30.0),
                ChartEntry::new("C", 20.0)
            ]
        );
        assert_relative_eq!(top.others().unwrap(), 10.0);
        assert_eq!(top.entries().last().unwrap().label, OTHERS_LABEL);
    }

    #[test]
    fn test_no_others_when_groups_fit() {
        let top = abundances().top_n(5, true);
        assert_eq!(top.len(), 5);
        assert!(top.others().is_none());

        let top = abundances().top_n(10, true);
        assert_eq!(top.len(), 5);
        assert!(top.others().is_none());
    }

    #[test]
    fn test_others_sums_every_excluded_group() {
        let totals: GroupTotals = (0..20)
            .map(|i| (["a", "b", "c", "d", "e", "f", "g"][i % 7], (i + 1) as f64))
            .collect();
        let sorted = totals.sorted_desc();

        for n in 0..totals.len() {
            let top = totals.top_n(n, true);
            assert_eq!(top.len(), n + 1);
            let excluded: f64 = sorted[n..].iter().map(|(_, v)| v).sum();
            assert_relative_eq!(top.others().unwrap(), excluded);
        }
    }

    #[test]
    fn test_zero_n_folds_everything() {
        let top = abundances().top_n(0, true);
        assert!(top.top().is_empty());
        assert_relative_eq!(top.others().unwrap(), 100.0);
    }

    #[test]
    fn test_fold_disabled() {
        let top = abundances().top_n(2, false);
        assert_eq!(top.len(), 2);
        assert!(top.others().is_none());
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let totals: GroupTotals = [("x", 1.0), ("y", 2.0), ("z", 1.0), ("w", 2.0)]
            .into_iter()
            .collect();
        let labels: Vec<String> = totals
            .sorted_desc()
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(labels, vec!["y", "w", "x", "z"]);
    }

    #[test]
    fn test_counting() {
        let mut totals = GroupTotals::new();
        for gene in ["mecA", "mecA", "vanA"] {
            totals.count(gene);
        }
        let top = totals.top_n(15, false);
        assert_eq!(
            top.entries(),
            vec![ChartEntry::new("mecA", 2.0), ChartEntry::new("vanA", 1.0)]
        );
    }

    #[test]
    fn test_top_rows_keeps_duplicates() {
        let rows = vec![("sp1", 3.0), ("sp2", 9.0), ("sp1", 5.0), ("sp3", 1.0)];
        let top = top_rows_by(&rows, 3, |row| row.1);
        assert_eq!(top, vec![("sp2", 9.0), ("sp1", 5.0), ("sp1", 3.0)]);
    }
}
