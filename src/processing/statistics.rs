use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::grid::CellKey;

/// Running count/sum/min/max of one field in one cell.
///
/// The sum is Neumaier-compensated so long runs of similar readings do not
/// drift. `merge` is associative and commutative for count, min and max;
/// the sum, and so the mean, agrees across push/merge orders to within a
/// few ulps rather than bit for bit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldAccumulator {
    pub count: u64,
    sum: f64,
    compensation: f64,
    min: f64,
    max: f64,
}

impl Default for FieldAccumulator {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            compensation: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl FieldAccumulator {
    fn add_to_sum(&mut self, v: f64) {
        let t = self.sum + v;
        if self.sum.abs() >= v.abs() {
            self.compensation += (self.sum - t) + v;
        } else {
            self.compensation += (v - t) + self.sum;
        }
        self.sum = t;
    }

    /// Record a reading. Non-finite readings are ignored.
    pub fn push(&mut self, v: f64) -> bool {
        if !v.is_finite() {
            return false;
        }
        self.count += 1;
        self.add_to_sum(v);
        self.min = self.min.min(v);
        self.max = self.max.max(v);
        true
    }

    pub fn merge(&mut self, other: &FieldAccumulator) {
        if other.count == 0 {
            return;
        }
        self.count += other.count;
        self.add_to_sum(other.sum);
        self.add_to_sum(other.compensation);
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn sum(&self) -> f64 {
        self.sum + self.compensation
    }

    /// Final statistics, or `None` when no reading was recorded.
    pub fn finish(&self) -> Option<FieldStats> {
        if self.count == 0 {
            return None;
        }
        Some(FieldStats {
            count: self.count,
            mean: self.sum() / self.count as f64,
            min: self.min,
            max: self.max,
        })
    }
}

/// Finalized statistics of one field in one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    /// Readings that contributed.
    pub count: u64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Finalized statistics of one cell.
///
/// A field with no contributing reading maps to `None` (serialized as
/// `null`), never to zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellStats {
    pub cell_id: String,
    #[serde(skip)]
    pub key: CellKey,
    pub data_count: u64,
    pub fields: BTreeMap<String, Option<FieldStats>>,
}

impl CellStats {
    pub fn field(&self, name: &str) -> Option<&FieldStats> {
        self.fields.get(name).and_then(|f| f.as_ref())
    }

    pub fn has_data(&self) -> bool {
        self.data_count > 0
    }
}

/// Distribution of a set of values, e.g. one field's cell means.
#[derive(Debug, Clone)]
pub struct SeriesStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

impl SeriesStats {
    /// Compute statistics, filtering out non-finite values.
    pub fn compute(values: &[f64]) -> Option<Self> {
        let mut vals: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if vals.is_empty() {
            return None;
        }

        let count = vals.len();
        vals.sort_by(f64::total_cmp);
        let min = vals[0];
        let max = vals[count - 1];
        let mean = vals.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 0 {
            (vals[count / 2 - 1] + vals[count / 2]) / 2.0
        } else {
            vals[count / 2]
        };
        let variance = vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        Some(SeriesStats {
            count,
            min,
            max,
            mean,
            median,
            std_dev: variance.sqrt(),
        })
    }

    /// Format as a multi-line report block.
    pub fn report(&self, label: &str) -> String {
        format!(
            "{}:\n  Cells: {}\n  Min: {:.3}\n  Max: {:.3}\n  Mean: {:.3}\n  Median: {:.3}\n  Std Dev: {:.3}\n",
            label, self.count, self.min, self.max, self.mean, self.median, self.std_dev
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn accumulates_and_ignores_nan() {
        let mut acc = FieldAccumulator::default();
        for v in [-70.0, f64::NAN, -80.0, -90.0, f64::INFINITY] {
            acc.push(v);
        }
        let stats = acc.finish().unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean, -80.0);
        assert_eq!(stats.max, -70.0);
        assert_eq!(stats.min, -90.0);
    }

    #[test]
    fn empty_is_none_not_zero() {
        let mut acc = FieldAccumulator::default();
        acc.push(f64::NAN);
        assert_eq!(acc.finish(), None);
    }

    #[test]
    fn merge_matches_single_pass() {
        let values: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.37).sin() * 40.0 - 75.0).collect();
        let mut whole = FieldAccumulator::default();
        values.iter().for_each(|&v| {
            whole.push(v);
        });

        let mut merged = FieldAccumulator::default();
        for chunk in values.chunks(77) {
            let mut part = FieldAccumulator::default();
            chunk.iter().for_each(|&v| {
                part.push(v);
            });
            merged.merge(&part);
        }
        merged.merge(&FieldAccumulator::default());

        let (a, b) = (whole.finish().unwrap(), merged.finish().unwrap());
        assert_eq!(a.count, b.count);
        assert_eq!(a.min, b.min);
        assert_eq!(a.max, b.max);
        assert_relative_eq!(a.mean, b.mean, max_relative = 1e-12);
    }

    #[test]
    fn compensated_sum_is_stable() {
        let mut acc = FieldAccumulator::default();
        acc.push(1e16);
        for _ in 0..10 {
            acc.push(1.0);
        }
        acc.push(-1e16);
        assert_eq!(acc.sum(), 10.0);
    }

    #[test]
    fn series_stats() {
        let s = SeriesStats::compute(&[3.0, 1.0, f64::NAN, 2.0, 4.0]).unwrap();
        assert_eq!(s.count, 4);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.median, 2.5);
        assert_relative_eq!(s.mean, 2.5);
        assert!(s.report("signal_4g mean").contains("Cells: 4"));
        assert!(SeriesStats::compute(&[]).is_none());
    }
}
