//! Single-pass metric accumulation
//!
//! Sums use Kahan compensated summation so that the same input always rounds
//! to the same two-decimal result.

use crate::query::plan::AggregateFunction;

/// Running min/max/sum/count over a stream of metric values
#[derive(Debug, Clone, Copy, Default)]
pub struct Accumulator {
    sum: f64,
    compensation: f64,
    min: Option<f64>,
    max: Option<f64>,
    count: u64,
}

impl Accumulator {
    /// Empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one value in
    #[inline]
    pub fn push(&mut self, value: f64) {
        let y = value - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;

        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
        self.count += 1;
    }

    /// Values folded in so far
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sum of values, `None` over an empty input
    pub fn sum(&self) -> Option<f64> {
        (self.count > 0).then_some(self.sum)
    }

    /// Smallest value seen
    pub fn min(&self) -> Option<f64> {
        self.min
    }

    /// Largest value seen
    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// Mean, `None` over an empty input
    pub fn avg(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Final value of `func`, `None` when the aggregate is null
    pub fn finish(&self, func: AggregateFunction) -> Option<f64> {
        match func {
            AggregateFunction::Sum => self.sum(),
            AggregateFunction::Min => self.min(),
            AggregateFunction::Max => self.max(),
            AggregateFunction::Avg => self.avg(),
            AggregateFunction::Count => Some(self.count as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_accumulator() {
        let acc = Accumulator::new();
        assert_eq!(acc.finish(AggregateFunction::Sum), None);
        assert_eq!(acc.finish(AggregateFunction::Avg), None);
        assert_eq!(acc.finish(AggregateFunction::Min), None);
        assert_eq!(acc.finish(AggregateFunction::Count), Some(0.0));
    }

    #[test]
    fn test_all_functions() {
        let mut acc = Accumulator::new();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            acc.push(v);
        }
        assert_eq!(acc.finish(AggregateFunction::Sum), Some(15.0));
        assert_eq!(acc.finish(AggregateFunction::Min), Some(1.0));
        assert_eq!(acc.finish(AggregateFunction::Max), Some(5.0));
        assert_eq!(acc.finish(AggregateFunction::Avg), Some(3.0));
        assert_eq!(acc.finish(AggregateFunction::Count), Some(5.0));
    }

    #[test]
    fn test_compensated_sum() {
        let mut acc = Accumulator::new();
        for _ in 0..10 {
            acc.push(0.1);
        }
        let sum = acc.sum().unwrap();
        assert!((sum - 1.0).abs() < 1e-15, "sum drifted: {sum}");
    }
}
