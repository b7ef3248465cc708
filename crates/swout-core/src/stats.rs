//! Online mean and standard deviation across repeated iterations.
//!
//! Welford's update: with `n` the 1-based iteration,
//! `mean += (x - mean) / n` and `ss += (x - mean_before) * (x - mean_after)`.
//! The sample standard deviation is `sqrt(ss / (n - 1))`, or 0 for a
//! single iteration.

/// Running mean and sum of squared deviations of one value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStat {
    pub mean: f64,
    pub ss: f64,
}

impl RunningStat {
    /// Add the value of iteration `n` (1-based).
    pub fn update(&mut self, n: usize, x: f64) {
        let n = n.max(1) as f64;
        let before = self.mean;
        self.mean += (x - before) / n;
        self.ss += (x - before) * (x - self.mean);
    }

    /// Sample standard deviation after `n` iterations.
    pub fn sd(&self, n: usize) -> f64 {
        if n > 1 {
            (self.ss / (n - 1) as f64).sqrt()
        } else {
            0.0
        }
    }
}

/// Parallel running statistics over a flat buffer of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningCells {
    mean: Vec<f64>,
    ss: Vec<f64>,
}

impl RunningCells {
    pub fn new(len: usize) -> Self {
        Self {
            mean: vec![0.0; len],
            ss: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Add the value of iteration `n` (1-based) to cell `idx`.
    pub fn update(&mut self, idx: usize, n: usize, x: f64) {
        let mut cell = RunningStat {
            mean: self.mean[idx],
            ss: self.ss[idx],
        };
        cell.update(n, x);
        self.mean[idx] = cell.mean;
        self.ss[idx] = cell.ss;
    }

    /// Store a value as-is, for cells that are not statistics (time
    /// columns).
    pub fn set(&mut self, idx: usize, x: f64) {
        self.mean[idx] = x;
        self.ss[idx] = 0.0;
    }

    pub fn mean(&self, idx: usize) -> f64 {
        self.mean[idx]
    }

    pub fn sd(&self, idx: usize, n: usize) -> f64 {
        RunningStat {
            mean: self.mean[idx],
            ss: self.ss[idx],
        }
        .sd(n)
    }

    pub fn means(&self) -> &[f64] {
        &self.mean
    }

    pub fn reset(&mut self) {
        self.mean.fill(0.0);
        self.ss.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE: [f64; 8] = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];

    #[test]
    fn welford_matches_sample_statistics() {
        let mut s = RunningStat::default();
        for (i, x) in SAMPLE.iter().enumerate() {
            s.update(i + 1, *x);
        }
        assert_relative_eq!(s.mean, 5.0, epsilon = 1e-12);
        assert_relative_eq!(s.sd(SAMPLE.len()), 2.138089935, epsilon = 1e-9);
    }

    #[test]
    fn single_iteration_has_zero_sd() {
        let mut s = RunningStat::default();
        s.update(1, 3.5);
        assert_eq!(s.mean, 3.5);
        assert_eq!(s.sd(1), 0.0);
        assert_eq!(s.sd(0), 0.0);
    }

    #[test]
    fn cells_are_independent() {
        let mut cells = RunningCells::new(3);
        for (i, x) in SAMPLE.iter().enumerate() {
            cells.update(1, i + 1, *x);
            cells.update(2, i + 1, 1.0);
        }
        cells.set(0, 2023.0);
        assert_eq!(cells.mean(0), 2023.0);
        assert_relative_eq!(cells.mean(1), 5.0, epsilon = 1e-12);
        assert_relative_eq!(cells.sd(1, 8), 2.138089935, epsilon = 1e-9);
        assert_relative_eq!(cells.mean(2), 1.0);
        assert_eq!(cells.sd(2, 8), 0.0);

        cells.reset();
        assert!(cells.means().iter().all(|m| *m == 0.0));
    }
}
