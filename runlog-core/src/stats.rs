//! Typed view over expectation-value statistics records.
//!
//! Simulation logs store per-iteration estimator statistics as co-indexed
//! arrays keyed `Mean`, `Sigma`, `Variance`, `TauCorr`, and `R_hat`. This
//! module offers a borrowed view that pairs them back into scalar samples.

use runlog_types::Value;
use std::fmt;

/// One statistics sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub mean: f64,
    pub error_of_mean: f64,
    pub variance: f64,
    pub tau_corr: f64,
    pub r_hat: f64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ± {} [σ²={}, τ={}, R̂={}]",
            self.mean, self.error_of_mean, self.variance, self.tau_corr, self.r_hat
        )
    }
}

/// Borrowed view over the five co-indexed stat arrays of a map or history
/// node.
#[derive(Debug, Clone, Copy)]
pub struct StatsSeries<'a> {
    mean: &'a [f64],
    sigma: &'a [f64],
    variance: &'a [f64],
    tau_corr: &'a [f64],
    r_hat: &'a [f64],
}

impl<'a> StatsSeries<'a> {
    /// Interpret `node` as a statistics record.
    ///
    /// Returns `None` unless all five arrays are present as real-valued
    /// leaves of a single length (complex means are not a stats record).
    pub fn from_value(node: &'a Value) -> Option<Self> {
        let field = |name: &str| -> Option<&'a [f64]> {
            let child = match node {
                Value::Map(map) => map.get(name),
                Value::History(hist) => hist.series(name),
                _ => None,
            }?;
            child.as_array()
        };
        let mean = field("Mean")?;
        let sigma = field("Sigma")?;
        let variance = field("Variance")?;
        let tau_corr = field("TauCorr")?;
        let r_hat = field("R_hat")?;
        let len = mean.len();
        if [sigma, variance, tau_corr, r_hat]
            .iter()
            .any(|xs| xs.len() != len)
        {
            return None;
        }
        Some(Self {
            mean,
            sigma,
            variance,
            tau_corr,
            r_hat,
        })
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// The i-th sample, if in range.
    pub fn get(&self, i: usize) -> Option<Stats> {
        if i >= self.len() {
            return None;
        }
        Some(Stats {
            mean: self.mean[i],
            error_of_mean: self.sigma[i],
            variance: self.variance[i],
            tau_corr: self.tau_corr[i],
            r_hat: self.r_hat[i],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Stats> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }
}
