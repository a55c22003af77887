use rayon::prelude::*;

use crate::libs::experiment::{Experiment, FragmentRow};

pub const DEFAULT_MAX_SCALE: u64 = 65_536;

/// Multi-scale smoothed intensity grid for one group:
/// `values[scale][position]`.
#[derive(Debug, Clone)]
pub struct Domainogram {
    pub group: String,
    pub scales: Vec<u64>,
    pub midpoints: Vec<u64>,
    pub values: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Copy)]
pub struct DomainogramParams {
    /// Largest window half-width to compute
    pub max_scale: u64,
    /// Report counts per base instead of window sums
    pub per_base: bool,
}

impl Default for DomainogramParams {
    fn default() -> Self {
        Self {
            max_scale: DEFAULT_MAX_SCALE,
            per_base: false,
        }
    }
}

/// Window half-widths from one fragment width up to the bound, doubling.
fn scale_progression(rows: &[FragmentRow], max_scale: u64) -> Vec<u64> {
    let base = rows
        .iter()
        .map(|r| r.width())
        .min()
        .unwrap_or(1)
        .max(1);

    let mut scales = vec![base];
    let mut scale = base;
    while scale.saturating_mul(2) <= max_scale {
        scale *= 2;
        scales.push(scale);
    }
    scales
}

/// Smooth every group over the scale progression. For scale `s` and fragment
/// midpoint `p`, the cell value is the sum of counts of all fragments whose
/// midpoint lies within `s` of `p`. Sparse windows are 0.
///
/// Groups are independent; computed on the current rayon pool.
pub fn compute(exp: &Experiment, params: &DomainogramParams) -> Vec<Domainogram> {
    let mids = exp.midpoints();
    let scales = scale_progression(exp.rows(), params.max_scale);
    let n = mids.len();

    exp.groups()
        .par_iter()
        .map(|group| {
            let mut prefix = vec![0.0; n + 1];
            for (i, &c) in group.norm.iter().enumerate() {
                prefix[i + 1] = prefix[i] + c;
            }

            let values: Vec<Vec<f64>> = scales
                .iter()
                .map(|&scale| {
                    let mut lo = 0;
                    let mut hi = 0;
                    mids.iter()
                        .map(|&p| {
                            while mids[lo] + scale < p {
                                lo += 1;
                            }
                            while hi < n && mids[hi] <= p + scale {
                                hi += 1;
                            }
                            let sum = prefix[hi] - prefix[lo];
                            if params.per_base {
                                sum / (2 * scale) as f64
                            } else {
                                sum
                            }
                        })
                        .collect()
                })
                .collect();

            Domainogram {
                group: group.name.clone(),
                scales: scales.clone(),
                midpoints: mids.clone(),
                values,
            }
        })
        .collect()
}
