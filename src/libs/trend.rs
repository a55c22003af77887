use rayon::prelude::*;

use crate::libs::experiment::Experiment;

pub const DEFAULT_MIN_SUPPORT: u64 = 20;

/// One smoothed point: position, contact rate and the window half-width the
/// rate was computed over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPoint {
    pub pos: u64,
    pub rate: f64,
    pub half_width: u64,
}

/// Adaptive-bandwidth smoothed curve for one group, strictly ascending by
/// position.
#[derive(Debug, Clone)]
pub struct TrendCurve {
    pub group: String,
    pub points: Vec<TrendPoint>,
}

/// Smooth every group with support-driven windows.
///
/// Each window grows symmetrically outward, nearest fragment first, until
/// the cumulative raw UMI count reaches `min_support`. Growth never crosses
/// the bait exclusion gap or the region edge; when one side is exhausted the
/// window keeps growing one-sidedly on the other. The reported rate divides
/// the normalized cumulative count by the window extent, so curves stay
/// comparable across groups while statistical support stays roughly
/// constant along each curve.
pub fn compute(exp: &Experiment, min_support: u64) -> Vec<TrendCurve> {
    let rows = exp.rows();
    let mids = exp.midpoints();
    let n = rows.len();

    // fragments left and right of the bait form separate windows
    let vp = exp.viewpoint().pos();
    let first_right = mids.partition_point(|&m| m < vp);

    exp.groups()
        .par_iter()
        .map(|group| {
            let points: Vec<TrendPoint> = (0..n)
                .map(|i| {
                    let (side_lo, side_hi) = if i < first_right {
                        (0, first_right.saturating_sub(1))
                    } else {
                        (first_right, n - 1)
                    };

                    let p = mids[i];
                    let (mut lo, mut hi) = (i, i);
                    let mut raw = group.raw[i];
                    let mut norm = group.norm[i];

                    while raw < min_support {
                        let left = (lo > side_lo).then(|| p - mids[lo - 1]);
                        let right = (hi < side_hi).then(|| mids[hi + 1] - p);

                        let take_left = match (left, right) {
                            (None, None) => break,
                            (Some(_), None) => true,
                            (None, Some(_)) => false,
                            (Some(l), Some(r)) => l <= r,
                        };
                        if take_left {
                            lo -= 1;
                            raw += group.raw[lo];
                            norm += group.norm[lo];
                        } else {
                            hi += 1;
                            raw += group.raw[hi];
                            norm += group.norm[hi];
                        }
                    }

                    let extent = rows[hi].end - rows[lo].start;
                    let half_width = (p - mids[lo]).max(mids[hi] - p);

                    TrendPoint {
                        pos: p,
                        rate: norm / extent as f64,
                        half_width,
                    }
                })
                .collect();

            TrendCurve {
                group: group.name.clone(),
                points,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::dedup::ContactRow;
    use crate::libs::experiment::{BuildParams, Viewpoint};
    use crate::libs::sample::SampleSheet;
    use approx::assert_relative_eq;

    fn experiment(counts: Vec<(String, Vec<ContactRow>)>) -> Experiment {
        let sheet = SampleSheet::parse(
            "\
sample\treplicate\tcondition\tfile
wt_1\t1\twt\twt_1.tsv
ko_1\t1\tko\tko_1.tsv
",
        )
        .unwrap();
        let viewpoint = Viewpoint::new("chr1", 100_000, 100_500).unwrap();
        Experiment::build(&sheet, &counts, &viewpoint, &BuildParams::default()).unwrap()
    }

    fn contact(start: u64, end: u64, count: u64) -> ContactRow {
        ContactRow {
            chr: "chr1".to_string(),
            start,
            end,
            count,
        }
    }

    #[test]
    fn window_grows_until_support() {
        let exp = experiment(vec![
            (
                "wt_1".to_string(),
                vec![
                    contact(110_000, 111_000, 5),
                    contact(111_000, 112_000, 5),
                    contact(112_000, 113_000, 5),
                    contact(113_000, 114_000, 50),
                ],
            ),
            ("ko_1".to_string(), vec![contact(110_000, 111_000, 5)]),
        ]);
        let curves = compute(&exp, 15);
        let wt = curves.iter().find(|c| c.group == "wt").unwrap();

        // from the first fragment, support 15 needs the three 5-count rows
        let first = &wt.points[0];
        assert_eq!(first.pos, 110_500);
        assert_eq!(first.half_width, 2_000);

        // the 50-count fragment is self-sufficient
        let last = &wt.points[3];
        assert_eq!(last.half_width, 0);
    }

    #[test]
    fn rate_is_count_over_extent() {
        let exp = experiment(vec![
            (
                "wt_1".to_string(),
                vec![contact(110_000, 111_000, 30), contact(111_000, 112_000, 10)],
            ),
            // equal totals keep both normalization factors at 1
            ("ko_1".to_string(), vec![contact(110_000, 111_000, 40)]),
        ]);
        let curves = compute(&exp, 20);
        let wt = curves.iter().find(|c| c.group == "wt").unwrap();

        // first fragment alone reaches support 30 >= 20 over 1 kb
        assert_relative_eq!(wt.points[0].rate, 30.0 / 1_000.0);
        // second fragment needs its neighbor: 40 over [110_000, 112_000)
        assert_relative_eq!(wt.points[1].rate, 40.0 / 2_000.0);
    }

    #[test]
    fn truncated_at_region_edge_when_support_unreachable() {
        let exp = experiment(vec![
            (
                "wt_1".to_string(),
                vec![contact(110_000, 111_000, 3), contact(111_000, 112_000, 4)],
            ),
            ("ko_1".to_string(), vec![contact(110_000, 111_000, 7)]),
        ]);
        let curves = compute(&exp, 1_000);
        let wt = curves.iter().find(|c| c.group == "wt").unwrap();

        // support can never be reached; the window covers what exists
        assert_relative_eq!(wt.points[0].rate, 7.0 / 2_000.0);
        assert_relative_eq!(wt.points[1].rate, 7.0 / 2_000.0);
    }

    #[test]
    fn windows_do_not_cross_the_bait_gap() {
        let exp = experiment(vec![
            (
                "wt_1".to_string(),
                vec![
                    contact(90_000, 91_000, 2),  // left of the viewpoint
                    contact(110_000, 111_000, 2),
                    contact(111_000, 112_000, 2),
                ],
            ),
            ("ko_1".to_string(), vec![contact(110_000, 111_000, 6)]),
        ]);
        let curves = compute(&exp, 100);
        let wt = curves.iter().find(|c| c.group == "wt").unwrap();

        // the left-side window is stuck at its own fragment
        assert_eq!(wt.points[0].pos, 90_500);
        assert_eq!(wt.points[0].half_width, 0);
        assert_relative_eq!(wt.points[0].rate, 2.0 / 1_000.0);

        // right-side windows cover only the right side
        assert_relative_eq!(wt.points[1].rate, 4.0 / 2_000.0);
    }

    #[test]
    fn points_strictly_ascending_per_group() {
        let exp = experiment(vec![
            (
                "wt_1".to_string(),
                vec![
                    contact(110_000, 111_000, 5),
                    contact(130_000, 131_000, 5),
                    contact(120_000, 121_000, 5),
                ],
            ),
            ("ko_1".to_string(), vec![contact(110_000, 111_000, 5)]),
        ]);
        for curve in compute(&exp, 10) {
            for w in curve.points.windows(2) {
                assert!(w[0].pos < w[1].pos);
            }
        }
    }
}
