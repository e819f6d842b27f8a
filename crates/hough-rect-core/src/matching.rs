//! Grouping of Hough line peaks into rectangle hypotheses.
//!
//! Working on peaks measured from a window center:
//!
//! 1. Peaks belonging to the same line are merged by single-linkage
//!    clustering within `t_theta`/`t_rho`, each cluster replaced by its
//!    vote-weighted center of mass.
//! 2. Two lines form a [`SidePair`] when they are parallel within `t_theta`,
//!    placed symmetrically about the center (`|ρi + ρj| <= t_rho`) and have
//!    similar heights (`|Ci - Cj| <= t_length * (Ci + Cj) / 2`). Opposite sides
//!    of a rectangle have equal lengths, hence equal vote counts.
//! 3. Two side pairs whose orientations differ by 90° within `t_alpha` form a
//!    [`RectangleHypothesis`].
//!
//! Lines are compared modulo 180°: `(ρ, θ)` and `(-ρ, θ ± 180°)` describe the
//! same line, which matters at the ends of a `[-90°, 90°]` θ axis.
use core::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "tracing")]
use tracing::instrument;

/// A decoded accumulator peak.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinePeak {
    /// Signed distance of the line from the origin, in pixels.
    pub rho: f32,
    /// Orientation of the line normal, in degrees.
    pub theta: f32,
    /// Accumulator height at the peak.
    pub votes: f32,
}

/// Geometric tolerances of the matcher.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchParams {
    /// Maximum angle difference between parallel sides (degrees).
    pub t_theta: f32,
    /// Maximum `|ρi + ρj|` of a side pair, i.e. how far the pair's mid-line
    /// may sit from the window center (pixels).
    pub t_rho: f32,
    /// Maximum relative difference of the two sides' vote heights.
    pub t_length: f32,
    /// Maximum deviation from 90° between the two side pairs (degrees).
    pub t_alpha: f32,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            t_theta: 3.0,
            t_rho: 3.0,
            t_length: 0.4,
            t_alpha: 3.0,
        }
    }
}

/// Two parallel, opposite sides of a rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SidePair {
    /// Common normal orientation in degrees, in `[-90, 90)`.
    pub theta: f32,
    /// Half the distance between the two sides (ξ).
    pub half_width: f32,
    /// Signed distance of the pair's mid-line from the origin along the normal.
    pub offset: f32,
    /// Mean vote height of the two sides.
    pub votes: f32,
}

/// Two perpendicular side pairs.
///
/// `sides[0]` is the pair whose normal is closest to 0°.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RectangleHypothesis {
    pub sides: [SidePair; 2],
}

impl RectangleHypothesis {
    fn new(a: SidePair, b: SidePair) -> Self {
        let swap = match a.theta.abs().total_cmp(&b.theta.abs()) {
            Ordering::Greater => true,
            Ordering::Equal => a.theta > b.theta,
            Ordering::Less => false,
        };
        if swap {
            Self { sides: [b, a] }
        } else {
            Self { sides: [a, b] }
        }
    }

    /// Normal orientation of the first side pair, in degrees.
    pub fn orientation(&self) -> f32 {
        self.sides[0].theta
    }

    /// Extent along the first pair's normal.
    pub fn width(&self) -> f32 {
        2.0 * self.sides[0].half_width
    }

    /// Extent along the second pair's normal.
    pub fn height(&self) -> f32 {
        2.0 * self.sides[1].half_width
    }

    pub fn score(&self) -> f32 {
        self.sides[0].votes + self.sides[1].votes
    }

    /// Rectangle center relative to the origin the peaks were measured from.
    pub fn center_offset(&self) -> [f32; 2] {
        let mut c = [0.0f32; 2];
        for s in &self.sides {
            let t = s.theta.to_radians();
            c[0] += s.offset * t.cos();
            c[1] += s.offset * t.sin();
        }
        c
    }
}

/// Express `(theta, rho)` on the branch closest to `reference` (degrees).
#[inline]
fn align(reference: f32, theta: f32, rho: f32) -> (f32, f32) {
    if theta - reference > 90.0 {
        (theta - 180.0, -rho)
    } else if reference - theta > 90.0 {
        (theta + 180.0, -rho)
    } else {
        (theta, rho)
    }
}

/// Bring `theta` into `[-90, 90)`, negating `rho` on every half-turn.
fn wrap_theta(mut theta: f32, mut rho: f32) -> (f32, f32) {
    while theta >= 90.0 {
        theta -= 180.0;
        rho = -rho;
    }
    while theta < -90.0 {
        theta += 180.0;
        rho = -rho;
    }
    (theta, rho)
}

fn canonical_order(a: &LinePeak, b: &LinePeak) -> Ordering {
    b.votes
        .total_cmp(&a.votes)
        .then(a.theta.total_cmp(&b.theta))
        .then(a.rho.total_cmp(&b.rho))
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Merge peaks that describe the same line.
///
/// Peaks within `t_theta` and `t_rho` of each other (after angle alignment)
/// are linked; each connected group is replaced by its vote-weighted center
/// of mass, measured on the branch of its strongest member, carrying the
/// group's maximum height. Output is ordered by the strongest member.
pub fn cluster_peaks(peaks: &[LinePeak], t_theta: f32, t_rho: f32) -> Vec<LinePeak> {
    let mut sorted: Vec<LinePeak> = peaks
        .iter()
        .copied()
        .filter(|p| p.rho.is_finite() && p.theta.is_finite() && p.votes.is_finite())
        .collect();
    sorted.sort_by(canonical_order);

    let n = sorted.len();
    let mut parent: Vec<usize> = (0..n).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            let (tj, rj) = align(sorted[i].theta, sorted[j].theta, sorted[j].rho);
            if (tj - sorted[i].theta).abs() <= t_theta && (rj - sorted[i].rho).abs() <= t_rho {
                let a = find_root(&mut parent, i);
                let b = find_root(&mut parent, j);
                if a != b {
                    // the root is always the strongest member
                    parent[a.max(b)] = a.min(b);
                }
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        let root = find_root(&mut parent, i);
        groups[root].push(i);
    }

    let mut out = Vec::new();
    for (root, members) in groups.iter().enumerate() {
        if members.is_empty() {
            continue;
        }
        let seed = sorted[root];
        let mut sw = 0.0f32;
        let mut st = 0.0f32;
        let mut sr = 0.0f32;
        let mut max_votes = seed.votes;
        for &m in members {
            let p = sorted[m];
            let (t, r) = align(seed.theta, p.theta, p.rho);
            sw += p.votes;
            st += p.votes * t;
            sr += p.votes * r;
            max_votes = max_votes.max(p.votes);
        }
        let (theta, rho) = if sw > 0.0 {
            wrap_theta(st / sw, sr / sw)
        } else {
            (seed.theta, seed.rho)
        };
        out.push(LinePeak {
            rho,
            theta,
            votes: max_votes,
        });
    }
    out
}

/// Pair up parallel, center-symmetric lines of similar height.
///
/// Expects already clustered peaks. Every unordered pair is examined once.
pub fn pair_parallel_peaks(peaks: &[LinePeak], params: &MatchParams) -> Vec<SidePair> {
    let mut pairs = Vec::new();
    for (i, pi) in peaks.iter().enumerate() {
        for pj in &peaks[i + 1..] {
            let (tj, rj) = align(pi.theta, pj.theta, pj.rho);
            if (pi.theta - tj).abs() > params.t_theta {
                continue;
            }
            if (pi.rho + rj).abs() > params.t_rho {
                continue;
            }
            if (pi.votes - pj.votes).abs() > params.t_length * (pi.votes + pj.votes) * 0.5 {
                continue;
            }
            let half_width = (pi.rho - rj).abs() * 0.5;
            if half_width <= f32::EPSILON {
                continue;
            }
            let (theta, offset) = wrap_theta((pi.theta + tj) * 0.5, (pi.rho + rj) * 0.5);
            pairs.push(SidePair {
                theta,
                half_width,
                offset,
                votes: (pi.votes + pj.votes) * 0.5,
            });
        }
    }
    pairs
}

fn hypothesis_order(a: &RectangleHypothesis, b: &RectangleHypothesis) -> Ordering {
    b.score()
        .total_cmp(&a.score())
        .then(a.orientation().total_cmp(&b.orientation()))
        .then(a.width().total_cmp(&b.width()))
        .then(a.height().total_cmp(&b.height()))
}

/// Find rectangle hypotheses among line peaks.
///
/// The result does not depend on the order of `peaks`. Returns an empty
/// vector when nothing matches.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(peaks, params), fields(peaks = peaks.len()))
)]
pub fn match_maximums(peaks: &[LinePeak], params: &MatchParams) -> Vec<RectangleHypothesis> {
    let lines = cluster_peaks(peaks, params.t_theta, params.t_rho);
    let pairs = pair_parallel_peaks(&lines, params);

    let mut out = Vec::new();
    for (k, pk) in pairs.iter().enumerate() {
        for pl in &pairs[k + 1..] {
            let d = (pk.theta - pl.theta).abs() % 180.0;
            if (d - 90.0).abs() <= params.t_alpha {
                out.push(RectangleHypothesis::new(*pk, *pl));
            }
        }
    }
    out.sort_by(hypothesis_order);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(rho: f32, theta: f32, votes: f32) -> LinePeak {
        LinePeak { rho, theta, votes }
    }

    /// Sides of a 20 x 12 axis-aligned rectangle centered on the origin.
    /// The two horizontal sides are reported at opposite θ ends.
    fn rectangle_peaks() -> Vec<LinePeak> {
        vec![
            peak(-10.0, 0.0, 13.0),
            peak(10.0, 0.0, 13.0),
            peak(6.0, -90.0, 21.0),
            peak(6.0, 90.0, 21.0),
        ]
    }

    #[test]
    fn axis_aligned_rectangle_is_matched_once() {
        let rects = match_maximums(&rectangle_peaks(), &MatchParams::default());
        assert_eq!(rects.len(), 1);
        let r = rects[0];
        assert_eq!(r.orientation(), 0.0);
        assert!((r.width() - 20.0).abs() < 1e-5);
        assert!((r.height() - 12.0).abs() < 1e-5);
        assert_eq!(r.sides[1].theta, -90.0);
        let c = r.center_offset();
        assert!(c[0].abs() < 1e-5 && c[1].abs() < 1e-5);
        assert!((r.score() - 34.0).abs() < 1e-5);
    }

    #[test]
    fn result_is_independent_of_input_order() {
        let mut peaks = rectangle_peaks();
        peaks.push(peak(3.0, 45.0, 9.0));
        peaks.push(peak(-3.0, 45.0, 9.0));
        peaks.push(peak(-2.0, -44.0, 9.5));
        peaks.push(peak(2.0, -45.0, 9.0));
        peaks.push(peak(-10.0, 1.0, 12.0));

        let reference = match_maximums(&peaks, &MatchParams::default());
        assert!(!reference.is_empty());

        let mut reversed = peaks.clone();
        reversed.reverse();
        assert_eq!(match_maximums(&reversed, &MatchParams::default()), reference);

        let mut rotated = peaks.clone();
        rotated.rotate_left(3);
        assert_eq!(match_maximums(&rotated, &MatchParams::default()), reference);
    }

    #[test]
    fn no_rectangle_when_angles_are_far_apart() {
        let peaks = vec![
            peak(-5.0, -60.0, 10.0),
            peak(5.0, -20.0, 10.0),
            peak(4.0, 20.0, 10.0),
            peak(-4.0, 60.0, 10.0),
        ];
        assert!(match_maximums(&peaks, &MatchParams::default()).is_empty());
        assert!(match_maximums(&[], &MatchParams::default()).is_empty());
    }

    #[test]
    fn plateau_of_peaks_collapses_to_its_center() {
        let peaks: Vec<_> = (-3..=3)
            .map(|t| peak(-10.0, t as f32, 13.0))
            .collect();
        let lines = cluster_peaks(&peaks, 1.5, 1.5);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].theta.abs() < 1e-5);
        assert_eq!(lines[0].rho, -10.0);
        assert_eq!(lines[0].votes, 13.0);
    }

    #[test]
    fn clustering_links_across_the_theta_ends() {
        let peaks = vec![peak(6.0, -89.0, 20.0), peak(-6.0, 90.0, 10.0)];
        let lines = cluster_peaks(&peaks, 3.0, 1.0);
        assert_eq!(lines.len(), 1);
        // (−6, 90) is (6, −90) on the strongest member's branch
        assert!((lines[0].theta - (-89.0 - 1.0 / 3.0)).abs() < 1e-4);
        assert!((lines[0].rho - 6.0).abs() < 1e-5);
    }

    #[test]
    fn unequal_side_heights_are_rejected() {
        let peaks = vec![peak(-10.0, 0.0, 10.0), peak(10.0, 0.0, 30.0)];
        assert!(pair_parallel_peaks(&peaks, &MatchParams::default()).is_empty());
        let loose = MatchParams {
            t_length: 1.5,
            ..MatchParams::default()
        };
        assert_eq!(pair_parallel_peaks(&peaks, &loose).len(), 1);
    }

    #[test]
    fn off_center_pairs_need_a_wider_rho_tolerance() {
        let peaks = vec![
            peak(-8.0, 0.0, 13.0),
            peak(12.0, 0.0, 13.0),
            peak(6.0, -90.0, 21.0),
            peak(-6.0, -90.0, 21.0),
        ];
        assert!(match_maximums(&peaks, &MatchParams::default()).is_empty());

        let wide = MatchParams {
            t_rho: 5.0,
            ..MatchParams::default()
        };
        let rects = match_maximums(&peaks, &wide);
        assert_eq!(rects.len(), 1);
        let c = rects[0].center_offset();
        assert!((c[0] - 2.0).abs() < 1e-4, "center {c:?}");
        assert!(c[1].abs() < 1e-4);
    }

    #[test]
    fn zero_width_pairs_are_skipped() {
        let peaks = vec![peak(0.0, 10.0, 5.0), peak(0.0, 12.0, 5.0)];
        assert!(pair_parallel_peaks(&peaks, &MatchParams::default()).is_empty());
    }
}
