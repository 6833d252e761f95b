//! Westgard rule predicates.
//!
//! Each rule is an independent pure function over a [`RuleContext`]: the
//! current observation, its same-run peers, and its same-level history
//! in chronological order. A rule that lacks enough history is simply
//! not violated.
//!
//! # References
//!
//! - Westgard, J.O. et al. (1981). "A multi-rule Shewhart chart for quality
//!   control in clinical chemistry", *Clinical Chemistry* 27(3), pp. 493-501.
//! - Westgard, J.O. (2016). *Basic QC Practices*, 4th ed., Chapter 9.

use super::observation::Observation;
use super::violation::{RuleCode, RuleViolation};

/// Signature shared by every rule predicate.
pub(crate) type RuleCheck = fn(&RuleContext<'_>) -> Option<RuleViolation>;

/// Reject-class rules in evaluation order.
pub(crate) const REJECT_RULES: [(RuleCode, RuleCheck); 11] = [
    (RuleCode::OneThreeS, check_1_3s),
    (RuleCode::TwoTwoSWithin, check_2_2s_within),
    (RuleCode::TwoTwoSAcross, check_2_2s_across),
    (RuleCode::RangeFourS, check_r_4s),
    (RuleCode::FourOneS, check_4_1s),
    (RuleCode::TenX, check_10x),
    (RuleCode::TwoOfThreeTwoS, check_2of3_2s),
    (RuleCode::ThreeOneS, check_3_1s),
    (RuleCode::SixX, check_6x),
    (RuleCode::NineX, check_9x),
    (RuleCode::SevenT, check_7t),
];

/// The single warning-class rule.
pub(crate) const WARNING_RULE: (RuleCode, RuleCheck) = (RuleCode::OneTwoS, check_1_2s);

/// Scoped views of the history for one evaluation.
pub(crate) struct RuleContext<'a> {
    current: &'a Observation,
    /// Same run as `current`, any level, `current` excluded.
    run_peers: Vec<&'a Observation>,
    /// Same level as `current`, not later than it, oldest first, `current` excluded.
    level_series: Vec<&'a Observation>,
}

impl<'a> RuleContext<'a> {
    pub(crate) fn new(
        current: &'a Observation,
        run_history: &'a [Observation],
        level_history: &'a [Observation],
    ) -> Self {
        let run_peers = run_history
            .iter()
            .filter(|o| o.id != current.id && o.run_id == current.run_id)
            .collect();

        let mut level_series: Vec<&Observation> = level_history
            .iter()
            .filter(|o| {
                o.id != current.id && o.level == current.level && o.timestamp <= current.timestamp
            })
            .collect();
        // stable: equal timestamps keep caller order
        level_series.sort_by_key(|o| o.timestamp);

        Self {
            current,
            run_peers,
            level_series,
        }
    }

    pub(crate) fn current(&self) -> &'a Observation {
        self.current
    }

    /// The `n` same-level points immediately before `current`, oldest
    /// first, or `None` if fewer than `n` exist.
    fn preceding(&self, n: usize) -> Option<&[&'a Observation]> {
        let len = self.level_series.len();
        if len < n {
            return None;
        }
        Some(&self.level_series[len - n..])
    }

    /// `current` preceded by its `n` predecessors, oldest first.
    fn window(&self, n: usize) -> Option<Vec<&'a Observation>> {
        let mut points = self.preceding(n)?.to_vec();
        points.push(self.current);
        Some(points)
    }
}

fn ids(points: &[&Observation]) -> Vec<String> {
    points.iter().map(|o| o.id.clone()).collect()
}

fn same_side(a: &Observation, b: &Observation) -> bool {
    a.side() != 0 && a.side() == b.side()
}

/// All points beyond `limit` SD (strictly) on one common side.
fn all_beyond_same_side(points: &[&Observation], limit: f64) -> bool {
    let side = points[0].side();
    side != 0
        && points
            .iter()
            .all(|o| o.side() == side && o.z_score.abs() > limit)
}

/// All points on one common, non-zero side of the mean.
fn all_same_side(points: &[&Observation]) -> bool {
    let side = points[0].side();
    side != 0 && points.iter().all(|o| o.side() == side)
}

fn side_word(o: &Observation) -> &'static str {
    if o.side() > 0 {
        "above"
    } else {
        "below"
    }
}

/// 1_3s: `|z| >= 3`.
fn check_1_3s(ctx: &RuleContext<'_>) -> Option<RuleViolation> {
    let cur = ctx.current;
    if cur.z_score.abs() < 3.0 || !cur.z_score.is_finite() {
        return None;
    }
    Some(RuleViolation::new(
        RuleCode::OneThreeS,
        format!("1_3s: z = {:.2} is beyond ±3 SD", cur.z_score),
        vec![cur.id.clone()],
    ))
}

/// 1_2s (warning): `2 <= |z| < 3`.
fn check_1_2s(ctx: &RuleContext<'_>) -> Option<RuleViolation> {
    let cur = ctx.current;
    let z = cur.z_score.abs();
    if !(2.0..3.0).contains(&z) {
        return None;
    }
    Some(RuleViolation::new(
        RuleCode::OneTwoS,
        format!("1_2s warning: z = {:.2} is beyond ±2 SD", cur.z_score),
        vec![cur.id.clone()],
    ))
}

/// 2_2s within run: current and another same-run point beyond 2 SD on
/// the same side.
fn check_2_2s_within(ctx: &RuleContext<'_>) -> Option<RuleViolation> {
    let cur = ctx.current;
    if cur.z_score.abs() < 2.0 {
        return None;
    }
    let partners: Vec<&Observation> = ctx
        .run_peers
        .iter()
        .copied()
        .filter(|o| o.z_score.abs() >= 2.0 && same_side(o, cur))
        .collect();
    if partners.is_empty() {
        return None;
    }
    let mut points = partners;
    points.push(cur);
    Some(RuleViolation::new(
        RuleCode::TwoTwoSWithin,
        format!(
            "2_2s within run: {} points in run {} {} 2 SD",
            points.len(),
            cur.run_id,
            side_word(cur)
        ),
        ids(&points),
    ))
}

/// 2_2s across runs: current and the previous same-level point beyond
/// 2 SD on the same side.
fn check_2_2s_across(ctx: &RuleContext<'_>) -> Option<RuleViolation> {
    let cur = ctx.current;
    if cur.z_score.abs() < 2.0 {
        return None;
    }
    let points = ctx.window(1)?;
    let prev = points[0];
    if prev.z_score.abs() < 2.0 || !same_side(prev, cur) {
        return None;
    }
    Some(RuleViolation::new(
        RuleCode::TwoTwoSAcross,
        format!(
            "2_2s across runs: 2 consecutive {} points {} 2 SD",
            cur.level,
            side_word(cur)
        ),
        ids(&points),
    ))
}

/// R_4s: a same-run point on the opposite side with `|z_cur - z_other| >= 4`.
///
/// The widest qualifying pair is reported.
fn check_r_4s(ctx: &RuleContext<'_>) -> Option<RuleViolation> {
    let cur = ctx.current;
    let other = ctx
        .run_peers
        .iter()
        .copied()
        .filter(|o| o.side() != 0 && cur.side() != 0 && o.side() != cur.side())
        .filter(|o| (cur.z_score - o.z_score).abs() >= 4.0)
        .max_by(|a, b| {
            let ra = (cur.z_score - a.z_score).abs();
            let rb = (cur.z_score - b.z_score).abs();
            ra.total_cmp(&rb)
        })?;
    let range = (cur.z_score - other.z_score).abs();
    Some(RuleViolation::new(
        RuleCode::RangeFourS,
        format!("R_4s: range of {range:.2} SD within run {}", cur.run_id),
        ids(&[other, cur]),
    ))
}

/// 4_1s: current and 3 preceding same-level points beyond 1 SD, same side.
fn check_4_1s(ctx: &RuleContext<'_>) -> Option<RuleViolation> {
    consecutive_beyond(ctx, RuleCode::FourOneS, 4, 1.0)
}

/// 3_1s: current and 2 preceding same-level points beyond 1 SD, same side.
fn check_3_1s(ctx: &RuleContext<'_>) -> Option<RuleViolation> {
    consecutive_beyond(ctx, RuleCode::ThreeOneS, 3, 1.0)
}

fn consecutive_beyond(
    ctx: &RuleContext<'_>,
    rule: RuleCode,
    count: usize,
    limit: f64,
) -> Option<RuleViolation> {
    let points = ctx.window(count - 1)?;
    if !all_beyond_same_side(&points, limit) {
        return None;
    }
    Some(RuleViolation::new(
        rule,
        format!(
            "{rule}: {count} consecutive {} points {} {limit} SD",
            ctx.current.level,
            side_word(ctx.current)
        ),
        ids(&points),
    ))
}

/// 10x: 10 consecutive same-level points on the same side of the mean.
fn check_10x(ctx: &RuleContext<'_>) -> Option<RuleViolation> {
    consecutive_same_side(ctx, RuleCode::TenX, 10)
}

/// 6x: 6 consecutive same-level points on the same side of the mean.
fn check_6x(ctx: &RuleContext<'_>) -> Option<RuleViolation> {
    consecutive_same_side(ctx, RuleCode::SixX, 6)
}

/// 9x: 9 consecutive same-level points on the same side of the mean.
fn check_9x(ctx: &RuleContext<'_>) -> Option<RuleViolation> {
    consecutive_same_side(ctx, RuleCode::NineX, 9)
}

fn consecutive_same_side(
    ctx: &RuleContext<'_>,
    rule: RuleCode,
    count: usize,
) -> Option<RuleViolation> {
    let points = ctx.window(count - 1)?;
    if !all_same_side(&points) {
        return None;
    }
    Some(RuleViolation::new(
        rule,
        format!(
            "{rule}: {count} consecutive {} points {} the mean",
            ctx.current.level,
            side_word(ctx.current)
        ),
        ids(&points),
    ))
}

/// 2of3_2s: current beyond 2 SD and at least one of the 2 preceding
/// same-level points beyond 2 SD on the same side.
fn check_2of3_2s(ctx: &RuleContext<'_>) -> Option<RuleViolation> {
    let cur = ctx.current;
    if cur.z_score.abs() < 2.0 {
        return None;
    }
    let window = ctx.window(2)?;
    let mut points: Vec<&Observation> = window[..2]
        .iter()
        .copied()
        .filter(|o| o.z_score.abs() >= 2.0 && same_side(o, cur))
        .collect();
    if points.is_empty() {
        return None;
    }
    points.push(cur);
    Some(RuleViolation::new(
        RuleCode::TwoOfThreeTwoS,
        format!(
            "2of3_2s: {} of the last 3 {} points {} 2 SD",
            points.len(),
            cur.level,
            side_word(cur)
        ),
        ids(&points),
    ))
}

/// 7T: current and 6 preceding same-level values strictly increasing or
/// strictly decreasing in time order. Uses raw values, not z-scores.
fn check_7t(ctx: &RuleContext<'_>) -> Option<RuleViolation> {
    let points = ctx.window(6)?;
    let rising = points.windows(2).all(|w| w[1].value > w[0].value);
    let falling = points.windows(2).all(|w| w[1].value < w[0].value);
    if !rising && !falling {
        return None;
    }
    Some(RuleViolation::new(
        RuleCode::SevenT,
        format!(
            "7T: 7 consecutive {} values {}",
            ctx.current.level,
            if rising { "increasing" } else { "decreasing" }
        ),
        ids(&points),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(i: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap() + Duration::days(i)
    }

    /// Same-level series from z-scores; ids "p0".."pn", one run per point.
    fn series(z: &[f64]) -> Vec<Observation> {
        z.iter()
            .enumerate()
            .map(|(i, &z)| {
                Observation::new(format!("p{i}"), 100.0 + 5.0 * z, z, t(i as i64))
                    .with_level("L1")
                    .with_run(format!("R{i}"))
            })
            .collect()
    }

    /// Runs `check` with the last element of `obs` as current.
    fn run_level(check: RuleCheck, obs: &[Observation]) -> Option<RuleViolation> {
        let (cur, hist) = obs.split_last().expect("non-empty");
        let ctx = RuleContext::new(cur, &[], hist);
        check(&ctx)
    }

    fn run_within(
        check: RuleCheck,
        cur: &Observation,
        peers: &[Observation],
    ) -> Option<RuleViolation> {
        let ctx = RuleContext::new(cur, peers, &[]);
        check(&ctx)
    }

    fn in_run(id: &str, level: &str, z: f64) -> Observation {
        Observation::new(id, 0.0, z, t(0)).with_level(level).with_run("R1")
    }

    // --- 1_3s / 1_2s ---

    #[test]
    fn test_1_3s_boundary() {
        assert!(run_level(check_1_3s, &series(&[3.0])).is_some());
        assert!(run_level(check_1_3s, &series(&[-3.2])).is_some());
        assert!(run_level(check_1_3s, &series(&[2.99])).is_none());
    }

    #[test]
    fn test_1_3s_ignores_history() {
        let v = run_level(check_1_3s, &series(&[0.0, 0.1, 3.2])).unwrap();
        assert_eq!(v.observation_ids, vec!["p2"]);
    }

    #[test]
    fn test_1_2s_band() {
        assert!(run_level(check_1_2s, &series(&[2.0])).is_some());
        assert!(run_level(check_1_2s, &series(&[-2.8])).is_some());
        assert!(run_level(check_1_2s, &series(&[3.0])).is_none());
        assert!(run_level(check_1_2s, &series(&[1.99])).is_none());
    }

    // --- 2_2s ---

    #[test]
    fn test_2_2s_within_same_side() {
        let cur = in_run("b", "L2", 2.1);
        let peers = [in_run("a", "L1", 2.4), in_run("c", "L3", 0.5)];
        let v = run_within(check_2_2s_within, &cur, &peers).unwrap();
        assert_eq!(v.observation_ids, vec!["a", "b"]);
    }

    #[test]
    fn test_2_2s_within_opposite_side_not_violated() {
        let cur = in_run("b", "L2", 2.1);
        let peers = [in_run("a", "L1", -2.4)];
        assert!(run_within(check_2_2s_within, &cur, &peers).is_none());
    }

    #[test]
    fn test_2_2s_within_ignores_other_runs() {
        let cur = in_run("b", "L2", 2.1);
        let other = in_run("a", "L1", 2.4).with_run("R2");
        assert!(run_within(check_2_2s_within, &cur, &[other]).is_none());
    }

    #[test]
    fn test_2_2s_across_consecutive() {
        let v = run_level(check_2_2s_across, &series(&[0.0, -2.2, -2.0])).unwrap();
        assert_eq!(v.observation_ids, vec!["p1", "p2"]);
        assert!(run_level(check_2_2s_across, &series(&[2.2, 0.0, 2.0])).is_none());
        assert!(run_level(check_2_2s_across, &series(&[2.5])).is_none());
    }

    // --- R_4s ---

    #[test]
    fn test_r_4s_range_four() {
        let cur = in_run("b", "L2", 2.0);
        let v = run_within(check_r_4s, &cur, &[in_run("a", "L1", -2.0)]).unwrap();
        assert_eq!(v.observation_ids, vec!["a", "b"]);
    }

    #[test]
    fn test_r_4s_range_below_four() {
        let cur = in_run("b", "L2", 2.0);
        assert!(run_within(check_r_4s, &cur, &[in_run("a", "L1", -1.9)]).is_none());
    }

    #[test]
    fn test_r_4s_same_side_not_counted() {
        // range 4.5 but both above the mean
        let cur = in_run("b", "L2", 5.0);
        assert!(run_within(check_r_4s, &cur, &[in_run("a", "L1", 0.5)]).is_none());
    }

    #[test]
    fn test_r_4s_picks_widest_pair() {
        let cur = in_run("c", "L3", 1.5);
        let peers = [in_run("a", "L1", -2.6), in_run("b", "L2", -3.1)];
        let v = run_within(check_r_4s, &cur, &peers).unwrap();
        assert_eq!(v.observation_ids, vec!["b", "c"]);
    }

    // --- 4_1s / 3_1s ---

    #[test]
    fn test_4_1s() {
        let v = run_level(check_4_1s, &series(&[0.0, 1.1, 1.5, 1.2, 1.01])).unwrap();
        assert_eq!(v.observation_ids, vec!["p1", "p2", "p3", "p4"]);
        // exactly 1.0 is not beyond 1 SD
        assert!(run_level(check_4_1s, &series(&[1.1, 1.5, 1.0, 1.2])).is_none());
        // mixed sides
        assert!(run_level(check_4_1s, &series(&[1.1, -1.5, 1.3, 1.2])).is_none());
        // too short
        assert!(run_level(check_4_1s, &series(&[1.1, 1.5, 1.3])).is_none());
    }

    #[test]
    fn test_3_1s() {
        assert!(run_level(check_3_1s, &series(&[-1.1, -1.5, -1.3])).is_some());
        assert!(run_level(check_3_1s, &series(&[-1.1, -0.5, -1.3])).is_none());
        assert!(run_level(check_3_1s, &series(&[-1.1, -1.5])).is_none());
    }

    // --- x rules ---

    #[test]
    fn test_10x_lists_all_ids() {
        let values = [102.0, 103.0, 101.0, 104.0, 103.0, 102.0, 101.0, 103.0, 102.0, 104.0];
        let z: Vec<f64> = values.iter().map(|v| (v - 100.0) / 5.0).collect();
        let v = run_level(check_10x, &series(&z)).unwrap();
        let expected: Vec<String> = (0..10).map(|i| format!("p{i}")).collect();
        assert_eq!(v.observation_ids, expected);
    }

    #[test]
    fn test_10x_needs_ten() {
        assert!(run_level(check_10x, &series(&[0.4; 9])).is_none());
    }

    #[test]
    fn test_x_rule_zero_breaks_run() {
        let mut z = vec![0.5; 10];
        z[3] = 0.0;
        assert!(run_level(check_10x, &series(&z)).is_none());
    }

    #[test]
    fn test_6x_and_9x_contiguous() {
        assert!(run_level(check_6x, &series(&[-0.2; 6])).is_some());
        assert!(run_level(check_6x, &series(&[-0.2; 5])).is_none());
        assert!(run_level(check_9x, &series(&[0.3; 9])).is_some());
        // an opposite-side point inside the window breaks it
        let mut z = vec![0.3; 9];
        z[1] = -0.1;
        assert!(run_level(check_9x, &series(&z)).is_none());
        // but only the most recent 9 matter
        let mut z = vec![0.3; 10];
        z[0] = -0.1;
        assert!(run_level(check_9x, &series(&z)).is_some());
    }

    // --- 2of3_2s ---

    #[test]
    fn test_2of3_2s() {
        let v = run_level(check_2of3_2s, &series(&[2.1, 0.3, 2.4])).unwrap();
        assert_eq!(v.observation_ids, vec!["p0", "p2"]);
        assert!(run_level(check_2of3_2s, &series(&[0.3, 2.1, 2.4])).is_some());
        // opposite side
        assert!(run_level(check_2of3_2s, &series(&[-2.1, 0.3, 2.4])).is_none());
        // current not beyond 2 SD
        assert!(run_level(check_2of3_2s, &series(&[2.1, 2.3, 1.9])).is_none());
        // only looks two points back
        assert!(run_level(check_2of3_2s, &series(&[2.5, 0.0, 0.0, 2.4])).is_none());
    }

    // --- 7T ---

    fn valued(values: &[f64], order: &[i64]) -> Vec<Observation> {
        values
            .iter()
            .zip(order)
            .enumerate()
            .map(|(i, (&v, &day))| {
                Observation::new(format!("v{i}"), v, (v - 100.0) / 5.0, t(day)).with_level("L1")
            })
            .collect()
    }

    #[test]
    fn test_7t_increasing() {
        let obs = valued(
            &[95.0, 96.0, 97.0, 98.0, 99.0, 100.0, 101.0],
            &[0, 1, 2, 3, 4, 5, 6],
        );
        let v = run_level(check_7t, &obs).unwrap();
        assert!(v.message.contains("increasing"));
        assert_eq!(v.observation_ids.len(), 7);
    }

    #[test]
    fn test_7t_decreasing() {
        let obs = valued(
            &[101.0, 100.0, 99.0, 98.0, 97.0, 96.0, 95.0],
            &[0, 1, 2, 3, 4, 5, 6],
        );
        assert!(run_level(check_7t, &obs).is_some());
    }

    #[test]
    fn test_7t_resorts_by_timestamp() {
        // Monotonic in insertion order, but not in time order.
        let obs = valued(
            &[95.0, 96.0, 97.0, 98.0, 99.0, 100.0, 101.0],
            &[3, 0, 5, 1, 4, 2, 6],
        );
        assert!(run_level(check_7t, &obs).is_none());
    }

    #[test]
    fn test_7t_shuffled_input_sorted_in_time() {
        // Out of order in the slice, monotonic in time.
        let obs = valued(
            &[97.0, 95.0, 99.0, 96.0, 98.0, 100.0, 101.0],
            &[2, 0, 4, 1, 3, 5, 6],
        );
        assert!(run_level(check_7t, &obs).is_some());
    }

    #[test]
    fn test_7t_plateau_not_strict() {
        let obs = valued(
            &[95.0, 96.0, 96.0, 98.0, 99.0, 100.0, 101.0],
            &[0, 1, 2, 3, 4, 5, 6],
        );
        assert!(run_level(check_7t, &obs).is_none());
    }

    // --- context scoping ---

    #[test]
    fn level_series_filters_level_and_future() {
        let mut obs = series(&[2.5, 2.5]);
        obs[0].level = "L2".into();
        assert!(run_level(check_2_2s_across, &obs).is_none());

        let mut obs = series(&[2.5, 2.5]);
        // history point stamped after the current one
        obs[0].timestamp = t(5);
        assert!(run_level(check_2_2s_across, &obs).is_none());
    }

    #[test]
    fn current_in_history_is_ignored() {
        let obs = series(&[0.0, 2.5]);
        let cur = obs[1].clone();
        // history mistakenly includes the current observation
        let ctx = RuleContext::new(&cur, &obs, &obs);
        assert!(check_2_2s_across(&ctx).is_none());
        assert!(check_2_2s_within(&ctx).is_none());
    }

    #[test]
    fn preceding_is_explicitly_bounded() {
        let obs = series(&[0.1, 0.2, 0.3]);
        let (cur, hist) = obs.split_last().unwrap();
        let ctx = RuleContext::new(cur, &[], hist);
        assert_eq!(ctx.preceding(2).map(|p| p.len()), Some(2));
        assert!(ctx.preceding(3).is_none());
        assert_eq!(ctx.window(2).map(|w| w.len()), Some(3));
    }
}
