//! Pointer velocity estimation and the acceleration curve built on it.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Deserialize;

use super::pointer::{IdSet, MAX_POINTER_ID};

/// Samples kept per tracker.
const HISTORY_SIZE: usize = 20;
/// Only samples this recent contribute to an estimate.
const HORIZON: Duration = Duration::from_millis(100);
/// A gap this long between samples means the pointers had stopped.
const ASSUME_STOPPED_TIME: Duration = Duration::from_millis(40);
/// Polynomial degree of the least squares fit.
const DEGREE: usize = 2;

#[derive(Debug, Clone, Copy)]
struct Movement {
    when: Duration,
    ids: IdSet,
    positions: [(f32, f32); MAX_POINTER_ID as usize + 1],
}

/// Estimates per-pointer velocity from a short position history by fitting
/// a quadratic in time to each axis.
#[derive(Debug, Clone, Default)]
pub struct VelocityTracker {
    history: VecDeque<Movement>,
    current_ids: IdSet,
    last_when: Option<Duration>,
}

impl VelocityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.current_ids.clear();
        self.last_when = None;
    }

    /// Forget the history of `ids`.
    pub fn clear_pointers(&mut self, ids: IdSet) {
        for movement in &mut self.history {
            movement.ids = movement.ids.difference(ids);
        }
        self.current_ids = self.current_ids.difference(ids);
    }

    /// Record positions for `ids`; `positions` is ordered by ascending id.
    pub fn add_movement(&mut self, when: Duration, ids: IdSet, positions: &[(f32, f32)]) {
        if let Some(last) = self.last_when {
            if !self.current_ids.intersection(ids).is_empty() && when >= last + ASSUME_STOPPED_TIME {
                self.history.clear();
            }
        }
        self.last_when = Some(when);
        self.current_ids = ids;

        let mut movement = Movement {
            when,
            ids,
            positions: [(0.0, 0.0); MAX_POINTER_ID as usize + 1],
        };
        for (id, &pos) in ids.iter().zip(positions) {
            movement.positions[id as usize] = pos;
        }
        if self.history.len() == HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(movement);
    }

    /// Velocity of `id` in units per second, if it has any history.
    pub fn velocity(&self, id: u32) -> Option<(f32, f32)> {
        let newest = self.history.back()?;
        let mut xs = Vec::with_capacity(HISTORY_SIZE);
        let mut ys = Vec::with_capacity(HISTORY_SIZE);
        let mut ts = Vec::with_capacity(HISTORY_SIZE);
        for movement in self.history.iter().rev() {
            if !movement.ids.contains(id) {
                break;
            }
            let age = newest.when.saturating_sub(movement.when);
            if age > HORIZON {
                break;
            }
            let (x, y) = movement.positions[id as usize];
            xs.push(x);
            ys.push(y);
            ts.push(-age.as_secs_f32());
        }
        if ts.is_empty() {
            return None;
        }

        let degree = DEGREE.min(ts.len() - 1);
        if degree == 0 {
            return Some((0.0, 0.0));
        }
        let bx = solve_least_squares(&ts, &xs, degree + 1)?;
        let by = solve_least_squares(&ts, &ys, degree + 1)?;
        Some((bx[1], by[1]))
    }
}

/// Fit `y = b0 + b1*x + ... + b(n-1)*x^(n-1)` by QR decomposition
/// (Gram-Schmidt). Returns `None` when the samples are degenerate.
fn solve_least_squares(x: &[f32], y: &[f32], n: usize) -> Option<Vec<f32>> {
    let m = x.len();
    // Column-major design matrix.
    let mut a = vec![vec![0.0f32; m]; n];
    for h in 0..m {
        a[0][h] = 1.0;
        for i in 1..n {
            a[i][h] = a[i - 1][h] * x[h];
        }
    }

    let mut q = vec![vec![0.0f32; m]; n];
    let mut r = vec![vec![0.0f32; n]; n];
    for j in 0..n {
        q[j] = a[j].clone();
        for i in 0..j {
            let dot: f32 = (0..m).map(|h| q[j][h] * q[i][h]).sum();
            for h in 0..m {
                q[j][h] -= dot * q[i][h];
            }
        }
        let norm = q[j].iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm < 0.000_001 {
            return None;
        }
        for h in 0..m {
            q[j][h] /= norm;
        }
        for i in 0..n {
            r[j][i] = if i < j { 0.0 } else { (0..m).map(|h| q[j][h] * a[i][h]).sum() };
        }
    }

    let mut b = vec![0.0f32; n];
    for i in (0..n).rev() {
        let mut value: f32 = (0..m).map(|h| q[i][h] * y[h]).sum();
        for j in (i + 1)..n {
            value -= r[i][j] * b[j];
        }
        b[i] = value / r[i][i];
    }
    Some(b)
}

/// Acceleration curve for relative motion.
///
/// Below `low_threshold` (units/s after scaling) the delta is multiplied by
/// `scale`; at or above `high_threshold` by `scale * acceleration`; in
/// between the factor is interpolated linearly.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VelocityControlParameters {
    pub scale: f32,
    pub low_threshold: f32,
    pub high_threshold: f32,
    pub acceleration: f32,
}

impl VelocityControlParameters {
    pub fn new(scale: f32, low_threshold: f32, high_threshold: f32, acceleration: f32) -> Self {
        Self {
            scale,
            low_threshold,
            high_threshold,
            acceleration,
        }
    }
}

impl Default for VelocityControlParameters {
    fn default() -> Self {
        Self::new(1.0, 500.0, 3000.0, 3.0)
    }
}

/// Motion that stops for this long restarts the velocity estimate.
const STOP_TIME: Duration = Duration::from_millis(500);

/// Applies [`VelocityControlParameters`] to a stream of relative deltas.
#[derive(Debug, Clone)]
pub struct VelocityControl {
    parameters: VelocityControlParameters,
    last_movement: Option<Duration>,
    raw_position: (f32, f32),
    tracker: VelocityTracker,
}

impl VelocityControl {
    pub fn new(parameters: VelocityControlParameters) -> Self {
        Self {
            parameters,
            last_movement: None,
            raw_position: (0.0, 0.0),
            tracker: VelocityTracker::new(),
        }
    }

    pub fn set_parameters(&mut self, parameters: VelocityControlParameters) {
        if self.parameters != parameters {
            self.parameters = parameters;
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.last_movement = None;
        self.raw_position = (0.0, 0.0);
        self.tracker.clear();
    }

    /// Scale a delta according to the current speed. Zero deltas pass through
    /// untouched.
    pub fn apply(&mut self, when: Duration, dx: f32, dy: f32) -> (f32, f32) {
        if dx == 0.0 && dy == 0.0 {
            return (dx, dy);
        }
        if self.last_movement.is_some_and(|last| when >= last + STOP_TIME) {
            self.raw_position = (0.0, 0.0);
            self.tracker.clear();
        }
        self.last_movement = Some(when);
        self.raw_position.0 += dx;
        self.raw_position.1 += dy;
        self.tracker
            .add_movement(when, IdSet::from_iter([0]), &[self.raw_position]);

        let p = &self.parameters;
        let mut scale = p.scale;
        if let Some((vx, vy)) = self.tracker.velocity(0) {
            let speed = vx.hypot(vy) * p.scale;
            if speed >= p.high_threshold {
                scale *= p.acceleration;
            } else if speed > p.low_threshold {
                scale *= 1.0
                    + (speed - p.low_threshold) / (p.high_threshold - p.low_threshold)
                        * (p.acceleration - 1.0);
            }
            log::trace!("velocity control: speed={:.1} scale={:.3}", speed, scale);
        }
        (dx * scale, dy * scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn ids(list: &[u32]) -> IdSet {
        list.iter().copied().collect()
    }

    #[test]
    fn test_constant_velocity() {
        let mut tracker = VelocityTracker::new();
        for i in 0..5u64 {
            let x = i as f32 * 10.0;
            tracker.add_movement(ms(i * 10), ids(&[3]), &[(x, -x)]);
        }
        let (vx, vy) = tracker.velocity(3).unwrap();
        assert!((vx - 1000.0).abs() < 1.0, "vx={}", vx);
        assert!((vy + 1000.0).abs() < 1.0, "vy={}", vy);
        assert_eq!(tracker.velocity(4), None);
    }

    #[test]
    fn test_single_sample_is_stationary() {
        let mut tracker = VelocityTracker::new();
        tracker.add_movement(ms(0), ids(&[0]), &[(5.0, 5.0)]);
        assert_eq!(tracker.velocity(0), Some((0.0, 0.0)));
    }

    #[test]
    fn test_pause_clears_history() {
        let mut tracker = VelocityTracker::new();
        tracker.add_movement(ms(0), ids(&[0]), &[(0.0, 0.0)]);
        tracker.add_movement(ms(10), ids(&[0]), &[(100.0, 0.0)]);
        tracker.add_movement(ms(60), ids(&[0]), &[(100.0, 0.0)]);
        assert_eq!(tracker.velocity(0), Some((0.0, 0.0)));
    }

    #[test]
    fn test_positions_follow_id_order() {
        let mut tracker = VelocityTracker::new();
        tracker.add_movement(ms(0), ids(&[1, 6]), &[(0.0, 0.0), (0.0, 0.0)]);
        tracker.add_movement(ms(10), ids(&[1, 6]), &[(10.0, 0.0), (0.0, 20.0)]);
        let (vx1, _) = tracker.velocity(1).unwrap();
        let (_, vy6) = tracker.velocity(6).unwrap();
        assert!((vx1 - 1000.0).abs() < 1.0);
        assert!((vy6 - 2000.0).abs() < 1.0);

        tracker.clear_pointers(ids(&[6]));
        assert_eq!(tracker.velocity(6), None);
        assert!(tracker.velocity(1).is_some());
    }

    #[test]
    fn test_control_slow_motion_uses_base_scale() {
        let mut control = VelocityControl::new(VelocityControlParameters::new(2.0, 500.0, 3000.0, 3.0));
        // 1 unit per 10ms = 100 units/s, times scale 2 stays below the low threshold.
        for i in 0..5u64 {
            let (dx, dy) = control.apply(ms(i * 10), 1.0, 0.0);
            assert!((dx - 2.0).abs() < 1e-4);
            assert_eq!(dy, 0.0);
        }
    }

    #[test]
    fn test_control_fast_motion_accelerates() {
        let mut control = VelocityControl::new(VelocityControlParameters::new(1.0, 500.0, 3000.0, 3.0));
        let mut last = (0.0, 0.0);
        for i in 0..5u64 {
            last = control.apply(ms(i * 10), 50.0, 0.0);
        }
        // 5000 units/s is past the high threshold.
        assert!((last.0 - 150.0).abs() < 1e-2, "dx={}", last.0);
    }

    #[test]
    fn test_control_stop_time_resets() {
        let mut control = VelocityControl::new(VelocityControlParameters::new(1.0, 500.0, 3000.0, 3.0));
        for i in 0..5u64 {
            control.apply(ms(i * 10), 50.0, 0.0);
        }
        // After a long pause the first delta has no velocity behind it.
        let (dx, _) = control.apply(ms(1000), 50.0, 0.0);
        assert_eq!(dx, 50.0);
        assert_eq!(control.apply(ms(1001), 0.0, 0.0), (0.0, 0.0));
    }
}
