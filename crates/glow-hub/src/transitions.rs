//! Transition controller: time-driven field animation
//!
//! A transition moves one scalar field of one group from a start value to an
//! end value over a duration, emitting an intermediate command on each step
//! interval. Steps route through the same encode/send/store path as direct
//! commands, so the packet sender cannot tell them apart.
//!
//! At most one transition is active per `(bulb, field)` pair: starting a new
//! one for the same pair supersedes the old, as does a direct command for
//! the pair. Hue interpolates along the shorter arc of the color circle, so
//! 350 -> 10 passes through 0, not through 180.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use glow_protocol::{BulbId, Field, FieldValue};
use tracing::debug;

/// Progress snapshot of one active transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionStatus {
    /// Group being animated
    pub bulb: BulbId,
    /// Field being animated
    pub field: Field,
    /// Completed fraction, 0.0 to 1.0
    pub progress: f32,
}

/// One step command produced by [`TransitionController::tick`]
#[derive(Debug, Clone, Copy)]
pub struct TransitionStep {
    /// Group to command
    pub bulb: BulbId,
    /// Interpolated value to apply
    pub value: FieldValue,
    /// Whether this was the final step (the exact end value)
    pub finished: bool,
}

#[derive(Debug)]
struct Transition {
    start: f32,
    end: f32,
    duration: Duration,
    started_at: Instant,
    next_step: Instant,
}

impl Transition {
    fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    fn value_at(&self, field: Field, progress: f32) -> f32 {
        if field == Field::Hue {
            // Interpolate along the shorter arc of the circle; a jump from
            // 350 to 10 is a 20-degree move through 0, not a 340-degree
            // reverse spin
            let delta = shortest_arc(self.start, self.end);
            (self.start + delta * progress).rem_euclid(360.0)
        } else {
            self.start + (self.end - self.start) * progress
        }
    }
}

/// Signed shortest-arc distance from `from` to `to` on a 360-degree circle
fn shortest_arc(from: f32, to: f32) -> f32 {
    (to - from + 540.0).rem_euclid(360.0) - 180.0
}

/// Scheduler for all active transitions
pub struct TransitionController {
    // BTreeMap so step emission order is deterministic across runs
    active: BTreeMap<(BulbId, Field), Transition>,
    step: Duration,
}

impl TransitionController {
    /// Create a controller with the given step interval
    pub fn new(step: Duration) -> Self {
        Self {
            active: BTreeMap::new(),
            step,
        }
    }

    /// Number of active transitions
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Start (or supersede) a transition for a `(bulb, field)` pair
    ///
    /// The first step fires on the next tick. The caller is responsible for
    /// having validated that the field is scalar and the end value in range.
    pub fn start(
        &mut self,
        now: Instant,
        bulb: BulbId,
        field: Field,
        start: f32,
        end: f32,
        duration: Duration,
    ) {
        if self.active.remove(&(bulb, field)).is_some() {
            debug!("superseding active {:?} transition for {}", field, bulb);
        }
        self.active.insert(
            (bulb, field),
            Transition {
                start,
                end,
                duration,
                started_at: now,
                next_step: now,
            },
        );
    }

    /// Cancel the transition for a pair, if one is active
    ///
    /// The field stays at whatever value was last applied; no further
    /// packets are emitted for the cancelled transition.
    pub fn cancel(&mut self, bulb: &BulbId, field: Field) -> bool {
        let removed = self.active.remove(&(*bulb, field)).is_some();
        if removed {
            debug!("cancelled {:?} transition for {}", field, bulb);
        }
        removed
    }

    /// Cancel every transition referencing a group
    pub fn cancel_all_for(&mut self, bulb: &BulbId) -> usize {
        let before = self.active.len();
        self.active.retain(|(b, _), _| b != bulb);
        before - self.active.len()
    }

    /// Progress of all active transitions, for status reporting
    pub fn list(&self, now: Instant) -> Vec<TransitionStatus> {
        self.active
            .iter()
            .map(|((bulb, field), transition)| TransitionStatus {
                bulb: *bulb,
                field: *field,
                progress: transition.progress(now),
            })
            .collect()
    }

    /// Advance all due transitions, producing their step commands
    ///
    /// A finished transition emits the exact end value (never a rounded
    /// interpolation) and is removed from the active set.
    pub fn tick(&mut self, now: Instant) -> Vec<TransitionStep> {
        let mut steps = Vec::new();
        let mut finished = Vec::new();

        for ((bulb, field), transition) in &mut self.active {
            if now < transition.next_step {
                continue;
            }

            let progress = transition.progress(now);
            let value = if progress >= 1.0 {
                transition.end
            } else {
                transition.value_at(*field, progress)
            };

            if let Some(value) = FieldValue::from_scalar(*field, value) {
                steps.push(TransitionStep {
                    bulb: *bulb,
                    value,
                    finished: progress >= 1.0,
                });
            }

            if progress >= 1.0 {
                finished.push((*bulb, *field));
            } else {
                transition.next_step = now + self.step;
            }
        }

        for key in finished {
            self.active.remove(&key);
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glow_protocol::Protocol;

    fn bulb() -> BulbId {
        BulbId::new(0x1111, 1, Protocol::RgbCct)
    }

    fn controller(step_ms: u64) -> TransitionController {
        TransitionController::new(Duration::from_millis(step_ms))
    }

    #[test]
    fn zero_duration_resolves_to_end_in_one_step() {
        let mut ctl = controller(100);
        let t0 = Instant::now();
        ctl.start(t0, bulb(), Field::Brightness, 10.0, 90.0, Duration::ZERO);

        let steps = ctl.tick(t0);
        assert_eq!(steps.len(), 1);
        assert!(steps[0].finished);
        assert_eq!(steps[0].value, FieldValue::Brightness(90));
        assert!(ctl.is_empty());

        // No further emissions
        assert!(ctl.tick(t0 + Duration::from_millis(100)).is_empty());
    }

    #[test]
    fn final_step_emits_exact_end_value() {
        let mut ctl = controller(100);
        let t0 = Instant::now();
        ctl.start(t0, bulb(), Field::Brightness, 0.0, 77.0, Duration::from_millis(250));

        let mut last = None;
        for i in 0..10 {
            for step in ctl.tick(t0 + Duration::from_millis(i * 100)) {
                last = Some(step);
            }
        }
        let last = last.unwrap();
        assert!(last.finished);
        assert_eq!(last.value, FieldValue::Brightness(77));
    }

    #[test]
    fn hue_interpolates_the_shorter_arc_through_zero() {
        let mut ctl = controller(50);
        let t0 = Instant::now();
        ctl.start(t0, bulb(), Field::Hue, 350.0, 10.0, Duration::from_millis(500));

        let mut values = Vec::new();
        for i in 0..=12 {
            for step in ctl.tick(t0 + Duration::from_millis(i * 50)) {
                match step.value {
                    FieldValue::Hue(h) => values.push(h),
                    other => panic!("unexpected step {:?}", other),
                }
            }
        }

        assert!(!values.is_empty());
        for hue in &values {
            assert!(
                *hue >= 350 || *hue <= 10,
                "hue {} left the shorter arc",
                hue
            );
        }
        assert_eq!(*values.last().unwrap(), 10);
    }

    #[test]
    fn hue_wraps_the_other_direction_too() {
        let mut ctl = controller(50);
        let t0 = Instant::now();
        ctl.start(t0, bulb(), Field::Hue, 10.0, 350.0, Duration::from_millis(500));

        for i in 0..=12 {
            for step in ctl.tick(t0 + Duration::from_millis(i * 50)) {
                if let FieldValue::Hue(h) = step.value {
                    assert!(h >= 350 || h <= 10, "hue {} left the shorter arc", h);
                }
            }
        }
    }

    #[test]
    fn superseding_start_replaces_the_pair() {
        let mut ctl = controller(50);
        let t0 = Instant::now();
        ctl.start(t0, bulb(), Field::Brightness, 0.0, 100.0, Duration::from_secs(10));
        ctl.start(t0, bulb(), Field::Brightness, 50.0, 60.0, Duration::ZERO);
        assert_eq!(ctl.len(), 1);

        let steps = ctl.tick(t0);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].value, FieldValue::Brightness(60));
    }

    #[test]
    fn distinct_fields_animate_independently() {
        let mut ctl = controller(50);
        let t0 = Instant::now();
        ctl.start(t0, bulb(), Field::Brightness, 0.0, 100.0, Duration::from_millis(200));
        ctl.start(t0, bulb(), Field::Saturation, 100.0, 0.0, Duration::from_millis(200));
        assert_eq!(ctl.len(), 2);

        let steps = ctl.tick(t0 + Duration::from_millis(50));
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn cancel_stops_emissions_immediately() {
        let mut ctl = controller(50);
        let t0 = Instant::now();
        ctl.start(t0, bulb(), Field::Kelvin, 2700.0, 6500.0, Duration::from_secs(5));

        assert_eq!(ctl.tick(t0).len(), 1);
        assert!(ctl.cancel(&bulb(), Field::Kelvin));
        assert!(ctl.tick(t0 + Duration::from_millis(50)).is_empty());
        assert!(!ctl.cancel(&bulb(), Field::Kelvin), "already cancelled");
    }

    #[test]
    fn progress_is_reported_per_pair() {
        let mut ctl = controller(50);
        let t0 = Instant::now();
        ctl.start(t0, bulb(), Field::Brightness, 0.0, 100.0, Duration::from_millis(400));

        let status = ctl.list(t0 + Duration::from_millis(100));
        assert_eq!(status.len(), 1);
        assert!((status[0].progress - 0.25).abs() < 0.01);
    }
}
