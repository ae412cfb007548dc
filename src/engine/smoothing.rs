use super::constants::{
  OPENNESS_SMOOTH_FACTOR, SMOOTH_FAST_FACTOR, SMOOTH_FAST_SPEED, SMOOTH_SLOW_FACTOR,
};
use super::math::{distance, lerp, lerp_vec, Vec3};
use super::types::HandData;
use std::f32::consts::PI;

// Per-slot smoothing history. Hand identity across frames is positional
// (slot 0/1), so losing tracking on a slot must clear its history.
#[derive(Debug, Default)]
pub struct HandSlot {
  prev: Option<HandData>,
  prev_raw_wrist: Option<Vec3>,
}

impl HandSlot {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn clear(&mut self) {
    self.prev = None;
    self.prev_raw_wrist = None;
  }

  pub fn last(&self) -> Option<&HandData> {
    self.prev.as_ref()
  }

  // The positional factor adapts to wrist speed: a fast hand snaps toward
  // the raw sample, a still hand is heavily smoothed. Openness uses its own
  // fixed, gentler factor. The discrete gesture is never smoothed.
  pub fn apply(&mut self, raw: HandData, raw_wrist: Vec3, hand_scale: f32, dt: f32) -> HandData {
    let factor = match self.prev_raw_wrist {
      Some(prev_wrist) => {
        let step = dt.max(1e-4);
        let speed = distance(raw_wrist, prev_wrist) / (hand_scale.max(1e-4) * step);
        if speed > SMOOTH_FAST_SPEED {
          SMOOTH_FAST_FACTOR
        } else {
          SMOOTH_SLOW_FACTOR
        }
      }
      None => 1.0,
    };
    self.prev_raw_wrist = Some(raw_wrist);

    let smoothed = match self.prev {
      None => raw,
      Some(prev) => HandData {
        gesture: raw.gesture,
        palm_position: lerp_vec(prev.palm_position, raw.palm_position, factor),
        pinch_position: match (prev.pinch_position, raw.pinch_position) {
          (Some(prev_pinch), Some(raw_pinch)) => Some(lerp_vec(prev_pinch, raw_pinch, factor)),
          (_, raw_pinch) => raw_pinch,
        },
        pointer_position: lerp_vec(prev.pointer_position, raw.pointer_position, factor),
        rotation: lerp_angle(prev.rotation, raw.rotation, factor),
        openness: lerp(prev.openness, raw.openness, OPENNESS_SMOOTH_FACTOR),
      },
    };
    self.prev = Some(smoothed);
    smoothed
  }
}

fn lerp_angle(from: f32, to: f32, factor: f32) -> f32 {
  let mut delta = (to - from) % (PI * 2.0);
  if delta > PI {
    delta -= PI * 2.0;
  } else if delta < -PI {
    delta += PI * 2.0;
  }
  from + delta * factor
}
