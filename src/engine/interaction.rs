use super::constants::{BURST_COOLDOWN, BURST_DELTA, SUPER_BURST_COOLDOWN};
use super::math::distance;
use super::types::{Gesture, HandData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstTrigger {
  None,
  Burst,
  SuperBurst,
}

// Cross-hand triggers operate on raw per-frame classifications, not the
// smoothed signals: a burst should fire the instant both conditions hold.
#[derive(Debug)]
pub struct InteractionDetector {
  prev_distance: Option<f32>,
  burst_ready_at: f32,
  super_burst_ready_at: f32,
}

impl InteractionDetector {
  pub fn new() -> Self {
    Self {
      prev_distance: None,
      burst_ready_at: 0.0,
      super_burst_ready_at: 0.0,
    }
  }

  pub fn reset(&mut self) {
    self.prev_distance = None;
    self.burst_ready_at = 0.0;
    self.super_burst_ready_at = 0.0;
  }

  pub fn update(&mut self, hands: [Option<&HandData>; 2], now: f32) -> BurstTrigger {
    let (Some(first), Some(second)) = (hands[0], hands[1]) else {
      // With fewer than two hands there is no valid baseline; a stale
      // comparison must never fire a burst on re-acquisition.
      self.prev_distance = None;
      return BurstTrigger::None;
    };

    if first.gesture == Gesture::ClosedFist && second.gesture == Gesture::ClosedFist {
      if now >= self.super_burst_ready_at {
        self.super_burst_ready_at = now + SUPER_BURST_COOLDOWN;
        self.prev_distance = Some(distance(first.palm_position, second.palm_position));
        return BurstTrigger::SuperBurst;
      }
    }

    let current = distance(first.palm_position, second.palm_position);
    let trigger = match self.prev_distance {
      Some(previous) if current - previous > BURST_DELTA && now >= self.burst_ready_at => {
        self.burst_ready_at = now + BURST_COOLDOWN;
        BurstTrigger::Burst
      }
      _ => BurstTrigger::None,
    };
    self.prev_distance = Some(current);
    trigger
  }
}

impl Default for InteractionDetector {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::engine::math::vec3;

  fn hand(x: f32, gesture: Gesture) -> HandData {
    HandData {
      gesture,
      palm_position: vec3(x, 0.5, 0.0),
      pinch_position: None,
      pointer_position: vec3(x, 0.5, 0.0),
      rotation: 0.0,
      openness: 0.5,
    }
  }

  #[test]
  fn burst_fires_once_per_cooldown_window() {
    let mut detector = InteractionDetector::new();
    let near = hand(0.45, Gesture::OpenHand);
    let near2 = hand(0.55, Gesture::OpenHand);
    let far = hand(0.1, Gesture::OpenHand);
    let far2 = hand(0.9, Gesture::OpenHand);

    assert_eq!(detector.update([Some(&near), Some(&near2)], 0.0), BurstTrigger::None);
    assert_eq!(detector.update([Some(&far), Some(&far2)], 0.033), BurstTrigger::Burst);

    // A second qualifying separation inside the cooldown stays quiet.
    assert_eq!(detector.update([Some(&near), Some(&near2)], 0.066), BurstTrigger::None);
    assert_eq!(detector.update([Some(&far), Some(&far2)], 0.099), BurstTrigger::None);

    // After the cooldown elapses it can fire again.
    assert_eq!(detector.update([Some(&near), Some(&near2)], 1.6), BurstTrigger::None);
    assert_eq!(detector.update([Some(&far), Some(&far2)], 1.64), BurstTrigger::Burst);
  }

  #[test]
  fn losing_a_hand_resets_the_baseline() {
    let mut detector = InteractionDetector::new();
    let near = hand(0.45, Gesture::OpenHand);
    let near2 = hand(0.55, Gesture::OpenHand);
    let far = hand(0.1, Gesture::OpenHand);
    let far2 = hand(0.9, Gesture::OpenHand);

    detector.update([Some(&near), Some(&near2)], 0.0);
    detector.update([Some(&near), None], 0.033);
    // First frame with two hands again establishes a fresh baseline; even a
    // wide jump must not fire.
    assert_eq!(detector.update([Some(&far), Some(&far2)], 0.066), BurstTrigger::None);
  }

  #[test]
  fn dual_fists_trigger_super_burst_with_longer_cooldown() {
    let mut detector = InteractionDetector::new();
    let fist_a = hand(0.4, Gesture::ClosedFist);
    let fist_b = hand(0.6, Gesture::ClosedFist);

    assert_eq!(
      detector.update([Some(&fist_a), Some(&fist_b)], 0.0),
      BurstTrigger::SuperBurst
    );
    assert_eq!(
      detector.update([Some(&fist_a), Some(&fist_b)], 1.0),
      BurstTrigger::None
    );
    assert_eq!(
      detector.update([Some(&fist_a), Some(&fist_b)], 2.1),
      BurstTrigger::SuperBurst
    );
  }
}
