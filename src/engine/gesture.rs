use super::constants::{
  FINGER_EXTEND_BUFFER, MIN_DETECTION_CONFIDENCE, MIN_HAND_SCALE, OPENNESS_MAX_RATIO,
  OPENNESS_MIN_RATIO, PINCH_RATIO, THUMB_EXTEND_RATIO,
};
use super::landmarks::{LandmarkFrame, FINGERS, INDEX_MCP, INDEX_TIP, MIDDLE_MCP, THUMB_TIP, WRIST};
use super::math::{clamp, distance, scale as scale_vec, Vec3};
use super::types::{Gesture, HandData};

#[derive(Debug, Clone, Copy)]
pub struct Classification {
  pub hand: HandData,
  pub wrist: Vec3,
  pub hand_scale: f32,
}

// All thresholds are proportional to the wrist-to-index-MCP distance, so a
// hand close to the camera and the same hand at arm's length classify the
// same way. Detections that are too weak or too small to be a hand are
// dropped entirely rather than classified badly.
pub fn classify(frame: &LandmarkFrame, allow_point: bool) -> Option<Classification> {
  if frame.confidence < MIN_DETECTION_CONFIDENCE {
    return None;
  }
  let points = &frame.points;
  let wrist = points[WRIST];
  let hand_scale = distance(wrist, points[INDEX_MCP]);
  if hand_scale < MIN_HAND_SCALE {
    return None;
  }

  let extend_buffer = hand_scale * FINGER_EXTEND_BUFFER;
  let mut extended = [false; 4];
  let mut tip_distance_sum = 0.0;
  for (finger, (_, pip, tip)) in FINGERS.iter().enumerate() {
    let tip_distance = distance(points[*tip], wrist);
    extended[finger] = tip_distance > distance(points[*pip], wrist) + extend_buffer;
    tip_distance_sum += tip_distance;
  }
  let curled_count = extended.iter().filter(|flag| !**flag).count();

  let thumb_extended = distance(points[THUMB_TIP], points[INDEX_MCP]) > hand_scale * THUMB_EXTEND_RATIO;
  let pinching = distance(points[THUMB_TIP], points[INDEX_TIP]) < hand_scale * PINCH_RATIO;

  let openness = clamp(
    (tip_distance_sum / 4.0 - hand_scale * OPENNESS_MIN_RATIO)
      / (hand_scale * (OPENNESS_MAX_RATIO - OPENNESS_MIN_RATIO)),
    0.0,
    1.0,
  );

  let gesture = if pinching && extended[1] && extended[2] && extended[3] {
    Gesture::OkSign
  } else if pinching {
    Gesture::Pinch
  } else if thumb_extended && extended.iter().all(|flag| *flag) {
    Gesture::OpenHand
  } else if curled_count == 4 && thumb_extended {
    Gesture::ThumbScatter
  } else if curled_count == 4 {
    Gesture::ClosedFist
  } else if allow_point && extended[0] && !extended[1] && !extended[2] && !extended[3] {
    Gesture::Point
  } else {
    Gesture::None
  };

  let pinch_position = if pinching {
    Some(midpoint(points[THUMB_TIP], points[INDEX_TIP]))
  } else {
    None
  };

  let long_axis = super::math::sub(points[MIDDLE_MCP], wrist);
  let hand = HandData {
    gesture,
    palm_position: palm_centroid(points),
    pinch_position,
    pointer_position: points[INDEX_TIP],
    rotation: long_axis.x.atan2(long_axis.y),
    openness,
  };

  Some(Classification {
    hand,
    wrist,
    hand_scale,
  })
}

fn palm_centroid(points: &[Vec3]) -> Vec3 {
  let mut sum = points[WRIST];
  for (mcp, _, _) in FINGERS.iter() {
    sum = super::math::add(sum, points[*mcp]);
  }
  scale_vec(sum, 1.0 / (FINGERS.len() as f32 + 1.0))
}

fn midpoint(a: Vec3, b: Vec3) -> Vec3 {
  scale_vec(super::math::add(a, b), 0.5)
}
