use super::math::{is_finite, Vec3};

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_TIP: usize = 20;

// (mcp, pip, tip) per non-thumb finger, index order
pub const FINGERS: [(usize, usize, usize); 4] = [
  (INDEX_MCP, INDEX_PIP, INDEX_TIP),
  (MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP),
  (RING_MCP, RING_PIP, RING_TIP),
  (PINKY_MCP, PINKY_PIP, PINKY_TIP),
];

#[derive(Debug, Clone)]
pub struct LandmarkFrame {
  pub points: [Vec3; LANDMARK_COUNT],
  pub confidence: f32,
}

pub fn parse_frame(points: &[Vec3], confidence: f32) -> Option<LandmarkFrame> {
  if points.len() < LANDMARK_COUNT || !confidence.is_finite() {
    return None;
  }
  let mut out = [super::math::ZERO; LANDMARK_COUNT];
  for (slot, point) in out.iter_mut().zip(points.iter()) {
    if !is_finite(*point) {
      return None;
    }
    *slot = *point;
  }
  Some(LandmarkFrame {
    points: out,
    confidence,
  })
}
