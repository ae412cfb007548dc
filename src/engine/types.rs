use super::math::Vec3;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Gesture {
  None,
  OpenHand,
  ClosedFist,
  Pinch,
  Point,
  OkSign,
  ThumbScatter,
  TwoHandRotation,
}

#[derive(Debug, Clone, Copy)]
pub struct HandData {
  pub gesture: Gesture,
  pub palm_position: Vec3,
  pub pinch_position: Option<Vec3>,
  pub pointer_position: Vec3,
  pub rotation: f32,
  pub openness: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObstacleKind {
  Obstacle,
  Heal,
  Slow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
  Hit { player: usize },
  Heal { player: usize },
  Slow { player: usize },
  Score { points: i64 },
  Burst,
  SuperBurst,
  ModelCycle,
}

// One rendered instance: translation, per-axis scale, rgb color, z rotation.
#[derive(Debug, Clone, Copy)]
pub struct Instance {
  pub position: Vec3,
  pub scale: Vec3,
  pub color: [f32; 3],
  pub rotation: f32,
}

impl Instance {
  pub fn hidden() -> Self {
    Self {
      position: super::math::ZERO,
      scale: super::math::ZERO,
      color: [0.0, 0.0, 0.0],
      rotation: 0.0,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandSnapshot {
  pub gesture: Gesture,
  pub palm: [f32; 3],
  pub pointer: [f32; 3],
  pub pinch: Option<[f32; 3]>,
  pub rotation: f32,
  pub openness: f32,
}

impl From<&HandData> for HandSnapshot {
  fn from(hand: &HandData) -> Self {
    Self {
      gesture: hand.gesture,
      palm: [hand.palm_position.x, hand.palm_position.y, hand.palm_position.z],
      pointer: [
        hand.pointer_position.x,
        hand.pointer_position.y,
        hand.pointer_position.z,
      ],
      pinch: hand
        .pinch_position
        .map(|point| [point.x, point.y, point.z]),
      rotation: hand.rotation,
      openness: hand.openness,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
  pub lives: u32,
  pub score: i64,
  pub is_hit: bool,
  pub is_game_over: bool,
  pub game_active: bool,
  pub slow_remaining: f32,
}
