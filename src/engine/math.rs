use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
  pub x: f32,
  pub y: f32,
  pub z: f32,
}

pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

pub fn vec3(x: f32, y: f32, z: f32) -> Vec3 {
  Vec3 { x, y, z }
}

pub fn add(a: Vec3, b: Vec3) -> Vec3 {
  Vec3 {
    x: a.x + b.x,
    y: a.y + b.y,
    z: a.z + b.z,
  }
}

pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
  Vec3 {
    x: a.x - b.x,
    y: a.y - b.y,
    z: a.z - b.z,
  }
}

pub fn scale(a: Vec3, factor: f32) -> Vec3 {
  Vec3 {
    x: a.x * factor,
    y: a.y * factor,
    z: a.z * factor,
  }
}

pub fn length(a: Vec3) -> f32 {
  (a.x * a.x + a.y * a.y + a.z * a.z).sqrt()
}

pub fn distance(a: Vec3, b: Vec3) -> f32 {
  length(sub(a, b))
}

pub fn normalize(a: Vec3) -> Vec3 {
  let len = length(a);
  if !len.is_finite() || len == 0.0 {
    return ZERO;
  }
  Vec3 {
    x: a.x / len,
    y: a.y / len,
    z: a.z / len,
  }
}

pub fn lerp(from: f32, to: f32, factor: f32) -> f32 {
  from + (to - from) * factor
}

pub fn lerp_vec(from: Vec3, to: Vec3, factor: f32) -> Vec3 {
  Vec3 {
    x: lerp(from.x, to.x, factor),
    y: lerp(from.y, to.y, factor),
    z: lerp(from.z, to.z, factor),
  }
}

pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
  value.min(max).max(min)
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
  let t = clamp((x - edge0) / (edge1 - edge0), 0.0, 1.0);
  t * t * (3.0 - 2.0 * t)
}

pub fn is_finite(a: Vec3) -> bool {
  a.x.is_finite() && a.y.is_finite() && a.z.is_finite()
}
