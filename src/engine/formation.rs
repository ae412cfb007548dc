use super::math::{clamp, distance, scale, smoothstep, Vec3, ZERO};
use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientMix {
  Radial,
  Linear,
  Angular,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorMode {
  Source,
  Gradient {
    from: [f32; 3],
    to: [f32; 3],
    mix: GradientMix,
    contrast: bool,
  },
}

// An immutable target point cloud. Simulation state lives in the particle
// field; a formation is only ever swapped wholesale.
#[derive(Debug, Clone)]
pub struct Formation {
  pub targets: Vec<Vec3>,
  pub source_colors: Vec<[f32; 3]>,
}

impl Formation {
  pub fn len(&self) -> usize {
    self.targets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.targets.is_empty()
  }

  pub fn centroid(&self) -> Vec3 {
    if self.targets.is_empty() {
      return ZERO;
    }
    let mut sum = ZERO;
    for target in &self.targets {
      sum = super::math::add(sum, *target);
    }
    scale(sum, 1.0 / self.targets.len() as f32)
  }

  // Golden-angle sphere used until a client uploads a real point cloud.
  pub fn default_sphere(count: usize) -> Self {
    let count = count.max(1);
    let golden = PI * (3.0 - 5.0_f32.sqrt());
    let mut targets = Vec::with_capacity(count);
    let mut source_colors = Vec::with_capacity(count);
    for index in 0..count {
      let y = 1.0 - (index as f32 + 0.5) / count as f32 * 2.0;
      let radius = (1.0 - y * y).max(0.0).sqrt();
      let theta = golden * index as f32;
      let point = Vec3 {
        x: theta.cos() * radius,
        y,
        z: theta.sin() * radius,
      };
      targets.push(point);
      source_colors.push([
        point.x * 0.5 + 0.5,
        point.y * 0.5 + 0.5,
        point.z * 0.5 + 0.5,
      ]);
    }
    Self {
      targets,
      source_colors,
    }
  }
}

// Colors are assigned once per formation/config change, never per frame.
pub fn assign_colors(formation: &Formation, mode: &ColorMode) -> Vec<[f32; 3]> {
  match mode {
    ColorMode::Source => formation.source_colors.clone(),
    ColorMode::Gradient {
      from,
      to,
      mix,
      contrast,
    } => {
      let center = formation.centroid();
      let mut max_radius = 0.0_f32;
      let mut min_y = f32::MAX;
      let mut max_y = f32::MIN;
      for target in &formation.targets {
        max_radius = max_radius.max(distance(*target, center));
        min_y = min_y.min(target.y);
        max_y = max_y.max(target.y);
      }
      let y_span = (max_y - min_y).max(1e-6);
      let radius_span = max_radius.max(1e-6);

      formation
        .targets
        .iter()
        .map(|target| {
          let factor = match mix {
            GradientMix::Radial => distance(*target, center) / radius_span,
            GradientMix::Linear => (target.y - min_y) / y_span,
            GradientMix::Angular => {
              let angle = (target.z - center.z).atan2(target.x - center.x);
              (angle + PI) / (PI * 2.0)
            }
          };
          let factor = if *contrast {
            smoothstep(0.0, 1.0, factor)
          } else {
            clamp(factor, 0.0, 1.0)
          };
          [
            from[0] + (to[0] - from[0]) * factor,
            from[1] + (to[1] - from[1]) * factor,
            from[2] + (to[2] - from[2]) * factor,
          ]
        })
        .collect()
    }
  }
}

// Staged, cancellable formation upload. Chunks accumulate against a
// generation number; only a commit for the live generation swaps in, so a
// stale producer can never overwrite a newer formation.
#[derive(Debug, Default)]
pub struct FormationStage {
  generation: u64,
  pending: Option<Pending>,
}

#[derive(Debug)]
struct Pending {
  generation: u64,
  expected: usize,
  targets: Vec<Vec3>,
  source_colors: Vec<[f32; 3]>,
}

impl FormationStage {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn begin(&mut self, expected: usize) -> u64 {
    self.generation += 1;
    self.pending = Some(Pending {
      generation: self.generation,
      expected,
      targets: Vec::with_capacity(expected),
      source_colors: Vec::with_capacity(expected),
    });
    self.generation
  }

  pub fn extend(&mut self, generation: u64, points: &[(Vec3, [f32; 3])]) -> bool {
    let Some(pending) = self.pending.as_mut() else {
      return false;
    };
    if pending.generation != generation {
      return false;
    }
    for (target, color) in points {
      if pending.targets.len() >= pending.expected {
        break;
      }
      pending.targets.push(*target);
      pending.source_colors.push(*color);
    }
    true
  }

  pub fn commit(&mut self, generation: u64) -> Option<Formation> {
    // A stale commit must not disturb a newer in-flight upload.
    if self.pending.as_ref().map(|pending| pending.generation) != Some(generation) {
      return None;
    }
    let pending = self.pending.take()?;
    if pending.targets.len() != pending.expected || pending.targets.is_empty() {
      return None;
    }
    Some(Formation {
      targets: pending.targets,
      source_colors: pending.source_colors,
    })
  }

  pub fn cancel(&mut self) {
    self.pending = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::engine::math::vec3;

  fn line_formation() -> Formation {
    Formation {
      targets: vec![
        vec3(0.0, -1.0, 0.0),
        vec3(0.0, 0.0, 0.0),
        vec3(0.0, 1.0, 0.0),
      ],
      source_colors: vec![[1.0, 0.0, 0.0]; 3],
    }
  }

  #[test]
  fn source_mode_keeps_sampled_colors() {
    let formation = line_formation();
    let colors = assign_colors(&formation, &ColorMode::Source);
    assert_eq!(colors, formation.source_colors);
  }

  #[test]
  fn linear_gradient_spans_vertical_extent() {
    let formation = line_formation();
    let mode = ColorMode::Gradient {
      from: [0.0, 0.0, 0.0],
      to: [1.0, 1.0, 1.0],
      mix: GradientMix::Linear,
      contrast: false,
    };
    let colors = assign_colors(&formation, &mode);
    assert_eq!(colors[0], [0.0, 0.0, 0.0]);
    assert_eq!(colors[2], [1.0, 1.0, 1.0]);
    assert!((colors[1][0] - 0.5).abs() < 1e-6);
  }

  #[test]
  fn contrast_curve_pushes_midtones_apart() {
    let formation = Formation {
      targets: vec![
        vec3(0.0, 0.0, 0.0),
        vec3(0.0, 0.25, 0.0),
        vec3(0.0, 1.0, 0.0),
      ],
      source_colors: vec![[0.0; 3]; 3],
    };
    let flat = assign_colors(
      &formation,
      &ColorMode::Gradient {
        from: [0.0; 3],
        to: [1.0; 3],
        mix: GradientMix::Linear,
        contrast: false,
      },
    );
    let curved = assign_colors(
      &formation,
      &ColorMode::Gradient {
        from: [0.0; 3],
        to: [1.0; 3],
        mix: GradientMix::Linear,
        contrast: true,
      },
    );
    assert!(curved[1][0] < flat[1][0]);
  }

  #[test]
  fn radial_gradient_is_zero_at_centroid() {
    let formation = Formation {
      targets: vec![
        vec3(-1.0, 0.0, 0.0),
        vec3(0.0, 0.0, 0.0),
        vec3(1.0, 0.0, 0.0),
      ],
      source_colors: vec![[0.0; 3]; 3],
    };
    let colors = assign_colors(
      &formation,
      &ColorMode::Gradient {
        from: [0.0; 3],
        to: [1.0; 3],
        mix: GradientMix::Radial,
        contrast: false,
      },
    );
    assert_eq!(colors[1], [0.0, 0.0, 0.0]);
    assert_eq!(colors[0], [1.0, 1.0, 1.0]);
  }

  #[test]
  fn stale_commit_is_discarded() {
    let mut stage = FormationStage::new();
    let first = stage.begin(2);
    assert!(stage.extend(first, &[(vec3(0.0, 0.0, 0.0), [1.0; 3])]));

    // A newer upload supersedes the in-flight one; chunks and commits for
    // the old generation fall on the floor without touching it.
    let second = stage.begin(1);
    assert!(!stage.extend(first, &[(vec3(1.0, 0.0, 0.0), [1.0; 3])]));
    assert!(stage.commit(first).is_none());

    assert!(stage.extend(second, &[(vec3(2.0, 0.0, 0.0), [1.0; 3])]));
    let formation = stage.commit(second).expect("live generation commits");
    assert_eq!(formation.len(), 1);
  }

  #[test]
  fn incomplete_upload_does_not_commit() {
    let mut stage = FormationStage::new();
    let generation = stage.begin(3);
    stage.extend(generation, &[(vec3(0.0, 0.0, 0.0), [1.0; 3])]);
    assert!(stage.commit(generation).is_none());
  }

  #[test]
  fn default_sphere_targets_are_unit_radius() {
    let formation = Formation::default_sphere(512);
    assert_eq!(formation.len(), 512);
    for target in &formation.targets {
      let radius = crate::engine::math::length(*target);
      assert!((radius - 1.0).abs() < 1e-3);
    }
  }
}
