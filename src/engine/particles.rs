use super::constants::{
  AGITATED_DAMPING, AGITATED_STIFFNESS, BURST_ACTIVE_FLOOR, BURST_DECAY_RATE, BURST_ENERGY,
  BURST_FLASH_FLOOR, BURST_IMPULSE, BURST_JITTER, EXPLOSION_DAMPING, EXPLOSION_SPEED_MAX,
  EXPLOSION_SPEED_MIN, FIELD_MAX_SCALE, FIELD_MIN_SCALE, FIELD_OFFSET_LERP, FIELD_SCALE_LERP,
  HIT_SHAKE_AMPLITUDE, HIT_SHAKE_FREQUENCY, NOISE_AMPLITUDE, PARTICLE_BASE_SIZE, SCATTER_ENERGY,
  SPRING_DAMPING, SPRING_STIFFNESS, STRETCH_MAX, STRETCH_SPEED, SUPER_BURST_DECAY_RATE,
  SUPER_BURST_ENERGY,
};
use super::formation::{assign_colors, ColorMode, Formation};
use super::math::{add, clamp, length, lerp, lerp_vec, normalize, scale, sub, vec3, Vec3, ZERO};
use rand::Rng;
use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, Default)]
pub struct FieldInput {
  pub openness: Option<f32>,
  pub palm: Option<Vec3>,
  pub is_hit: bool,
  pub is_exploding: bool,
  pub burst: bool,
  pub super_burst: bool,
  pub scattering: bool,
}

// One particle formation and its simulation state. Two fields can run side
// by side in dual-hand mode; they share nothing but the caller's clock.
#[derive(Debug)]
pub struct ParticleField {
  formation: Formation,
  color_mode: ColorMode,
  base_colors: Vec<[f32; 3]>,
  positions: Vec<Vec3>,
  velocities: Vec<Vec3>,
  current_scale: f32,
  target_scale: f32,
  current_offset: Vec3,
  target_offset: Vec3,
  burst_energy: f32,
  burst_decay: f32,
  prev_burst: bool,
  prev_super_burst: bool,
  explosion_seeded: bool,
  hit_active: bool,
  hidden: bool,
  clock: f32,
}

impl ParticleField {
  pub fn new(formation: Formation, color_mode: ColorMode) -> Self {
    let base_colors = assign_colors(&formation, &color_mode);
    let count = formation.len();
    let mut rng = rand::thread_rng();
    let positions = (0..count)
      .map(|_| scale(random_unit_vector(&mut rng), rng.gen_range(0.0..0.4)))
      .collect();
    Self {
      formation,
      color_mode,
      base_colors,
      positions,
      velocities: vec![ZERO; count],
      current_scale: 1.0,
      target_scale: 1.0,
      current_offset: ZERO,
      target_offset: ZERO,
      burst_energy: 0.0,
      burst_decay: BURST_DECAY_RATE,
      prev_burst: false,
      prev_super_burst: false,
      explosion_seeded: false,
      hit_active: false,
      hidden: false,
      clock: 0.0,
    }
  }

  pub fn len(&self) -> usize {
    self.formation.len()
  }

  pub fn burst_energy(&self) -> f32 {
    self.burst_energy
  }

  pub fn set_hidden(&mut self, hidden: bool) {
    self.hidden = hidden;
  }

  pub fn position(&self) -> Vec3 {
    self.current_offset
  }

  pub fn scale_factor(&self) -> f32 {
    self.current_scale
  }

  // Swapping a formation reuses simulation state where counts overlap;
  // extra particles are seeded near the origin so they fly outward into
  // place instead of popping in.
  pub fn set_formation(&mut self, formation: Formation) {
    let count = formation.len();
    let mut rng = rand::thread_rng();
    self.positions.resize_with(count, || {
      scale(random_unit_vector(&mut rng), rng.gen_range(0.0..0.4))
    });
    self.velocities.resize(count, ZERO);
    self.formation = formation;
    self.base_colors = assign_colors(&self.formation, &self.color_mode);
    self.explosion_seeded = false;
  }

  pub fn set_color_mode(&mut self, color_mode: ColorMode) {
    self.color_mode = color_mode;
    self.base_colors = assign_colors(&self.formation, &self.color_mode);
  }

  pub fn reset(&mut self) {
    let mut rng = rand::thread_rng();
    for (position, velocity) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
      *position = scale(random_unit_vector(&mut rng), rng.gen_range(0.0..0.4));
      *velocity = ZERO;
    }
    self.current_scale = 1.0;
    self.target_scale = 1.0;
    self.current_offset = ZERO;
    self.target_offset = ZERO;
    self.burst_energy = 0.0;
    self.prev_burst = false;
    self.prev_super_burst = false;
    self.explosion_seeded = false;
    self.hit_active = false;
    self.clock = 0.0;
  }

  pub fn advance(&mut self, dt: f32, input: &FieldInput) {
    self.clock += dt;
    self.hit_active = input.is_hit;

    self.target_scale = match input.openness {
      Some(openness) => FIELD_MIN_SCALE + openness * (FIELD_MAX_SCALE - FIELD_MIN_SCALE),
      None => 1.0,
    };
    self.current_scale = lerp(self.current_scale, self.target_scale, FIELD_SCALE_LERP);

    self.target_offset = input.palm.unwrap_or(ZERO);
    self.current_offset = lerp_vec(self.current_offset, self.target_offset, FIELD_OFFSET_LERP);

    self.update_burst_energy(dt, input);

    if input.is_exploding {
      self.advance_explosion(dt);
      return;
    }

    let agitated = self.hit_active || self.burst_energy > BURST_ACTIVE_FLOOR;
    let (stiffness, damping) = if agitated {
      (AGITATED_STIFFNESS, AGITATED_DAMPING)
    } else {
      (SPRING_STIFFNESS, SPRING_DAMPING)
    };
    let noise_suppressed = input.scattering || self.burst_energy > BURST_ACTIVE_FLOOR;

    let mut rng = rand::thread_rng();
    for index in 0..self.positions.len() {
      let base = self.formation.targets[index];
      let mut target = add(scale(base, self.current_scale), self.current_offset);
      if !noise_suppressed {
        target = add(target, breathing_noise(self.clock, index, base));
      }

      let position = self.positions[index];
      let mut velocity = self.velocities[index];
      velocity = scale(add(velocity, scale(sub(target, position), stiffness * dt)), damping);

      if self.burst_energy > BURST_ACTIVE_FLOOR {
        let from_center = sub(position, self.current_offset);
        let reach = length(from_center);
        let outward = normalize(from_center);
        let impulse = self.burst_energy * BURST_IMPULSE * (1.0 + reach);
        velocity = add(velocity, scale(outward, impulse * dt));
        velocity = add(
          velocity,
          scale(random_unit_vector(&mut rng), self.burst_energy * BURST_JITTER * dt),
        );
        self.positions[index] = add(
          self.positions[index],
          scale(
            random_unit_vector(&mut rng),
            self.burst_energy * BURST_JITTER * 0.1 * reach * dt,
          ),
        );
      }

      if self.hit_active {
        let phase = self.clock * HIT_SHAKE_FREQUENCY + index as f32 * 0.7;
        self.positions[index] = add(
          self.positions[index],
          vec3(
            phase.sin() * HIT_SHAKE_AMPLITUDE * dt,
            (phase * 1.3).cos() * HIT_SHAKE_AMPLITUDE * dt,
            0.0,
          ),
        );
      }

      self.velocities[index] = velocity;
      self.positions[index] = add(self.positions[index], scale(velocity, dt));
    }
  }

  fn update_burst_energy(&mut self, dt: f32, input: &FieldInput) {
    if input.super_burst && !self.prev_super_burst {
      self.burst_energy = SUPER_BURST_ENERGY;
      self.burst_decay = SUPER_BURST_DECAY_RATE;
    } else if input.burst && !self.prev_burst {
      self.burst_energy = BURST_ENERGY;
      self.burst_decay = BURST_DECAY_RATE;
    } else {
      self.burst_energy = (self.burst_energy - self.burst_decay * dt).max(0.0);
    }
    // A scatter hold keeps a gentle outward pressure on the field without
    // reaching the color-flash range.
    if input.scattering && self.burst_energy < SCATTER_ENERGY {
      self.burst_energy = SCATTER_ENERGY;
      self.burst_decay = BURST_DECAY_RATE;
    }
    self.prev_burst = input.burst;
    self.prev_super_burst = input.super_burst;
  }

  // Terminal: once exploding, particles drift outward forever. The field
  // only comes back through reset().
  fn advance_explosion(&mut self, dt: f32) {
    if !self.explosion_seeded {
      let mut rng = rand::thread_rng();
      for velocity in self.velocities.iter_mut() {
        *velocity = scale(
          random_unit_vector(&mut rng),
          rng.gen_range(EXPLOSION_SPEED_MIN..EXPLOSION_SPEED_MAX),
        );
      }
      self.explosion_seeded = true;
    }
    for (position, velocity) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
      *position = add(*position, scale(*velocity, dt));
      *velocity = scale(*velocity, EXPLOSION_DAMPING);
    }
  }

  // Instances are emitted for every particle, every frame; a hidden field
  // writes zero scale so the instance buffer never changes size.
  pub fn emit(&self, out: &mut Vec<super::types::Instance>) {
    use super::types::Instance;

    let flash = self.hit_active || self.burst_energy > BURST_FLASH_FLOOR;
    let flash_phase = (self.clock * 24.0).sin().abs();
    for index in 0..self.positions.len() {
      if self.hidden {
        out.push(Instance::hidden());
        continue;
      }
      let velocity = self.velocities[index];
      let speed = length(velocity);
      let mut axis_scale = vec3(
        PARTICLE_BASE_SIZE,
        PARTICLE_BASE_SIZE,
        PARTICLE_BASE_SIZE,
      );
      if speed > STRETCH_SPEED {
        let stretch = clamp(speed / STRETCH_SPEED, 1.0, STRETCH_MAX);
        let direction = normalize(velocity);
        axis_scale = vec3(
          PARTICLE_BASE_SIZE * (1.0 + direction.x.abs() * (stretch - 1.0)),
          PARTICLE_BASE_SIZE * (1.0 + direction.y.abs() * (stretch - 1.0)),
          PARTICLE_BASE_SIZE * (1.0 + direction.z.abs() * (stretch - 1.0)),
        );
      }

      let base = self.base_colors[index];
      let color = if flash {
        let tint = if self.hit_active {
          [1.0, 0.25, 0.2]
        } else {
          [1.0, 0.9, 0.6]
        };
        [
          lerp(base[0], tint[0], flash_phase),
          lerp(base[1], tint[1], flash_phase),
          lerp(base[2], tint[2], flash_phase),
        ]
      } else {
        base
      };

      out.push(Instance {
        position: self.positions[index],
        scale: axis_scale,
        color,
        rotation: 0.0,
      });
    }
  }
}

// Deterministic pseudo-motion: sine/cosine of time, particle index and the
// particle's own target keeps the formation breathing without randomness.
fn breathing_noise(clock: f32, index: usize, base: Vec3) -> Vec3 {
  let seed = index as f32;
  vec3(
    (clock * 1.5 + seed * 0.37 + base.x * 3.1).sin() * NOISE_AMPLITUDE,
    (clock * 1.2 + seed * 0.53 + base.y * 2.7).cos() * NOISE_AMPLITUDE,
    (clock * 1.7 + seed * 0.29 + base.z * 2.3).sin() * NOISE_AMPLITUDE,
  )
}

fn random_unit_vector<R: Rng>(rng: &mut R) -> Vec3 {
  let theta = rng.gen_range(0.0..PI * 2.0);
  let z: f32 = rng.gen_range(-1.0..1.0);
  let radius = (1.0 - z * z).max(0.0).sqrt();
  vec3(radius * theta.cos(), z, radius * theta.sin())
}
