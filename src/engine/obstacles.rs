use super::constants::{
  DESPAWN_X, HEAL_CHANCE, LANE_BOTTOM_Y, LANE_COUNT, LANE_HOLD_MAX, LANE_HOLD_MIN,
  MAX_PLAYERS, OBSTACLE_POOL_SIZE, OBSTACLE_RADIUS_RATIO, OBSTACLE_ROTATION_SPEED_MAX,
  OBSTACLE_SCALE_MAX, OBSTACLE_SCALE_MIN, OBSTACLE_SPEED_BASE, OBSTACLE_SPEED_JITTER,
  OBSTACLE_SPEED_MAX, OBSTACLE_SPEED_SCORE_STEP, PASS_SCORE, PICKUP_SCALE_MAX,
  PICKUP_SCALE_MIN, PLAYER_BASE_RADIUS, SLOW_CHANCE, SLOW_DURATION, SLOW_FACTOR,
  SLOW_SPAWN_STRETCH, SPAWN_INTERVAL_BASE, SPAWN_INTERVAL_MIN, SPAWN_INTERVAL_SCORE_STEP,
  SPAWN_X, WAVE_SIZE_MAX, WAVE_SIZE_SCORE_STEP,
};
use super::math::{distance, vec3, Vec3};
use super::types::{GameEvent, ObstacleKind};
use rand::seq::SliceRandom;
use rand::Rng;
use std::f32::consts::PI;

#[derive(Debug, Clone, Copy)]
pub struct PlayerVolume {
  pub position: Vec3,
  pub scale: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Obstacle {
  pub active: bool,
  pub position: Vec3,
  pub rotation: f32,
  pub rotation_speed: f32,
  pub speed: f32,
  pub scale: f32,
  pub kind: ObstacleKind,
}

impl Obstacle {
  fn inactive() -> Self {
    Self {
      active: false,
      position: super::math::ZERO,
      rotation: 0.0,
      rotation_speed: 0.0,
      speed: 0.0,
      scale: 0.0,
      kind: ObstacleKind::Obstacle,
    }
  }
}

// Fixed-size pool: spawning activates a free slot and overwrites all of its
// state; nothing is ever allocated mid-game. One lane is held hazard-free
// per wave so the pattern always stays passable.
#[derive(Debug)]
pub struct ObstacleEngine {
  pool: Vec<Obstacle>,
  active_lane: usize,
  lane_hold: u32,
  spawn_timer: f32,
  slow_remaining: f32,
}

impl ObstacleEngine {
  pub fn new() -> Self {
    Self {
      pool: vec![Obstacle::inactive(); OBSTACLE_POOL_SIZE],
      active_lane: LANE_COUNT / 2,
      lane_hold: LANE_HOLD_MIN,
      spawn_timer: 0.0,
      slow_remaining: 0.0,
    }
  }

  pub fn reset(&mut self) {
    for slot in self.pool.iter_mut() {
      *slot = Obstacle::inactive();
    }
    self.active_lane = LANE_COUNT / 2;
    self.lane_hold = LANE_HOLD_MIN;
    self.spawn_timer = 0.0;
    self.slow_remaining = 0.0;
  }

  pub fn obstacles(&self) -> &[Obstacle] {
    &self.pool
  }

  pub fn active_count(&self) -> usize {
    self.pool.iter().filter(|slot| slot.active).count()
  }

  pub fn slow_multiplier(&self) -> f32 {
    if self.slow_remaining > 0.0 {
      SLOW_FACTOR
    } else {
      1.0
    }
  }

  pub fn slow_remaining(&self) -> f32 {
    self.slow_remaining
  }

  pub fn advance(
    &mut self,
    dt: f32,
    players: &[PlayerVolume],
    score: i64,
    events: &mut Vec<GameEvent>,
  ) {
    self.slow_remaining = (self.slow_remaining - dt).max(0.0);

    self.spawn_timer += dt;
    let interval = spawn_interval(score, self.slow_remaining > 0.0);
    if self.spawn_timer >= interval {
      self.spawn_timer = 0.0;
      let mut rng = rand::thread_rng();
      self.spawn_wave(score, &mut rng);
    }

    let slow_multiplier = self.slow_multiplier();
    for index in 0..self.pool.len() {
      if !self.pool[index].active {
        continue;
      }
      {
        let obstacle = &mut self.pool[index];
        obstacle.position.x -= obstacle.speed * slow_multiplier * dt;
        obstacle.rotation += obstacle.rotation_speed * dt;
      }

      if let Some(event) = self.resolve_collision(index, players) {
        if matches!(event, GameEvent::Slow { .. }) {
          self.slow_remaining = SLOW_DURATION;
        }
        events.push(event);
        self.pool[index].active = false;
        continue;
      }

      if self.pool[index].position.x < DESPAWN_X {
        self.pool[index].active = false;
        if self.pool[index].kind == ObstacleKind::Obstacle {
          events.push(GameEvent::Score { points: PASS_SCORE });
        }
      }
    }
  }

  // Players are scanned in slot order; the first one inside the combined
  // radius claims the obstacle, so the lower index always wins a tie.
  fn resolve_collision(&self, index: usize, players: &[PlayerVolume]) -> Option<GameEvent> {
    let obstacle = &self.pool[index];
    for (player, volume) in players.iter().enumerate().take(MAX_PLAYERS) {
      let threshold =
        PLAYER_BASE_RADIUS * volume.scale + obstacle.scale * OBSTACLE_RADIUS_RATIO;
      if distance(obstacle.position, volume.position) < threshold {
        return Some(match obstacle.kind {
          ObstacleKind::Obstacle => GameEvent::Hit { player },
          ObstacleKind::Heal => GameEvent::Heal { player },
          ObstacleKind::Slow => GameEvent::Slow { player },
        });
      }
    }
    None
  }

  fn spawn_wave<R: Rng>(&mut self, score: i64, rng: &mut R) {
    if self.lane_hold == 0 {
      let shift = rng.gen_range(-1_i32..=1);
      self.active_lane =
        (self.active_lane as i32 + shift).clamp(0, LANE_COUNT as i32 - 1) as usize;
      self.lane_hold = rng.gen_range(LANE_HOLD_MIN..=LANE_HOLD_MAX);
    }
    self.lane_hold -= 1;

    let count = (1 + (score / WAVE_SIZE_SCORE_STEP) as usize).min(WAVE_SIZE_MAX);
    let mut lanes: Vec<usize> = (0..LANE_COUNT)
      .filter(|lane| *lane != self.active_lane)
      .collect();
    lanes.shuffle(rng);
    for lane in lanes.into_iter().take(count) {
      let kind = roll_kind(rng);
      self.spawn_slot(lane, kind, score, rng);
    }
  }

  fn spawn_slot<R: Rng>(&mut self, lane: usize, kind: ObstacleKind, score: i64, rng: &mut R) {
    let Some(slot) = self.pool.iter_mut().find(|slot| !slot.active) else {
      // Pool exhausted: skip the spawn rather than grow or evict.
      tracing::debug!(lane, "obstacle pool full, dropping spawn");
      return;
    };

    let jitter = 1.0 + rng.gen_range(-OBSTACLE_SPEED_JITTER..OBSTACLE_SPEED_JITTER);
    let slow_factor = if self.slow_remaining > 0.0 { 0.5 } else { 1.0 };
    let scale = match kind {
      ObstacleKind::Obstacle => rng.gen_range(OBSTACLE_SCALE_MIN..OBSTACLE_SCALE_MAX),
      _ => rng.gen_range(PICKUP_SCALE_MIN..PICKUP_SCALE_MAX),
    };

    *slot = Obstacle {
      active: true,
      position: vec3(SPAWN_X, lane_center_y(lane), 0.0),
      rotation: rng.gen_range(0.0..PI * 2.0),
      rotation_speed: rng.gen_range(-OBSTACLE_ROTATION_SPEED_MAX..OBSTACLE_ROTATION_SPEED_MAX),
      speed: global_speed(score) * slow_factor * jitter,
      scale,
      kind,
    };
  }
}

impl Default for ObstacleEngine {
  fn default() -> Self {
    Self::new()
  }
}

pub fn lane_center_y(lane: usize) -> f32 {
  let lane_height = (super::constants::LANE_TOP_Y - LANE_BOTTOM_Y) / LANE_COUNT as f32;
  LANE_BOTTOM_Y + (lane as f32 + 0.5) * lane_height
}

pub fn spawn_interval(score: i64, slowed: bool) -> f32 {
  let interval =
    (SPAWN_INTERVAL_BASE - score as f32 * SPAWN_INTERVAL_SCORE_STEP).max(SPAWN_INTERVAL_MIN);
  if slowed {
    interval * SLOW_SPAWN_STRETCH
  } else {
    interval
  }
}

pub fn global_speed(score: i64) -> f32 {
  (OBSTACLE_SPEED_BASE + score as f32 * OBSTACLE_SPEED_SCORE_STEP).min(OBSTACLE_SPEED_MAX)
}

fn roll_kind<R: Rng>(rng: &mut R) -> ObstacleKind {
  let roll: f32 = rng.gen();
  if roll < HEAL_CHANCE {
    ObstacleKind::Heal
  } else if roll < HEAL_CHANCE + SLOW_CHANCE {
    ObstacleKind::Slow
  } else {
    ObstacleKind::Obstacle
  }
}
