use super::constants::{
  HIT_FLASH_DURATION, MAX_LIVES, MODEL_CYCLE_COOLDOWN, OBSTACLE_BASE_SIZE, SCENE_HALF_HEIGHT,
  SCENE_HALF_WIDTH,
};
use super::formation::{ColorMode, Formation, FormationStage};
use super::gesture::{classify, Classification};
use super::interaction::{BurstTrigger, InteractionDetector};
use super::landmarks::LandmarkFrame;
use super::math::{vec3, Vec3};
use super::obstacles::{ObstacleEngine, PlayerVolume};
use super::particles::{FieldInput, ParticleField};
use super::smoothing::HandSlot;
use super::types::{GameEvent, GameSnapshot, Gesture, HandData, HandSnapshot, Instance};

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
  pub dual_hand: bool,
  pub particle_count: usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      dual_hand: false,
      particle_count: 12_000,
    }
  }
}

// The whole core advances inside one synchronous advance(dt) call; the host
// owns the scheduling loop. Hand inference is allowed to skip frames: the
// last ingested HandData is carried forward until a new result arrives.
pub struct Engine {
  config: EngineConfig,
  clock: f32,
  last_ingest_clock: Option<f32>,
  hand_slots: [HandSlot; 2],
  hands: [Option<HandData>; 2],
  interaction: InteractionDetector,
  fields: Vec<ParticleField>,
  obstacles: ObstacleEngine,
  stage: FormationStage,
  game_active: bool,
  lives: u32,
  score: i64,
  hit_remaining: f32,
  game_over: bool,
  model_cycle_ready_at: f32,
  events: Vec<GameEvent>,
  instances: Vec<Instance>,
}

impl Engine {
  pub fn new(config: EngineConfig) -> Self {
    let formation = Formation::default_sphere(config.particle_count);
    let field_count = if config.dual_hand { 2 } else { 1 };
    let fields = (0..field_count)
      .map(|_| ParticleField::new(formation.clone(), ColorMode::Source))
      .collect();
    Self {
      config,
      clock: 0.0,
      last_ingest_clock: None,
      hand_slots: [HandSlot::new(), HandSlot::new()],
      hands: [None, None],
      interaction: InteractionDetector::new(),
      fields,
      obstacles: ObstacleEngine::new(),
      stage: FormationStage::new(),
      game_active: false,
      lives: MAX_LIVES,
      score: 0,
      hit_remaining: 0.0,
      game_over: false,
      model_cycle_ready_at: 0.0,
      events: Vec::new(),
      instances: Vec::new(),
    }
  }

  pub fn config(&self) -> EngineConfig {
    self.config
  }

  pub fn set_game_active(&mut self, active: bool) {
    self.game_active = active;
  }

  pub fn set_color_mode(&mut self, color_mode: ColorMode) {
    for field in self.fields.iter_mut() {
      field.set_color_mode(color_mode);
    }
  }

  pub fn begin_formation(&mut self, expected: usize) -> u64 {
    self.stage.begin(expected)
  }

  pub fn extend_formation(&mut self, generation: u64, points: &[(Vec3, [f32; 3])]) -> bool {
    self.stage.extend(generation, points)
  }

  // The swap is atomic from the core's point of view: commits happen from
  // the session between advance() calls, and a stale generation is dropped.
  pub fn commit_formation(&mut self, generation: u64) -> bool {
    let Some(formation) = self.stage.commit(generation) else {
      return false;
    };
    tracing::debug!(points = formation.len(), "formation committed");
    for field in self.fields.iter_mut() {
      field.set_formation(formation.clone());
    }
    true
  }

  pub fn cancel_formation(&mut self) {
    self.stage.cancel();
  }

  // A new inference result for up to two hand slots. `None` in a slot means
  // tracking was lost there: smoothing history is cleared so the next
  // appearance starts from a fresh sample.
  pub fn ingest(&mut self, frames: [Option<LandmarkFrame>; 2]) {
    let allow_point = !self.config.dual_hand;
    let step = match self.last_ingest_clock {
      Some(last) => (self.clock - last).max(1e-3),
      None => 1.0 / 30.0,
    };
    self.last_ingest_clock = Some(self.clock);

    let mut classified: [Option<Classification>; 2] = [None, None];
    for (slot, frame) in frames.iter().enumerate() {
      classified[slot] = frame.as_ref().and_then(|frame| classify(frame, allow_point));
    }

    // Both hands pinching is the rotation pose; the continuous signal is
    // the inter-pinch angle.
    if let (Some(first), Some(second)) = (&classified[0], &classified[1]) {
      if first.hand.gesture == Gesture::Pinch && second.hand.gesture == Gesture::Pinch {
        let a = first.hand.pinch_position.unwrap_or(first.hand.palm_position);
        let b = second.hand.pinch_position.unwrap_or(second.hand.palm_position);
        let angle = (b.y - a.y).atan2(b.x - a.x);
        for entry in classified.iter_mut() {
          if let Some(result) = entry {
            result.hand.gesture = Gesture::TwoHandRotation;
            result.hand.rotation = angle;
          }
        }
      }
    }

    for slot in 0..2 {
      match &classified[slot] {
        Some(result) => {
          let smoothed = self.hand_slots[slot].apply(
            result.hand,
            result.wrist,
            result.hand_scale,
            step,
          );
          self.hands[slot] = Some(smoothed);
        }
        None => {
          self.hand_slots[slot].clear();
          self.hands[slot] = None;
        }
      }
    }
  }

  pub fn advance(&mut self, dt: f32) {
    self.clock += dt;
    self.hit_remaining = (self.hit_remaining - dt).max(0.0);

    let trigger = self
      .interaction
      .update([self.hands[0].as_ref(), self.hands[1].as_ref()], self.clock);
    match trigger {
      BurstTrigger::Burst => self.events.push(GameEvent::Burst),
      BurstTrigger::SuperBurst => self.events.push(GameEvent::SuperBurst),
      BurstTrigger::None => {}
    }

    let ok_sign = self
      .hands
      .iter()
      .flatten()
      .any(|hand| hand.gesture == Gesture::OkSign);
    if ok_sign && self.clock >= self.model_cycle_ready_at {
      self.model_cycle_ready_at = self.clock + MODEL_CYCLE_COOLDOWN;
      self.events.push(GameEvent::ModelCycle);
    }

    self.advance_fields(dt, trigger);
    self.advance_game(dt);
    self.rebuild_instances();
  }

  fn advance_fields(&mut self, dt: f32, trigger: BurstTrigger) {
    let is_hit = self.hit_remaining > 0.0;
    for (index, field) in self.fields.iter_mut().enumerate() {
      let hand = if self.config.dual_hand {
        self.hands[index].as_ref()
      } else {
        self.hands[0].as_ref().or(self.hands[1].as_ref())
      };
      field.set_hidden(self.config.dual_hand && hand.is_none());

      let input = FieldInput {
        openness: hand.map(|hand| hand.openness),
        palm: hand.map(|hand| map_to_scene(hand.palm_position)),
        is_hit,
        is_exploding: self.game_over,
        burst: trigger == BurstTrigger::Burst,
        super_burst: trigger == BurstTrigger::SuperBurst,
        scattering: hand.map(|hand| hand.gesture == Gesture::ThumbScatter).unwrap_or(false),
      };
      field.advance(dt, &input);
    }
  }

  fn advance_game(&mut self, dt: f32) {
    if !self.game_active || self.game_over {
      return;
    }

    let players: Vec<PlayerVolume> = self
      .fields
      .iter()
      .map(|field| PlayerVolume {
        position: field.position(),
        scale: field.scale_factor(),
      })
      .collect();

    let mut game_events = Vec::new();
    self
      .obstacles
      .advance(dt, &players, self.score, &mut game_events);

    for event in &game_events {
      self.apply_game_event(event);
    }
    self.events.extend(game_events);
  }

  fn apply_game_event(&mut self, event: &GameEvent) {
    match event {
      GameEvent::Hit { player } => {
        self.lives = self.lives.saturating_sub(1);
        self.hit_remaining = HIT_FLASH_DURATION;
        if self.lives == 0 {
          self.game_over = true;
          tracing::info!(score = self.score, "game over");
        }
        tracing::debug!(player, lives = self.lives, "player hit");
      }
      GameEvent::Heal { .. } => {
        self.lives = (self.lives + 1).min(MAX_LIVES);
      }
      GameEvent::Score { points } => {
        self.score += points;
      }
      _ => {}
    }
  }

  fn rebuild_instances(&mut self) {
    self.instances.clear();
    for field in &self.fields {
      field.emit(&mut self.instances);
    }
    for obstacle in self.obstacles.obstacles() {
      if !obstacle.active {
        self.instances.push(Instance::hidden());
        continue;
      }
      let size = obstacle.scale * OBSTACLE_BASE_SIZE;
      let color = match obstacle.kind {
        super::types::ObstacleKind::Obstacle => [0.95, 0.3, 0.25],
        super::types::ObstacleKind::Heal => [0.3, 0.9, 0.45],
        super::types::ObstacleKind::Slow => [0.35, 0.55, 0.95],
      };
      self.instances.push(Instance {
        position: obstacle.position,
        scale: vec3(size, size, size),
        color,
        rotation: obstacle.rotation,
      });
    }
  }

  pub fn reset(&mut self) {
    for field in self.fields.iter_mut() {
      field.reset();
    }
    for slot in self.hand_slots.iter_mut() {
      slot.clear();
    }
    self.hands = [None, None];
    self.interaction.reset();
    self.obstacles.reset();
    self.lives = MAX_LIVES;
    self.score = 0;
    self.hit_remaining = 0.0;
    self.game_over = false;
    self.model_cycle_ready_at = 0.0;
    self.events.clear();
    tracing::debug!("engine reset");
  }

  // Debug hook: behaves exactly as if an obstacle had connected.
  pub fn force_hit(&mut self, player: usize) {
    if player >= self.fields.len() {
      return;
    }
    let event = GameEvent::Hit { player };
    self.apply_game_event(&event);
    self.events.push(event);
  }

  pub fn drain_events(&mut self) -> Vec<GameEvent> {
    std::mem::take(&mut self.events)
  }

  pub fn instances(&self) -> &[Instance] {
    &self.instances
  }

  pub fn hand_snapshots(&self) -> [Option<HandSnapshot>; 2] {
    [
      self.hands[0].as_ref().map(HandSnapshot::from),
      self.hands[1].as_ref().map(HandSnapshot::from),
    ]
  }

  pub fn game_snapshot(&self) -> GameSnapshot {
    GameSnapshot {
      lives: self.lives,
      score: self.score,
      is_hit: self.hit_remaining > 0.0,
      is_game_over: self.game_over,
      game_active: self.game_active,
      slow_remaining: self.obstacles.slow_remaining(),
    }
  }

  pub fn instance_count(&self) -> usize {
    self.instances.len()
  }
}

// Camera space is [0,1] with y growing downward; the scene is centered on
// the origin with y growing upward.
fn map_to_scene(camera: Vec3) -> Vec3 {
  vec3(
    (camera.x - 0.5) * 2.0 * SCENE_HALF_WIDTH,
    (0.5 - camera.y) * 2.0 * SCENE_HALF_HEIGHT,
    camera.z,
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::engine::constants::OBSTACLE_POOL_SIZE;
  use crate::engine::math::vec3;

  fn test_engine() -> Engine {
    Engine::new(EngineConfig {
      dual_hand: false,
      particle_count: 64,
    })
  }

  fn hand_with(gesture: Gesture) -> HandData {
    HandData {
      gesture,
      palm_position: vec3(0.5, 0.5, 0.0),
      pinch_position: None,
      pointer_position: vec3(0.5, 0.4, 0.0),
      rotation: 0.0,
      openness: 0.5,
    }
  }

  #[test]
  fn instance_buffer_has_fixed_size() {
    let mut engine = test_engine();
    engine.advance(1.0 / 60.0);
    assert_eq!(engine.instance_count(), 64 + OBSTACLE_POOL_SIZE);

    // Size holds with or without active obstacles.
    engine.set_game_active(true);
    for _ in 0..120 {
      engine.advance(1.0 / 30.0);
    }
    assert_eq!(engine.instance_count(), 64 + OBSTACLE_POOL_SIZE);
  }

  #[test]
  fn hits_consume_lives_until_game_over_and_heals_are_capped() {
    let mut engine = test_engine();
    engine.set_game_active(true);

    engine.apply_game_event(&GameEvent::Hit { player: 0 });
    let snapshot = engine.game_snapshot();
    assert_eq!(snapshot.lives, MAX_LIVES - 1);
    assert!(snapshot.is_hit);

    engine.apply_game_event(&GameEvent::Heal { player: 0 });
    engine.apply_game_event(&GameEvent::Heal { player: 0 });
    assert_eq!(engine.game_snapshot().lives, MAX_LIVES);

    for _ in 0..MAX_LIVES {
      engine.apply_game_event(&GameEvent::Hit { player: 0 });
    }
    assert!(engine.game_snapshot().is_game_over);

    engine.apply_game_event(&GameEvent::Score { points: 10 });
    assert_eq!(engine.game_snapshot().score, 10);
  }

  #[test]
  fn dual_fists_emit_a_super_burst_event() {
    let mut engine = test_engine();
    engine.hands[0] = Some(hand_with(Gesture::ClosedFist));
    engine.hands[1] = Some(hand_with(Gesture::ClosedFist));
    engine.advance(1.0 / 60.0);
    assert!(engine.drain_events().contains(&GameEvent::SuperBurst));
  }

  #[test]
  fn ok_sign_cycles_models_with_debounce() {
    let mut engine = test_engine();
    engine.hands[0] = Some(hand_with(Gesture::OkSign));

    engine.advance(1.0 / 60.0);
    engine.advance(1.0 / 60.0);
    let cycles = engine
      .drain_events()
      .into_iter()
      .filter(|event| *event == GameEvent::ModelCycle)
      .count();
    assert_eq!(cycles, 1);

    // Past the debounce window it may fire again.
    engine.advance(MODEL_CYCLE_COOLDOWN + 0.1);
    let cycles = engine
      .drain_events()
      .into_iter()
      .filter(|event| *event == GameEvent::ModelCycle)
      .count();
    assert_eq!(cycles, 1);
  }

  #[test]
  fn committed_formation_swaps_into_every_field() {
    let mut engine = test_engine();
    let generation = engine.begin_formation(3);
    let points = [
      (vec3(0.0, 0.0, 0.0), [1.0, 0.0, 0.0]),
      (vec3(1.0, 0.0, 0.0), [0.0, 1.0, 0.0]),
      (vec3(0.0, 1.0, 0.0), [0.0, 0.0, 1.0]),
    ];
    assert!(engine.extend_formation(generation, &points));
    assert!(engine.commit_formation(generation));
    engine.advance(1.0 / 60.0);
    assert_eq!(engine.instance_count(), 3 + OBSTACLE_POOL_SIZE);
  }

  #[test]
  fn stale_formation_commit_is_rejected() {
    let mut engine = test_engine();
    let old = engine.begin_formation(1);
    let _new = engine.begin_formation(1);
    assert!(!engine.commit_formation(old));
  }

  #[test]
  fn obstacles_stay_idle_until_the_game_is_activated() {
    let mut engine = test_engine();
    for _ in 0..300 {
      engine.advance(1.0 / 30.0);
    }
    assert_eq!(engine.obstacles.active_count(), 0);

    engine.set_game_active(true);
    for _ in 0..300 {
      engine.advance(1.0 / 30.0);
    }
    assert!(engine.obstacles.active_count() > 0);
  }

  #[test]
  fn reset_restores_initial_game_state() {
    let mut engine = test_engine();
    engine.set_game_active(true);
    engine.score = 500;
    engine.lives = 1;
    engine.game_over = true;
    engine.hands[0] = Some(hand_with(Gesture::OpenHand));

    engine.reset();
    let snapshot = engine.game_snapshot();
    assert_eq!(snapshot.lives, MAX_LIVES);
    assert_eq!(snapshot.score, 0);
    assert!(!snapshot.is_game_over);
    assert!(engine.hands[0].is_none());
    // Game mode selection survives a reset.
    assert!(snapshot.game_active);
  }

  #[test]
  fn hands_carry_forward_between_ingests() {
    let mut engine = test_engine();
    engine.hands[0] = Some(hand_with(Gesture::OpenHand));
    for _ in 0..10 {
      engine.advance(1.0 / 60.0);
    }
    assert!(engine.hands[0].is_some());

    engine.ingest([None, None]);
    assert!(engine.hands[0].is_none());
  }
}
