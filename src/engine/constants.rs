// Detection gates
pub const MIN_DETECTION_CONFIDENCE: f32 = 0.6;
pub const MIN_HAND_SCALE: f32 = 0.04;

// Gesture geometry, all proportional to hand scale (wrist to index MCP)
pub const FINGER_EXTEND_BUFFER: f32 = 0.1;
pub const THUMB_EXTEND_RATIO: f32 = 0.5;
pub const PINCH_RATIO: f32 = 0.45;
pub const OPENNESS_MIN_RATIO: f32 = 1.1;
pub const OPENNESS_MAX_RATIO: f32 = 2.1;

// Landmark smoothing
pub const SMOOTH_SLOW_FACTOR: f32 = 0.25;
pub const SMOOTH_FAST_FACTOR: f32 = 0.85;
pub const SMOOTH_FAST_SPEED: f32 = 6.0;
pub const OPENNESS_SMOOTH_FACTOR: f32 = 0.15;

// Dual-hand interaction
pub const BURST_DELTA: f32 = 0.09;
pub const BURST_COOLDOWN: f32 = 1.5;
pub const SUPER_BURST_COOLDOWN: f32 = 2.0;
pub const MODEL_CYCLE_COOLDOWN: f32 = 1.0;

// Particle field
pub const FIELD_SCALE_LERP: f32 = 0.12;
pub const FIELD_OFFSET_LERP: f32 = 0.15;
pub const FIELD_MIN_SCALE: f32 = 0.35;
pub const FIELD_MAX_SCALE: f32 = 1.6;
pub const SPRING_STIFFNESS: f32 = 14.0;
pub const SPRING_DAMPING: f32 = 0.82;
pub const AGITATED_STIFFNESS: f32 = 26.0;
pub const AGITATED_DAMPING: f32 = 0.74;
pub const NOISE_AMPLITUDE: f32 = 0.035;
pub const BURST_ENERGY: f32 = 1.0;
pub const SUPER_BURST_ENERGY: f32 = 1.6;
pub const BURST_DECAY_RATE: f32 = 1.8;
pub const SUPER_BURST_DECAY_RATE: f32 = 2.6;
pub const BURST_ACTIVE_FLOOR: f32 = 0.05;
pub const BURST_FLASH_FLOOR: f32 = 0.5;
pub const SCATTER_ENERGY: f32 = 0.3;
pub const BURST_IMPULSE: f32 = 0.9;
pub const BURST_JITTER: f32 = 0.25;
pub const HIT_SHAKE_AMPLITUDE: f32 = 0.06;
pub const HIT_SHAKE_FREQUENCY: f32 = 31.0;
pub const EXPLOSION_SPEED_MIN: f32 = 0.6;
pub const EXPLOSION_SPEED_MAX: f32 = 2.4;
pub const EXPLOSION_DAMPING: f32 = 0.96;
pub const STRETCH_SPEED: f32 = 1.4;
pub const STRETCH_MAX: f32 = 2.2;
pub const PARTICLE_BASE_SIZE: f32 = 0.022;

// Scene mapping: camera-space [0,1] into world units
pub const SCENE_HALF_WIDTH: f32 = 4.0;
pub const SCENE_HALF_HEIGHT: f32 = 2.4;

// Obstacle course
pub const LANE_COUNT: usize = 5;
pub const OBSTACLE_POOL_SIZE: usize = 96;
pub const LANE_HOLD_MIN: u32 = 2;
pub const LANE_HOLD_MAX: u32 = 5;
pub const SPAWN_INTERVAL_BASE: f32 = 1.6;
pub const SPAWN_INTERVAL_MIN: f32 = 0.55;
pub const SPAWN_INTERVAL_SCORE_STEP: f32 = 0.004;
pub const SLOW_SPAWN_STRETCH: f32 = 1.6;
pub const WAVE_SIZE_SCORE_STEP: i64 = 120;
pub const WAVE_SIZE_MAX: usize = 3;
pub const HEAL_CHANCE: f32 = 0.08;
pub const SLOW_CHANCE: f32 = 0.07;
pub const OBSTACLE_SPEED_BASE: f32 = 1.1;
pub const OBSTACLE_SPEED_SCORE_STEP: f32 = 0.0035;
pub const OBSTACLE_SPEED_MAX: f32 = 2.6;
pub const OBSTACLE_SPEED_JITTER: f32 = 0.18;
pub const OBSTACLE_SCALE_MIN: f32 = 0.6;
pub const OBSTACLE_SCALE_MAX: f32 = 1.4;
pub const PICKUP_SCALE_MIN: f32 = 0.5;
pub const PICKUP_SCALE_MAX: f32 = 0.8;
pub const OBSTACLE_ROTATION_SPEED_MAX: f32 = 2.4;
pub const OBSTACLE_BASE_SIZE: f32 = 0.32;
pub const SPAWN_X: f32 = 5.2;
pub const DESPAWN_X: f32 = -5.2;
pub const LANE_TOP_Y: f32 = 1.9;
pub const LANE_BOTTOM_Y: f32 = -1.9;
pub const PLAYER_BASE_RADIUS: f32 = 0.42;
pub const OBSTACLE_RADIUS_RATIO: f32 = 0.28;
pub const SLOW_DURATION: f32 = 5.0;
pub const SLOW_FACTOR: f32 = 0.4;
pub const PASS_SCORE: i64 = 10;

// Game state
pub const MAX_LIVES: u32 = 3;
pub const HIT_FLASH_DURATION: f32 = 0.8;
pub const MAX_PLAYERS: usize = 2;

pub const TICK_MS: u64 = 33;
