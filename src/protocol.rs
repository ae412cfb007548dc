use crate::engine::formation::{ColorMode, GradientMix};
use crate::engine::landmarks::LANDMARK_COUNT;
use crate::engine::math::{vec3, Vec3};
use crate::engine::types::{GameEvent, GameSnapshot, Gesture, HandSnapshot, Instance};

pub const VERSION: u8 = 1;

pub const TYPE_JOIN: u8 = 0x01;
pub const TYPE_LANDMARKS: u8 = 0x02;
pub const TYPE_RESET: u8 = 0x03;
pub const TYPE_GAME_MODE: u8 = 0x04;
pub const TYPE_COLOR_MODE: u8 = 0x05;
pub const TYPE_FORMATION_BEGIN: u8 = 0x06;
pub const TYPE_FORMATION_CHUNK: u8 = 0x07;
pub const TYPE_FORMATION_COMMIT: u8 = 0x08;

pub const TYPE_INIT: u8 = 0x10;
pub const TYPE_INSTANCES: u8 = 0x11;
pub const TYPE_HANDS: u8 = 0x12;
pub const TYPE_EVENTS: u8 = 0x13;
pub const TYPE_GAME_STATE: u8 = 0x14;

pub const FLAG_JOIN_DUAL_HAND: u16 = 1 << 0;
pub const FLAG_JOIN_PARTICLE_COUNT: u16 = 1 << 1;

pub const FLAG_HAND_0: u16 = 1 << 0;
pub const FLAG_HAND_1: u16 = 1 << 1;

const COLOR_MODE_SOURCE: u8 = 0;
const COLOR_MODE_RADIAL: u8 = 1;
const COLOR_MODE_LINEAR: u8 = 2;
const COLOR_MODE_ANGULAR: u8 = 3;

const EVENT_HIT: u8 = 0;
const EVENT_HEAL: u8 = 1;
const EVENT_SLOW: u8 = 2;
const EVENT_SCORE: u8 = 3;
const EVENT_BURST: u8 = 4;
const EVENT_SUPER_BURST: u8 = 5;
const EVENT_MODEL_CYCLE: u8 = 6;

#[derive(Debug, Clone)]
pub struct HandFrame {
  pub confidence: f32,
  pub points: Vec<Vec3>,
}

#[derive(Debug)]
pub enum ClientMessage {
  Join {
    dual_hand: bool,
    particle_count: Option<u32>,
  },
  Landmarks {
    hands: [Option<HandFrame>; 2],
  },
  Reset,
  GameMode {
    active: bool,
  },
  SetColorMode {
    mode: ColorMode,
  },
  FormationBegin {
    expected: u32,
  },
  FormationChunk {
    points: Vec<(Vec3, [f32; 3])>,
  },
  FormationCommit,
}

pub fn decode_client_message(data: &[u8]) -> Option<ClientMessage> {
  let mut reader = Reader::new(data);
  let version = reader.read_u8()?;
  if version != VERSION {
    return None;
  }
  let message_type = reader.read_u8()?;
  let flags = reader.read_u16()?;
  match message_type {
    TYPE_JOIN => {
      let dual_hand = flags & FLAG_JOIN_DUAL_HAND != 0;
      let particle_count = if flags & FLAG_JOIN_PARTICLE_COUNT != 0 {
        Some(reader.read_u32()?)
      } else {
        None
      };
      Some(ClientMessage::Join {
        dual_hand,
        particle_count,
      })
    }
    TYPE_LANDMARKS => {
      let mut hands: [Option<HandFrame>; 2] = [None, None];
      for (slot, flag) in [(0usize, FLAG_HAND_0), (1, FLAG_HAND_1)] {
        if flags & flag == 0 {
          continue;
        }
        let confidence = reader.read_f32()?;
        let mut points = Vec::with_capacity(LANDMARK_COUNT);
        for _ in 0..LANDMARK_COUNT {
          let x = reader.read_f32()?;
          let y = reader.read_f32()?;
          let z = reader.read_f32()?;
          points.push(vec3(x, y, z));
        }
        hands[slot] = Some(HandFrame { confidence, points });
      }
      Some(ClientMessage::Landmarks { hands })
    }
    TYPE_RESET => Some(ClientMessage::Reset),
    TYPE_GAME_MODE => {
      let active = reader.read_u8()? != 0;
      Some(ClientMessage::GameMode { active })
    }
    TYPE_COLOR_MODE => {
      let mode = reader.read_u8()?;
      if mode == COLOR_MODE_SOURCE {
        return Some(ClientMessage::SetColorMode {
          mode: ColorMode::Source,
        });
      }
      let mix = match mode {
        COLOR_MODE_RADIAL => GradientMix::Radial,
        COLOR_MODE_LINEAR => GradientMix::Linear,
        COLOR_MODE_ANGULAR => GradientMix::Angular,
        _ => return None,
      };
      let contrast = reader.read_u8()? != 0;
      let mut from = [0.0_f32; 3];
      let mut to = [0.0_f32; 3];
      for channel in from.iter_mut() {
        *channel = reader.read_f32()?;
      }
      for channel in to.iter_mut() {
        *channel = reader.read_f32()?;
      }
      Some(ClientMessage::SetColorMode {
        mode: ColorMode::Gradient {
          from,
          to,
          mix,
          contrast,
        },
      })
    }
    TYPE_FORMATION_BEGIN => {
      let expected = reader.read_u32()?;
      Some(ClientMessage::FormationBegin { expected })
    }
    TYPE_FORMATION_CHUNK => {
      let count = reader.read_u16()? as usize;
      let mut points = Vec::with_capacity(count);
      for _ in 0..count {
        let x = reader.read_f32()?;
        let y = reader.read_f32()?;
        let z = reader.read_f32()?;
        let r = reader.read_f32()?;
        let g = reader.read_f32()?;
        let b = reader.read_f32()?;
        points.push((vec3(x, y, z), [r, g, b]));
      }
      Some(ClientMessage::FormationChunk { points })
    }
    TYPE_FORMATION_COMMIT => Some(ClientMessage::FormationCommit),
    _ => None,
  }
}

pub fn encode_landmarks(hands: &[Option<HandFrame>; 2]) -> Vec<u8> {
  let mut flags = 0u16;
  let mut capacity = 4;
  for (slot, hand) in hands.iter().enumerate() {
    if hand.is_some() {
      flags |= if slot == 0 { FLAG_HAND_0 } else { FLAG_HAND_1 };
      capacity += 4 + LANDMARK_COUNT * 12;
    }
  }
  let mut encoder = Encoder::with_capacity(capacity);
  encoder.write_header(TYPE_LANDMARKS, flags);
  for hand in hands.iter().flatten() {
    encoder.write_f32(hand.confidence);
    for point in hand.points.iter().take(LANDMARK_COUNT) {
      encoder.write_f32(point.x);
      encoder.write_f32(point.y);
      encoder.write_f32(point.z);
    }
  }
  encoder.into_vec()
}

pub fn encode_init(
  instance_count: u32,
  pool_size: u16,
  lane_count: u8,
  tick_ms: u16,
  dual_hand: bool,
) -> Vec<u8> {
  let mut encoder = Encoder::with_capacity(4 + 4 + 2 + 1 + 2 + 1);
  encoder.write_header(TYPE_INIT, 0);
  encoder.write_u32(instance_count);
  encoder.write_u16(pool_size);
  encoder.write_u8(lane_count);
  encoder.write_u16(tick_ms);
  encoder.write_u8(if dual_hand { 1 } else { 0 });
  encoder.into_vec()
}

pub fn encode_instances(instances: &[Instance]) -> Vec<u8> {
  let mut encoder = Encoder::with_capacity(4 + 4 + instances.len() * 40);
  encoder.write_header(TYPE_INSTANCES, 0);
  encoder.write_u32(instances.len() as u32);
  for instance in instances {
    encoder.write_f32(instance.position.x);
    encoder.write_f32(instance.position.y);
    encoder.write_f32(instance.position.z);
    encoder.write_f32(instance.scale.x);
    encoder.write_f32(instance.scale.y);
    encoder.write_f32(instance.scale.z);
    encoder.write_f32(instance.color[0]);
    encoder.write_f32(instance.color[1]);
    encoder.write_f32(instance.color[2]);
    encoder.write_f32(instance.rotation);
  }
  encoder.into_vec()
}

pub fn encode_hands(hands: &[Option<HandSnapshot>; 2]) -> Vec<u8> {
  let mut flags = 0u16;
  for (slot, hand) in hands.iter().enumerate() {
    if hand.is_some() {
      flags |= if slot == 0 { FLAG_HAND_0 } else { FLAG_HAND_1 };
    }
  }
  let mut encoder = Encoder::with_capacity(4 + 2 * (1 + 24 + 13 + 8));
  encoder.write_header(TYPE_HANDS, flags);
  for hand in hands.iter().flatten() {
    encoder.write_u8(gesture_code(hand.gesture));
    for value in hand.palm {
      encoder.write_f32(value);
    }
    for value in hand.pointer {
      encoder.write_f32(value);
    }
    match hand.pinch {
      Some(pinch) => {
        encoder.write_u8(1);
        for value in pinch {
          encoder.write_f32(value);
        }
      }
      None => encoder.write_u8(0),
    }
    encoder.write_f32(hand.rotation);
    encoder.write_f32(hand.openness);
  }
  encoder.into_vec()
}

pub fn encode_events(events: &[GameEvent]) -> Vec<u8> {
  let mut encoder = Encoder::with_capacity(4 + 1 + events.len() * 9);
  encoder.write_header(TYPE_EVENTS, 0);
  encoder.write_u8(events.len().min(u8::MAX as usize) as u8);
  for event in events.iter().take(u8::MAX as usize) {
    match event {
      GameEvent::Hit { player } => {
        encoder.write_u8(EVENT_HIT);
        encoder.write_u8(*player as u8);
      }
      GameEvent::Heal { player } => {
        encoder.write_u8(EVENT_HEAL);
        encoder.write_u8(*player as u8);
      }
      GameEvent::Slow { player } => {
        encoder.write_u8(EVENT_SLOW);
        encoder.write_u8(*player as u8);
      }
      GameEvent::Score { points } => {
        encoder.write_u8(EVENT_SCORE);
        encoder.write_i64(*points);
      }
      GameEvent::Burst => encoder.write_u8(EVENT_BURST),
      GameEvent::SuperBurst => encoder.write_u8(EVENT_SUPER_BURST),
      GameEvent::ModelCycle => encoder.write_u8(EVENT_MODEL_CYCLE),
    }
  }
  encoder.into_vec()
}

pub fn encode_game_state(snapshot: &GameSnapshot) -> Vec<u8> {
  let mut encoder = Encoder::with_capacity(4 + 1 + 8 + 1 + 4);
  encoder.write_header(TYPE_GAME_STATE, 0);
  encoder.write_u8(snapshot.lives.min(u8::MAX as u32) as u8);
  encoder.write_i64(snapshot.score);
  let mut flags = 0u8;
  if snapshot.is_hit {
    flags |= 1 << 0;
  }
  if snapshot.is_game_over {
    flags |= 1 << 1;
  }
  if snapshot.game_active {
    flags |= 1 << 2;
  }
  encoder.write_u8(flags);
  encoder.write_f32(snapshot.slow_remaining);
  encoder.into_vec()
}

fn gesture_code(gesture: Gesture) -> u8 {
  match gesture {
    Gesture::None => 0,
    Gesture::OpenHand => 1,
    Gesture::ClosedFist => 2,
    Gesture::Pinch => 3,
    Gesture::Point => 4,
    Gesture::OkSign => 5,
    Gesture::ThumbScatter => 6,
    Gesture::TwoHandRotation => 7,
  }
}

pub struct Encoder {
  buffer: Vec<u8>,
}

impl Encoder {
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      buffer: Vec::with_capacity(capacity),
    }
  }

  pub fn into_vec(self) -> Vec<u8> {
    self.buffer
  }

  pub fn write_header(&mut self, message_type: u8, flags: u16) {
    self.write_u8(VERSION);
    self.write_u8(message_type);
    self.write_u16(flags);
  }

  pub fn write_u8(&mut self, value: u8) {
    self.buffer.push(value);
  }

  pub fn write_u16(&mut self, value: u16) {
    self.buffer.extend_from_slice(&value.to_le_bytes());
  }

  pub fn write_u32(&mut self, value: u32) {
    self.buffer.extend_from_slice(&value.to_le_bytes());
  }

  pub fn write_i64(&mut self, value: i64) {
    self.buffer.extend_from_slice(&value.to_le_bytes());
  }

  pub fn write_f32(&mut self, value: f32) {
    self.buffer.extend_from_slice(&value.to_le_bytes());
  }
}

struct Reader<'a> {
  data: &'a [u8],
  offset: usize,
}

impl<'a> Reader<'a> {
  fn new(data: &'a [u8]) -> Self {
    Self { data, offset: 0 }
  }

  fn read_u8(&mut self) -> Option<u8> {
    let value = *self.data.get(self.offset)?;
    self.offset += 1;
    Some(value)
  }

  fn read_u16(&mut self) -> Option<u16> {
    let bytes = self.data.get(self.offset..self.offset + 2)?;
    self.offset += 2;
    Some(u16::from_le_bytes(bytes.try_into().ok()?))
  }

  fn read_u32(&mut self) -> Option<u32> {
    let bytes = self.data.get(self.offset..self.offset + 4)?;
    self.offset += 4;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
  }

  fn read_f32(&mut self) -> Option<f32> {
    let bytes = self.data.get(self.offset..self.offset + 4)?;
    self.offset += 4;
    Some(f32::from_le_bytes(bytes.try_into().ok()?))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn join_round_trip() {
    let mut encoder = Encoder::with_capacity(8);
    encoder.write_header(TYPE_JOIN, FLAG_JOIN_DUAL_HAND | FLAG_JOIN_PARTICLE_COUNT);
    encoder.write_u32(5_000);
    let decoded = decode_client_message(&encoder.into_vec()).unwrap();
    match decoded {
      ClientMessage::Join {
        dual_hand,
        particle_count,
      } => {
        assert!(dual_hand);
        assert_eq!(particle_count, Some(5_000));
      }
      other => panic!("unexpected message {other:?}"),
    }
  }

  #[test]
  fn landmarks_round_trip_single_hand() {
    let frame = HandFrame {
      confidence: 0.9,
      points: (0..LANDMARK_COUNT)
        .map(|index| vec3(index as f32 * 0.01, 0.5, 0.0))
        .collect(),
    };
    let payload = encode_landmarks(&[Some(frame), None]);
    let decoded = decode_client_message(&payload).unwrap();
    match decoded {
      ClientMessage::Landmarks { hands } => {
        let hand = hands[0].as_ref().expect("hand 0 present");
        assert!(hands[1].is_none());
        assert_eq!(hand.points.len(), LANDMARK_COUNT);
        assert!((hand.confidence - 0.9).abs() < 1e-6);
        assert!((hand.points[20].x - 0.2).abs() < 1e-6);
      }
      other => panic!("unexpected message {other:?}"),
    }
  }

  #[test]
  fn color_mode_round_trip() {
    let mut encoder = Encoder::with_capacity(32);
    encoder.write_header(TYPE_COLOR_MODE, 0);
    encoder.write_u8(COLOR_MODE_ANGULAR);
    encoder.write_u8(1);
    for value in [1.0_f32, 0.5, 0.0, 0.0, 0.5, 1.0] {
      encoder.write_f32(value);
    }
    let decoded = decode_client_message(&encoder.into_vec()).unwrap();
    match decoded {
      ClientMessage::SetColorMode {
        mode:
          ColorMode::Gradient {
            from,
            to,
            mix,
            contrast,
          },
      } => {
        assert_eq!(mix, GradientMix::Angular);
        assert!(contrast);
        assert_eq!(from, [1.0, 0.5, 0.0]);
        assert_eq!(to, [0.0, 0.5, 1.0]);
      }
      other => panic!("unexpected message {other:?}"),
    }
  }

  #[test]
  fn formation_chunk_round_trip() {
    let mut encoder = Encoder::with_capacity(64);
    encoder.write_header(TYPE_FORMATION_CHUNK, 0);
    encoder.write_u16(2);
    for value in [
      0.1_f32, 0.2, 0.3, 1.0, 0.0, 0.0, //
      0.4, 0.5, 0.6, 0.0, 1.0, 0.0,
    ] {
      encoder.write_f32(value);
    }
    let decoded = decode_client_message(&encoder.into_vec()).unwrap();
    match decoded {
      ClientMessage::FormationChunk { points } => {
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].1, [1.0, 0.0, 0.0]);
        assert!((points[1].0.x - 0.4).abs() < 1e-6);
      }
      other => panic!("unexpected message {other:?}"),
    }
  }

  #[test]
  fn truncated_and_mismatched_messages_decode_to_none() {
    assert!(decode_client_message(&[]).is_none());
    assert!(decode_client_message(&[VERSION]).is_none());
    assert!(decode_client_message(&[VERSION + 1, TYPE_RESET, 0, 0]).is_none());

    let mut encoder = Encoder::with_capacity(8);
    encoder.write_header(TYPE_FORMATION_BEGIN, 0);
    encoder.write_u16(7); // half of the expected u32
    assert!(decode_client_message(&encoder.into_vec()).is_none());
  }

  #[test]
  fn instances_payload_layout() {
    let instances = vec![
      Instance {
        position: vec3(1.0, 2.0, 3.0),
        scale: vec3(0.1, 0.1, 0.1),
        color: [0.5, 0.6, 0.7],
        rotation: 0.25,
      },
      Instance::hidden(),
    ];
    let payload = encode_instances(&instances);
    assert_eq!(payload.len(), 4 + 4 + 2 * 40);
    assert_eq!(payload[1], TYPE_INSTANCES);
    let count = u32::from_le_bytes(payload[4..8].try_into().unwrap());
    assert_eq!(count, 2);
    let x = f32::from_le_bytes(payload[8..12].try_into().unwrap());
    assert_eq!(x, 1.0);
    // Hidden instance encodes as forty zero bytes.
    assert!(payload[48..].iter().all(|byte| *byte == 0));
  }

  #[test]
  fn events_payload_carries_kind_and_data() {
    let events = vec![
      GameEvent::Hit { player: 1 },
      GameEvent::Score { points: 40 },
      GameEvent::Burst,
    ];
    let payload = encode_events(&events);
    assert_eq!(payload[1], TYPE_EVENTS);
    assert_eq!(payload[4], 3);
    assert_eq!(payload[5], EVENT_HIT);
    assert_eq!(payload[6], 1);
    assert_eq!(payload[7], EVENT_SCORE);
    let points = i64::from_le_bytes(payload[8..16].try_into().unwrap());
    assert_eq!(points, 40);
    assert_eq!(payload[16], EVENT_BURST);
  }

  #[test]
  fn game_state_flags_pack() {
    let snapshot = GameSnapshot {
      lives: 2,
      score: 120,
      is_hit: true,
      is_game_over: false,
      game_active: true,
      slow_remaining: 1.5,
    };
    let payload = encode_game_state(&snapshot);
    assert_eq!(payload[1], TYPE_GAME_STATE);
    assert_eq!(payload[4], 2);
    let flags = payload[13];
    assert_eq!(flags & 1, 1);
    assert_eq!(flags & 2, 0);
    assert_eq!(flags & 4, 4);
  }
}
