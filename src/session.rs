use crate::engine::constants::{LANE_COUNT, OBSTACLE_POOL_SIZE, TICK_MS};
use crate::engine::landmarks::{parse_frame, LandmarkFrame};
use crate::engine::{Engine, EngineConfig};
use crate::protocol;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;
use uuid::Uuid;

const MAX_PARTICLE_COUNT: u32 = 60_000;

// One session = one engine instance plus the WS clients watching it. The
// tick loop starts with the first joined client and stops itself when the
// last one leaves.
#[derive(Debug)]
pub struct Session {
  state: Mutex<SessionState>,
  running: AtomicBool,
}

#[derive(Debug)]
struct ClientEntry {
  sender: UnboundedSender<Vec<u8>>,
}

struct SessionState {
  clients: HashMap<String, ClientEntry>,
  engine: Engine,
  configured: bool,
  upload_generation: Option<u64>,
}

impl std::fmt::Debug for SessionState {
  fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    formatter
      .debug_struct("SessionState")
      .field("clients", &self.clients.len())
      .field("configured", &self.configured)
      .finish()
  }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum JsonClientMessage {
  #[serde(rename = "join")]
  Join {
    #[serde(rename = "dualHand")]
    dual_hand: Option<bool>,
    #[serde(rename = "particleCount")]
    particle_count: Option<u32>,
  },
  #[serde(rename = "reset")]
  Reset,
  #[serde(rename = "game")]
  Game { active: Option<bool> },
}

impl Session {
  pub fn new() -> Self {
    Self {
      state: Mutex::new(SessionState {
        clients: HashMap::new(),
        engine: Engine::new(EngineConfig::default()),
        configured: false,
        upload_generation: None,
      }),
      running: AtomicBool::new(false),
    }
  }

  pub async fn add_client(&self, sender: UnboundedSender<Vec<u8>>) -> String {
    let client_id = Uuid::new_v4().to_string();
    let mut state = self.state.lock().await;
    state
      .clients
      .insert(client_id.clone(), ClientEntry { sender });
    client_id
  }

  pub async fn remove_client(&self, client_id: &str) {
    let mut state = self.state.lock().await;
    state.clients.remove(client_id);
  }

  pub async fn handle_text_message(self: &Arc<Self>, client_id: &str, text: &str) {
    let Ok(message) = serde_json::from_str::<JsonClientMessage>(text) else { return };
    let message = match message {
      JsonClientMessage::Join {
        dual_hand,
        particle_count,
      } => protocol::ClientMessage::Join {
        dual_hand: dual_hand.unwrap_or(false),
        particle_count,
      },
      JsonClientMessage::Reset => protocol::ClientMessage::Reset,
      JsonClientMessage::Game { active } => protocol::ClientMessage::GameMode {
        active: active.unwrap_or(false),
      },
    };
    self.handle_client_message(client_id, message).await;
  }

  pub async fn handle_binary_message(self: &Arc<Self>, client_id: &str, data: &[u8]) {
    let Some(message) = protocol::decode_client_message(data) else { return };
    self.handle_client_message(client_id, message).await;
  }

  async fn handle_client_message(
    self: &Arc<Self>,
    client_id: &str,
    message: protocol::ClientMessage,
  ) {
    let mut state = self.state.lock().await;
    let joined = matches!(message, protocol::ClientMessage::Join { .. });
    state.handle_message(client_id, message);
    if joined {
      drop(state);
      self.ensure_loop();
    }
  }

  pub async fn debug_hit(&self) -> bool {
    let mut state = self.state.lock().await;
    if !state.engine.game_snapshot().game_active {
      return false;
    }
    state.engine.force_hit(0);
    true
  }

  fn ensure_loop(self: &Arc<Self>) {
    if self
      .running
      .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
      .is_err()
    {
      return;
    }

    let session = Arc::clone(self);
    tokio::spawn(async move {
      let mut interval = tokio::time::interval(std::time::Duration::from_millis(TICK_MS));
      loop {
        interval.tick().await;
        let mut state = session.state.lock().await;
        if state.clients.is_empty() {
          session.running.store(false, Ordering::SeqCst);
          break;
        }
        state.tick(TICK_MS as f32 / 1000.0);
      }
    });
  }
}

impl Default for Session {
  fn default() -> Self {
    Self::new()
  }
}

impl SessionState {
  fn handle_message(&mut self, client_id: &str, message: protocol::ClientMessage) {
    match message {
      protocol::ClientMessage::Join {
        dual_hand,
        particle_count,
      } => {
        // The first join fixes the session's engine shape; later joins
        // just get the existing configuration echoed back.
        if !self.configured {
          let mut config = EngineConfig {
            dual_hand,
            ..EngineConfig::default()
          };
          if let Some(count) = particle_count {
            config.particle_count = count.min(MAX_PARTICLE_COUNT) as usize;
          }
          self.engine = Engine::new(config);
          self.configured = true;
          tracing::info!(dual_hand, particles = config.particle_count, "session configured");
        }
        self.engine.advance(0.0);
        let payload = protocol::encode_init(
          self.engine.instance_count() as u32,
          OBSTACLE_POOL_SIZE as u16,
          LANE_COUNT as u8,
          TICK_MS as u16,
          self.engine.config().dual_hand,
        );
        if let Some(client) = self.clients.get(client_id) {
          let _ = client.sender.send(payload);
        }
      }
      protocol::ClientMessage::Landmarks { hands } => {
        let frames = hands.map(|hand| hand.and_then(frame_from_wire));
        self.engine.ingest(frames);
      }
      protocol::ClientMessage::Reset => {
        // A reset also abandons any half-staged formation upload.
        self.upload_generation = None;
        self.engine.cancel_formation();
        self.engine.reset();
      }
      protocol::ClientMessage::GameMode { active } => {
        self.engine.set_game_active(active);
      }
      protocol::ClientMessage::SetColorMode { mode } => {
        self.engine.set_color_mode(mode);
      }
      protocol::ClientMessage::FormationBegin { expected } => {
        let generation = self.engine.begin_formation(expected as usize);
        self.upload_generation = Some(generation);
      }
      protocol::ClientMessage::FormationChunk { points } => {
        if let Some(generation) = self.upload_generation {
          self.engine.extend_formation(generation, &points);
        }
      }
      protocol::ClientMessage::FormationCommit => {
        if let Some(generation) = self.upload_generation.take() {
          if !self.engine.commit_formation(generation) {
            tracing::debug!(generation, "formation commit rejected");
          }
        }
      }
    }
  }

  fn tick(&mut self, dt: f32) {
    self.engine.advance(dt);

    let instances = protocol::encode_instances(self.engine.instances());
    self.broadcast(instances);

    let hands = protocol::encode_hands(&self.engine.hand_snapshots());
    self.broadcast(hands);

    let game_state = protocol::encode_game_state(&self.engine.game_snapshot());
    self.broadcast(game_state);

    let events = self.engine.drain_events();
    if !events.is_empty() {
      self.broadcast(protocol::encode_events(&events));
    }
  }

  fn broadcast(&mut self, payload: Vec<u8>) {
    let mut stale = Vec::new();
    for (client_id, client) in &self.clients {
      if client.sender.send(payload.clone()).is_err() {
        stale.push(client_id.clone());
      }
    }
    for client_id in stale {
      self.clients.remove(&client_id);
    }
  }
}

fn frame_from_wire(hand: protocol::HandFrame) -> Option<LandmarkFrame> {
  parse_frame(&hand.points, hand.confidence)
}
