use log::{info, warn};
use shared::{Food, Packet, Player, Point, MAP_SIZE};
use std::collections::HashMap;

/// Where the client is in the join/play/die cycle
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Waiting for `RoomJoined`
    Joining,
    Playing,
    /// Our snake died; the last world stays on screen until we re-join
    Dead,
    Disconnected(String),
}

/// A remote or local snake as the client draws it
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPlayer {
    /// Latest authoritative copy; segments, score, hue and name come from here
    pub player: Player,
    /// Smoothed head position, chasing `target()`
    pub position: Point,
}

impl RenderedPlayer {
    fn new(player: Player) -> Self {
        let position = Point::new(player.x, player.y);
        Self { player, position }
    }

    pub fn target(&self) -> Point {
        Point::new(self.player.x, self.player.y)
    }

    /// Offset between the drawn head and the authoritative head.
    ///
    /// The renderer shifts the whole body by this so it moves with the head.
    pub fn render_offset(&self) -> Point {
        Point::new(
            self.position.x - self.player.x,
            self.position.y - self.player.y,
        )
    }
}

/// Moves `current` a fixed fraction of the way toward `target`
pub fn approach(current: Point, target: Point, factor: f32) -> Point {
    Point::new(
        current.x + (target.x - current.x) * factor,
        current.y + (target.y - current.y) * factor,
    )
}

/// Client view of the room, rebuilt from every snapshot and smoothed per frame
#[derive(Debug, Clone)]
pub struct ClientGameState {
    pub phase: Phase,
    pub room_id: Option<String>,
    pub map_size: f32,
    pub local_id: Option<u32>,
    pub last_tick: u64,
    pub players: HashMap<u32, RenderedPlayer>,
    pub food: Vec<Food>,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Joining,
            room_id: None,
            map_size: MAP_SIZE,
            local_id: None,
            last_tick: 0,
            players: HashMap::new(),
            food: Vec::new(),
        }
    }

    pub fn handle_packet(&mut self, packet: Packet) {
        match packet {
            Packet::RoomJoined {
                room_id,
                map_size,
                player_id,
            } => self.on_room_joined(room_id, map_size, player_id),
            Packet::GameState {
                tick,
                players,
                food,
            } => self.apply_snapshot(tick, players, food),
            Packet::Dead => self.on_dead(),
            Packet::Disconnected { reason } => self.on_disconnected(reason),
            _ => warn!("Unexpected packet type from server"),
        }
    }

    pub fn on_room_joined(&mut self, room_id: String, map_size: f32, player_id: u32) {
        info!("Joined room {} as player {}", room_id, player_id);
        self.phase = Phase::Playing;
        self.room_id = Some(room_id);
        self.map_size = map_size;
        self.local_id = Some(player_id);
        self.last_tick = 0;
        self.players.clear();
        self.food.clear();
    }

    /// Folds a full-state snapshot into the rendered world.
    ///
    /// Known players keep their rendered position and only get a new target;
    /// unknown players appear at their authoritative position; players missing
    /// from the snapshot are removed.
    pub fn apply_snapshot(&mut self, tick: u64, players: HashMap<u32, Player>, food: Vec<Food>) {
        self.players.retain(|id, _| players.contains_key(id));

        for (id, player) in players {
            match self.players.get_mut(&id) {
                Some(rendered) => rendered.player = player,
                None => {
                    self.players.insert(id, RenderedPlayer::new(player));
                }
            }
        }

        self.food = food;
        self.last_tick = tick;
    }

    pub fn on_dead(&mut self) {
        info!("Our snake died");
        self.phase = Phase::Dead;
        self.local_id = None;
    }

    pub fn on_disconnected(&mut self, reason: String) {
        warn!("Disconnected: {}", reason);
        self.phase = Phase::Disconnected(reason);
        self.local_id = None;
    }

    /// Called after sending a new `JoinRoom`
    pub fn begin_rejoin(&mut self) {
        self.phase = Phase::Joining;
    }

    /// Advances every rendered position one frame toward its target
    pub fn step_frame(&mut self, factor: f32) {
        for rendered in self.players.values_mut() {
            rendered.position = approach(rendered.position, rendered.target(), factor);
        }
    }

    pub fn local_player(&self) -> Option<&RenderedPlayer> {
        self.local_id.and_then(|id| self.players.get(&id))
    }

    pub fn local_position(&self) -> Option<Point> {
        self.local_player().map(|rendered| rendered.position)
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }
}

impl Default for ClientGameState {
    fn default() -> Self {
        Self::new()
    }
}
