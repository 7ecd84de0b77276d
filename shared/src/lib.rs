use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

pub mod framing;

pub const TICK_RATE: u32 = 30;
pub const MAP_SIZE: f32 = 2000.0;
pub const HALF_MAP_SIZE: f32 = MAP_SIZE / 2.0;
pub const INITIAL_LENGTH: u32 = 5;
pub const INITIAL_SCORE: u32 = 100;
pub const NORMAL_SPEED: f32 = 5.0;
pub const BOOST_SPEED: f32 = 10.0;
pub const MIN_BOOST_SCORE: u32 = 10;
pub const BOOST_COST: u32 = 1;
pub const BOOST_COST_INTERVAL: u64 = 5;
pub const BOOST_FOOD_JITTER: f32 = 10.0;
pub const FOOD_PICKUP_RADIUS: f32 = 20.0;
pub const FOOD_SCORE: u32 = 10;
pub const COLLISION_RADIUS: f32 = 10.0;
pub const INITIAL_FOOD_COUNT: usize = 100;
/// Players spawn inside `[-SPAWN_HALF_EXTENT, SPAWN_HALF_EXTENT]` on both axes.
pub const SPAWN_HALF_EXTENT: f32 = MAP_SIZE / 4.0;
pub const INTERPOLATION_FACTOR: f32 = 0.1;
pub const MINIMAP_SIZE: f32 = 150.0;
pub const MAX_NAME_LEN: usize = 16;
pub const MAX_ROOM_ID_LEN: usize = 32;
pub const DEFAULT_ROOM_ID: &str = "1";
pub const DEFAULT_PLAYER_NAME: &str = "Anonymous";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Point) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Clamps both axes independently to the arena square.
    pub fn clamp_to_arena(self) -> Self {
        Self {
            x: self.x.clamp(-HALF_MAP_SIZE, HALF_MAP_SIZE),
            y: self.y.clamp(-HALF_MAP_SIZE, HALF_MAP_SIZE),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Player {
    pub id: u32,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub target_length: u32,
    /// Front is the head, back is the tail.
    pub segments: VecDeque<Point>,
    pub hue: u16,
    pub score: u32,
    pub boosting: bool,
}

impl Player {
    pub fn new(id: u32, name: String, spawn: Point) -> Self {
        Self {
            id,
            name,
            x: spawn.x,
            y: spawn.y,
            angle: 0.0,
            target_length: INITIAL_LENGTH,
            segments: std::iter::repeat(spawn)
                .take(INITIAL_LENGTH as usize)
                .collect(),
            hue: hue_for_id(id),
            score: INITIAL_SCORE,
            boosting: false,
        }
    }

    pub fn head(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn tail(&self) -> Point {
        self.segments.back().copied().unwrap_or_else(|| self.head())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Food {
    pub x: f32,
    pub y: f32,
    pub hue: u16,
}

impl Food {
    pub fn new(x: f32, y: f32, hue: u16) -> Self {
        Self { x, y, hue }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Golden-angle spread keeps neighbouring ids visually distinct.
pub fn hue_for_id(id: u32) -> u16 {
    ((id as u64 * 137) % 360) as u16
}

/// Trims and truncates a display name, falling back to a placeholder.
pub fn sanitize_player_name(raw: &str) -> String {
    let name: String = raw.trim().chars().take(MAX_NAME_LEN).collect();
    if name.is_empty() {
        DEFAULT_PLAYER_NAME.to_string()
    } else {
        name
    }
}

pub fn sanitize_room_id(raw: &str) -> String {
    let room_id: String = raw.trim().chars().take(MAX_ROOM_ID_LEN).collect();
    if room_id.is_empty() {
        DEFAULT_ROOM_ID.to_string()
    } else {
        room_id
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    JoinRoom {
        room_id: String,
        player_name: String,
    },
    Input {
        angle: f32,
    },
    Boost {
        is_boosting: bool,
    },
    Disconnect,

    RoomJoined {
        room_id: String,
        map_size: f32,
        player_id: u32,
    },
    GameState {
        tick: u64,
        players: HashMap<u32, Player>,
        food: Vec<Food>,
    },
    Dead,
    Disconnected {
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_player_creation() {
        let player = Player::new(7, "ana".to_string(), Point::new(12.0, -40.0));
        assert_eq!(player.id, 7);
        assert_eq!(player.x, 12.0);
        assert_eq!(player.y, -40.0);
        assert_eq!(player.angle, 0.0);
        assert_eq!(player.target_length, INITIAL_LENGTH);
        assert_eq!(player.score, INITIAL_SCORE);
        assert!(!player.boosting);
        assert_eq!(player.segments.len(), INITIAL_LENGTH as usize);
        assert!(player
            .segments
            .iter()
            .all(|s| *s == Point::new(12.0, -40.0)));
    }

    #[test]
    fn test_player_head_and_tail() {
        let mut player = Player::new(1, "a".to_string(), Point::new(0.0, 0.0));
        player.segments.push_back(Point::new(-5.0, 0.0));
        assert_eq!(player.head(), Point::new(0.0, 0.0));
        assert_eq!(player.tail(), Point::new(-5.0, 0.0));

        player.segments.clear();
        assert_eq!(player.tail(), player.head());
    }

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_approx_eq!(a.distance(&b), 5.0);
        assert_approx_eq!(a.distance_squared(&b), 25.0);
    }

    #[test]
    fn test_clamp_to_arena() {
        let clamped = Point::new(HALF_MAP_SIZE + 30.0, -HALF_MAP_SIZE - 0.5).clamp_to_arena();
        assert_eq!(clamped, Point::new(HALF_MAP_SIZE, -HALF_MAP_SIZE));

        let inside = Point::new(10.0, -10.0);
        assert_eq!(inside.clamp_to_arena(), inside);
    }

    #[test]
    fn test_hue_is_deterministic_and_in_range() {
        assert_eq!(hue_for_id(3), hue_for_id(3));
        assert_ne!(hue_for_id(1), hue_for_id(2));
        for id in 0..1000 {
            assert!(hue_for_id(id) < 360);
        }
    }

    #[test]
    fn test_sanitize_player_name() {
        assert_eq!(sanitize_player_name("  bob  "), "bob");
        assert_eq!(sanitize_player_name("   "), DEFAULT_PLAYER_NAME);
        let long = "x".repeat(100);
        assert_eq!(sanitize_player_name(&long).chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn test_sanitize_room_id() {
        assert_eq!(sanitize_room_id(" lobby "), "lobby");
        assert_eq!(sanitize_room_id(""), DEFAULT_ROOM_ID);
        let long = "r".repeat(100);
        assert_eq!(sanitize_room_id(&long).chars().count(), MAX_ROOM_ID_LEN);
    }

    #[test]
    fn test_packet_serialization_game_state() {
        let mut players = HashMap::new();
        players.insert(1, Player::new(1, "one".to_string(), Point::new(1.0, 2.0)));
        players.insert(2, Player::new(2, "two".to_string(), Point::new(-3.0, 4.0)));

        let packet = Packet::GameState {
            tick: 42,
            players,
            food: vec![Food::new(5.0, 6.0, 120)],
        };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::GameState {
                tick,
                players,
                food,
            } => {
                assert_eq!(tick, 42);
                assert_eq!(players.len(), 2);
                assert_eq!(players[&1].name, "one");
                assert_eq!(players[&2].segments.len(), INITIAL_LENGTH as usize);
                assert_eq!(food, vec![Food::new(5.0, 6.0, 120)]);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_join_room() {
        let packet = Packet::JoinRoom {
            room_id: "1".to_string(),
            player_name: "neo".to_string(),
        };
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::JoinRoom {
                room_id,
                player_name,
            } => {
                assert_eq!(room_id, "1");
                assert_eq!(player_name, "neo");
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }
}
