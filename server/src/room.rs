//! Per-room world state: players, food and the tick counter

use rand::Rng;
use shared::{
    Food, Packet, Player, Point, HALF_MAP_SIZE, INITIAL_FOOD_COUNT, SPAWN_HALF_EXTENT,
};
use std::collections::BTreeMap;

/// An isolated simulation instance identified by a player-supplied code.
///
/// Players are kept in a `BTreeMap` so every tick visits them in id order.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: String,
    pub players: BTreeMap<u32, Player>,
    pub food: Vec<Food>,
    pub tick: u64,
}

impl Room {
    /// Creates an empty room seeded with the initial food set
    pub fn new<R: Rng + ?Sized>(id: String, rng: &mut R) -> Self {
        let food = (0..INITIAL_FOOD_COUNT)
            .map(|_| random_food(rng))
            .collect();

        Self {
            id,
            players: BTreeMap::new(),
            food,
            tick: 0,
        }
    }

    /// Spawns a player somewhere in the central sub-region of the arena
    pub fn spawn_player<R: Rng + ?Sized>(&mut self, player_id: u32, name: String, rng: &mut R) {
        let spawn = Point::new(
            rng.gen_range(-SPAWN_HALF_EXTENT..=SPAWN_HALF_EXTENT),
            rng.gen_range(-SPAWN_HALF_EXTENT..=SPAWN_HALF_EXTENT),
        );
        self.players
            .insert(player_id, Player::new(player_id, name, spawn));
    }

    pub fn remove_player(&mut self, player_id: u32) -> Option<Player> {
        self.players.remove(&player_id)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Full-state snapshot sent to every member after a tick
    pub fn snapshot(&self) -> Packet {
        Packet::GameState {
            tick: self.tick,
            players: self
                .players
                .iter()
                .map(|(id, player)| (*id, player.clone()))
                .collect(),
            food: self.food.clone(),
        }
    }
}

/// Food at a uniformly random arena position with a random hue
pub fn random_food<R: Rng + ?Sized>(rng: &mut R) -> Food {
    Food::new(
        rng.gen_range(-HALF_MAP_SIZE..=HALF_MAP_SIZE),
        rng.gen_range(-HALF_MAP_SIZE..=HALF_MAP_SIZE),
        rng.gen_range(0..360),
    )
}
