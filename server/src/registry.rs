//! Room registry: create-on-first-join, destroy-on-empty
//!
//! The registry is the single owner of every room in the process. It is held
//! by the network scheduler and passed explicitly to whatever needs it; there
//! is no ambient global state.

use crate::game::{self, TickReport};
use crate::room::Room;
use log::{error, info};
use rand::Rng;
use shared::{sanitize_player_name, sanitize_room_id};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Consecutive panicking ticks after which a room is torn down
pub const MAX_CONSECUTIVE_FAULTS: u32 = 3;

/// Result of ticking one room
#[derive(Debug, Clone, PartialEq)]
pub struct RoomTick {
    pub room_id: String,
    pub report: TickReport,
    /// The tick panicked and was rolled back; nothing should be broadcast.
    pub faulted: bool,
    /// Deaths emptied the room, or it kept faulting, and it was destroyed.
    pub closed: bool,
    /// Players removed because the room was torn down after repeated faults.
    pub evicted: Vec<u32>,
}

pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
    /// Consecutive faulted ticks per room; absent means zero
    faults: HashMap<String, u32>,
    next_player_id: u32,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            faults: HashMap::new(),
            next_player_id: 1,
        }
    }

    /// Joins `room_id`, creating and seeding it if it does not exist yet.
    ///
    /// Returns `(room_id, player_id)` where the room id is the sanitized one
    /// the player actually landed in.
    pub fn join_room<R: Rng + ?Sized>(
        &mut self,
        room_id: &str,
        player_name: &str,
        rng: &mut R,
    ) -> (String, u32) {
        let room_id = sanitize_room_id(room_id);
        let player_name = sanitize_player_name(player_name);

        let player_id = self.next_player_id;
        self.next_player_id = self.next_player_id.wrapping_add(1).max(1);

        let room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!("Created room {}", room_id);
            Room::new(room_id.clone(), rng)
        });
        room.spawn_player(player_id, player_name.clone(), rng);

        info!(
            "Player {} ({}) joined room {} ({} players)",
            player_id,
            player_name,
            room_id,
            room.players.len()
        );
        (room_id, player_id)
    }

    /// Removes a player and destroys the room if it is now empty.
    ///
    /// Returns false when the room or player was already gone.
    pub fn leave(&mut self, room_id: &str, player_id: u32) -> bool {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return false;
        };

        let removed = room.remove_player(player_id).is_some();
        if removed {
            info!("Player {} left room {}", player_id, room_id);
        }

        if room.is_empty() {
            self.rooms.remove(room_id);
            self.faults.remove(room_id);
            info!("Destroyed empty room {}", room_id);
        }
        removed
    }

    /// Last-write-wins heading update; unknown ids are ignored
    pub fn set_heading(&mut self, room_id: &str, player_id: u32, angle: f32) -> bool {
        if !angle.is_finite() {
            return false;
        }
        match self.player_mut(room_id, player_id) {
            Some(player) => {
                player.angle = angle;
                true
            }
            None => false,
        }
    }

    /// Last-write-wins boost request; the tick engine may clear it again
    pub fn set_boosting(&mut self, room_id: &str, player_id: u32, boosting: bool) -> bool {
        match self.player_mut(room_id, player_id) {
            Some(player) => {
                player.boosting = boosting;
                true
            }
            None => false,
        }
    }

    fn player_mut(&mut self, room_id: &str, player_id: u32) -> Option<&mut shared::Player> {
        self.rooms
            .get_mut(room_id)
            .and_then(|room| room.players.get_mut(&player_id))
    }

    /// Advances every room by one tick.
    ///
    /// Each tick runs on a working copy that is committed only if the tick
    /// completes, so a panic in one room leaves its last good state in place
    /// and does not stop the others.
    pub fn tick_all<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<RoomTick> {
        self.tick_all_with(rng, |room, rng| game::tick_room(room, rng))
    }

    /// [`tick_all`](Self::tick_all) with the per-room step supplied by the caller.
    ///
    /// A room whose step panics [`MAX_CONSECUTIVE_FAULTS`] times in a row is
    /// destroyed and its players are reported in [`RoomTick::evicted`].
    pub fn tick_all_with<R, F>(&mut self, rng: &mut R, mut step: F) -> Vec<RoomTick>
    where
        R: Rng + ?Sized,
        F: FnMut(&mut Room, &mut R) -> TickReport,
    {
        let mut results = Vec::with_capacity(self.rooms.len());
        let mut broken = Vec::new();

        for (room_id, room) in self.rooms.iter_mut() {
            let mut working = room.clone();
            let outcome = catch_unwind(AssertUnwindSafe(|| step(&mut working, &mut *rng)));

            match outcome {
                Ok(report) => {
                    *room = working;
                    self.faults.remove(room_id);
                    results.push(RoomTick {
                        room_id: room_id.clone(),
                        closed: room.is_empty(),
                        report,
                        faulted: false,
                        evicted: Vec::new(),
                    });
                }
                Err(_) => {
                    let faults = self.faults.entry(room_id.clone()).or_insert(0);
                    *faults += 1;
                    error!(
                        "Tick {} of room {} panicked ({} in a row); rolled back",
                        room.tick + 1,
                        room_id,
                        faults
                    );
                    if *faults >= MAX_CONSECUTIVE_FAULTS {
                        broken.push(room_id.clone());
                    }
                    results.push(RoomTick {
                        room_id: room_id.clone(),
                        report: TickReport::default(),
                        faulted: true,
                        closed: false,
                        evicted: Vec::new(),
                    });
                }
            }
        }

        for room_id in broken {
            self.faults.remove(&room_id);
            let Some(room) = self.rooms.remove(&room_id) else {
                continue;
            };
            error!(
                "Tearing down room {} after {} faulted ticks, evicting {} players",
                room_id,
                MAX_CONSECUTIVE_FAULTS,
                room.players.len()
            );
            if let Some(result) = results.iter_mut().find(|r| r.room_id == room_id) {
                result.closed = true;
                result.evicted = room.players.keys().copied().collect();
            }
        }

        self.rooms.retain(|room_id, room| {
            if room.is_empty() {
                info!("Destroyed room {} after last player died", room_id);
                false
            } else {
                true
            }
        });

        results
    }

    /// Consecutive faulted ticks recorded for a room
    pub fn fault_count(&self, room_id: &str) -> u32 {
        self.faults.get(room_id).copied().unwrap_or(0)
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn room_mut(&mut self, room_id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    pub fn contains_room(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_ids(&self) -> Vec<String> {
        self.rooms.keys().cloned().collect()
    }

    /// Returns the number of live rooms
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
