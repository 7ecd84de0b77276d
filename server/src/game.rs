//! Authoritative tick engine for a single room
//!
//! One call to [`tick_room`] advances a room by exactly one fixed step:
//!
//! 1. movement and the boost economy
//! 2. food consumption
//! 3. player-vs-player collision detection
//! 4. death resolution
//!
//! Broadcasting the resulting state is left to the network layer, which only
//! ever sees a room between ticks.

use crate::room::{random_food, Room};
use log::info;
use rand::Rng;
use shared::{
    Food, Player, Point, BOOST_COST, BOOST_COST_INTERVAL, BOOST_FOOD_JITTER, BOOST_SPEED,
    COLLISION_RADIUS, FOOD_PICKUP_RADIUS, FOOD_SCORE, MIN_BOOST_SCORE, NORMAL_SPEED,
};

/// What happened during a tick that the network layer has to act on
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Players removed by death this tick, in id order
    pub dead: Vec<u32>,
    /// Food items eaten this tick (each one already replaced)
    pub food_eaten: usize,
}

pub fn tick_room<R: Rng + ?Sized>(room: &mut Room, rng: &mut R) -> TickReport {
    room.tick += 1;

    move_players(room, rng);
    let food_eaten = consume_food(room, rng);
    let dead = detect_collisions(room);
    resolve_deaths(room, &dead);

    TickReport { dead, food_eaten }
}

/// Applies boost rules and advances every head along its heading
pub fn move_players<R: Rng + ?Sized>(room: &mut Room, rng: &mut R) {
    let tick = room.tick;
    let Room { players, food, .. } = room;

    for player in players.values_mut() {
        let boost_allowed = player.boosting && player.score > MIN_BOOST_SCORE;
        if player.boosting && !boost_allowed {
            player.boosting = false;
        }

        let speed = if boost_allowed {
            BOOST_SPEED
        } else {
            NORMAL_SPEED
        };

        if boost_allowed && tick % BOOST_COST_INTERVAL == 0 {
            player.score = player.score.saturating_sub(BOOST_COST);
            food.push(boost_residue(player, rng));

            if player.score <= MIN_BOOST_SCORE {
                player.boosting = false;
            }
        }

        advance_player(player, speed);
    }
}

/// Residue is dropped at the tail as it was before this tick's move
fn boost_residue<R: Rng + ?Sized>(player: &Player, rng: &mut R) -> Food {
    let tail = player.tail();
    let drop = Point::new(
        tail.x + rng.gen_range(-BOOST_FOOD_JITTER..=BOOST_FOOD_JITTER),
        tail.y + rng.gen_range(-BOOST_FOOD_JITTER..=BOOST_FOOD_JITTER),
    )
    .clamp_to_arena();
    Food::new(drop.x, drop.y, player.hue)
}

pub fn advance_player(player: &mut Player, speed: f32) {
    let head = Point::new(
        player.x + speed * player.angle.cos(),
        player.y + speed * player.angle.sin(),
    )
    .clamp_to_arena();

    player.x = head.x;
    player.y = head.y;
    player.segments.push_front(head);
    player.segments.truncate(player.target_length as usize);
}

/// Eats every food within pickup range of a head and spawns replacements.
///
/// Returns the number of food items eaten.
pub fn consume_food<R: Rng + ?Sized>(room: &mut Room, rng: &mut R) -> usize {
    let radius_sq = FOOD_PICKUP_RADIUS * FOOD_PICKUP_RADIUS;
    let Room { players, food, .. } = room;
    let mut total = 0;

    for player in players.values_mut() {
        let head = player.head();
        let before = food.len();
        food.retain(|f| f.position().distance_squared(&head) >= radius_sq);

        let eaten = before - food.len();
        if eaten == 0 {
            continue;
        }

        food.extend((0..eaten).map(|_| random_food(rng)));
        player.target_length += eaten as u32;
        player.score += FOOD_SCORE * eaten as u32;
        total += eaten;
    }

    total
}

/// Returns the ids of players whose head touches another player's body.
///
/// Reads the room without mutating it, so every check in a tick sees the same
/// post-movement positions regardless of which player is examined first.
pub fn detect_collisions(room: &Room) -> Vec<u32> {
    let radius_sq = COLLISION_RADIUS * COLLISION_RADIUS;

    room.players
        .values()
        .filter(|player| {
            let head = player.head();
            room.players
                .values()
                .filter(|other| other.id != player.id)
                .any(|other| {
                    other
                        .segments
                        .iter()
                        .any(|segment| segment.distance_squared(&head) < radius_sq)
                })
        })
        .map(|player| player.id)
        .collect()
}

/// Removes dead players and turns every other body segment into food
pub fn resolve_deaths(room: &mut Room, dead: &[u32]) {
    for &player_id in dead {
        if let Some(player) = room.remove_player(player_id) {
            let before = room.food.len();
            room.food.extend(
                player
                    .segments
                    .iter()
                    .step_by(2)
                    .map(|segment| Food::new(segment.x, segment.y, player.hue)),
            );
            info!(
                "Player {} died in room {}, dropped {} food",
                player_id,
                room.id,
                room.food.len() - before
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::{HALF_MAP_SIZE, INITIAL_LENGTH, INITIAL_SCORE};
    use std::f32::consts::{FRAC_PI_2, PI};

    fn empty_room() -> (Room, StdRng) {
        let mut rng = StdRng::seed_from_u64(42);
        let mut room = Room::new("1".to_string(), &mut rng);
        room.food.clear();
        (room, rng)
    }

    fn place(room: &mut Room, id: u32, x: f32, y: f32, angle: f32) {
        let mut player = Player::new(id, format!("p{}", id), Point::new(x, y));
        player.angle = angle;
        room.players.insert(id, player);
    }

    #[test]
    fn test_movement_along_heading() {
        let (mut room, mut rng) = empty_room();
        place(&mut room, 1, 0.0, 0.0, 0.0);
        place(&mut room, 2, 300.0, 300.0, FRAC_PI_2);

        tick_room(&mut room, &mut rng);

        let p1 = &room.players[&1];
        assert_approx_eq!(p1.x, NORMAL_SPEED);
        assert_approx_eq!(p1.y, 0.0);
        assert_eq!(p1.segments.front().copied(), Some(p1.head()));
        assert_eq!(p1.segments.len(), INITIAL_LENGTH as usize);

        let p2 = &room.players[&2];
        assert_approx_eq!(p2.x, 300.0, 1e-3);
        assert_approx_eq!(p2.y, 300.0 + NORMAL_SPEED);
        assert_eq!(room.tick, 1);
    }

    #[test]
    fn test_position_clamped_to_arena() {
        let (mut room, mut rng) = empty_room();
        place(&mut room, 1, HALF_MAP_SIZE - 2.0, 0.0, 0.0);
        place(&mut room, 2, 0.0, -HALF_MAP_SIZE + 1.0, -FRAC_PI_2);

        for _ in 0..20 {
            tick_room(&mut room, &mut rng);
            for player in room.players.values() {
                assert!(player.x.abs() <= HALF_MAP_SIZE);
                assert!(player.y.abs() <= HALF_MAP_SIZE);
            }
        }

        assert_eq!(room.players[&1].x, HALF_MAP_SIZE);
        assert_eq!(room.players[&2].y, -HALF_MAP_SIZE);
    }

    #[test]
    fn test_body_grows_to_target_length() {
        let (mut room, mut rng) = empty_room();
        place(&mut room, 1, 0.0, 0.0, 0.0);
        room.players.get_mut(&1).unwrap().target_length = INITIAL_LENGTH + 3;

        for expected in [6, 7, 8, 8, 8] {
            tick_room(&mut room, &mut rng);
            let player = &room.players[&1];
            assert_eq!(player.segments.len(), expected);
            assert!(player.segments.len() <= player.target_length as usize);
        }
    }

    #[test]
    fn test_boost_costs_score_and_drops_food_every_fifth_tick() {
        let (mut room, mut rng) = empty_room();
        place(&mut room, 1, 0.0, 0.0, 0.0);
        room.players.get_mut(&1).unwrap().boosting = true;

        for _ in 0..4 {
            tick_room(&mut room, &mut rng);
        }
        assert_eq!(room.players[&1].score, INITIAL_SCORE);
        assert!(room.food.is_empty());

        tick_room(&mut room, &mut rng);

        let player = &room.players[&1];
        assert_eq!(player.score, INITIAL_SCORE - 1);
        assert_approx_eq!(player.x, BOOST_SPEED * 5.0);
        assert!(player.boosting);
        assert_eq!(room.food.len(), 1);

        // Tail before the fifth move was the spawn point.
        let residue = room.food[0];
        assert!(residue.x.abs() <= BOOST_FOOD_JITTER);
        assert!(residue.y.abs() <= BOOST_FOOD_JITTER);
        assert_eq!(residue.hue, player.hue);
    }

    #[test]
    fn test_boost_force_cleared_at_threshold() {
        let (mut room, mut rng) = empty_room();
        place(&mut room, 1, 0.0, 0.0, 0.0);
        {
            let player = room.players.get_mut(&1).unwrap();
            player.score = MIN_BOOST_SCORE;
            player.boosting = true;
        }

        tick_room(&mut room, &mut rng);

        let player = &room.players[&1];
        assert!(!player.boosting);
        assert_eq!(player.score, MIN_BOOST_SCORE);
        assert_approx_eq!(player.x, NORMAL_SPEED);
    }

    #[test]
    fn test_boost_cleared_in_same_tick_score_reaches_threshold() {
        let (mut room, mut rng) = empty_room();
        place(&mut room, 1, 0.0, 0.0, 0.0);
        {
            let player = room.players.get_mut(&1).unwrap();
            player.score = MIN_BOOST_SCORE + 1;
            player.boosting = true;
            // Stretched body keeps the residue out of pickup range.
            player.segments = (0..5).map(|i| Point::new(-10.0 * i as f32, 0.0)).collect();
        }
        room.tick = BOOST_COST_INTERVAL - 1;

        tick_room(&mut room, &mut rng);

        let player = &room.players[&1];
        assert_eq!(player.score, MIN_BOOST_SCORE);
        assert!(!player.boosting);
    }

    #[test]
    fn test_boost_never_spends_below_threshold() {
        let (mut room, mut rng) = empty_room();
        place(&mut room, 1, -900.0, 0.0, 0.0);
        {
            let player = room.players.get_mut(&1).unwrap();
            player.score = 14;
            player.boosting = true;
        }

        for _ in 0..100 {
            room.players.get_mut(&1).unwrap().boosting = true;
            tick_room(&mut room, &mut rng);
            room.food.clear();
            assert!(room.players[&1].score >= MIN_BOOST_SCORE);
        }
        assert_eq!(room.players[&1].score, MIN_BOOST_SCORE);
    }

    #[test]
    fn test_food_consumed_and_replaced() {
        let (mut room, mut rng) = empty_room();
        place(&mut room, 1, 0.0, 0.0, 0.0);
        room.food.push(Food::new(NORMAL_SPEED + 10.0, 0.0, 10));
        room.food.push(Food::new(NORMAL_SPEED, 15.0, 20));
        room.food.push(Food::new(500.0, 500.0, 30));

        let report = tick_room(&mut room, &mut rng);

        assert_eq!(report.food_eaten, 2);
        assert_eq!(room.food.len(), 3);
        assert!(room.food.contains(&Food::new(500.0, 500.0, 30)));

        let player = &room.players[&1];
        assert_eq!(player.target_length, INITIAL_LENGTH + 2);
        assert_eq!(player.score, INITIAL_SCORE + 2 * FOOD_SCORE);
    }

    #[test]
    fn test_food_outside_radius_untouched() {
        let (mut room, mut rng) = empty_room();
        place(&mut room, 1, 0.0, 0.0, 0.0);
        room.food
            .push(Food::new(NORMAL_SPEED + FOOD_PICKUP_RADIUS, 0.0, 10));

        let report = tick_room(&mut room, &mut rng);

        assert_eq!(report.food_eaten, 0);
        assert_eq!(room.players[&1].score, INITIAL_SCORE);
        assert_eq!(room.food.len(), 1);
    }

    #[test]
    fn test_lone_player_never_collides_with_itself() {
        let (mut room, mut rng) = empty_room();
        place(&mut room, 1, 0.0, 0.0, 0.0);

        for i in 0..40 {
            room.players.get_mut(&1).unwrap().angle = i as f32 * 0.5;
            let report = tick_room(&mut room, &mut rng);
            assert!(report.dead.is_empty());
        }
        assert!(room.players.contains_key(&1));
    }

    #[test]
    fn test_head_into_body_kills_only_attacker() {
        let (mut room, mut rng) = empty_room();
        place(&mut room, 1, 88.0, -20.0, 0.0);
        place(&mut room, 2, 100.0, 0.0, FRAC_PI_2);
        {
            let victim = room.players.get_mut(&2).unwrap();
            victim.segments = (0..5)
                .map(|i| Point::new(100.0, -10.0 * i as f32))
                .collect();
        }
        let body_len = room.players[&1].segments.len();

        let report = tick_room(&mut room, &mut rng);

        assert_eq!(report.dead, vec![1]);
        assert!(!room.players.contains_key(&1));
        assert!(room.players.contains_key(&2));
        assert_eq!(room.food.len(), (body_len + 1) / 2);
        assert!(room.food.iter().all(|f| f.hue == shared::hue_for_id(1)));
    }

    #[test]
    fn test_head_on_collision_kills_both() {
        let (mut room, mut rng) = empty_room();
        place(&mut room, 1, 0.0, 0.0, 0.0);
        place(&mut room, 2, 8.0, 0.0, PI);

        let report = tick_room(&mut room, &mut rng);

        assert_eq!(report.dead, vec![1, 2]);
        assert!(room.is_empty());
        assert_eq!(room.food.len(), 6);
    }

    #[test]
    fn test_collision_outcome_independent_of_id_order() {
        let run = |first: u32, second: u32| {
            let (mut room, mut rng) = empty_room();
            place(&mut room, first, 0.0, 0.0, 0.0);
            place(&mut room, second, 8.0, 0.0, PI);
            let mut dead = tick_room(&mut room, &mut rng).dead;
            dead.sort();
            dead
        };

        assert_eq!(run(1, 2), vec![1, 2]);
        assert_eq!(run(2, 1), vec![1, 2]);
    }

    #[test]
    fn test_detect_collisions_does_not_mutate() {
        let (mut room, _) = empty_room();
        place(&mut room, 1, 0.0, 0.0, 0.0);
        place(&mut room, 2, 5.0, 0.0, 0.0);

        let dead = detect_collisions(&room);

        assert_eq!(dead, vec![1, 2]);
        assert_eq!(room.players.len(), 2);
    }

    #[test]
    fn test_resolve_deaths_ignores_unknown_players() {
        let (mut room, _) = empty_room();
        place(&mut room, 1, 0.0, 0.0, 0.0);

        resolve_deaths(&mut room, &[99]);

        assert_eq!(room.players.len(), 1);
        assert!(room.food.is_empty());
    }
}
