//! Client input sampling with change detection

use macroquad::prelude::*;
use shared::Packet;
use std::f32::consts::{PI, TAU};

/// Heading changes smaller than this (radians) are not re-sent
pub const ANGLE_EPSILON: f32 = 0.01;

/// Heading that points from the screen centre toward the pointer
pub fn heading_from_pointer(pointer: (f32, f32), screen_center: (f32, f32)) -> f32 {
    (pointer.1 - screen_center.1).atan2(pointer.0 - screen_center.0)
}

/// Smallest absolute difference between two headings
pub fn angle_difference(a: f32, b: f32) -> f32 {
    let diff = (a - b).rem_euclid(TAU);
    if diff > PI {
        TAU - diff
    } else {
        diff
    }
}

/// Turns sampled controls into the intents the server needs to hear about
pub struct InputManager {
    last_angle: Option<f32>,
    last_boost: bool,
    prev_key_r: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            last_angle: None,
            last_boost: false,
            prev_key_r: false,
        }
    }

    /// Samples the mouse and keyboard for this frame.
    ///
    /// Returns whether a re-join was requested and the intents to send.
    /// Intents are only produced while `playing`.
    pub fn update(&mut self, playing: bool) -> (bool, Vec<Packet>) {
        let key_r = is_key_down(KeyCode::R);
        let rejoin = key_r && !self.prev_key_r;
        self.prev_key_r = key_r;

        if !playing {
            self.reset();
            return (rejoin, Vec::new());
        }

        let angle = heading_from_pointer(
            mouse_position(),
            (screen_width() / 2.0, screen_height() / 2.0),
        );
        let boost = is_mouse_button_down(MouseButton::Left) || is_key_down(KeyCode::Space);

        (rejoin, self.intents(angle, boost))
    }

    /// Emits `Input`/`Boost` only when they differ from what was last sent
    pub fn intents(&mut self, angle: f32, boost: bool) -> Vec<Packet> {
        let mut packets = Vec::new();

        let angle_changed = self
            .last_angle
            .map_or(true, |last| angle_difference(angle, last) > ANGLE_EPSILON);
        if angle_changed {
            self.last_angle = Some(angle);
            packets.push(Packet::Input { angle });
        }

        if boost != self.last_boost {
            self.last_boost = boost;
            packets.push(Packet::Boost { is_boosting: boost });
        }

        packets
    }

    /// Forgets what was sent so the next snake gets a fresh heading
    pub fn reset(&mut self) {
        self.last_angle = None;
        self.last_boost = false;
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
