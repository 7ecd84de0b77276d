//! # Snake Arena Client Library
//!
//! This library provides the client side of the multiplayer snake arena: it
//! sends steering intents, receives full-state snapshots and draws a smoothed
//! view of the room around the local snake.
//!
//! ## Architecture Overview
//!
//! The client does no simulation of its own. The server is the only authority
//! on positions, scores and deaths; the client's job is to make 30Hz snapshots
//! look fluid at whatever rate the display refreshes.
//!
//! ### Snapshot Reconciliation
//! Every snapshot replaces the world wholesale. Snakes already on screen keep
//! their drawn position and are given a new target; new snakes appear where
//! the server says they are; snakes missing from the snapshot vanish.
//!
//! ### Interpolation
//! Each frame the drawn head moves a fixed fraction of the remaining distance
//! toward its target. Two identical snapshots in a row leave the drawn
//! position converging on a fixed point.
//!
//! ### Intents Only
//! The mouse direction relative to the screen centre becomes the desired
//! heading, and the left button or Space toggles boost. Both are sent only
//! when they change.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Client-side room state: rendered snakes, food, the local player id and the
//! join/play/death phase.
//!
//! ### View Module (`view`)
//! Camera that follows the local snake and the minimap projection.
//!
//! ### Input Module (`input`)
//! Mouse and keyboard sampling with change detection.
//!
//! ### Network Module (`network`)
//! A background thread owning the TCP connection, bridged to the frame loop by
//! channels.
//!
//! ### Rendering Module (`rendering`)
//! Macroquad drawing for the arena, snakes, food, HUD, minimap and banners.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::ClientGameState;
//! use client::network::{NetworkEvent, NetworkHandle};
//! use shared::{Packet, INTERPOLATION_FACTOR};
//!
//! let mut network = NetworkHandle::connect("127.0.0.1:8080".to_string());
//! network.send(Packet::JoinRoom {
//!     room_id: "1".to_string(),
//!     player_name: "Player".to_string(),
//! });
//!
//! let mut game = ClientGameState::new();
//! loop {
//!     // Fold in whatever arrived since the last frame
//!     while let Some(event) = network.try_recv() {
//!         match event {
//!             NetworkEvent::Packet(packet) => game.handle_packet(packet),
//!             NetworkEvent::Closed(reason) => game.on_disconnected(reason),
//!         }
//!     }
//!
//!     // Smooth toward the latest snapshot, then draw
//!     game.step_frame(INTERPOLATION_FACTOR);
//! #   break;
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
pub mod view;
