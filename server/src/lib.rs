//! # Snake Arena Server Library
//!
//! This library provides the authoritative server for the multiplayer snake
//! arena. It owns every room's world state, applies client intents, advances
//! each room on a fixed tick and broadcasts full-state snapshots to the
//! members of each room.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Movement, food consumption, collisions and deaths are all decided here.
//! Clients only ever send intents (a desired heading and a boost toggle) and
//! render whatever the last snapshot said.
//!
//! ### Rooms
//! A room is created the first time someone joins its id and destroyed as
//! soon as its last player leaves or dies. Rooms never share state; a fault
//! while ticking one room rolls that room back and leaves the others running.
//!
//! ### Client Management
//! Handles the complete lifecycle of client connections including:
//! - Connection establishment and capacity limits
//! - The session binding a connection to its player in a room
//! - Death notification and session detachment
//! - Disconnection handling and cleanup
//!
//! ## Architecture Design
//!
//! ### Single Cooperative Scheduler
//! Network events and tick timer events are multiplexed onto one loop, so
//! intent handlers and room ticks never run concurrently. A tick always sees a
//! consistent room; intents that arrive between ticks are picked up by the
//! next one.
//!
//! ### Reliable Ordered Transport
//! Clients connect over TCP. Every packet travels in a length-prefixed bincode
//! frame (see `shared::framing`). Each connection gets a reader task feeding
//! the scheduler and a writer task draining a bounded outbound queue;
//! broadcasts are fire-and-forget and a client that falls behind simply
//! loses snapshots that the next one supersedes.
//!
//! ## Module Organization
//!
//! ### Room Module (`room`)
//! World state of a single room: players in id order, food and the tick
//! counter, plus snapshot construction.
//!
//! ### Game Module (`game`)
//! The tick engine: movement and boost economy, food consumption, collision
//! detection and death resolution.
//!
//! ### Registry Module (`registry`)
//! Create-on-first-join, destroy-on-empty, intent application and the
//! fault-isolated per-room tick.
//!
//! ### Client Manager Module (`client_manager`)
//! Connection records, sessions and outbound delivery.
//!
//! ### Network Module (`network`)
//! TCP accept loop, connection tasks and the scheduler that ties everything
//! together.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     // Bind on localhost and allow up to 64 concurrent connections
//!     let mut server = Server::new("127.0.0.1:8080", 64).await?;
//!
//!     // Accepts connections, ticks every room at 30Hz and broadcasts state
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod game;
pub mod network;
pub mod registry;
pub mod room;
