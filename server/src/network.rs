//! Server network layer handling TCP connections and the room tick scheduler

use crate::client_manager::{ClientManager, Frame, Session};
use crate::registry::{RoomRegistry, RoomTick};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::framing::{encode_packet, read_packet, write_frame, FramingError};
use shared::{Packet, MAP_SIZE, TICK_RATE};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

/// Capacity of the queue feeding the scheduler from connection tasks
pub const INBOUND_CHANNEL_CAPACITY: usize = 1024;
/// Frames buffered per client before broadcasts start being dropped
pub const OUTBOUND_CHANNEL_CAPACITY: usize = 64;

pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    Connected {
        stream: TcpStream,
        addr: SocketAddr,
    },
    PacketReceived {
        client_id: u32,
        packet: Packet,
    },
    ConnectionClosed {
        client_id: u32,
    },
}

/// Main server coordinating networking and room simulation
pub struct Server {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    clients: ClientManager,
    registry: RoomRegistry,
    rng: StdRng,
    tick_duration: Duration,
    ticks: u64,

    // Communication channels
    server_tx: mpsc::Sender<ServerMessage>,
    server_rx: mpsc::Receiver<ServerMessage>,
}

impl Server {
    pub async fn new(addr: &str, max_clients: usize) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on {}", local_addr);

        let (server_tx, server_rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);

        Ok(Server {
            listener: Some(listener),
            local_addr,
            clients: ClientManager::new(max_clients),
            registry: RoomRegistry::new(),
            rng: StdRng::from_entropy(),
            tick_duration: Duration::from_secs_f64(1.0 / TICK_RATE as f64),
            ticks: 0,
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn clients(&self) -> &ClientManager {
        &self.clients
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Spawns task that accepts connections and hands them to the main loop
    fn spawn_acceptor(&mut self) -> Result<(), ServerError> {
        let listener = self
            .listener
            .take()
            .ok_or("Server is already accepting connections")?;
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
                        }
                        if server_tx
                            .send(ServerMessage::Connected { stream, addr })
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
        Ok(())
    }

    /// Registers a new connection's outbound queue.
    ///
    /// Returns None when the server is full.
    pub fn register_connection(
        &mut self,
        addr: SocketAddr,
        sender: mpsc::Sender<Frame>,
    ) -> Option<u32> {
        self.clients.add_client(addr, sender)
    }

    fn handle_connection(&mut self, stream: TcpStream, addr: SocketAddr) {
        let (reader, writer) = stream.into_split();
        let (frame_tx, frame_rx) = mpsc::channel(OUTBOUND_CHANNEL_CAPACITY);
        spawn_writer(writer, frame_rx, addr);

        match self.register_connection(addr, frame_tx.clone()) {
            Some(client_id) => spawn_reader(client_id, reader, self.server_tx.clone()),
            None => {
                warn!("Rejecting connection from {}: server full", addr);
                let response = Packet::Disconnected {
                    reason: "Server full".to_string(),
                };
                match encode_packet(&response) {
                    Ok(data) => {
                        let _ = frame_tx.try_send(Arc::new(data));
                    }
                    Err(e) => error!("Failed to encode rejection: {}", e),
                }
            }
        }
    }

    fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Connected { stream, addr } => self.handle_connection(stream, addr),
            ServerMessage::PacketReceived { client_id, packet } => {
                self.handle_packet(client_id, packet)
            }
            ServerMessage::ConnectionClosed { client_id } => self.disconnect_client(client_id),
        }
    }

    fn send_packet(&self, client_id: u32, packet: &Packet) {
        match encode_packet(packet) {
            Ok(data) => {
                self.clients.send(client_id, Arc::new(data));
            }
            Err(e) => error!("Failed to encode packet for client {}: {}", client_id, e),
        }
    }

    /// Applies a client packet to the rooms immediately.
    ///
    /// Intents land on the live room state and are picked up by the next tick.
    pub fn handle_packet(&mut self, client_id: u32, packet: Packet) {
        if self.clients.get(client_id).is_none() {
            debug!("Dropping packet from unknown client {}", client_id);
            return;
        }

        match packet {
            Packet::JoinRoom {
                room_id,
                player_name,
            } => {
                if let Some(previous) = self.clients.clear_session(client_id) {
                    self.registry.leave(&previous.room_id, previous.player_id);
                }

                let (room_id, player_id) =
                    self.registry
                        .join_room(&room_id, &player_name, &mut self.rng);
                self.clients.set_session(
                    client_id,
                    Session {
                        room_id: room_id.clone(),
                        player_id,
                    },
                );

                let response = Packet::RoomJoined {
                    room_id,
                    map_size: MAP_SIZE,
                    player_id,
                };
                self.send_packet(client_id, &response);
            }

            Packet::Input { angle } => {
                if let Some(session) = self.clients.session(client_id) {
                    self.registry
                        .set_heading(&session.room_id, session.player_id, angle);
                }
            }

            Packet::Boost { is_boosting } => {
                if let Some(session) = self.clients.session(client_id) {
                    self.registry
                        .set_boosting(&session.room_id, session.player_id, is_boosting);
                }
            }

            Packet::Disconnect => self.disconnect_client(client_id),

            _ => {
                warn!("Unexpected packet type from client {}", client_id);
            }
        }
    }

    /// Removes a connection and releases the player it controlled
    pub fn disconnect_client(&mut self, client_id: u32) {
        if let Some(client) = self.clients.remove_client(&client_id) {
            if let Some(session) = client.session {
                self.registry.leave(&session.room_id, session.player_id);
            }
        }
    }

    /// Ticks every room and delivers the results
    pub fn run_tick(&mut self) {
        let results = self.registry.tick_all(&mut self.rng);
        for result in &results {
            self.deliver_tick(result);
        }
        self.ticks += 1;
    }

    fn deliver_tick(&mut self, result: &RoomTick) {
        // Eviction is reported like a death so the client can rejoin
        for &player_id in result.report.dead.iter().chain(&result.evicted) {
            if let Some(client_id) = self
                .clients
                .find_client_by_player(&result.room_id, player_id)
            {
                self.clients.clear_session(client_id);
                self.send_packet(client_id, &Packet::Dead);
            }
        }

        if result.faulted || result.closed {
            return;
        }

        let Some(room) = self.registry.room(&result.room_id) else {
            return;
        };

        // Encoded once per room, shared by every recipient
        match encode_packet(&room.snapshot()) {
            Ok(data) => {
                let frame = Arc::new(data);
                self.clients.broadcast_to_room(&result.room_id, &frame);
            }
            Err(e) => error!("Failed to encode state for room {}: {}", result.room_id, e),
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), ServerError> {
        self.spawn_acceptor()?;

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick = Instant::now();

        info!("Server started successfully");

        loop {
            tokio::select! {
                // Handle network events
                message = self.server_rx.recv() => {
                    match message {
                        Some(message) => self.handle_message(message),
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                // Handle server tick events
                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f32();
                    last_tick = now;

                    self.run_tick();

                    // Periodic performance monitoring
                    if self.ticks % TICK_RATE as u64 == 0 && !self.clients.is_empty() {
                        debug!("Tick {}: {} clients, {} rooms, {:.1}Hz",
                               self.ticks, self.clients.len(), self.registry.len(), 1.0 / dt);
                    }
                },
            }
        }

        Ok(())
    }
}

/// Spawns task that decodes frames from one connection and forwards them
fn spawn_reader(client_id: u32, mut reader: OwnedReadHalf, server_tx: mpsc::Sender<ServerMessage>) {
    tokio::spawn(async move {
        loop {
            match read_packet(&mut reader).await {
                Ok(packet) => {
                    if server_tx
                        .send(ServerMessage::PacketReceived { client_id, packet })
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                Err(FramingError::ConnectionClosed) => break,
                Err(FramingError::Codec(e)) => {
                    warn!("Failed to deserialize packet from client {}: {}", client_id, e);
                }
                Err(e) => {
                    warn!("Dropping client {}: {}", client_id, e);
                    break;
                }
            }
        }

        let _ = server_tx
            .send(ServerMessage::ConnectionClosed { client_id })
            .await;
    });
}

/// Spawns task that drains a connection's outbound queue onto the socket.
///
/// Ends once every sender is dropped, which closes the write half.
fn spawn_writer(mut writer: OwnedWriteHalf, mut frames: mpsc::Receiver<Frame>, addr: SocketAddr) {
    tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            if let Err(e) = write_frame(&mut writer, &frame).await {
                debug!("Failed to write to {}: {}", addr, e);
                break;
            }
        }
    });
}
