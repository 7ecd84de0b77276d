//! Background connection to the server.
//!
//! The render loop is driven by macroquad and never blocks, so the socket
//! lives on its own thread running a single-threaded tokio runtime. The two
//! sides talk through unbounded channels that the frame loop polls.

use log::{error, info, warn};
use shared::framing::{read_snapshot_packet, write_packet, FramingError};
use shared::Packet;
use std::io;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug)]
pub enum NetworkEvent {
    Packet(Packet),
    /// The connection ended; no further events follow
    Closed(String),
}

pub struct NetworkHandle {
    outbound_tx: UnboundedSender<Packet>,
    inbound_rx: UnboundedReceiver<NetworkEvent>,
}

impl NetworkHandle {
    pub fn connect(server_addr: String) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        std::thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!("Failed to start network runtime: {}", e);
                    let _ = inbound_tx.send(NetworkEvent::Closed(e.to_string()));
                    return;
                }
            };

            let result = runtime.block_on(run_connection(
                &server_addr,
                outbound_rx,
                inbound_tx.clone(),
            ));
            let reason = match result {
                Ok(()) => "Connection closed".to_string(),
                Err(FramingError::ConnectionClosed) => "Server closed the connection".to_string(),
                Err(e) => e.to_string(),
            };
            info!("Network thread exiting: {}", reason);
            let _ = inbound_tx.send(NetworkEvent::Closed(reason));
        });

        Self {
            outbound_tx,
            inbound_rx,
        }
    }

    /// Queues a packet for the server; dropped silently once disconnected
    pub fn send(&self, packet: Packet) {
        let _ = self.outbound_tx.send(packet);
    }

    pub fn try_recv(&mut self) -> Option<NetworkEvent> {
        self.inbound_rx.try_recv().ok()
    }
}

/// Runs one connection until either side closes it.
///
/// Reading happens on its own task so a frame is never abandoned halfway
/// when an outbound packet is ready.
pub async fn run_connection(
    server_addr: &str,
    mut outbound_rx: UnboundedReceiver<Packet>,
    inbound_tx: UnboundedSender<NetworkEvent>,
) -> Result<(), FramingError> {
    let stream = TcpStream::connect(server_addr).await?;
    stream.set_nodelay(true)?;
    info!("Connected to {}", server_addr);

    let (mut reader, mut writer) = stream.into_split();

    let mut reader_task = tokio::spawn(async move {
        loop {
            match read_snapshot_packet(&mut reader).await {
                Ok(packet) => {
                    if inbound_tx.send(NetworkEvent::Packet(packet)).is_err() {
                        return FramingError::ConnectionClosed;
                    }
                }
                Err(FramingError::Codec(e)) => {
                    warn!("Failed to deserialize packet from server: {}", e);
                }
                Err(e) => return e,
            }
        }
    });

    loop {
        tokio::select! {
            packet = outbound_rx.recv() => {
                match packet {
                    Some(packet) => {
                        let disconnecting = matches!(packet, Packet::Disconnect);
                        write_packet(&mut writer, &packet).await?;
                        if disconnecting {
                            reader_task.abort();
                            return Ok(());
                        }
                    }
                    None => {
                        reader_task.abort();
                        return Ok(());
                    }
                }
            },

            finished = &mut reader_task => {
                return match finished {
                    Ok(e) => Err(e),
                    Err(e) => Err(FramingError::Io(io::Error::new(io::ErrorKind::Other, e))),
                };
            },
        }
    }
}
