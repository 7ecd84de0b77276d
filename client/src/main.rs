use clap::Parser;
use client::game::{ClientGameState, Phase};
use client::input::InputManager;
use client::network::{NetworkEvent, NetworkHandle};
use client::rendering::Renderer;
use client::view::Camera;
use log::info;
use macroquad::prelude::*;
use shared::{Packet, INTERPOLATION_FACTOR};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Room to join
    #[arg(short = 'r', long, default_value = "1")]
    room: String,

    /// Name shown above your snake
    #[arg(short = 'n', long, default_value = "Player")]
    name: String,

    /// Window width
    #[arg(short = 'w', long, default_value = "1024")]
    width: i32,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "768")]
    height: i32,
}

fn window_conf() -> Conf {
    let args = Args::parse();
    Conf {
        window_title: "Snake Arena".to_owned(),
        window_width: args.width,
        window_height: args.height,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Connecting to: {}", args.server);
    info!("Controls: steer with the mouse, hold left button or Space to boost, R to rejoin");

    let join = Packet::JoinRoom {
        room_id: args.room.clone(),
        player_name: args.name.clone(),
    };

    let mut network = NetworkHandle::connect(args.server.clone());
    network.send(join.clone());

    let mut game = ClientGameState::new();
    let mut input = InputManager::new();
    let mut camera = Camera::new();
    let mut renderer = Renderer::new();

    loop {
        while let Some(event) = network.try_recv() {
            match event {
                NetworkEvent::Packet(packet) => game.handle_packet(packet),
                NetworkEvent::Closed(reason) => game.on_disconnected(reason),
            }
        }

        if is_key_pressed(KeyCode::Escape) {
            network.send(Packet::Disconnect);
            break;
        }

        let (rejoin, intents) = input.update(game.is_playing());
        if rejoin && game.phase == Phase::Dead {
            info!("Rejoining room {}", args.room);
            network.send(join.clone());
            game.begin_rejoin();
        }
        for intent in intents {
            network.send(intent);
        }

        game.step_frame(INTERPOLATION_FACTOR);
        camera.follow(game.local_position());
        renderer.render(&game, &camera);

        next_frame().await
    }
}
