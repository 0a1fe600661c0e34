// Framework bootstrap for the stage server runtime.

use crate::domain::PlayerRegistry;
use crate::frameworks::config;
use crate::interface_adapters::control::{set_scene_handler, status_handler};
use crate::interface_adapters::feed::{world_update_serializer, ws_handler};
use crate::interface_adapters::sound::sound_task;
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::tracking::tracking_task;
use crate::use_cases::{SceneState, StageEvent, StageStatus, WorldUpdate, stage_task};

use axum::{
    Router,
    extract::ws::Utf8Bytes,
    routing::{get, post},
};
use std::io::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::{broadcast, mpsc, watch};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(
    listener: tokio::net::TcpListener,
    tracking_socket: UdpSocket,
    sound_socket: UdpSocket,
    sound_target: SocketAddr,
) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state(tracking_socket, sound_socket, sound_target);

    let app = Router::new()
        .route("/feed", get(ws_handler))
        .route("/status", get(status_handler))
        .route("/scene", post(set_scene_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind http listener");
        })?;

    let tracking_address = SocketAddr::from(([0, 0, 0, 0], config::tracking_port()));
    let tracking_socket = UdpSocket::bind(tracking_address).await.inspect_err(|e| {
        tracing::error!(%tracking_address, error = %e, "failed to bind tracking socket");
    })?;
    tracing::info!(%tracking_address, "tracking feed listening");

    // Any local port will do for the outbound sound socket.
    let sound_socket = UdpSocket::bind("0.0.0.0:0").await?;
    let sound_target = config::sound_host();
    tracing::info!(%sound_target, "sound events target");

    run(listener, tracking_socket, sound_socket, sound_target).await
}

fn build_state(
    tracking_socket: UdpSocket,
    sound_socket: UdpSocket,
    sound_target: SocketAddr,
) -> Arc<AppState> {
    let dome = config::dome_projection();
    let settings = config::stage_settings();
    let registry = PlayerRegistry::new(dome, config::tracking_tuning(), config::player_tuning());

    // Channel wiring for the stage loop.
    let (input_tx, input_rx) = mpsc::channel::<StageEvent>(config::INPUT_CHANNEL_CAPACITY);
    let (world_tx, _world_rx) = broadcast::channel::<WorldUpdate>(config::WORLD_BROADCAST_CAPACITY);
    let (world_bytes_tx, _world_bytes_rx) =
        broadcast::channel::<Utf8Bytes>(config::WORLD_BROADCAST_CAPACITY);
    let (world_latest_tx, _world_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));
    let (scene_tx, _scene_rx) = watch::channel(SceneState {
        scene: settings.initial_scene,
        changed_at_tick: 0,
    });
    let (status_tx, _status_rx) = watch::channel(StageStatus {
        scene: settings.initial_scene,
        tick: 0,
        num_players: 0,
        num_active: 0,
    });
    let (sound_tx, sound_rx) = mpsc::channel(config::SOUND_CHANNEL_CAPACITY);

    // The stage loop runs for the life of the process.
    let shutdown = Arc::new(tokio::sync::Notify::new());
    tokio::spawn(stage_task(
        registry,
        input_rx,
        world_tx.clone(),
        scene_tx.clone(),
        status_tx.clone(),
        sound_tx,
        settings,
        shutdown,
    ));

    // Adapters around the loop.
    tokio::spawn(world_update_serializer(
        world_tx.subscribe(),
        world_bytes_tx.clone(),
        world_latest_tx.clone(),
    ));
    tokio::spawn(tracking_task(tracking_socket, input_tx.clone()));
    tokio::spawn(sound_task(
        sound_socket,
        sound_target,
        sound_rx,
        dome.sphere_radius,
    ));

    Arc::new(AppState {
        input_tx,
        world_bytes_tx,
        world_latest_tx,
        scene_tx,
        status_tx,
    })
}
