// Sound adapter: turns stage sound commands into datagrams for the external
// spatial audio host. A failed send is logged and swallowed; audio must
// never stall the stage.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::domain::SoundCommand;
use crate::interface_adapters::protocol::SoundEventDto;
use crate::interface_adapters::tracking::should_log;

pub async fn sound_task(
    socket: UdpSocket,
    target: SocketAddr,
    mut command_rx: mpsc::Receiver<SoundCommand>,
    sphere_radius: f32,
) {
    // Loops the host currently has playing, for stop bookkeeping.
    let mut active: HashSet<String> = HashSet::new();
    let mut last_send_error_log = Instant::now() - Duration::from_secs(2);

    while let Some(command) = command_rx.recv().await {
        match &command {
            SoundCommand::Start { id, .. } | SoundCommand::Update { id, .. } => {
                // Start-or-update semantics: the host treats an update for an
                // unknown id as a start, and so do we.
                active.insert(id.clone());
            }
            SoundCommand::Stop { id, .. } => {
                if !active.remove(id) {
                    warn!(sound_id = %id, "asked to stop a sound that is not active");
                    continue;
                }
            }
            SoundCommand::OneShot { .. } => {}
        }

        let dto = SoundEventDto::from_command(&command, sphere_radius);
        let bytes = match serde_json::to_vec(&dto) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(error = %e, "failed to serialize sound event");
                continue;
            }
        };

        match socket.send_to(&bytes, target).await {
            Ok(_) => {
                debug!(sound_id = %dto.id, event = dto.event, "sound event sent");
            }
            Err(e) => {
                if should_log(&mut last_send_error_log) {
                    error!(error = %e, %target, "failed to send sound event");
                }
            }
        }
    }

    info!("sound channel closed; sender exiting");
}
