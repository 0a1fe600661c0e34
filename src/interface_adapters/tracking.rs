// Tracking adapter: reads blob datagrams from the pose camera rig and
// enqueues them for the stage loop. Parsing and sanitizing happen here so
// the stage never sees malformed input.

use std::time::{Duration, Instant};

use glam::Vec2;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::interface_adapters::protocol::TrackingDto;
use crate::use_cases::StageEvent;

const LOG_THROTTLE: Duration = Duration::from_secs(2);

pub(crate) fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

/// Drops datagrams carrying NaN/inf coordinates before they can poison
/// player state.
pub fn sanitize(dto: TrackingDto) -> Option<StageEvent> {
    if !dto.x.is_finite() || !dto.y.is_finite() {
        return None;
    }
    Some(StageEvent::Position {
        player_id: dto.id,
        raw: Vec2::new(dto.x, dto.y),
    })
}

pub async fn tracking_task(socket: UdpSocket, input_tx: mpsc::Sender<StageEvent>) {
    let mut buf = [0u8; 2048];
    let started = Instant::now() - LOG_THROTTLE;
    let mut last_parse_log = started;
    let mut last_invalid_log = started;
    let mut last_full_log = started;

    loop {
        let len = match socket.recv_from(&mut buf).await {
            Ok((len, _addr)) => len,
            Err(e) => {
                warn!(error = %e, "tracking socket recv error");
                continue;
            }
        };

        let dto = match serde_json::from_slice::<TrackingDto>(&buf[..len]) {
            Ok(dto) => dto,
            Err(e) => {
                if should_log(&mut last_parse_log) {
                    warn!(bytes = len, error = %e, "failed to parse tracking datagram");
                }
                continue;
            }
        };

        let Some(event) = sanitize(dto) else {
            if should_log(&mut last_invalid_log) {
                warn!("invalid tracking values (NaN/inf); dropping");
            }
            continue;
        };

        match input_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                // The stage drains the queue every tick; a full queue means
                // the rig is flooding us and the oldest data wins.
                if should_log(&mut last_full_log) {
                    warn!("stage input channel full; dropping tracking update");
                }
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                info!("stage input channel closed; tracking receiver exiting");
                return;
            }
        }
    }
}
