use std::net::SocketAddr;

use anyhow::Context;
use shared::osc::{self, OscError};
use tokio::{net::UdpSocket, sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{bridge::InboundEvent, config::Settings};

const MAX_DATAGRAM: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TrackingStream {
    Coordinates,
    Status,
}

pub(crate) async fn spawn_all(
    settings: &Settings,
    events: mpsc::Sender<InboundEvent>,
) -> anyhow::Result<()> {
    let coords = bind(settings.listen_addr(settings.tracking_coords_port)).await?;
    let status = bind(settings.listen_addr(settings.tracking_status_port)).await?;
    let engine = bind(settings.listen_addr(settings.engine_status_port)).await?;

    spawn_tracking_listener(coords, TrackingStream::Coordinates, events.clone());
    spawn_tracking_listener(status, TrackingStream::Status, events.clone());
    spawn_engine_listener(engine, events);
    Ok(())
}

async fn bind(addr: SocketAddr) -> anyhow::Result<UdpSocket> {
    let socket = UdpSocket::bind(addr)
        .await
        .with_context(|| format!("failed to bind udp listener on {addr}"))?;
    info!(%addr, "udp listener bound");
    Ok(socket)
}

pub(crate) fn tracking_events(
    stream: TrackingStream,
    datagram: &[u8],
) -> Result<Vec<InboundEvent>, OscError> {
    let messages = osc::decode_packet(datagram)?;
    Ok(messages
        .into_iter()
        .map(|message| match stream {
            TrackingStream::Coordinates => InboundEvent::Coordinates(message),
            TrackingStream::Status => InboundEvent::Status(message),
        })
        .collect())
}

/// Engine status arrives as plain text, possibly several lines per datagram.
pub(crate) fn engine_lines(datagram: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(datagram)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn spawn_tracking_listener(
    socket: UdpSocket,
    stream: TrackingStream,
    events: mpsc::Sender<InboundEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let (len, peer) = match socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(error) => {
                    debug!(?stream, %error, "udp receive failed");
                    continue;
                }
            };
            let decoded = match tracking_events(stream, &buf[..len]) {
                Ok(decoded) => decoded,
                Err(error) => {
                    warn!(?stream, %peer, %error, "dropping undecodable tracking datagram");
                    continue;
                }
            };
            for event in decoded {
                if events.send(event).await.is_err() {
                    return;
                }
            }
        }
    })
}

pub(crate) fn spawn_engine_listener(
    socket: UdpSocket,
    events: mpsc::Sender<InboundEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let len = match socket.recv_from(&mut buf).await {
                Ok((len, _)) => len,
                Err(error) => {
                    debug!(%error, "udp receive failed");
                    continue;
                }
            };
            for line in engine_lines(&buf[..len]) {
                if events.send(InboundEvent::EngineLine(line)).await.is_err() {
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "tests/listeners_tests.rs"]
mod tests;
