use std::net::{SocketAddr, UdpSocket};

use anyhow::Context;
use shared::{osc::OscMessage, protocol::EngineChannel};
use tracing::debug;

use crate::{bridge::EngineSink, config::Settings};

/// Sends engine datagrams from one unconnected, non-blocking socket. A full
/// socket buffer or an unreachable engine just loses the datagram.
pub(crate) struct UdpEngineSink {
    socket: UdpSocket,
    targets: [(EngineChannel, SocketAddr); 5],
}

impl UdpEngineSink {
    pub(crate) fn bind(settings: &Settings) -> anyhow::Result<Self> {
        let local = if settings.engine_host.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(local)
            .with_context(|| format!("failed to bind engine sender socket on {local}"))?;
        socket
            .set_nonblocking(true)
            .context("failed to make engine sender socket non-blocking")?;
        let targets = EngineChannel::ALL.map(|channel| (channel, settings.engine_addr(channel)));
        Ok(Self { socket, targets })
    }

    fn target(&self, channel: EngineChannel) -> Option<SocketAddr> {
        self.targets
            .iter()
            .find(|(candidate, _)| *candidate == channel)
            .map(|(_, addr)| *addr)
    }
}

impl EngineSink for UdpEngineSink {
    fn send(&self, channel: EngineChannel, message: OscMessage) {
        let Some(target) = self.target(channel) else {
            return;
        };
        let bytes = match message.encode() {
            Ok(bytes) => bytes,
            Err(error) => {
                debug!(?channel, %error, "engine datagram not encodable");
                return;
            }
        };
        match self.socket.send_to(&bytes, target) {
            Ok(_) => debug!(?channel, %target, len = bytes.len(), "engine datagram sent"),
            Err(error) => debug!(?channel, %target, %error, "engine datagram dropped"),
        }
    }
}
