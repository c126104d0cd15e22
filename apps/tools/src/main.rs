use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use shared::{
    osc::{decode_packet, OscArg, OscMessage},
    protocol::EngineChannel,
};
use tokio::{net::UdpSocket, task::JoinSet};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Stand-ins for the tracking source and the audio engine, for poking a
/// running coordinator by hand.
#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    host: IpAddr,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one coordinate frame, as the tracking source would.
    SendCoords {
        x: f32,
        y: f32,
        z: f32,
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// Send one tracking status frame.
    SendStatus {
        #[command(subcommand)]
        status: Status,
        #[arg(long, default_value_t = 8010)]
        port: u16,
    },
    /// Send a plain text status line, as the engine would.
    SendEngineLine {
        line: String,
        #[arg(long, default_value_t = 11000)]
        port: u16,
    },
    /// Bind the engine ports and print every datagram the coordinator sends.
    ListenEngine {
        #[arg(long, default_value_t = 7000)]
        route_port: u16,
        #[arg(long, default_value_t = 7010)]
        params_port: u16,
        #[arg(long, default_value_t = 7020)]
        audio_in_port: u16,
        #[arg(long, default_value_t = 7030)]
        coords_port: u16,
        #[arg(long, default_value_t = 7040)]
        xyz_map_port: u16,
    },
}

#[derive(Subcommand, Debug)]
enum Status {
    Dimensions { width: f32, height: f32, depth: f32 },
    Bound { state: Flag },
    Tracking { state: Flag },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Flag {
    On,
    Off,
}

impl From<Flag> for OscArg {
    fn from(flag: Flag) -> Self {
        OscArg::Int(matches!(flag, Flag::On).into())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::SendCoords { x, y, z, port } => {
            let message = OscMessage::new(
                "/Coordinates",
                vec![OscArg::Float(x), OscArg::Float(y), OscArg::Float(z)],
            );
            send(SocketAddr::new(cli.host, port), &message).await?;
        }
        Command::SendStatus { status, port } => {
            let message = match status {
                Status::Dimensions {
                    width,
                    height,
                    depth,
                } => OscMessage::new(
                    "/BoxDimensions",
                    vec![
                        OscArg::Float(width),
                        OscArg::Float(height),
                        OscArg::Float(depth),
                    ],
                ),
                Status::Bound { state } => OscMessage::new("/BoundStatus", vec![state.into()]),
                Status::Tracking { state } => OscMessage::new("/TrackingMode", vec![state.into()]),
            };
            send(SocketAddr::new(cli.host, port), &message).await?;
        }
        Command::SendEngineLine { line, port } => {
            let target = SocketAddr::new(cli.host, port);
            let socket = UdpSocket::bind(unspecified(target)).await?;
            socket
                .send_to(line.as_bytes(), target)
                .await
                .with_context(|| format!("failed to send to {target}"))?;
            info!(%target, %line, "sent engine line");
        }
        Command::ListenEngine {
            route_port,
            params_port,
            audio_in_port,
            coords_port,
            xyz_map_port,
        } => {
            let ports = [
                (EngineChannel::Route, route_port),
                (EngineChannel::Parameters, params_port),
                (EngineChannel::AudioInput, audio_in_port),
                (EngineChannel::Coordinates, coords_port),
                (EngineChannel::AxisMap, xyz_map_port),
            ];
            let mut listeners = JoinSet::new();
            for (channel, port) in ports {
                let addr = SocketAddr::new(cli.host, port);
                let socket = UdpSocket::bind(addr)
                    .await
                    .with_context(|| format!("failed to bind {addr}"))?;
                info!(?channel, %addr, "listening");
                listeners.spawn(print_datagrams(channel, socket));
            }
            while let Some(joined) = listeners.join_next().await {
                joined??;
            }
        }
    }

    Ok(())
}

fn unspecified(target: SocketAddr) -> SocketAddr {
    let host = if target.is_ipv4() {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    } else {
        IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
    };
    SocketAddr::new(host, 0)
}

async fn send(target: SocketAddr, message: &OscMessage) -> Result<()> {
    let socket = UdpSocket::bind(unspecified(target)).await?;
    let bytes = message.encode()?;
    socket
        .send_to(&bytes, target)
        .await
        .with_context(|| format!("failed to send to {target}"))?;
    info!(%target, address = %message.address, args = ?message.args, "sent");
    Ok(())
}

async fn print_datagrams(channel: EngineChannel, socket: UdpSocket) -> Result<()> {
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let (len, _) = socket.recv_from(&mut buf).await?;
        match decode_packet(&buf[..len]) {
            Ok(messages) => {
                for message in messages {
                    let args: Vec<serde_json::Value> =
                        message.args.iter().map(OscArg::to_json).collect();
                    println!("{:?} {} {}", channel, message.address, serde_json::Value::from(args));
                }
            }
            Err(error) => warn!(?channel, %error, "undecodable datagram"),
        }
    }
}
