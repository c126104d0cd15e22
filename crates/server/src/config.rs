use std::{
    fs,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::Path,
    str::FromStr,
};

use shared::protocol::EngineChannel;
use tracing::warn;

pub const SETTINGS_FILE: &str = "coordinator.toml";
const ENV_PREFIX: &str = "APP__";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub http_bind: String,
    pub engine_host: IpAddr,
    pub engine_route_port: u16,
    pub engine_params_port: u16,
    pub engine_audio_in_port: u16,
    pub engine_coords_port: u16,
    pub engine_xyz_map_port: u16,
    pub listen_host: IpAddr,
    pub tracking_coords_port: u16,
    pub tracking_status_port: u16,
    pub engine_status_port: u16,
    pub unmap_on_remove: bool,
    pub event_queue_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            http_bind: "127.0.0.1:3000".into(),
            engine_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            engine_route_port: 7000,
            engine_params_port: 7010,
            engine_audio_in_port: 7020,
            engine_coords_port: 7030,
            engine_xyz_map_port: 7040,
            listen_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            tracking_coords_port: 8000,
            tracking_status_port: 8010,
            engine_status_port: 11000,
            unmap_on_remove: true,
            event_queue_capacity: 1024,
        }
    }
}

impl Settings {
    pub fn engine_addr(&self, channel: EngineChannel) -> SocketAddr {
        let port = match channel {
            EngineChannel::Route => self.engine_route_port,
            EngineChannel::Parameters => self.engine_params_port,
            EngineChannel::AudioInput => self.engine_audio_in_port,
            EngineChannel::Coordinates => self.engine_coords_port,
            EngineChannel::AxisMap => self.engine_xyz_map_port,
        };
        SocketAddr::new(self.engine_host, port)
    }

    pub fn listen_addr(&self, port: u16) -> SocketAddr {
        SocketAddr::new(self.listen_host, port)
    }

    pub fn apply(&mut self, key: &str, raw: &str) {
        let raw = raw.trim();
        match key {
            "http_bind" | "bind_addr" => self.http_bind = raw.to_string(),
            "engine_host" => set_parsed(key, raw, &mut self.engine_host),
            "engine_route_port" => set_parsed(key, raw, &mut self.engine_route_port),
            "engine_params_port" => set_parsed(key, raw, &mut self.engine_params_port),
            "engine_audio_in_port" => set_parsed(key, raw, &mut self.engine_audio_in_port),
            "engine_coords_port" => set_parsed(key, raw, &mut self.engine_coords_port),
            "engine_xyz_map_port" => set_parsed(key, raw, &mut self.engine_xyz_map_port),
            "listen_host" => set_parsed(key, raw, &mut self.listen_host),
            "tracking_coords_port" => set_parsed(key, raw, &mut self.tracking_coords_port),
            "tracking_status_port" => set_parsed(key, raw, &mut self.tracking_status_port),
            "engine_status_port" => set_parsed(key, raw, &mut self.engine_status_port),
            "unmap_on_remove" => set_parsed(key, raw, &mut self.unmap_on_remove),
            "event_queue_capacity" => {
                let mut capacity = self.event_queue_capacity;
                set_parsed(key, raw, &mut capacity);
                if capacity == 0 {
                    warn!(key, "queue capacity must be positive; keeping previous value");
                } else {
                    self.event_queue_capacity = capacity;
                }
            }
            _ => warn!(key, "ignoring unknown setting"),
        }
    }
}

fn set_parsed<T: FromStr>(key: &str, raw: &str, slot: &mut T) {
    match raw.parse() {
        Ok(value) => *slot = value,
        Err(_) => warn!(key, value = raw, "ignoring invalid setting value"),
    }
}

/// Defaults, then `coordinator.toml` in the working directory, then `APP__*`
/// environment variables.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    apply_file(&mut settings, Path::new(SETTINGS_FILE));
    apply_env(&mut settings, std::env::vars());
    settings
}

pub fn apply_file(settings: &mut Settings, path: &Path) {
    let Ok(raw) = fs::read_to_string(path) else {
        return;
    };
    match toml::from_str::<toml::Table>(&raw) {
        Ok(table) => {
            for (key, value) in &table {
                let value = match value {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                settings.apply(key, &value);
            }
        }
        Err(error) => warn!(path = %path.display(), %error, "ignoring unreadable settings file"),
    }
}

pub fn apply_env(settings: &mut Settings, vars: impl IntoIterator<Item = (String, String)>) {
    for (name, value) in vars {
        if let Some(key) = name.strip_prefix(ENV_PREFIX) {
            settings.apply(&key.to_ascii_lowercase(), &value);
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
