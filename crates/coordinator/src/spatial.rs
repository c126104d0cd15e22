use serde::Deserialize;
use shared::{
    domain::{Axis, Dimensions, TrackingStatus},
    osc::OscArg,
};
use tracing::{debug, warn};

use crate::{
    axis_map::AxisMapper,
    chain::ChainManager,
    params::{ParameterStore, ParameterUpdate, UpdateSource},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAddress {
    BoxDimensions,
    BoundStatus,
    TrackingMode,
}

impl StatusAddress {
    pub fn parse(address: &str) -> Option<Self> {
        match address {
            "/BoxDimensions" => Some(StatusAddress::BoxDimensions),
            "/BoundStatus" => Some(StatusAddress::BoundStatus),
            "/TrackingMode" => Some(StatusAddress::TrackingMode),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DimensionsArg {
    #[serde(alias = "Width")]
    width: f32,
    #[serde(alias = "Height")]
    height: f32,
    #[serde(alias = "Depth")]
    depth: f32,
}

#[derive(Debug, Clone, Default)]
pub struct SpatialInputRelay {
    status: TrackingStatus,
}

impl SpatialInputRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &TrackingStatus {
        &self.status
    }

    /// Resolves each bound axis to a parameter update. Only updates for effects
    /// still in `chain` are merged into `params`; a binding left behind by a
    /// removed effect still yields an update for the engine. Unbound axes and
    /// non-finite components produce nothing.
    pub fn on_coordinate_frame(
        &self,
        axes: &AxisMapper,
        chain: &ChainManager,
        params: &mut ParameterStore,
        frame: [f32; 3],
    ) -> Vec<ParameterUpdate> {
        let updates: Vec<ParameterUpdate> = Axis::ALL
            .into_iter()
            .filter_map(|axis| {
                let target = axes.resolve(axis)?;
                let component = frame[axis.index()];
                if !component.is_finite() {
                    debug!(%axis, "skipping non-finite coordinate");
                    return None;
                }
                Some(ParameterUpdate {
                    effect_id: target.effect_id.clone(),
                    param_name: target.param_name.clone(),
                    value: component.clamp(0.0, 1.0),
                    source: UpdateSource::Spatial,
                })
            })
            .collect();

        let live: Vec<ParameterUpdate> = updates
            .iter()
            .filter(|update| chain.contains(&update.effect_id))
            .cloned()
            .collect();
        params.apply(&live);
        updates
    }

    pub fn on_status_event(&mut self, address: &str, args: &[OscArg]) -> Option<StatusAddress> {
        let Some(kind) = StatusAddress::parse(address) else {
            warn!(address, "dropping unrecognised tracking status address");
            return None;
        };

        match kind {
            StatusAddress::BoxDimensions => {
                let Some(dimensions) = parse_dimensions(args) else {
                    warn!(address, ?args, "malformed box dimensions");
                    return None;
                };
                self.status.dimensions = dimensions;
            }
            StatusAddress::BoundStatus => {
                let Some(flag) = single_bool(args) else {
                    warn!(address, ?args, "expected one boolean argument");
                    return None;
                };
                self.status.is_in_bounds = flag;
            }
            StatusAddress::TrackingMode => {
                let Some(flag) = single_bool(args) else {
                    warn!(address, ?args, "expected one boolean argument");
                    return None;
                };
                self.status.is_tracking = flag;
            }
        }

        self.status.is_connected = true;
        Some(kind)
    }
}

fn single_bool(args: &[OscArg]) -> Option<bool> {
    match args {
        [arg] => arg.as_bool(),
        _ => None,
    }
}

fn parse_dimensions(args: &[OscArg]) -> Option<Dimensions> {
    match args {
        [OscArg::Str(raw)] => {
            let parsed: DimensionsArg = serde_json::from_str(raw).ok()?;
            Some(Dimensions {
                width: parsed.width,
                height: parsed.height,
                depth: parsed.depth,
            })
        }
        [width, height, depth] => Some(Dimensions {
            width: width.as_f32()?,
            height: height.as_f32()?,
            depth: depth.as_f32()?,
        }),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/spatial_tests.rs"]
mod tests;
