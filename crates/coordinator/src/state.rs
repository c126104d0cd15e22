use serde::Serialize;
use shared::{
    domain::{EffectId, EffectInstance, EffectType, Route, TrackingStatus},
    error::ChainError,
    protocol::ParameterPayload,
};

use crate::{
    axis_map::{AxisEvent, AxisMapper},
    catalog::EffectCatalog,
    chain::ChainManager,
    params::{self, ParameterStore, ParameterUpdate, UpdateSource},
    spatial::SpatialInputRelay,
};

#[derive(Debug, Clone, Default)]
pub struct CoordinatorState {
    pub chain: ChainManager,
    pub axes: AxisMapper,
    pub params: ParameterStore,
    pub relay: SpatialInputRelay,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectRemoval {
    pub instance: EffectInstance,
    pub unmapped: Vec<AxisEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub effects: Vec<EffectInstance>,
    pub route: Route,
    #[serde(rename = "xyzMap")]
    pub axes: AxisMapper,
    #[serde(rename = "parameterValues")]
    pub params: ParameterStore,
    #[serde(rename = "interactionBox")]
    pub tracking: TrackingStatus,
}

impl CoordinatorState {
    pub fn new(catalog: EffectCatalog) -> Self {
        Self {
            chain: ChainManager::new(catalog),
            ..Self::default()
        }
    }

    pub fn add_effect(
        &mut self,
        effect_type: &EffectType,
    ) -> Result<(EffectId, Vec<ParameterUpdate>), ChainError> {
        let id = self.chain.add_effect(effect_type)?;
        let defaults: Vec<ParameterUpdate> = self
            .chain
            .catalog()
            .get(effect_type)
            .map(|spec| spec.defaults.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|(name, value)| ParameterUpdate {
                effect_id: id.clone(),
                param_name: name.clone(),
                value: *value,
                source: UpdateSource::Ui,
            })
            .collect();
        self.params.apply(&defaults);
        Ok((id, defaults))
    }

    pub fn remove_effect(&mut self, id: &EffectId, unmap_bindings: bool) -> Option<EffectRemoval> {
        let instance = self.chain.remove_effect(id)?;
        self.params.remove_effect(id);
        let unmapped = if unmap_bindings {
            self.axes.unmap_effect(id)
        } else {
            Vec::new()
        };
        Some(EffectRemoval { instance, unmapped })
    }

    /// Validates a UI parameter edit. Values for effects outside the chain are
    /// returned for the engine but never stored.
    pub fn set_parameter(&mut self, payload: &ParameterPayload) -> Option<ParameterUpdate> {
        let value = if self.chain.contains(&payload.effect_id) {
            self.params
                .set(&payload.effect_id, &payload.param_name, payload.param_value)?
        } else {
            params::normalize(payload.param_value)?
        };
        Some(ParameterUpdate {
            effect_id: payload.effect_id.clone(),
            param_name: payload.param_name.clone(),
            value,
            source: UpdateSource::Ui,
        })
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            effects: self.chain.effects().to_vec(),
            route: self.chain.route(),
            axes: self.axes.clone(),
            params: self.params.clone(),
            tracking: *self.relay.status(),
        }
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
