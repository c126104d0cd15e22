use std::collections::BTreeMap;

use serde::Serialize;
use shared::{domain::EffectId, protocol::ParameterPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSource {
    Ui,
    /// Derived from a tracking frame. Never echoed back to UI clients, since
    /// they receive the raw frame and derive the same value themselves.
    Spatial,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterUpdate {
    pub effect_id: EffectId,
    pub param_name: String,
    pub value: f32,
    pub source: UpdateSource,
}

impl ParameterUpdate {
    pub fn payload(&self) -> ParameterPayload {
        ParameterPayload {
            effect_id: self.effect_id.clone(),
            param_name: self.param_name.clone(),
            param_value: self.value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParameterStore {
    values: BTreeMap<EffectId, BTreeMap<String, f32>>,
}

impl ParameterStore {
    pub fn get(&self, effect_id: &EffectId, param_name: &str) -> Option<f32> {
        self.values.get(effect_id)?.get(param_name).copied()
    }

    pub fn effect(&self, effect_id: &EffectId) -> Option<&BTreeMap<String, f32>> {
        self.values.get(effect_id)
    }

    pub fn set(&mut self, effect_id: &EffectId, param_name: &str, value: f32) -> Option<f32> {
        let value = normalize(value)?;
        self.values
            .entry(effect_id.clone())
            .or_default()
            .insert(param_name.to_string(), value);
        Some(value)
    }

    pub fn apply(&mut self, updates: &[ParameterUpdate]) {
        for update in updates {
            self.values
                .entry(update.effect_id.clone())
                .or_default()
                .insert(update.param_name.clone(), update.value);
        }
    }

    pub fn remove_effect(&mut self, effect_id: &EffectId) -> Option<BTreeMap<String, f32>> {
        self.values.remove(effect_id)
    }
}

pub fn normalize(value: f32) -> Option<f32> {
    value.is_finite().then(|| value.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_clamps_into_unit_range() {
        let mut store = ParameterStore::default();
        let id = EffectId::from("reverb1");
        assert_eq!(store.set(&id, "decay", 1.7), Some(1.0));
        assert_eq!(store.set(&id, "mix", -0.2), Some(0.0));
        assert_eq!(store.set(&id, "size", f32::NAN), None);
        assert_eq!(store.get(&id, "decay"), Some(1.0));
        assert_eq!(store.get(&id, "size"), None);
        assert_eq!(normalize(f32::INFINITY), None);
    }

    #[test]
    fn remove_effect_drops_all_of_its_values() {
        let mut store = ParameterStore::default();
        let id = EffectId::from("delay1");
        store.set(&id, "time", 0.2);
        store.set(&EffectId::from("delay2"), "time", 0.4);
        store.remove_effect(&id);
        assert!(store.effect(&id).is_none());
        assert_eq!(store.get(&EffectId::from("delay2"), "time"), Some(0.4));
    }
}
