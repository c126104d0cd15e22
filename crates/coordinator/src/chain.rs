use shared::{
    domain::{Direction, EffectId, EffectInstance, EffectType, Route},
    error::ChainError,
};

use crate::{bypass_solo::BypassSoloController, catalog::EffectCatalog};

/// Routing graph for a chain.
///
/// A soloing instance short-circuits everything else; otherwise every
/// non-bypassed instance is linked in chain order. Always yields at least
/// `input -> output`.
pub fn compute_route(effects: &[EffectInstance]) -> Route {
    if let Some(solo) = effects.iter().find(|effect| effect.is_soloing) {
        return Route::through([solo.id.clone()]);
    }
    Route::through(
        effects
            .iter()
            .filter(|effect| !effect.is_bypassed)
            .map(|effect| effect.id.clone()),
    )
}

#[derive(Debug, Clone, Default)]
pub struct ChainManager {
    catalog: EffectCatalog,
    effects: Vec<EffectInstance>,
}

impl ChainManager {
    pub fn new(catalog: EffectCatalog) -> Self {
        Self {
            catalog,
            effects: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &EffectCatalog {
        &self.catalog
    }

    pub fn effects(&self) -> &[EffectInstance] {
        &self.effects
    }

    pub fn get(&self, id: &EffectId) -> Option<&EffectInstance> {
        self.effects.iter().find(|effect| &effect.id == id)
    }

    pub fn contains(&self, id: &EffectId) -> bool {
        self.get(id).is_some()
    }

    pub fn route(&self) -> Route {
        compute_route(&self.effects)
    }

    pub fn bypass_solo(&mut self) -> BypassSoloController<'_> {
        BypassSoloController::new(self)
    }

    pub fn add_effect(&mut self, effect_type: &EffectType) -> Result<EffectId, ChainError> {
        let spec = self
            .catalog
            .get(effect_type)
            .ok_or_else(|| ChainError::UnknownEffectType(effect_type.clone()))?;
        let id = spec
            .id_pool()
            .find(|candidate| !self.effects.iter().any(|effect| &effect.id == candidate))
            .ok_or_else(|| ChainError::CapacityExceeded {
                effect_type: effect_type.clone(),
            })?;

        self.effects
            .push(EffectInstance::new(id.clone(), effect_type.clone()));
        Ok(id)
    }

    pub fn remove_effect(&mut self, id: &EffectId) -> Option<EffectInstance> {
        let index = self.position(id)?;
        Some(self.effects.remove(index))
    }

    /// Swaps the instance with its neighbour toward the head or tail. Returns
    /// whether anything moved.
    pub fn reorder_effect(&mut self, id: &EffectId, direction: Direction) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let neighbour = match direction {
            Direction::Left => index.checked_sub(1),
            Direction::Right => Some(index + 1).filter(|next| *next < self.effects.len()),
        };
        match neighbour {
            Some(neighbour) => {
                self.effects.swap(index, neighbour);
                true
            }
            None => false,
        }
    }

    fn position(&self, id: &EffectId) -> Option<usize> {
        self.effects.iter().position(|effect| &effect.id == id)
    }

    pub(crate) fn effects_mut(&mut self) -> &mut [EffectInstance] {
        &mut self.effects
    }
}

#[cfg(test)]
#[path = "tests/chain_tests.rs"]
mod tests;
