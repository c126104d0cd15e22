use shared::domain::EffectId;

use crate::chain::ChainManager;

/// Bypass and solo policy over a borrowed chain.
///
/// Solo wins over bypass: bypass edits are ignored while any instance is
/// soloing, and at most one instance solos at a time.
pub struct BypassSoloController<'a> {
    chain: &'a mut ChainManager,
}

impl<'a> BypassSoloController<'a> {
    pub fn new(chain: &'a mut ChainManager) -> Self {
        Self { chain }
    }

    pub fn is_soloing(&self) -> bool {
        self.chain.effects().iter().any(|effect| effect.is_soloing)
    }

    pub fn toggle_bypass(&mut self, id: &EffectId) -> bool {
        if self.is_soloing() {
            return false;
        }
        match self
            .chain
            .effects_mut()
            .iter_mut()
            .find(|effect| &effect.id == id)
        {
            Some(effect) => {
                effect.is_bypassed = !effect.is_bypassed;
                true
            }
            None => false,
        }
    }

    pub fn toggle_solo(&mut self, id: &EffectId) -> bool {
        let Some(currently) = self.chain.get(id).map(|effect| effect.is_soloing) else {
            return false;
        };
        for effect in self.chain.effects_mut() {
            effect.is_soloing = !currently && &effect.id == id;
        }
        true
    }
}

#[cfg(test)]
#[path = "tests/bypass_solo_tests.rs"]
mod tests;
