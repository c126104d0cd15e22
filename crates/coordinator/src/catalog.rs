use shared::domain::{EffectId, EffectType};

pub const ID_POOL_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct EffectSpec {
    pub effect_type: EffectType,
    pub defaults: Vec<(String, f32)>,
}

impl EffectSpec {
    pub fn new(effect_type: &str, defaults: &[(&str, f32)]) -> Self {
        Self {
            effect_type: EffectType::from(effect_type),
            defaults: defaults
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
        }
    }

    /// Fixed ID pool, in allocation order: `reverb1`, `reverb2`, `reverb3`.
    pub fn id_pool(&self) -> impl Iterator<Item = EffectId> + '_ {
        (1..=ID_POOL_SIZE).map(move |n| EffectId::new(format!("{}{n}", self.effect_type)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectCatalog {
    specs: Vec<EffectSpec>,
}

impl EffectCatalog {
    pub fn new(specs: Vec<EffectSpec>) -> Self {
        Self { specs }
    }

    pub fn get(&self, effect_type: &EffectType) -> Option<&EffectSpec> {
        self.specs
            .iter()
            .find(|spec| &spec.effect_type == effect_type)
    }

    pub fn specs(&self) -> &[EffectSpec] {
        &self.specs
    }
}

impl Default for EffectCatalog {
    fn default() -> Self {
        Self::new(vec![
            EffectSpec::new("reverb", &[("decay", 0.5), ("size", 0.5), ("mix", 0.3)]),
            EffectSpec::new("delay", &[("time", 0.25), ("feedback", 0.4), ("mix", 0.3)]),
            EffectSpec::new("chorus", &[("rate", 0.3), ("depth", 0.5), ("mix", 0.5)]),
            EffectSpec::new("distortion", &[("drive", 0.5), ("tone", 0.5), ("mix", 1.0)]),
            EffectSpec::new("filter", &[("cutoff", 0.7), ("resonance", 0.2)]),
        ])
    }
}
