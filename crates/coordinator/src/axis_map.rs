use serde::Serialize;
use shared::domain::{Axis, EffectId, ParamTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisEvent {
    Mapped { axis: Axis, target: ParamTarget },
    /// `previous` is `None` when the axis was already unbound.
    Unmapped {
        axis: Axis,
        previous: Option<ParamTarget>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AxisMapper {
    x: Option<ParamTarget>,
    y: Option<ParamTarget>,
    z: Option<ParamTarget>,
}

impl AxisMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, axis: Axis) -> Option<&ParamTarget> {
        self.slot(axis).as_ref()
    }

    pub fn bindings(&self) -> impl Iterator<Item = (Axis, &ParamTarget)> {
        Axis::ALL
            .into_iter()
            .filter_map(move |axis| self.resolve(axis).map(|target| (axis, target)))
    }

    /// Binds `axis` to `target`, first releasing the axis's previous binding
    /// and any other axis already bound to `target`. Events are returned in the
    /// order the engine should apply them.
    pub fn map_axis(&mut self, axis: Axis, target: ParamTarget) -> Vec<AxisEvent> {
        let mut events = Vec::with_capacity(3);

        if let Some(previous) = self.slot_mut(axis).take() {
            events.push(AxisEvent::Unmapped {
                axis,
                previous: Some(previous),
            });
        }

        let conflicting = Axis::ALL
            .into_iter()
            .find(|other| *other != axis && self.resolve(*other) == Some(&target));
        if let Some(other) = conflicting {
            let previous = self.slot_mut(other).take();
            events.push(AxisEvent::Unmapped {
                axis: other,
                previous,
            });
        }

        *self.slot_mut(axis) = Some(target.clone());
        events.push(AxisEvent::Mapped { axis, target });
        events
    }

    pub fn unmap_axis(&mut self, axis: Axis) -> AxisEvent {
        AxisEvent::Unmapped {
            axis,
            previous: self.slot_mut(axis).take(),
        }
    }

    pub fn unmap_effect(&mut self, effect_id: &EffectId) -> Vec<AxisEvent> {
        let bound: Vec<Axis> = self
            .bindings()
            .filter(|(_, target)| &target.effect_id == effect_id)
            .map(|(axis, _)| axis)
            .collect();
        bound.into_iter().map(|axis| self.unmap_axis(axis)).collect()
    }

    fn slot(&self, axis: Axis) -> &Option<ParamTarget> {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    fn slot_mut(&mut self, axis: Axis) -> &mut Option<ParamTarget> {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }
}

#[cfg(test)]
#[path = "tests/axis_map_tests.rs"]
mod tests;
