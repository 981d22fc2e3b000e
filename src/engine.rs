//! Filter-projection engine: binds control values to display slots.
//!
//! Each binding pairs one control with one slot. When the control changes,
//! the binding's projection runs against its result set and the render
//! function turns the output into the slot's new figure. Bindings never see
//! each other's selections.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analyzer::{FilterValue, Mean, Selection};
use crate::chart::{render, ChartStyle, Figure};
use crate::dataset::{Dataset, ResultSet};
use crate::error::AppError;

/// Output of a projection, as far as the engine cares: does it hold
/// anything worth drawing?
pub trait Projected {
    fn has_data(&self) -> bool;
}

impl<T> Projected for Vec<T> {
    fn has_data(&self) -> bool {
        !self.is_empty()
    }
}

impl Projected for Mean {
    fn has_data(&self) -> bool {
        matches!(self, Mean::Value(_))
    }
}

type RunFn = Box<dyn Fn(&ResultSet, &FilterValue) -> Result<Figure, AppError>>;

struct Binding {
    control_id: String,
    slot_id: String,
    source: String,
    run: RunFn,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotUpdate {
    pub slot: String,
    pub figure: Figure,
}

pub struct Engine {
    dataset: Dataset,
    selection: Selection,
    bindings: Vec<Binding>,
    slots: BTreeMap<String, Figure>,
}

impl Engine {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            selection: Selection::default(),
            bindings: Vec::new(),
            slots: BTreeMap::new(),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn figure(&self, slot_id: &str) -> Option<&Figure> {
        self.slots.get(slot_id)
    }

    pub fn slots(&self) -> impl Iterator<Item = (&str, &Figure)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn declare_control(&mut self, control_id: &str, initial: FilterValue) -> Result<(), AppError> {
        if self.selection.contains(control_id) {
            return Err(AppError::DuplicateControl(control_id.to_string()));
        }
        self.selection.set(control_id, initial);
        Ok(())
    }

    /// Registers `projection` then `render_fn` for `slot_id`, fed by `source`
    /// whenever `control_id` changes. Empty projections publish the
    /// placeholder of `style` instead of calling `render_fn`.
    pub fn bind<T, P, R>(
        &mut self,
        control_id: &str,
        slot_id: &str,
        source: &str,
        style: ChartStyle,
        projection: P,
        render_fn: R,
    ) -> Result<(), AppError>
    where
        T: Projected,
        P: Fn(&ResultSet, &FilterValue) -> Result<T, AppError> + 'static,
        R: Fn(&T, &ChartStyle) -> Figure + 'static,
    {
        if !self.selection.contains(control_id) {
            return Err(AppError::UnknownControl(control_id.to_string()));
        }
        if !self.dataset.contains(source) {
            return Err(AppError::UnknownSource(source.to_string()));
        }
        if self.bindings.iter().any(|b| b.slot_id == slot_id) {
            return Err(AppError::DuplicateSlot(slot_id.to_string()));
        }

        let run: RunFn = Box::new(move |result_set: &ResultSet, value: &FilterValue| {
            let projected = projection(result_set, value)?;
            if projected.has_data() {
                Ok(render_fn(&projected, &style))
            } else {
                Ok(render::placeholder(&style))
            }
        });

        self.bindings.push(Binding {
            control_id: control_id.to_string(),
            slot_id: slot_id.to_string(),
            source: source.to_string(),
            run,
        });
        Ok(())
    }

    /// Runs every binding against the current selection and publishes all
    /// slots.
    pub fn render_all(&mut self) -> Result<Vec<SlotUpdate>, AppError> {
        let mut updates = Vec::with_capacity(self.bindings.len());
        for binding in &self.bindings {
            let value = self
                .selection
                .get(&binding.control_id)
                .ok_or_else(|| AppError::UnknownControl(binding.control_id.clone()))?;
            updates.push(SlotUpdate {
                slot: binding.slot_id.clone(),
                figure: self.run_binding(binding, value)?,
            });
        }
        self.publish(&updates);
        Ok(updates)
    }

    /// Handles one "value changed" event. The new selection and figures are
    /// committed only if every binding of the control succeeds.
    pub fn on_change(&mut self, control_id: &str, value: FilterValue) -> Result<Vec<SlotUpdate>, AppError> {
        if !self.selection.contains(control_id) {
            return Err(AppError::UnknownControl(control_id.to_string()));
        }

        let mut updates = Vec::new();
        for binding in self.bindings.iter().filter(|b| b.control_id == control_id) {
            updates.push(SlotUpdate {
                slot: binding.slot_id.clone(),
                figure: self.run_binding(binding, &value)?,
            });
        }

        log::debug!("{} changed, {} slot(s) re-rendered", control_id, updates.len());
        self.selection.set(control_id, value);
        self.publish(&updates);
        Ok(updates)
    }

    fn run_binding(&self, binding: &Binding, value: &FilterValue) -> Result<Figure, AppError> {
        let result_set = self.dataset.get(&binding.source)?;
        (binding.run)(result_set, value)
    }

    fn publish(&mut self, updates: &[SlotUpdate]) {
        for update in updates {
            self.slots.insert(update.slot.clone(), update.figure.clone());
        }
    }
}
