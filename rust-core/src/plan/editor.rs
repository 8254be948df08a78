//! Editing session over a plan line with undo/redo

use super::generator::{cross_transition, set_circular, set_straight, set_transition};
use super::history::EditHistory;
use super::refine::{
    gaussian_smooth, interpolate_control_points, remove_outliers, InterpolationMethod,
    OutlierReplacement,
};
use super::segment::{PlanLine, TransitionKind};
use crate::error::Result;
use crate::series::MeasurementPoint;
use std::mem;

/// Owns the plan being edited and its history
///
/// The history is created by the first successful edit. Failed edits
/// leave both the plan and the history untouched.
#[derive(Debug, Clone)]
pub struct PlanEditor {
    plan: PlanLine,
    history: Option<EditHistory<PlanLine>>,
}

impl PlanEditor {
    pub fn new(plan: PlanLine) -> Self {
        Self { plan, history: None }
    }

    pub fn plan(&self) -> &PlanLine {
        &self.plan
    }

    pub fn into_plan(self) -> PlanLine {
        self.plan
    }

    fn apply(&mut self, edit: impl FnOnce(&PlanLine) -> Result<PlanLine>) -> Result<()> {
        let next = edit(&self.plan)?;
        let before = mem::replace(&mut self.plan, next);
        self.history.get_or_insert_with(EditHistory::default).record(before);
        Ok(())
    }

    pub fn set_straight(
        &mut self,
        start: f64,
        end: f64,
        start_value: f64,
        end_value: f64,
    ) -> Result<()> {
        self.apply(|plan| set_straight(plan, start, end, start_value, end_value))
    }

    pub fn set_circular(&mut self, start: f64, end: f64, radius: f64, sign: f64) -> Result<()> {
        self.apply(|plan| set_circular(plan, start, end, radius, sign))
    }

    pub fn set_transition(&mut self, start: f64, end: f64, kind: TransitionKind) -> Result<()> {
        self.apply(|plan| set_transition(plan, start, end, kind))
    }

    pub fn cross_transition(
        &mut self,
        boundary: f64,
        length: f64,
        kind: TransitionKind,
    ) -> Result<()> {
        self.apply(|plan| cross_transition(plan, boundary, length, kind))
    }

    pub fn interpolate_control_points(
        &mut self,
        points: &[MeasurementPoint],
        method: InterpolationMethod,
    ) -> Result<()> {
        self.apply(|plan| interpolate_control_points(plan, points, method))
    }

    pub fn gaussian_smooth(&mut self, sigma_samples: f64, range: Option<(f64, f64)>) -> Result<()> {
        self.apply(|plan| gaussian_smooth(plan, sigma_samples, range))
    }

    pub fn remove_outliers(
        &mut self,
        window: usize,
        k: f64,
        replacement: OutlierReplacement,
    ) -> Result<()> {
        self.apply(|plan| remove_outliers(plan, window, k, replacement))
    }

    /// Swap in a whole new plan (e.g. regenerated with another window) as one edit
    pub fn replace(&mut self, plan: PlanLine) {
        let before = mem::replace(&mut self.plan, plan);
        self.history.get_or_insert_with(EditHistory::default).record(before);
    }

    /// Restore the state before the last edit; false if there is nothing to undo
    pub fn undo(&mut self) -> bool {
        self.step(|history, current| history.undo(current))
    }

    /// Re-apply the last undone edit; false if there is nothing to redo
    pub fn redo(&mut self) -> bool {
        self.step(|history, current| history.redo(current))
    }

    fn step(
        &mut self,
        op: impl FnOnce(
            &mut EditHistory<PlanLine>,
            PlanLine,
        ) -> std::result::Result<PlanLine, PlanLine>,
    ) -> bool {
        let Some(history) = self.history.as_mut() else {
            return false;
        };
        let current = self.plan.clone();
        match op(history, current) {
            Ok(restored) => {
                self.plan = restored;
                true
            }
            Err(_) => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.as_ref().is_some_and(EditHistory::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.history.as_ref().is_some_and(EditHistory::can_redo)
    }

    /// Number of undo entries
    pub fn history_len(&self) -> usize {
        self.history.as_ref().map_or(0, EditHistory::len)
    }
}
