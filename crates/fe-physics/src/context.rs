//! Cross-physics state and the per-iteration solver context.

use fe_model::{EdgeFlowDef, Model, ResultsDef};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Fields shared between physics solvers.
///
/// Edge flows are keyed by `(low, high)` node pair; a positive rate flows
/// from `low` to `high`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SharedData {
    pub temperature: Vec<f64>,
    /// Temperature at the start of the current time step
    pub previous_temperature: Vec<f64>,
    pub pressure: Vec<f64>,
    pub edge_flows: BTreeMap<(usize, usize), f64>,
}

impl SharedData {
    /// Fields from the model's initial conditions.
    pub fn from_initial_conditions(model: &Model) -> Self {
        let n = model.nodes.len();
        let temperature = vec![model.initial_conditions.temperature; n];
        Self {
            previous_temperature: temperature.clone(),
            temperature,
            pressure: vec![model.initial_conditions.pressure; n],
            edge_flows: BTreeMap::new(),
        }
    }

    /// Fields for a run; with `restart` they come from stored results
    /// where those are complete.
    pub fn for_run(model: &Model, restart: bool) -> Self {
        let mut shared = Self::from_initial_conditions(model);
        if !restart {
            return shared;
        }
        let Some(results) = &model.results else {
            warn!("Restart requested but the model has no stored results");
            return shared;
        };

        let n = model.nodes.len();
        if results.temperature.len() == n {
            shared.temperature = results.temperature.clone();
            shared.previous_temperature = results.temperature.clone();
        }
        if results.pressure.len() == n {
            shared.pressure = results.pressure.clone();
        }
        shared.edge_flows = results
            .edge_flows
            .iter()
            .map(|flow| (edge_key(flow.from, flow.to), oriented(flow)))
            .collect();
        info!(
            time_step = results.time_step,
            time = results.time,
            "Restarting from stored results"
        );
        shared
    }

    pub fn begin_time_step(&mut self) {
        self.previous_temperature.clone_from(&self.temperature);
    }

    /// Snapshot for persisting into the model.
    pub fn to_results(&self, time_step: usize, time: f64) -> ResultsDef {
        ResultsDef {
            time_step,
            time,
            temperature: self.temperature.clone(),
            pressure: self.pressure.clone(),
            edge_flows: self
                .edge_flows
                .iter()
                .map(|(&(from, to), &rate)| EdgeFlowDef { from, to, rate })
                .collect(),
            solved_at: None,
        }
    }
}

pub fn edge_key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

fn oriented(flow: &EdgeFlowDef) -> f64 {
    if flow.from <= flow.to {
        flow.rate
    } else {
        -flow.rate
    }
}

/// What a solver sees during one lifecycle pass.
pub struct SolverContext<'a> {
    pub model: &'a Model,
    pub shared: &'a mut SharedData,
    /// Outer iterations completed in this run, over all time steps
    pub task_iteration: usize,
    /// Zero-based time step index
    pub time_step: usize,
    /// Simulated time at the end of the current step (s)
    pub time: f64,
}

impl SolverContext<'_> {
    /// Time step size, or `None` for steady problems.
    pub fn time_step_size(&self) -> Option<f64> {
        let problem = &self.model.problem;
        (!problem.steady).then_some(problem.time_step_size)
    }
}
