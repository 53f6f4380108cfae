//! Viscous pressure network solved in non-dimensional form.
//!
//! Pressure is scaled by `mu_s / t_s` and edge conductances by
//! `(mu_s / mu_e) (L_s / L)`, where `mu_e` is the temperature-corrected
//! element viscosity. Recovered edge flows are `(p_i - p_j) / (mu_e L)`.

use crate::assembly::{Assembler, edge_terms};
use crate::context::SolverContext;
use crate::error::{PhysicsError, PhysicsResult};
use crate::mesh::{ElementEdge, element_edges};
use crate::scales::Scales;
use crate::solver::PhysicsSolver;
use fe_core::numeric::{ensure_finite, norm};
use fe_model::{BoundaryDef, Model, PhysicsArea, ProblemSetup, ProblemTypeMask};
use fe_solver::{IterationInfo, IterationInfoValue, LinearSolution};
use fe_sparse::SparseMatrix;
use std::collections::BTreeMap;
use tracing::{debug, info};
use uom::si::dynamic_viscosity::pascal_second;
use uom::si::length::meter;
use uom::si::time::second;

pub struct FluidSolver {
    info: IterationInfo,
    scales: Scales,
    edges: Option<Vec<ElementEdge>>,
    /// Effective viscosity per element for the current iteration (Pa s)
    viscosity: Vec<f64>,
    system: Option<(SparseMatrix, Vec<f64>)>,
    solution: Option<LinearSolution>,
    pressure: Option<Vec<f64>>,
    flows: Option<BTreeMap<(usize, usize), f64>>,
    outer_error: f64,
}

impl FluidSolver {
    pub fn new(problem: &ProblemSetup) -> Self {
        Self {
            info: IterationInfo::new(
                problem.outer_iterations,
                problem.outer_convergence,
                problem.output_frequency,
            ),
            scales: Scales::default(),
            edges: None,
            viscosity: Vec::new(),
            system: None,
            solution: None,
            pressure: None,
            flows: None,
            outer_error: 0.0,
        }
    }

    pub fn iteration_info(&self) -> &IterationInfo {
        &self.info
    }

    pub fn scales(&self) -> &Scales {
        &self.scales
    }

    fn pressure_scale(&self) -> f64 {
        self.scales.pressure_pa()
    }

    /// Volume-flow scale `1 / (t_s L_s)` matching the pressure scale.
    fn flow_scale(&self) -> f64 {
        1.0 / (self.scales.time.get::<second>() * self.scales.length.get::<meter>())
    }
}

/// `mu exp(-beta (T_mean - T_ref))` for every element.
pub fn effective_viscosities(model: &Model, temperature: &[f64]) -> PhysicsResult<Vec<f64>> {
    let beta = model.problem.viscosity_temperature_coefficient;
    let t_ref = model.problem.reference_temperature;
    model
        .elements
        .iter()
        .enumerate()
        .map(|(e, element)| {
            let material = model
                .material_of(element)
                .ok_or_else(|| PhysicsError::InvalidInput {
                    what: format!("element {} has no material", e),
                })?;
            if material.dynamic_viscosity <= 0.0 {
                return Err(PhysicsError::InvalidInput {
                    what: format!(
                        "material '{}' needs a positive dynamic viscosity for fluid flow",
                        material.name
                    ),
                });
            }
            let t_mean = element.nodes.iter().map(|&n| temperature[n]).sum::<f64>()
                / element.nodes.len() as f64;
            Ok(material.dynamic_viscosity * (-beta * (t_mean - t_ref)).exp())
        })
        .collect()
}

impl PhysicsSolver for FluidSolver {
    fn name(&self) -> &'static str {
        "fluid"
    }

    fn areas(&self) -> ProblemTypeMask {
        ProblemTypeMask::from_areas([PhysicsArea::Fluid])
    }

    fn update_scales(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        if ctx.task_iteration == 0 {
            self.scales = Scales::from_model(ctx.model);
            debug!(scales = ?self.scales, "fluid scales");
        }
        Ok(())
    }

    fn prepare(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        let model = ctx.model;
        if !model
            .boundary_conditions
            .iter()
            .any(|bc| matches!(bc, BoundaryDef::Pressure { .. }))
        {
            return Err(PhysicsError::InvalidInput {
                what: "fluid problem needs at least one pressure boundary condition".to_string(),
            });
        }

        let mu_s = self.scales.viscosity.get::<pascal_second>();
        let l_s = self.scales.length.get::<meter>();
        let p_s = self.pressure_scale();
        let q_s = self.flow_scale();

        self.viscosity = effective_viscosities(model, &ctx.shared.temperature)?;
        let edges = self.edges.get_or_insert_with(|| element_edges(model));

        let mut asm = Assembler::new(model.nodes.len());
        for bc in &model.boundary_conditions {
            if let BoundaryDef::Pressure { node, value } = bc {
                asm.fix(*node, *value / p_s);
            }
        }

        let viscosity = &self.viscosity;
        let terms = edge_terms(edges, |edge| {
            (mu_s / viscosity[edge.element]) * (l_s / edge.length)
        });
        asm.add_conductances(&terms);

        for bc in &model.boundary_conditions {
            if let BoundaryDef::VolumeFlow { node, value } = bc {
                asm.add_load(*node, *value / q_s);
            }
        }

        let current: Vec<f64> = ctx.shared.pressure.iter().map(|p| p / p_s).collect();
        self.system = Some(asm.finish(&current));
        Ok(())
    }

    fn solve(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        let (a, b) = self.system.take().ok_or_else(|| PhysicsError::InvalidInput {
            what: "fluid system was not assembled".to_string(),
        })?;
        let p_s = self.pressure_scale();
        let x0: Vec<f64> = ctx.shared.pressure.iter().map(|p| p / p_s).collect();
        let config = ctx.model.matrix_solver_config(ctx.model.problem.fluid_solver);
        self.solution = Some(fe_solver::solve(&a, &b, &x0, &config)?);
        Ok(())
    }

    fn recover(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        let solution = self.solution.as_ref().ok_or_else(|| PhysicsError::InvalidInput {
            what: "fluid system was not solved".to_string(),
        })?;
        let p_s = self.pressure_scale();
        let pressure: Vec<f64> = solution.x.iter().map(|p| p * p_s).collect();

        let mut flows = BTreeMap::new();
        for edge in self.edges.iter().flatten() {
            let q = (pressure[edge.from] - pressure[edge.to])
                / (self.viscosity[edge.element] * edge.length);
            *flows.entry((edge.from, edge.to)).or_insert(0.0) += q;
        }

        let change: Vec<f64> = pressure
            .iter()
            .zip(&ctx.shared.pressure)
            .map(|(new, old)| new - old)
            .collect();
        let outer_error = norm(&change) / norm(&pressure).max(1.0);
        self.outer_error = ensure_finite(outer_error, "fluid outer error")?;
        self.pressure = Some(pressure);
        self.flows = Some(flows);
        Ok(())
    }

    fn process(&mut self, _ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        self.info.set_iteration(self.info.iteration() + 1);
        self.info.set_error(self.outer_error);
        Ok(())
    }

    fn store(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        if let Some(pressure) = self.pressure.take() {
            ctx.shared.pressure = pressure;
        }
        if let Some(flows) = self.flows.take() {
            ctx.shared.edge_flows = flows;
        }
        Ok(())
    }

    fn statistics(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        if let Some(solution) = &self.solution {
            debug!(
                linear_iterations = solution.iterations,
                linear_error = solution.error,
                linear_converged = solution.converged,
                flow_scale = self.flow_scale(),
                "fluid matrix solve"
            );
        }
        if self.info.output_frequency() != 0 {
            let total: f64 = ctx.shared.edge_flows.values().map(|q| q.abs()).sum();
            info!(edges = ctx.shared.edge_flows.len(), total_edge_flow = total, "fluid");
        }
        self.info.print_iteration()?;
        Ok(())
    }

    fn has_converged(&self) -> bool {
        self.info.iteration() > 0 && self.info.has_converged()
    }

    fn monitoring_values(&self) -> Vec<IterationInfoValue> {
        vec![IterationInfoValue::new("Fluid error", self.info.error())]
    }

    fn begin_time_step(&mut self, _ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        self.info.reset();
        Ok(())
    }
}
