//! Heat transport: conduction, upwind advection and lumped capacity.

use crate::assembly::{Assembler, edge_terms};
use crate::context::SolverContext;
use crate::error::{PhysicsError, PhysicsResult};
use crate::mesh::{ElementEdge, edge_material, element_edges, first_edge_materials, lumped_capacity};
use crate::scales::Scales;
use crate::solver::PhysicsSolver;
use fe_core::numeric::{ensure_finite, norm};
use fe_model::{BoundaryDef, PhysicsArea, ProblemSetup, ProblemTypeMask};
use fe_solver::{IterationInfo, IterationInfoValue, LinearSolution};
use fe_sparse::SparseMatrix;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Mesh-derived data that does not change between iterations.
struct HeatMesh {
    edges: Vec<ElementEdge>,
    capacity: Vec<f64>,
    edge_materials: BTreeMap<(usize, usize), usize>,
}

pub struct HeatSolver {
    info: IterationInfo,
    scales: Scales,
    mesh: Option<HeatMesh>,
    system: Option<(SparseMatrix, Vec<f64>)>,
    solution: Option<LinearSolution>,
    temperature: Option<Vec<f64>>,
    outer_error: f64,
}

impl HeatSolver {
    pub fn new(problem: &ProblemSetup) -> Self {
        Self {
            info: IterationInfo::new(
                problem.outer_iterations,
                problem.outer_convergence,
                problem.output_frequency,
            ),
            scales: Scales::default(),
            mesh: None,
            system: None,
            solution: None,
            temperature: None,
            outer_error: 0.0,
        }
    }

    pub fn iteration_info(&self) -> &IterationInfo {
        &self.info
    }

    pub fn scales(&self) -> &Scales {
        &self.scales
    }

    fn assemble(&self, mesh: &HeatMesh, ctx: &SolverContext<'_>) -> (SparseMatrix, Vec<f64>) {
        let model = ctx.model;
        let shared = &*ctx.shared;
        let mut asm = Assembler::new(model.nodes.len());

        for bc in &model.boundary_conditions {
            if let BoundaryDef::Temperature { node, value } = bc {
                asm.fix(*node, *value);
            }
        }

        let conduction = edge_terms(&mesh.edges, |edge| {
            edge_material(model, edge)
                .map(|material| material.thermal_conductivity / edge.length)
                .unwrap_or(0.0)
        });
        asm.add_conductances(&conduction);

        for (&(a, b), &rate) in &shared.edge_flows {
            let Some(material) = mesh
                .edge_materials
                .get(&(a, b))
                .and_then(|&m| model.materials.get(m))
            else {
                continue;
            };
            let (upstream, downstream) = if rate >= 0.0 { (a, b) } else { (b, a) };
            asm.add_upwind(
                upstream,
                downstream,
                material.density * material.specific_heat * rate.abs(),
            );
        }

        if let Some(dt) = ctx.time_step_size() {
            for (node, &capacity) in mesh.capacity.iter().enumerate() {
                let c = capacity / dt;
                asm.add(node, node, c);
                asm.add_load(node, c * shared.previous_temperature[node]);
            }
        }

        for bc in &model.boundary_conditions {
            if let BoundaryDef::HeatFlux { node, value } = bc {
                asm.add_load(*node, *value);
            }
        }

        asm.finish(&shared.temperature)
    }
}

impl PhysicsSolver for HeatSolver {
    fn name(&self) -> &'static str {
        "heat"
    }

    fn areas(&self) -> ProblemTypeMask {
        ProblemTypeMask::from_areas([PhysicsArea::Heat])
    }

    fn update_scales(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        if ctx.task_iteration == 0 {
            self.scales = Scales::from_model(ctx.model);
            debug!(scales = ?self.scales, "heat scales");
        }
        Ok(())
    }

    fn prepare(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        let model = ctx.model;
        let has_fixed_temperature = model
            .boundary_conditions
            .iter()
            .any(|bc| matches!(bc, BoundaryDef::Temperature { .. }));
        if model.problem.steady && !has_fixed_temperature {
            return Err(PhysicsError::InvalidInput {
                what: "steady heat problem needs at least one temperature boundary condition"
                    .to_string(),
            });
        }

        let mesh = self.mesh.take().unwrap_or_else(|| HeatMesh {
            edges: element_edges(model),
            capacity: lumped_capacity(model),
            edge_materials: first_edge_materials(model),
        });
        self.system = Some(self.assemble(&mesh, ctx));
        self.mesh = Some(mesh);
        Ok(())
    }

    fn solve(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        let (a, b) = self.system.take().ok_or_else(|| PhysicsError::InvalidInput {
            what: "heat system was not assembled".to_string(),
        })?;
        let config = ctx.model.matrix_solver_config(ctx.model.problem.heat_solver);
        self.solution = Some(fe_solver::solve(&a, &b, &ctx.shared.temperature, &config)?);
        Ok(())
    }

    fn recover(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        let solution = self.solution.as_ref().ok_or_else(|| PhysicsError::InvalidInput {
            what: "heat system was not solved".to_string(),
        })?;
        let change: Vec<f64> = solution
            .x
            .iter()
            .zip(&ctx.shared.temperature)
            .map(|(new, old)| new - old)
            .collect();
        let outer_error = norm(&change) / norm(&solution.x).max(1.0);
        self.outer_error = ensure_finite(outer_error, "heat outer error")?;
        self.temperature = Some(solution.x.clone());
        Ok(())
    }

    fn process(&mut self, _ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        self.info.set_iteration(self.info.iteration() + 1);
        self.info.set_error(self.outer_error);
        Ok(())
    }

    fn store(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        if let Some(temperature) = self.temperature.take() {
            ctx.shared.temperature = temperature;
        }
        Ok(())
    }

    fn statistics(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        let t = &ctx.shared.temperature;
        let min = t.iter().copied().fold(f64::INFINITY, f64::min);
        let max = t.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if let Some(solution) = &self.solution {
            debug!(
                linear_iterations = solution.iterations,
                linear_error = solution.error,
                linear_converged = solution.converged,
                "heat matrix solve"
            );
        }
        if self.info.output_frequency() != 0 {
            info!(min_temperature = min, max_temperature = max, "heat");
        }
        self.info.print_iteration()?;
        Ok(())
    }

    fn has_converged(&self) -> bool {
        self.info.iteration() > 0 && self.info.has_converged()
    }

    fn monitoring_values(&self) -> Vec<IterationInfoValue> {
        vec![IterationInfoValue::new("Heat error", self.info.error())]
    }

    fn begin_time_step(&mut self, _ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        self.info.reset();
        Ok(())
    }
}
