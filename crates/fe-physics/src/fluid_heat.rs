//! Segregated fluid-heat coupling.

use crate::context::SolverContext;
use crate::error::PhysicsResult;
use crate::fluid::FluidSolver;
use crate::heat::HeatSolver;
use crate::solver::PhysicsSolver;
use fe_model::{ProblemSetup, ProblemTypeMask};
use fe_solver::IterationInfoValue;

/// Runs every phase on the fluid part, then on the heat part.
///
/// Each part assembles from the fields the other stored in the previous
/// outer iteration: heat advects with lagged edge flows and fluid
/// viscosities use the lagged temperature.
pub struct FluidHeatSolver {
    fluid: FluidSolver,
    heat: HeatSolver,
}

impl FluidHeatSolver {
    pub fn new(problem: &ProblemSetup) -> Self {
        Self {
            fluid: FluidSolver::new(problem),
            heat: HeatSolver::new(problem),
        }
    }

    pub fn fluid(&self) -> &FluidSolver {
        &self.fluid
    }

    pub fn heat(&self) -> &HeatSolver {
        &self.heat
    }
}

impl PhysicsSolver for FluidHeatSolver {
    fn name(&self) -> &'static str {
        "fluid-heat"
    }

    fn areas(&self) -> ProblemTypeMask {
        let mut mask = self.fluid.areas();
        for area in self.heat.areas().areas() {
            mask.insert(area);
        }
        mask
    }

    fn update_scales(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        self.fluid.update_scales(ctx)?;
        self.heat.update_scales(ctx)
    }

    fn prepare(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        self.fluid.prepare(ctx)?;
        self.heat.prepare(ctx)
    }

    fn solve(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        self.fluid.solve(ctx)?;
        self.heat.solve(ctx)
    }

    fn recover(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        self.fluid.recover(ctx)?;
        self.heat.recover(ctx)
    }

    fn process(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        self.fluid.process(ctx)?;
        self.heat.process(ctx)
    }

    fn store(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        self.fluid.store(ctx)?;
        self.heat.store(ctx)
    }

    fn statistics(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        self.fluid.statistics(ctx)?;
        self.heat.statistics(ctx)
    }

    fn has_converged(&self) -> bool {
        self.fluid.has_converged() && self.heat.has_converged()
    }

    fn monitoring_values(&self) -> Vec<IterationInfoValue> {
        let mut values = self.fluid.monitoring_values();
        values.extend(self.heat.monitoring_values());
        values
    }

    fn begin_time_step(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        self.fluid.begin_time_step(ctx)?;
        self.heat.begin_time_step(ctx)
    }
}
