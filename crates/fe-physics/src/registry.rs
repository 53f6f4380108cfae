//! Solver selection by problem-type mask.

use crate::error::{PhysicsError, PhysicsResult};
use crate::fluid::FluidSolver;
use crate::fluid_heat::FluidHeatSolver;
use crate::heat::HeatSolver;
use crate::solver::PhysicsSolver;
use fe_model::{PhysicsArea, ProblemSetup, ProblemTypeMask};

/// Solvers for every area in `mask`, in execution order.
pub fn build_solvers(
    mask: ProblemTypeMask,
    problem: &ProblemSetup,
) -> PhysicsResult<Vec<Box<dyn PhysicsSolver>>> {
    let unsupported: Vec<&str> = mask
        .areas()
        .into_iter()
        .filter(|area| matches!(area, PhysicsArea::Stress | PhysicsArea::Acoustics))
        .map(PhysicsArea::name)
        .collect();
    if !unsupported.is_empty() {
        return Err(PhysicsError::Unsupported {
            what: format!("no solver available for {}", unsupported.join(", ")),
        });
    }

    let fluid = mask.contains(PhysicsArea::Fluid);
    let heat = mask.contains(PhysicsArea::Heat);
    let solver: Box<dyn PhysicsSolver> = match (fluid, heat) {
        (true, true) => Box::new(FluidHeatSolver::new(problem)),
        (true, false) => Box::new(FluidSolver::new(problem)),
        (false, true) => Box::new(HeatSolver::new(problem)),
        (false, false) => {
            return Err(PhysicsError::InvalidInput {
                what: "model requests no physics".to_string(),
            });
        }
    };
    Ok(vec![solver])
}
