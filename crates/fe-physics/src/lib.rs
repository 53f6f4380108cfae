//! fe-physics: physics solvers driven through a fixed lifecycle.
//!
//! Each solver implements [`PhysicsSolver`]; the outer loop calls
//! [`run_lifecycle`] once per outer iteration. Solvers exchange fields
//! through [`SharedData`] and never talk to each other directly.

pub mod assembly;
pub mod context;
pub mod error;
pub mod fluid;
pub mod fluid_heat;
pub mod heat;
pub mod mesh;
pub mod registry;
pub mod scales;
pub mod solver;

pub use context::{SharedData, SolverContext};
pub use error::{PhysicsError, PhysicsResult};
pub use fluid::FluidSolver;
pub use fluid_heat::FluidHeatSolver;
pub use heat::HeatSolver;
pub use registry::build_solvers;
pub use scales::Scales;
pub use solver::{Phase, PhysicsSolver, run_lifecycle};
