//! The physics solver capability and its lifecycle runner.

use crate::context::SolverContext;
use crate::error::{PhysicsError, PhysicsResult};
use fe_model::ProblemTypeMask;
use fe_solver::IterationInfoValue;
use std::fmt;
use tracing::debug;

/// One lifecycle phase of an outer iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    UpdateScales,
    Prepare,
    Solve,
    Recover,
    Process,
    Store,
    Statistics,
}

impl Phase {
    /// Execution order within one outer iteration.
    pub const ORDER: [Phase; 7] = [
        Phase::UpdateScales,
        Phase::Prepare,
        Phase::Solve,
        Phase::Recover,
        Phase::Process,
        Phase::Store,
        Phase::Statistics,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Phase::UpdateScales => "update_scales",
            Phase::Prepare => "prepare",
            Phase::Solve => "solve",
            Phase::Recover => "recover",
            Phase::Process => "process",
            Phase::Store => "store",
            Phase::Statistics => "statistics",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A physics variant solved inside the outer iteration loop.
///
/// Phases are called by [`run_lifecycle`] in [`Phase::ORDER`], every outer
/// iteration, with none skipped:
/// - `update_scales`: reference scales; only recomputed when
///   `task_iteration == 0`
/// - `prepare`: assemble the linear system
/// - `solve`: run the matrix solver
/// - `recover`: derived quantities and the outer error
/// - `process`: update the outer convergence state
/// - `store`: publish fields into [`SharedData`](crate::SharedData)
/// - `statistics`: report
pub trait PhysicsSolver: Send {
    fn name(&self) -> &'static str;

    /// Physics areas this solver covers.
    fn areas(&self) -> ProblemTypeMask;

    fn update_scales(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()>;
    fn prepare(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()>;
    fn solve(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()>;
    fn recover(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()>;
    fn process(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()>;
    fn store(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()>;
    fn statistics(&mut self, ctx: &mut SolverContext<'_>) -> PhysicsResult<()>;

    /// Outer-iteration convergence of this solver.
    fn has_converged(&self) -> bool;

    /// Values written to the monitoring file after each outer iteration.
    fn monitoring_values(&self) -> Vec<IterationInfoValue>;

    /// Called once before the first outer iteration of every time step.
    fn begin_time_step(&mut self, _ctx: &mut SolverContext<'_>) -> PhysicsResult<()> {
        Ok(())
    }
}

/// Run one outer iteration of `solver`.
///
/// Stops at the first failing phase and reports it as
/// [`PhysicsError::Phase`].
pub fn run_lifecycle(
    solver: &mut dyn PhysicsSolver,
    ctx: &mut SolverContext<'_>,
) -> PhysicsResult<()> {
    for phase in Phase::ORDER {
        debug!(
            solver = solver.name(),
            phase = phase.name(),
            iteration = ctx.task_iteration,
            "lifecycle phase"
        );
        let result = match phase {
            Phase::UpdateScales => solver.update_scales(ctx),
            Phase::Prepare => solver.prepare(ctx),
            Phase::Solve => solver.solve(ctx),
            Phase::Recover => solver.recover(ctx),
            Phase::Process => solver.process(ctx),
            Phase::Store => solver.store(ctx),
            Phase::Statistics => solver.statistics(ctx),
        };
        result.map_err(|e| match e {
            PhysicsError::Phase { .. } => e,
            other => PhysicsError::Phase {
                solver: solver.name().to_string(),
                phase: phase.name(),
                message: other.to_string(),
            },
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SharedData;
    use fe_model::{InitialConditionsDef, Model, PhysicsArea, ProblemSetup};

    /// Records every phase call; optionally fails in one phase.
    struct Recorder {
        calls: Vec<Phase>,
        fail_in: Option<Phase>,
    }

    impl Recorder {
        fn hit(&mut self, phase: Phase) -> PhysicsResult<()> {
            self.calls.push(phase);
            if self.fail_in == Some(phase) {
                return Err(PhysicsError::InvalidInput {
                    what: "boom".to_string(),
                });
            }
            Ok(())
        }
    }

    impl PhysicsSolver for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }
        fn areas(&self) -> ProblemTypeMask {
            ProblemTypeMask::from_areas([PhysicsArea::Heat])
        }
        fn update_scales(&mut self, _: &mut SolverContext<'_>) -> PhysicsResult<()> {
            self.hit(Phase::UpdateScales)
        }
        fn prepare(&mut self, _: &mut SolverContext<'_>) -> PhysicsResult<()> {
            self.hit(Phase::Prepare)
        }
        fn solve(&mut self, _: &mut SolverContext<'_>) -> PhysicsResult<()> {
            self.hit(Phase::Solve)
        }
        fn recover(&mut self, _: &mut SolverContext<'_>) -> PhysicsResult<()> {
            self.hit(Phase::Recover)
        }
        fn process(&mut self, _: &mut SolverContext<'_>) -> PhysicsResult<()> {
            self.hit(Phase::Process)
        }
        fn store(&mut self, _: &mut SolverContext<'_>) -> PhysicsResult<()> {
            self.hit(Phase::Store)
        }
        fn statistics(&mut self, _: &mut SolverContext<'_>) -> PhysicsResult<()> {
            self.hit(Phase::Statistics)
        }
        fn has_converged(&self) -> bool {
            true
        }
        fn monitoring_values(&self) -> Vec<IterationInfoValue> {
            Vec::new()
        }
    }

    fn empty_model() -> Model {
        Model {
            version: 1,
            name: "empty".to_string(),
            problem: ProblemSetup::new(vec![PhysicsArea::Heat]),
            nodes: vec![],
            elements: vec![],
            materials: vec![],
            boundary_conditions: vec![],
            initial_conditions: InitialConditionsDef::default(),
            matrix_solvers: vec![],
            results: None,
        }
    }

    #[test]
    fn phases_run_in_order() {
        let model = empty_model();
        let mut shared = SharedData::default();
        let mut ctx = SolverContext {
            model: &model,
            shared: &mut shared,
            task_iteration: 0,
            time_step: 0,
            time: 0.0,
        };
        let mut solver = Recorder {
            calls: vec![],
            fail_in: None,
        };

        run_lifecycle(&mut solver, &mut ctx).unwrap();
        run_lifecycle(&mut solver, &mut ctx).unwrap();

        let mut expected = Phase::ORDER.to_vec();
        expected.extend(Phase::ORDER);
        assert_eq!(solver.calls, expected);
    }

    #[test]
    fn failure_names_solver_and_phase() {
        let model = empty_model();
        let mut shared = SharedData::default();
        let mut ctx = SolverContext {
            model: &model,
            shared: &mut shared,
            task_iteration: 0,
            time_step: 0,
            time: 0.0,
        };
        let mut solver = Recorder {
            calls: vec![],
            fail_in: Some(Phase::Solve),
        };

        let err = run_lifecycle(&mut solver, &mut ctx).unwrap_err();
        match err {
            PhysicsError::Phase {
                solver: name,
                phase,
                message,
            } => {
                assert_eq!(name, "recorder");
                assert_eq!(phase, "solve");
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // nothing after the failing phase
        assert_eq!(
            solver.calls,
            vec![Phase::UpdateScales, Phase::Prepare, Phase::Solve]
        );
    }
}
