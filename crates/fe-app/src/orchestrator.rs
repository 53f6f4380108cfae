//! The outer solve loop.

use crate::error::{AppError, AppResult};
use crate::license::{LicenseCredentials, LicenseValidator, check_license};
use crate::progress::{RunProgressEvent, RunStage};
use crate::stop::StopFlag;
use chrono::{DateTime, Utc};
use fe_model::Model;
use fe_physics::{PhysicsSolver, SharedData, SolverContext, build_solvers, run_lifecycle};
use fe_solver::IterationInfo;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Process parameters of one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub model_path: PathBuf,
    /// Where to save the solved model; the input file when `None`
    pub output_path: Option<PathBuf>,
    /// Matrix solver convergence log
    pub convergence_path: Option<PathBuf>,
    /// Outer-iteration monitoring log
    pub monitoring_path: Option<PathBuf>,
    pub threads: usize,
    /// Continue from the results stored in the model
    pub restart: bool,
}

impl RunOptions {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Self::default()
        }
    }

    pub fn output_path(&self) -> &Path {
        self.output_path.as_deref().unwrap_or(&self.model_path)
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            output_path: None,
            convergence_path: None,
            monitoring_path: None,
            threads: available_threads(),
            restart: false,
        }
    }
}

/// Summary of a finished (or cancelled) run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub model_name: String,
    /// Completed time steps, counting those of a restarted run
    pub time_steps: usize,
    /// Outer iterations performed by this run
    pub outer_iterations: usize,
    /// Every time step met its outer convergence criterion
    pub converged: bool,
    pub cancelled: bool,
    pub output_path: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

fn available_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Thread count limited to `[1, available hardware threads]`.
pub fn clamp_threads(requested: usize) -> usize {
    requested.clamp(1, available_threads())
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    event: RunProgressEvent,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(event);
    }
}

/// Drives one model through load, license check, outer iterations and save.
///
/// One-shot: build one per run.
pub struct SolverOrchestrator<'a> {
    options: RunOptions,
    credentials: LicenseCredentials,
    license: &'a dyn LicenseValidator,
}

impl<'a> SolverOrchestrator<'a> {
    pub fn new(
        options: RunOptions,
        credentials: LicenseCredentials,
        license: &'a dyn LicenseValidator,
    ) -> Self {
        Self {
            options,
            credentials,
            license,
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub fn run(
        &self,
        stop: &StopFlag,
        mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
    ) -> AppResult<RunReport> {
        let started = Instant::now();
        let started_at = Utc::now();
        let model_path = &self.options.model_path;

        emit_progress(
            &mut progress_cb,
            RunProgressEvent::stage(
                RunStage::LoadingModel,
                started.elapsed().as_secs_f64(),
                Some(format!("Loading {}", model_path.display())),
            ),
        );
        let mut model = fe_model::load(model_path).map_err(|e| AppError::ModelRead {
            path: model_path.clone(),
            message: e.to_string(),
        })?;
        info!(
            model = %model.name,
            nodes = model.nodes.len(),
            elements = model.elements.len(),
            problem = %model.problem_mask(),
            "Model loaded"
        );

        emit_progress(
            &mut progress_cb,
            RunProgressEvent::stage(
                RunStage::CheckingLicense,
                started.elapsed().as_secs_f64(),
                None,
            ),
        );
        let mask = model.problem_mask();
        check_license(mask, &self.credentials, self.license)?;

        for config in &mut model.matrix_solvers {
            config.output_file_name = self.options.convergence_path.clone();
        }

        emit_progress(
            &mut progress_cb,
            RunProgressEvent::stage(
                RunStage::BuildingSolvers,
                started.elapsed().as_secs_f64(),
                None,
            ),
        );
        let mut solvers = build_solvers(mask, &model.problem)?;
        let threads = clamp_threads(self.options.threads);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| AppError::InvalidInput(format!("thread pool: {}", e)))?;
        info!(
            solvers = ?solvers.iter().map(|s| s.name()).collect::<Vec<_>>(),
            threads,
            "Solvers ready"
        );

        let outcome = self.iterate(
            &model,
            &mut solvers,
            &pool,
            stop,
            started,
            &mut progress_cb,
        )?;

        let mut results = outcome.shared.to_results(outcome.time_steps, outcome.time);
        results.solved_at = Some(Utc::now().to_rfc3339());
        model.results = Some(results);

        let output_path = self.options.output_path().to_path_buf();
        emit_progress(
            &mut progress_cb,
            RunProgressEvent::stage(
                RunStage::SavingModel,
                started.elapsed().as_secs_f64(),
                Some(format!("Saving {}", output_path.display())),
            ),
        );
        fe_model::save(&output_path, &model).map_err(|e| AppError::ModelWrite {
            path: output_path.clone(),
            message: e.to_string(),
        })?;

        let report = RunReport {
            model_name: model.name.clone(),
            time_steps: outcome.time_steps,
            outer_iterations: outcome.outer_iterations,
            converged: outcome.converged,
            cancelled: outcome.cancelled,
            output_path,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            time_steps = report.time_steps,
            outer_iterations = report.outer_iterations,
            converged = report.converged,
            cancelled = report.cancelled,
            "Run finished"
        );
        emit_progress(
            &mut progress_cb,
            RunProgressEvent::stage(
                RunStage::Completed,
                started.elapsed().as_secs_f64(),
                None,
            ),
        );
        Ok(report)
    }

    /// Time steps times outer iterations, polling `stop` before each
    /// outer iteration.
    fn iterate(
        &self,
        model: &Model,
        solvers: &mut [Box<dyn PhysicsSolver>],
        pool: &rayon::ThreadPool,
        stop: &StopFlag,
        started: Instant,
        progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    ) -> AppResult<LoopOutcome> {
        let problem = &model.problem;
        let mut shared = SharedData::for_run(model, self.options.restart);

        // steady runs always solve one step; a restart only warm-starts them
        let (first_step, mut time) = match (&model.results, self.options.restart) {
            (Some(results), true) if !problem.steady => (results.time_step, results.time),
            _ => (0, 0.0),
        };
        let last_step = if problem.steady {
            1
        } else {
            problem.n_time_steps.max(first_step)
        };
        if first_step >= last_step {
            info!(time_step = first_step, "Stored results already cover every time step");
        }

        let mut outcome = LoopOutcome {
            time_steps: first_step,
            time,
            outer_iterations: 0,
            converged: true,
            cancelled: false,
            shared: SharedData::default(),
        };

        'steps: for step in first_step..last_step {
            let step_time = if problem.steady {
                time
            } else {
                time + problem.time_step_size
            };
            shared.begin_time_step();
            {
                let mut ctx = SolverContext {
                    model,
                    shared: &mut shared,
                    task_iteration: outcome.outer_iterations,
                    time_step: step,
                    time: step_time,
                };
                for solver in solvers.iter_mut() {
                    solver.begin_time_step(&mut ctx)?;
                }
            }
            if !problem.steady {
                info!(time_step = step + 1, time = step_time, "Time step");
            }

            let mut step_converged = false;
            for outer in 1..=problem.outer_iterations {
                if stop.is_stop_requested() {
                    warn!(time_step = step, outer_iteration = outer, "Stop requested");
                    outcome.cancelled = true;
                    outcome.converged = false;
                    break 'steps;
                }

                let mut ctx = SolverContext {
                    model,
                    shared: &mut shared,
                    task_iteration: outcome.outer_iterations,
                    time_step: step,
                    time: step_time,
                };
                for solver in solvers.iter_mut() {
                    pool.install(|| run_lifecycle(solver.as_mut(), &mut ctx))?;
                }
                outcome.outer_iterations += 1;

                if let Some(path) = &self.options.monitoring_path {
                    let values: Vec<_> = solvers
                        .iter()
                        .flat_map(|s| s.monitoring_values())
                        .collect();
                    IterationInfo::write_to_file(path, outcome.outer_iterations, &values)?;
                }

                step_converged = solvers.iter().all(|s| s.has_converged());
                emit_progress(
                    progress_cb,
                    RunProgressEvent {
                        stage: RunStage::Iterating,
                        elapsed_wall_s: started.elapsed().as_secs_f64(),
                        message: None,
                        time_step: Some(step),
                        outer_iteration: Some(outer),
                        converged: Some(step_converged),
                    },
                );
                if step_converged {
                    break;
                }
            }

            if !step_converged {
                warn!(
                    time_step = step,
                    outer_iterations = problem.outer_iterations,
                    "Outer iterations did not converge"
                );
                outcome.converged = false;
            }
            time = step_time;
            outcome.time_steps = step + 1;
            outcome.time = time;
        }

        outcome.shared = shared;
        Ok(outcome)
    }
}

struct LoopOutcome {
    time_steps: usize,
    time: f64,
    outer_iterations: usize,
    converged: bool,
    cancelled: bool,
    shared: SharedData,
}
