use clap::{Parser, Subcommand};
use fe_app::{
    AppError, AppResult, AreaLicense, LicenseCredentials, LicenseValidator, RunOptions,
    RunProgressEvent, RunReport, RunStage, SolverOrchestrator, StopFlag, UnrestrictedLicense,
    exit_code,
};
use fe_solver::{MatrixSolverConfig, MatrixSolverType};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fe-cli")]
#[command(about = "FE Suite CLI - coupled fluid and heat finite element solver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a model and store the results in it
    Run {
        /// Path to the model file (.json, .yaml or .yml)
        model_path: PathBuf,
        /// Save the solved model here instead of overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Matrix solver convergence log
        #[arg(long)]
        convergence: Option<PathBuf>,
        /// Outer iteration monitoring log
        #[arg(long)]
        monitoring: Option<PathBuf>,
        /// Worker threads (clamped to the available hardware threads)
        #[arg(short = 'j', long)]
        threads: Option<usize>,
        /// Continue from the results stored in the model
        #[arg(long)]
        restart: bool,
        /// JSON license file; without one every physics area is allowed
        #[arg(long)]
        license: Option<PathBuf>,
        #[arg(long, default_value = "")]
        account: String,
        #[arg(long, default_value = "")]
        password: String,
        /// Stop after the current outer iteration once this file exists
        #[arg(long)]
        stop_file: Option<PathBuf>,
    },
    /// Validate model file syntax and structure
    Validate {
        /// Path to the model file
        model_path: PathBuf,
    },
    /// List the available matrix solvers and their defaults
    Solvers,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            model_path,
            output,
            convergence,
            monitoring,
            threads,
            restart,
            license,
            account,
            password,
            stop_file,
        } => {
            let mut options = RunOptions::new(model_path);
            options.output_path = output;
            options.convergence_path = convergence;
            options.monitoring_path = monitoring;
            options.restart = restart;
            if let Some(threads) = threads {
                options.threads = threads;
            }
            cmd_run(
                options,
                license.as_deref(),
                LicenseCredentials::new(account, password),
                stop_file,
            )
        }
        Commands::Validate { model_path } => cmd_validate(&model_path),
        Commands::Solvers => {
            cmd_solvers();
            Ok(())
        }
    };

    if let Err(err) = &result {
        error!("{}", err);
    }
    ExitCode::from(exit_code(&result))
}

fn cmd_run(
    options: RunOptions,
    license_path: Option<&Path>,
    credentials: LicenseCredentials,
    stop_file: Option<PathBuf>,
) -> AppResult<()> {
    println!("Solving model: {}", options.model_path.display());

    let area_license;
    let license: &dyn LicenseValidator = match license_path {
        Some(path) => {
            area_license = AreaLicense::load(path)?;
            &area_license
        }
        None => &UnrestrictedLicense,
    };

    let stop = StopFlag::new();
    let finished = StopFlag::new();
    let watcher = stop_file.map(|path| watch_stop_file(path, stop.clone(), finished.clone()));

    let orchestrator = SolverOrchestrator::new(options, credentials, license);
    let mut last_emit = Instant::now();
    let mut last_stage = None;
    let result = orchestrator.run(
        &stop,
        Some(&mut |event: RunProgressEvent| {
            let emit_now =
                last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    );
    clear_progress_line();

    finished.request_stop();
    if let Some(handle) = watcher {
        let _ = handle.join();
    }

    print_report(&result?);
    Ok(())
}

/// Poll for `path` until it appears or the run finishes.
fn watch_stop_file(path: PathBuf, stop: StopFlag, finished: StopFlag) -> JoinHandle<()> {
    std::thread::spawn(move || {
        while !finished.is_stop_requested() {
            if path.exists() {
                tracing::warn!(path = %path.display(), "Stop file found");
                stop.request_stop();
                return;
            }
            std::thread::sleep(Duration::from_millis(200));
        }
    })
}

fn print_report(report: &RunReport) {
    if report.cancelled {
        println!("✓ Run stopped on request: {}", report.model_name);
    } else if report.converged {
        println!("✓ Solution converged: {}", report.model_name);
    } else {
        println!("✓ Run finished without convergence: {}", report.model_name);
    }
    println!("  Time steps:       {}", report.time_steps);
    println!("  Outer iterations: {}", report.outer_iterations);
    println!(
        "  Wall time:        {:.3}s",
        (report.finished_at - report.started_at).num_milliseconds() as f64 / 1000.0
    );
    println!("  Saved to:         {}", report.output_path.display());
}

fn cmd_validate(model_path: &Path) -> AppResult<()> {
    println!("Validating model: {}", model_path.display());
    let model = fe_model::load(model_path).map_err(|e| AppError::ModelRead {
        path: model_path.to_path_buf(),
        message: e.to_string(),
    })?;
    println!("✓ Model is valid");
    println!(
        "  {}: {} nodes, {} elements, {} materials, problem {}",
        model.name,
        model.nodes.len(),
        model.elements.len(),
        model.materials.len(),
        model.problem_mask()
    );
    Ok(())
}

fn cmd_solvers() {
    println!("Matrix solvers:");
    for solver_type in MatrixSolverType::ALL {
        let config = MatrixSolverConfig::new(solver_type);
        let note = if solver_type.requires_symmetric() {
            "  (symmetric matrices)"
        } else {
            ""
        };
        println!(
            "  {:<13} {:>5} x {:<4} threshold={:.0e}{}",
            solver_type.name(),
            config.inner_iterations,
            config.outer_iterations,
            config.convergence_threshold,
            note
        );
    }
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    let spinner = ['|', '/', '-', '\\'];
    let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
    let mut line = format!(
        "\r{} {}  elapsed={:.2}s",
        spinner[spin_idx],
        event.stage.label(),
        event.elapsed_wall_s
    );
    if event.stage == RunStage::Iterating {
        if let Some(step) = event.time_step {
            line.push_str(&format!("  step={}", step + 1));
        }
        if let Some(iter) = event.outer_iteration {
            line.push_str(&format!("  iter={}", iter));
        }
    }
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {}", msg));
    }
    print!("{}", line);
    let _ = io::stdout().flush();
}
