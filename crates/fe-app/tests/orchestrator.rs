//! End-to-end runs through `SolverOrchestrator`.

use fe_app::*;
use fe_model::*;
use fe_solver::{MatrixSolverConfig, MatrixSolverType};
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(name);
    let _ = std::fs::remove_file(&path);
    path
}

/// Three nodes on a line with pressure and temperature set at both ends.
fn channel(areas: Vec<PhysicsArea>) -> Model {
    Model {
        version: CURRENT_VERSION,
        name: "channel".to_string(),
        problem: ProblemSetup::new(areas),
        nodes: (0..3).map(|i| NodeDef::new(i as f64, 0.0, 0.0)).collect(),
        elements: (1..3)
            .map(|i| ElementDef {
                kind: ElementKind::Line,
                nodes: vec![i - 1, i],
                material: 0,
            })
            .collect(),
        materials: vec![MaterialDef {
            name: "oil".to_string(),
            density: 1.0,
            dynamic_viscosity: 1e-3,
            thermal_conductivity: 1.0,
            specific_heat: 1.0,
        }],
        boundary_conditions: vec![
            BoundaryDef::Pressure {
                node: 0,
                value: 2e-3,
            },
            BoundaryDef::Pressure { node: 2, value: 0.0 },
            BoundaryDef::Temperature {
                node: 0,
                value: 350.0,
            },
            BoundaryDef::Temperature {
                node: 2,
                value: 300.0,
            },
        ],
        initial_conditions: InitialConditionsDef::default(),
        matrix_solvers: vec![],
        results: None,
    }
}

fn write_model(name: &str, model: &Model) -> PathBuf {
    let path = temp_path(name);
    save(&path, model).unwrap();
    path
}

#[test]
fn license_missing_area_blocks_the_run() {
    let model_path = write_model("fe_app_license_gate.json", &channel(vec![
        PhysicsArea::Fluid,
        PhysicsArea::Heat,
    ]));
    let convergence = temp_path("fe_app_license_gate_convergence.dat");
    let monitoring = temp_path("fe_app_license_gate_monitoring.dat");

    let mut options = RunOptions::new(&model_path);
    options.convergence_path = Some(convergence.clone());
    options.monitoring_path = Some(monitoring.clone());
    let license = AreaLicense::new(vec![PhysicsArea::Fluid]);
    let orchestrator = SolverOrchestrator::new(options, LicenseCredentials::default(), &license);

    let mut stages = Vec::new();
    let mut record = |event: RunProgressEvent| stages.push(event.stage);
    let result = orchestrator.run(&StopFlag::new(), Some(&mut record));

    assert_eq!(exit_code(&result), 1);
    match result {
        Err(AppError::LicenseDenied { areas }) => assert_eq!(areas, "heat"),
        other => panic!("expected license denial, got {other:?}"),
    }
    assert!(!stages.contains(&RunStage::Iterating));
    assert!(!monitoring.exists());
    // model untouched
    assert!(load(&model_path).unwrap().results.is_none());
}

#[test]
fn coupled_run_solves_and_saves() {
    let mut model = channel(vec![PhysicsArea::Fluid, PhysicsArea::Heat]);
    let mut cg = MatrixSolverConfig::new(MatrixSolverType::Cg);
    cg.output_frequency = 1;
    model.matrix_solvers.push(cg);
    let model_path = write_model("fe_app_coupled.yaml", &model);
    let output = temp_path("fe_app_coupled_out.yaml");
    let convergence = temp_path("fe_app_coupled_convergence.dat");
    let monitoring = temp_path("fe_app_coupled_monitoring.dat");

    let mut options = RunOptions::new(&model_path);
    options.output_path = Some(output.clone());
    options.convergence_path = Some(convergence.clone());
    options.monitoring_path = Some(monitoring.clone());
    options.threads = 2;
    let orchestrator = SolverOrchestrator::new(options, LicenseCredentials::default(), &UnrestrictedLicense);

    let mut stages = Vec::new();
    let mut record = |event: RunProgressEvent| stages.push(event.stage);
    let result = orchestrator.run(&StopFlag::new(), Some(&mut record));
    assert_eq!(exit_code(&result), 0);
    let report = result.unwrap();

    assert!(report.converged);
    assert!(!report.cancelled);
    assert_eq!(report.time_steps, 1);
    assert!(report.outer_iterations >= 2);
    assert!(report.finished_at >= report.started_at);
    assert_eq!(stages.first(), Some(&RunStage::LoadingModel));
    assert_eq!(stages.last(), Some(&RunStage::Completed));

    let solved = load(&output).unwrap();
    let results = solved.results.unwrap();
    assert!(results.solved_at.is_some());
    assert!((results.temperature[1] - 1000.0 / 3.0).abs() < 1e-4);
    assert!((results.pressure[1] - 1e-3).abs() < 1e-9);
    assert_eq!(results.edge_flows.len(), 2);
    // input left as it was
    assert!(load(&model_path).unwrap().results.is_none());

    let monitoring = std::fs::read_to_string(&monitoring).unwrap();
    let lines: Vec<&str> = monitoring.lines().collect();
    assert_eq!(lines[0], "Iteration number|Fluid error|Heat error");
    assert_eq!(lines.len(), report.outer_iterations + 1);

    let convergence = std::fs::read_to_string(&convergence).unwrap();
    assert!(convergence.starts_with("Iteration number|Error|Trend\n"));
}

#[test]
fn transient_restart_continues_from_stored_step() {
    let mut model = channel(vec![PhysicsArea::Heat]);
    model.boundary_conditions.retain(|bc| matches!(bc, BoundaryDef::Temperature { node: 0, .. }));
    model.initial_conditions.temperature = 300.0;
    model.problem.steady = false;
    model.problem.time_step_size = 0.5;
    model.problem.n_time_steps = 2;
    let model_path = write_model("fe_app_restart.json", &model);

    let run = |restart: bool| {
        let mut options = RunOptions::new(&model_path);
        options.restart = restart;
        options.threads = 1;
        SolverOrchestrator::new(options, LicenseCredentials::default(), &UnrestrictedLicense)
            .run(&StopFlag::new(), None)
            .unwrap()
    };

    let first = run(false);
    assert_eq!(first.time_steps, 2);
    let after_first = load(&model_path).unwrap().results.unwrap();
    assert_eq!(after_first.time_step, 2);
    assert!((after_first.time - 1.0).abs() < 1e-12);

    let mut extended = load(&model_path).unwrap();
    extended.problem.n_time_steps = 5;
    save(&model_path, &extended).unwrap();

    let second = run(true);
    assert_eq!(second.time_steps, 5);
    let after_second = load(&model_path).unwrap().results.unwrap();
    assert_eq!(after_second.time_step, 5);
    assert!((after_second.time - 2.5).abs() < 1e-12);
    // heating continues toward the fixed end temperature
    assert!(after_second.temperature[2] > after_first.temperature[2]);
    assert!(after_second.temperature[2] < 350.0);
}

#[test]
fn stop_flag_cancels_before_first_iteration() {
    let model_path = write_model("fe_app_cancel.json", &channel(vec![PhysicsArea::Fluid]));
    let stop = StopFlag::new();
    stop.request_stop();

    let orchestrator = SolverOrchestrator::new(
        RunOptions::new(&model_path),
        LicenseCredentials::default(),
        &UnrestrictedLicense,
    );
    let result = orchestrator.run(&stop, None);
    assert_eq!(exit_code(&result), 0);
    let report = result.unwrap();
    assert!(report.cancelled);
    assert!(!report.converged);
    assert_eq!(report.outer_iterations, 0);
}

#[test]
fn missing_model_file_fails() {
    let path = temp_path("fe_app_missing_model.json");
    let orchestrator = SolverOrchestrator::new(
        RunOptions::new(&path),
        LicenseCredentials::default(),
        &UnrestrictedLicense,
    );
    let result = orchestrator.run(&StopFlag::new(), None);
    assert_eq!(exit_code(&result), 1);
    assert!(matches!(result, Err(AppError::ModelRead { .. })));
}

#[test]
fn unsupported_physics_fails_before_solving() {
    let model_path = write_model(
        "fe_app_stress.json",
        &channel(vec![PhysicsArea::Heat, PhysicsArea::Stress]),
    );
    let orchestrator = SolverOrchestrator::new(
        RunOptions::new(&model_path),
        LicenseCredentials::default(),
        &UnrestrictedLicense,
    );
    let result = orchestrator.run(&StopFlag::new(), None);
    match result {
        Err(AppError::Physics(message)) => assert!(message.contains("stress")),
        other => panic!("expected a physics error, got {other:?}"),
    }
}
