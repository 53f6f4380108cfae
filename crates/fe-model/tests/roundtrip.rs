use fe_model::*;
use fe_solver::{MatrixSolverConfig, MatrixSolverType};

fn channel_model() -> Model {
    let mut problem = ProblemSetup::new(vec![PhysicsArea::Fluid, PhysicsArea::Heat]);
    problem.steady = false;
    problem.time_step_size = 0.5;
    problem.n_time_steps = 4;
    problem.viscosity_temperature_coefficient = 0.02;

    let mut gmres = MatrixSolverConfig::new(MatrixSolverType::Gmres);
    gmres.inner_iterations = 10;
    gmres.output_frequency = 5;

    Model {
        version: CURRENT_VERSION,
        name: "Heated channel".to_string(),
        problem,
        nodes: vec![
            NodeDef::new(0.0, 0.0, 0.0),
            NodeDef::new(0.5, 0.0, 0.0),
            NodeDef::new(1.0, 0.0, 0.0),
        ],
        elements: vec![
            ElementDef {
                kind: ElementKind::Line,
                nodes: vec![0, 1],
                material: 0,
            },
            ElementDef {
                kind: ElementKind::Line,
                nodes: vec![1, 2],
                material: 0,
            },
        ],
        materials: vec![MaterialDef {
            name: "water".to_string(),
            density: 998.0,
            dynamic_viscosity: 1.0e-3,
            thermal_conductivity: 0.6,
            specific_heat: 4182.0,
        }],
        boundary_conditions: vec![
            BoundaryDef::Pressure {
                node: 0,
                value: 2000.0,
            },
            BoundaryDef::Pressure { node: 2, value: 0.0 },
            BoundaryDef::Temperature {
                node: 0,
                value: 350.0,
            },
            BoundaryDef::HeatFlux {
                node: 1,
                value: 15.0,
            },
        ],
        initial_conditions: InitialConditionsDef::default(),
        matrix_solvers: vec![gmres],
        results: Some(ResultsDef {
            time_step: 2,
            time: 1.0,
            temperature: vec![350.0, 320.0, 300.0],
            pressure: vec![2000.0, 1000.0, 0.0],
            edge_flows: vec![EdgeFlowDef {
                from: 0,
                to: 1,
                rate: 1.5e-3,
            }],
            solved_at: None,
        }),
    }
}

#[test]
fn roundtrip_yaml_channel() {
    let model = channel_model();
    validate_model(&model).unwrap();

    let path = std::env::temp_dir().join("fe_model_roundtrip_channel.yaml");
    save(&path, &model).unwrap();
    let loaded = load(&path).unwrap();

    assert_eq!(model, loaded);
}

#[test]
fn roundtrip_json_channel() {
    let model = channel_model();

    let path = std::env::temp_dir().join("fe_model_roundtrip_channel.json");
    save(&path, &model).unwrap();
    let loaded = load(&path).unwrap();

    assert_eq!(model, loaded);
    assert_eq!(
        loaded.matrix_solver_config(MatrixSolverType::Gmres).inner_iterations,
        10
    );
    assert_eq!(
        loaded.matrix_solver_config(MatrixSolverType::Cg),
        MatrixSolverConfig::new(MatrixSolverType::Cg)
    );
}

#[test]
fn minimal_yaml_fills_defaults() {
    let yaml = r#"
version: 1
name: Rod
problem:
  problem_types: [heat]
nodes:
  - { x: 0.0 }
  - { x: 1.0 }
elements:
  - { kind: line, nodes: [0, 1], material: 0 }
materials:
  - { name: copper, density: 8960.0, thermal_conductivity: 400.0, specific_heat: 385.0 }
boundary_conditions:
  - { type: Temperature, node: 0, value: 400.0 }
  - { type: HeatFlux, node: 1, value: 2.0 }
"#;
    let model: Model = serde_yaml::from_str(yaml).unwrap();
    validate_model(&model).unwrap();

    assert!(model.problem.steady);
    assert_eq!(model.problem.heat_solver, MatrixSolverType::BiCgStab);
    assert_eq!(model.initial_conditions.temperature, 293.15);
    assert!(model.results.is_none());
    assert!(model.problem_mask().contains(PhysicsArea::Heat));
    assert!(!model.problem_mask().contains(PhysicsArea::Fluid));
}

#[test]
fn unknown_extension_is_rejected() {
    let path = std::env::temp_dir().join("fe_model_roundtrip.txt");
    assert!(matches!(
        save(&path, &channel_model()),
        Err(ModelError::UnsupportedFormat { .. })
    ));
}

#[test]
fn load_rejects_invalid_model() {
    let mut model = channel_model();
    model.elements[1].nodes = vec![1, 9];
    let path = std::env::temp_dir().join("fe_model_invalid.json");
    std::fs::write(&path, serde_json::to_string(&model).unwrap()).unwrap();

    assert!(matches!(load(&path), Err(ModelError::Validation(_))));
}

#[test]
fn non_finite_results_are_not_saved() {
    let path = std::env::temp_dir().join("fe_model_non_finite_results.json");
    save(&path, &channel_model()).unwrap();

    let mut diverged = channel_model();
    if let Some(results) = diverged.results.as_mut() {
        results.temperature = vec![f64::NAN, f64::INFINITY, 300.0];
    }
    assert!(matches!(
        save(&path, &diverged),
        Err(ModelError::Validation(ValidationError::InvalidValue { .. }))
    ));

    let mut bad_flow = channel_model();
    if let Some(results) = bad_flow.results.as_mut() {
        results.edge_flows[0].rate = f64::NEG_INFINITY;
    }
    assert!(save(&path, &bad_flow).is_err());

    // the file on disk is still the last valid model
    assert_eq!(load(&path).unwrap(), channel_model());
}
