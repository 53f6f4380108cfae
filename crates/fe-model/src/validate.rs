use crate::schema::*;
use std::collections::HashSet;
use thiserror::Error;

/// Newest model file version this build understands.
pub const CURRENT_VERSION: u32 = 1;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate entry: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_model(model: &Model) -> Result<(), ValidationError> {
    if model.version == 0 || model.version > CURRENT_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: model.version,
        });
    }

    validate_problem(&model.problem)?;

    for (i, node) in model.nodes.iter().enumerate() {
        for (axis, v) in [("x", node.x), ("y", node.y), ("z", node.z)] {
            if !v.is_finite() {
                return Err(ValidationError::InvalidValue {
                    field: format!("node {} {}", i, axis),
                    value: v.to_string(),
                    reason: "must be finite".to_string(),
                });
            }
        }
    }

    for material in &model.materials {
        validate_material(material)?;
    }

    for (i, element) in model.elements.iter().enumerate() {
        validate_element(i, element, model)?;
    }

    let n_nodes = model.nodes.len();
    for boundary in &model.boundary_conditions {
        if boundary.node() >= n_nodes {
            return Err(ValidationError::MissingReference {
                id: format!("node {}", boundary.node()),
                context: "boundary_conditions".to_string(),
            });
        }
        if !boundary.value().is_finite() {
            return Err(ValidationError::InvalidValue {
                field: format!("boundary condition at node {}", boundary.node()),
                value: boundary.value().to_string(),
                reason: "must be finite".to_string(),
            });
        }
    }

    let mut solver_types = HashSet::new();
    for config in &model.matrix_solvers {
        if !solver_types.insert(config.solver_type) {
            return Err(ValidationError::DuplicateId {
                id: config.solver_type.to_string(),
                context: "matrix_solvers".to_string(),
            });
        }
        config
            .validate()
            .map_err(|e| ValidationError::InvalidValue {
                field: format!("matrix solver '{}'", config.solver_type),
                value: config.convergence_threshold.to_string(),
                reason: e.to_string(),
            })?;
    }

    if let Some(results) = &model.results {
        validate_results(results, n_nodes)?;
    }

    Ok(())
}

fn validate_problem(problem: &ProblemSetup) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for area in &problem.problem_types {
        if !seen.insert(*area) {
            return Err(ValidationError::DuplicateId {
                id: area.to_string(),
                context: "problem_types".to_string(),
            });
        }
    }

    if problem.outer_iterations == 0 {
        return Err(ValidationError::InvalidValue {
            field: "problem outer_iterations".to_string(),
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    validate_positive_finite("problem outer_convergence", problem.outer_convergence)?;
    validate_positive_finite("problem reference_temperature", problem.reference_temperature)?;
    if !problem.viscosity_temperature_coefficient.is_finite() {
        return Err(ValidationError::InvalidValue {
            field: "problem viscosity_temperature_coefficient".to_string(),
            value: problem.viscosity_temperature_coefficient.to_string(),
            reason: "must be finite".to_string(),
        });
    }

    if !problem.steady {
        validate_positive_finite("problem time_step_size", problem.time_step_size)?;
        if problem.n_time_steps == 0 {
            return Err(ValidationError::InvalidValue {
                field: "problem n_time_steps".to_string(),
                value: "0".to_string(),
                reason: "transient problems need at least one time step".to_string(),
            });
        }
    }

    Ok(())
}

fn validate_material(material: &MaterialDef) -> Result<(), ValidationError> {
    let field = |name: &str| format!("material '{}' {}", material.name, name);
    validate_positive_finite(&field("density"), material.density)?;
    validate_non_negative_finite(&field("dynamic_viscosity"), material.dynamic_viscosity)?;
    validate_non_negative_finite(&field("thermal_conductivity"), material.thermal_conductivity)?;
    validate_non_negative_finite(&field("specific_heat"), material.specific_heat)?;
    Ok(())
}

fn validate_element(
    index: usize,
    element: &ElementDef,
    model: &Model,
) -> Result<(), ValidationError> {
    let expected = element.kind.node_count();
    if element.nodes.len() != expected {
        return Err(ValidationError::InvalidValue {
            field: format!("element {} nodes", index),
            value: element.nodes.len().to_string(),
            reason: format!("{:?} elements need {} nodes", element.kind, expected),
        });
    }

    let mut seen = HashSet::new();
    for &node in &element.nodes {
        if node >= model.nodes.len() {
            return Err(ValidationError::MissingReference {
                id: format!("node {}", node),
                context: format!("element {}", index),
            });
        }
        if !seen.insert(node) {
            return Err(ValidationError::DuplicateId {
                id: format!("node {}", node),
                context: format!("element {}", index),
            });
        }
    }

    if element.material >= model.materials.len() {
        return Err(ValidationError::MissingReference {
            id: format!("material {}", element.material),
            context: format!("element {}", index),
        });
    }

    let measure = element.measure(&model.nodes);
    if measure <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: format!("element {} measure", index),
            value: measure.to_string(),
            reason: "element is degenerate".to_string(),
        });
    }

    Ok(())
}

fn validate_results(results: &ResultsDef, n_nodes: usize) -> Result<(), ValidationError> {
    for (name, values) in [
        ("temperature", &results.temperature),
        ("pressure", &results.pressure),
    ] {
        if !values.is_empty() && values.len() != n_nodes {
            return Err(ValidationError::InvalidValue {
                field: format!("results {}", name),
                value: values.len().to_string(),
                reason: format!("expected one value per node ({})", n_nodes),
            });
        }
        if let Some((node, value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(ValidationError::InvalidValue {
                field: format!("results {} at node {}", name, node),
                value: value.to_string(),
                reason: "must be finite".to_string(),
            });
        }
    }
    for flow in &results.edge_flows {
        if flow.from >= n_nodes || flow.to >= n_nodes {
            return Err(ValidationError::MissingReference {
                id: format!("edge {}-{}", flow.from, flow.to),
                context: "results edge_flows".to_string(),
            });
        }
        if !flow.rate.is_finite() {
            return Err(ValidationError::InvalidValue {
                field: format!("results edge flow {}-{}", flow.from, flow.to),
                value: flow.rate.to_string(),
                reason: "must be finite".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_positive_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be positive and finite".to_string(),
        });
    }
    Ok(())
}

fn validate_non_negative_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be non-negative and finite".to_string(),
        });
    }
    Ok(())
}
