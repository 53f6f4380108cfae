//! Model schema definitions.

use crate::area::{PhysicsArea, ProblemTypeMask};
use fe_solver::{MatrixSolverConfig, MatrixSolverType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Model {
    pub version: u32,
    pub name: String,
    pub problem: ProblemSetup,
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub elements: Vec<ElementDef>,
    #[serde(default)]
    pub materials: Vec<MaterialDef>,
    #[serde(default)]
    pub boundary_conditions: Vec<BoundaryDef>,
    #[serde(default)]
    pub initial_conditions: InitialConditionsDef,
    #[serde(default)]
    pub matrix_solvers: Vec<MatrixSolverConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<ResultsDef>,
}

impl Model {
    pub fn problem_mask(&self) -> ProblemTypeMask {
        ProblemTypeMask::from_areas(self.problem.problem_types.iter().copied())
    }

    /// Configured parameters for `solver_type`, or its defaults.
    pub fn matrix_solver_config(&self, solver_type: MatrixSolverType) -> MatrixSolverConfig {
        self.matrix_solvers
            .iter()
            .find(|cfg| cfg.solver_type == solver_type)
            .cloned()
            .unwrap_or_else(|| MatrixSolverConfig::new(solver_type))
    }

    pub fn material_of(&self, element: &ElementDef) -> Option<&MaterialDef> {
        self.materials.get(element.material)
    }

    /// Diagonal of the axis-aligned bounding box of all nodes.
    pub fn bounding_box_diagonal(&self) -> f64 {
        let Some(first) = self.nodes.first() else {
            return 0.0;
        };
        let mut lo = [first.x, first.y, first.z];
        let mut hi = lo;
        for node in &self.nodes {
            for (k, v) in [node.x, node.y, node.z].into_iter().enumerate() {
                lo[k] = lo[k].min(v);
                hi[k] = hi[k].max(v);
            }
        }
        lo.iter()
            .zip(&hi)
            .map(|(a, b)| (b - a) * (b - a))
            .sum::<f64>()
            .sqrt()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProblemSetup {
    pub problem_types: Vec<PhysicsArea>,
    #[serde(default = "default_true")]
    pub steady: bool,
    /// Time step size in seconds (transient runs)
    #[serde(default = "default_time_step_size")]
    pub time_step_size: f64,
    #[serde(default = "default_one")]
    pub n_time_steps: usize,
    /// Coupling iterations per time step
    #[serde(default = "default_outer_iterations")]
    pub outer_iterations: usize,
    #[serde(default = "default_outer_convergence")]
    pub outer_convergence: f64,
    #[serde(default = "default_fluid_solver")]
    pub fluid_solver: MatrixSolverType,
    #[serde(default = "default_heat_solver")]
    pub heat_solver: MatrixSolverType,
    /// Temperature at which material viscosities are specified (K)
    #[serde(default = "default_reference_temperature")]
    pub reference_temperature: f64,
    /// Exponential viscosity sensitivity to temperature (1/K)
    #[serde(default)]
    pub viscosity_temperature_coefficient: f64,
    /// Outer-iteration report frequency; 0 is silent
    #[serde(default = "default_one")]
    pub output_frequency: usize,
}

fn default_true() -> bool {
    true
}

fn default_one() -> usize {
    1
}

fn default_time_step_size() -> f64 {
    1.0
}

fn default_outer_iterations() -> usize {
    20
}

fn default_outer_convergence() -> f64 {
    1e-6
}

fn default_fluid_solver() -> MatrixSolverType {
    MatrixSolverType::Cg
}

fn default_heat_solver() -> MatrixSolverType {
    MatrixSolverType::BiCgStab
}

fn default_reference_temperature() -> f64 {
    293.15
}

impl ProblemSetup {
    pub fn new(problem_types: Vec<PhysicsArea>) -> Self {
        Self {
            problem_types,
            steady: true,
            time_step_size: default_time_step_size(),
            n_time_steps: 1,
            outer_iterations: default_outer_iterations(),
            outer_convergence: default_outer_convergence(),
            fluid_solver: default_fluid_solver(),
            heat_solver: default_heat_solver(),
            reference_temperature: default_reference_temperature(),
            viscosity_temperature_coefficient: 0.0,
            output_frequency: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct NodeDef {
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl NodeDef {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &NodeDef) -> f64 {
        let (dx, dy, dz) = (other.x - self.x, other.y - self.y, other.z - self.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    fn minus(&self, other: &NodeDef) -> [f64; 3] {
        [self.x - other.x, self.y - other.y, self.z - other.z]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Line,
    Triangle,
    Tetrahedron,
}

impl ElementKind {
    pub fn node_count(self) -> usize {
        match self {
            ElementKind::Line => 2,
            ElementKind::Triangle => 3,
            ElementKind::Tetrahedron => 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementDef {
    pub kind: ElementKind,
    pub nodes: Vec<usize>,
    pub material: usize,
}

impl ElementDef {
    /// Every node pair of the element, each as `(low, high)`.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges = Vec::new();
        for (a, &i) in self.nodes.iter().enumerate() {
            for &j in &self.nodes[a + 1..] {
                edges.push((i.min(j), i.max(j)));
            }
        }
        edges
    }

    /// Length, area or volume depending on the element kind.
    pub fn measure(&self, nodes: &[NodeDef]) -> f64 {
        let p: Vec<&NodeDef> = self.nodes.iter().map(|&i| &nodes[i]).collect();
        match self.kind {
            ElementKind::Line => p[0].distance(p[1]),
            ElementKind::Triangle => {
                let c = cross(p[1].minus(p[0]), p[2].minus(p[0]));
                0.5 * (c[0] * c[0] + c[1] * c[1] + c[2] * c[2]).sqrt()
            }
            ElementKind::Tetrahedron => {
                let c = cross(p[2].minus(p[0]), p[3].minus(p[0]));
                let a = p[1].minus(p[0]);
                (a[0] * c[0] + a[1] * c[1] + a[2] * c[2]).abs() / 6.0
            }
        }
    }
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaterialDef {
    pub name: String,
    /// kg/m^3
    pub density: f64,
    /// Pa s
    #[serde(default)]
    pub dynamic_viscosity: f64,
    /// W/(m K)
    #[serde(default)]
    pub thermal_conductivity: f64,
    /// J/(kg K)
    #[serde(default)]
    pub specific_heat: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum BoundaryDef {
    /// Fixed temperature (K)
    Temperature { node: usize, value: f64 },
    /// Heat flow into the node (W)
    HeatFlux { node: usize, value: f64 },
    /// Fixed pressure (Pa)
    Pressure { node: usize, value: f64 },
    /// Volume flow into the node (m^3/s)
    VolumeFlow { node: usize, value: f64 },
}

impl BoundaryDef {
    pub fn node(&self) -> usize {
        match self {
            BoundaryDef::Temperature { node, .. }
            | BoundaryDef::HeatFlux { node, .. }
            | BoundaryDef::Pressure { node, .. }
            | BoundaryDef::VolumeFlow { node, .. } => *node,
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            BoundaryDef::Temperature { value, .. }
            | BoundaryDef::HeatFlux { value, .. }
            | BoundaryDef::Pressure { value, .. }
            | BoundaryDef::VolumeFlow { value, .. } => *value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitialConditionsDef {
    #[serde(default = "default_reference_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub pressure: f64,
}

impl Default for InitialConditionsDef {
    fn default() -> Self {
        Self {
            temperature: default_reference_temperature(),
            pressure: 0.0,
        }
    }
}

/// Stored solution; also the restart source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ResultsDef {
    /// Number of completed time steps
    pub time_step: usize,
    /// Simulated time (s)
    pub time: f64,
    #[serde(default)]
    pub temperature: Vec<f64>,
    #[serde(default)]
    pub pressure: Vec<f64>,
    #[serde(default)]
    pub edge_flows: Vec<EdgeFlowDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solved_at: Option<String>,
}

/// Volume flow along an element edge, positive from `from` to `to`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EdgeFlowDef {
    pub from: usize,
    pub to: usize,
    pub rate: f64,
}
