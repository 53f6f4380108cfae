//! Edge and node views of the model mesh used by assembly.

use fe_model::{MaterialDef, Model};
use std::collections::BTreeMap;

/// One node pair of one element; shared edges appear once per element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementEdge {
    pub element: usize,
    pub from: usize,
    pub to: usize,
    pub length: f64,
}

pub fn element_edges(model: &Model) -> Vec<ElementEdge> {
    let mut edges = Vec::new();
    for (e, element) in model.elements.iter().enumerate() {
        for (from, to) in element.edges() {
            edges.push(ElementEdge {
                element: e,
                from,
                to,
                length: model.nodes[from].distance(&model.nodes[to]),
            });
        }
    }
    edges
}

pub fn edge_material<'m>(model: &'m Model, edge: &ElementEdge) -> Option<&'m MaterialDef> {
    model.material_of(&model.elements[edge.element])
}

/// Heat capacity lumped to nodes: `rho c_p V / n` per element node (J/K).
pub fn lumped_capacity(model: &Model) -> Vec<f64> {
    let mut capacity = vec![0.0; model.nodes.len()];
    for element in &model.elements {
        let Some(material) = model.material_of(element) else {
            continue;
        };
        let share = material.density * material.specific_heat * element.measure(&model.nodes)
            / element.nodes.len() as f64;
        for &node in &element.nodes {
            capacity[node] += share;
        }
    }
    capacity
}

/// Material of the first element containing each unique edge.
pub fn first_edge_materials(model: &Model) -> BTreeMap<(usize, usize), usize> {
    let mut materials = BTreeMap::new();
    for element in &model.elements {
        for key in element.edges() {
            materials.entry(key).or_insert(element.material);
        }
    }
    materials
}
