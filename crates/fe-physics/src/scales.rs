//! Reference scales for non-dimensional assembly.

use fe_core::units::{
    Density, DynVisc, Length, Mass, Time, Velocity, kg, kg_per_m3, m, mps, pa_s, s,
};
use fe_model::Model;
use uom::si::dynamic_viscosity::pascal_second;
use uom::si::length::meter;
use uom::si::mass_density::kilogram_per_cubic_meter;
use uom::si::time::second;

/// Characteristic length, time, mass and material scales of a model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scales {
    pub length: Length,
    pub time: Time,
    pub mass: Mass,
    pub density: Density,
    pub viscosity: DynVisc,
}

impl Default for Scales {
    fn default() -> Self {
        Self {
            length: m(1.0),
            time: s(1.0),
            mass: kg(1.0),
            density: kg_per_m3(1.0),
            viscosity: pa_s(1.0),
        }
    }
}

impl Scales {
    pub fn from_model(model: &Model) -> Self {
        let (density, viscosity) = average_material_properties(model);
        let length = find_mesh_scale(model);
        Self {
            length,
            time: find_re_scale(density, viscosity, length),
            mass: find_weight_scale(density, length),
            density,
            viscosity,
        }
    }

    pub fn velocity(&self) -> Velocity {
        mps(self.length.get::<meter>() / self.time.get::<second>())
    }

    /// Pressure scale `mu / t` in Pa.
    pub fn pressure_pa(&self) -> f64 {
        self.viscosity.get::<pascal_second>() / self.time.get::<second>()
    }
}

/// Mean of the non-zero densities and viscosities over all elements.
///
/// A property that is zero everywhere averages to 1.
pub fn average_material_properties(model: &Model) -> (Density, DynVisc) {
    let mut density = (0.0, 0usize);
    let mut viscosity = (0.0, 0usize);
    for material in model.elements.iter().filter_map(|e| model.material_of(e)) {
        if material.density != 0.0 {
            density.0 += material.density;
            density.1 += 1;
        }
        if material.dynamic_viscosity != 0.0 {
            viscosity.0 += material.dynamic_viscosity;
            viscosity.1 += 1;
        }
    }
    let mean = |(sum, count): (f64, usize)| if count == 0 { 1.0 } else { sum / count as f64 };
    (kg_per_m3(mean(density)), pa_s(mean(viscosity)))
}

/// Bounding-box diagonal; 1 m for a model without extent.
pub fn find_mesh_scale(model: &Model) -> Length {
    let diagonal = model.bounding_box_diagonal();
    if diagonal > 0.0 { m(diagonal) } else { m(1.0) }
}

/// Viscous time scale `rho L^2 / mu`, the time at which the Reynolds number
/// built from the scales is one.
pub fn find_re_scale(density: Density, viscosity: DynVisc, length: Length) -> Time {
    let rho = density.get::<kilogram_per_cubic_meter>();
    let mu = viscosity.get::<pascal_second>();
    let l = length.get::<meter>();
    s(rho * l * l / mu)
}

/// Mass of a cube of side `length` at `density`.
pub fn find_weight_scale(density: Density, length: Length) -> Mass {
    let l = length.get::<meter>();
    kg(density.get::<kilogram_per_cubic_meter>() * l * l * l)
}
