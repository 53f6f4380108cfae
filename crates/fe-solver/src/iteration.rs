//! Convergence tracking and iteration reporting.

use crate::error::{SolverError, SolverResult};
use fe_core::numeric::{MACHINE_EPSILON_SQUARED, scientific};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Column separator of the convergence file.
const SEPARATOR: char = '|';

/// Named scalar sample; one column of a convergence-file row.
#[derive(Clone, Debug, PartialEq)]
pub struct IterationInfoValue {
    pub name: String,
    pub value: f64,
}

impl IterationInfoValue {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Iteration counter, residual error and trend of one iterative process.
///
/// Owned by exactly one solver and updated once per iteration.
#[derive(Clone, Debug)]
pub struct IterationInfo {
    n_iterations: usize,
    convergence_value: f64,
    output_frequency: usize,
    current_iteration: usize,
    current_error: f64,
    trend: f64,
    equation_scale: f64,
    output_file_name: Option<PathBuf>,
}

impl Default for IterationInfo {
    fn default() -> Self {
        Self {
            n_iterations: 1000,
            convergence_value: 1e-5,
            output_frequency: 1,
            current_iteration: 0,
            current_error: 0.0,
            trend: 0.0,
            equation_scale: 1.0,
            output_file_name: None,
        }
    }
}

impl IterationInfo {
    pub fn new(n_iterations: usize, convergence_value: f64, output_frequency: usize) -> Self {
        Self {
            n_iterations,
            convergence_value,
            output_frequency,
            ..Self::default()
        }
    }

    pub fn n_iterations(&self) -> usize {
        self.n_iterations
    }

    pub fn set_n_iterations(&mut self, n_iterations: usize) {
        self.n_iterations = n_iterations;
    }

    pub fn convergence_value(&self) -> f64 {
        self.convergence_value
    }

    pub fn set_convergence_value(&mut self, convergence_value: f64) {
        self.convergence_value = convergence_value;
    }

    pub fn output_frequency(&self) -> usize {
        self.output_frequency
    }

    pub fn set_output_frequency(&mut self, output_frequency: usize) {
        self.output_frequency = output_frequency;
    }

    pub fn iteration(&self) -> usize {
        self.current_iteration
    }

    pub fn set_iteration(&mut self, iteration: usize) {
        self.current_iteration = iteration;
    }

    pub fn error(&self) -> f64 {
        self.current_error
    }

    /// Store a new error; the trend is taken against the previous error first.
    pub fn set_error(&mut self, error: f64) {
        self.trend = error - self.current_error;
        self.current_error = error;
    }

    pub fn trend(&self) -> f64 {
        self.trend
    }

    pub fn equation_scale(&self) -> f64 {
        self.equation_scale
    }

    pub fn set_equation_scale(&mut self, equation_scale: f64) {
        self.equation_scale = equation_scale;
    }

    pub fn output_file_name(&self) -> Option<&Path> {
        self.output_file_name.as_deref()
    }

    pub fn set_output_file_name(&mut self, output_file_name: Option<PathBuf>) {
        self.output_file_name = output_file_name;
    }

    /// Back to iteration zero with no error history.
    pub fn reset(&mut self) {
        self.current_iteration = 0;
        self.current_error = 0.0;
        self.trend = 0.0;
    }

    /// Convergence test.
    ///
    /// Converged when the error or the trend is not a normal float (zero,
    /// subnormal, NaN, infinite), when the error is below the convergence
    /// value, or when the trend magnitude is below machine epsilon squared.
    pub fn has_converged(&self) -> bool {
        !self.current_error.is_normal()
            || !self.trend.is_normal()
            || self.current_error < self.convergence_value
            || self.trend.abs() < MACHINE_EPSILON_SQUARED
    }

    /// Report line for the current iteration, if this iteration reports.
    ///
    /// Output frequency 0 silences every iteration, converged or not.
    pub fn iteration_line(&self) -> Option<String> {
        if self.output_frequency == 0 {
            return None;
        }
        if !self.has_converged() && self.current_iteration % self.output_frequency != 0 {
            return None;
        }
        Some(format!(
            "> {:>6} of {:<6} |{:>12} |{:>12} |",
            self.current_iteration,
            self.n_iterations,
            scientific(self.current_error, 6),
            scientific(self.trend, 6),
        ))
    }

    /// Log the iteration line and append a row to the output file, if any.
    pub fn print_iteration(&self) -> SolverResult<()> {
        let Some(line) = self.iteration_line() else {
            return Ok(());
        };
        tracing::info!("{}", line);

        if let Some(path) = &self.output_file_name {
            Self::write_to_file(
                path,
                self.current_iteration,
                &[
                    IterationInfoValue::new("Error", self.current_error),
                    IterationInfoValue::new("Trend", self.trend),
                ],
            )?;
        }
        Ok(())
    }

    /// Append one row to a convergence file.
    ///
    /// The header row is written only when the file does not exist yet, so a
    /// file must keep one set of value names for its whole life.
    pub fn write_to_file(
        path: &Path,
        iteration: usize,
        values: &[IterationInfoValue],
    ) -> SolverResult<()> {
        let io_err = |source| SolverError::Io {
            path: path.to_path_buf(),
            source,
        };

        let write_header = !path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_err)?;

        let mut content = String::new();
        if write_header {
            content.push_str("Iteration number");
            for value in values {
                content.push(SEPARATOR);
                content.push_str(&value.name);
            }
            content.push('\n');
        }

        content.push_str(&iteration.to_string());
        for value in values {
            content.push(SEPARATOR);
            content.push_str(&scientific(value.value, 6));
        }
        content.push('\n');

        file.write_all(content.as_bytes()).map_err(io_err)
    }
}
