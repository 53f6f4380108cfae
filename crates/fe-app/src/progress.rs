#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingModel,
    CheckingLicense,
    BuildingSolvers,
    Iterating,
    SavingModel,
    Completed,
}

impl RunStage {
    pub fn label(self) -> &'static str {
        match self {
            RunStage::LoadingModel => "Loading model",
            RunStage::CheckingLicense => "Checking license",
            RunStage::BuildingSolvers => "Building solvers",
            RunStage::Iterating => "Iterating",
            RunStage::SavingModel => "Saving model",
            RunStage::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub time_step: Option<usize>,
    /// Outer iteration within the current time step, from 1
    pub outer_iteration: Option<usize>,
    pub converged: Option<bool>,
}

impl RunProgressEvent {
    pub fn stage(stage: RunStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            elapsed_wall_s,
            message,
            time_step: None,
            outer_iteration: None,
            converged: None,
        }
    }
}
