//! License gating per physics area.

use crate::error::{AppError, AppResult};
use fe_model::{PhysicsArea, ProblemTypeMask};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info};

/// Account credentials presented to the license validator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseCredentials {
    pub account: String,
    pub password: String,
}

impl LicenseCredentials {
    pub fn new(account: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            password: password.into(),
        }
    }
}

/// Decides whether an account may solve a physics area.
pub trait LicenseValidator {
    fn validate(&self, area: PhysicsArea, account: &str, password: &str) -> bool;
}

/// Accepts every area for every account.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnrestrictedLicense;

impl LicenseValidator for UnrestrictedLicense {
    fn validate(&self, _area: PhysicsArea, _account: &str, _password: &str) -> bool {
        true
    }
}

/// Allow-list of physics areas, optionally bound to one account.
///
/// An empty `account` matches any account; the password is only checked
/// when an account is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaLicense {
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub password: String,
    pub areas: Vec<PhysicsArea>,
}

impl AreaLicense {
    pub fn new(areas: Vec<PhysicsArea>) -> Self {
        Self {
            areas,
            ..Self::default()
        }
    }

    /// Load a JSON license file.
    pub fn load(path: &Path) -> AppResult<Self> {
        let license_error = |message: String| AppError::LicenseFile {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| license_error(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| license_error(e.to_string()))
    }
}

impl LicenseValidator for AreaLicense {
    fn validate(&self, area: PhysicsArea, account: &str, password: &str) -> bool {
        if !self.account.is_empty() && (self.account != account || self.password != password) {
            return false;
        }
        self.areas.contains(&area)
    }
}

/// Validate every area of `mask`; all missing areas are reported together.
pub fn check_license(
    mask: ProblemTypeMask,
    credentials: &LicenseCredentials,
    validator: &dyn LicenseValidator,
) -> AppResult<()> {
    let mut missing = Vec::new();
    for area in mask.areas() {
        if validator.validate(area, &credentials.account, &credentials.password) {
            info!(area = %area, "License validated");
        } else {
            error!(area = %area, "License does not cover physics area '{}'", area);
            missing.push(area.name());
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::LicenseDenied {
            areas: missing.join(", "),
        })
    }
}
