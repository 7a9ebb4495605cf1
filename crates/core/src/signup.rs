//! Demo-signup form payload, validation and the user-facing notification.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::plans::{resolve_requested_plan, Plan};

/// Raw signup form as submitted by the marketing site.
///
/// The French field names used by the marketing form are accepted as aliases.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupRequest {
    #[serde(default, alias = "nom")]
    pub last_name: Option<String>,
    #[serde(default, alias = "prenom")]
    pub first_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "entreprise")]
    pub company: Option<String>,
    #[serde(default, alias = "telephone")]
    pub phone: Option<String>,
    /// Company headcount bracket (`1-5`, `6-10`, ...). Informational only.
    #[serde(default, alias = "effectif")]
    pub headcount: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default, alias = "cgv")]
    pub consent: bool,
}

/// A signup whose required fields are present and whose consent is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSignup {
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    pub company: String,
    pub phone: String,
    pub plan: Plan,
}

/// Message shown when a required field is blank.
pub const MISSING_FIELDS_MESSAGE: &str = "Please fill in all required fields";

/// Message shown when the terms were not accepted.
pub const CONSENT_REQUIRED_MESSAGE: &str = "Please accept the terms and conditions";

impl SignupRequest {
    /// Check required fields (trimmed, non-empty) and consent.
    pub fn validate(&self) -> Result<ValidatedSignup, CoreError> {
        let required = [
            &self.last_name,
            &self.first_name,
            &self.email,
            &self.company,
            &self.phone,
        ];
        let values: Vec<String> = required
            .iter()
            .filter_map(|v| v.as_deref().map(str::trim).filter(|s| !s.is_empty()))
            .map(str::to_string)
            .collect();
        let [last_name, first_name, email, company, phone]: [String; 5] = values
            .try_into()
            .map_err(|_| CoreError::Validation(MISSING_FIELDS_MESSAGE.to_string()))?;

        if !self.consent {
            return Err(CoreError::Validation(CONSENT_REQUIRED_MESSAGE.to_string()));
        }

        Ok(ValidatedSignup {
            last_name,
            first_name,
            email,
            company,
            phone,
            plan: resolve_requested_plan(self.plan.as_deref()),
        })
    }
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// Severity of the single notification shown at the end of a signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Positive,
    Warning,
    Negative,
}

/// User-visible result of one signup submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

impl Notification {
    pub fn positive(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Positive,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn negative(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Negative,
            message: message.into(),
        }
    }
}
