//! Record validation
//!
//! Structural validation of raw catalogue records against the typed
//! package schema, plus the business-rule filter that decides which
//! structurally valid records participate in aggregation.
//!
//! The two layers fail very differently on purpose: a structural
//! violation signals an upstream contract break and aborts the whole
//! run, while a business-rule reject is routine filtering and is only
//! logged.

use crate::models::CataloguePackage;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};

/// Record type sentinel; only dataset records are aggregated.
pub const PACKAGE_TYPE_DATASET: &str = "bcdc_dataset";

/// Record state sentinel; only active records are aggregated.
pub const PACKAGE_STATE_ACTIVE: &str = "active";

/// Errors raised by structural validation. Always fatal to the run.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Record item is not a JSON object at all.
    #[error("catalogue record is not a JSON object")]
    NotAnObject,

    /// Record does not match the package schema. The message names the
    /// first violated constraint.
    #[error("catalogue record failed schema validation: {message}")]
    SchemaViolation { message: String },
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate one raw decoded record against the package schema.
///
/// All-or-nothing: the first missing field, wrong shape, or wrong
/// primitive type anywhere in the record (including nested contacts,
/// resources, tags, dates, and more-info links) rejects the whole
/// record. The offending raw item is logged in full for forensic
/// inspection before the error is returned.
pub fn validate_package(raw: &Value) -> ValidationResult<CataloguePackage> {
    if !raw.is_object() {
        error!(raw = %raw, "catalogue record is not a JSON object");
        return Err(ValidationError::NotAnObject);
    }

    serde_json::from_value(raw.clone()).map_err(|e| {
        error!(raw = %raw, violation = %e, "catalogue record failed schema validation");
        ValidationError::SchemaViolation {
            message: e.to_string(),
        }
    })
}

/// Business-rule filter applied after structural validation.
///
/// Only packages whose `type` equals [`PACKAGE_TYPE_DATASET`] and whose
/// `state` equals [`PACKAGE_STATE_ACTIVE`] are retained. Rejects here
/// are expected and never fatal.
pub fn is_eligible(package: &CataloguePackage) -> bool {
    if package.type_ != PACKAGE_TYPE_DATASET || package.state != PACKAGE_STATE_ACTIVE {
        warn!(
            package = %package.name,
            package_type = %package.type_,
            state = %package.state,
            "dropping ineligible package"
        );
        return false;
    }
    true
}
