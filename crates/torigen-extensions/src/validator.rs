//! Capability validation for provider modules
//!
//! A module is admitted only if its default export is an object with an
//! `info` record (string `id`, `name`, `baseUrl`), a `capabilities` record,
//! and the module exports `get_homepage`, `get_manga_details` and
//! `get_chapters`. The check is structural and fails closed: anything that
//! does not decode cleanly into the typed shape is rejected.

use serde_json::{Map, Value};
use torigen_core::types::{SourceCapabilities, SourceInfo};
use torigen_core::validate_extension_id;

use crate::error::ValidationError;
use crate::module::{ModuleExports, REQUIRED_OPERATIONS};

/// Typed view of a module that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderShape {
    pub info: SourceInfo,
    pub capabilities: SourceCapabilities,
}

/// Check whether a module satisfies the provider contract
pub fn is_valid_source_provider(exports: &ModuleExports) -> bool {
    validate(exports).is_ok()
}

/// Validate a module, returning its typed shape or the first violation
pub fn validate(exports: &ModuleExports) -> Result<ProviderShape, ValidationError> {
    let export = exports
        .default_export
        .as_ref()
        .ok_or(ValidationError::MissingDefaultExport)?;
    let object = export.as_object().ok_or(ValidationError::NotAnObject)?;

    let info = require_object(object, "info")?;
    for field in ["id", "name", "baseUrl"] {
        if !info.get(field).is_some_and(Value::is_string) {
            return Err(ValidationError::MissingString(field));
        }
    }
    let capabilities = require_object(object, "capabilities")?;

    for operation in REQUIRED_OPERATIONS {
        if !exports.exports(operation) {
            return Err(ValidationError::MissingOperation(operation));
        }
    }

    let info: SourceInfo =
        serde_json::from_value(Value::Object(info.clone())).map_err(|e| malformed("info", e))?;
    validate_extension_id(&info.id).map_err(|e| malformed("info.id", e))?;

    let capabilities: SourceCapabilities =
        serde_json::from_value(Value::Object(capabilities.clone()))
            .map_err(|e| malformed("capabilities", e))?;

    Ok(ProviderShape { info, capabilities })
}

fn require_object<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Map<String, Value>, ValidationError> {
    object
        .get(field)
        .and_then(Value::as_object)
        .ok_or(ValidationError::MissingObject(field))
}

fn malformed(field: &'static str, err: impl std::fmt::Display) -> ValidationError {
    ValidationError::Malformed {
        field,
        message: err.to_string(),
    }
}
