//! Input validation utilities and patterns

use crate::error::{CustosError, CustosResult};
use std::collections::HashSet;

/// Maximum length of a module name
pub const MAX_MODULE_NAME_LENGTH: usize = 128;

/// Validation utilities for common data types
pub struct ValidationUtils;

impl ValidationUtils {
    /// Validate string length
    pub fn validate_string_length(s: &str, max_len: usize, field_name: &str) -> CustosResult<()> {
        if s.len() > max_len {
            return Err(CustosError::validation(format!(
                "{} too long: {} bytes (max {})",
                field_name,
                s.len(),
                max_len
            )));
        }
        Ok(())
    }

    /// Validate byte array length
    pub fn validate_bytes_length(
        bytes: &[u8],
        expected_len: usize,
        field_name: &str,
    ) -> CustosResult<()> {
        if bytes.len() != expected_len {
            return Err(CustosError::validation(format!(
                "{} invalid length: {} bytes (expected {})",
                field_name,
                bytes.len(),
                expected_len
            )));
        }
        Ok(())
    }

    /// Validate a module account name
    pub fn validate_module_name(name: &str) -> CustosResult<()> {
        if name.trim().is_empty() {
            return Err(CustosError::validation("module account name cannot be blank"));
        }
        Self::validate_string_length(name, MAX_MODULE_NAME_LENGTH, "Module name")
    }

    /// Validate a permission list: no blank entries, no duplicates
    pub fn validate_permissions<S: AsRef<str>>(permissions: &[S]) -> CustosResult<()> {
        let mut seen = HashSet::with_capacity(permissions.len());
        for perm in permissions {
            let perm = perm.as_ref();
            if perm.trim().is_empty() {
                return Err(CustosError::validation("module permission is empty"));
            }
            if !seen.insert(perm) {
                return Err(CustosError::validation(format!(
                    "duplicate module permission {perm}"
                )));
            }
        }
        Ok(())
    }

    /// Validate that a numeric parameter is set
    pub fn validate_nonzero(value: u64, field_name: &str) -> CustosResult<()> {
        if value == 0 {
            return Err(CustosError::validation(format!(
                "invalid {field_name}: must be positive"
            )));
        }
        Ok(())
    }
}
