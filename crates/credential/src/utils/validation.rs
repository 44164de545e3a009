//! Validation helpers shared by request handling and configuration

/// Longest database name accepted, in bytes
pub const MAX_DATABASE_NAME_LEN: usize = 128;

/// Validate a logical database name
///
/// Returns the rejection reason on failure.
///
/// # Examples
///
/// ```
/// use dbauth_credential::utils::validate_database_name;
///
/// assert!(validate_database_name("Election2024").is_ok());
/// assert!(validate_database_name("   ").is_err());
/// ```
pub fn validate_database_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("database name must not be empty".to_owned());
    }

    if name.len() > MAX_DATABASE_NAME_LEN {
        return Err(format!(
            "database name is {} bytes, limit is {MAX_DATABASE_NAME_LEN}",
            name.len()
        ));
    }

    if name.chars().any(char::is_control) {
        return Err("database name contains control characters".to_owned());
    }

    Ok(())
}
