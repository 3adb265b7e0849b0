//! API credentials and client settings from the environment
use cloudaudit_api::{CloudAuditConfig, DEFAULT_API_URL};
use log::{debug, warn};

pub const ENV_API_URL: &str = "CLOUDAUDIT_API_URL";
pub const ENV_API_TOKEN: &str = "CLOUDAUDIT_API_TOKEN";
pub const ENV_ORGANISATION_ID: &str = "CLOUDAUDIT_ORGANISATION_ID";
pub const ENV_CONNECT_TIMEOUT: &str = "CLOUDAUDIT_CONNECT_TIMEOUT";
pub const ENV_REQUEST_TIMEOUT: &str = "CLOUDAUDIT_REQUEST_TIMEOUT";
pub const ENV_DISABLE_CERT_VALIDATION: &str = "CLOUDAUDIT_DISABLE_CERT_VALIDATION";

/// Custom error types for credential operations
#[derive(thiserror::Error, Debug)]
pub enum CredentialError {
    #[error("Environment variable validation failed: {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("Missing required credentials: {missing}")]
    MissingCredentials { missing: String },
}

/// Validate a credential-like value: non-empty, no whitespace or control characters
pub fn validate_credential(value: &str, field_name: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{field_name} cannot be empty"));
    }

    if value
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(format!(
            "{field_name} must not contain whitespace or control characters"
        ));
    }

    Ok(())
}

/// Load the API client configuration from environment variables
///
/// # Errors
///
/// Returns `MissingCredentials` when the token or organisation is unset and
/// `ValidationError` for malformed values.
pub fn load_config_from_env() -> Result<CloudAuditConfig, CredentialError> {
    load_config_with(|key| std::env::var(key).ok())
}

/// Build the client configuration from any key lookup
///
/// # Errors
///
/// See [`load_config_from_env`].
pub fn load_config_with<F>(lookup: F) -> Result<CloudAuditConfig, CredentialError>
where
    F: Fn(&str) -> Option<String>,
{
    debug!("Loading API configuration from environment variables");

    let token = required(&lookup, ENV_API_TOKEN)?;
    let organisation_id = required(&lookup, ENV_ORGANISATION_ID)?;

    let api_url = lookup(ENV_API_URL)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let mut config = CloudAuditConfig::new(organisation_id, token).with_api_url(api_url);

    let connect_timeout = timeout_secs(&lookup, ENV_CONNECT_TIMEOUT)?;
    let request_timeout = timeout_secs(&lookup, ENV_REQUEST_TIMEOUT)?;
    if connect_timeout.is_some() || request_timeout.is_some() {
        let connect = connect_timeout.unwrap_or(config.connect_timeout);
        let request = request_timeout.unwrap_or(config.request_timeout);
        config = config.with_timeouts(connect, request);
    }

    if lookup(ENV_DISABLE_CERT_VALIDATION).is_some() {
        config = config.with_certificate_validation_disabled();
        warn!("Certificate validation disabled via {ENV_DISABLE_CERT_VALIDATION}");
        warn!("This should only be used in development environments!");
    }

    debug!(
        "API endpoint: {}, organisation: {}",
        config.api_url, config.organisation_id
    );
    Ok(config)
}

fn required<F>(lookup: &F, key: &str) -> Result<String, CredentialError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).ok_or_else(|| CredentialError::MissingCredentials {
        missing: format!("{key} environment variable"),
    })?;
    let value = value.trim().to_string();
    validate_credential(&value, key).map_err(|message| CredentialError::ValidationError {
        field: key.to_string(),
        message,
    })?;
    Ok(value)
}

fn timeout_secs<F>(lookup: &F, key: &str) -> Result<Option<u64>, CredentialError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Some(secs)),
        _ => Err(CredentialError::ValidationError {
            field: key.to_string(),
            message: format!("'{raw}' is not a positive number of seconds"),
        }),
    }
}

/// Print all supported environment variables
pub fn print_environment_variables() {
    println!("Environment Variables");
    println!("====================");
    println!();

    println!("AUTHENTICATION");
    println!("  {ENV_API_TOKEN}       - Bearer token for the audit API (required)");
    println!("  {ENV_ORGANISATION_ID} - Organisation whose audit trail is exported (required)");
    println!();

    println!("API CONFIGURATION");
    println!("  {ENV_API_URL}         - API base URL (default: {DEFAULT_API_URL})");
    println!();

    println!("NETWORK CONFIGURATION");
    println!(
        "  {ENV_DISABLE_CERT_VALIDATION} - Disable TLS certificate validation (dev only)"
    );
    println!("  {ENV_CONNECT_TIMEOUT}  - HTTP connection timeout in seconds (default: 30)");
    println!("  {ENV_REQUEST_TIMEOUT}  - HTTP request timeout in seconds (default: 300)");
    println!();

    println!("LOGGING");
    println!("  RUST_LOG                   - Log filter (default: info), e.g. RUST_LOG=debug");
    println!();

    println!("EXAMPLES");
    println!();
    println!("  export {ENV_API_TOKEN}=\"your-token\"");
    println!("  export {ENV_ORGANISATION_ID}=\"org-1234\"");
    println!("  cloudaudit export --since 7d --daily -o exports/audit.json");
}
