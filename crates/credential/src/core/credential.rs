//! Credential, request and authorization values

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::SecretString;

/// Login/password pair currently valid for one logical database
///
/// Immutable once built. Rotation replaces the whole value in the
/// [`CredentialStore`](crate::store::CredentialStore); fields are never
/// patched in place, so a reader always sees one generation.
#[derive(Debug, Clone, Serialize)]
pub struct Credential {
    database_name: String,
    login: String,
    password: SecretString,
    created_at: DateTime<Utc>,
}

impl Credential {
    /// Create a credential stamped with the current time
    pub fn new(
        database_name: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<SecretString>,
    ) -> Self {
        Self {
            database_name: database_name.into(),
            login: login.into(),
            password: password.into(),
            created_at: Utc::now(),
        }
    }

    /// Override the creation timestamp (seeding from a backend that recorded it)
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Caller-supplied authorization request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    database_name: String,
    /// Opaque caller context, carried through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_context: Option<serde_json::Value>,
}

impl AuthorizationRequest {
    pub fn new(database_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            client_context: None,
        }
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.client_context = Some(context);
        self
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn client_context(&self) -> Option<&serde_json::Value> {
        self.client_context.as_ref()
    }
}

/// Result of a successful authorization, produced once per request
#[derive(Debug, Clone, Serialize)]
pub struct DbAuthorization {
    login: String,
    password: SecretString,
    database_name: String,
    issued_at: DateTime<Utc>,
}

impl DbAuthorization {
    /// Issue an authorization from the credential current at this instant
    pub fn issue(credential: &Credential) -> Self {
        Self {
            login: credential.login.clone(),
            password: credential.password.clone(),
            database_name: credential.database_name.clone(),
            issued_at: Utc::now(),
        }
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_copies_credential_fields() {
        let credential = Credential::new("Election2024", "election2024_u1", "pw-1");
        let authorization = DbAuthorization::issue(&credential);

        assert_eq!(authorization.database_name(), "Election2024");
        assert_eq!(authorization.login(), "election2024_u1");
        assert!(authorization.password().matches(credential.password()));
        assert!(authorization.issued_at() >= credential.created_at());
    }

    #[test]
    fn debug_output_redacts_password() {
        let credential = Credential::new("Election2024", "svc", "hunter2-very-secret");
        let debug = format!("{credential:?}");

        assert!(debug.contains("svc"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn serialized_authorization_never_carries_plaintext() {
        let credential = Credential::new("Profiles", "profiles_u3", "plaintext-pw");
        let json = serde_json::to_value(DbAuthorization::issue(&credential)).unwrap();

        assert_eq!(json["login"], "profiles_u3");
        assert_eq!(json["password"], "[REDACTED]");
    }

    #[test]
    fn request_context_round_trips_through_json() {
        let request = AuthorizationRequest::new("Election2024")
            .with_context(serde_json::json!({ "station": 17 }));

        let json = serde_json::to_string(&request).unwrap();
        let back: AuthorizationRequest = serde_json::from_str(&json).unwrap();

        assert_eq!(back, request);
        assert_eq!(back.client_context().unwrap()["station"], 17);
    }
}
