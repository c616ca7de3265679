//! Shared-secret authentication gate.
//!
//! Both entry points (REST requests and control-channel upgrades) go through
//! the same secret comparison. Upgrades additionally require a well-formed
//! user identifier header. Everything here is a pure function of the
//! configured secret and the request headers.

use axum::http::{header, HeaderMap};
use thiserror::Error;

/// The only path reachable without credentials on the request path.
pub const ROOT_PATH: &str = "/";

/// Default header carrying the client's user identifier on upgrades.
pub const DEFAULT_USER_ID_HEADER: &str = "user-id";

/// Reasons a connection was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header missing")]
    MissingAuthorization,

    #[error("Authorization header does not match the configured secret")]
    InvalidAuthorization,

    #[error("User id header missing")]
    MissingUserId,

    #[error("User id header sent more than once")]
    MultipleUserIds,

    #[error("User id must be decimal digits, got {0:?}")]
    MalformedUserId(String),
}

/// Operator-configured shared secret. Empty or unset disables the check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedSecret(Option<String>);

impl SharedSecret {
    pub fn new(secret: Option<String>) -> Self {
        Self(secret.filter(|s| !s.is_empty()))
    }

    /// A secret that authorizes everyone.
    pub fn disabled() -> Self {
        Self(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.0.is_some()
    }

    /// Compare a client credential against the secret.
    pub fn verify(&self, credential: Option<&str>) -> Result<(), AuthError> {
        let Some(expected) = self.0.as_deref() else {
            return Ok(());
        };

        match credential {
            None => Err(AuthError::MissingAuthorization),
            Some(given) if given == expected => Ok(()),
            Some(_) => Err(AuthError::InvalidAuthorization),
        }
    }
}

impl From<&str> for SharedSecret {
    fn from(secret: &str) -> Self {
        Self::new(Some(secret.to_string()))
    }
}

/// Validated user identifier taken from an upgrade request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    // Non UTF-8 values can never equal a configured secret.
    headers
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or_default())
}

/// Gate for ordinary request/response traffic.
///
/// The root path is always reachable, whatever the credential.
pub fn authorize_request(
    secret: &SharedSecret,
    path: &str,
    headers: &HeaderMap,
) -> Result<(), AuthError> {
    if path == ROOT_PATH {
        return Ok(());
    }
    secret.verify(authorization(headers))
}

/// Gate for protocol upgrades.
///
/// No root-path exemption applies here. The user id is checked even when
/// the secret is disabled.
pub fn authorize_upgrade(
    secret: &SharedSecret,
    user_id_header: &str,
    headers: &HeaderMap,
) -> Result<UserId, AuthError> {
    secret.verify(authorization(headers))?;
    parse_user_id(headers, user_id_header)
}

fn parse_user_id(headers: &HeaderMap, name: &str) -> Result<UserId, AuthError> {
    let mut values = headers.get_all(name).iter();
    let value = values.next().ok_or(AuthError::MissingUserId)?;
    if values.next().is_some() {
        return Err(AuthError::MultipleUserIds);
    }

    let raw = String::from_utf8_lossy(value.as_bytes()).into_owned();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AuthError::MalformedUserId(raw));
    }
    Ok(UserId(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(
                axum::http::HeaderName::from_bytes(k.as_bytes()).unwrap(),
                HeaderValue::from_str(v).unwrap(),
            );
        }
        map
    }

    #[test]
    fn disabled_secret_accepts_anything() {
        let secret = SharedSecret::new(Some(String::new()));
        assert!(!secret.is_enabled());
        assert!(authorize_request(&secret, "/tracks", &HeaderMap::new()).is_ok());
        assert!(authorize_request(&secret, "/tracks", &headers(&[("authorization", "x")])).is_ok());
    }

    #[test]
    fn secret_is_exact_and_case_sensitive() {
        let secret = SharedSecret::from("abc");
        let ok = headers(&[("authorization", "abc")]);
        let upper = headers(&[("authorization", "ABC")]);

        assert!(authorize_request(&secret, "/tracks", &ok).is_ok());
        assert_eq!(
            authorize_request(&secret, "/tracks", &upper),
            Err(AuthError::InvalidAuthorization)
        );
        assert_eq!(
            authorize_request(&secret, "/tracks", &HeaderMap::new()),
            Err(AuthError::MissingAuthorization)
        );
    }

    #[test]
    fn root_path_is_exempt() {
        let secret = SharedSecret::from("abc");
        assert!(authorize_request(&secret, "/", &HeaderMap::new()).is_ok());
        assert!(authorize_request(&secret, "/", &headers(&[("authorization", "xyz")])).is_ok());
    }

    #[test]
    fn upgrade_requires_digit_user_id() {
        let secret = SharedSecret::disabled();

        let user = authorize_upgrade(&secret, "user-id", &headers(&[("user-id", "1234")])).unwrap();
        assert_eq!(user.as_str(), "1234");

        assert_eq!(
            authorize_upgrade(&secret, "user-id", &headers(&[("user-id", "12a")])),
            Err(AuthError::MalformedUserId("12a".into()))
        );
        assert_eq!(
            authorize_upgrade(&secret, "user-id", &headers(&[("user-id", "")])),
            Err(AuthError::MalformedUserId(String::new()))
        );
        assert_eq!(
            authorize_upgrade(&secret, "user-id", &HeaderMap::new()),
            Err(AuthError::MissingUserId)
        );
        assert_eq!(
            authorize_upgrade(&secret, "user-id", &headers(&[("user-id", "1"), ("user-id", "2")])),
            Err(AuthError::MultipleUserIds)
        );
    }

    #[test]
    fn upgrade_checks_secret_without_root_exemption() {
        let secret = SharedSecret::from("abc");
        let wrong = headers(&[("user-id", "42"), ("authorization", "nope")]);
        let right = headers(&[("user-id", "42"), ("authorization", "abc")]);

        assert_eq!(
            authorize_upgrade(&secret, "user-id", &wrong),
            Err(AuthError::InvalidAuthorization)
        );
        assert!(authorize_upgrade(&secret, "user-id", &right).is_ok());
    }
}
