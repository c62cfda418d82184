//! Caller identification and role resolution.

use crate::config::{ApiUser, AuthSettings};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use registry_model::ADMINISTRATOR;
use serde_json::{Map, Value};

/// Role of callers that presented no valid credentials.
pub const ANONYMOUS: &str = "anonymous";

pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// An authenticated client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
    pub group: String,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.group == ADMINISTRATOR
    }
}

impl From<&ApiUser> for Principal {
    fn from(user: &ApiUser) -> Self {
        Self {
            name: user.name.clone(),
            group: user.group.clone(),
        }
    }
}

/// Pulls the API key out of an `Authorization` header.
///
/// Basic credentials carry the key as the user name (the password is
/// ignored); Bearer credentials carry it directly.
fn api_key(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, credentials) = value.split_once(' ')?;
    match scheme.to_ascii_lowercase().as_str() {
        "basic" => {
            let decoded = STANDARD.decode(credentials.trim()).ok()?;
            let decoded = String::from_utf8(decoded).ok()?;
            let key = decoded.split_once(':').map_or(decoded.as_str(), |(user, _)| user);
            Some(key.to_string())
        }
        "bearer" => Some(credentials.trim().to_string()),
        _ => None,
    }
}

/// Looks the caller up by API key. Unknown keys are treated as anonymous.
pub fn authenticate(auth: &AuthSettings, headers: &HeaderMap) -> Option<Principal> {
    let key = api_key(headers)?;
    let principal = auth
        .users
        .iter()
        .find(|user| user.key == key)
        .map(Principal::from);
    if principal.is_none() {
        tracing::debug!("unknown API key");
    }
    principal
}

/// Document access token from the `acc_token` query parameter or the
/// `X-Access-Token` header.
pub fn access_token(query: Option<&str>, headers: &HeaderMap) -> Option<String> {
    query.map(str::to_string).or_else(|| {
        headers
            .get(ACCESS_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    })
}

/// Role of `principal` with respect to a stored document.
///
/// Administrators are always `Administrator`. The owner presenting the
/// document's token gets `owner_role`. Everyone else acts as their group.
pub fn authenticated_role(
    principal: Option<&Principal>,
    document: &Map<String, Value>,
    token: Option<&str>,
    owner_role: &str,
) -> String {
    let Some(principal) = principal else {
        return ANONYMOUS.to_string();
    };
    if principal.is_admin() {
        return ADMINISTRATOR.to_string();
    }
    let owner = document.get("owner").and_then(Value::as_str);
    let owner_token = document.get("owner_token").and_then(Value::as_str);
    if owner == Some(principal.name.as_str()) && token.is_some() && token == owner_token {
        return owner_role.to_string();
    }
    principal.group.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn settings() -> AuthSettings {
        AuthSettings {
            users: vec![
                ApiUser {
                    name: "broker".into(),
                    key: "broker-key".into(),
                    group: "brokers".into(),
                },
                ApiUser {
                    name: "admin".into(),
                    key: "admin-key".into(),
                    group: ADMINISTRATOR.into(),
                },
            ],
        }
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn basic_and_bearer_credentials() {
        let basic = format!("Basic {}", STANDARD.encode("broker-key:"));
        assert_eq!(
            authenticate(&settings(), &headers(&basic)).unwrap().name,
            "broker"
        );
        assert_eq!(
            authenticate(&settings(), &headers("Bearer admin-key")).unwrap().group,
            ADMINISTRATOR
        );
        assert!(authenticate(&settings(), &headers("Bearer nope")).is_none());
        assert!(authenticate(&settings(), &HeaderMap::new()).is_none());
    }

    #[test]
    fn owner_needs_matching_token() {
        let doc = json!({"owner": "broker", "owner_token": "t0k"});
        let doc = doc.as_object().unwrap();
        let broker = Principal {
            name: "broker".into(),
            group: "brokers".into(),
        };
        assert_eq!(
            authenticated_role(Some(&broker), doc, Some("t0k"), "asset_owner"),
            "asset_owner"
        );
        assert_eq!(
            authenticated_role(Some(&broker), doc, Some("bad"), "asset_owner"),
            "brokers"
        );
        assert_eq!(authenticated_role(None, doc, Some("t0k"), "asset_owner"), ANONYMOUS);
    }
}
