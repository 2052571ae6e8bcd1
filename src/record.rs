use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A session document: a JSON object with arbitrary keys.
///
/// Authenticated sessions carry the owning user under `passport.user`, which
/// is what the per-user session index is keyed by.
///
/// ```rust
/// use redis_session_store::SessionRecord;
/// use serde_json::json;
///
/// let record = SessionRecord::try_from(json!({
///     "passport": { "user": "alice" },
///     "cart": [1, 2, 3],
/// }))
/// .unwrap();
/// assert_eq!(record.user_id().as_deref(), Some("alice"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionRecord(Map<String, Value>);

impl SessionRecord {
    /// Create an empty session record.
    pub fn new() -> Self {
        Self::default()
    }

    /// The user owning this session, taken from `passport.user`. String and
    /// number values count; anything else (including an empty string)
    /// means the session isn't authenticated.
    ///
    /// Users serialized as objects or booleans have no usable index key, so
    /// such sessions are never indexed, and are pruned from a user's index
    /// if they show up in it.
    pub fn user_id(&self) -> Option<String> {
        match self.0.get("passport")?.get("user")? {
            Value::String(user) if !user.is_empty() => Some(user.to_owned()),
            Value::Number(user) => Some(user.to_string()),
            _ => None,
        }
    }

    /// Set `passport.user`, replacing a non-object `passport` value if needed.
    pub fn set_user_id(&mut self, user_id: impl Into<String>) {
        let passport = self
            .0
            .entry("passport")
            .or_insert_with(|| Value::Object(Map::new()));
        if !passport.is_object() {
            *passport = Value::Object(Map::new());
        }
        if let Value::Object(passport) = passport {
            passport.insert("user".to_owned(), Value::String(user_id.into()));
        }
    }

    /// The `sid` attached by an index query, if any.
    pub fn sid(&self) -> Option<&str> {
        self.0.get("sid").and_then(Value::as_str)
    }

    /// Unwrap into the underlying JSON object.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Parse a stored value. Anything that isn't a JSON object is rejected.
    pub(crate) fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub(crate) fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }
}

impl Deref for SessionRecord {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for SessionRecord {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Map<String, Value>> for SessionRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for SessionRecord {
    type Error = serde_json::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_case::test_case;

    use super::*;

    fn record(value: Value) -> SessionRecord {
        SessionRecord::try_from(value).unwrap()
    }

    #[test_case(json!({"passport": {"user": "u1"}}) => Some("u1".to_owned()); "string user")]
    #[test_case(json!({"passport": {"user": 42}}) => Some("42".to_owned()); "numeric user")]
    #[test_case(json!({"passport": {"user": ""}}) => None; "empty user")]
    #[test_case(json!({"passport": {"user": null}}) => None; "null user")]
    #[test_case(json!({"passport": {"user": true}}) => None; "boolean user")]
    #[test_case(json!({"passport": {"user": {"id": 7}}}) => None; "object user")]
    #[test_case(json!({"passport": {}}) => None; "logged out")]
    #[test_case(json!({"passport": 0}) => None; "passport not an object")]
    #[test_case(json!({"cookie": {"maxAge": 1000}}) => None; "anonymous")]
    fn user_id(value: Value) -> Option<String> {
        record(value).user_id()
    }

    #[test]
    fn set_user_id_replaces_invalid_passport() {
        let mut session = record(json!({"passport": "nope", "views": 3}));
        session.set_user_id("u2");
        assert_eq!(session.user_id().as_deref(), Some("u2"));
        assert_eq!(session.get("views"), Some(&json!(3)));
    }

    #[test]
    fn into_inner_keeps_all_fields() {
        let map = record(json!({"passport": {"user": "u3"}, "views": 1})).into_inner();
        assert_eq!(Value::Object(map), json!({"passport": {"user": "u3"}, "views": 1}));
    }

    #[test]
    fn parse_rejects_non_objects() {
        assert!(SessionRecord::parse("{\"a\":1}").is_ok());
        assert!(SessionRecord::parse("42").is_err());
        assert!(SessionRecord::parse("not json").is_err());
    }
}
