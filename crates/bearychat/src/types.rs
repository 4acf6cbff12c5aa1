use serde::{Deserialize, Serialize};

/// A BearyChat team member.
///
/// Only `id` is needed to tell whether an RTM message came from this user;
/// the remaining fields are carried when the server provides them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

impl From<&str> for User {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_server_user_object() {
        let json = r#"{"id":"=bw52O","name":"bot","full_name":"Bot","team_id":"=bw12"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "=bw52O");
        assert_eq!(user.name.as_deref(), Some("bot"));
        assert!(user.email.is_none());
    }

    #[test]
    fn optional_fields_are_omitted() {
        let json = serde_json::to_string(&User::new("1")).unwrap();
        assert_eq!(json, r#"{"id":"1"}"#);
    }
}
