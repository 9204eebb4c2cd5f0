use serde::{Deserialize, Serialize};

use super::Collection;

/// Role assigned when sign-up does not name one.
pub const DEFAULT_ROLE: &str = "site_manager";

/// Profile stored for every signed-up user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

impl Collection for UserProfile {
    const PREFIX: &'static str = "user:";
    const NAME: &'static str = "profile";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_defaults_to_site_manager() {
        let profile: UserProfile =
            serde_json::from_value(json!({"id": "u1", "email": "a@b.c"})).unwrap();
        assert_eq!(profile.role, "site_manager");
        assert_eq!(profile.key(), "user:u1");
    }
}
