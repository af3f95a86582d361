use serde::{Deserialize, Serialize};

/// Who is using the editor. Authentication happens elsewhere; the editor
/// only needs the user id to attribute saved collages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub user_id: Option<String>,
}

impl Session {
    pub fn guest() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn sign_in(&mut self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        log::info!("Signed in as {user_id}");
        self.user_id = Some(user_id);
    }

    pub fn sign_out(&mut self) {
        self.user_id = None;
    }
}
