use tracing::info;

use crate::error::{CatalogError, CatalogResult, EntityKind};
use crate::models::User;

use super::Library;

impl Library {
    /// Register a new member under a caller-chosen id.
    pub fn add_user(&mut self, id: i64, name: &str, email: &str) -> CatalogResult<User> {
        if self.users.contains_key(&id) {
            return Err(CatalogError::DuplicateKey {
                kind: EntityKind::User,
                id,
            });
        }

        let user = User {
            id,
            name: name.to_string(),
            email: email.to_string(),
        };
        self.users.insert(id, user.clone());
        info!(user_id = id, "registered user");
        Ok(user)
    }

    /// Look up a user by id.
    pub fn get_user(&self, id: i64) -> CatalogResult<&User> {
        self.users.get(&id).ok_or(CatalogError::NotFound {
            kind: EntityKind::User,
            id,
        })
    }

    /// Every registered user in registration order.
    pub fn list_users(&self) -> Vec<User> {
        self.users.values().cloned().collect()
    }
}
