use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{AdminUpdateUser, RegisterRequest, UpdateProfile, User, UserResponse};
use crate::repository::UserRepository;

/// Service layer for User business logic
#[derive(Clone)]
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Register a new user.
    ///
    /// Credential policy first, then uniqueness pre-checks, then the hashed
    /// insert. The store's unique constraints remain the authoritative
    /// enforcement.
    pub async fn register(&self, input: RegisterRequest) -> UserResult<UserResponse> {
        input
            .validate()
            .map_err(|e| UserError::Validation(e.to_string()))?;
        validate_password(&input.password)?;

        if self.repository.username_taken(&input.username, None).await? {
            return Err(UserError::DuplicateUsername(input.username));
        }
        if self.repository.email_taken(&input.email, None).await? {
            return Err(UserError::DuplicateEmail(input.email));
        }

        let password_hash = self.hash_password(&input.password)?;
        let user = User::new(
            input.username,
            input.email,
            input.first_name,
            input.last_name,
            password_hash,
        );

        let created = self.repository.create(user).await?;
        Ok(created.into())
    }

    /// Verify credentials for login.
    ///
    /// An unknown username and a wrong password are indistinguishable to the
    /// caller.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> UserResult<UserResponse> {
        let user = self
            .repository
            .get_by_username(username)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !self.verify_password(password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }

        Ok(user.into())
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: Uuid) -> UserResult<UserResponse> {
        let user = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        Ok(user.into())
    }

    /// List all users (admin)
    pub async fn list_users(&self) -> UserResult<Vec<UserResponse>> {
        let users = self.repository.list().await?;
        Ok(users.into_iter().map(|u| u.into()).collect())
    }

    /// Update the caller's own profile, all-or-nothing.
    ///
    /// Check order matters: credential policy, then name staging, then the
    /// uniqueness guard for username and email (each skipped when the value
    /// is absent or unchanged). Nothing is persisted until every check has
    /// passed, then the staged user is written in one update.
    pub async fn update_profile(&self, id: Uuid, input: UpdateProfile) -> UserResult<UserResponse> {
        input
            .validate()
            .map_err(|e| UserError::Validation(e.to_string()))?;

        let mut staged = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        if let Some(ref password) = input.password {
            validate_password(password)?;
            staged.password_hash = self.hash_password(password)?;
        }

        if let Some(first_name) = input.first_name {
            staged.first_name = first_name;
        }
        if let Some(last_name) = input.last_name {
            staged.last_name = last_name;
        }

        if let Some(username) = input.username {
            if username != staged.username {
                if self
                    .repository
                    .username_taken(&username, Some(id))
                    .await?
                {
                    return Err(UserError::DuplicateUsername(username));
                }
                staged.username = username;
            }
        }

        if let Some(email) = input.email {
            if email != staged.email {
                if self.repository.email_taken(&email, Some(id)).await? {
                    return Err(UserError::DuplicateEmail(email));
                }
                staged.email = email;
            }
        }

        staged.updated_at = chrono::Utc::now();

        let updated = self.repository.update(staged).await?;
        Ok(updated.into())
    }

    /// Update a user as an administrator.
    ///
    /// Sets the admin flag and optionally reassigns username/email with the
    /// uniqueness guard excluding the user being updated; setting a field to
    /// its current value is a no-op, not a conflict.
    pub async fn admin_update_user(
        &self,
        id: Uuid,
        input: AdminUpdateUser,
    ) -> UserResult<UserResponse> {
        input
            .validate()
            .map_err(|e| UserError::Validation(e.to_string()))?;

        let mut staged = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        staged.is_admin = input.is_admin;

        if let Some(username) = input.username {
            if username != staged.username {
                if self
                    .repository
                    .username_taken(&username, Some(id))
                    .await?
                {
                    return Err(UserError::DuplicateUsername(username));
                }
                staged.username = username;
            }
        }

        if let Some(email) = input.email {
            if email != staged.email {
                if self.repository.email_taken(&email, Some(id)).await? {
                    return Err(UserError::DuplicateEmail(email));
                }
                staged.email = email;
            }
        }

        staged.updated_at = chrono::Utc::now();

        let updated = self.repository.update(staged).await?;
        Ok(updated.into())
    }

    /// Delete a user (admin)
    pub async fn delete_user(&self, id: Uuid) -> UserResult<()> {
        if !self.repository.delete(id).await? {
            return Err(UserError::NotFound(id));
        }
        Ok(())
    }

    // Password helpers

    fn hash_password(&self, password: &str) -> UserResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::PasswordHash(e.to_string()))
    }

    fn verify_password(&self, password: &str, hash: &str) -> UserResult<bool> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

/// Credential policy: at least one letter, at least one digit, length >= 8.
fn validate_password(password: &str) -> UserResult<()> {
    let long_enough = password.len() >= 8;
    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && has_letter && has_digit {
        Ok(())
    } else {
        Err(UserError::WeakPassword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryUserRepository, MockUserRepository};
    use mockall::predicate::eq;

    fn register_input(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password: "abcdefg1".to_string(),
        }
    }

    fn stored_user(id: Uuid, username: &str, email: &str) -> User {
        User {
            id,
            username: username.to_string(),
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password_hash: "hashed".to_string(),
            is_admin: false,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_password_policy() {
        // Seven letters and a digit, length 8: passes
        assert!(validate_password("abcdefg1").is_ok());
        // No digit
        assert!(matches!(
            validate_password("abcdefgh"),
            Err(UserError::WeakPassword)
        ));
        // Too short
        assert!(matches!(
            validate_password("a1"),
            Err(UserError::WeakPassword)
        ));
        // No letter
        assert!(matches!(
            validate_password("12345678"),
            Err(UserError::WeakPassword)
        ));
    }

    #[tokio::test]
    async fn test_register_weak_password_checked_before_uniqueness() {
        // No expectations: a weak password must abort before any repo call
        let mock_repo = MockUserRepository::new();
        let service = UserService::new(mock_repo);

        let mut input = register_input("alice", "alice@example.com");
        input.password = "short".to_string();

        let result = service.register(input).await;
        assert!(matches!(result, Err(UserError::WeakPassword)));
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_username_taken()
            .with(eq("alice"), eq(None))
            .returning(|_, _| Ok(true));

        let service = UserService::new(mock_repo);
        let result = service
            .register(register_input("alice", "alice@example.com"))
            .await;

        assert!(matches!(result, Err(UserError::DuplicateUsername(_))));
    }

    #[tokio::test]
    async fn test_update_profile_to_own_username_skips_guard() {
        let id = Uuid::now_v7();
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_get_by_id()
            .with(eq(id))
            .returning(move |id| Ok(Some(stored_user(id, "alice", "alice@example.com"))));
        // No expect_username_taken: the guard must not run for an unchanged
        // username
        mock_repo.expect_update().returning(|user| Ok(user));

        let service = UserService::new(mock_repo);
        let updated = service
            .update_profile(
                id,
                UpdateProfile {
                    username: Some("alice".to_string()),
                    first_name: Some("Alicia".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.username, "alice");
        assert_eq!(updated.first_name, "Alicia");
    }

    #[tokio::test]
    async fn test_update_profile_username_conflict_persists_nothing() {
        let id = Uuid::now_v7();
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_get_by_id()
            .returning(move |id| Ok(Some(stored_user(id, "alice", "alice@example.com"))));
        mock_repo
            .expect_username_taken()
            .with(eq("bob"), eq(Some(id)))
            .returning(|_, _| Ok(true));
        // No expect_update: the conflict must abort before persisting

        let service = UserService::new(mock_repo);
        let result = service
            .update_profile(
                id,
                UpdateProfile {
                    username: Some("bob".to_string()),
                    first_name: Some("Alicia".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(UserError::DuplicateUsername(_))));
    }

    #[tokio::test]
    async fn test_update_profile_weak_password_aborts_early() {
        let id = Uuid::now_v7();
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_get_by_id()
            .returning(move |id| Ok(Some(stored_user(id, "alice", "alice@example.com"))));
        // Neither the uniqueness guard nor update may run

        let service = UserService::new(mock_repo);
        let result = service
            .update_profile(
                id,
                UpdateProfile {
                    password: Some("weak".to_string()),
                    username: Some("bob".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(UserError::WeakPassword)));
    }

    #[tokio::test]
    async fn test_admin_update_email_conflict() {
        let id = Uuid::now_v7();
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_get_by_id()
            .returning(move |id| Ok(Some(stored_user(id, "alice", "alice@example.com"))));
        mock_repo
            .expect_email_taken()
            .with(eq("bob@example.com"), eq(Some(id)))
            .returning(|_, _| Ok(true));

        let service = UserService::new(mock_repo);
        let result = service
            .admin_update_user(
                id,
                AdminUpdateUser {
                    is_admin: true,
                    username: None,
                    email: Some("bob@example.com".to_string()),
                },
            )
            .await;

        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_register_then_login_round_trip() {
        let service = UserService::new(InMemoryUserRepository::new());

        let registered = service
            .register(register_input("alice", "alice@example.com"))
            .await
            .unwrap();
        assert!(!registered.is_admin);

        let verified = service
            .verify_credentials("alice", "abcdefg1")
            .await
            .unwrap();
        assert_eq!(verified.id, registered.id);

        let result = service.verify_credentials("alice", "wrong-pass1").await;
        assert!(matches!(result, Err(UserError::InvalidCredentials)));

        let result = service.verify_credentials("nobody", "abcdefg1").await;
        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }
}
