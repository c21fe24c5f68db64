use std::sync::Arc;

use lazy_static::lazy_static;
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{jwt::JwtKeys, password::CredentialHasher, repo::CredentialStore},
    config::PasswordPolicy,
    error::AuthError,
};

/// Length of passwords generated by the lost-password flow.
pub const GENERATED_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Draws uniformly from `[A-Za-z0-9]` using the OS RNG.
pub fn generate_password(len: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Signin, signup and lost-password over one store, hasher and key set.
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: CredentialHasher,
    keys: Arc<JwtKeys>,
    policy: PasswordPolicy,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: CredentialHasher,
        keys: Arc<JwtKeys>,
        policy: PasswordPolicy,
    ) -> Self {
        Self {
            store,
            hasher,
            keys,
            policy,
        }
    }

    fn check_credentials_shape(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let len = password.chars().count();
        // Same error whichever field failed.
        if !is_valid_email(email) || len < self.policy.min_length || len > self.policy.max_length {
            return Err(AuthError::InvalidCredentialsFormat);
        }
        Ok(())
    }

    /// Returns a freshly signed access token.
    #[instrument(skip(self, password))]
    pub async fn signin(&self, email: &str, password: &str) -> Result<String, AuthError> {
        self.check_credentials_shape(email, password)?;

        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let ok = self
            .hasher
            .verify_blocking(password.to_owned(), user.password_hash.clone())
            .await?;
        if !ok {
            warn!(user_id = user.id, "signin with incorrect password");
            return Err(AuthError::IncorrectPassword);
        }

        let token = self.keys.issue(user.id)?;
        info!(user_id = user.id, "user signed in");
        Ok(token)
    }

    #[instrument(skip(self, password))]
    pub async fn signup(&self, email: &str, password: &str) -> Result<i64, AuthError> {
        self.check_credentials_shape(email, password)?;

        let hash = self.hasher.hash_blocking(password.to_owned()).await?;
        let user = self.store.create(email, &hash).await?;

        info!(user_id = user.id, "user registered");
        Ok(user.id)
    }

    /// Replaces the user's password with a generated one and returns it for delivery.
    #[instrument(skip_all)]
    pub async fn lost_password(&self, email: &str) -> Result<String, AuthError> {
        if !is_valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }

        let password = generate_password(GENERATED_PASSWORD_LEN);
        let hash = self.hasher.hash_blocking(password.clone()).await?;

        if self.store.update_password_hash(email, &hash).await? == 0 {
            return Err(AuthError::UserNotFound);
        }

        info!("password reset");
        Ok(password)
    }
}

#[cfg(test)]
pub(crate) fn test_service(store: Arc<dyn CredentialStore>, keys: Arc<JwtKeys>) -> AuthService {
    AuthService::new(
        store,
        crate::auth::password::fast_hasher(),
        keys,
        PasswordPolicy::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::repo::MemoryCredentialStore, config::JwtConfig};

    fn setup() -> (AuthService, Arc<MemoryCredentialStore>, Arc<JwtKeys>) {
        let store = Arc::new(MemoryCredentialStore::new());
        let keys = Arc::new(JwtKeys::new(&JwtConfig {
            secret: "test-secret".into(),
            ttl_minutes: None,
        }));
        let service = test_service(store.clone(), keys.clone());
        (service, store, keys)
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("user@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn generated_password_uses_alphanumeric_alphabet() {
        let pw = generate_password(GENERATED_PASSWORD_LEN);
        assert_eq!(pw.len(), 8);
        assert!(pw.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn signup_then_signin_yields_token_for_new_user() {
        let (service, _, keys) = setup();
        let id = service.signup("ana@example.com", "hunter22").await.unwrap();
        let token = service.signin("ana@example.com", "hunter22").await.unwrap();
        assert_eq!(keys.verify(&token).unwrap().id, id);
    }

    #[tokio::test]
    async fn shape_errors_are_indistinguishable() {
        let (service, _, _) = setup();
        for (email, pw) in [
            ("not-an-email", "goodpass"),
            ("ana@example.com", "short"),
            ("ana@example.com", "this-password-is-far-too-long"),
            ("", ""),
        ] {
            let err = service.signin(email, pw).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentialsFormat));
            let err = service.signup(email, pw).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentialsFormat));
        }
    }

    #[tokio::test]
    async fn signin_unknown_user_and_wrong_password() {
        let (service, _, _) = setup();
        let err = service.signin("ghost@example.com", "whatever").await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));

        service.signup("ana@example.com", "hunter22").await.unwrap();
        let err = service.signin("ana@example.com", "hunter23").await.unwrap_err();
        assert!(matches!(err, AuthError::IncorrectPassword));
    }

    #[tokio::test]
    async fn duplicate_signup_keeps_existing_hash() {
        let (service, store, _) = setup();
        service.signup("ana@example.com", "hunter22").await.unwrap();
        let before = store.find_by_email("ana@example.com").await.unwrap().unwrap();

        let err = service.signup("ana@example.com", "other-pass").await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));

        let after = store.find_by_email("ana@example.com").await.unwrap().unwrap();
        assert_eq!(before.password_hash, after.password_hash);
        assert!(service.signin("ana@example.com", "hunter22").await.is_ok());
    }

    #[tokio::test]
    async fn lost_password_unknown_email_creates_nothing() {
        let (service, store, _) = setup();
        let err = service.lost_password("ghost@example.com").await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
        assert!(store.find_by_email("ghost@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lost_password_rejects_malformed_email() {
        let (service, _, _) = setup();
        let err = service.lost_password("nope").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail));
    }

    #[tokio::test]
    async fn lost_password_rotates_credentials() {
        let (service, _, _) = setup();
        service.signup("ana@example.com", "hunter22").await.unwrap();

        let fresh = service.lost_password("ana@example.com").await.unwrap();
        assert_eq!(fresh.len(), GENERATED_PASSWORD_LEN);

        let err = service.signin("ana@example.com", "hunter22").await.unwrap_err();
        assert!(matches!(err, AuthError::IncorrectPassword));
        assert!(service.signin("ana@example.com", &fresh).await.is_ok());
    }

    #[tokio::test]
    async fn repeated_signin_tokens_each_verify() {
        let (service, _, keys) = setup();
        let id = service.signup("ana@example.com", "hunter22").await.unwrap();
        for _ in 0..3 {
            let token = service.signin("ana@example.com", "hunter22").await.unwrap();
            assert_eq!(keys.verify(&token).unwrap().id, id);
        }
    }
}
