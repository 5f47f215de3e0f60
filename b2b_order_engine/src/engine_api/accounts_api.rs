//! Registration, authentication and profile management.
use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;

use crate::{
    account_objects::{
        check_profile_fields,
        ConfirmEmailRequest,
        LoginRequest,
        NewUserRequest,
        PasswordResetConfirmRequest,
        PasswordResetRequest,
        ProfileUpdateRequest,
    },
    db_types::{NewUser, User, UserType},
    events::{EventProducers, PasswordResetRequestedEvent, UserRegisteredEvent},
    helpers::{hash_password, random_token, validate_password, verify_password, FieldCheck, PasswordError},
    traits::{AccountApiError, AccountManagement, UserProfile},
};

pub const DEFAULT_RESET_TOKEN_TTL_HOURS: i64 = 24;
/// Reset keys live for at least an hour and at most 30 days.
pub const MIN_RESET_TOKEN_TTL_HOURS: i64 = 1;
pub const MAX_RESET_TOKEN_TTL_HOURS: i64 = 720;

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn missing_fields(fields: &[(&str, bool)]) -> Result<(), AccountApiError> {
    let missing = fields.iter().filter(|(_, present)| !present).map(|(name, _)| *name).collect::<Vec<_>>();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AccountApiError::ValidationError(format!("{}: This field is required.", missing.join(", "))))
    }
}

fn check_password(check: &mut FieldCheck, password: &str, email: &str) {
    if let Err(problems) = validate_password(password, Some(email)) {
        for problem in problems {
            check.push(format!("password: {problem}"));
        }
    }
}

fn hash(password: &str) -> Result<String, AccountApiError> {
    hash_password(password).map_err(|e: PasswordError| AccountApiError::InternalError(e.to_string()))
}

/// `AccountApi` handles the user account lifecycle: registration and email confirmation, login, password resets and
/// profile changes.
///
/// It never issues access tokens itself. The caller issues a token once [`AccountApi::login`] succeeds and checks
/// it on every request with [`AccountApi::authenticate`].
pub struct AccountApi<B> {
    db: B,
    producers: EventProducers,
    reset_token_ttl: Duration,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, reset_token_ttl: Duration::hours(DEFAULT_RESET_TOKEN_TTL_HOURS) }
    }

    /// Sets how long password reset keys stay valid, clamped to the supported range.
    pub fn with_reset_token_ttl(mut self, ttl: Duration) -> Self {
        let (min, max) = (Duration::hours(MIN_RESET_TOKEN_TTL_HOURS), Duration::hours(MAX_RESET_TOKEN_TTL_HOURS));
        if ttl < min || ttl > max {
            warn!("🔑️ A reset key lifetime of {ttl} is out of range. Clamping it to {min}..{max}.");
        }
        self.reset_token_ttl = ttl.clamp(min, max);
        self
    }

    pub fn reset_token_ttl(&self) -> Duration {
        self.reset_token_ttl
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    /// Creates an inactive account and publishes a [`UserRegisteredEvent`] carrying the email confirmation key.
    pub async fn register(&self, request: NewUserRequest) -> Result<User, AccountApiError> {
        missing_fields(&[("email", request.email.is_some()), ("password", request.password.is_some())])?;
        let email = normalize_email(request.email.as_deref().unwrap_or_default());
        let password = request.password.map(|p| p.into_inner()).unwrap_or_default();
        let mut check = FieldCheck::new();
        check.email("email", &email);
        check_profile_fields(
            &mut check,
            Some(&request.first_name),
            Some(&request.last_name),
            Some(&request.company),
            Some(&request.position),
        );
        check_password(&mut check, &password, &email);
        check.finish().map_err(AccountApiError::ValidationError)?;
        if self.db.fetch_user_by_email(&email).await?.is_some() {
            return Err(AccountApiError::EmailAlreadyRegistered(email));
        }
        let user = NewUser {
            email,
            password_hash: hash(&password)?,
            first_name: request.first_name,
            last_name: request.last_name,
            company: request.company,
            position: request.position,
            user_type: request.user_type,
            is_active: false,
            is_superuser: false,
        };
        let token = random_token();
        let user = self.db.create_user(user, Some(token.clone())).await?;
        info!("🔑️ User #{} ({}) registered as a {}", user.id, user.email, user.user_type);
        self.call_user_registered_hook(&user.email, token).await;
        Ok(user)
    }

    pub async fn confirm_email(&self, request: ConfirmEmailRequest) -> Result<User, AccountApiError> {
        missing_fields(&[("email", request.email.is_some()), ("token", request.token.is_some())])?;
        let email = normalize_email(request.email.as_deref().unwrap_or_default());
        let user = self.db.fetch_user_by_email(&email).await?.ok_or(AccountApiError::UserNotFound)?;
        let stored = self.db.fetch_confirmation_token(user.id).await?;
        if stored.is_none() || stored != request.token {
            debug!("🔑️ Email confirmation for user #{} failed: token mismatch", user.id);
            return Err(AccountApiError::InvalidToken);
        }
        let user = self.db.activate_user(user.id).await?;
        info!("🔑️ User #{} confirmed their email address", user.id);
        Ok(user)
    }

    /// Checks the credentials and returns the user they belong to.
    pub async fn login(&self, request: LoginRequest) -> Result<User, AccountApiError> {
        missing_fields(&[("email", request.email.is_some()), ("password", request.password.is_some())])?;
        let email = normalize_email(request.email.as_deref().unwrap_or_default());
        let user = self.db.fetch_user_by_email(&email).await?.ok_or(AccountApiError::UserNotFound)?;
        let password = request.password.map(|p| p.into_inner()).unwrap_or_default();
        if !verify_password(&password, &user.password_hash) {
            debug!("🔑️ Invalid password for user #{}", user.id);
            return Err(AccountApiError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AccountApiError::AccountInactive);
        }
        Ok(user)
    }

    pub async fn request_password_reset(&self, request: PasswordResetRequest) -> Result<(), AccountApiError> {
        missing_fields(&[("email", request.email.is_some())])?;
        let email = normalize_email(request.email.as_deref().unwrap_or_default());
        let user = self.db.fetch_user_by_email(&email).await?.ok_or(AccountApiError::UserNotFound)?;
        let purged = self.db.purge_password_reset_tokens(Utc::now() - self.reset_token_ttl).await?;
        trace!("🔑️ {purged} stale password reset tokens removed");
        let token = random_token();
        self.db.store_password_reset_token(user.id, &token).await?;
        info!("🔑️ Password reset requested for user #{}", user.id);
        for producer in &self.producers.password_reset_producer {
            let event = PasswordResetRequestedEvent { email: user.email.clone(), token: token.clone() };
            producer.publish_event(event).await;
        }
        Ok(())
    }

    /// Sets a new password using a reset key. All of the user's reset keys and access tokens are invalidated.
    pub async fn confirm_password_reset(&self, request: PasswordResetConfirmRequest) -> Result<User, AccountApiError> {
        missing_fields(&[("token", request.token.is_some()), ("password", request.password.is_some())])?;
        let token = request.token.unwrap_or_default();
        let stored = self.db.fetch_password_reset_token(&token).await?.ok_or(AccountApiError::InvalidToken)?;
        if stored.created_at + self.reset_token_ttl < Utc::now() {
            debug!("🔑️ Password reset token for user #{} has expired", stored.user_id);
            return Err(AccountApiError::InvalidToken);
        }
        let user = self.db.fetch_user_by_id(stored.user_id).await?.ok_or(AccountApiError::UserNotFound)?;
        let password = request.password.map(|p| p.into_inner()).unwrap_or_default();
        let mut check = FieldCheck::new();
        check_password(&mut check, &password, &user.email);
        check.finish().map_err(AccountApiError::ValidationError)?;
        let user = self.db.reset_password(user.id, &hash(&password)?).await?;
        info!("🔑️ Password for user #{} has been reset", user.id);
        Ok(user)
    }

    pub async fn profile(&self, user_id: i64) -> Result<UserProfile, AccountApiError> {
        self.db.fetch_profile(user_id).await?.ok_or(AccountApiError::UserNotFound)
    }

    /// Applies a partial profile update and returns the new profile.
    ///
    /// A new email address deactivates the account until it is confirmed, and publishes a [`UserRegisteredEvent`]
    /// with a fresh confirmation key. `is_active` in the request is ignored.
    pub async fn update_profile(
        &self,
        user_id: i64,
        request: ProfileUpdateRequest,
    ) -> Result<UserProfile, AccountApiError> {
        let current = self.db.fetch_user_by_id(user_id).await?.ok_or(AccountApiError::UserNotFound)?;
        if request.is_active.is_some() {
            debug!("🔑️ Ignoring is_active in profile update for user #{user_id}");
        }
        let mut update = request.basic_update();
        let mut check = FieldCheck::new();
        check_profile_fields(
            &mut check,
            request.first_name.as_ref(),
            request.last_name.as_ref(),
            request.company.as_ref(),
            request.position.as_ref(),
        );
        let new_email = request.email.as_deref().map(normalize_email).filter(|e| *e != current.email);
        if let Some(email) = &new_email {
            check.email("email", email);
        }
        let email_for_password = new_email.clone().unwrap_or_else(|| current.email.clone());
        let password = request.password.map(|p| p.into_inner());
        if let Some(password) = &password {
            check_password(&mut check, password, &email_for_password);
        }
        check.finish().map_err(AccountApiError::ValidationError)?;
        let mut token = None;
        if let Some(email) = new_email {
            if self.db.fetch_user_by_email(&email).await?.is_some() {
                return Err(AccountApiError::EmailAlreadyRegistered(email));
            }
            update.email = Some(email);
            token = Some(random_token());
        }
        if let Some(password) = password {
            update.password_hash = Some(hash(&password)?);
        }
        let user = self.db.update_user(user_id, update, token.clone()).await?;
        debug!("🔑️ Profile of user #{user_id} updated");
        if let Some(token) = token {
            info!("🔑️ User #{user_id} changed their email. Confirmation required.");
            self.call_user_registered_hook(&user.email, token).await;
        }
        self.profile(user_id).await
    }

    /// Deactivates the account. All access tokens issued to the user stop working immediately.
    pub async fn deactivate(&self, user_id: i64) -> Result<User, AccountApiError> {
        let user = self.db.deactivate_user(user_id).await?;
        info!("🔑️ User #{user_id} deactivated their account");
        Ok(user)
    }

    /// Resolves the user behind an access token. Fails if the user no longer exists, is inactive, or if the token
    /// was issued before the user's last credential change.
    pub async fn authenticate(&self, user_id: i64, auth_epoch: i64) -> Result<User, AccountApiError> {
        let user = self.db.fetch_user_by_id(user_id).await?.ok_or(AccountApiError::UserNotFound)?;
        if !user.is_active {
            return Err(AccountApiError::AccountInactive);
        }
        if user.auth_epoch != auth_epoch {
            trace!("🔑️ Token epoch {auth_epoch} for user #{user_id} is stale");
            return Err(AccountApiError::InvalidToken);
        }
        Ok(user)
    }

    /// Makes sure an active superuser with the given email exists, creating one if necessary. An existing account
    /// is left as is.
    pub async fn ensure_superuser(&self, email: &str, password: &str) -> Result<User, AccountApiError> {
        let email = normalize_email(email);
        if let Some(user) = self.db.fetch_user_by_email(&email).await? {
            if !user.is_superuser {
                warn!("🔑️ {email} already exists but is not a superuser. It has not been changed.");
            }
            return Ok(user);
        }
        if let Err(problems) = validate_password(password, Some(&email)) {
            warn!("🔑️ The superuser password is weak: {problems:?}");
        }
        let user = NewUser {
            email,
            password_hash: hash(password)?,
            user_type: UserType::Buyer,
            is_active: true,
            is_superuser: true,
            ..Default::default()
        };
        let user = self.db.create_user(user, None).await?;
        info!("🔑️ Superuser #{} ({}) created", user.id, user.email);
        Ok(user)
    }

    async fn call_user_registered_hook(&self, email: &str, token: String) {
        for producer in &self.producers.user_registered_producer {
            debug!("🔑️ Notifying user registered hook subscribers");
            let event = UserRegisteredEvent { email: email.to_string(), token: token.clone() };
            producer.publish_event(event).await;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reset_token_ttl_is_clamped() {
        let api = AccountApi::new((), EventProducers::default());
        assert_eq!(api.reset_token_ttl(), Duration::hours(DEFAULT_RESET_TOKEN_TTL_HOURS));
        let api = api.with_reset_token_ttl(Duration::hours(48));
        assert_eq!(api.reset_token_ttl(), Duration::hours(48));
        let api = api.with_reset_token_ttl(Duration::weeks(100_000));
        assert_eq!(api.reset_token_ttl(), Duration::hours(MAX_RESET_TOKEN_TTL_HOURS));
        let api = api.with_reset_token_ttl(Duration::hours(-5));
        assert_eq!(api.reset_token_ttl(), Duration::hours(MIN_RESET_TOKEN_TTL_HOURS));
    }
}
