//! Email/password authentication.
//!
//! [`AuthService`] registers accounts, issues and revokes sessions, and
//! broadcasts session changes. Every failure is normalized into
//! [`AuthError`]; causes the user cannot act on are logged and replaced by a
//! generic message.

use chrono::{DateTime, Duration, Utc};
use database::{account, session, Account, Database, DatabaseError, NewAccount, PasswordReset, Session};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::AuthError;
use crate::password;

const INVALID_CREDENTIALS: &str = "Invalid login credentials";
const ALREADY_REGISTERED: &str = "User already registered";
const INVALID_RESET_TOKEN: &str = "El enlace de recuperación no es válido o ha expirado";

/// Capacity of the session-change channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Auth settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Lifetime of a login session.
    pub session_ttl: Duration,
    /// Lifetime of a password reset token.
    pub reset_ttl: Duration,
    /// PBKDF2 iterations for new password hashes.
    pub password_iterations: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::days(7),
            reset_ttl: Duration::hours(1),
            password_iterations: password::DEFAULT_ITERATIONS,
        }
    }
}

/// The signed-in user as seen by the rest of the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<&Account> for AuthUser {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            full_name: account.full_name.clone(),
            avatar_url: account.avatar_url.clone(),
        }
    }
}

/// Sign-up input.
#[derive(Debug, Clone, Deserialize)]
pub struct SignUpData {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Sign-in input.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInData {
    pub email: String,
    pub password: String,
}

/// A successful sign-in: the user and the bearer token identifying the session.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// What changed about a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    UserUpdated,
    PasswordRecovery,
}

/// A session change. `user` is the session's user after the change, so it
/// is `None` for sign-outs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub user: Option<AuthUser>,
}

/// Handle for a callback registered with [`AuthService::on_auth_state_change`].
///
/// The callback stops running when the handle is dropped.
#[derive(Debug)]
pub struct AuthSubscription {
    handle: JoinHandle<()>,
}

impl AuthSubscription {
    /// Stop delivering events to the callback.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Internal failure, converted to [`AuthError`] at the service boundary.
#[derive(Debug)]
enum Failure {
    Rejected(&'static str),
    Database(DatabaseError),
    Hashing(tokio::task::JoinError),
}

impl From<DatabaseError> for Failure {
    fn from(e: DatabaseError) -> Self {
        Failure::Database(e)
    }
}

impl From<tokio::task::JoinError> for Failure {
    fn from(e: tokio::task::JoinError) -> Self {
        Failure::Hashing(e)
    }
}

impl From<Failure> for AuthError {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Rejected(message) => AuthError::new(message),
            Failure::Database(e) => {
                error!(error = %e, "Auth database failure");
                AuthError::internal()
            }
            Failure::Hashing(e) => {
                error!(error = %e, "Password hashing task failed");
                AuthError::internal()
            }
        }
    }
}

/// Email/password authentication over the accounts and sessions tables.
#[derive(Debug, Clone)]
pub struct AuthService {
    db: Database,
    config: AuthConfig,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthService {
    pub fn new(db: Database, config: AuthConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { db, config, events }
    }

    /// Register an account and sign it in.
    pub async fn sign_up(&self, data: SignUpData) -> Result<AuthSession, AuthError> {
        let session = self.try_sign_up(data).await?;
        info!(user_id = %session.user.id, "User signed up");
        self.emit(AuthEventKind::SignedIn, Some(session.user.clone()));
        Ok(session)
    }

    async fn try_sign_up(&self, data: SignUpData) -> Result<AuthSession, Failure> {
        let password_hash = self.hash(data.password).await?;
        let new = NewAccount {
            email: data.email,
            password_hash,
            full_name: Some(data.full_name.trim().to_string()),
        };

        let account = match account::create_account(self.db.pool(), &new).await {
            Ok(account) => account,
            Err(DatabaseError::AlreadyExists { .. }) => {
                return Err(Failure::Rejected(ALREADY_REGISTERED))
            }
            Err(e) => return Err(e.into()),
        };

        self.open_session(&account).await
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, data: SignInData) -> Result<AuthSession, AuthError> {
        let session = self.try_sign_in(data).await?;
        info!(user_id = %session.user.id, "User signed in");
        self.emit(AuthEventKind::SignedIn, Some(session.user.clone()));
        Ok(session)
    }

    async fn try_sign_in(&self, data: SignInData) -> Result<AuthSession, Failure> {
        let account = match account::get_account_by_email(self.db.pool(), &data.email).await {
            Ok(account) => Some(account),
            Err(DatabaseError::NotFound { .. }) => None,
            Err(e) => return Err(e.into()),
        };

        // Unknown emails still pay for one key derivation.
        let stored = account.as_ref().map(|a| a.password_hash.clone());
        let iterations = self.config.password_iterations;
        let valid = tokio::task::spawn_blocking(move || {
            password::verify_sign_in(&data.password, stored.as_deref(), iterations)
        })
        .await?;

        let Some(account) = account else {
            warn!("Sign-in for unknown email");
            return Err(Failure::Rejected(INVALID_CREDENTIALS));
        };
        if !valid {
            warn!(user_id = %account.id, "Sign-in with wrong password");
            return Err(Failure::Rejected(INVALID_CREDENTIALS));
        }

        self.open_session(&account).await
    }

    /// End a session. Unknown tokens are ignored.
    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let removed = session::delete_session(self.db.pool(), token)
            .await
            .map_err(Failure::from)?;

        if removed {
            info!("User signed out");
            self.emit(AuthEventKind::SignedOut, None);
        }
        Ok(())
    }

    /// The user behind a session token, if the session is valid.
    ///
    /// Any failure yields `None`.
    pub async fn get_current_user(&self, token: &str) -> Option<AuthUser> {
        match self.try_current_account(token).await {
            Ok(account) => account.as_ref().map(AuthUser::from),
            Err(e) => {
                warn!(error = %e, "Could not resolve session");
                None
            }
        }
    }

    async fn try_current_account(&self, token: &str) -> database::Result<Option<Account>> {
        let Some(session) = session::get_active_session(self.db.pool(), token, Utc::now()).await?
        else {
            return Ok(None);
        };

        match account::get_account(self.db.pool(), &session.user_id).await {
            Ok(account) => Ok(Some(account)),
            Err(DatabaseError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Issue a password reset token for `email`.
    ///
    /// Succeeds for unknown emails too, so callers cannot tell which
    /// addresses are registered. Returns the token when one was issued.
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AuthError> {
        let account = match account::get_account_by_email(self.db.pool(), email).await {
            Ok(account) => account,
            Err(DatabaseError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(Failure::from(e).into()),
        };

        let now = Utc::now();
        let reset = PasswordReset {
            token: password::generate_token(),
            user_id: account.id.clone(),
            created_at: now,
            expires_at: now + self.config.reset_ttl,
            used_at: None,
        };
        session::create_password_reset(self.db.pool(), &reset)
            .await
            .map_err(Failure::from)?;

        // No mail delivery: the link is only logged.
        info!(
            user_id = %account.id,
            path = %format!("/auth/reset-password/confirm?token={}", reset.token),
            "Password reset requested"
        );
        self.emit(AuthEventKind::PasswordRecovery, Some(AuthUser::from(&account)));

        Ok(Some(reset.token))
    }

    /// Set a new password using a reset token. Signs out every session of
    /// the account.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        Ok(self.try_reset_password(token, new_password).await?)
    }

    async fn try_reset_password(&self, token: &str, new_password: &str) -> Result<(), Failure> {
        let pool = self.db.pool();
        let Some(reset) = session::consume_password_reset(pool, token, Utc::now()).await? else {
            return Err(Failure::Rejected(INVALID_RESET_TOKEN));
        };

        let password_hash = self.hash(new_password.to_string()).await?;
        account::update_password_hash(pool, &reset.user_id, &password_hash).await?;
        let revoked = session::delete_user_sessions(pool, &reset.user_id).await?;

        info!(user_id = %reset.user_id, revoked, "Password reset");
        let account = account::get_account(pool, &reset.user_id).await?;
        self.emit(AuthEventKind::UserUpdated, Some(AuthUser::from(&account)));
        Ok(())
    }

    /// Receive every session change from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Run `callback` for every session change until the returned handle is
    /// dropped. Must be called inside a tokio runtime.
    pub fn on_auth_state_change<F>(&self, mut callback: F) -> AuthSubscription
    where
        F: FnMut(AuthEvent) + Send + 'static,
    {
        let mut receiver = self.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => callback(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Auth subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        AuthSubscription { handle }
    }

    /// Announce a profile change made elsewhere (e.g. by the data-access service).
    pub fn notify_user_updated(&self, user: AuthUser) {
        self.emit(AuthEventKind::UserUpdated, Some(user));
    }

    fn emit(&self, kind: AuthEventKind, user: Option<AuthUser>) {
        // No subscribers is fine.
        let _ = self.events.send(AuthEvent { kind, user });
    }

    async fn hash(&self, password: String) -> Result<String, Failure> {
        let iterations = self.config.password_iterations;
        let hash = tokio::task::spawn_blocking(move || password::hash_password(&password, iterations))
            .await?;
        Ok(hash)
    }

    async fn open_session(&self, account: &Account) -> Result<AuthSession, Failure> {
        let now = Utc::now();
        let session = Session {
            token: password::generate_token(),
            user_id: account.id.clone(),
            created_at: now,
            expires_at: now + self.config.session_ttl,
        };
        session::create_session(self.db.pool(), &session).await?;

        Ok(AuthSession {
            user: AuthUser::from(account),
            token: session.token,
            expires_at: session.expires_at,
        })
    }
}
