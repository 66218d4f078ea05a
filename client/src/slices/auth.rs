//! Authentication: sign-in, sign-up, password reset and the session lifecycle
//!
//! A successful sign-in caches the profile and the access token in session
//! storage before the fulfilled event is produced; a failed one leaves the
//! session untouched. A sign-in sent before a logout never writes the
//! session, even when its response arrives after the logout completed.
//! Logging out clears the session; the root reducer then resets every slice.

use super::{begin, settle};
use crate::environment::{MarketplaceEnvironment, remote_ack_json};
use crate::session;
use crate::types::{Credentials, PasswordReset, SignUp, SignedIn, User};
use marketplace_core::SmallVec;
use marketplace_core::effect::Effect;
use marketplace_core::http::{ApiRequest, Envelope, Failure, decode_response};
use marketplace_core::reducer::Reducer;
use marketplace_core::slice::{Operation, RequestId, Settled, SliceStatus};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// POST `/auth/signin`
pub const SIGN_IN: Operation = Operation::new("auth/signIn", "Signed in successfully");
/// POST `/auth/signup`
pub const SIGN_UP: Operation = Operation::new("auth/signUp", "Account created successfully");
/// POST `/auth/forgot-password`
pub const FORGOT_PASSWORD: Operation =
    Operation::new("auth/forgotPassword", "Password reset email sent");
/// POST `/auth/reset-password`
pub const RESET_PASSWORD: Operation =
    Operation::new("auth/resetPassword", "Password reset successfully");
/// Read the cached profile from the session
pub const RESTORE_SESSION: Operation = Operation::new("auth/restoreSession", "Session restored");
/// Clear the session
pub const LOG_OUT: Operation = Operation::new("auth/logOut", "Logged out successfully");

/// Message shown when the session cannot be written or cleared
pub const SESSION_FAILURE: &str = "Could not update your session. Please try again.";

/// Message shown when a logout completed while a sign-in was in flight
pub const SIGNED_OUT: &str = "You were signed out while signing in. Please sign in again.";

/// Auth slice state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthState {
    /// Signed-in profile
    pub user: Option<User>,
    /// Request lifecycle
    pub status: SliceStatus,
}

impl AuthState {
    /// Whether a profile is signed in
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Auth slice actions
#[derive(Debug, Clone, PartialEq)]
pub enum AuthAction {
    /// Sign in with email and password
    SignIn {
        /// Correlation id
        request: RequestId,
        /// Credentials
        credentials: Credentials,
    },
    /// Sign-in settled; the session is already written when fulfilled
    SignedIn(Settled<User>),
    /// Create an account
    SignUp {
        /// Correlation id
        request: RequestId,
        /// Account form
        form: SignUp,
    },
    /// Account created
    SignedUp(Settled<()>),
    /// Ask for a password reset email
    ForgotPassword {
        /// Correlation id
        request: RequestId,
        /// Account email
        email: String,
    },
    /// Reset email requested
    ResetEmailSent(Settled<()>),
    /// Set a new password with a reset token
    ResetPassword {
        /// Correlation id
        request: RequestId,
        /// Token and new password
        reset: PasswordReset,
    },
    /// Password reset
    PasswordReset(Settled<()>),
    /// Load the cached profile from the session
    RestoreSession {
        /// Correlation id
        request: RequestId,
    },
    /// Cached profile loaded (`None` when nobody is signed in)
    SessionRestored(Settled<Option<User>>),
    /// Clear the session
    LogOut {
        /// Correlation id
        request: RequestId,
    },
    /// Session cleared
    LoggedOut(Settled<()>),
    /// Clear the banner
    ClearAlert,
    /// Return to the initial state
    Reset,
}

impl AuthAction {
    /// Correlation id of a settled event
    #[must_use]
    pub const fn settled_request(&self) -> Option<RequestId> {
        match self {
            Self::SignedIn(Settled { request, .. })
            | Self::SessionRestored(Settled { request, .. })
            | Self::SignedUp(Settled { request, .. })
            | Self::ResetEmailSent(Settled { request, .. })
            | Self::PasswordReset(Settled { request, .. })
            | Self::LoggedOut(Settled { request, .. }) => Some(*request),
            _ => None,
        }
    }

    /// Whether this event completed a logout
    #[must_use]
    pub const fn is_logged_out(&self) -> bool {
        matches!(self, Self::LoggedOut(settled) if settled.is_fulfilled())
    }
}

/// Auth slice reducer
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthReducer;

impl AuthReducer {
    /// Create a new auth reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for AuthReducer {
    type State = AuthState;
    type Action = AuthAction;
    type Environment = MarketplaceEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let status = &mut state.status;
        let clear = AuthAction::ClearAlert;

        match action {
            AuthAction::SignIn {
                request,
                credentials,
            } => begin(status, &SIGN_IN, request, sign_in(env, request, &credentials)),
            AuthAction::SignedIn(settled) => settle(status, &SIGN_IN, settled, env, clear, |user| {
                state.user = Some(user);
            }),

            AuthAction::SignUp { request, form } => begin(
                status,
                &SIGN_UP,
                request,
                remote_ack_json(
                    env,
                    request,
                    ApiRequest::post("/auth/signup").public(),
                    &form,
                    (),
                    AuthAction::SignedUp,
                ),
            ),
            AuthAction::SignedUp(settled) => settle(status, &SIGN_UP, settled, env, clear, |()| {}),

            AuthAction::ForgotPassword { request, email } => begin(
                status,
                &FORGOT_PASSWORD,
                request,
                remote_ack_json(
                    env,
                    request,
                    ApiRequest::post("/auth/forgot-password").public(),
                    &json!({ "email": email }),
                    (),
                    AuthAction::ResetEmailSent,
                ),
            ),
            AuthAction::ResetEmailSent(settled) => {
                settle(status, &FORGOT_PASSWORD, settled, env, clear, |()| {})
            },

            AuthAction::ResetPassword { request, reset } => begin(
                status,
                &RESET_PASSWORD,
                request,
                remote_ack_json(
                    env,
                    request,
                    ApiRequest::post("/auth/reset-password").public(),
                    &reset,
                    (),
                    AuthAction::PasswordReset,
                ),
            ),
            AuthAction::PasswordReset(settled) => {
                settle(status, &RESET_PASSWORD, settled, env, clear, |()| {})
            },

            AuthAction::RestoreSession { request } => begin(
                status,
                &RESTORE_SESSION,
                request,
                restore_session(env, request),
            ),
            AuthAction::SessionRestored(settled) => {
                settle(status, &RESTORE_SESSION, settled, env, clear, |user| {
                    state.user = user;
                })
            },

            AuthAction::LogOut { request } => {
                begin(status, &LOG_OUT, request, log_out(env, request))
            },
            AuthAction::LoggedOut(settled) => settle(status, &LOG_OUT, settled, env, clear, |()| {
                state.user = None;
            }),

            AuthAction::ClearAlert => {
                status.clear_alert();
                SmallVec::new()
            },
            AuthAction::Reset => {
                *state = AuthState::default();
                SmallVec::new()
            },
        }
    }
}

/// POST the credentials and persist the session before settling
fn sign_in(
    env: &MarketplaceEnvironment,
    request: RequestId,
    credentials: &Credentials,
) -> Effect<AuthAction> {
    let api = Arc::clone(&env.api);
    let storage = Arc::clone(&env.session);
    let guard = Arc::clone(&env.session_guard);
    let epoch = guard.epoch();
    let call = ApiRequest::post("/auth/signin").public().json(credentials);

    Effect::Future(Box::pin(async move {
        let response = match call {
            Ok(call) => decode_response::<SignedIn>(api.execute(call).await),
            Err(e) => Err(Failure::from(&e)),
        };

        let result = response.and_then(|envelope| {
            let signed = &envelope.data;
            let written = guard
                .write_since(epoch, || {
                    session::store_sign_in(storage.as_ref(), &signed.user, &signed.access_token)
                })
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to persist session after sign-in");
                    Failure::new(SESSION_FAILURE)
                })?;
            if !written {
                tracing::debug!(%request, "Dropped sign-in that completed after logout");
                return Err(Failure::new(SIGNED_OUT));
            }
            Ok(envelope.map(|signed| signed.user))
        });

        Some(AuthAction::SignedIn(Settled::new(request, result)))
    }))
}

/// Read the cached profile
fn restore_session(env: &MarketplaceEnvironment, request: RequestId) -> Effect<AuthAction> {
    let storage = Arc::clone(&env.session);

    Effect::Future(Box::pin(async move {
        let cached = session::cached_user(storage.as_ref());
        Some(AuthAction::SessionRestored(Settled::new(
            request,
            Ok(Envelope::new(cached)),
        )))
    }))
}

/// Clear the session, settling once it is gone
fn log_out(env: &MarketplaceEnvironment, request: RequestId) -> Effect<AuthAction> {
    let storage = Arc::clone(&env.session);
    let guard = Arc::clone(&env.session_guard);

    Effect::Future(Box::pin(async move {
        let result = guard.clear(storage.as_ref()).map(|()| Envelope::new(())).map_err(|e| {
            tracing::error!(error = %e, "Failed to clear session");
            Failure::new(SESSION_FAILURE)
        });
        Some(AuthAction::LoggedOut(Settled::new(request, result)))
    }))
}
