//! The signed-in account's profile

use super::{begin, settle};
use crate::environment::{MarketplaceEnvironment, remote, remote_ack_json};
use crate::session;
use crate::types::{PasswordChange, ProfileUpdate, Role, User};
use marketplace_core::SmallVec;
use marketplace_core::effect::Effect;
use marketplace_core::http::{ApiRequest, Failure, decode_response};
use marketplace_core::reducer::Reducer;
use marketplace_core::slice::{Operation, RequestId, Settled, SliceStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// GET `/{role}/profile`
pub const FETCH_PROFILE: Operation =
    Operation::new("user/fetchProfile", "Profile fetched successfully");
/// PUT `/{role}/profile`
pub const UPDATE_PROFILE: Operation =
    Operation::new("user/updateProfile", "Profile updated successfully");
/// PUT `/{role}/password`
pub const CHANGE_PASSWORD: Operation =
    Operation::new("user/changePassword", "Password changed successfully");

/// User slice state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserState {
    /// Profile as last returned by the server
    pub profile: Option<User>,
    /// Request lifecycle
    pub status: SliceStatus,
}

/// User slice actions
#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    /// Load the profile
    FetchProfile {
        /// Correlation id
        request: RequestId,
        /// Endpoint family
        role: Role,
    },
    /// Profile loaded
    ProfileFetched(Settled<User>),
    /// Edit the profile
    UpdateProfile {
        /// Correlation id
        request: RequestId,
        /// Endpoint family
        role: Role,
        /// Changed fields
        update: ProfileUpdate,
    },
    /// Profile edited; the cached session user is already refreshed
    ProfileUpdated(Settled<User>),
    /// Change the password
    ChangePassword {
        /// Correlation id
        request: RequestId,
        /// Endpoint family
        role: Role,
        /// Old and new password
        change: PasswordChange,
    },
    /// Password changed
    PasswordChanged(Settled<()>),
    /// Clear the banner
    ClearAlert,
    /// Return to the initial state
    Reset,
}

impl UserAction {
    /// Correlation id of a settled event
    #[must_use]
    pub const fn settled_request(&self) -> Option<RequestId> {
        match self {
            Self::ProfileFetched(Settled { request, .. })
            | Self::ProfileUpdated(Settled { request, .. })
            | Self::PasswordChanged(Settled { request, .. }) => Some(*request),
            _ => None,
        }
    }
}

/// User slice reducer
#[derive(Debug, Clone, Copy, Default)]
pub struct UserReducer;

impl UserReducer {
    /// Create a new user reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for UserReducer {
    type State = UserState;
    type Action = UserAction;
    type Environment = MarketplaceEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let status = &mut state.status;
        let clear = UserAction::ClearAlert;

        match action {
            UserAction::FetchProfile { request, role } => begin(
                status,
                &FETCH_PROFILE,
                request,
                remote(
                    env,
                    request,
                    ApiRequest::get(format!("/{role}/profile")),
                    UserAction::ProfileFetched,
                ),
            ),
            UserAction::ProfileFetched(settled) => {
                settle(status, &FETCH_PROFILE, settled, env, clear, |user| {
                    state.profile = Some(user);
                })
            },

            UserAction::UpdateProfile {
                request,
                role,
                update,
            } => begin(
                status,
                &UPDATE_PROFILE,
                request,
                update_profile(env, request, role, &update),
            ),
            UserAction::ProfileUpdated(settled) => {
                settle(status, &UPDATE_PROFILE, settled, env, clear, |user| {
                    state.profile = Some(user);
                })
            },

            UserAction::ChangePassword {
                request,
                role,
                change,
            } => begin(
                status,
                &CHANGE_PASSWORD,
                request,
                remote_ack_json(
                    env,
                    request,
                    ApiRequest::put(format!("/{role}/password")),
                    &change,
                    (),
                    UserAction::PasswordChanged,
                ),
            ),
            UserAction::PasswordChanged(settled) => {
                settle(status, &CHANGE_PASSWORD, settled, env, clear, |()| {})
            },

            UserAction::ClearAlert => {
                status.clear_alert();
                SmallVec::new()
            },
            UserAction::Reset => {
                *state = UserState::default();
                SmallVec::new()
            },
        }
    }
}

/// PUT the profile, then refresh the cached session user
///
/// The server may omit the role from the updated profile; the cached role is
/// kept in that case so route guards keep working. Nothing is cached when a
/// logout happened while the request was in flight.
fn update_profile(
    env: &MarketplaceEnvironment,
    request: RequestId,
    role: Role,
    update: &ProfileUpdate,
) -> Effect<UserAction> {
    let api = Arc::clone(&env.api);
    let storage = Arc::clone(&env.session);
    let guard = Arc::clone(&env.session_guard);
    let epoch = guard.epoch();
    let call = ApiRequest::put(format!("/{role}/profile")).json(update);

    Effect::Future(Box::pin(async move {
        let result = match call {
            Ok(call) => decode_response::<User>(api.execute(call).await),
            Err(e) => Err(Failure::from(&e)),
        };

        if let Ok(envelope) = &result {
            let mut cached = envelope.data.clone();
            if cached.role.is_none() {
                cached.role = session::cached_user(storage.as_ref()).and_then(|user| user.role);
            }
            match guard.write_since(epoch, || session::store_user(storage.as_ref(), &cached)) {
                Ok(true) => {},
                Ok(false) => tracing::debug!(%request, "Profile updated after logout, not cached"),
                Err(e) => tracing::warn!(error = %e, "Failed to refresh cached user"),
            }
        }

        Some(UserAction::ProfileUpdated(Settled::new(request, result)))
    }))
}
