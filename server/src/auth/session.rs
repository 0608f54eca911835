//! Cookie sessions and the extractors that resolve them to a member.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::auth::random_token;
use crate::config::Config;
use crate::models::member::Member;
use crate::models::permission::{Capabilities, Capability, Role};
use crate::services::permissions::capabilities_for;
use crate::state::AppState;
use crate::utils::error::AppError;

pub const SESSION_COOKIE: &str = "session";

/// Registers a new session for `member_id` and returns the cookie carrying it.
pub fn start_session(state: &AppState, member_id: Uuid) -> Cookie<'static> {
    let token = random_token();
    state.sessions.insert(token.clone(), member_id);
    session_cookie(token, &state.config)
}

pub fn end_session(state: &AppState, jar: &CookieJar) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.remove(&cookie.value().to_string());
    }
}

/// Ends every session the member holds, e.g. after a password reset.
pub fn end_all_sessions(state: &AppState, member_id: Uuid) {
    state.sessions.remove_where(|id| *id == member_id);
}

fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(config.production)
        .same_site(SameSite::Lax)
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// The signed-in member, with capabilities freshly read for this request.
#[derive(Debug, Clone)]
pub struct CurrentMember {
    pub member: Member,
    pub capabilities: Capabilities,
}

impl CurrentMember {
    pub fn id(&self) -> Uuid {
        self.member.id
    }

    pub fn role(&self) -> Role {
        self.capabilities.role()
    }

    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.capabilities.allows(capability) {
            Ok(())
        } else {
            tracing::warn!(
                member = %self.member.username,
                %capability,
                "Permission denied"
            );
            Err(AppError::Forbidden(format!(
                "You do not have permission to {}",
                describe(capability)
            )))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require(Capability::EditMembers)
    }
}

fn describe(capability: Capability) -> &'static str {
    match capability {
        Capability::EditMembers => "manage members",
        Capability::PostEvents => "post events",
        Capability::ManageVehicles => "manage vehicles",
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentMember {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or_else(|| AppError::AuthError("Please log in".to_string()))?;

        let member_id = state
            .sessions
            .get(&token)
            .ok_or_else(|| AppError::AuthError("Session expired, please log in again".to_string()))?;

        let Some(member) = state.store().member_by_id(member_id).await? else {
            state.sessions.remove(&token);
            return Err(AppError::AuthError("Please log in".to_string()));
        };

        let capabilities = capabilities_for(state.store(), member.id).await;

        Ok(Self {
            member,
            capabilities,
        })
    }
}

/// Like [`CurrentMember`] but anonymous requests pass through as `None`.
#[derive(Debug, Clone)]
pub struct OptionalMember(pub Option<CurrentMember>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalMember {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentMember::from_request_parts(parts, state).await {
            Ok(member) => Ok(Self(Some(member))),
            Err(AppError::AuthError(_)) => Ok(Self(None)),
            Err(e) => Err(e),
        }
    }
}
