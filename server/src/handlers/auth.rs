use axum::extract::State;
use axum::response::Response;
use axum_extra::extract::CookieJar;

use crate::auth::session::{end_session, removal_cookie, start_session};
use crate::models::account::{ForgotPasswordInput, LoginInput, PasswordReset, RegisterInput};
use crate::services::{accounts, permissions};
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::extract::AppJson;
use crate::utils::response::{created, empty_success, success};

const RESET_REQUESTED: &str =
    "If that email is registered, a password reset link has been sent";

pub async fn register(
    State(state): State<AppState>,
    AppJson(input): AppJson<RegisterInput>,
) -> AppResult<Response> {
    let member = accounts::register(state.store(), input).await?;
    Ok(created(member, "Registration successful. Please log in."))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(input): AppJson<LoginInput>,
) -> AppResult<(CookieJar, Response)> {
    let member = accounts::login(state.store(), input).await?;
    let capabilities = permissions::capabilities_for(state.store(), member.id).await;

    let cookie = start_session(&state, member.id);
    let view = accounts::current_view(member, capabilities);
    Ok((jar.add(cookie), success(view, "Login successful")))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Response) {
    end_session(&state, &jar);
    (
        jar.remove(removal_cookie()),
        empty_success("You have been logged out"),
    )
}

pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(input): AppJson<ForgotPasswordInput>,
) -> AppResult<Response> {
    accounts::forgot_password(&state, input).await?;
    Ok(empty_success(RESET_REQUESTED))
}

pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(input): AppJson<PasswordReset>,
) -> AppResult<Response> {
    accounts::reset_password(&state, input).await?;
    Ok(empty_success("Password has been reset. Please log in."))
}
