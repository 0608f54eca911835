use validator::Validate;

use crate::auth::password::{hash_password, verify_against_dummy, verify_password};
use crate::auth::random_token;
use crate::auth::session::end_all_sessions;
use crate::models::account::{
    ForgotPasswordInput, LoginInput, PasswordChange, PasswordReset, RegisterInput,
};
use crate::models::activity::Action;
use crate::models::member::{CurrentMemberView, Member, NewMember, ProfileUpdate};
use crate::models::permission::Capabilities;
use crate::services::activity;
use crate::state::AppState;
use crate::store::Store;
use crate::utils::error::{AppError, AppResult};

const INVALID_LOGIN: &str = "Invalid username or password";

pub async fn register(store: &dyn Store, input: RegisterInput) -> AppResult<Member> {
    let input = input.normalized();
    input.validate()?;

    let new_member = NewMember {
        password_hash: hash_password(&input.password)?,
        username: input.username,
        email: input.email,
        first_name: input.first_name,
        last_name: input.last_name,
    };

    let member = store
        .create_member(&new_member)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "Username or email already exists"))?;

    tracing::info!(member = %member.username, "Member registered");
    activity::record(store, Some(member.id), Action::Registered, Some(&member.username)).await;
    Ok(member)
}

/// Checks credentials. Unknown usernames and wrong passwords are
/// indistinguishable to the caller, in message and in hashing work.
pub async fn login(store: &dyn Store, input: LoginInput) -> AppResult<Member> {
    let username = input.username.trim();
    let member = match store.member_by_username(username).await? {
        Some(member) if verify_password(&input.password, &member.password_hash) => member,
        Some(_) => return Err(AppError::AuthError(INVALID_LOGIN.to_string())),
        None => {
            verify_against_dummy(&input.password);
            return Err(AppError::AuthError(INVALID_LOGIN.to_string()));
        }
    };

    tracing::info!(member = %member.username, "Member logged in");
    activity::record(store, Some(member.id), Action::LoggedIn, None).await;
    Ok(member)
}

pub fn current_view(member: Member, capabilities: Capabilities) -> CurrentMemberView {
    CurrentMemberView {
        role: capabilities.role(),
        permissions: capabilities,
        member,
    }
}

pub async fn update_profile(
    store: &dyn Store,
    member: &Member,
    update: ProfileUpdate,
) -> AppResult<Member> {
    let update = update.normalized();
    update.validate()?;

    store
        .update_profile(member.id, &update)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "Email is already in use"))?
        .ok_or_else(|| AppError::NotFound("Member not found".to_string()))
}

pub async fn change_password(
    store: &dyn Store,
    member: &Member,
    change: PasswordChange,
) -> AppResult<()> {
    change.validate()?;

    if !verify_password(&change.current_password, &member.password_hash) {
        return Err(AppError::ValidationError(
            "Current password is incorrect".to_string(),
        ));
    }

    let hash = hash_password(&change.new_password)?;
    store.set_password_hash(member.id, &hash).await?;
    tracing::info!(member = %member.username, "Password changed");
    Ok(())
}

/// Issues a reset token when the email is known. Callers always answer the
/// same way so the endpoint cannot be used to enumerate accounts.
pub async fn forgot_password(state: &AppState, input: ForgotPasswordInput) -> AppResult<()> {
    let email = input.email.trim();
    let Some(member) = state.store().member_by_email(email).await? else {
        tracing::debug!("Password reset requested for unknown email");
        return Ok(());
    };

    let token = random_token();
    state.reset_tokens.insert(token.clone(), member.id);
    tracing::info!(member = %member.username, "Password reset token issued");

    #[cfg(debug_assertions)]
    tracing::debug!(
        "Password reset link: {}/reset-password?token={}",
        state.config.public_base_url,
        token
    );

    Ok(())
}

pub async fn reset_password(state: &AppState, reset: PasswordReset) -> AppResult<()> {
    reset.validate()?;

    let member_id = state
        .reset_tokens
        .take(&reset.token)
        .ok_or_else(|| AppError::ValidationError("Invalid or expired reset token".to_string()))?;

    let hash = hash_password(&reset.new_password)?;
    if !state.store().set_password_hash(member_id, &hash).await? {
        return Err(AppError::NotFound("Member not found".to_string()));
    }

    end_all_sessions(state, member_id);
    tracing::info!(%member_id, "Password reset");
    activity::record(state.store(), Some(member_id), Action::PasswordReset, None).await;
    Ok(())
}
