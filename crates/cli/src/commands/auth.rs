//! Sign-in, sign-up and sign-out commands.
//!
//! Input goes through the form validators first; only valid input reaches
//! the session store. Outcome messages come from the store's notifier.

use bankease_core::Identity;
use bankease_session::forms::{LoginForm, RegisterForm};

use super::{CommandError, Context};

/// Sign in with a username and password.
///
/// # Errors
///
/// Returns `CommandError::InvalidInput` for malformed input and
/// `CommandError::LoginFailed` if the backend refuses the credentials.
pub async fn login(context: &Context, form: &LoginForm) -> Result<(), CommandError> {
    form.validate()?;

    if context.session.login(&form.username, &form.password).await {
        Ok(())
    } else {
        Err(CommandError::LoginFailed)
    }
}

/// Create an account, optionally signing in afterwards.
///
/// # Errors
///
/// Returns `CommandError::InvalidInput` for malformed input,
/// `CommandError::RegistrationFailed` if the account is refused, and
/// `CommandError::LoginFailed` if the follow-up sign-in fails.
pub async fn register(
    context: &Context,
    form: &RegisterForm,
    then_login: bool,
) -> Result<(), CommandError> {
    form.validate()?;

    if !context
        .session
        .register(&form.username, &form.email, &form.password)
        .await
    {
        return Err(CommandError::RegistrationFailed);
    }

    if then_login && !context.session.login(&form.username, &form.password).await {
        return Err(CommandError::LoginFailed);
    }

    Ok(())
}

/// Sign out.
pub fn logout(context: &Context) {
    context.session.logout();
}

/// Resolve the stored session and print who is signed in.
#[allow(clippy::print_stdout)]
pub async fn whoami(context: &Context) {
    context.session.check_auth().await;

    match context.session.identity() {
        Some(identity) => print_identity(&identity),
        None => println!("Not signed in"),
    }
}

#[allow(clippy::print_stdout)]
fn print_identity(identity: &Identity) {
    println!("{} ({})", identity.username, identity.plan.badge());
    if let Some(email) = &identity.email {
        println!("  email:   {email}");
    }
    if let Some(id) = identity.id {
        println!("  id:      {id}");
    }
    if let Some(created_at) = identity.created_at {
        println!("  since:   {}", created_at.format("%Y-%m-%d"));
    }
}
