//! Backend health and local session summary.

use super::{CommandError, Context};

/// Print backend reachability and the state of the stored session.
///
/// # Errors
///
/// Returns `CommandError::Api` if the backend is down; the summary is still
/// printed first.
pub async fn show(context: &Context) -> Result<(), CommandError> {
    let health = context.api.health().await;
    context.session.check_auth().await;
    let state = context.session.state();

    let backend = match &health {
        Ok(()) => "up".to_owned(),
        Err(e) => format!("down ({e})"),
    };
    let storage = context
        .storage_path
        .as_ref()
        .map_or_else(|| "none".to_owned(), |path| path.display().to_string());
    let session = state
        .identity()
        .map_or_else(|| "signed out".to_owned(), |i| format!("signed in as {}", i.username));

    #[allow(clippy::print_stdout)]
    {
        println!("backend: {} {backend}", context.api.base_url());
        println!("storage: {storage}");
        println!("session: {session}");
    }

    health.map_err(CommandError::Api)
}
