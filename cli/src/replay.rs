//! Scripted session replay.
//!
//! SYSTEM CONTEXT
//! ==============
//! Drives a real `SessionStore` over a deferred `ManualProvider` so that
//! provider notifications, navigation and sign-out can be scripted from JSON
//! and the resulting guard decisions inspected line by line.
//!
//! DESIGN
//! ======
//! After every step the current path is evaluated and redirects are followed
//! the way the browser router would, so each report shows where the user
//! actually ends up.

#[cfg(test)]
#[path = "replay_test.rs"]
mod replay_test;

use infopc::{Identity, ManualProvider, Outcome, ProviderError, RouteTable, SessionState, SessionStore};
use serde::{Deserialize, Serialize};

use crate::CliError;

/// Redirect hops followed before giving up on a path.
const MAX_REDIRECTS: usize = 3;

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Step {
    /// Provider notification; `null` means signed out.
    Emit(Option<Identity>),
    /// Request a path, as if typed into the address bar.
    Navigate(String),
    /// Sign out through the store.
    Logout {},
    /// Arm the provider to fail the next sign-out with this message, then sign out.
    FailLogout(String),
    /// Tear the store down.
    Teardown {},
}

/// State of the session and router after one step.
#[derive(Debug, Serialize)]
pub(crate) struct StepReport {
    pub(crate) step: usize,
    pub(crate) path: String,
    pub(crate) state: SessionState,
    pub(crate) outcome: Outcome,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) redirects: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) logout_error: Option<String>,
    pub(crate) torn_down: bool,
}

/// Parse a JSON array of steps.
///
/// # Errors
///
/// Returns [`CliError::Json`] when the script is not a valid step array.
pub(crate) fn parse_steps(raw: &str) -> Result<Vec<Step>, CliError> {
    Ok(serde_json::from_str(raw)?)
}

/// Evaluate `path` and follow redirects, returning the final path, the
/// settled outcome and every redirect target visited.
///
/// # Errors
///
/// Returns [`CliError::RedirectLoop`] if the outcome is still a redirect
/// after [`MAX_REDIRECTS`] hops.
pub(crate) fn settle(
    routes: &RouteTable,
    state: &SessionState,
    path: &str,
) -> Result<(String, Outcome, Vec<String>), CliError> {
    let mut path = path.to_owned();
    let mut redirects = Vec::new();
    let mut outcome = routes.decide(state, &path);
    while let Some(target) = outcome.redirect_target() {
        if redirects.len() == MAX_REDIRECTS {
            return Err(CliError::RedirectLoop(path));
        }
        path = target.to_owned();
        redirects.push(path.clone());
        outcome = routes.decide(state, &path);
    }
    Ok((path, outcome, redirects))
}

/// Run `steps` against a fresh store, starting at `/` with the session pending.
///
/// # Errors
///
/// Propagates [`CliError::RedirectLoop`] from [`settle`]. Sign-out failures are
/// reported per step, not returned.
pub(crate) async fn run(routes: &RouteTable, steps: Vec<Step>) -> Result<Vec<StepReport>, CliError> {
    let provider = ManualProvider::new().deferred();
    let store = SessionStore::new(provider.clone());
    store.initialize();

    let mut path = "/".to_owned();
    let mut reports = Vec::with_capacity(steps.len());

    for (index, step) in steps.into_iter().enumerate() {
        tracing::debug!(step = index, ?step, "replaying step");
        let mut logout_error = None;
        match step {
            Step::Emit(identity) => provider.emit(identity),
            Step::Navigate(requested) => path = requested,
            Step::Logout {} => {
                logout_error = store.request_logout().await.err().map(|err| err.to_string());
            }
            Step::FailLogout(message) => {
                provider.fail_next_sign_out(ProviderError::Unavailable(message));
                logout_error = store.request_logout().await.err().map(|err| err.to_string());
            }
            Step::Teardown {} => store.teardown(),
        }

        let state = store.state();
        let (settled, outcome, redirects) = settle(routes, &state, &path)?;
        path = settled;
        reports.push(StepReport {
            step: index,
            path: path.clone(),
            state,
            outcome,
            redirects,
            logout_error,
            torn_down: store.is_torn_down(),
        });
    }

    Ok(reports)
}
