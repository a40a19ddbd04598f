use infopc::ScreenSet;

use super::*;

fn alice() -> Identity {
    Identity::new("u-1").with_display_address("alice@example.com")
}

// =============================================================
// parse_steps
// =============================================================

#[test]
fn parse_steps_accepts_every_step_form() {
    let raw = r#"[
        {"emit": {"id": "u-1", "display_address": "alice@example.com"}},
        {"emit": null},
        {"navigate": "/tabs/tab3"},
        {"logout": {}},
        {"fail_logout": "offline"},
        {"teardown": {}}
    ]"#;
    let steps = parse_steps(raw).expect("steps should parse");
    assert_eq!(
        steps,
        vec![
            Step::Emit(Some(alice())),
            Step::Emit(None),
            Step::Navigate("/tabs/tab3".into()),
            Step::Logout {},
            Step::FailLogout("offline".into()),
            Step::Teardown {},
        ]
    );
}

#[test]
fn parse_steps_rejects_unknown_step() {
    assert!(matches!(parse_steps(r#"[{"jump": "/"}]"#), Err(CliError::Json(_))));
}

// =============================================================
// settle
// =============================================================

#[test]
fn settle_follows_root_to_default_tab() {
    let routes = RouteTable::default();
    let state = SessionState::resolved(Some(alice()));
    let (path, outcome, redirects) = settle(&routes, &state, "/").expect("settles");
    assert_eq!(path, "/tabs/tab2");
    assert_eq!(redirects, vec!["/tabs".to_owned(), "/tabs/tab2".to_owned()]);
    assert_eq!(outcome.screen_set(), Some(ScreenSet::Tabs));
}

#[test]
fn settle_leaves_loading_in_place() {
    let routes = RouteTable::default();
    let (path, outcome, redirects) = settle(&routes, &SessionState::pending(), "/tabs/tab1").expect("settles");
    assert_eq!(path, "/tabs/tab1");
    assert_eq!(outcome, Outcome::ShowLoading);
    assert!(redirects.is_empty());
}

// =============================================================
// run
// =============================================================

#[tokio::test]
async fn run_reports_loading_until_first_notification() {
    let routes = RouteTable::default();
    let reports = run(&routes, vec![Step::Navigate("/tabs/tab1".into()), Step::Emit(Some(alice()))])
        .await
        .expect("replay runs");

    assert_eq!(reports[0].outcome, Outcome::ShowLoading);
    assert!(reports[0].state.is_loading());

    assert_eq!(reports[1].path, "/tabs/tab1");
    assert_eq!(reports[1].outcome.screen_set(), Some(ScreenSet::Tabs));
}

#[tokio::test]
async fn run_logout_returns_to_auth() {
    let routes = RouteTable::default();
    let reports = run(&routes, vec![Step::Emit(Some(alice())), Step::Logout {}]).await.expect("replay runs");

    let last = &reports[1];
    assert!(last.logout_error.is_none());
    assert!(!last.state.is_authenticated());
    assert_eq!(last.path, "/auth");
    assert_eq!(last.outcome.screen_set(), Some(ScreenSet::Auth));
}

#[tokio::test]
async fn run_failed_logout_keeps_session() {
    let routes = RouteTable::default();
    let reports = run(&routes, vec![Step::Emit(Some(alice())), Step::FailLogout("offline".into())])
        .await
        .expect("replay runs");

    let last = &reports[1];
    let error = last.logout_error.as_deref().expect("logout should fail");
    assert!(error.contains("offline"));
    assert!(last.state.is_authenticated());
    assert_eq!(last.path, "/tabs/tab2");
}

#[tokio::test]
async fn run_ignores_notifications_after_teardown() {
    let routes = RouteTable::default();
    let reports = run(&routes, vec![Step::Emit(Some(alice())), Step::Teardown {}, Step::Emit(None)])
        .await
        .expect("replay runs");

    let last = &reports[2];
    assert!(last.torn_down);
    assert!(last.state.is_authenticated());
}
