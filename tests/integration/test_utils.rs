//! Shared helpers for integration tests

use quilt::scheduling::{Action, Scheduler, Session};
use quilt::store::Datastore;
use std::sync::Mutex;
use tempfile::TempDir;

/// Serializes tests that change process environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

pub fn ask(text: &str) -> Action {
    Action::AskSubquestion(text.to_string())
}

pub fn reply(text: &str) -> Action {
    Action::Reply(text.to_string())
}

pub fn unlock(name: &str) -> Action {
    Action::Unlock(name.to_string())
}

pub fn scratch(text: &str) -> Action {
    Action::Scratch(text.to_string())
}

pub fn scheduler() -> Scheduler {
    Scheduler::new(Datastore::new())
}

/// Display of the session's current context
pub fn current(session: &Session<'_>) -> String {
    session
        .current_context()
        .expect("session has a current context")
        .to_string()
}

/// Content of the current context's question
pub fn current_question(session: &Session<'_>) -> String {
    let context = session.current_context().expect("session has a current context");
    let data = context.to_data(session.db()).unwrap();
    data.question
        .content()
        .expect("question is unlocked")
        .to_string()
}

/// Run `f` with the given environment variables set (or removed), restoring
/// the previous values afterwards
pub fn with_env<F, R>(vars: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(key, _)| (key.to_string(), std::env::var(key).ok()))
        .collect();
    for (key, value) in vars {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }

    let result = f();

    for (key, value) in saved {
        match value {
            Some(value) => std::env::set_var(&key, value),
            None => std::env::remove_var(&key),
        }
    }
    result
}

/// Run `f` with XDG_CONFIG_HOME pointed into `test_dir`, so no user-level
/// config file leaks into the test
pub fn with_isolated_config<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let config_home = test_dir.path().join("xdg");
    std::fs::create_dir_all(&config_home).unwrap();
    with_env(
        &[
            ("XDG_CONFIG_HOME", config_home.to_str()),
            ("QUILT_ENV", None),
        ],
        f,
    )
}
