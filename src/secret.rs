//! Generated database password
//!
//! When no `db_password` is configured, a 16-character alphanumeric
//! password is generated once and persisted in the local state database,
//! keyed by stack name. Re-resolving for the same stack always returns the
//! stored value.

use anyhow::Result;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use rusqlite::Connection;
use tracing::info;

use crate::state;

/// Length of the generated database password
pub const GENERATED_PASSWORD_LEN: usize = 16;

/// Name the password is stored under in the state database
const DB_PASSWORD_SECRET: &str = "db_password";

/// Generate a password with no special characters.
pub fn generate_password() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// Resolve the database password for a stack.
///
/// A configured password always wins and is never persisted. Otherwise the
/// stored password is reused, or a fresh one is generated and stored.
pub fn resolve_db_password(
    conn: &Connection,
    stack: &str,
    configured: Option<&str>,
) -> Result<String> {
    if let Some(password) = configured {
        return Ok(password.to_string());
    }

    if let Some(stored) = state::get_secret(conn, stack, DB_PASSWORD_SECRET)? {
        return Ok(stored);
    }

    let password = generate_password();
    state::put_secret(conn, stack, DB_PASSWORD_SECRET, &password)?;
    info!(stack, "Generated database password");
    Ok(password)
}
