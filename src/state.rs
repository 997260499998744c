//! SQLite state for per-stack persisted values
//!
//! The provisioning engine owns resource state; the only thing this tool
//! must persist locally is the generated database password, which is
//! generated once per stack and must never change across plan builds for
//! the deployment's lifetime.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::PathBuf;

/// Get the state database path
fn get_db_path() -> Result<PathBuf> {
    let proj_dirs =
        ProjectDirs::from("", "", "strapi-stack").context("Failed to get project directories")?;

    let state_dir = proj_dirs.data_local_dir();
    fs::create_dir_all(state_dir).context("Failed to create state directory")?;

    Ok(state_dir.join("state.db"))
}

/// Open the state database, creating it if needed
pub fn open_db() -> Result<Connection> {
    let path = get_db_path()?;
    let conn = Connection::open(&path).context("Failed to open state database")?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Create tables if they don't exist
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS stacks (
            name TEXT PRIMARY KEY,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS secrets (
            id INTEGER PRIMARY KEY,
            stack TEXT NOT NULL REFERENCES stacks(name),
            name TEXT NOT NULL,
            value TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(stack, name)
        );

        CREATE INDEX IF NOT EXISTS idx_secrets_stack ON secrets(stack);
        "#,
    )
    .context("Failed to create tables")?;

    Ok(())
}

/// Record a stack if it isn't tracked yet
pub fn ensure_stack(conn: &Connection, stack: &str) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT OR IGNORE INTO stacks (name, created_at) VALUES (?1, ?2)",
        params![stack, now],
    )?;
    Ok(())
}

/// Fetch a persisted secret for a stack, if one exists
pub fn get_secret(conn: &Connection, stack: &str, name: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM secrets WHERE stack = ?1 AND name = ?2",
            params![stack, name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

/// Persist a secret for a stack. Fails if one is already stored under the
/// same name; callers read first.
pub fn put_secret(conn: &Connection, stack: &str, name: &str, value: &str) -> Result<()> {
    ensure_stack(conn, stack)?;
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO secrets (stack, name, value, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![stack, name, value, now],
    )?;
    Ok(())
}

/// A tracked stack and the names of its persisted secrets
#[derive(Debug)]
pub struct StackRow {
    pub name: String,
    pub created_at: String,
    pub secret_names: Vec<String>,
}

/// List tracked stacks (secret values are never returned)
pub fn list_stacks(conn: &Connection) -> Result<Vec<StackRow>> {
    let mut stmt = conn.prepare("SELECT name, created_at FROM stacks ORDER BY name")?;
    let stacks = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut rows = Vec::with_capacity(stacks.len());
    for (name, created_at) in stacks {
        let mut stmt =
            conn.prepare("SELECT name FROM secrets WHERE stack = ?1 ORDER BY name")?;
        let secret_names = stmt
            .query_map([&name], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        rows.push(StackRow {
            name,
            created_at,
            secret_names,
        });
    }
    Ok(rows)
}

/// Drop a stack's persisted state. A later plan build will generate a
/// fresh password, so only do this after the deployment is torn down.
pub fn prune_stack(conn: &Connection, stack: &str) -> Result<usize> {
    let secrets = conn.execute("DELETE FROM secrets WHERE stack = ?1", params![stack])?;
    conn.execute("DELETE FROM stacks WHERE name = ?1", params![stack])?;
    Ok(secrets)
}

/// Print tracked stacks
pub fn list_cli() -> Result<()> {
    let conn = open_db()?;
    let rows = list_stacks(&conn)?;

    if rows.is_empty() {
        println!("No tracked stacks");
        return Ok(());
    }

    println!("{:<20} {:<25} {}", "STACK", "CREATED", "SECRETS");
    println!("{}", "-".repeat(70));
    for row in rows {
        println!(
            "{:<20} {:<25} {}",
            row.name,
            row.created_at,
            row.secret_names.join(", ")
        );
    }
    Ok(())
}

/// Remove a stack's persisted state
pub fn prune_cli(stack: &str) -> Result<()> {
    let conn = open_db()?;
    let removed = prune_stack(&conn, stack)?;
    println!("Pruned {} secret(s) for stack '{}'", removed, stack);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_secret_roundtrip() {
        let conn = test_conn();
        assert!(get_secret(&conn, "dev", "db_password").unwrap().is_none());

        put_secret(&conn, "dev", "db_password", "aB3dE6gH9jK2mN5p").unwrap();
        assert_eq!(
            get_secret(&conn, "dev", "db_password").unwrap().as_deref(),
            Some("aB3dE6gH9jK2mN5p")
        );
    }

    #[test]
    fn test_secrets_scoped_per_stack() {
        let conn = test_conn();
        put_secret(&conn, "dev", "db_password", "devpassword00000").unwrap();
        put_secret(&conn, "prod", "db_password", "prodpassword0000").unwrap();

        assert_eq!(
            get_secret(&conn, "dev", "db_password").unwrap().as_deref(),
            Some("devpassword00000")
        );
        assert_eq!(
            get_secret(&conn, "prod", "db_password").unwrap().as_deref(),
            Some("prodpassword0000")
        );
    }

    #[test]
    fn test_duplicate_secret_rejected() {
        let conn = test_conn();
        put_secret(&conn, "dev", "db_password", "first00000000000").unwrap();
        assert!(put_secret(&conn, "dev", "db_password", "second0000000000").is_err());
    }

    #[test]
    fn test_prune_removes_stack_state() {
        let conn = test_conn();
        put_secret(&conn, "dev", "db_password", "aB3dE6gH9jK2mN5p").unwrap();
        assert_eq!(prune_stack(&conn, "dev").unwrap(), 1);
        assert!(get_secret(&conn, "dev", "db_password").unwrap().is_none());
        assert!(list_stacks(&conn).unwrap().is_empty());
    }
}
