// src/db/schema.rs

//! Database schema definitions and migrations for release lines
//!
//! This module defines the SQLite schema for the three record tables and
//! provides a migration system to evolve the schema over time.

use crate::error::{Error, Result};
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the schema version tracking table
fn init_schema_version(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    init_schema_version(conn)?;

    let version = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )?;

    Ok(version)
}

/// Set the schema version
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Apply all pending migrations to bring the database up to date
pub fn migrate(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    debug!("Current schema version: {}", current_version);

    if current_version >= SCHEMA_VERSION {
        debug!("Schema is up to date");
        return Ok(());
    }

    for version in (current_version + 1)..=SCHEMA_VERSION {
        info!("Applying migration to version {}", version);
        apply_migration(conn, version)?;
        set_schema_version(conn, version)?;
    }

    info!(
        "Schema migration complete. Now at version {}",
        SCHEMA_VERSION
    );
    Ok(())
}

/// Apply a specific migration version
fn apply_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        _ => Err(Error::InitError(format!(
            "Unknown migration version: {}",
            version
        ))),
    }
}

/// Initial schema - Version 1
///
/// Creates the release-line tables:
/// - release_lines: one row per (pkg, version), linked by previous_version
/// - release_line_heads: one row per pkg, the most recently created version
/// - release_line_deps: dependents recorded against a (pkg, version)
///
/// The tables are intentionally not linked by foreign keys; heads may point
/// at deleted versions and dependents may be recorded before their release.
fn migrate_v1(conn: &Connection) -> Result<()> {
    debug!("Creating schema version 1");

    conn.execute_batch(
        "
        -- Release lines: the backward-linked version chain of each package
        CREATE TABLE release_lines (
            pkg TEXT NOT NULL,
            version TEXT NOT NULL,
            previous_version TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (pkg, version)
        );

        -- Heads: last-write-wins pointer to the newest version of a package
        CREATE TABLE release_line_heads (
            pkg TEXT PRIMARY KEY,
            version TEXT NOT NULL,
            previous_version TEXT,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        -- Dependents: packages built against a specific release
        CREATE TABLE release_line_deps (
            pkg TEXT NOT NULL,
            version TEXT NOT NULL,
            dependent TEXT NOT NULL,
            dependent_version TEXT NOT NULL,
            PRIMARY KEY (pkg, version, dependent)
        );

        CREATE INDEX idx_release_line_deps_dependent ON release_line_deps(dependent);
        ",
    )?;

    info!("Schema version 1 created successfully");
    Ok(())
}
