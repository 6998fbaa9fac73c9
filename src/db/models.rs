// src/db/models.rs

//! SQLite persistence for release-line records
//!
//! This module provides methods for creating, reading and deleting the
//! `release_lines`, `release_line_heads` and `release_line_deps` rows behind
//! each logical record kind. Every write is an upsert: writing an existing key
//! overwrites it.

use crate::error::Result;
use crate::record::{Dependent, ReleaseHead, ReleaseVersion};
use rusqlite::{Connection, OptionalExtension, Row, params};

impl ReleaseVersion {
    /// Insert or overwrite this release version
    pub fn upsert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO release_lines (pkg, version, previous_version)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(pkg, version) DO UPDATE SET previous_version = excluded.previous_version",
            params![&self.pkg, &self.version, &self.previous_version],
        )?;
        Ok(())
    }

    /// Find a release version by package and version
    pub fn find(conn: &Connection, pkg: &str, version: &str) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT pkg, version, previous_version FROM release_lines
             WHERE pkg = ?1 AND version = ?2",
        )?;

        let release = stmt
            .query_row(params![pkg, version], Self::from_row)
            .optional()?;

        Ok(release)
    }

    /// Find every recorded version of a package, oldest first
    pub fn find_by_pkg(conn: &Connection, pkg: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT pkg, version, previous_version FROM release_lines
             WHERE pkg = ?1 ORDER BY created_at, rowid",
        )?;

        let releases = stmt
            .query_map([pkg], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(releases)
    }

    /// Delete a release version
    pub fn delete(conn: &Connection, pkg: &str, version: &str) -> Result<()> {
        conn.execute(
            "DELETE FROM release_lines WHERE pkg = ?1 AND version = ?2",
            params![pkg, version],
        )?;
        Ok(())
    }

    /// Convert a database row to a ReleaseVersion
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            pkg: row.get(0)?,
            version: row.get(1)?,
            previous_version: row.get(2)?,
        })
    }
}

impl ReleaseHead {
    /// Insert or overwrite the head of this package, regardless of version order
    pub fn upsert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO release_line_heads (pkg, version, previous_version)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(pkg) DO UPDATE SET
                version = excluded.version,
                previous_version = excluded.previous_version,
                updated_at = CURRENT_TIMESTAMP",
            params![&self.pkg, &self.version, &self.previous_version],
        )?;
        Ok(())
    }

    /// Find the head of a package
    pub fn find(conn: &Connection, pkg: &str) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT pkg, version, previous_version FROM release_line_heads WHERE pkg = ?1",
        )?;

        let head = stmt.query_row([pkg], Self::from_row).optional()?;

        Ok(head)
    }

    /// List the heads of all packages
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT pkg, version, previous_version FROM release_line_heads ORDER BY pkg",
        )?;

        let heads = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(heads)
    }

    /// Delete the head of a package
    pub fn delete(conn: &Connection, pkg: &str) -> Result<()> {
        conn.execute("DELETE FROM release_line_heads WHERE pkg = ?1", [pkg])?;
        Ok(())
    }

    /// Convert a database row to a ReleaseHead
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            pkg: row.get(0)?,
            version: row.get(1)?,
            previous_version: row.get(2)?,
        })
    }
}

impl Dependent {
    /// Insert or overwrite this dependent
    pub fn upsert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO release_line_deps (pkg, version, dependent, dependent_version)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(pkg, version, dependent) DO UPDATE SET
                dependent_version = excluded.dependent_version",
            params![
                &self.pkg,
                &self.version,
                &self.dependent,
                &self.dependent_version,
            ],
        )?;
        Ok(())
    }

    /// Find one dependent of a release
    pub fn find(
        conn: &Connection,
        pkg: &str,
        version: &str,
        dependent: &str,
    ) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT pkg, version, dependent, dependent_version FROM release_line_deps
             WHERE pkg = ?1 AND version = ?2 AND dependent = ?3",
        )?;

        let dep = stmt
            .query_row(params![pkg, version, dependent], Self::from_row)
            .optional()?;

        Ok(dep)
    }

    /// Find all dependents of a release
    pub fn find_by_release(conn: &Connection, pkg: &str, version: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT pkg, version, dependent, dependent_version FROM release_line_deps
             WHERE pkg = ?1 AND version = ?2 ORDER BY dependent",
        )?;

        let deps = stmt
            .query_map(params![pkg, version], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(deps)
    }

    /// Delete one dependent of a release
    pub fn delete(conn: &Connection, pkg: &str, version: &str, dependent: &str) -> Result<()> {
        conn.execute(
            "DELETE FROM release_line_deps WHERE pkg = ?1 AND version = ?2 AND dependent = ?3",
            params![pkg, version, dependent],
        )?;
        Ok(())
    }

    /// Convert a database row to a Dependent
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            pkg: row.get(0)?,
            version: row.get(1)?,
            dependent: row.get(2)?,
            dependent_version: row.get(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;
    use tempfile::NamedTempFile;

    fn create_test_db() -> (NamedTempFile, Connection) {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = Connection::open(temp_file.path()).unwrap();
        schema::migrate(&conn).unwrap();
        (temp_file, conn)
    }

    #[test]
    fn test_release_version_crud() {
        let (_temp, conn) = create_test_db();

        let first = ReleaseVersion::new("nginx".to_string(), "1.20.0".to_string(), None);
        first.upsert(&conn).unwrap();
        let second = ReleaseVersion::new(
            "nginx".to_string(),
            "1.21.0".to_string(),
            Some("1.20.0".to_string()),
        );
        second.upsert(&conn).unwrap();

        let found = ReleaseVersion::find(&conn, "nginx", "1.21.0").unwrap().unwrap();
        assert_eq!(found, second);

        let all = ReleaseVersion::find_by_pkg(&conn, "nginx").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].version, "1.20.0");

        ReleaseVersion::delete(&conn, "nginx", "1.21.0").unwrap();
        assert!(ReleaseVersion::find(&conn, "nginx", "1.21.0").unwrap().is_none());

        // Deleting again is not an error
        ReleaseVersion::delete(&conn, "nginx", "1.21.0").unwrap();
    }

    #[test]
    fn test_head_is_last_write_wins() {
        let (_temp, conn) = create_test_db();

        ReleaseHead::new("nginx".to_string(), "2.0.0".to_string(), None)
            .upsert(&conn)
            .unwrap();
        // An older version still replaces the head
        ReleaseHead::new(
            "nginx".to_string(),
            "1.0.0".to_string(),
            Some("2.0.0".to_string()),
        )
        .upsert(&conn)
        .unwrap();

        let head = ReleaseHead::find(&conn, "nginx").unwrap().unwrap();
        assert_eq!(head.version, "1.0.0");
        assert_eq!(head.previous_version.as_deref(), Some("2.0.0"));
        assert_eq!(ReleaseHead::list_all(&conn).unwrap().len(), 1);

        assert!(ReleaseHead::find(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_dependent_crud() {
        let (_temp, conn) = create_test_db();

        let dep = Dependent::new(
            "nginx".to_string(),
            "1.21.0".to_string(),
            "nginx-module".to_string(),
            "0.1.0".to_string(),
        );
        dep.upsert(&conn).unwrap();

        let mut bumped = dep.clone();
        bumped.dependent_version = "0.2.0".to_string();
        bumped.upsert(&conn).unwrap();

        let found = Dependent::find(&conn, "nginx", "1.21.0", "nginx-module")
            .unwrap()
            .unwrap();
        assert_eq!(found.dependent_version, "0.2.0");

        let all = Dependent::find_by_release(&conn, "nginx", "1.21.0").unwrap();
        assert_eq!(all.len(), 1);
        assert!(Dependent::find_by_release(&conn, "nginx", "1.20.0")
            .unwrap()
            .is_empty());

        Dependent::delete(&conn, "nginx", "1.21.0", "nginx-module").unwrap();
        assert!(Dependent::find(&conn, "nginx", "1.21.0", "nginx-module")
            .unwrap()
            .is_none());
    }
}
