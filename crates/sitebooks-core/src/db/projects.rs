//! Project and category operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Category, NewProject, Project, TransactionType};

impl Database {
    /// Create a project, returning its ID
    pub fn create_project(&self, project: &NewProject) -> Result<i64> {
        let name = project.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Project name cannot be empty".into()));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO projects (name, client) VALUES (?, ?)",
            params![name, project.client],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List all projects ordered by name
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, client, created_at FROM projects ORDER BY name, id")?;

        let projects = stmt
            .query_map([], |row| {
                let created_at: String = row.get(3)?;
                Ok(Project {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    client: row.get(2)?,
                    created_at: parse_datetime(&created_at),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(projects)
    }

    /// Get a project by ID
    pub fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let conn = self.conn()?;
        let project = conn
            .query_row(
                "SELECT id, name, client, created_at FROM projects WHERE id = ?",
                params![id],
                |row| {
                    let created_at: String = row.get(3)?;
                    Ok(Project {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        client: row.get(2)?,
                        created_at: parse_datetime(&created_at),
                    })
                },
            )
            .optional()?;
        Ok(project)
    }

    /// Rename a project
    ///
    /// Existing transactions keep their stored name copy; reports resolve the
    /// new name through the reference.
    pub fn rename_project(&self, id: i64, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Project name cannot be empty".into()));
        }

        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE projects SET name = ? WHERE id = ?",
            params![name, id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("Project {}", id)));
        }
        Ok(())
    }

    /// Delete a project. Returns false if it did not exist.
    ///
    /// Transactions referencing it keep their stored project name.
    pub fn delete_project(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM projects WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }

    /// Create a category (or return the existing one with the same name and kind)
    pub fn create_category(&self, name: &str, kind: TransactionType) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Category name cannot be empty".into()));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO categories (name, kind) VALUES (?, ?)",
            params![name, kind.as_str()],
        )?;

        let id = conn.query_row(
            "SELECT id FROM categories WHERE name = ? AND kind = ?",
            params![name, kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// List categories, optionally restricted to one kind
    pub fn list_categories(&self, kind: Option<TransactionType>) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, kind, created_at FROM categories
            WHERE (?1 IS NULL OR kind = ?1)
            ORDER BY kind, name
            "#,
        )?;

        let rows = stmt
            .query_map(params![kind.map(|k| k.as_str())], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, name, kind, created_at)| {
                Ok(Category {
                    id,
                    name,
                    kind: kind.parse().map_err(Error::InvalidData)?,
                    created_at: parse_datetime(&created_at),
                })
            })
            .collect()
    }

    /// Get a category by ID
    pub fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, name, kind, created_at FROM categories WHERE id = ?",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, name, kind, created_at)| {
            Ok(Category {
                id,
                name,
                kind: kind.parse().map_err(Error::InvalidData)?,
                created_at: parse_datetime(&created_at),
            })
        })
        .transpose()
    }
}
