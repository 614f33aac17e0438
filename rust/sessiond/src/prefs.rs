use rusqlite::{Connection, OptionalExtension};

/// Key/value string store scoped to one view.
pub trait SelectionStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&mut self, key: &str) -> anyhow::Result<()>;
}

pub struct SqlitePrefs<'a> {
    conn: &'a Connection,
    view: &'static str,
}

impl<'a> SqlitePrefs<'a> {
    pub fn new(conn: &'a Connection, view: &'static str) -> Self {
        Self { conn, view }
    }
}

impl SelectionStore for SqlitePrefs<'_> {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM view_prefs WHERE view = ? AND key = ?",
                (self.view, key),
                |r| r.get(0),
            )
            .optional()?)
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.conn.execute(
            "INSERT INTO view_prefs(view, key, value) VALUES(?, ?, ?)
             ON CONFLICT(view, key) DO UPDATE SET value = excluded.value",
            (self.view, key, value),
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        self.conn.execute(
            "DELETE FROM view_prefs WHERE view = ? AND key = ?",
            (self.view, key),
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryPrefs {
    values: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl MemoryPrefs {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl SelectionStore for MemoryPrefs {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        self.values.remove(key);
        Ok(())
    }
}
