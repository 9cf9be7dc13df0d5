//! SQL sink for MySQL and SQLite through `sqlx`'s `Any` driver.
//!
//! The public API is synchronous: the sink owns a current-thread tokio
//! runtime and blocks on every database round trip. It must therefore not be
//! used from inside another async runtime.

use std::sync::Arc;

use sqlx::any::install_default_drivers;
use sqlx::{AnyConnection, Connection};
use tokio::runtime::Runtime;

use crate::config::{DatabaseBackend, DatabaseConfig};
use crate::diagnostics::{Diagnostics, Reporter, Stage};
use crate::error::{Error, Result};
use crate::extractor::Extractor;
use crate::format::FormatTag;
use crate::model::Category;

use super::{checked_images, settle_items, Sink};

const SQLITE_SCHEMA: [&str; 5] = [
    "CREATE TABLE IF NOT EXISTS extracted_text (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_type TEXT NOT NULL,
        content TEXT
    )",
    "CREATE TABLE IF NOT EXISTS extracted_links (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_type TEXT NOT NULL,
        link TEXT
    )",
    "CREATE TABLE IF NOT EXISTS extracted_images (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_type TEXT NOT NULL,
        image BLOB
    )",
    "CREATE TABLE IF NOT EXISTS extracted_tables (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_type TEXT NOT NULL,
        table_data TEXT
    )",
    "CREATE TABLE IF NOT EXISTS extracted_metadata (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_type TEXT NOT NULL,
        `key` TEXT,
        `value` TEXT
    )",
];

const MYSQL_SCHEMA: [&str; 5] = [
    "CREATE TABLE IF NOT EXISTS extracted_text (
        id INT AUTO_INCREMENT PRIMARY KEY,
        file_type VARCHAR(16) NOT NULL,
        content LONGTEXT
    )",
    "CREATE TABLE IF NOT EXISTS extracted_links (
        id INT AUTO_INCREMENT PRIMARY KEY,
        file_type VARCHAR(16) NOT NULL,
        link TEXT
    )",
    "CREATE TABLE IF NOT EXISTS extracted_images (
        id INT AUTO_INCREMENT PRIMARY KEY,
        file_type VARCHAR(16) NOT NULL,
        image LONGBLOB
    )",
    "CREATE TABLE IF NOT EXISTS extracted_tables (
        id INT AUTO_INCREMENT PRIMARY KEY,
        file_type VARCHAR(16) NOT NULL,
        table_data LONGTEXT
    )",
    "CREATE TABLE IF NOT EXISTS extracted_metadata (
        id INT AUTO_INCREMENT PRIMARY KEY,
        file_type VARCHAR(16) NOT NULL,
        `key` VARCHAR(255),
        `value` TEXT
    )",
];

/// Table holding one category.
fn table_name(category: Category) -> &'static str {
    match category {
        Category::Text => "extracted_text",
        Category::Links => "extracted_links",
        Category::Images => "extracted_images",
        Category::Tables => "extracted_tables",
        Category::Metadata => "extracted_metadata",
    }
}

type AnyQuery<'q> = sqlx::query::Query<'q, sqlx::Any, sqlx::any::AnyArguments<'q>>;

/// Column values of one row, bound after `file_type`.
trait RowValues: Send + 'static {
    fn bind_to<'q>(self, query: AnyQuery<'q>) -> AnyQuery<'q>;
}

impl RowValues for String {
    fn bind_to<'q>(self, query: AnyQuery<'q>) -> AnyQuery<'q> {
        query.bind(self)
    }
}

impl RowValues for Vec<u8> {
    fn bind_to<'q>(self, query: AnyQuery<'q>) -> AnyQuery<'q> {
        query.bind(self)
    }
}

impl RowValues for (String, Option<String>) {
    fn bind_to<'q>(self, query: AnyQuery<'q>) -> AnyQuery<'q> {
        query.bind(self.0).bind(self.1)
    }
}

/// Writes artifacts as rows of the five `extracted_*` tables.
pub struct RelationalSink {
    runtime: Runtime,
    conn: Option<AnyConnection>,
    backend: DatabaseBackend,
    diagnostics: Arc<dyn Diagnostics>,
}

impl RelationalSink {
    /// Connect and create the tables if they do not exist.
    pub fn connect(config: &DatabaseConfig, diagnostics: Arc<dyn Diagnostics>) -> Result<Self> {
        let url = config.url()?;
        install_default_drivers();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let mut conn = runtime.block_on(AnyConnection::connect(&url))?;
        let schema = match config.backend {
            DatabaseBackend::Sqlite => SQLITE_SCHEMA,
            DatabaseBackend::MySql => MYSQL_SCHEMA,
        };
        runtime.block_on(async {
            for ddl in schema {
                sqlx::query(ddl).execute(&mut conn).await?;
            }
            Ok::<_, sqlx::Error>(())
        })?;

        log::debug!("connected to {:?} database, schema ready", config.backend);

        Ok(Self {
            runtime,
            conn: Some(conn),
            backend: config.backend,
            diagnostics,
        })
    }

    /// Backend in use.
    pub fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    /// Runtime and open connection, borrowed together.
    fn session(&mut self) -> Result<(&Runtime, &mut AnyConnection)> {
        match self.conn.as_mut() {
            Some(conn) => Ok((&self.runtime, conn)),
            None => Err(Error::Config("database connection is closed".into())),
        }
    }

    /// Number of rows stored for `category`, across all formats.
    pub fn row_count(&mut self, category: Category) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table_name(category));
        let (runtime, conn) = self.session()?;
        let count = runtime.block_on(sqlx::query_scalar::<_, i64>(&sql).fetch_one(conn))?;
        Ok(count)
    }

    /// Stored metadata entries for `format`, in insertion order.
    pub fn metadata_entries(&mut self, format: FormatTag) -> Result<Vec<(String, Option<String>)>> {
        let (runtime, conn) = self.session()?;
        let rows = runtime.block_on(
            sqlx::query_as::<_, (String, Option<String>)>(
                "SELECT `key`, `value` FROM extracted_metadata WHERE file_type = ? ORDER BY id",
            )
            .bind(format.as_str())
            .fetch_all(conn),
        )?;
        Ok(rows)
    }

    /// Close the connection. Later saves fail with [`Error::Config`].
    pub fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            self.runtime.block_on(conn.close())?;
        }
        Ok(())
    }

    /// Insert `(format, ..row)` for every row, each as its own statement.
    ///
    /// Returns how many rows were stored and the rows that failed, keyed by
    /// their 1-based item number.
    fn insert_each<R: RowValues>(
        &mut self,
        sql: &str,
        format: FormatTag,
        rows: Vec<(usize, R)>,
    ) -> Result<(usize, Vec<(usize, sqlx::Error)>)> {
        let (runtime, conn) = self.session()?;
        let mut inserted = 0;
        let mut failed = Vec::new();
        runtime.block_on(async {
            for (item, row) in rows {
                let query = row.bind_to(sqlx::query(sql).bind(format.as_str()));
                match query.execute(&mut *conn).await {
                    Ok(_) => inserted += 1,
                    Err(e) => failed.push((item, e)),
                }
            }
        });
        Ok((inserted, failed))
    }

    /// Insert rows for `category` and report per-row failures.
    fn save_rows<R: RowValues>(
        &mut self,
        extractor: &Extractor,
        category: Category,
        sql: &str,
        rows: Vec<(usize, R)>,
    ) -> Result<usize> {
        let (inserted, failed) = self.insert_each(sql, extractor.format(), rows)?;
        settle_items(&self.reporter(extractor), category, inserted, failed)
    }

    fn reporter<'a>(&'a self, extractor: &'a Extractor) -> Reporter<'a> {
        Reporter::new(self.diagnostics.as_ref(), extractor.document_id())
    }
}

impl Sink for RelationalSink {
    fn name(&self) -> &'static str {
        "relational"
    }

    fn diagnostics(&self) -> &dyn Diagnostics {
        self.diagnostics.as_ref()
    }

    fn save_text(&mut self, extractor: &Extractor) -> Result<()> {
        let text = extractor.extract_text()?;
        let rows = if text.is_empty() { Vec::new() } else { vec![(1, text)] };
        self.save_rows(
            extractor,
            Category::Text,
            "INSERT INTO extracted_text (file_type, content) VALUES (?, ?)",
            rows,
        )?;
        Ok(())
    }

    fn save_links(&mut self, extractor: &Extractor) -> Result<()> {
        let rows: Vec<(usize, String)> = extractor
            .extract_links()?
            .into_iter()
            .enumerate()
            .map(|(i, link)| (i + 1, link.address))
            .collect();
        self.save_rows(
            extractor,
            Category::Links,
            "INSERT INTO extracted_links (file_type, link) VALUES (?, ?)",
            rows,
        )?;
        Ok(())
    }

    fn save_images(&mut self, extractor: &Extractor) -> Result<usize> {
        let rows: Vec<(usize, Vec<u8>)> = {
            let reporter = self.reporter(extractor);
            checked_images(extractor, &reporter)?
                .into_iter()
                .map(|image| (image.index, image.blob.data))
                .collect()
        };
        self.save_rows(
            extractor,
            Category::Images,
            "INSERT INTO extracted_images (file_type, image) VALUES (?, ?)",
            rows,
        )
    }

    fn save_tables(&mut self, extractor: &Extractor) -> Result<()> {
        let rows: Vec<(usize, String)> = extractor
            .extract_tables()?
            .iter()
            .enumerate()
            .map(|(i, table)| (i + 1, table.to_delimited()))
            .collect();
        self.save_rows(
            extractor,
            Category::Tables,
            "INSERT INTO extracted_tables (file_type, table_data) VALUES (?, ?)",
            rows,
        )?;
        Ok(())
    }

    fn save_metadata(&mut self, extractor: &Extractor) -> Result<()> {
        let rows: Vec<(usize, (String, Option<String>))> = extractor
            .extract_metadata()?
            .entries()
            .into_iter()
            .enumerate()
            .map(|(i, entry)| (i + 1, entry))
            .collect();
        self.save_rows(
            extractor,
            Category::Metadata,
            "INSERT INTO extracted_metadata (file_type, `key`, `value`) VALUES (?, ?, ?)",
            rows,
        )?;
        Ok(())
    }
}

impl Drop for RelationalSink {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = self.runtime.block_on(conn.close()) {
                log::warn!("failed to close database connection: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for RelationalSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationalSink")
            .field("backend", &self.backend)
            .field("open", &self.conn.is_some())
            .finish_non_exhaustive()
    }
}
