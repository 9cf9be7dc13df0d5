//! Configuration for the relational sink and the OCR fallback.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Which relational database a [`DatabaseConfig`] targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseBackend {
    /// MySQL / MariaDB server
    #[default]
    MySql,
    /// SQLite file (or `:memory:`)
    Sqlite,
}

/// Connection parameters for the relational sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Database backend
    pub backend: DatabaseBackend,

    /// Server host (MySQL) or database file path (SQLite)
    pub host: String,

    /// Server port (MySQL only)
    pub port: u16,

    /// User name (MySQL only)
    pub user: String,

    /// Password (MySQL only)
    pub password: Option<String>,

    /// Database name (MySQL only)
    pub database: String,
}

impl DatabaseConfig {
    /// Default MySQL port.
    pub const MYSQL_PORT: u16 = 3306;

    /// Configure a MySQL connection.
    pub fn mysql(
        host: impl Into<String>,
        user: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            backend: DatabaseBackend::MySql,
            host: host.into(),
            port: Self::MYSQL_PORT,
            user: user.into(),
            password: None,
            database: database.into(),
        }
    }

    /// Configure a SQLite database file. `":memory:"` opens a private in-memory database.
    pub fn sqlite<P: AsRef<Path>>(path: P) -> Self {
        Self {
            backend: DatabaseBackend::Sqlite,
            host: path.as_ref().to_string_lossy().into_owned(),
            port: 0,
            user: String::new(),
            password: None,
            database: String::new(),
        }
    }

    /// Set the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Check that every field the backend needs is present.
    pub fn validate(&self) -> Result<()> {
        match self.backend {
            DatabaseBackend::MySql => {
                if self.host.trim().is_empty() {
                    return Err(Error::Config("database host is empty".into()));
                }
                if self.user.trim().is_empty() {
                    return Err(Error::Config("database user is empty".into()));
                }
                if self.database.trim().is_empty() {
                    return Err(Error::Config("database name is empty".into()));
                }
                if self.port == 0 {
                    return Err(Error::Config("database port is 0".into()));
                }
            }
            DatabaseBackend::Sqlite => {
                if self.host.trim().is_empty() {
                    return Err(Error::Config("SQLite path is empty".into()));
                }
            }
        }
        Ok(())
    }

    /// Render the connection URL.
    pub fn url(&self) -> Result<String> {
        self.validate()?;

        match self.backend {
            DatabaseBackend::Sqlite if self.host == ":memory:" => Ok("sqlite::memory:".into()),
            DatabaseBackend::Sqlite => Ok(format!("sqlite://{}?mode=rwc", self.host)),
            DatabaseBackend::MySql => {
                let mut url = url::Url::parse("mysql://localhost")
                    .map_err(|e| Error::Config(e.to_string()))?;
                url.set_host(Some(&self.host))
                    .map_err(|e| Error::Config(format!("invalid host {}: {}", self.host, e)))?;
                url.set_port(Some(self.port))
                    .map_err(|_| Error::Config("invalid port".into()))?;
                url.set_username(&self.user)
                    .map_err(|_| Error::Config("invalid user".into()))?;
                url.set_password(self.password.as_deref())
                    .map_err(|_| Error::Config("invalid password".into()))?;
                url.set_path(&self.database);
                Ok(url.to_string())
            }
        }
    }
}

/// Options for the OCR fallback used when a PDF has no extractable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    /// Page rasterizer binary (Poppler's `pdftoppm`)
    pub pdftoppm: PathBuf,

    /// OCR binary
    pub tesseract: PathBuf,

    /// Rasterization resolution
    pub dpi: u32,

    /// Tesseract language code
    pub language: String,
}

impl OcrConfig {
    /// Create new OCR options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rasterization resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the Tesseract language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the binaries to invoke.
    pub fn with_binaries(mut self, pdftoppm: impl Into<PathBuf>, tesseract: impl Into<PathBuf>) -> Self {
        self.pdftoppm = pdftoppm.into();
        self.tesseract = tesseract.into();
        self
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            pdftoppm: PathBuf::from("pdftoppm"),
            tesseract: PathBuf::from("tesseract"),
            dpi: 300,
            language: "eng".to_string(),
        }
    }
}
