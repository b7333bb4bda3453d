use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use kanban_db::DbConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    Development,
    Production,
}

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "KANBAN_BIND", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Directory with the browser client (index.html is the fallback page)
    #[arg(long, env = "KANBAN_CLIENT_DIR", default_value = "client")]
    pub client_dir: PathBuf,

    /// API key for the advice provider. Advice requests fail when unset.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of the chat-completion API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = crate::advice::DEFAULT_BASE_URL)]
    pub openai_base_url: String,

    /// Development mode adds error detail to 500 responses
    #[arg(long = "env", env = "KANBAN_ENV", value_enum, default_value = "development")]
    pub mode: RunMode,

    /// Postgres connection URL; takes precedence over DB_HOST and friends
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// SQLite file used when no Postgres settings are present
    #[arg(long, env = "KANBAN_DB_PATH")]
    pub db_path: Option<String>,
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn dev_mode(&self) -> bool {
        self.mode == RunMode::Development
    }

    /// `DB_*` environment settings with command-line overrides applied.
    pub fn db_config(&self) -> DbConfig {
        let mut db = DbConfig::from_env();
        if let Some(url) = &self.database_url {
            db.database_url = Some(url.clone());
            db.use_postgres = true;
        }
        if let Some(path) = &self.db_path {
            db.sqlite_path = Some(path.clone());
        }
        db
    }
}
