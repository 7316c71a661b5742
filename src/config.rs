//! Settings loaded from the environment (and an optional `.env` file).

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub test_database_path: PathBuf,
    pub host: String,
    /// `0` picks a free port at startup.
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/posts.db"),
            test_database_path: PathBuf::from("data/posts-test.db"),
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            database_path: env::var("DATABASE_PATH").map(PathBuf::from).unwrap_or(defaults.database_path),
            test_database_path: env::var("TEST_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.test_database_path),
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(defaults.port),
        }
    }

    /// Same settings, but pointed at the test database.
    pub fn for_tests(&self) -> Self {
        Self { database_path: self.test_database_path.clone(), ..self.clone() }
    }
}
