#![allow(dead_code)]

pub mod fake;

use blog_posts::db::{Post, PostStore};
use blog_posts::{close_server, run_server, Config, RunningServer};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tempfile::TempDir;

pub const SEED_COUNT: usize = 11;

/// Exact wire shape of a post; unknown or missing keys fail deserialization.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WirePost {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    pub code: String,
}

/// A running server plus a separate handle on the same store file, so
/// responses can be checked against what was actually persisted.
pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub store: PostStore,
    pub db_path: PathBuf,
    server: RunningServer,
    _dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = Config {
            test_database_path: dir.path().join("posts-test.db"),
            port: 0,
            ..Config::default()
        }
        .for_tests();

        let server = run_server(&config).await.expect("Failed to start server");
        let store = PostStore::open(&config.database_path).expect("Failed to open test store");

        TestApp {
            address: server.base_url(),
            client: reqwest::Client::new(),
            store,
            db_path: config.database_path.clone(),
            server,
            _dir: dir,
        }
    }

    /// Spawns and seeds in one step, the usual start of a test.
    pub async fn seeded() -> (Self, Vec<Post>) {
        let app = Self::spawn().await;
        let seeded = app.seed();
        (app, seeded)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn seed(&self) -> Vec<Post> {
        tracing::info!("seeding blog post data");
        let mut rng = rand::thread_rng();
        let records = (0..SEED_COUNT).map(|_| fake::new_post(&mut rng)).collect();
        let posts = self.store.insert_many(records).expect("Failed to seed posts");
        assert_eq!(posts.len(), SEED_COUNT);
        posts
    }

    pub fn teardown(&self) {
        tracing::warn!("deleting test data");
        self.store.drop_all().expect("Failed to drop posts");
        assert_eq!(self.store.count().unwrap(), 0);
    }

    pub async fn shutdown(self) {
        let TestApp { client, server, _dir, .. } = self;
        drop(client);
        close_server(server).await.expect("Failed to stop server");
    }

    pub async fn finish(self) {
        self.teardown();
        self.shutdown().await;
    }
}
