use blog_posts::{server, AppError, Config};
use tracing_subscriber::EnvFilter;

#[rocket::main]
async fn main() -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    tracing::info!(db = %config.database_path.display(), port = config.port, "starting blog posts api");

    server::build(&config)?.launch().await?;
    Ok(())
}
