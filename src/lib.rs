#[macro_use]
extern crate rocket;

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod server;

pub use config::Config;
pub use db::PostStore;
pub use error::AppError;
pub use server::{close_server, run_server, RunningServer};

pub fn create_rocket(store: PostStore) -> Result<rocket::Rocket<rocket::Build>, AppError> {
    let cors = rocket_cors::CorsOptions::default()
        .allowed_origins(rocket_cors::AllowedOrigins::all())
        .to_cors()?;

    Ok(rocket::build()
        .manage(store)
        .attach(cors)
        .mount("/", routes![
            routes::health,
            routes::list_posts,
            routes::get_post,
            routes::create_post,
            routes::update_post,
            routes::delete_post,
        ])
        .register("/", catchers![
            routes::bad_request,
            routes::not_found_catcher,
            routes::unprocessable,
            routes::internal_error,
        ]))
}
