use chrono::{DateTime, Utc};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};

use crate::db::{Author, NewPost, Post, PostPatch, PostStore, StoreError};

type ApiResult<T> = Result<T, (Status, Json<ApiError>)>;

// ─── Models ───

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

fn err(status: Status, msg: &str, code: &str) -> (Status, Json<ApiError>) {
    (status, Json(ApiError { error: msg.to_string(), code: code.to_string() }))
}

fn db_err(e: StoreError) -> (Status, Json<ApiError>) {
    tracing::error!(error = %e, "post store failure");
    err(Status::InternalServerError, &e.to_string(), "DB_ERROR")
}

fn validation_err(msg: &str) -> (Status, Json<ApiError>) {
    err(Status::UnprocessableEntity, msg, "VALIDATION_ERROR")
}

fn not_found() -> (Status, Json<ApiError>) {
    err(Status::NotFound, "Post not found", "NOT_FOUND")
}

/// Wire form of a post: the author is flattened to a display string.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub created: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            author: post.author.full_name(),
            id: post.id,
            title: post.title,
            content: post.content,
            created: post.created,
        }
    }
}

// ─── Request bodies ───

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorReq {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl AuthorReq {
    /// Structured author, or the name of the first missing field.
    fn into_author(self) -> Result<Author, &'static str> {
        let first_name = self.first_name.ok_or("author.firstName")?;
        let last_name = self.last_name.ok_or("author.lastName")?;
        Ok(Author { first_name, last_name })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePostReq {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<AuthorReq>,
}

impl CreatePostReq {
    fn into_new_post(self) -> Result<NewPost, &'static str> {
        let title = self.title.ok_or("title")?;
        let content = self.content.ok_or("content")?;
        let author = self.author.ok_or("author")?.into_author()?;
        Ok(NewPost { title, content, author })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostReq {
    pub id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<AuthorReq>,
}

// ─── Routes ───

#[get("/health")]
pub fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

#[get("/posts")]
pub fn list_posts(store: &State<PostStore>) -> ApiResult<Json<Vec<PostResponse>>> {
    let posts = store.find_all().map_err(db_err)?;
    Ok(Json(posts.into_iter().map(PostResponse::from).collect()))
}

#[get("/posts/<id>")]
pub fn get_post(id: &str, store: &State<PostStore>) -> ApiResult<Json<PostResponse>> {
    store
        .find_by_id(id)
        .map_err(db_err)?
        .map(|post| Json(post.into()))
        .ok_or_else(not_found)
}

#[post("/posts", data = "<req>")]
pub fn create_post(req: Json<CreatePostReq>, store: &State<PostStore>) -> ApiResult<(Status, Json<PostResponse>)> {
    let new_post = req
        .into_inner()
        .into_new_post()
        .map_err(|field| validation_err(&format!("Missing `{}` in request body", field)))?;

    let post = store.insert_one(new_post).map_err(db_err)?;
    tracing::info!(id = %post.id, "created post");
    Ok((Status::Created, Json(post.into())))
}

#[put("/posts/<id>", data = "<req>")]
pub fn update_post(id: &str, req: Json<UpdatePostReq>, store: &State<PostStore>) -> ApiResult<Status> {
    let req = req.into_inner();
    if let Some(body_id) = req.id.as_deref() {
        if body_id != id {
            return Err(validation_err(&format!(
                "Request path id ({}) and request body id ({}) must match",
                id, body_id
            )));
        }
    }

    let author = req
        .author
        .map(AuthorReq::into_author)
        .transpose()
        .map_err(|field| validation_err(&format!("Missing `{}` in request body", field)))?;
    let patch = PostPatch { title: req.title, content: req.content, author };

    store
        .find_by_id_and_update(id, patch)
        .map_err(db_err)?
        .ok_or_else(not_found)?;
    tracing::info!(id, "updated post");
    Ok(Status::NoContent)
}

/// Deleting an id that does not exist is still a success.
#[delete("/posts/<id>")]
pub fn delete_post(id: &str, store: &State<PostStore>) -> ApiResult<Status> {
    match store.find_by_id_and_remove(id).map_err(db_err)? {
        Some(_) => tracing::info!(id, "deleted post"),
        None => tracing::debug!(id, "delete of absent post"),
    }
    Ok(Status::NoContent)
}

// ─── Catchers ───

#[catch(400)]
pub fn bad_request() -> Json<ApiError> {
    Json(ApiError { error: "Malformed request body".to_string(), code: "BAD_REQUEST".to_string() })
}

#[catch(404)]
pub fn not_found_catcher() -> Json<ApiError> {
    Json(ApiError { error: "Not found".to_string(), code: "NOT_FOUND".to_string() })
}

#[catch(422)]
pub fn unprocessable() -> Json<ApiError> {
    Json(ApiError { error: "Request body has the wrong shape".to_string(), code: "VALIDATION_ERROR".to_string() })
}

#[catch(500)]
pub fn internal_error() -> Json<ApiError> {
    Json(ApiError { error: "Internal server error".to_string(), code: "INTERNAL_ERROR".to_string() })
}
