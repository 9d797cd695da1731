//! Users API handlers.
//!
//! ```text
//! GET    /users
//! GET    /users/{id}
//! GET    /users/by-username/{username}
//! POST   /users
//! PUT    /users/{id}
//! DELETE /users/{id}
//! ```
//!
//! Handlers validate request payloads into [`UserDraft`] values before the
//! directory is consulted, then map directory outcomes onto the shared
//! error envelope: conflicts become 409, missing records 404.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};

use crate::api::ApiResult;
use crate::domain::{User, UserDirectory, UserDraft, UserId, UserValidationError, Username};

/// Request body for `POST /users` and `PUT /users/{id}`.
///
/// Example JSON:
/// `{"username":"alice","email":"a@x.com","age":30}`
///
/// Age arrives as a signed integer so that a negative value is answered
/// with the standard validation envelope rather than a deserialisation
/// failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserPayload {
    /// Requested username.
    pub username: String,
    /// Requested email address.
    pub email: String,
    /// Requested age in years.
    pub age: i64,
}

impl TryFrom<UserPayload> for UserDraft {
    type Error = UserValidationError;

    fn try_from(value: UserPayload) -> Result<Self, Self::Error> {
        Self::try_from_parts(value.username, value.email, value.age)
    }
}

/// List all users in insertion order.
#[get("/users")]
pub async fn list_users(directory: web::Data<UserDirectory>) -> ApiResult<web::Json<Vec<User>>> {
    Ok(web::Json(directory.list()))
}

/// Fetch a single user by identifier.
#[get("/users/{id}")]
pub async fn get_user(
    directory: web::Data<UserDirectory>,
    id: web::Path<u64>,
) -> ApiResult<web::Json<User>> {
    let user = directory.get(UserId::new(id.into_inner()))?;
    Ok(web::Json(user))
}

/// Fetch a single user by username; the lookup is case-insensitive.
#[get("/users/by-username/{username}")]
pub async fn get_user_by_username(
    directory: web::Data<UserDirectory>,
    username: web::Path<String>,
) -> ApiResult<web::Json<User>> {
    let username = Username::new(username.into_inner())?;
    let user = directory.get_by_username(&username)?;
    Ok(web::Json(user))
}

/// Create a new user.
///
/// Responds 201 with the stored record (including its assigned id) and a
/// `Location` header, 400 for invalid fields, 409 when the username or
/// email is already claimed.
#[post("/users")]
pub async fn create_user(
    directory: web::Data<UserDirectory>,
    payload: web::Json<UserPayload>,
) -> ApiResult<HttpResponse> {
    let draft = UserDraft::try_from(payload.into_inner())?;
    let user = directory.create(draft)?;
    let location = format!("/users/{}", user.id());
    Ok(HttpResponse::Created()
        .insert_header(("location", location))
        .json(user))
}

/// Replace an existing user's username, email, and age.
///
/// The identifier never changes. Responds 404 for an unknown id, 400 for
/// invalid fields, 409 when the new username or email collides with a
/// different user.
#[put("/users/{id}")]
pub async fn update_user(
    directory: web::Data<UserDirectory>,
    id: web::Path<u64>,
    payload: web::Json<UserPayload>,
) -> ApiResult<web::Json<User>> {
    let draft = UserDraft::try_from(payload.into_inner())?;
    let user = directory.update(UserId::new(id.into_inner()), draft)?;
    Ok(web::Json(user))
}

/// Delete a user by identifier.
///
/// Responds 204 on success and 404 for an unknown id. The id is retired
/// for the process lifetime; the username and email become reusable.
#[delete("/users/{id}")]
pub async fn delete_user(
    directory: web::Data<UserDirectory>,
    id: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    directory.remove(UserId::new(id.into_inner()))?;
    Ok(HttpResponse::NoContent().finish())
}
