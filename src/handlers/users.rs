use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::AppUserService;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterUserBody {
    pub username: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
}

/// POST /api/users
///
/// Creates the user record a principal of this name resolves to.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = RegisterUserBody,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Blank or overlong username"),
        (status = 409, description = "Username already taken"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "users"
)]
pub async fn register_user(
    service: web::Data<AppUserService>,
    body: web::Json<RegisterUserBody>,
) -> Result<HttpResponse, AppError> {
    let username = body.into_inner().username;
    let user = web::block(move || service.register(&username))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Created().json(UserResponse {
        id: user.id,
        username: user.username,
    }))
}
