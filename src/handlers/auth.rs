use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};

use crate::errors::AppError;

/// Header carrying the username of the authenticated caller, set by the
/// authentication layer in front of this service.
pub const PRINCIPAL_HEADER: &str = "X-Authenticated-User";

/// The acting principal of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal(pub String);

impl Principal {
    pub fn username(&self) -> &str {
        &self.0
    }
}

impl FromRequest for Principal {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let principal = req
            .headers()
            .get(PRINCIPAL_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| Principal(name.to_string()))
            .ok_or(AppError::Unauthenticated);
        ready(principal)
    }
}
