use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt::{Display, Formatter};

pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug)]
pub struct BackendError(pub anyhow::Error);

/// Returned by stores when an article, study or comment does not exist.
#[derive(Debug)]
pub struct NotFoundError(pub String);

impl Display for NotFoundError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} not found", self.0)
    }
}

impl std::error::Error for NotFoundError {}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl<T> From<T> for BackendError
where
    T: Into<anyhow::Error>,
{
    fn from(t: T) -> Self {
        BackendError(t.into())
    }
}

impl BackendError {
    pub fn is_not_found(&self) -> bool {
        if self.0.downcast_ref::<NotFoundError>().is_some() {
            return true;
        }
        #[cfg(feature = "postgres")]
        if let Some(diesel::result::Error::NotFound) = self.0.downcast_ref::<diesel::result::Error>()
        {
            return true;
        }
        false
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, format!("{}", self.0)).into_response()
    }
}
