//! HTTP-layer error mapping: registry errors become status codes.

#[derive(Debug)]
pub enum AdminHttpError {
    BadRequest(String),
    Internal(String),
}

impl std::fmt::Display for AdminHttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(reason) => write!(f, "{reason}"),
            Self::Internal(reason) => write!(f, "{reason}"),
        }
    }
}

impl actix_web::error::ResponseError for AdminHttpError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match self {
            Self::BadRequest(_) => actix_web::http::StatusCode::BAD_REQUEST,
            Self::Internal(_) => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse<actix_web::body::BoxBody> {
        actix_web::HttpResponse::build(self.status_code())
            .content_type(actix_web::http::header::ContentType::plaintext())
            .body(self.to_string())
    }
}

impl From<dnswall_core::Error> for AdminHttpError {
    fn from(err: dnswall_core::Error) -> Self {
        tracing::error!(%err, "admin request failed");

        if err.is_value_error() {
            Self::BadRequest(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}
