use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use http::StatusCode;
use tracing::warn;
use uuid::Uuid;

/// Identity of the caller, established by the platform's session layer
/// upstream of this service. The engine trusts the `x-user-id` header the
/// API gateway injects after session validation; it never validates
/// credentials itself.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
}

#[derive(Debug)]
pub enum AuthError {
    MissingHeader,
    InvalidUserId(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingHeader => write!(f, "x-user-id header required"),
            AuthError::InvalidUserId(msg) => write!(f, "Invalid user id: {}", msg),
        }
    }
}

impl From<AuthError> for (StatusCode, String) {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingHeader => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
            ),
            AuthError::InvalidUserId(msg) => {
                (StatusCode::UNAUTHORIZED, format!("Invalid user id: {}", msg))
            }
        }
    }
}

pub async fn auth_middleware(
    mut req: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let header = req
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            warn!("Request to protected route without x-user-id header");
            <(StatusCode, String)>::from(AuthError::MissingHeader)
        })?;

    let user_id = Uuid::parse_str(header).map_err(|e| {
        warn!("Malformed x-user-id header: {}", e);
        <(StatusCode, String)>::from(AuthError::InvalidUserId(e.to_string()))
    })?;

    req.extensions_mut().insert(AuthUser { id: user_id });
    Ok(next.run(req).await)
}
