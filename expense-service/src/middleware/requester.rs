use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;
use uuid::Uuid;

pub const REQUESTER_HEADER: &str = "X-User-ID";

/// Identity of the carrier submitting or listing requests.
///
/// The upstream BFF authenticates the user and forwards the id in
/// `X-User-ID`; this service trusts that header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(REQUESTER_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!(
                    "Missing X-User-ID header (required from BFF)"
                ))
            })?;

        let requester_id = Uuid::parse_str(raw.trim()).map_err(|_| {
            AppError::Unauthorized(anyhow::anyhow!("X-User-ID must be a UUID"))
        })?;

        tracing::Span::current().record("requester_id", raw);

        Ok(Requester(requester_id))
    }
}
