use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{dao::models::UserEntity, error::AppError, services::user_service, state::SharedState};

/// Header carrying the caller API token.
pub const TOKEN_HEADER: &str = "x-quiz-token";

/// Owner of the token presented with the request, inserted by [`require_token`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserEntity);

/// Reject requests without a known `X-Quiz-Token` and expose its owner to the handlers.
pub async fn require_token(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| AppError::Unauthorized("missing token header `X-Quiz-Token`".into()))?;

    let user = user_service::authenticate(&state, &provided).await?;
    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}
