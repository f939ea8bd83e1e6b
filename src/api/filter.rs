use super::error::*;
use super::header::*;
use crate::application_port::AuthSessionManager;
use crate::domain_model::UserId;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::HeaderMap;
use warp::{Filter, Rejection, reject};

// Filters that let an HTTP layer reuse the header parsing and session checks.

pub fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

/// The raw bearer credential, access or refresh token alike.
pub fn bearer_token() -> impl Filter<Extract = (String,), Error = Rejection> + Clone {
    warp::header::headers_cloned().and_then(|headers: HeaderMap| async move {
        extract_bearer(&headers)
            .map_err(ApiErrorCode::from)
            .map_err(reject::custom)
    })
}

pub fn with_verification(
    manager: Arc<dyn AuthSessionManager>,
) -> impl Filter<Extract = (UserId,), Error = Rejection> + Clone {
    bearer_token().and_then(move |token: String| {
        let manager = manager.clone();
        async move {
            manager
                .authenticate(&token)
                .await
                .map_err(ApiErrorCode::from)
                .map_err(reject::custom)
        }
    })
}

pub fn with_service_key(
    manager: Arc<dyn AuthSessionManager>,
) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::header::headers_cloned()
        .and_then(move |headers: HeaderMap| {
            let manager = manager.clone();
            async move {
                let key = extract_api_key(&headers)
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)?;
                manager
                    .authorize_service(&key)
                    .await
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)
            }
        })
        .untuple_one()
}

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let code = match err.find::<ApiErrorCode>() {
        Some(code) => *code,
        None => ApiErrorCode::internal(format!("unhandled rejection: {:?}", err)),
    };
    let json = warp::reply::json(&ApiError::from(code));
    Ok(warp::reply::with_status(json, code.status()))
}
