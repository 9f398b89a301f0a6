use std::convert::Infallible;

use serde::Serialize;
use warp::{
    http::StatusCode,
    reply::{json, with_status},
    Rejection, Reply,
};

use crate::error::ApiError;

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

/// Terminal rejection recovery. Everything the filters reject with lands
/// here and leaves as a `{"detail": ...}` JSON body.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, detail) = if let Some(e) = err.find::<ApiError>() {
        (e.status(), e.detail())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, String::from("Endpoint not found"))
    } else if err
        .find::<warp::filters::body::BodyDeserializeError>()
        .is_some()
    {
        (StatusCode::BAD_REQUEST, String::from("Invalid JSON body"))
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, String::from("Invalid query string"))
    } else if err.find::<warp::reject::MissingHeader>().is_some() {
        (
            StatusCode::BAD_REQUEST,
            String::from("Missing required header"),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            String::from("Method not allowed"),
        )
    } else {
        log::error!("unhandled rejection: {err:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            String::from("Internal server error"),
        )
    };

    Ok(with_status(json(&ErrorResponse { detail }), status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use warp::Filter;

    fn rejecting(error: ApiError) -> impl Filter<Extract = (String,), Error = Rejection> + Clone {
        warp::any().and_then(move || {
            let error = error.clone();
            async move { Err::<String, Rejection>(error.into()) }
        })
    }

    #[tokio::test]
    async fn api_errors_become_detail_bodies() {
        let filter = rejecting(ApiError::NotFound(String::from("No recipe exists")))
            .recover(handle_rejection);

        let response = warp::test::request().reply(&filter).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.body(),
            r#"{"detail":"No recipe exists"}"#.as_bytes()
        );
    }

    #[tokio::test]
    async fn unknown_paths_are_reported() {
        let filter = warp::path!("known").map(warp::reply).recover(handle_rejection);

        let response = warp::test::request().path("/unknown").reply(&filter).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
