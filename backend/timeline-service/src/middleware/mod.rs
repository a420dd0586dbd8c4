//! Caller identity extraction.
//!
//! Authentication is owned by the upstream identity service; by the time a
//! request reaches this service the gateway has verified the session token
//! and injected the resolved account id as the `x-user-id` header. The
//! extractor only parses that header — absent or malformed values reject
//! with 401.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use uuid::Uuid;

use crate::error::AppError;

/// Header carrying the gateway-resolved caller identity
pub const CALLER_ID_HEADER: &str = "x-user-id";

/// Resolved caller identity for the current request
#[derive(Debug, Clone, Copy)]
pub struct CallerId(pub Uuid);

impl FromRequest for CallerId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let caller = req
            .headers()
            .get(CALLER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .map(CallerId)
            .ok_or_else(|| AppError::Unauthorized("missing caller identity".to_string()));

        ready(caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_extracts_valid_header() {
        let id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header((CALLER_ID_HEADER, id.to_string()))
            .to_http_request();

        let caller = CallerId::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(caller.0, id);
    }

    #[actix_web::test]
    async fn test_rejects_missing_header() {
        let req = TestRequest::default().to_http_request();
        let result = CallerId::from_request(&req, &mut Payload::None).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[actix_web::test]
    async fn test_rejects_malformed_header() {
        let req = TestRequest::default()
            .insert_header((CALLER_ID_HEADER, "not-a-uuid"))
            .to_http_request();

        let result = CallerId::from_request(&req, &mut Payload::None).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
