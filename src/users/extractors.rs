use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Form, Json,
};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::AppError;

/// Create payload as loosely typed JSON.
///
/// Accepts `application/json` and `application/x-www-form-urlencoded`.
/// Any other content type is treated as an empty object so the validator
/// reports the missing fields.
pub struct UserPayload(pub Value);

#[async_trait]
impl<S> FromRequest<S> for UserPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| reject(e.status(), e.body_text()))?;
            let fields: Map<String, Value> = fields
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            return Ok(Self(Value::Object(fields)));
        }

        match Json::<Value>::from_request(req, state).await {
            Ok(Json(body)) => Ok(Self(body)),
            Err(JsonRejection::MissingJsonContentType(_)) => Ok(Self(Value::Object(Map::new()))),
            Err(e) => Err(reject(e.status(), e.body_text())),
        }
    }
}

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            ct.trim_start()
                .to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        })
        .unwrap_or(false)
}

fn reject(status: StatusCode, detail: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        warn!(%detail, "request body too large");
        AppError::PayloadTooLarge
    } else {
        warn!(%detail, "unparseable request body");
        AppError::MalformedRequest(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    async fn extract(content_type: Option<&str>, body: &'static str) -> Result<Value, AppError> {
        let mut req = Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            req = req.header(CONTENT_TYPE, ct);
        }
        let req = req.body(Body::from(body)).unwrap();
        UserPayload::from_request(req, &()).await.map(|p| p.0)
    }

    #[tokio::test]
    async fn json_body_is_passed_through() {
        let v = extract(Some("application/json"), r#"{"id":"a@b.com","password":7}"#)
            .await
            .unwrap();
        assert_eq!(v, serde_json::json!({"id": "a@b.com", "password": 7}));
    }

    #[tokio::test]
    async fn form_body_becomes_string_fields() {
        let v = extract(
            Some("application/x-www-form-urlencoded; charset=UTF-8"),
            "id=a%40b.com&password=secret1",
        )
        .await
        .unwrap();
        assert_eq!(v["id"], "a@b.com");
        assert_eq!(v["password"], "secret1");
    }

    #[tokio::test]
    async fn unknown_content_type_is_empty_object() {
        let v = extract(Some("text/plain"), "hello").await.unwrap();
        assert_eq!(v, serde_json::json!({}));
        let v = extract(None, "").await.unwrap();
        assert_eq!(v, serde_json::json!({}));
    }

    #[tokio::test]
    async fn broken_json_is_malformed() {
        let err = extract(Some("application/json"), "{nope").await.unwrap_err();
        assert!(matches!(err, AppError::MalformedRequest(_)));
    }
}
