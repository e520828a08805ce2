use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::{Form, FromRequest, Request};
use axum::http::header;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Body extractor accepting either JSON or an urlencoded form, picked by
/// `Content-Type`. Anything that is not a form is read as JSON, and an empty
/// body reads as an empty object.
#[derive(Debug)]
pub struct JsonOrForm<T>(pub T);

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
        let method = req.method().clone();

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return serde_json::from_slice(b"{}")
                .map(Self)
                .map_err(|e| AppError::BadRequest(e.to_string()));
        }

        if is_form {
            let req = axum::http::Request::builder()
                .method(method)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(bytes))
                .map_err(|e| AppError::Internal(e.to_string()))?;
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            return Ok(Self(value));
        }

        let Json(value) =
            Json::<T>::from_bytes(&bytes).map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::guest::{GuestForm, GuestPatch};

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = axum::http::Request::patch("/");
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn empty_body_is_an_empty_patch() {
        let JsonOrForm(patch) = JsonOrForm::<GuestPatch>::from_request(request(None, ""), &())
            .await
            .unwrap();
        assert!(patch.name.is_none());
        assert!(patch.assists.is_none());
    }

    #[tokio::test]
    async fn empty_body_still_enforces_required_fields() {
        let result = JsonOrForm::<GuestForm>::from_request(request(None, ""), &()).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn json_without_content_type_is_accepted() {
        let JsonOrForm(patch) =
            JsonOrForm::<GuestPatch>::from_request(request(None, r#"{"assists":true}"#), &())
                .await
                .unwrap();
        assert_eq!(patch.assists, Some(true));
    }

    #[tokio::test]
    async fn form_bodies_are_decoded() {
        let JsonOrForm(patch) = JsonOrForm::<GuestPatch>::from_request(
            request(Some("application/x-www-form-urlencoded"), "table_number=7"),
            &(),
        )
        .await
        .unwrap();
        assert_eq!(patch.table_number, Some(7));
    }
}
