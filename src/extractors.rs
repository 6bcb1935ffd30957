use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::response::IntoResponse;
use serde::de::DeserializeOwned;

use crate::response::AppError;

/// JSON 请求体提取器：反序列化失败时返回本服务统一的 `AppError` 错误体，
/// 而不是 Axum 默认的纯文本拒绝。
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                let kind = rejection_kind(&rejection);
                tracing::warn!(kind, error = %rejection, "JSON request body rejected");
                Err(AppError::bad_request("INVALID_REQUEST_BODY", "请求体格式无效"))
            }
        }
    }
}

fn rejection_kind(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::JsonDataError(_) => "data",
        JsonRejection::JsonSyntaxError(_) => "syntax",
        JsonRejection::MissingJsonContentType(_) => "content_type",
        JsonRejection::BytesRejection(_) => "bytes",
        _ => "other",
    }
}

// Allow destructuring like `JsonBody(req)` in handler parameters
impl<T> std::ops::Deref for JsonBody<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: serde::Serialize> IntoResponse for JsonBody<T> {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deref_exposes_inner_value() {
        let body = JsonBody(vec![1, 2, 3]);
        assert_eq!(body.len(), 3);
    }
}
