use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bugsnag_collector::{EventCollector, metrics::exposition::CONTENT_TYPE, render_prometheus};
use bugsnag_common::ExporterError;

pub struct ExporterApiError(pub ExporterError);

impl From<ExporterError> for ExporterApiError {
    fn from(value: ExporterError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ExporterApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_remote() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (
            status,
            Json(serde_json::json!({
                "code": self.0.kind(),
                "message": self.0.to_string(),
            })),
        )
            .into_response()
    }
}

pub async fn prometheus_metrics(
    State(collector): State<Arc<EventCollector>>,
) -> Result<Response, ExporterApiError> {
    let snapshot = collector.collect().await?;
    let payload = render_prometheus(snapshot.families());

    let mut response = Response::new(Body::from(payload));
    *response.status_mut() = StatusCode::OK;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE));

    Ok(response)
}
