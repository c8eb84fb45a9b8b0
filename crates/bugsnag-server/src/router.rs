use std::sync::Arc;

use axum::{Router, routing::get};
use bugsnag_collector::EventCollector;

use crate::handlers::prometheus_metrics;

pub fn exporter_router(collector: Arc<EventCollector>) -> Router {
    Router::new()
        .route("/", get(prometheus_metrics))
        .route("/metrics", get(prometheus_metrics))
        .with_state(collector)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use bugsnag_api::{ErrorRecord, ErrorSource, Organization, Project};
    use bugsnag_collector::{BucketThresholds, EventCollector};
    use bugsnag_common::{ExporterError, Result, SystemClock};
    use futures::{
        StreamExt,
        stream::{self, BoxStream},
    };
    use tower::ServiceExt;

    use super::exporter_router;

    struct SingleProject {
        fail: bool,
    }

    impl ErrorSource for SingleProject {
        fn organizations(&self) -> BoxStream<'_, Result<Organization>> {
            if self.fail {
                return stream::iter(vec![Err(ExporterError::RemoteApi {
                    status: 401,
                    reason: "Unauthorized".to_string(),
                    body: "bad token".to_string(),
                })])
                .boxed();
            }
            stream::iter(vec![Ok(Organization {
                id: "org".to_string(),
                name: "Org".to_string(),
            })])
            .boxed()
        }

        fn projects(&self, _organization: &Organization) -> BoxStream<'_, Result<Project>> {
            stream::iter(vec![Ok(Project {
                id: "p".to_string(),
                name: "web".to_string(),
            })])
            .boxed()
        }

        fn open_errors(&self, _project: &Project) -> BoxStream<'_, Result<ErrorRecord>> {
            stream::iter(vec![Ok(ErrorRecord {
                events: 7,
                release_stages: vec!["production".to_string()],
            })])
            .boxed()
        }
    }

    fn app(fail: bool) -> axum::Router {
        let collector = EventCollector::new(
            Arc::new(SingleProject { fail }),
            BucketThresholds::parse("10").unwrap(),
            Duration::from_secs(600),
            Arc::new(SystemClock),
        );
        exporter_router(Arc::new(collector))
    }

    #[tokio::test]
    async fn serves_text_exposition() {
        for uri in ["/metrics", "/"] {
            let response = app(false)
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers()[header::CONTENT_TYPE],
                "text/plain; version=0.0.4; charset=utf-8"
            );

            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body = String::from_utf8(body.to_vec()).unwrap();
            assert!(body.contains("bugsnag_events_bucket{project=\"web\",release_stage=\"production\",le=\"10\"} 1\n"));
            assert!(body.contains("bugsnag_events_sum{project=\"web\",release_stage=\"production\"} 7\n"));
        }
    }

    #[tokio::test]
    async fn remote_failure_maps_to_bad_gateway() {
        let response = app(true)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload["code"], "RemoteAPIError");
        assert!(payload["message"].as_str().unwrap().contains("bad token"));
    }
}
