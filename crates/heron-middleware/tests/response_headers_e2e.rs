//! End-to-end tests for the response header stage running inside a pipeline.

use std::sync::Arc;

use bytes::Bytes;
use heron_core::{
    ApplyEvent, HeaderError, HeaderSpec, Phase, RecordingObserver, ResponseBody, ResponseHeaders,
};
use heron_middleware::{
    stages::ResponseHeadersMiddleware, FnHandler, Handler, MiddlewareContext, MiddlewareError,
    MiddlewareResult, Pipeline, Request, ResponseWriter,
};
use http::StatusCode;
use http_body_util::{BodyExt, Full};

fn make_request(path: &str) -> Request {
    http::Request::builder()
        .uri(path)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Joins every instance of a header the way a client would read it.
fn header_values(response: &ResponseWriter, name: &str) -> String {
    response
        .headers()
        .get_all(name)
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect::<Vec<_>>()
        .join(", ")
}

async fn serve(
    pipeline: &Pipeline,
    handler: &dyn Handler,
    response: &mut ResponseWriter,
) -> MiddlewareResult {
    let mut ctx = MiddlewareContext::new();
    pipeline
        .process(&mut ctx, make_request("/"), handler, response)
        .await
}

fn multi_value_params() -> Vec<(&'static str, &'static str)> {
    vec![
        ("x-header-1", "value1\nvalue2"),
        ("x-header-2", "value3"),
        ("x-header-3", ""),
        ("x-header-4", "value4\nvalue5"),
        ("x-header-5", "extra-value"),
    ]
}

#[tokio::test]
async fn test_multi_value_headers_and_existing_header() {
    let pipeline = Pipeline::builder()
        .stage(ResponseHeadersMiddleware::from_params(multi_value_params()))
        .build();
    let handler = FnHandler::new(|_ctx, _req, _response| Ok(()));

    let mut response = ResponseWriter::new();
    response.set_header("x-header-5", "existing-value").unwrap();
    serve(&pipeline, &handler, &mut response).await.unwrap();

    assert_eq!(header_values(&response, "x-header-1"), "value1, value2");
    assert_eq!(header_values(&response, "x-header-2"), "value3");
    assert!(!response.headers().contains_key("x-header-3"));
    assert_eq!(header_values(&response, "x-header-4"), "value4, value5");
    assert_eq!(
        header_values(&response, "x-header-5"),
        "existing-value, extra-value"
    );
    assert_eq!(response.headers().get_all("x-header-5").iter().count(), 2);
}

#[tokio::test]
async fn test_append_after_handler_merges_into_single_value() {
    let pipeline = Pipeline::builder()
        .stage(ResponseHeadersMiddleware::from_params([
            ("setHeadersAfterServlet", "true"),
            ("appendValues", "true"),
            ("x-header-to-append-or-replace", "set-by-filter"),
        ]))
        .build();
    let handler = FnHandler::new(|_ctx, _req, response| {
        response.set_header("x-header-to-append-or-replace", "set-by-servlet")?;
        response.write_text("<html></html>")?;
        Ok(())
    });

    let mut response = ResponseWriter::new();
    serve(&pipeline, &handler, &mut response).await.unwrap();

    let values: Vec<_> = response
        .headers()
        .get_all("x-header-to-append-or-replace")
        .iter()
        .collect();
    assert_eq!(values.len(), 1);
    assert_eq!(values[0], "set-by-servlet, set-by-filter");
    assert_eq!(response.body(), b"<html></html>");
}

#[tokio::test]
async fn test_before_handler_handler_can_override() {
    let pipeline = Pipeline::builder()
        .stage(ResponseHeadersMiddleware::from_params([(
            "cache-control",
            "no-store",
        )]))
        .build();
    let handler = FnHandler::new(|_ctx, _req, response| {
        response.set_header("cache-control", "max-age=60")?;
        Ok(())
    });

    let mut response = ResponseWriter::new();
    serve(&pipeline, &handler, &mut response).await.unwrap();

    assert_eq!(header_values(&response, "cache-control"), "max-age=60");
}

#[tokio::test]
async fn test_unbuffered_post_phase_fails_once_committed() {
    let pipeline = Pipeline::builder()
        .stage(
            ResponseHeadersMiddleware::from_params([
                ("setHeadersAfterServlet", "true"),
                ("x-late", "value"),
            ])
            .without_buffering(),
        )
        .build();
    let handler = FnHandler::new(|_ctx, _req, response| {
        response.write_bytes(b"streamed")?;
        Ok(())
    });

    let mut response = ResponseWriter::new();
    let err = serve(&pipeline, &handler, &mut response).await.unwrap_err();

    assert!(matches!(
        err,
        MiddlewareError::Header(HeaderError::Committed { ref name }) if name == "x-late"
    ));
    assert_eq!(err.code(), "RESPONSE_COMMITTED");
    assert_eq!(response.body(), b"streamed");
}

#[tokio::test]
async fn test_unbuffered_post_phase_works_when_body_empty() {
    let pipeline = Pipeline::builder()
        .stage(
            ResponseHeadersMiddleware::from_params([
                ("setHeadersAfterServlet", "true"),
                ("x-late", "value"),
            ])
            .without_buffering(),
        )
        .build();
    let handler = FnHandler::new(|_ctx, _req, response| {
        response.set_status(StatusCode::NO_CONTENT)?;
        Ok(())
    });

    let mut response = ResponseWriter::new();
    serve(&pipeline, &handler, &mut response).await.unwrap();

    assert_eq!(header_values(&response, "x-late"), "value");
    assert!(!response.is_committed());
}

#[tokio::test]
async fn test_downstream_failure_still_delivers_body() {
    let pipeline = Pipeline::builder()
        .stage(ResponseHeadersMiddleware::from_params([
            ("setHeadersAfterServlet", "true"),
            ("x-late", "value"),
        ]))
        .build();
    let handler = FnHandler::new(|_ctx, _req, response| {
        response.set_status(StatusCode::BAD_GATEWAY)?;
        response.write_text("upstream unavailable")?;
        Err(MiddlewareError::handler(StatusCode::BAD_GATEWAY, "upstream"))
    });

    let mut response = ResponseWriter::new();
    let err = serve(&pipeline, &handler, &mut response).await.unwrap_err();

    assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(response.body(), b"upstream unavailable");
    assert!(!response.headers().contains_key("x-late"));
    assert!(response.is_committed());
}

#[tokio::test]
async fn test_mixed_text_and_binary_body_keeps_order() {
    let pipeline = Pipeline::builder()
        .stage(ResponseHeadersMiddleware::from_params([
            ("setHeadersAfterServlet", "true"),
            ("content-type", "application/octet-stream"),
        ]))
        .build();
    let handler = FnHandler::new(|_ctx, _req, response| {
        response.write_text("head:")?;
        response.write_bytes(&[0x00, 0x01])?;
        response.write_text(":tail")?;
        Ok(())
    });

    let mut response = ResponseWriter::new();
    serve(&pipeline, &handler, &mut response).await.unwrap();

    let http_response = response.into_response();
    assert_eq!(
        http_response.headers()["content-type"],
        "application/octet-stream"
    );
    let body = http_response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"head:\x00\x01:tail");
}

#[tokio::test]
async fn test_shared_spec_across_concurrent_requests() {
    let spec = Arc::new(HeaderSpec::from_params([("x-shared", "a\nb")]));
    let observer = Arc::new(RecordingObserver::new());
    let pipeline = Arc::new(
        Pipeline::builder()
            .stage(ResponseHeadersMiddleware::new(spec).with_observer(observer.clone()))
            .build(),
    );
    let handler = Arc::new(FnHandler::new(|ctx, _req, response| {
        response.write_text(&ctx.request_id().to_string())?;
        Ok(())
    }));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let pipeline = pipeline.clone();
        let handler = handler.clone();
        tasks.push(tokio::spawn(async move {
            let mut response = ResponseWriter::new();
            serve(&pipeline, handler.as_ref(), &mut response)
                .await
                .unwrap();
            header_values(&response, "x-shared")
        }));
    }

    for task in tasks {
        assert_eq!(task.await.unwrap(), "a, b");
    }

    let phases = observer
        .events()
        .into_iter()
        .filter(|e| {
            matches!(
                e,
                ApplyEvent::PhaseStarted {
                    phase: Phase::BeforeDownstream,
                    ..
                }
            )
        })
        .count();
    assert_eq!(phases, 8);
}
