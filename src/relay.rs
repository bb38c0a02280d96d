//! Passthrough relay: forwards generation and health calls to the
//! configured upstream and relays its reply unchanged.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use log::{debug, error, info, trace};
use tokio::net::TcpListener;

use crate::config::{join_url, RelayConfig};

/// One relayed route
#[derive(Debug, Clone)]
struct RelayTarget
{   method: Method
  , upstream_path: &'static str
  , /// Body sent when the upstream fails with an empty one
    error_fallback: &'static str
  , /// Forced on success instead of the upstream's content type
    success_content_type: Option<&'static str>
}

const TEXT_TARGET: RelayTarget = RelayTarget
{   method: Method::POST
  , upstream_path: "/generate_from_text/"
  , error_fallback: "Upstream error"
  , success_content_type: None
};

const IMAGE_TARGET: RelayTarget = RelayTarget
{   method: Method::POST
  , upstream_path: "/generate_from_image/"
  , error_fallback: "Upstream error"
  , success_content_type: None
};

const HEALTH_TARGET: RelayTarget = RelayTarget
{   method: Method::GET
  , upstream_path: "/health/"
  , error_fallback: "Health check failed"
  , success_content_type: Some("text/plain")
};

struct RelayState
{   upstream_base: Option<String>
  , http_client: reqwest::Client
}

/// Build the relay router
pub fn router(config: &RelayConfig) -> Router
{   let state = Arc::new(RelayState
    {   upstream_base: config.upstream_base.clone()
      , http_client: reqwest::Client::new()
    });

    Router::new()
      .route("/api/generate_from_text", any(relay_text))
      .route("/api/generate_from_image", any(relay_image))
      .route("/api/health", any(relay_health))
      .with_state(state)
}

/// Serve the relay until the process exits
pub async fn serve(config: RelayConfig)
  -> Result<(), crate::error::Error>
{   let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    if config.upstream_base.is_none()
    {   error!("UPSTREAM_API_BASE is not set; every request will fail");
    }

    let listener = TcpListener::bind(addr).await?;
    info!("Starting relay on port {}", config.port);
    axum::serve(listener, router(&config)).await?;
    Ok(())
}

async fn relay_text(
  State(state): State<Arc<RelayState>>
, method: Method
, body: Bytes
) -> Response
{   forward(&state, method, body, &TEXT_TARGET).await
}

async fn relay_image(
  State(state): State<Arc<RelayState>>
, method: Method
, body: Bytes
) -> Response
{   forward(&state, method, body, &IMAGE_TARGET).await
}

async fn relay_health(
  State(state): State<Arc<RelayState>>
, method: Method
) -> Response
{   forward(&state, method, Bytes::new(), &HEALTH_TARGET).await
}

fn preflight(target: &RelayTarget) -> Response
{   let mut headers = HeaderMap::new();
    headers.insert(
      header::ACCESS_CONTROL_ALLOW_ORIGIN,
      HeaderValue::from_static("*")
    );
    if let Ok(methods) = HeaderValue::from_str(
      &format!("{}, OPTIONS", target.method)
    )
    {   headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, methods);
    }
    headers.insert(
      header::ACCESS_CONTROL_ALLOW_HEADERS,
      HeaderValue::from_static("Content-Type")
    );
    (StatusCode::NO_CONTENT, headers).into_response()
}

async fn forward(
  state: &RelayState
, method: Method
, body: Bytes
, target: &RelayTarget
) -> Response
{   if method == Method::OPTIONS
    {   return preflight(target);
    }
    if method != target.method
    {   return (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
          .into_response();
    }

    let Some(base) = state.upstream_base.as_deref()
    else
    {   error!("Relay request with no upstream configured");
        return (
          StatusCode::INTERNAL_SERVER_ERROR,
          "Missing UPSTREAM_API_BASE"
        ).into_response();
    };

    let url = join_url(base, target.upstream_path);
    debug!("Relaying {} to {} ({} bytes)", method, url, body.len());

    let request = if target.method == Method::POST
    {   state.http_client
          .post(&url)
          .header(header::CONTENT_TYPE, "application/json")
          .body(body)
    } else
    {   state.http_client.get(&url)
    };

    let upstream = match request.send().await
    {   Ok(upstream) => upstream
      , Err(e) => {
          error!("Upstream unavailable at {}: {}", url, e);
          return (
            StatusCode::BAD_GATEWAY,
            format!("Upstream unavailable: {}", e)
          ).into_response();
        }
    };

    let status = upstream.status();
    trace!("Upstream status: {}", status);

    let mut headers = HeaderMap::new();
    let content_type = match target.success_content_type
    {   Some(forced) if status.is_success() => {
          HeaderValue::from_static(forced)
        }
      , _ => upstream.headers()
          .get(header::CONTENT_TYPE)
          .cloned()
          .unwrap_or_else(|| {
            HeaderValue::from_static("application/octet-stream")
          })
    };
    headers.insert(header::CONTENT_TYPE, content_type);
    if let Some(disposition)
      = upstream.headers().get(header::CONTENT_DISPOSITION)
    {   headers.insert(header::CONTENT_DISPOSITION, disposition.clone());
    }

    match upstream.bytes().await
    {   Ok(bytes) if !status.is_success() && bytes.is_empty() => {
          error!("Upstream {} with empty body", status);
          headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain")
          );
          (status, headers, target.error_fallback).into_response()
        }
      , Ok(bytes) => {
          debug!("Relayed {} bytes ({})", bytes.len(), status);
          (status, headers, bytes).into_response()
        }
      , Err(e) => {
          error!("Failed reading upstream body: {}", e);
          (
            StatusCode::BAD_GATEWAY,
            format!("Upstream unavailable: {}", e)
          ).into_response()
        }
    }
}
