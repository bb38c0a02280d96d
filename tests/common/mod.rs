//! In-process stand-in for the generation backend

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tokio::net::TcpListener;

/// What the mock answers for one provider
#[derive(Debug, Clone)]
pub enum MockReply
{   /// `{ "glb": "<base64>" }`
    Base64(Vec<u8>)
  , /// `{ "glb": "data:model/gltf-binary;base64,<base64>" }`
    DataUrl(Vec<u8>)
  , /// 200 JSON without a glb field
    MissingGlb
  , /// Raw GLB body
    Binary(Vec<u8>)
  , /// Error status with a text body
    Status(u16, &'static str)
  , Delayed(Duration, Box<MockReply>)
}

impl MockReply
{   pub fn delayed(ms: u64, reply: MockReply) -> Self
    {   MockReply::Delayed(Duration::from_millis(ms), Box::new(reply))
    }
}

pub struct MockState
{   pub trellis: MockReply
  , pub hunyuan: MockReply
  , pub hits: AtomicUsize
  , pub payloads: Mutex<Vec<serde_json::Value>>
}

pub struct MockUpstream
{   pub base: String
  , pub state: Arc<MockState>
}

impl MockUpstream
{   pub fn hits(&self) -> usize
    {   self.state.hits.load(Ordering::SeqCst)
    }

    pub fn payloads(&self) -> Vec<serde_json::Value>
    {   self.state.payloads.lock().unwrap().clone()
    }
}

pub async fn spawn_upstream(
  trellis: MockReply
, hunyuan: MockReply
) -> MockUpstream
{   let state = Arc::new(MockState
    {   trellis
      , hunyuan
      , hits: AtomicUsize::new(0)
      , payloads: Mutex::new(vec![])
    });

    let app = Router::new()
      .route("/generate_from_text/", post(generate))
      .route("/generate_from_image/", post(generate))
      .route("/health/", get(|| async { "ok" }))
      .with_state(state.clone());

    let base = serve(app).await;
    MockUpstream { base, state }
}

/// Serve a router on an ephemeral local port, returning its base URL
pub async fn serve(app: Router) -> String
{   let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base URL nothing listens on
pub async fn dead_base() -> String
{   let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn generate(
  State(state): State<Arc<MockState>>
, body: Bytes
) -> Response
{   state.hits.fetch_add(1, Ordering::SeqCst);
    let payload: serde_json::Value
      = serde_json::from_slice(&body).unwrap_or_default();
    state.payloads.lock().unwrap().push(payload.clone());

    let reply = match payload["model_name"].as_str()
    {   Some("trellis") => state.trellis.clone()
      , Some("hunyuan") => state.hunyuan.clone()
      , _ => MockReply::Status(400, "unknown model_name")
    };
    render(reply).await
}

async fn render(mut reply: MockReply) -> Response
{   while let MockReply::Delayed(delay, inner) = reply
    {   tokio::time::sleep(delay).await;
        reply = *inner;
    }
    match reply
    {   MockReply::Base64(bytes) => {
          axum::Json(serde_json::json!({ "glb": BASE64.encode(bytes) }))
            .into_response()
        }
      , MockReply::DataUrl(bytes) => {
          let glb = format!(
            "data:model/gltf-binary;base64,{}",
            BASE64.encode(bytes)
          );
          axum::Json(serde_json::json!({ "glb": glb })).into_response()
        }
      , MockReply::MissingGlb => {
          axum::Json(serde_json::json!({ "status": "done" }))
            .into_response()
        }
      , MockReply::Binary(bytes) => {
          (
            [
              (header::CONTENT_TYPE, "model/gltf-binary")
            , (header::CONTENT_DISPOSITION,
                "attachment; filename=\"model.glb\"")
            ],
            bytes
          ).into_response()
        }
      , MockReply::Status(code, text) => {
          let status = StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
          (status, text).into_response()
        }
      , MockReply::Delayed(..) => unreachable!()
    }
}
