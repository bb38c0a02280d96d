//! HTTP response -> loadable model blob

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use log::{debug, error, trace};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const GLB_MEDIA_TYPE: &str = "model/gltf-binary";

/// How a successful generation reply carries the model.
/// Chosen by the flow, never sniffed from the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode
{   /// Body is the GLB itself
    Binary
  , /// Body is `{ "glb": "<base64 or data URL>" }`
    JsonBase64
}

/// In-memory handle to a generated model.
///
/// Cloning shares the bytes; the backing memory is freed once the
/// last handle (normally the one in the session's outcome slot)
/// is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelBlob
{   id: uuid::Uuid
  , media_type: String
  , bytes: Bytes
}

impl ModelBlob
{   pub fn new(bytes: Bytes, media_type: impl Into<String>) -> Self
    {   ModelBlob
        {   id: uuid::Uuid::new_v4()
          , media_type: media_type.into()
          , bytes
        }
    }

    pub fn id(&self) -> uuid::Uuid
    {   self.id
    }

    pub fn media_type(&self) -> &str
    {   &self.media_type
    }

    pub fn bytes(&self) -> &Bytes
    {   &self.bytes
    }

    pub fn len(&self) -> usize
    {   self.bytes.len()
    }

    pub fn is_empty(&self) -> bool
    {   self.bytes.is_empty()
    }

    /// File name used when exporting a provider's model
    pub fn download_name(provider: crate::ProviderId) -> String
    {   format!("generated-model-{}.glb", provider)
    }

    /// Write the model to `dir`, named after the provider
    pub fn save(
      &self
    , dir: impl AsRef<Path>
    , provider: crate::ProviderId
    ) -> Result<PathBuf, crate::error::Error>
    {   let path = dir.as_ref().join(Self::download_name(provider));
        std::fs::write(&path, &self.bytes).map_err(|e| {
          error!("Failed to save {}: {}", path.display(), e);
          crate::error::Error::Io(
            format!("{}: {}", path.display(), e)
          )
        })?;
        debug!("Saved {} bytes to {}", self.len(), path.display());
        Ok(path)
    }
}

#[derive(Debug, Deserialize)]
struct GlbEnvelope
{   glb: Option<String>
}

/// Decode a successful (2xx) body. Never looks at the status;
/// see `decode_response` for the full path.
pub fn decode(
  body: Bytes
, content_type: Option<&str>
, mode: TransportMode
) -> Result<ModelBlob, crate::error::Error>
{   match mode
    {   TransportMode::Binary => {
          let media_type = content_type
            .filter(|ct| !ct.is_empty())
            .unwrap_or(GLB_MEDIA_TYPE);
          trace!("Binary body: {} bytes ({})", body.len(), media_type);
          Ok(ModelBlob::new(body, media_type))
        }
      , TransportMode::JsonBase64 => {
          let envelope: GlbEnvelope = serde_json::from_slice(&body)
            .map_err(|e| {
              error!("Response is not JSON: {}", e);
              crate::error::Error::MalformedResponse(
                format!("Expected JSON body: {}", e)
              )
            })?;
          let glb = envelope.glb.ok_or_else(|| {
            error!("Response JSON has no glb field");
            crate::error::Error::MalformedResponse(
              "Response did not contain base64 data".to_string()
            )
          })?;
          let bytes = decode_base64_payload(&glb)?;
          trace!("Decoded glb field: {} bytes", bytes.len());
          Ok(ModelBlob::new(Bytes::from(bytes), GLB_MEDIA_TYPE))
        }
    }
}

/// Strip an optional `<mime>;base64,` prefix, then decode
fn decode_base64_payload(raw: &str)
  -> Result<Vec<u8>, crate::error::Error>
{   let data = raw
      .rsplit_once(";base64,")
      .map(|(_, data)| data)
      .unwrap_or(raw)
      .trim();
    BASE64.decode(data).map_err(|e| {
      error!("Invalid base64 in glb field: {}", e);
      crate::error::Error::MalformedResponse(
        format!("Invalid base64 payload: {}", e)
      )
    })
}

/// Turn a full HTTP response into a blob. A non-2xx status
/// short-circuits to `Upstream` carrying the body text.
pub async fn decode_response(
  response: reqwest::Response
, mode: TransportMode
) -> Result<ModelBlob, crate::error::Error>
{   let status = response.status();
    trace!("Generation response status: {}", status);

    if !status.is_success()
    {   let body = match response.text().await
        {   Ok(body) => body
          , Err(e) => {
              error!("Failed to read error body ({}): {}", status, e);
              String::new()
            }
        };
        let message = if body.is_empty()
        {   "Upstream error".to_string()
        } else
        {   body
        };
        error!("Generation failed ({}): {}", status, message);
        return Err(crate::error::Error::Upstream
        {   status: status.as_u16()
          , message
        });
    }

    let content_type = response.headers()
      .get(reqwest::header::CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(|s| s.to_string());

    let body = response.bytes().await.map_err(|e| {
      error!("Failed to read response body: {}", e);
      crate::error::Error::NetworkUnavailable(e.to_string())
    })?;

    decode(body, content_type.as_deref(), mode)
}
