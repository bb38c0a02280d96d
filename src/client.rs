use log::{debug, error, info, trace};
use tokio::sync::mpsc;

use crate::config::{ClientConfig, RouteConfig};
use crate::encoder::{self, EncodedInput, RawInput};
use crate::request::{GenerationRequest, ProviderParameters};
use crate::session::{Session, SessionEvent};
use crate::{GenerationReply, ProviderId, Selection};

/// Dispatcher: fans one submit out to the selected providers
/// and feeds every settlement into the session.
pub struct GenClient
{   config: ClientConfig
  , http_client: reqwest::Client
  , session: Session
}

impl GenClient
{   /// Create a client with its own session.
    /// Must be called inside a tokio runtime.
    pub fn new(config: ClientConfig) -> Self
    {   debug!("Creating GenClient for {}", config.endpoint);
        GenClient
        {   config
          , http_client: reqwest::Client::new()
          , session: Session::new()
        }
    }

    /// Create a client from `GEN3D_API_ENDPOINT`
    pub fn from_env() -> Result<Self, crate::error::Error>
    {   Ok(GenClient::new(ClientConfig::from_env()?))
    }

    pub fn config(&self) -> &ClientConfig
    {   &self.config
    }

    pub fn session(&self) -> &Session
    {   &self.session
    }

    /// Start one request per selected provider - returns immediately.
    ///
    /// Input problems fail here, before any network I/O and without
    /// touching loading flags. On success every selected provider is
    /// already marked loading when this returns; each request then
    /// settles on its own.
    pub fn dispatch(
      &self
    , selection: Selection
    , input: RawInput
    , params: &ProviderParameters
    ) -> Result<DispatchHandle, crate::error::Error>
    {   debug!("dispatch {:?} ({:?} input)", selection, input.kind());

        let encoded = match prepare(selection, &input, params)
        {   Ok(encoded) => encoded
          , Err(e) => {
              error!("Rejected submit: {}", e);
              return Err(e);
            }
        };

        let providers = selection.providers();
        self.session.apply(
          SessionEvent::LoadingStarted(providers.clone())
        )?;

        let route = match encoded
        {   EncodedInput::Text(_) => &self.config.text_route
          , EncodedInput::Images(_) => &self.config.image_route
        };

        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        for provider in &providers
        {   let request = GenerationRequest::new(
              *provider, encoded.clone(), params.clone()
            );
            let job = GenerationJob
            {   http_client: self.http_client.clone()
              , url: self.config.url_for(route)
              , route: route.clone()
              , session: self.session.clone()
              , reply: reply_tx.clone()
            };
            tokio::spawn(async move {
              job.run(request).await;
            });
        }

        Ok(DispatchHandle
        {   providers
          , reply_rx
        })
    }

    /// Probe the backend's health route
    pub async fn health(&self) -> Result<String, crate::error::Error>
    {   let url = crate::config::join_url(
          &self.config.endpoint, "/health/"
        );
        debug!("Health check to {}", url);

        let response = self.http_client
          .get(&url)
          .send()
          .await
          .map_err(|e| {
            error!("Health check unreachable: {}", e);
            crate::error::Error::NetworkUnavailable(e.to_string())
          })?;

        let status = response.status();
        trace!("Health status: {}", status);
        let text = response.text().await?;

        if !status.is_success()
        {   error!("Health check failed ({}): {}", status, text);
            return Err(crate::error::Error::Upstream
            {   status: status.as_u16()
              , message: text
            });
        }
        Ok(text)
    }
}

/// Validate and encode a submit without side effects
fn prepare(
  selection: Selection
, input: &RawInput
, params: &ProviderParameters
) -> Result<EncodedInput, crate::error::Error>
{   if let RawInput::Text(text) = input
    {   if text.trim().is_empty()
        {   return Err(crate::error::Error::InvalidInput(
              "Prompt is empty".to_string()
            ));
        }
    }
    params.validate_for(selection)?;
    encoder::encode(input)
}

/// Replies for one dispatch, delivered in settlement order
pub struct DispatchHandle
{   providers: Vec<ProviderId>
  , reply_rx: mpsc::UnboundedReceiver<GenerationReply>
}

impl DispatchHandle
{   pub fn providers(&self) -> &[ProviderId]
    {   &self.providers
    }

    /// Next provider to settle; None once all have
    pub async fn next(&mut self) -> Option<GenerationReply>
    {   self.reply_rx.recv().await
    }
}

/// Everything one spawned request needs
struct GenerationJob
{   http_client: reqwest::Client
  , url: String
  , route: RouteConfig
  , session: Session
  , reply: crate::GenerationReplySender
}

impl GenerationJob
{   async fn run(self, request: GenerationRequest)
    {   let provider = request.provider;
        let result = self.send(request).await;

        let event = match &result
        {   Ok(blob) => {
              info!("{} produced {} bytes", provider, blob.len());
              SessionEvent::Succeeded(provider, blob.clone())
            }
          , Err(e) => {
              error!("{} failed: {}", provider, e);
              SessionEvent::Failed(provider, e.clone())
            }
        };
        if self.session.apply(event).is_err()
        {   debug!("Session gone before {} settled", provider);
        }
        let _ = self.reply.send(GenerationReply { provider, result });
    }

    async fn send(&self, request: GenerationRequest)
      -> crate::GenerationResult
    {   let provider = request.provider;
        let payload = request.into_payload();
        debug!("POST {} for {}", self.url, provider);

        let response = self.http_client
          .post(&self.url)
          .header("Content-Type", "application/json")
          .json(&payload)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error for {}: {}", provider, e);
            crate::error::Error::NetworkUnavailable(e.to_string())
          })?;

        crate::decoder::decode_response(
          response, self.route.transport
        ).await
    }
}
