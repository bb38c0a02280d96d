//! Configuration for the generation client and the passthrough relay

use log::debug;
use serde::{Deserialize, Serialize};

pub const ENDPOINT_ENV: &str = "GEN3D_API_ENDPOINT";
pub const UPSTREAM_ENV: &str = "UPSTREAM_API_BASE";
pub const RELAY_PORT_ENV: &str = "RELAY_PORT";

/// One generation flow: where it posts and how the reply is encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig
{   /// Path appended to the endpoint base
    pub path: String
  , /// Encoding of a successful reply body
    pub transport: crate::TransportMode
}

/// Generation client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig
{   /// Endpoint base URL (relay or backend)
    pub endpoint: String
  , /// Route used for text prompts
    pub text_route: RouteConfig
  , /// Route used for image batches
    pub image_route: RouteConfig
}

impl ClientConfig
{   /// Config with default routes for the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self
    {   ClientConfig
        {   endpoint: endpoint.into()
          , text_route: RouteConfig
            {   path: "/generate_from_text/".to_string()
              , transport: crate::TransportMode::JsonBase64
            }
          , image_route: RouteConfig
            {   path: "/generate_from_image/".to_string()
              , transport: crate::TransportMode::Binary
            }
        }
    }

    /// Load from the environment (and `.env` if present)
    pub fn from_env() -> Result<Self, crate::error::Error>
    {   let _ = dotenvy::dotenv();
        let endpoint = std::env::var(ENDPOINT_ENV)
          .map_err(|_| {
            crate::error::Error::InvalidConfiguration(
              format!("{} is not set", ENDPOINT_ENV)
            )
          })?;
        debug!("Client endpoint from env: {}", endpoint);
        Ok(ClientConfig::new(endpoint))
    }

    /// Full URL for a route
    pub fn url_for(&self, route: &RouteConfig) -> String
    {   join_url(&self.endpoint, &route.path)
    }
}

/// Passthrough relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig
{   /// Real generation backend; absence fails every request with 500
    pub upstream_base: Option<String>
  , /// Listen port
    pub port: u16
}

impl Default for RelayConfig
{   fn default() -> Self
    {   RelayConfig
        {   upstream_base: None
          , port: 3000
        }
    }
}

impl RelayConfig
{   /// Load from the environment (and `.env` if present)
    pub fn from_env() -> Result<Self, crate::error::Error>
    {   let _ = dotenvy::dotenv();
        let upstream_base = std::env::var(UPSTREAM_ENV)
          .ok()
          .filter(|s| !s.trim().is_empty());
        let port = match std::env::var(RELAY_PORT_ENV)
        {   Ok(raw) => raw.trim().parse::<u16>().map_err(|_| {
              crate::error::Error::InvalidConfiguration(
                format!("{} must be a port number: {}",
                  RELAY_PORT_ENV, raw)
              )
            })?
          , Err(_) => RelayConfig::default().port
        };
        debug!(
          "Relay config from env: upstream={:?} port={}",
          upstream_base, port
        );
        Ok(RelayConfig { upstream_base, port })
    }
}

/// Join a base URL and a path without doubling the slash
pub fn join_url(base: &str, path: &str) -> String
{   format!(
      "{}/{}",
      base.trim_end_matches('/'),
      path.trim_start_matches('/')
    )
}
