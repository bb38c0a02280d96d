pub mod error;
pub mod config;
pub mod providers;
pub mod encoder;
pub mod request;
pub mod decoder;
pub mod session;
pub mod client;
pub mod relay;
use serde::{Deserialize, Serialize};

/*

gen3d: one submit, one or two 3D models back.

A text prompt or a batch of images goes out to one or both
generation providers at the same time; each reply (raw GLB bytes
or base64 inside JSON) becomes a ModelBlob in that provider's
outcome slot. The two slots never wait on each other.

gen3d/
├── src/
│   ├── lib.rs          # Provider ids, selection, reply types
│   ├── error.rs        # Error + ErrorKind
│   ├── config.rs       # Client / relay configuration
│   ├── encoder.rs      # Raw input -> transport-ready input
│   ├── request.rs      # Per-provider payload builder
│   ├── providers/      # Provider-specific tunables
│   ├── decoder.rs      # HTTP response -> ModelBlob
│   ├── session.rs      # Outcome slots, reducer, session handle
│   ├── client.rs       # Dispatcher (fan-out to providers)
│   ├── relay.rs        # Passthrough relay (axum)
│   └── main.rs         # CLI
└── tests/

*/

pub use client::{DispatchHandle, GenClient};
pub use decoder::{ModelBlob, TransportMode};
pub use encoder::{EncodedInput, ImageFile, RawInput};
pub use error::{Error, ErrorKind};
pub use request::{GenerationRequest, ProviderParameters};
pub use session::{
  GenerationOutcome, ProviderResult, Session, SessionEvent, SessionState
};

/// GEN3D API INTERFACE:

// ===== Generation =====

pub type GenerationResult = Result<ModelBlob, crate::error::Error>;

/// One provider's settled request, as delivered to a DispatchHandle
#[derive(Debug, Clone)]
pub struct GenerationReply
{   pub provider: ProviderId
  , pub result: GenerationResult
}

pub type GenerationReplySender
  = tokio::sync::mpsc::UnboundedSender<GenerationReply>;

/// GEN3D STRUCTURES:

/// The two generation backends.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
  Deserialize, Serialize
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId
{
  /// Trellis: fast, server-side defaults only
  Trellis
  ,
  /// Hunyuan3D: slower, accepts sampling tunables
  Hunyuan
}

impl ProviderId
{   pub const ALL: [ProviderId; 2]
      = [ProviderId::Trellis, ProviderId::Hunyuan];

    /// Wire name, sent as `model_name`
    pub fn as_str(&self) -> &'static str
    {   match self
        {   ProviderId::Trellis => "trellis"
          , ProviderId::Hunyuan => "hunyuan"
        }
    }
}

impl std::fmt::Display for ProviderId
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
      -> std::fmt::Result
    {   f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderId
{   type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   match s.trim().to_ascii_lowercase().as_str()
        {   "trellis" | "a" => Ok(ProviderId::Trellis)
          , "hunyuan" | "b" => Ok(ProviderId::Hunyuan)
          , other => Err(crate::error::Error::InvalidInput(
              format!("Unknown provider: {}", other)
            ))
        }
    }
}

/// Which providers one submission goes to. Never empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection
{   Trellis
  , Hunyuan
  , Both
}

impl Selection
{   /// Build from an explicit provider list
    pub fn from_providers(providers: &[ProviderId])
      -> Result<Self, crate::error::Error>
    {   let trellis = providers.contains(&ProviderId::Trellis);
        let hunyuan = providers.contains(&ProviderId::Hunyuan);
        match (trellis, hunyuan)
        {   (true, true) => Ok(Selection::Both)
          , (true, false) => Ok(Selection::Trellis)
          , (false, true) => Ok(Selection::Hunyuan)
          , (false, false) => Err(crate::error::Error::InvalidInput(
              "Selection must name at least one provider"
                .to_string()
            ))
        }
    }

    /// Selected providers, Trellis first
    pub fn providers(&self) -> Vec<ProviderId>
    {   match self
        {   Selection::Trellis => vec![ProviderId::Trellis]
          , Selection::Hunyuan => vec![ProviderId::Hunyuan]
          , Selection::Both => ProviderId::ALL.to_vec()
        }
    }

    pub fn contains(&self, provider: ProviderId) -> bool
    {   self.providers().contains(&provider)
    }
}

impl From<ProviderId> for Selection
{   fn from(provider: ProviderId) -> Self
    {   match provider
        {   ProviderId::Trellis => Selection::Trellis
          , ProviderId::Hunyuan => Selection::Hunyuan
        }
    }
}

impl std::str::FromStr for Selection
{   type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   match s.trim().to_ascii_lowercase().as_str()
        {   "both" | "all" => Ok(Selection::Both)
          , other => other.parse::<ProviderId>().map(Selection::from)
        }
    }
}
