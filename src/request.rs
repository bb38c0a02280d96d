//! Per-provider generation payloads

use log::trace;
use serde::{Deserialize, Serialize};

use crate::encoder::{EncodedInput, InputKind};
use crate::providers::HunyuanParameters;
use crate::ProviderId;

/// Tunables for every provider; each provider only ever sees its own
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderParameters
{   pub hunyuan: HunyuanParameters
}

impl ProviderParameters
{   /// Validate the tunables of the selected providers only
    pub fn validate_for(&self, selection: crate::Selection)
      -> Result<(), crate::error::Error>
    {   if selection.contains(ProviderId::Hunyuan)
        {   self.hunyuan.validate()?;
        }
        Ok(())
    }
}

/// Input under its wire key
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PayloadInput
{   Text
    {   text: String
    }
  , /// Always the plural key, one image or many
    Images
    {   images: Vec<String>
    }
}

/// JSON body posted to the generation endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationPayload
{   pub model_name: ProviderId
  , #[serde(flatten)]
    pub input: PayloadInput
  , #[serde(flatten)]
    pub hunyuan: Option<HunyuanParameters>
}

/// Build the payload for one provider. Pure.
pub fn build_payload(
  provider: ProviderId
, input: &EncodedInput
, params: &ProviderParameters
) -> GenerationPayload
{   let input = match input
    {   EncodedInput::Text(text) => {
          PayloadInput::Text { text: text.clone() }
        }
      , EncodedInput::Images(images) => {
          PayloadInput::Images { images: images.clone() }
        }
    };
    let hunyuan = match provider
    {   ProviderId::Hunyuan => Some(params.hunyuan.clone())
      , ProviderId::Trellis => None
    };
    GenerationPayload
    {   model_name: provider
      , input
      , hunyuan
    }
}

/// One provider's share of a submit; consumed by the dispatcher
#[derive(Debug, Clone)]
pub struct GenerationRequest
{   pub provider: ProviderId
  , pub kind: InputKind
  , pub payload: EncodedInput
  , pub parameters: ProviderParameters
}

impl GenerationRequest
{   pub fn new(
      provider: ProviderId
    , payload: EncodedInput
    , parameters: ProviderParameters
    ) -> Self
    {   GenerationRequest
        {   provider
          , kind: payload.kind()
          , payload
          , parameters
        }
    }

    pub fn into_payload(self) -> GenerationPayload
    {   let payload = build_payload(
          self.provider, &self.payload, &self.parameters
        );
        trace!(
          "Built {} payload ({:?} input)",
          self.provider, self.kind
        );
        payload
    }
}
