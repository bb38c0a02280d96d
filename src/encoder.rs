//! Raw user input -> transport-ready input

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{debug, error};
use std::path::Path;

/// One user-selected image file, fully read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile
{   pub name: String
  , /// Declared media type (e.g. `image/png`)
    pub media_type: String
  , pub bytes: Vec<u8>
}

impl ImageFile
{   pub fn new(
      name: impl Into<String>
    , media_type: impl Into<String>
    , bytes: Vec<u8>
    ) -> Self
    {   ImageFile
        {   name: name.into()
          , media_type: media_type.into()
          , bytes
        }
    }

    /// Read a file from disk, declaring its media type
    /// from the extension
    pub fn open(path: impl AsRef<Path>)
      -> Result<Self, crate::error::Error>
    {   let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
          error!("Failed to read {}: {}", path.display(), e);
          crate::error::Error::Io(
            format!("{}: {}", path.display(), e)
          )
        })?;
        let name = path.file_name()
          .map(|n| n.to_string_lossy().into_owned())
          .unwrap_or_default();
        Ok(ImageFile::new(name, media_type_for(path), bytes))
    }

    pub fn is_image(&self) -> bool
    {   self.media_type.starts_with("image/")
    }
}

fn media_type_for(path: &Path) -> &'static str
{   let ext = path.extension()
      .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match ext.as_deref()
    {   Some("png") => "image/png"
      , Some("jpg") | Some("jpeg") => "image/jpeg"
      , Some("webp") => "image/webp"
      , Some("gif") => "image/gif"
      , Some("bmp") => "image/bmp"
      , _ => "application/octet-stream"
    }
}

/// What the user submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput
{   Text(String)
  , Images(Vec<ImageFile>)
}

impl RawInput
{   pub fn kind(&self) -> InputKind
    {   match self
        {   RawInput::Text(_) => InputKind::Text
          , RawInput::Images(_) => InputKind::Image
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind
{   Text
  , Image
}

/// Transport-ready input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedInput
{   Text(String)
  , /// Base64 image bytes, in selection order
    Images(Vec<String>)
}

impl EncodedInput
{   pub fn kind(&self) -> InputKind
    {   match self
        {   EncodedInput::Text(_) => InputKind::Text
          , EncodedInput::Images(_) => InputKind::Image
        }
    }
}

/// Encode raw input. Text passes through untouched (callers reject
/// blank prompts first); images are base64-encoded in order, and a
/// single non-image file fails the whole batch.
pub fn encode(input: &RawInput)
  -> Result<EncodedInput, crate::error::Error>
{   match input
    {   RawInput::Text(text) => Ok(EncodedInput::Text(text.clone()))
      , RawInput::Images(files) => {
          if files.is_empty()
          {   return Err(crate::error::Error::InvalidInput(
                "No images selected".to_string()
              ));
          }
          if let Some(bad) = files.iter().find(|f| !f.is_image())
          {   error!(
                "Rejecting {} ({}): not an image",
                bad.name, bad.media_type
              );
              return Err(crate::error::Error::InvalidInput(
                format!(
                  "{} is not an image file ({})",
                  bad.name, bad.media_type
                )
              ));
          }
          let encoded: Vec<String> = files
            .iter()
            .map(|f| BASE64.encode(&f.bytes))
            .collect();
          debug!("Encoded {} images", encoded.len());
          Ok(EncodedInput::Images(encoded))
        }
    }
}
