use log::{debug, error};
use serde::{Deserialize, Serialize};

pub const INFERENCE_STEPS_RANGE: std::ops::RangeInclusive<u32> = 1..=20;
pub const OCTREE_RESOLUTIONS: [u32; 4] = [64, 128, 192, 256];
pub const GUIDANCE_SCALE_RANGE: std::ops::RangeInclusive<f32>
  = 1.0..=10.0;

/// Hunyuan3D sampling tunables, serialized flat into the payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HunyuanParameters
{   pub num_inference_steps: u32
  , pub octree_resolution: u32
  , pub guidance_scale: f32
  , pub seed: u64
  , pub texture: bool
  , pub face_count: u32
  , /// Output format; the backend only produces GLB
    #[serde(rename = "type")]
    pub output_type: String
}

impl Default for HunyuanParameters
{   fn default() -> Self
    {   HunyuanParameters
        {   num_inference_steps: 5
          , octree_resolution: 128
          , guidance_scale: 5.0
          , seed: 1234
          , texture: true
          , face_count: 40000
          , output_type: "glb".to_string()
        }
    }
}

impl HunyuanParameters
{   /// Reject out-of-range values before anything is sent
    pub fn validate(&self) -> Result<(), crate::error::Error>
    {   debug!("Validating Hunyuan parameters: {:?}", self);

        if !INFERENCE_STEPS_RANGE.contains(&self.num_inference_steps)
        {   return Err(invalid(format!(
              "num_inference_steps must be in {}..={}, got {}",
              INFERENCE_STEPS_RANGE.start(),
              INFERENCE_STEPS_RANGE.end(),
              self.num_inference_steps
            )));
        }
        if !OCTREE_RESOLUTIONS.contains(&self.octree_resolution)
        {   return Err(invalid(format!(
              "octree_resolution must be one of {:?}, got {}",
              OCTREE_RESOLUTIONS, self.octree_resolution
            )));
        }
        if !GUIDANCE_SCALE_RANGE.contains(&self.guidance_scale)
        {   return Err(invalid(format!(
              "guidance_scale must be in {}..={}, got {}",
              GUIDANCE_SCALE_RANGE.start(),
              GUIDANCE_SCALE_RANGE.end(),
              self.guidance_scale
            )));
        }
        if self.face_count == 0
        {   return Err(invalid(
              "face_count must be positive".to_string()
            ));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> crate::error::Error
{   error!("Invalid Hunyuan parameters: {}", msg);
    crate::error::Error::InvalidInput(msg)
}
