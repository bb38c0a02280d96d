//! Provider-specific tunables
//!
//! Trellis takes no tunables (the server uses its defaults),
//! so only Hunyuan has a module here.

pub mod hunyuan;

pub use hunyuan::HunyuanParameters;
