use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gen3d::config::{ClientConfig, RelayConfig};
use gen3d::providers::HunyuanParameters;
use gen3d::{
  GenClient, ImageFile, ProviderParameters, RawInput, Selection
};
use log::{error, info};

#[derive(Parser)]
#[command(name = "gen3d", about = "Generate 3D models from text or images")]
struct Cli
{   #[command(subcommand)]
    command: Command
}

#[derive(Subcommand)]
enum Command
{   /// Submit a prompt or images to one or both providers
    Generate(GenerateArgs)
  , /// Probe the generation backend
    Health
    {   #[arg(long, env = "GEN3D_API_ENDPOINT")]
        endpoint: String
    }
  , /// Serve the passthrough relay
    Relay
    {   /// Overrides RELAY_PORT
        #[arg(long)]
        port: Option<u16>
    }
}

#[derive(clap::Args)]
struct GenerateArgs
{   #[arg(long, env = "GEN3D_API_ENDPOINT")]
    endpoint: String
  , /// trellis, hunyuan or both
    #[arg(long, default_value = "both")]
    model: Selection
  , #[arg(long, conflicts_with = "image", required_unless_present = "image")]
    text: Option<String>
  , #[arg(long, num_args = 1..)]
    image: Vec<PathBuf>
  , #[arg(long, default_value = ".")]
    out: PathBuf
  , #[arg(long, default_value_t = 5)]
    steps: u32
  , #[arg(long, default_value_t = 128)]
    octree: u32
  , #[arg(long, default_value_t = 5.0)]
    guidance: f32
  , #[arg(long, default_value_t = 1234)]
    seed: u64
  , #[arg(long, default_value_t = 40000)]
    face_count: u32
  , #[arg(long)]
    no_texture: bool
}

impl GenerateArgs
{   fn parameters(&self) -> ProviderParameters
    {   ProviderParameters
        {   hunyuan: HunyuanParameters
            {   num_inference_steps: self.steps
              , octree_resolution: self.octree
              , guidance_scale: self.guidance
              , seed: self.seed
              , texture: !self.no_texture
              , face_count: self.face_count
              , ..HunyuanParameters::default()
            }
        }
    }

    fn input(&self) -> Result<RawInput, gen3d::Error>
    {   match &self.text
        {   Some(text) => Ok(RawInput::Text(text.clone()))
          , None => {
              let files = self.image
                .iter()
                .map(ImageFile::open)
                .collect::<Result<Vec<_>, _>>()?;
              Ok(RawInput::Images(files))
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), gen3d::Error>
{   let _ = dotenvy::dotenv();
    env_logger::init();
    let cli = Cli::parse();

    match cli.command
    {   Command::Generate(args) => generate(args).await
      , Command::Health { endpoint } => {
          let client = GenClient::new(ClientConfig::new(endpoint));
          let body = client.health().await?;
          println!("{}", body);
          Ok(())
        }
      , Command::Relay { port } => {
          let mut config = RelayConfig::from_env()?;
          if let Some(port) = port
          {   config.port = port;
          }
          gen3d::relay::serve(config).await
        }
    }
}

async fn generate(args: GenerateArgs) -> Result<(), gen3d::Error>
{   let client = GenClient::new(ClientConfig::new(args.endpoint.clone()));
    let mut handle = client.dispatch(
      args.model, args.input()?, &args.parameters()
    )?;

    let mut failures = 0;
    let mut last_error = None;
    while let Some(reply) = handle.next().await
    {   match reply.result
        {   Ok(blob) => {
              let path = blob.save(&args.out, reply.provider)?;
              info!("{}: saved {}", reply.provider, path.display());
              println!("{} -> {}", reply.provider, path.display());
            }
          , Err(e) => {
              error!("{}: {}", reply.provider, e);
              eprintln!("{} failed: {}", reply.provider, e);
              failures += 1;
              last_error = Some(e);
            }
        }
    }

    match last_error
    {   Some(e) if failures == handle.providers().len() => Err(e)
      , _ => Ok(())
    }
}
