use clap::Parser;
use color_eyre::Result;
use engine::{GenerationRequest, ImageModel, ReplicateImageModel};

/// Runs the ghibsky model once and prints the raw output without downloading it.
#[derive(clap::Parser)]
struct Arg {
    api_token: String,
    prompt: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();
    let Arg { api_token, prompt } = Arg::parse();

    let model = ReplicateImageModel::new(api_token);
    let output = model.generate(&GenerationRequest::ghibsky(prompt)).await?;
    println!("{output:#}");

    Ok(())
}
