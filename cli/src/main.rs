use clap::Parser;
use color_eyre::Result;
use engine::{GenerationRequest, ReplicateImageModel};
use log::{debug, warn};
use replicate_cli::{Config, TOKEN_VAR, cli::Cli, init_logger, load_env_file};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let env_file = load_env_file();
    init_logger();
    color_eyre::install()?;

    match env_file {
        Ok(Some(path)) => debug!("Loaded {}", path.display()),
        Ok(None) => debug!("No env file found"),
        Err(e) => warn!("Couldn't load env file: {e}"),
    }

    let config = Config::from_env()?;
    if config.api_token.is_none() {
        warn!("{TOKEN_VAR} is not set, Replicate will reject the request");
    }

    let model = ReplicateImageModel::new(config.api_token.clone().unwrap_or_default());
    let request = GenerationRequest::ghibsky(cli.prompt());
    engine::run(&model, &reqwest::Client::new(), &request, &config.run_config()).await;

    Ok(())
}
