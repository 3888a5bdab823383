use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use chrono::{DateTime, Local};
use color_eyre::Result;
use log::{error, info};
use reqwest::Client;

use crate::{
    download::download,
    image_model::{GenerationRequest, ImageModel, first_output_url},
};

const CLOCK_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// where artifacts are saved, created on first use
    pub target_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Saved(PathBuf),
    NoValidUrl,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub started: DateTime<Local>,
    pub stopped: DateTime<Local>,
    pub elapsed: Duration,
    pub outcome: Outcome,
}

impl RunReport {
    pub fn artifact(&self) -> Option<&Path> {
        match &self.outcome {
            Outcome::Saved(path) => Some(path),
            _ => None,
        }
    }
}

/// Runs one generation and saves its first output. Errors end up in the report, never in a panic,
/// and the stop time and elapsed time are logged on every path.
pub async fn run(
    model: &dyn ImageModel,
    client: &Client,
    request: &GenerationRequest,
    config: &RunConfig,
) -> RunReport {
    let started = Local::now();
    let timer = Instant::now();
    info!("{}", clock_line("Start", started));

    let outcome = match generate_and_save(model, client, request, config).await {
        Ok(Some(path)) => Outcome::Saved(path),
        Ok(None) => {
            error!("No valid URL found in the output.");
            Outcome::NoValidUrl
        }
        Err(e) => {
            error!("Error running replicate: {e:#}");
            Outcome::Failed(format!("{e:#}"))
        }
    };

    let elapsed = timer.elapsed();
    let stopped = Local::now();
    info!("{}", clock_line("Stop", stopped));
    info!("{}", elapsed_line(elapsed));

    RunReport {
        started,
        stopped,
        elapsed,
        outcome,
    }
}

fn clock_line(label: &str, at: DateTime<Local>) -> String {
    format!("{label} time: {}", at.format(CLOCK_FORMAT))
}

fn elapsed_line(elapsed: Duration) -> String {
    format!("Time elapsed: {:.2} seconds", elapsed.as_secs_f64())
}

async fn generate_and_save(
    model: &dyn ImageModel,
    client: &Client,
    request: &GenerationRequest,
    config: &RunConfig,
) -> Result<Option<PathBuf>> {
    let output = model.generate(request).await?;
    info!("Replicate output: {output}");

    match first_output_url(&output) {
        Some(url) => Ok(Some(download(client, url, &config.target_dir).await?)),
        None => Ok(None),
    }
}
