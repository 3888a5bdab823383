use std::{pin::Pin, time::Duration};

use color_eyre::Result;
use log::{debug, info};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::time::sleep;

use super::{GenerationRequest, ImageModel};

mod error;
pub use error::ReplicateError;

pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com/v1";

#[derive(Clone)]
pub struct ReplicateImageModel {
    client: Client,
    api_token: String,
    base_url: String,
    poll_interval: Duration,
}

impl ReplicateImageModel {
    pub fn new(api_token: String) -> Self {
        Self {
            client: Client::new(),
            api_token,
            base_url: DEFAULT_BASE_URL.into(),
            poll_interval: Duration::from_millis(500),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    async fn create_prediction(&self, request: &GenerationRequest) -> Result<Prediction> {
        let model = &request.model;
        let (url, body) = match &model.version {
            Some(version) => (
                format!("{}/predictions", self.base_url),
                json!({ "version": version, "input": request.input }),
            ),
            None => (
                format!(
                    "{}/models/{}/{}/predictions",
                    self.base_url, model.owner, model.name
                ),
                json!({ "input": request.input }),
            ),
        };
        debug!("Creating prediction for {model}: {body}");

        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;
        read_prediction(resp).await
    }

    async fn poll(&self, url: &str) -> Result<Prediction> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        read_prediction(resp).await
    }
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: String,
    #[serde(default)]
    output: Value,
    #[serde(default)]
    error: Option<Value>,
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    get: String,
}

async fn read_prediction(resp: Response) -> Result<Prediction> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(ReplicateError::from_status(status.as_u16(), &body).into());
    }
    debug!("Prediction: {body}");
    Ok(serde_json::from_str(&body)?)
}

impl ImageModel for ReplicateImageModel {
    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>> {
        Box::pin(async move {
            let mut prediction = self.create_prediction(request).await?;
            info!("Started prediction {}", prediction.id);

            loop {
                match prediction.status.as_str() {
                    "succeeded" => return Ok(prediction.output),
                    "failed" => {
                        let message = match prediction.error {
                            Some(Value::String(msg)) => msg,
                            Some(other) if !other.is_null() => other.to_string(),
                            _ => "unknown error".into(),
                        };
                        return Err(ReplicateError::PredictionFailed {
                            id: prediction.id,
                            message,
                        }
                        .into());
                    }
                    "canceled" => {
                        return Err(ReplicateError::PredictionCanceled { id: prediction.id }.into());
                    }
                    status => debug!("Prediction {} is {status}", prediction.id),
                }

                let Some(urls) = prediction.urls else {
                    return Err(ReplicateError::MissingPollUrl { id: prediction.id }.into());
                };
                sleep(self.poll_interval).await;
                prediction = self.poll(&urls.get).await?;
            }
        })
    }
}
