use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone)]
pub struct ReplicateClient {
    client: Client,
    api_token: String,
}

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    version: &'a str,
    input: PredictionInput<'a>,
}

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: String,
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_POLLS: u32 = 55; // under the route's 120s timeout

impl ReplicateClient {
    pub fn new(api_token: &str) -> Self {
        Self {
            client: Client::new(),
            api_token: api_token.to_string(),
        }
    }

    /// Create a prediction and poll it to completion. Returns output image
    /// URLs on success.
    pub async fn generate_image(
        &self,
        model_version: &str,
        prompt: &str,
    ) -> Result<Vec<String>, String> {
        let request = PredictionRequest {
            version: model_version,
            input: PredictionInput { prompt },
        };

        let response = self
            .client
            .post("https://api.replicate.com/v1/predictions")
            .header("Authorization", format!("Token {}", self.api_token))
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("replicate request failed: {e}"))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("replicate API error: {body}"));
        }

        let mut prediction: Prediction = response
            .json()
            .await
            .map_err(|e| format!("replicate response parse failed: {e}"))?;

        let mut polls = 0;
        while matches!(prediction.status.as_str(), "starting" | "processing") {
            if polls >= MAX_POLLS {
                return Err("image generation timed out".to_string());
            }
            polls += 1;
            tokio::time::sleep(POLL_INTERVAL).await;

            let poll = self
                .client
                .get(format!(
                    "https://api.replicate.com/v1/predictions/{}",
                    prediction.id
                ))
                .header("Authorization", format!("Token {}", self.api_token))
                .send()
                .await
                .map_err(|e| format!("replicate poll failed: {e}"))?;

            prediction = poll
                .json()
                .await
                .map_err(|e| format!("replicate poll parse failed: {e}"))?;
        }

        if prediction.status != "succeeded" {
            return Err(prediction
                .error
                .unwrap_or_else(|| format!("prediction {}", prediction.status)));
        }

        let urls = match prediction.output {
            Some(serde_json::Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            Some(serde_json::Value::String(url)) => vec![url],
            _ => vec![],
        };

        Ok(urls)
    }
}
