/// HTTP inference provider
///
/// Posts the current preference record and the recent feedback window to an
/// external inference service and expects a structured preference delta back.
/// The request carries a client-side timeout so a slow service can never hang
/// the refinement worker.
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{Domain, FeedbackEvent, ProposedUpdate, StoredPreferences},
    services::providers::InferenceProvider,
};

#[derive(Clone)]
pub struct HttpInferenceProvider {
    http_client: HttpClient,
    api_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ProposeRequest<'a> {
    current_preferences: &'a StoredPreferences,
    recent_feedback: &'a [FeedbackEvent],
    domain: Domain,
}

impl HttpInferenceProvider {
    pub fn new(api_url: String, api_key: Option<String>, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_url,
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl InferenceProvider for HttpInferenceProvider {
    async fn propose(
        &self,
        current: &StoredPreferences,
        recent: &[FeedbackEvent],
        domain: Domain,
    ) -> AppResult<ProposedUpdate> {
        let url = format!("{}/v1/preferences/propose", self.api_url);

        let mut request = self.http_client.post(&url).json(&ProposeRequest {
            current_preferences: current,
            recent_feedback: recent,
            domain,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "Inference service returned {}",
                response.status()
            )));
        }

        let update: ProposedUpdate = response
            .json()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Invalid inference response: {e}")))?;

        Ok(update)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
