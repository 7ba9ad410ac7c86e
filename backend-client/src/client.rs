use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::protocol::ANALYZE_PATH;
use crate::protocol::AUTO_VALIDATE_PATH;
use crate::protocol::AnalyzeRequest;
use crate::protocol::AutoValidateRequest;
use crate::protocol::CLARIFY_PATH;
use crate::protocol::CONFIRM_SUMMARY_PATH;
use crate::protocol::ClarifyRequest;
use crate::protocol::ConfirmSummaryRequest;
use crate::protocol::TOPIC_SHIFT_CHOICE_PATH;
use crate::protocol::TicketRecord;
use crate::protocol::TopicShiftRequest;
use crate::protocol::WorkflowReply;
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use tracing::warn;

/// The workflow endpoints the intake tracker talks to.
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    async fn analyze(&self, request: AnalyzeRequest) -> Result<WorkflowReply, ClientError>;

    async fn auto_validate(
        &self,
        request: AutoValidateRequest,
    ) -> Result<WorkflowReply, ClientError>;

    async fn confirm_summary(
        &self,
        request: ConfirmSummaryRequest,
    ) -> Result<TicketRecord, ClientError>;

    async fn clarify(&self, request: ClarifyRequest) -> Result<WorkflowReply, ClientError>;

    async fn topic_shift_choice(
        &self,
        request: TopicShiftRequest,
    ) -> Result<WorkflowReply, ClientError>;
}

#[derive(Debug, Clone)]
pub struct HttpWorkflowClient {
    http: reqwest::Client,
    config: ClientConfig,
    retry: RetryPolicy,
}

impl HttpWorkflowClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| ClientError::Build(err.to_string()))?;
        let retry = RetryPolicy::new(config.max_retries, config.retry_backoff);
        Ok(Self {
            http,
            config,
            retry,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// POSTs `body` as JSON and decodes the 2xx response.
    ///
    /// Transport failures are retried per [`RetryPolicy`]; any HTTP
    /// response, successful or not, ends the attempt loop.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.config.endpoint_url(path);
        debug!(endpoint = path, "workflow request");
        let result = self.retry.run(|| self.post_once(path, &url, body)).await;
        if let Err(err) = &result {
            warn!(endpoint = path, error = %err, "workflow request failed");
        }
        result
    }

    async fn post_once<B, T>(&self, path: &str, url: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| ClientError::from_reqwest(path, err))?;

        let status = response.status();
        let text = response.text().await.map_err(|err| ClientError::Decode {
            endpoint: path.to_string(),
            message: err.to_string(),
        })?;

        if !status.is_success() {
            return Err(ClientError::from_status(path, status, text));
        }

        serde_json::from_str(&text).map_err(|err| ClientError::Decode {
            endpoint: path.to_string(),
            message: err.to_string(),
        })
    }
}

#[async_trait]
impl WorkflowApi for HttpWorkflowClient {
    async fn analyze(&self, request: AnalyzeRequest) -> Result<WorkflowReply, ClientError> {
        self.post(ANALYZE_PATH, &request).await
    }

    async fn auto_validate(
        &self,
        request: AutoValidateRequest,
    ) -> Result<WorkflowReply, ClientError> {
        self.post(AUTO_VALIDATE_PATH, &request).await
    }

    async fn confirm_summary(
        &self,
        request: ConfirmSummaryRequest,
    ) -> Result<TicketRecord, ClientError> {
        self.post(CONFIRM_SUMMARY_PATH, &request).await
    }

    async fn clarify(&self, request: ClarifyRequest) -> Result<WorkflowReply, ClientError> {
        self.post(CLARIFY_PATH, &request).await
    }

    async fn topic_shift_choice(
        &self,
        request: TopicShiftRequest,
    ) -> Result<WorkflowReply, ClientError> {
        self.post(TOPIC_SHIFT_CHOICE_PATH, &request).await
    }
}
