use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, Response};

use super::UpdateError;

const USER_AGENT: &str = "recipe-db-rust/1.0";
// Upper bound for pre-allocating from an advertised Content-Length.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// Where the updater gets its bytes from.
#[async_trait::async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, UpdateError>;
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, UpdateError>;
}

/// HTTP implementation backed by a shared `reqwest` client. Every request,
/// body included, must finish within the configured timeout.
pub struct HttpSource {
    client: Client,
    progress: bool,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self, UpdateError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(UpdateError::Client)?;
        Ok(Self { client, progress: false })
    }

    /// Draw a progress bar on stderr while downloading the dataset.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    async fn get(&self, url: &str) -> Result<Response, UpdateError> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpdateError::download(url, e))?;

        let status = res.status();
        if !status.is_success() {
            return Err(UpdateError::Download(format!("HTTP {status} for {url}")));
        }
        Ok(res)
    }

    fn progress_bar(&self, url: &str, total: Option<u64>) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }

        let bar = match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                if let Ok(style) = ProgressStyle::with_template(
                    "{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] \
                     {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                ) {
                    bar.set_style(style.progress_chars("#>-"));
                }
                bar
            }
            None => ProgressBar::new_spinner(),
        };
        bar.set_message(format!("Downloading {url}"));
        bar
    }
}

#[async_trait::async_trait]
impl RemoteSource for HttpSource {
    async fn fetch_text(&self, url: &str) -> Result<String, UpdateError> {
        self.get(url)
            .await?
            .text()
            .await
            .map_err(|e| UpdateError::download(url, e))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, UpdateError> {
        let mut res = self.get(url).await?;
        let total = res.content_length();
        let bar = self.progress_bar(url, total);

        let capacity = total.unwrap_or_default().min(MAX_PREALLOC) as usize;
        let mut body = Vec::with_capacity(capacity);
        while let Some(chunk) = res
            .chunk()
            .await
            .map_err(|e| UpdateError::download(url, e))?
        {
            body.extend_from_slice(&chunk);
            bar.set_position(body.len() as u64);
        }

        bar.finish_and_clear();
        Ok(body)
    }
}
