// src/fetch/mod.rs

use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use std::{path::PathBuf, time::Duration};
use tokio::{fs, time::sleep};
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::config::Config;

/// Where a CSV lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Http(Url),
    File(PathBuf),
}

impl Location {
    /// `http(s)://` → Http, `file://` or a bare path → File, other schemes fail.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        match Url::parse(raw) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(Location::Http(url)),
                "file" => url
                    .to_file_path()
                    .map(Location::File)
                    .map_err(|_| anyhow!("invalid file URL {}", url)),
                other => bail!("unsupported scheme {:?} in {}", other, url),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) if !raw.is_empty() => {
                Ok(Location::File(PathBuf::from(raw)))
            }
            Err(e) => Err(e).with_context(|| format!("parsing location {:?}", raw)),
        }
    }
}

/// Text fetcher shared by the registry and every series.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_retries: u32,
    initial_backoff_ms: u64,
}

impl Fetcher {
    pub fn new(timeout: Duration, max_retries: u32, initial_backoff_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            max_retries,
            initial_backoff_ms,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg.fetch_timeout, cfg.fetch_retries, cfg.fetch_backoff_ms)
    }

    /// Fetch the text at `location`, retrying with exponential backoff.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_text(&self, location: &str) -> Result<String> {
        let target = Location::parse(location)?;
        let mut attempts = 0;
        loop {
            match self.fetch_once(&target).await {
                Ok(t) => return Ok(t),
                Err(e) if attempts < self.max_retries => {
                    attempts += 1;
                    let backoff = self.initial_backoff_ms * 2u64.pow(attempts - 1);
                    warn!(%location, attempt = attempts, delay_ms = backoff, error = %e, "Retrying");
                    sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => {
                    if self.max_retries > 0 {
                        error!(%location, error = %e, "Exhausted retries");
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn fetch_once(&self, target: &Location) -> Result<String> {
        match target {
            Location::Http(url) => {
                debug!("Fetching text from {}", url);
                self.client
                    .get(url.clone())
                    .send()
                    .await
                    .with_context(|| format!("GET {} failed", url))?
                    .error_for_status()
                    .with_context(|| format!("Non-success status {}", url))?
                    .text()
                    .await
                    .with_context(|| format!("Reading text from {}", url))
            }
            Location::File(path) => {
                debug!("Reading text from {}", path.display());
                fs::read_to_string(path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_fixtures;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fetcher() -> Fetcher {
        Fetcher::new(Duration::from_secs(5), 0, 10).unwrap()
    }

    #[test]
    fn location_kinds() -> Result<()> {
        assert!(matches!(
            Location::parse("https://docs.google.com/x?output=csv")?,
            Location::Http(_)
        ));
        assert_eq!(
            Location::parse("data/index.csv")?,
            Location::File(PathBuf::from("data/index.csv"))
        );
        assert!(matches!(Location::parse("file:///tmp/a.csv")?, Location::File(_)));
        assert!(Location::parse("ftp://example.com/a.csv").is_err());
        assert!(Location::parse("").is_err());
        Ok(())
    }

    #[tokio::test]
    async fn reads_local_files() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        write!(tmp, "Date,Close\n2024-01-02,10\n")?;
        let path = tmp.path().to_string_lossy().to_string();

        let text = fetcher().fetch_text(&path).await?;
        assert!(text.starts_with("Date,Close"));

        let url = Url::from_file_path(tmp.path()).unwrap();
        let text = fetcher().fetch_text(url.as_str()).await?;
        assert!(text.ends_with("10\n"));
        Ok(())
    }

    #[tokio::test]
    async fn http_success_and_status_failure() -> Result<()> {
        let base = serve_fixtures(&[("a.csv", "x,y\n1,2\n")]).await;

        let text = fetcher().fetch_text(&format!("{}/csv/a.csv", base)).await?;
        assert_eq!(text, "x,y\n1,2\n");

        let err = fetcher()
            .fetch_text(&format!("{}/csv/missing.csv", base))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("404"), "{err:#}");
        Ok(())
    }

    #[tokio::test]
    async fn retries_before_giving_up() -> Result<()> {
        let f = Fetcher::new(Duration::from_secs(1), 2, 1)?;
        let err = f.fetch_text("/definitely/not/here.csv").await.unwrap_err();
        assert!(format!("{:#}", err).contains("not/here.csv"));
        Ok(())
    }
}
