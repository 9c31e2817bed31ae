use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::BaseAccession;
use crate::error::BackfillError;

pub trait ListingClient: Send + Sync {
    fn fetch_listing(&self, base: &BaseAccession) -> Result<String, BackfillError>;
}

#[derive(Clone)]
pub struct FtpListingClient {
    client: Client,
    base_url: String,
}

impl FtpListingClient {
    pub fn new() -> Result<Self, BackfillError> {
        Self::with_base_url("https://ftp.ncbi.nlm.nih.gov/genomes/all".to_string())
    }

    pub fn with_base_url(base_url: String) -> Result<Self, BackfillError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("asm-backfill/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| BackfillError::ListingHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| BackfillError::ListingHttp(err.to_string()))?;
        Ok(Self { client, base_url })
    }

    fn listing_url(&self, base: &BaseAccession) -> String {
        let acc = base.as_str();
        format!(
            "{}/{}/{}/{}/{}/",
            self.base_url,
            &acc[0..3],
            &acc[4..7],
            &acc[7..10],
            &acc[10..13]
        )
    }

    fn send_with_retries<F>(&self, mut make_req: F) -> Result<reqwest::blocking::Response, BackfillError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(BackfillError::ListingHttp(err.to_string()));
                }
            }
        }
    }
}

impl ListingClient for FtpListingClient {
    fn fetch_listing(&self, base: &BaseAccession) -> Result<String, BackfillError> {
        let url = self.listing_url(base);
        let response = self.send_with_retries(|| self.client.get(&url))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "listing request failed".to_string());
            return Err(BackfillError::ListingStatus { status, message });
        }
        response
            .text()
            .map_err(|err| BackfillError::ListingHttp(err.to_string()))
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
