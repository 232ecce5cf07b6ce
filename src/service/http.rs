//! Blocking HTTP client for the best-solution store and submission endpoint.

use super::{BaselineStore, Submitter, best_solution_url, submit_url};
use crate::{
    config::Config,
    problem::{Bonus, ProblemId},
};
use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT_VALUE: &str = concat!("globalist-sweep/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct HttpService {
    client: Client,
    base_url: String,
    best_solution_path: String,
    submit_path: String,
}

impl HttpService {
    pub fn new(cfg: &Config) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let timeout = match cfg.service.timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .with_context(|| "building HTTP client")?;

        Ok(Self {
            client,
            base_url: cfg.service.base_url.clone(),
            best_solution_path: cfg.service.best_solution_path.clone(),
            submit_path: cfg.service.submit_path.clone(),
        })
    }
}

impl BaselineStore for HttpService {
    fn fetch(&self, problem_id: ProblemId, bonuses: &[Bonus]) -> Result<String> {
        let url = best_solution_url(
            &self.base_url,
            &self.best_solution_path,
            problem_id,
            bonuses,
        )?;
        debug!(url = %url, "fetching best solution");

        let response = self
            .client
            .get(url.clone())
            .send()
            .with_context(|| format!("GET {url}"))?;

        if response.status() == StatusCode::NOT_FOUND {
            warn!(problem_id, "no stored solution (404)");
            return Ok(String::new());
        }

        let response = response
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        response
            .text()
            .with_context(|| format!("reading body of GET {url}"))
    }
}

impl Submitter for HttpService {
    fn submit(&self, problem_id: ProblemId, solution: &[u8]) -> Result<()> {
        let url = submit_url(&self.base_url, &self.submit_path, problem_id)?;
        debug!(url = %url, bytes = solution.len(), "submitting solution");

        let response = self
            .client
            .post(url.clone())
            .body(solution.to_vec())
            .send()
            .with_context(|| format!("POST {url}"))?;

        let status = response.status();
        let body = response.text().unwrap_or_default();
        if !status.is_success() {
            return Err(anyhow!("POST {url} returned {status}: {}", body.trim()));
        }
        debug!(problem_id, response = %body.trim(), "submitted");
        Ok(())
    }
}
