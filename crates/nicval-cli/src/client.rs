//! Async HTTP clients: the nicval server API, the external NIC validation
//! service and the IP geolocation service.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use nicval_core::{
  record::{NewRecord, RecordTable, ValidationKind, ValidationRecord},
  stats::Summary,
  validation::{IpInfo, NicInfo, ValidationResponse},
};
use reqwest::Client;

fn http_client() -> Result<Client> {
  Client::builder()
    .timeout(Duration::from_secs(30))
    .build()
    .context("failed to build HTTP client")
}

// ─── nicval server ────────────────────────────────────────────────────────────

/// Which records `GET /api/records` should return; everything by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordFilter {
  pub status: Option<RecordTable>,
  pub kind:   Option<ValidationKind>,
}

impl RecordFilter {
  fn query_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(status) = self.status {
      let label = match status {
        RecordTable::Validated => "valid",
        RecordTable::Invalid => "invalid",
      };
      pairs.push(("status", label.to_string()));
    }
    if let Some(kind) = self.kind {
      pairs.push(("kind", kind.to_string()));
    }
    pairs
  }
}

/// Connection settings for the nicval API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Async HTTP client for the nicval JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    Ok(Self {
      client: http_client()?,
      config,
    })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  /// `GET /api/records`
  pub async fn list_records(
    &self,
    filter: &RecordFilter,
  ) -> Result<Vec<ValidationRecord>> {
    let resp = self
      .auth(self.client.get(self.url("/records")))
      .query(&filter.query_pairs())
      .send()
      .await
      .context("GET /records failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET /records → {}", resp.status()));
    }
    resp.json().await.context("deserialising records")
  }

  /// `GET /api/stats`
  pub async fn stats(&self) -> Result<Summary> {
    let resp = self
      .auth(self.client.get(self.url("/stats")))
      .send()
      .await
      .context("GET /stats failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET /stats → {}", resp.status()));
    }
    resp.json().await.context("deserialising stats")
  }

  /// `POST /api/records`
  pub async fn create_record(&self, record: &NewRecord) -> Result<ValidationRecord> {
    let resp = self
      .auth(self.client.post(self.url("/records")))
      .json(record)
      .send()
      .await
      .context("POST /records failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("POST /records → {}", resp.status()));
    }
    resp.json().await.context("deserialising created record")
  }
}

// ─── External services ────────────────────────────────────────────────────────

/// Endpoints of the third-party services `lookup` talks to.
#[derive(Debug, Clone)]
pub struct ServicesConfig {
  /// Base URL of the NIC validation service.
  pub validation_url: String,
  /// Full URL of the IP geolocation endpoint.
  pub geo_url:        String,
  pub geo_token:      Option<String>,
}

#[derive(Clone)]
pub struct ServicesClient {
  client: Client,
  config: ServicesConfig,
}

impl ServicesClient {
  pub fn new(config: ServicesConfig) -> Result<Self> {
    Ok(Self {
      client: http_client()?,
      config,
    })
  }

  /// `GET {validation_url}/test-url?id=<nic>&nicVal=NIC-VAL`
  ///
  /// The outer error is a transport failure; the inner one an error envelope
  /// returned by the service.
  pub async fn validate(
    &self,
    nic: &str,
  ) -> Result<nicval_core::Result<(NicInfo, IpInfo)>> {
    let url = format!(
      "{}/test-url",
      self.config.validation_url.trim_end_matches('/')
    );
    tracing::debug!(%url, nic, "querying validation service");

    let resp = self
      .client
      .get(&url)
      .query(&[("id", nic), ("nicVal", "NIC-VAL")])
      .send()
      .await
      .context("validation service request failed")?;

    let body: ValidationResponse = resp
      .json()
      .await
      .context("deserialising validation response")?;
    Ok(body.into_result())
  }

  /// Where this machine appears to be, per the geolocation service.
  pub async fn geolocate(&self) -> Result<IpInfo> {
    let mut req = self.client.get(&self.config.geo_url);
    if let Some(token) = &self.config.geo_token {
      req = req.query(&[("token", token)]);
    }

    let resp = req.send().await.context("geolocation request failed")?;
    if !resp.status().is_success() {
      return Err(anyhow!("geolocation → {}", resp.status()));
    }
    resp.json().await.context("deserialising geolocation")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_filter_sends_no_query() {
    assert!(RecordFilter::default().query_pairs().is_empty());
  }

  #[test]
  fn filter_uses_the_server_labels() {
    let filter = RecordFilter {
      status: Some(RecordTable::Invalid),
      kind:   Some(ValidationKind::Bulk),
    };
    assert_eq!(
      filter.query_pairs(),
      vec![("status", "invalid".to_string()), ("kind", "bulk".to_string())]
    );

    let valid = RecordFilter {
      status: Some(RecordTable::Validated),
      ..RecordFilter::default()
    };
    assert_eq!(valid.query_pairs(), vec![("status", "valid".to_string())]);
  }
}
