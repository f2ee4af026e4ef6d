use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use shared::{
    domain::TierRecord,
    error::ErrorBody,
    protocol::{
        tier_describe_route, tier_route, tiers_route, InsertTierRequest, ObjectInfo,
        UpdateTiersRequest,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::error::{FailurePayload, GatewayError};

/// Authoritative record set returned by a successful call. `None` means
/// the backend answered without records, which callers treat as a
/// protocol violation rather than as an empty list.
pub type SyncResponse = Option<Vec<TierRecord>>;

/// Backend that owns the tier records. Every write answers with the full,
/// ordered record set as it stands after the write.
#[async_trait]
pub trait SyncGateway: Send + Sync {
    async fn list(&self) -> Result<SyncResponse, GatewayError>;
    async fn insert(&self, record: &TierRecord) -> Result<SyncResponse, GatewayError>;
    async fn bulk_update(&self, records: &[TierRecord]) -> Result<SyncResponse, GatewayError>;
    async fn delete(&self, record: &TierRecord) -> Result<SyncResponse, GatewayError>;
    /// Field labels for the column headers.
    async fn describe(&self) -> Result<ObjectInfo, GatewayError>;
}

pub struct MissingSyncGateway;

#[async_trait]
impl SyncGateway for MissingSyncGateway {
    async fn list(&self) -> Result<SyncResponse, GatewayError> {
        Err(unavailable())
    }

    async fn insert(&self, _record: &TierRecord) -> Result<SyncResponse, GatewayError> {
        Err(unavailable())
    }

    async fn bulk_update(&self, _records: &[TierRecord]) -> Result<SyncResponse, GatewayError> {
        Err(unavailable())
    }

    async fn delete(&self, _record: &TierRecord) -> Result<SyncResponse, GatewayError> {
        Err(unavailable())
    }

    async fn describe(&self) -> Result<ObjectInfo, GatewayError> {
        Err(unavailable())
    }
}

fn unavailable() -> GatewayError {
    GatewayError::Backend(FailurePayload::from_message(
        "tier backend is unavailable",
    ))
}

/// [`SyncGateway`] over the tier service's JSON API.
pub struct HttpSyncGateway {
    http: Client,
    base_url: Url,
}

impl HttpSyncGateway {
    pub fn new(server_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::with_client(Client::new(), Url::parse(server_url)?))
    }

    /// Routes resolve below `base_url`, so a server mounted under a path
    /// prefix (`http://host/api`) keeps that prefix.
    pub fn with_client(http: Client, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, route: &str) -> Result<Url, GatewayError> {
        self.base_url.join(route.trim_start_matches('/')).map_err(|err| {
            GatewayError::Backend(FailurePayload::from_message(format!(
                "invalid endpoint '{route}': {err}"
            )))
        })
    }

    async fn send_for_records(&self, request: RequestBuilder) -> Result<SyncResponse, GatewayError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(failure(status, &body));
        }
        if body.iter().all(u8::is_ascii_whitespace) {
            debug!(%status, "tier backend answered with an empty body");
            return Ok(None);
        }
        serde_json::from_slice::<SyncResponse>(&body).map_err(|err| {
            GatewayError::Backend(FailurePayload::new(
                Some(status.as_u16()),
                ErrorBody::message(format!("malformed tier list: {err}")),
            ))
        })
    }
}

#[async_trait]
impl SyncGateway for HttpSyncGateway {
    async fn list(&self) -> Result<SyncResponse, GatewayError> {
        let url = self.endpoint(tiers_route())?;
        self.send_for_records(self.http.get(url)).await
    }

    async fn insert(&self, record: &TierRecord) -> Result<SyncResponse, GatewayError> {
        let url = self.endpoint(tiers_route())?;
        let request = self.http.post(url).json(&InsertTierRequest {
            tier: record.clone(),
        });
        self.send_for_records(request).await
    }

    async fn bulk_update(&self, records: &[TierRecord]) -> Result<SyncResponse, GatewayError> {
        let url = self.endpoint(tiers_route())?;
        let request = self.http.put(url).json(&UpdateTiersRequest {
            tiers: records.to_vec(),
        });
        self.send_for_records(request).await
    }

    async fn delete(&self, record: &TierRecord) -> Result<SyncResponse, GatewayError> {
        let Some(tier_id) = record.id else {
            return Err(GatewayError::Validation(FailurePayload::from_message(
                "an unsaved tier cannot be deleted",
            )));
        };
        let url = self.endpoint(&tier_route(tier_id))?;
        self.send_for_records(self.http.delete(url)).await
    }

    async fn describe(&self) -> Result<ObjectInfo, GatewayError> {
        let url = self.endpoint(tier_describe_route())?;
        let response = self.http.get(url).send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(failure(status, &body));
        }
        serde_json::from_slice(&body).map_err(|err| {
            GatewayError::Backend(FailurePayload::new(
                Some(status.as_u16()),
                ErrorBody::message(format!("malformed object info: {err}")),
            ))
        })
    }
}

fn failure(status: StatusCode, body: &[u8]) -> GatewayError {
    let body = serde_json::from_slice::<ErrorBody>(body).unwrap_or_else(|_| {
        ErrorBody::Other(serde_json::Value::String(
            String::from_utf8_lossy(body).into_owned(),
        ))
    });
    let payload = FailurePayload::new(Some(status.as_u16()), body);
    warn!(%status, error = %payload, "tier backend call failed");

    if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
        GatewayError::Validation(payload)
    } else {
        GatewayError::Backend(payload)
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    warn!(error = %err, "tier backend unreachable");
    GatewayError::Backend(FailurePayload::from_message(err.to_string()))
}
