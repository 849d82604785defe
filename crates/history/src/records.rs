//! Personal medical records served by the Medinote backend
//!
//! The backend exposes one endpoint per record category. Fields arrive loosely
//! typed (numbers and strings interchangeably), so every field is decoded into an
//! optional string.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter};
use tracing::{debug, instrument};

use medinote_common::{ProviderError, ProviderResult, RecordsConfig};

const PROVIDER: &str = "records";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum RecordCategory {
    Profile,
    Allergies,
    ChronicConditions,
    AcuteConditions,
    Medications,
    Prescriptions,
    Visits,
}

impl RecordCategory {
    /// Backend path serving this category
    pub fn path(&self) -> &'static str {
        match self {
            Self::Profile => "/health",
            Self::Allergies => "/health/allergy",
            Self::ChronicConditions => "/health/chronic",
            Self::AcuteConditions => "/health/acute",
            Self::Medications => "/drug",
            Self::Prescriptions => "/prescription",
            Self::Visits => "/visits",
        }
    }
}

/// Per-user record lookup. An absent record is `Value::Null`, not an error.
#[async_trait]
pub trait UserRecordService: Send + Sync {
    async fn fetch(&self, category: RecordCategory, user_id: &str) -> ProviderResult<Value>;
}

/// HTTP client for the Medinote backend record endpoints
#[derive(Debug, Clone)]
pub struct BackendRecordClient {
    client: Client,
    base_url: String,
}

impl BackendRecordClient {
    pub fn new(config: &RecordsConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::transport(PROVIDER, e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl UserRecordService for BackendRecordClient {
    #[instrument(skip(self, user_id), fields(category = %category))]
    async fn fetch(&self, category: RecordCategory, user_id: &str) -> ProviderResult<Value> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, category.path()))
            .header("X-User-Id", user_id)
            .send()
            .await
            .map_err(|e| ProviderError::transport(PROVIDER, e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("No record on file");
            return Ok(Value::Null);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::http(PROVIDER, status.as_u16(), message));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(PROVIDER, e.to_string()))
    }
}

/// Accept strings, numbers and booleans; treat null and blank strings as absent
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthProfile {
    #[serde(default, deserialize_with = "loose_string")]
    pub birth: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub blood_type: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub height: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub weight: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub drinking: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub smoking: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Allergy {
    #[serde(default, deserialize_with = "loose_string")]
    pub allergy_name: Option<String>,
}

/// Chronic or acute condition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, deserialize_with = "loose_string")]
    pub disease_name: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    #[serde(default, deserialize_with = "loose_string")]
    pub med_name: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub dosage_form: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub dose: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub schedule: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    #[serde(flatten)]
    pub medication: Medication,
    #[serde(default, deserialize_with = "loose_string")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    #[serde(default, deserialize_with = "loose_string")]
    pub hospital: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub dept: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub diagnosis_name: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub date: Option<String>,
}

/// Everything on file for one user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonalRecords {
    pub profile: Option<HealthProfile>,
    pub allergies: Vec<Allergy>,
    pub chronic: Vec<Condition>,
    pub acute: Vec<Condition>,
    pub medications: Vec<Medication>,
    pub prescriptions: Vec<Prescription>,
    pub visits: Vec<Visit>,
}

impl PersonalRecords {
    /// Fetch all seven categories one after another. The first failure aborts the lookup.
    #[instrument(skip(service, user_id))]
    pub async fn collect(service: &dyn UserRecordService, user_id: &str) -> ProviderResult<Self> {
        let profile = decode_object(service.fetch(RecordCategory::Profile, user_id).await?)?;
        let allergies = decode_list(service.fetch(RecordCategory::Allergies, user_id).await?)?;
        let chronic = decode_list(service.fetch(RecordCategory::ChronicConditions, user_id).await?)?;
        let acute = decode_list(service.fetch(RecordCategory::AcuteConditions, user_id).await?)?;
        let medications = decode_list(service.fetch(RecordCategory::Medications, user_id).await?)?;
        let prescriptions = decode_list(service.fetch(RecordCategory::Prescriptions, user_id).await?)?;
        let visits = decode_list(service.fetch(RecordCategory::Visits, user_id).await?)?;

        Ok(Self {
            profile,
            allergies,
            chronic,
            acute,
            medications,
            prescriptions,
            visits,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.profile.is_none()
            && self.allergies.is_empty()
            && self.chronic.is_empty()
            && self.acute.is_empty()
            && self.medications.is_empty()
            && self.prescriptions.is_empty()
            && self.visits.is_empty()
    }
}

/// Objects decode into `T`; null, empty objects and non-objects count as absent
fn decode_object<T: DeserializeOwned>(value: Value) -> ProviderResult<Option<T>> {
    match value {
        Value::Object(map) if map.is_empty() => Ok(None),
        Value::Object(map) => serde_json::from_value(Value::Object(map))
            .map(Some)
            .map_err(|e| ProviderError::invalid_response(PROVIDER, e.to_string())),
        _ => Ok(None),
    }
}

/// Arrays decode element-wise; anything else counts as an empty list
fn decode_list<T: DeserializeOwned>(value: Value) -> ProviderResult<Vec<T>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| {
                serde_json::from_value(item).map_err(|e| ProviderError::invalid_response(PROVIDER, e.to_string()))
            })
            .collect(),
        _ => Ok(Vec::new()),
    }
}
