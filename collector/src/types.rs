use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::row::{Row, text_cell};
use std::fmt;
use url::Url;

/// The report resources every host exposes under `/api/`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    StatusBridging,
    InsuranceBridging,
    HealthRegistryBridging,
}

impl ResourceKind {
    /// Canonical fetch and merge order.
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::StatusBridging,
        ResourceKind::InsuranceBridging,
        ResourceKind::HealthRegistryBridging,
    ];

    pub const fn path(&self) -> &'static str {
        match self {
            ResourceKind::StatusBridging => "bridging",
            ResourceKind::InsuranceBridging => "bpjs",
            ResourceKind::HealthRegistryBridging => "sehat",
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::StatusBridging => "status-bridging",
            ResourceKind::InsuranceBridging => "insurance-bridging",
            ResourceKind::HealthRegistryBridging => "health-registry-bridging",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One application instance serving report data.
#[derive(Clone, Debug, PartialEq)]
pub struct HostEndpoint {
    url: Url,
    name: String,
}

impl HostEndpoint {
    /// Creates an endpoint. Without an explicit name, the name is derived
    /// from the URL: the first domain label (or the IP address) plus the
    /// port when one is given.
    pub fn new(url: Url, name: Option<String>) -> Self {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| derive_name(&url));
        HostEndpoint { url, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource_url(&self, kind: ResourceKind) -> String {
        format!(
            "{}/api/{}",
            self.url.as_str().trim_end_matches('/'),
            kind.path()
        )
    }
}

fn derive_name(url: &Url) -> String {
    let host = match url.domain() {
        Some(domain) => domain.split('.').next().unwrap_or(domain).to_string(),
        None => match url.host_str() {
            Some(host) => host.to_string(),
            None => return url.to_string(),
        },
    };

    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    }
}

/// Integration and subscription status of one facility.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct BridgingRecord {
    #[serde(rename = "ICARE", default)]
    pub icare: Option<bool>,
    #[serde(rename = "Bridging PCARE", default)]
    pub pcare: Option<bool>,
    #[serde(rename = "VCLAIM", default)]
    pub vclaim: Option<bool>,
    #[serde(rename = "ANTROL", default)]
    pub antrol: Option<bool>,
    #[serde(rename = "Isian Wizzard BPJS", default, deserialize_with = "text_field")]
    pub insurance_wizard: Option<String>,
    #[serde(rename = "Metode Bayar BPJS", default)]
    pub insurance_payment: Option<bool>,
    #[serde(rename = "Kode Faskes", default, deserialize_with = "text_field")]
    pub facility_code: Option<String>,
    #[serde(rename = "Nama Faskes", default, deserialize_with = "text_field")]
    pub facility_name: Option<String>,
    #[serde(rename = "Server", default, deserialize_with = "text_field")]
    pub server: Option<String>,
    #[serde(rename = "Variant", default, deserialize_with = "text_field")]
    pub variant: Option<String>,
    #[serde(rename = "Status Subs", default, deserialize_with = "text_field")]
    pub subscription_status: Option<String>,
}

/// Reads a text column. Hosts differ in whether codes and identifiers are
/// sent as strings or numbers, so numbers and booleans are kept as their text.
fn text_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        Value::Number(number) => Ok(Some(number.to_string())),
        Value::Bool(flag) => Ok(Some(flag.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected text, got {other}"
        ))),
    }
}

fn flag_cell(value: Option<bool>) -> Value {
    Value::Bool(value.unwrap_or(false))
}

impl Row for BridgingRecord {
    const COLUMNS: &'static [&'static str] = &[
        "ICARE",
        "Bridging PCARE",
        "VCLAIM",
        "ANTROL",
        "Isian Wizzard BPJS",
        "Metode Bayar BPJS",
        "Kode Faskes",
        "Nama Faskes",
        "Server",
        "Variant",
        "Status Subs",
    ];

    fn cells(&self) -> Vec<Value> {
        vec![
            flag_cell(self.icare),
            flag_cell(self.pcare),
            flag_cell(self.vclaim),
            flag_cell(self.antrol),
            text_cell(&self.insurance_wizard),
            flag_cell(self.insurance_payment),
            text_cell(&self.facility_code),
            text_cell(&self.facility_name),
            text_cell(&self.server),
            text_cell(&self.variant),
            text_cell(&self.subscription_status),
        ]
    }
}

/// A facility's link to the national insurance bridge.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct InsuranceRecord {
    #[serde(rename = "Nama Faskes", default, deserialize_with = "text_field")]
    pub facility_name: Option<String>,
    #[serde(rename = "Kode Faskes", default, deserialize_with = "text_field")]
    pub facility_code: Option<String>,
    #[serde(rename = "ConsId", default, deserialize_with = "text_field")]
    pub consumer_id: Option<String>,
    #[serde(rename = "Tanggal Dibuat", default, deserialize_with = "text_field")]
    pub created_at: Option<String>,
    #[serde(rename = "Tanggal Diperbaharui", default, deserialize_with = "text_field")]
    pub updated_at: Option<String>,
    #[serde(rename = "Server", default, deserialize_with = "text_field")]
    pub server: Option<String>,
}

impl Row for InsuranceRecord {
    const COLUMNS: &'static [&'static str] = &[
        "Nama Faskes",
        "Kode Faskes",
        "ConsId",
        "Tanggal Dibuat",
        "Tanggal Diperbaharui",
        "Server",
    ];

    fn cells(&self) -> Vec<Value> {
        vec![
            text_cell(&self.facility_name),
            text_cell(&self.facility_code),
            text_cell(&self.consumer_id),
            text_cell(&self.created_at),
            text_cell(&self.updated_at),
            text_cell(&self.server),
        ]
    }
}

/// A facility's link to the health registry.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RegistryRecord {
    #[serde(rename = "Nama Faskes", default, deserialize_with = "text_field")]
    pub facility_name: Option<String>,
    #[serde(rename = "Kode Faskes", default, deserialize_with = "text_field")]
    pub facility_code: Option<String>,
    #[serde(rename = "Organization ID", default, deserialize_with = "text_field")]
    pub organization_id: Option<String>,
    #[serde(rename = "Tanggal Dibuat", default, deserialize_with = "text_field")]
    pub created_at: Option<String>,
    #[serde(rename = "Server", default, deserialize_with = "text_field")]
    pub server: Option<String>,
}

impl Row for RegistryRecord {
    const COLUMNS: &'static [&'static str] = &[
        "Nama Faskes",
        "Kode Faskes",
        "Organization ID",
        "Tanggal Dibuat",
        "Server",
    ];

    fn cells(&self) -> Vec<Value> {
        vec![
            text_cell(&self.facility_name),
            text_cell(&self.facility_code),
            text_cell(&self.organization_id),
            text_cell(&self.created_at),
            text_cell(&self.server),
        ]
    }
}

/// Records split into the trailing-week bucket and the cumulative bucket.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Windowed<T> {
    #[serde(rename = "Weekly")]
    pub weekly: Vec<T>,
    #[serde(rename = "Alltime")]
    pub alltime: Vec<T>,
}

impl<T> Windowed<T> {
    pub fn new(weekly: Vec<T>, alltime: Vec<T>) -> Self {
        Windowed { weekly, alltime }
    }

    /// Appends both buckets of `other` after the existing records.
    pub fn extend(&mut self, other: Windowed<T>) {
        self.weekly.extend(other.weekly);
        self.alltime.extend(other.alltime);
    }
}

impl<T> Default for Windowed<T> {
    fn default() -> Self {
        Windowed {
            weekly: Vec::new(),
            alltime: Vec::new(),
        }
    }
}

/// The decoded body of one host resource.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Bridging(Vec<BridgingRecord>),
    Insurance(Windowed<InsuranceRecord>),
    Registry(Windowed<RegistryRecord>),
}

impl Payload {
    pub fn decode(kind: ResourceKind, body: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            ResourceKind::StatusBridging => Payload::Bridging(serde_json::from_slice(body)?),
            ResourceKind::InsuranceBridging => Payload::Insurance(serde_json::from_slice(body)?),
            ResourceKind::HealthRegistryBridging => {
                Payload::Registry(serde_json::from_slice(body)?)
            }
        })
    }

    pub fn empty(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::StatusBridging => Payload::Bridging(Vec::new()),
            ResourceKind::InsuranceBridging => Payload::Insurance(Windowed::default()),
            ResourceKind::HealthRegistryBridging => Payload::Registry(Windowed::default()),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Payload::Bridging(_) => ResourceKind::StatusBridging,
            Payload::Insurance(_) => ResourceKind::InsuranceBridging,
            Payload::Registry(_) => ResourceKind::HealthRegistryBridging,
        }
    }

    pub fn record_count(&self) -> usize {
        match self {
            Payload::Bridging(records) => records.len(),
            Payload::Insurance(w) => w.weekly.len() + w.alltime.len(),
            Payload::Registry(w) => w.weekly.len() + w.alltime.len(),
        }
    }
}

/// The three logical datasets merged across all hosts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Datasets {
    pub bridging: Vec<BridgingRecord>,
    pub insurance: Windowed<InsuranceRecord>,
    pub registry: Windowed<RegistryRecord>,
}

impl Datasets {
    /// Appends a payload to the dataset of its kind.
    pub fn merge(&mut self, payload: Payload) {
        match payload {
            Payload::Bridging(records) => self.bridging.extend(records),
            Payload::Insurance(windowed) => self.insurance.extend(windowed),
            Payload::Registry(windowed) => self.registry.extend(windowed),
        }
    }
}
