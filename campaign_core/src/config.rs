// ********* Voter data structures ***********

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// The canonical fields of a voter record, as understood by the import endpoint.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoterField {
    FirstName,
    LastName,
    Address,
    Phone,
    Email,
    SupportLevel,
    Tags,
    Notes,
    Registered,
    LastContacted,
    Lat,
    Lng,
}

impl VoterField {
    pub const ALL: [VoterField; 12] = [
        VoterField::FirstName,
        VoterField::LastName,
        VoterField::Address,
        VoterField::Phone,
        VoterField::Email,
        VoterField::SupportLevel,
        VoterField::Tags,
        VoterField::Notes,
        VoterField::Registered,
        VoterField::LastContacted,
        VoterField::Lat,
        VoterField::Lng,
    ];

    /// Fields without which no import can proceed.
    pub const REQUIRED: [VoterField; 2] = [VoterField::FirstName, VoterField::LastName];

    /// The wire name, also used as the header of generated CSV files.
    pub fn name(&self) -> &'static str {
        match self {
            VoterField::FirstName => "first_name",
            VoterField::LastName => "last_name",
            VoterField::Address => "address",
            VoterField::Phone => "phone",
            VoterField::Email => "email",
            VoterField::SupportLevel => "support_level",
            VoterField::Tags => "tags",
            VoterField::Notes => "notes",
            VoterField::Registered => "registered",
            VoterField::LastContacted => "last_contacted",
            VoterField::Lat => "lat",
            VoterField::Lng => "lng",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VoterField::FirstName => "First Name",
            VoterField::LastName => "Last Name",
            VoterField::Address => "Address",
            VoterField::Phone => "Phone",
            VoterField::Email => "Email",
            VoterField::SupportLevel => "Support Level",
            VoterField::Tags => "Tags",
            VoterField::Notes => "Notes",
            VoterField::Registered => "Registered",
            VoterField::LastContacted => "Last Contacted",
            VoterField::Lat => "Latitude",
            VoterField::Lng => "Longitude",
        }
    }

    pub fn from_name(name: &str) -> Option<VoterField> {
        VoterField::ALL.iter().find(|f| f.name() == name).copied()
    }
}

impl Display for VoterField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for VoterField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VoterField::from_name(s.trim()).ok_or_else(|| format!("Unknown voter field {:?}", s))
    }
}

/// What a source column of an uploaded file turns into.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ColumnTarget {
    Field(VoterField),
    Ignore,
}

impl ColumnTarget {
    pub fn field(&self) -> Option<VoterField> {
        match self {
            ColumnTarget::Field(f) => Some(*f),
            ColumnTarget::Ignore => None,
        }
    }
}

impl Display for ColumnTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnTarget::Field(field) => write!(f, "{}", field.name()),
            ColumnTarget::Ignore => write!(f, "ignore"),
        }
    }
}

impl FromStr for ColumnTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ignore" => Ok(ColumnTarget::Ignore),
            x => x.parse::<VoterField>().map(ColumnTarget::Field),
        }
    }
}

/// A voter, as exchanged with the backend.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoterRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// 0 (unknown) to 5 (strong support).
    #[serde(default, deserialize_with = "null_as_default")]
    pub support_level: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub registered: bool,
    #[serde(default)]
    pub last_contacted: Option<NaiveDate>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

// The backend sends `null` for some fields it has no value for.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl VoterRecord {
    pub const MAX_SUPPORT_LEVEL: u8 = 5;

    pub fn new(first_name: &str, last_name: &str) -> VoterRecord {
        VoterRecord {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            ..VoterRecord::default()
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ********* Import policy **********

/// How the backend treats an incoming row that matches an existing voter.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateMode {
    Merge,
    Skip,
    Replace,
}

impl DuplicateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateMode::Merge => "merge",
            DuplicateMode::Skip => "skip",
            DuplicateMode::Replace => "replace",
        }
    }
}

impl FromStr for DuplicateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "merge" => Ok(DuplicateMode::Merge),
            "skip" => Ok(DuplicateMode::Skip),
            "replace" => Ok(DuplicateMode::Replace),
            x => Err(format!(
                "Unknown duplicate mode {:?} (expected merge, skip or replace)",
                x
            )),
        }
    }
}

/// A field used by the backend to recognize a voter that already exists.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityField {
    Email,
    Phone,
    NameAddress,
}

impl IdentityField {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityField::Email => "email",
            IdentityField::Phone => "phone",
            IdentityField::NameAddress => "name_address",
        }
    }
}

impl FromStr for IdentityField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(IdentityField::Email),
            "phone" => Ok(IdentityField::Phone),
            "name_address" => Ok(IdentityField::NameAddress),
            x => Err(format!(
                "Unknown identity field {:?} (expected email, phone or name_address)",
                x
            )),
        }
    }
}

/// The duplicate handling options sent along with an import.
///
/// The matching itself happens on the server: the client only validates and
/// transports these values.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ImportPolicy {
    pub mode: DuplicateMode,
    pub identity_fields: BTreeSet<IdentityField>,
    /// Only used in merge mode.
    pub match_threshold: u8,
    pub update_existing: bool,
}

impl ImportPolicy {
    pub const MIN_THRESHOLD: u8 = 50;
    pub const MAX_THRESHOLD: u8 = 100;
    pub const DEFAULT_THRESHOLD: u8 = 80;

    /// The `identify_by` form value: a JSON array of field names.
    pub fn identify_by_json(&self) -> CoreResult<String> {
        serde_json::to_string(&self.identity_fields).map_err(|e| CoreError::Encoding {
            what: "identity fields".to_string(),
            message: e.to_string(),
        })
    }
}

impl Default for ImportPolicy {
    fn default() -> Self {
        ImportPolicy {
            mode: DuplicateMode::Merge,
            identity_fields: [IdentityField::Email].into_iter().collect(),
            match_threshold: ImportPolicy::DEFAULT_THRESHOLD,
            update_existing: true,
        }
    }
}
