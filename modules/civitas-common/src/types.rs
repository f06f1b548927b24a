use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::{GeoPoint, GeoPolygon};

// --- Enums ---

/// The fixed set of complaint categories. Wire labels match the city's
/// intake form verbatim, so the serde renames are load-bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplaintCategory {
    #[serde(rename = "Sanitation & Waste")]
    SanitationWaste,
    #[serde(rename = "Drainage & Water")]
    DrainageWater,
    #[serde(rename = "Electrical & Lighting")]
    ElectricalLighting,
    #[serde(rename = "Road & Infrastructure")]
    RoadInfrastructure,
    #[serde(rename = "Animal Safety / Nuisance")]
    AnimalSafety,
    #[serde(rename = "Public Safety")]
    PublicSafety,
}

impl ComplaintCategory {
    pub const ALL: [ComplaintCategory; 6] = [
        ComplaintCategory::SanitationWaste,
        ComplaintCategory::DrainageWater,
        ComplaintCategory::ElectricalLighting,
        ComplaintCategory::RoadInfrastructure,
        ComplaintCategory::AnimalSafety,
        ComplaintCategory::PublicSafety,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintCategory::SanitationWaste => "Sanitation & Waste",
            ComplaintCategory::DrainageWater => "Drainage & Water",
            ComplaintCategory::ElectricalLighting => "Electrical & Lighting",
            ComplaintCategory::RoadInfrastructure => "Road & Infrastructure",
            ComplaintCategory::AnimalSafety => "Animal Safety / Nuisance",
            ComplaintCategory::PublicSafety => "Public Safety",
        }
    }
}

impl std::fmt::Display for ComplaintCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ComplaintCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown complaint category: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Urgent,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Moderate
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Moderate => write!(f, "moderate"),
            Severity::High => write!(f, "high"),
            Severity::Urgent => write!(f, "urgent"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "moderate" => Ok(Severity::Moderate),
            "high" => Ok(Severity::High),
            "urgent" => Ok(Severity::Urgent),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// Lifecycle status. `Resolved` and `Rejected` are terminal: no reraise or
/// assignee resolution update may touch a complaint in either state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplaintStatus {
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Process Ongoing")]
    ProcessOngoing,
    #[serde(rename = "Resolved")]
    Resolved,
    #[serde(rename = "Rejected")]
    Rejected,
}

impl ComplaintStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ComplaintStatus::Resolved | ComplaintStatus::Rejected)
    }
}

impl Default for ComplaintStatus {
    fn default() -> Self {
        ComplaintStatus::Pending
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplaintStatus::Pending => write!(f, "Pending"),
            ComplaintStatus::ProcessOngoing => write!(f, "Process Ongoing"),
            ComplaintStatus::Resolved => write!(f, "Resolved"),
            ComplaintStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

impl std::str::FromStr for ComplaintStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ComplaintStatus::Pending),
            "Process Ongoing" => Ok(ComplaintStatus::ProcessOngoing),
            "Resolved" => Ok(ComplaintStatus::Resolved),
            "Rejected" => Ok(ComplaintStatus::Rejected),
            other => Err(format!("unknown complaint status: {other}")),
        }
    }
}

/// Resolved per-request identity, handed in by the auth collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Volunteer,
    Ngo,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Volunteer => write!(f, "volunteer"),
            Role::Ngo => write!(f, "ngo"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "volunteer" => Ok(Role::Volunteer),
            "ngo" => Ok(Role::Ngo),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

// --- Complaint ---

/// One entry in a complaint's append-only audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEntry {
    pub date: DateTime<Utc>,
    pub text: String,
    pub updated_by: Uuid,
}

/// A before/after photo reference recorded against a complaint.
/// The URL is an opaque handle owned by the upload collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionPhoto {
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: Uuid,
}

/// Citizen feedback, written once after resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub rating: u8,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// The central entity: a citizen-submitted civic issue report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complaint {
    pub id: Uuid,
    pub category: ComplaintCategory,
    pub sub_type: String,
    pub description: String,
    pub address: String,
    pub location: GeoPoint,
    pub photo: String,
    pub severity: Severity,
    pub status: ComplaintStatus,
    pub submitted_at: DateTime<Utc>,
    pub reraised_count: u32,
    pub submitted_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub updates: Vec<UpdateEntry>,
    pub supported_by: Vec<Uuid>,
    pub before_after_photos: Vec<ResolutionPhoto>,
    pub feedback: Option<Feedback>,
}

impl Complaint {
    pub fn support_count(&self) -> usize {
        self.supported_by.len()
    }
}

/// Payload for creating a complaint. The photo reference is mandatory;
/// upload validation happened upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct NewComplaint {
    pub category: ComplaintCategory,
    pub sub_type: String,
    pub description: String,
    pub address: String,
    pub location: GeoPoint,
    pub photo: String,
    #[serde(default)]
    pub severity: Severity,
}

/// A similarity-matcher hit, annotated for the "support it instead of
/// filing a duplicate" prompt.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarComplaint {
    pub id: Uuid,
    pub category: ComplaintCategory,
    pub sub_type: String,
    pub description: String,
    pub status: ComplaintStatus,
    pub support_count: u32,
    pub user_supported: bool,
    pub submitted_at: DateTime<Utc>,
}

// --- Locality & zones ---

/// A named geographic polygon used for zone-risk aggregation.
/// Membership of complaints is computed point-in-polygon, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Locality {
    pub id: Uuid,
    pub name: String,
    pub geometry: GeoPolygon,
}

/// Traffic-light risk tier for a locality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneTier {
    Green,
    Orange,
    Red,
}

impl std::fmt::Display for ZoneTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZoneTier::Green => write!(f, "green"),
            ZoneTier::Orange => write!(f, "orange"),
            ZoneTier::Red => write!(f, "red"),
        }
    }
}

/// One classified locality, ready to render as a choropleth layer.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneFeature {
    pub name: String,
    pub zone: ZoneTier,
    pub complaint_count: u64,
    pub geometry: GeoPolygon,
}

// --- User directory ---

/// A directory entry resolved by reference. This repo never manages
/// users; it only reads them to resolve `submitted_by`/`assigned_to`
/// and to address assignment notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn category_labels_round_trip() {
        for cat in ComplaintCategory::ALL {
            assert_eq!(ComplaintCategory::from_str(cat.as_str()), Ok(cat));
        }
    }

    #[test]
    fn category_serde_uses_wire_labels() {
        let json = serde_json::to_string(&ComplaintCategory::AnimalSafety).unwrap();
        assert_eq!(json, "\"Animal Safety / Nuisance\"");
        let back: ComplaintCategory = serde_json::from_str("\"Road & Infrastructure\"").unwrap();
        assert_eq!(back, ComplaintCategory::RoadInfrastructure);
    }

    #[test]
    fn status_terminal_set() {
        assert!(!ComplaintStatus::Pending.is_terminal());
        assert!(!ComplaintStatus::ProcessOngoing.is_terminal());
        assert!(ComplaintStatus::Resolved.is_terminal());
        assert!(ComplaintStatus::Rejected.is_terminal());
    }

    #[test]
    fn status_labels_round_trip() {
        for s in [
            ComplaintStatus::Pending,
            ComplaintStatus::ProcessOngoing,
            ComplaintStatus::Resolved,
            ComplaintStatus::Rejected,
        ] {
            assert_eq!(ComplaintStatus::from_str(&s.to_string()), Ok(s));
        }
    }

    #[test]
    fn severity_default_is_moderate() {
        assert_eq!(Severity::default(), Severity::Moderate);
    }
}
