use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use snafu::{ensure, OptionExt};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::config::VoterRecord;
use crate::error::*;
use crate::geofence::{self, Boundary, GeoPoint};

pub type TurfId = u64;
pub type VolunteerId = u64;
pub type VoterId = u64;

/// A named area for door-knocking. The boundary never changes once the turf is saved.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Turf {
    pub id: TurfId,
    pub name: String,
    pub boundary: Boundary,
    pub created_at: DateTime<Utc>,
}

/// A turf about to be created.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct NewTurf {
    pub name: String,
    pub boundary: Boundary,
}

/// The lifecycle of a turf.
///
/// `Drafting` only exists on the client while the polygon is traced. `Deleted` is terminal.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TurfStatus {
    Drafting,
    Saved,
    Assigned,
    Deleted,
}

/// A polygon being traced, point by point.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct TurfDraft {
    name: String,
    points: Vec<GeoPoint>,
}

impl TurfDraft {
    pub fn new(name: &str) -> TurfDraft {
        TurfDraft {
            name: name.trim().to_string(),
            points: Vec::new(),
        }
    }

    pub fn status(&self) -> TurfStatus {
        TurfStatus::Drafting
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn push_point(&mut self, point: GeoPoint) -> CoreResult<()> {
        ensure!(
            point.is_valid(),
            CoordinateSnafu {
                lat: point.lat,
                lng: point.lng
            }
        );
        self.points.push(point);
        Ok(())
    }

    pub fn undo(&mut self) -> Option<GeoPoint> {
        self.points.pop()
    }

    /// Closes the polygon. Needs at least three points.
    pub fn finish(self) -> CoreResult<NewTurf> {
        let boundary = geofence::record_boundary(&self.points)?;
        Ok(NewTurf {
            name: self.name,
            boundary,
        })
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TurfAssignment {
    pub turf_id: TurfId,
    pub volunteer_id: VolunteerId,
    pub created_at: DateTime<Utc>,
}

/// The outcome of knocking on one door.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum CanvassResult {
    Support,
    #[serde(rename = "No Contact")]
    NoContact,
    Refused,
    Other,
}

impl CanvassResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanvassResult::Support => "Support",
            CanvassResult::NoContact => "No Contact",
            CanvassResult::Refused => "Refused",
            CanvassResult::Other => "Other",
        }
    }
}

impl Display for CanvassResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CanvassResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "support" => Ok(CanvassResult::Support),
            "no contact" => Ok(CanvassResult::NoContact),
            "refused" => Ok(CanvassResult::Refused),
            "other" => Ok(CanvassResult::Other),
            x => Err(format!(
                "Unknown canvassing result {:?} (expected support, no_contact, refused or other)",
                x
            )),
        }
    }
}

/// One entry of the canvassing log. Entries are never modified.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CanvassingInteraction {
    pub voter_id: VoterId,
    pub turf_id: TurfId,
    pub result: CanvassResult,
    #[serde(default)]
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Canvassing progress of one turf.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TurfProgress {
    pub total_voters: u64,
    pub total_interactions: u64,
}

impl TurfProgress {
    pub fn new(total_voters: u64, total_interactions: u64) -> TurfProgress {
        TurfProgress {
            total_voters,
            total_interactions,
        }
    }

    /// `round(interactions / voters * 100)`, and 0 for a turf without voters.
    ///
    /// Not capped: repeated visits can push it above 100.
    pub fn completion_percent(&self) -> u32 {
        if self.total_voters == 0 {
            0
        } else {
            let ratio = self.total_interactions as f64 / self.total_voters as f64;
            (ratio * 100.0).round() as u32
        }
    }
}

/// Interactions logged in one turf assigned to a volunteer.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct VolunteerTurfProgress {
    pub turf_id: TurfId,
    pub turf_name: String,
    pub total_interactions: u64,
}

#[derive(Debug, Clone)]
struct TurfEntry {
    turf: Turf,
    deleted: bool,
}

/// The client-side record of turfs, their assignments and the canvassing log.
///
/// It mirrors what the backend stores and applies the same rules:
/// - assigning twice records two assignments;
/// - deleting a turf keeps its assignments and interactions.
#[derive(Debug, Clone, Default)]
pub struct TurfLedger {
    entries: BTreeMap<TurfId, TurfEntry>,
    assignments: Vec<TurfAssignment>,
    interactions: Vec<CanvassingInteraction>,
}

impl TurfLedger {
    pub fn new() -> TurfLedger {
        TurfLedger::default()
    }

    /// Records a saved turf. A turf with the same id is replaced.
    pub fn insert(&mut self, turf: Turf) {
        debug!("TurfLedger: insert turf {} ({})", turf.id, turf.name);
        self.entries.insert(
            turf.id,
            TurfEntry {
                turf,
                deleted: false,
            },
        );
    }

    pub fn status(&self, turf_id: TurfId) -> Option<TurfStatus> {
        self.entries.get(&turf_id).map(|e| {
            if e.deleted {
                TurfStatus::Deleted
            } else if self.assignments.iter().any(|a| a.turf_id == turf_id) {
                TurfStatus::Assigned
            } else {
                TurfStatus::Saved
            }
        })
    }

    /// A turf that exists and is not deleted.
    pub fn turf(&self, turf_id: TurfId) -> CoreResult<&Turf> {
        let entry = self
            .entries
            .get(&turf_id)
            .context(UnknownTurfSnafu { turf_id })?;
        ensure!(!entry.deleted, TurfDeletedSnafu { turf_id });
        Ok(&entry.turf)
    }

    pub fn turfs(&self) -> impl Iterator<Item = &Turf> {
        self.entries
            .values()
            .filter(|e| !e.deleted)
            .map(|e| &e.turf)
    }

    /// Assigns a turf to a volunteer.
    ///
    /// Not idempotent: the same pair can be assigned several times and each call adds a record.
    pub fn assign(
        &mut self,
        turf_id: TurfId,
        volunteer_id: VolunteerId,
        at: DateTime<Utc>,
    ) -> CoreResult<TurfAssignment> {
        self.turf(turf_id)?;
        if self
            .assignments
            .iter()
            .any(|a| a.turf_id == turf_id && a.volunteer_id == volunteer_id)
        {
            warn!(
                "assign: turf {} is already assigned to volunteer {}, recording it again",
                turf_id, volunteer_id
            );
        }
        let assignment = TurfAssignment {
            turf_id,
            volunteer_id,
            created_at: at,
        };
        self.assignments.push(assignment.clone());
        info!("assign: turf {} -> volunteer {}", turf_id, volunteer_id);
        Ok(assignment)
    }

    pub fn assignments(&self, turf_id: TurfId) -> Vec<&TurfAssignment> {
        self.assignments
            .iter()
            .filter(|a| a.turf_id == turf_id)
            .collect()
    }

    /// Appends to the canvassing log.
    pub fn log_interaction(
        &mut self,
        interaction: CanvassingInteraction,
    ) -> CoreResult<&CanvassingInteraction> {
        self.turf(interaction.turf_id)?;
        debug!(
            "log_interaction: voter {} in turf {}: {}",
            interaction.voter_id, interaction.turf_id, interaction.result
        );
        self.interactions.push(interaction);
        Ok(&self.interactions[self.interactions.len() - 1])
    }

    pub fn interactions(&self, turf_id: TurfId) -> Vec<&CanvassingInteraction> {
        self.interactions
            .iter()
            .filter(|i| i.turf_id == turf_id)
            .collect()
    }

    /// Deletes a turf, whatever is attached to it.
    pub fn delete(&mut self, turf_id: TurfId) -> CoreResult<Turf> {
        let turf = self.turf(turf_id)?.clone();
        let n_assignments = self.assignments(turf_id).len();
        let n_interactions = self.interactions(turf_id).len();
        if n_assignments > 0 || n_interactions > 0 {
            warn!(
                "delete: turf {} still has {} assignments and {} interactions, they are kept",
                turf_id, n_assignments, n_interactions
            );
        }
        if let Some(e) = self.entries.get_mut(&turf_id) {
            e.deleted = true;
        }
        Ok(turf)
    }

    /// The voters located in a turf.
    pub fn voters_in<'a>(
        &self,
        turf_id: TurfId,
        voters: &'a [VoterRecord],
    ) -> CoreResult<Vec<&'a VoterRecord>> {
        let turf = self.turf(turf_id)?;
        Ok(geofence::filter_voters(&turf.boundary, voters))
    }

    /// Interactions logged in a turf against the number of voters it contains.
    pub fn progress(&self, turf_id: TurfId, voters: &[VoterRecord]) -> CoreResult<TurfProgress> {
        let total_voters = self.voters_in(turf_id, voters)?.len() as u64;
        let total_interactions = self.interactions(turf_id).len() as u64;
        Ok(TurfProgress::new(total_voters, total_interactions))
    }

    /// Per-turf interaction counts for the turfs assigned to a volunteer.
    pub fn volunteer_progress(&self, volunteer_id: VolunteerId) -> Vec<VolunteerTurfProgress> {
        let mut res: Vec<VolunteerTurfProgress> = Vec::new();
        for a in self
            .assignments
            .iter()
            .filter(|a| a.volunteer_id == volunteer_id)
        {
            if res.iter().any(|p| p.turf_id == a.turf_id) {
                continue;
            }
            if let Ok(turf) = self.turf(a.turf_id) {
                res.push(VolunteerTurfProgress {
                    turf_id: turf.id,
                    turf_name: turf.name.clone(),
                    total_interactions: self.interactions(turf.id).len() as u64,
                });
            }
        }
        res
    }
}
