use snafu::Snafu;
use std::fmt::Display;

use crate::config::VoterField;

/// The reason a column mapping (or the policy that goes with it) was refused.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum MappingProblem {
    /// A required field is not mapped to any column.
    MissingRequired(VoterField),
    /// Two columns target the same field.
    DuplicateField(VoterField),
    /// Duplicate detection is on but nothing identifies a voter.
    NoIdentityFields,
    /// The merge threshold is outside of 50..=100.
    ThresholdOutOfRange(u8),
    /// An override points past the last column of the file.
    ColumnOutOfRange { index: usize, width: usize },
}

impl Display for MappingProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingProblem::MissingRequired(field) => write!(
                f,
                "Mapping must include columns for First Name and Last Name ({} is not mapped).",
                field.label()
            ),
            MappingProblem::DuplicateField(field) => {
                write!(f, "{} is mapped to more than one column.", field.label())
            }
            MappingProblem::NoIdentityFields => write!(
                f,
                "Select at least one field to identify duplicates, or use the replace mode."
            ),
            MappingProblem::ThresholdOutOfRange(t) => {
                write!(f, "Match threshold must be between 50 and 100, got {}.", t)
            }
            MappingProblem::ColumnOutOfRange { index, width } => write!(
                f,
                "Column {} does not exist, the file has {} columns.",
                index, width
            ),
        }
    }
}

/// Errors reported by the import and turf components.
///
/// All of them are recoverable: the caller shows the message and lets the user try again.
#[derive(Debug, Snafu, PartialEq)]
#[snafu(visibility(pub(crate)))]
pub enum CoreError {
    #[snafu(display("Please select a valid CSV file ({name} does not end with .csv)."))]
    FileType { name: String },

    #[snafu(display("CSV file is empty."))]
    EmptyFile {},

    #[snafu(display("{problem}"))]
    MappingValidation { problem: MappingProblem },

    #[snafu(display("A turf boundary needs at least 3 points, got {count}."))]
    Boundary { count: usize },

    #[snafu(display("Invalid coordinate ({lat}, {lng})."))]
    Coordinate { lat: f64, lng: f64 },

    #[snafu(display("Turf {turf_id} not found."))]
    UnknownTurf { turf_id: u64 },

    #[snafu(display("Turf {turf_id} has been deleted."))]
    TurfDeleted { turf_id: u64 },

    #[snafu(display("Could not encode the {what}: {message}"))]
    Encoding { what: String, message: String },
}

pub type CoreResult<T> = Result<T, CoreError>;
