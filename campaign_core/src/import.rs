//! Turns an arbitrary spreadsheet export into the payload expected by the voter import endpoint.
//!
//! The flow is: [check_file_name], [csv_text::parse](crate::csv_text::parse), [infer_mapping]
//! on the header, user overrides through [ColumnMapping::set], then [build_payload], which
//! validates the mapping against the [ImportPolicy] before projecting the columns.

use log::{debug, info};
use snafu::ensure;
use std::collections::HashSet;

use crate::config::*;
use crate::csv_text::{self, Rows};
use crate::error::*;

/// Number of data rows shown next to the mapping before submitting.
pub const PREVIEW_ROWS: usize = 5;

/// The file name attached to the generated CSV when it is uploaded.
pub const PAYLOAD_FILE_NAME: &str = "voters.csv";

// Header spellings commonly found in voter files and CRM exports, after lower-casing and trimming.
const SYNONYMS: &[(&str, VoterField)] = &[
    ("fname", VoterField::FirstName),
    ("first", VoterField::FirstName),
    ("firstname", VoterField::FirstName),
    ("first name", VoterField::FirstName),
    ("first-name", VoterField::FirstName),
    ("given name", VoterField::FirstName),
    ("lname", VoterField::LastName),
    ("last", VoterField::LastName),
    ("lastname", VoterField::LastName),
    ("last name", VoterField::LastName),
    ("last-name", VoterField::LastName),
    ("surname", VoterField::LastName),
    ("family name", VoterField::LastName),
    ("addr", VoterField::Address),
    ("street", VoterField::Address),
    ("street address", VoterField::Address),
    ("home address", VoterField::Address),
    ("residence", VoterField::Address),
    ("tel", VoterField::Phone),
    ("telephone", VoterField::Phone),
    ("mobile", VoterField::Phone),
    ("cell", VoterField::Phone),
    ("cellphone", VoterField::Phone),
    ("phone number", VoterField::Phone),
    ("phone_number", VoterField::Phone),
    ("e-mail", VoterField::Email),
    ("mail", VoterField::Email),
    ("email address", VoterField::Email),
    ("email_address", VoterField::Email),
    ("support", VoterField::SupportLevel),
    ("support level", VoterField::SupportLevel),
    ("support score", VoterField::SupportLevel),
    ("score", VoterField::SupportLevel),
    ("tag", VoterField::Tags),
    ("labels", VoterField::Tags),
    ("note", VoterField::Notes),
    ("comments", VoterField::Notes),
    ("comment", VoterField::Notes),
    ("is_registered", VoterField::Registered),
    ("registered voter", VoterField::Registered),
    ("registration", VoterField::Registered),
    ("last contact", VoterField::LastContacted),
    ("last contacted", VoterField::LastContacted),
    ("last_contact", VoterField::LastContacted),
    ("latitude", VoterField::Lat),
    ("longitude", VoterField::Lng),
    ("lon", VoterField::Lng),
    ("long", VoterField::Lng),
];

/// Rejects files that do not carry a `.csv` extension.
pub fn check_file_name(name: &str) -> CoreResult<()> {
    ensure!(
        name.to_lowercase().ends_with(".csv"),
        FileTypeSnafu {
            name: name.to_string()
        }
    );
    Ok(())
}

/// Resolves one header cell to a field, without considering the other columns.
pub fn lookup_header(cell: &str) -> Option<VoterField> {
    let key = cell.trim().to_lowercase();
    VoterField::from_name(&key).or_else(|| {
        SYNONYMS
            .iter()
            .find(|(synonym, _)| *synonym == key)
            .map(|(_, field)| *field)
    })
}

/// The target of every source column, indexed by column position.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnMapping {
    targets: Vec<ColumnTarget>,
}

impl ColumnMapping {
    pub fn new(targets: Vec<ColumnTarget>) -> ColumnMapping {
        ColumnMapping { targets }
    }

    pub fn all_ignored(width: usize) -> ColumnMapping {
        ColumnMapping {
            targets: vec![ColumnTarget::Ignore; width],
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn targets(&self) -> &[ColumnTarget] {
        &self.targets
    }

    pub fn get(&self, index: usize) -> Option<ColumnTarget> {
        self.targets.get(index).copied()
    }

    pub fn column_of(&self, field: VoterField) -> Option<usize> {
        self.targets
            .iter()
            .position(|t| *t == ColumnTarget::Field(field))
    }

    /// The mapped fields, in column order.
    pub fn mapped_fields(&self) -> Vec<VoterField> {
        self.targets.iter().filter_map(|t| t.field()).collect()
    }

    /// Overrides the target of one column.
    ///
    /// A field can only be held by one column: if another column already targets it, that
    /// column falls back to `ignore`.
    pub fn set(&mut self, index: usize, target: ColumnTarget) -> CoreResult<()> {
        let width = self.targets.len();
        ensure!(
            index < width,
            MappingValidationSnafu {
                problem: MappingProblem::ColumnOutOfRange { index, width }
            }
        );
        if let ColumnTarget::Field(field) = target {
            if let Some(previous) = self.column_of(field) {
                if previous != index {
                    debug!(
                        "set: {} moves from column {} to column {}",
                        field, previous, index
                    );
                    self.targets[previous] = ColumnTarget::Ignore;
                }
            }
        }
        self.targets[index] = target;
        Ok(())
    }

    /// The mapping rendered as a header row, `ignore` for unmapped columns.
    pub fn header(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.to_string()).collect()
    }
}

/// Proposes a mapping for a header row.
///
/// Each cell is matched against the canonical field names, then against the synonym table.
/// Unknown headers, and headers resolving to a field already claimed by an earlier column,
/// are ignored.
pub fn infer_mapping<S: AsRef<str>>(header: &[S]) -> ColumnMapping {
    let mut claimed: HashSet<VoterField> = HashSet::new();
    let targets = header
        .iter()
        .map(|cell| match lookup_header(cell.as_ref()) {
            Some(field) if claimed.insert(field) => ColumnTarget::Field(field),
            Some(field) => {
                debug!(
                    "infer_mapping: {:?} resolves to {} which is already mapped, ignoring",
                    cell.as_ref(),
                    field
                );
                ColumnTarget::Ignore
            }
            None => ColumnTarget::Ignore,
        })
        .collect();
    let mapping = ColumnMapping { targets };
    debug!("infer_mapping: {:?}", mapping.header());
    mapping
}

/// Checks that a mapping and its policy can be submitted.
pub fn validate(mapping: &ColumnMapping, policy: &ImportPolicy) -> CoreResult<()> {
    let mut seen: HashSet<VoterField> = HashSet::new();
    for field in mapping.mapped_fields() {
        ensure!(
            seen.insert(field),
            MappingValidationSnafu {
                problem: MappingProblem::DuplicateField(field)
            }
        );
    }
    for field in VoterField::REQUIRED {
        ensure!(
            seen.contains(&field),
            MappingValidationSnafu {
                problem: MappingProblem::MissingRequired(field)
            }
        );
    }
    if policy.mode != DuplicateMode::Replace {
        ensure!(
            !policy.identity_fields.is_empty(),
            MappingValidationSnafu {
                problem: MappingProblem::NoIdentityFields
            }
        );
    }
    if policy.mode == DuplicateMode::Merge {
        let t = policy.match_threshold;
        ensure!(
            (ImportPolicy::MIN_THRESHOLD..=ImportPolicy::MAX_THRESHOLD).contains(&t),
            MappingValidationSnafu {
                problem: MappingProblem::ThresholdOutOfRange(t)
            }
        );
    }
    Ok(())
}

/// The data actually sent to the import endpoint.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ImportPayload {
    /// The projected file, header included.
    pub csv: String,
    pub file_name: String,
    pub policy: ImportPolicy,
    /// Number of data rows in `csv`.
    pub row_count: usize,
    /// SHA-256 of `csv`.
    pub digest: String,
}

impl ImportPayload {
    /// The text fields of the multipart form, next to the `file` part.
    pub fn form_fields(&self) -> CoreResult<Vec<(&'static str, String)>> {
        Ok(vec![
            ("handle_duplicates", self.policy.mode.as_str().to_string()),
            ("identify_by", self.policy.identify_by_json()?),
            ("update_existing", self.policy.update_existing.to_string()),
            ("match_threshold", self.policy.match_threshold.to_string()),
        ])
    }
}

/// Projects the mapped columns of `rows` into a new CSV file.
///
/// The first row of `rows` is the original header and is replaced by the canonical field
/// names. Cells are trimmed; columns missing from a row become empty cells.
pub fn build_payload(
    rows: &Rows,
    mapping: &ColumnMapping,
    policy: &ImportPolicy,
) -> CoreResult<ImportPayload> {
    validate(mapping, policy)?;
    ensure!(!rows.is_empty(), EmptyFileSnafu {});

    let columns: Vec<(usize, VoterField)> = mapping
        .targets()
        .iter()
        .enumerate()
        .filter_map(|(idx, t)| t.field().map(|f| (idx, f)))
        .collect();

    let header: Vec<&str> = columns.iter().map(|(_, f)| f.name()).collect();
    let projected = rows.iter().skip(1).map(|row| {
        columns
            .iter()
            .map(|(idx, _)| row.get(*idx).map(|c| c.trim()).unwrap_or(""))
            .collect::<Vec<&str>>()
    });
    let csv = csv_text::write_rows(std::iter::once(header.clone()).chain(projected))?;

    let row_count = rows.len() - 1;
    let digest = sha256::digest(csv.as_str());
    info!(
        "build_payload: {} rows, columns {:?}, digest {}",
        row_count, header, digest
    );
    Ok(ImportPayload {
        csv,
        file_name: PAYLOAD_FILE_NAME.to_string(),
        policy: policy.clone(),
        row_count,
        digest,
    })
}

/// The first few data rows, for display next to the proposed mapping.
pub fn preview(rows: &Rows) -> &[Vec<String>] {
    let end = rows.len().min(PREVIEW_ROWS + 1);
    rows.get(1..end).unwrap_or(&[])
}
