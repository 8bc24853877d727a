use log::debug;
use snafu::OptionExt;

pub use crate::config::*;
use crate::csv_text::{self, Rows};
use crate::error::*;
use crate::import::{self, ColumnMapping, ImportPayload};

/// A builder that holds one import, from the uploaded text to the payload.
///
/// The mapping starts as the suggestion of [import::infer_mapping] and can be overridden
/// column by column before building the payload.
///
/// ```
/// use campaign_core::builder::ImportSession;
/// use campaign_core::{ColumnTarget, CoreError};
///
/// let mut session = ImportSession::new("people.csv", "fname,surname,cell\nAda,Lovelace,555-0100")?;
/// session.map_column(2, ColumnTarget::Ignore)?;
///
/// let payload = session.payload()?;
/// assert_eq!(payload.csv, "first_name,last_name\nAda,Lovelace");
///
/// # Ok::<(), CoreError>(())
/// ```
pub struct ImportSession {
    pub(crate) _file_name: String,
    pub(crate) _rows: Rows,
    pub(crate) _mapping: ColumnMapping,
    pub(crate) _policy: ImportPolicy,
}

impl ImportSession {
    /// Checks the file name, parses the text and proposes a mapping.
    pub fn new(file_name: &str, raw_text: &str) -> CoreResult<ImportSession> {
        import::check_file_name(file_name)?;
        let rows = csv_text::parse(raw_text)?;
        ImportSession::from_rows(file_name, rows)
    }

    /// Starts from rows that were already parsed, for instance by a background worker.
    pub fn from_rows(file_name: &str, rows: Rows) -> CoreResult<ImportSession> {
        let header = rows.first().context(EmptyFileSnafu {})?;
        let mapping = import::infer_mapping(header);
        debug!(
            "ImportSession: {} with {} rows, proposed mapping {:?}",
            file_name,
            rows.len(),
            mapping.header()
        );
        Ok(ImportSession {
            _file_name: file_name.to_string(),
            _rows: rows,
            _mapping: mapping,
            _policy: ImportPolicy::default(),
        })
    }

    pub fn policy(self, policy: &ImportPolicy) -> ImportSession {
        ImportSession {
            _policy: policy.clone(),
            ..self
        }
    }

    pub fn file_name(&self) -> &str {
        &self._file_name
    }

    pub fn rows(&self) -> &Rows {
        &self._rows
    }

    pub fn header(&self) -> &[String] {
        &self._rows[0]
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self._mapping
    }

    pub fn current_policy(&self) -> &ImportPolicy {
        &self._policy
    }

    pub fn preview(&self) -> &[Vec<String>] {
        import::preview(&self._rows)
    }

    /// Number of data rows, the header excluded.
    pub fn data_rows(&self) -> usize {
        self._rows.len() - 1
    }

    /// Overrides the target of one column, by position.
    pub fn map_column(&mut self, index: usize, target: ColumnTarget) -> CoreResult<()> {
        self._mapping.set(index, target)
    }

    /// Overrides the target of the first column carrying this header, compared after trimming
    /// and ignoring case. Returns the column index.
    pub fn map_header(&mut self, header: &str, target: ColumnTarget) -> CoreResult<usize> {
        let key = header.trim().to_lowercase();
        let width = self._mapping.len();
        let index = self
            .header()
            .iter()
            .position(|h| h.trim().to_lowercase() == key)
            .context(MappingValidationSnafu {
                problem: MappingProblem::ColumnOutOfRange { index: width, width },
            })?;
        self._mapping.set(index, target)?;
        Ok(index)
    }

    pub fn validate(&self) -> CoreResult<()> {
        import::validate(&self._mapping, &self._policy)
    }

    pub fn payload(&self) -> CoreResult<ImportPayload> {
        import::build_payload(&self._rows, &self._mapping, &self._policy)
    }
}
