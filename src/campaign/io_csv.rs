// Reading voter CSV files and preparing the import.

use campaign_core::builder::ImportSession;
use campaign_core::csv_text::{self, Rows};
use campaign_core::import;

use crate::campaign::{io_common::*, *};

/// Reads and parses a voter file, and proposes a mapping.
///
/// Parsing runs on the blocking pool: the worker gets the raw text and sends back either
/// the rows or the parse error.
pub async fn load_session(path: &str) -> CampaignResult<ImportSession> {
    let file_name = simplify_file_name(path);
    import::check_file_name(&file_name)?;
    let raw_text = read_text(path)?;
    info!("Attempting to parse {} ({} bytes)", path, raw_text.len());

    let rows: Rows = tokio::task::spawn_blocking(move || csv_text::parse(&raw_text))
        .await
        .context(WorkerSnafu {})??;
    let session = ImportSession::from_rows(&file_name, rows)?;
    Ok(session)
}

/// Applies the `--map COLUMN=FIELD` overrides, in order.
pub fn apply_overrides(session: &mut ImportSession, overrides: &[String]) -> CampaignResult<()> {
    for o in overrides {
        let (column, target) = match o.rsplit_once('=') {
            Some((c, t)) => (c.trim(), t.trim()),
            None => whatever!("Column override {:?} must be COLUMN=FIELD", o),
        };
        let target: ColumnTarget = match target.parse() {
            Ok(t) => t,
            Err(message) => return ConfigSnafu { message }.fail(),
        };
        match column.parse::<usize>() {
            // The index starts at 1 to respect most conventions in the spreadsheet world.
            Ok(0) => whatever!("Column numbers start at 1 (in {:?})", o),
            Ok(idx) => session.map_column(idx - 1, target)?,
            Err(_) => {
                session.map_header(column, target)?;
            }
        }
        debug!("apply_overrides: {} -> {:?}", o, session.mapping().header());
    }
    Ok(())
}

/// A human readable view of the mapping and of the first rows.
pub fn describe_mapping(session: &ImportSession) -> CampaignResult<String> {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!(
        "{}: {} data rows",
        session.file_name(),
        session.data_rows()
    ));
    for (idx, (header, target)) in session
        .header()
        .iter()
        .zip(session.mapping().targets())
        .enumerate()
    {
        let label = match target.field() {
            Some(f) => f.label().to_string(),
            None => "(ignored)".to_string(),
        };
        lines.push(format!("  {:>3}. {:<24} -> {}", idx + 1, header, label));
    }
    let preview = session.preview();
    if !preview.is_empty() {
        lines.push("Preview:".to_string());
        for row in preview {
            lines.push(format!("  {}", csv_text::join_row(row.as_slice())?));
        }
    }
    Ok(lines.join("\n"))
}

/// Compares the generated payload with a reference file, line by line.
pub fn check_reference(payload_csv: &str, reference_path: &str) -> CampaignResult<()> {
    let reference = read_text(reference_path)?;
    let expected: Vec<&str> = reference
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .collect();
    let expected = expected.join("\n");
    if expected != payload_csv {
        warn!("Found differences with the reference payload");
        print_diff(expected.as_str(), payload_csv, "\n");
        return ReferenceMismatchSnafu {
            path: reference_path.to_string(),
        }
        .fail();
    }
    info!("check_reference: payload matches {}", reference_path);
    Ok(())
}
