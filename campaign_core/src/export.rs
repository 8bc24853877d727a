// Client-side export of voter lists, used when the server cannot produce the file.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JSValue};
use std::fmt::Display;
use std::str::FromStr;

use crate::config::{VoterField, VoterRecord};
use crate::csv_text;
use crate::error::{CoreError, CoreResult};

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            x => Err(format!("Unknown export format {:?} (expected csv or json)", x)),
        }
    }
}

/// Fields exported when the caller does not choose.
pub const DEFAULT_EXPORT_FIELDS: [VoterField; 7] = [
    VoterField::FirstName,
    VoterField::LastName,
    VoterField::Address,
    VoterField::Phone,
    VoterField::Email,
    VoterField::SupportLevel,
    VoterField::Tags,
];

// en-US short date, as shown in the voter tables.
const DATE_FORMAT: &str = "%-m/%-d/%Y";

/// Renders one field of a record. Lists are joined with "; ", booleans are Yes/No and a
/// missing value is an empty string.
pub fn field_value(record: &VoterRecord, field: VoterField) -> String {
    fn opt(s: &Option<String>) -> String {
        s.clone().unwrap_or_default()
    }
    fn num(x: Option<f64>) -> String {
        x.map(|v| v.to_string()).unwrap_or_default()
    }
    match field {
        VoterField::FirstName => record.first_name.clone(),
        VoterField::LastName => record.last_name.clone(),
        VoterField::Address => opt(&record.address),
        VoterField::Phone => opt(&record.phone),
        VoterField::Email => opt(&record.email),
        VoterField::SupportLevel => record.support_level.to_string(),
        VoterField::Tags => record
            .tags
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        VoterField::Notes => opt(&record.notes),
        VoterField::Registered => (if record.registered { "Yes" } else { "No" }).to_string(),
        VoterField::LastContacted => record
            .last_contacted
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default(),
        VoterField::Lat => num(record.lat),
        VoterField::Lng => num(record.lng),
    }
}

/// Builds a CSV document with one header row (the field names) and one row per record.
pub fn export_csv(records: &[VoterRecord], fields: &[VoterField]) -> CoreResult<String> {
    let header: Vec<String> = fields.iter().map(|f| f.name().to_string()).collect();
    let rows = records
        .iter()
        .map(|r| fields.iter().map(|f| field_value(r, *f)).collect::<Vec<String>>());
    let text = csv_text::write_rows(std::iter::once(header).chain(rows))?;
    debug!(
        "export_csv: {} records, {} fields",
        records.len(),
        fields.len()
    );
    Ok(text)
}

/// Builds a pretty-printed JSON array. Each object holds the selected fields of one record, in
/// the order of `fields`, with their raw values.
pub fn export_json(records: &[VoterRecord], fields: &[VoterField]) -> CoreResult<String> {
    let encoding = |e: serde_json::Error| CoreError::Encoding {
        what: "voter list".to_string(),
        message: e.to_string(),
    };
    let mut objects: Vec<Map<String, JSValue>> = Vec::with_capacity(records.len());
    for r in records {
        let js = serde_json::to_value(r).map_err(encoding)?;
        let mut obj = Map::new();
        for f in fields {
            if let Some(v) = js.get(f.name()) {
                obj.insert(f.name().to_string(), v.clone());
            }
        }
        objects.push(obj);
    }
    serde_json::to_string_pretty(&objects).map_err(encoding)
}

pub fn export_voters(
    records: &[VoterRecord],
    fields: &[VoterField],
    format: ExportFormat,
) -> CoreResult<String> {
    match format {
        ExportFormat::Csv => export_csv(records, fields),
        ExportFormat::Json => export_json(records, fields),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn export_formats_values() {
        let mut r = VoterRecord::new("Mary", "O'Neil");
        r.address = Some("12 Main St, Apt 4".to_string());
        r.notes = Some("Said \"maybe\"".to_string());
        r.tags = ["yard sign", "donor"].iter().map(|s| s.to_string()).collect();
        r.registered = true;
        r.last_contacted = NaiveDate::from_ymd_opt(2024, 3, 7);
        r.support_level = 4;
        let other = VoterRecord::new("Li", "Wei");

        let text = export_csv(
            &[r, other],
            &[
                VoterField::FirstName,
                VoterField::Address,
                VoterField::Tags,
                VoterField::Registered,
                VoterField::LastContacted,
                VoterField::Notes,
                VoterField::SupportLevel,
            ],
        )
        .unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "first_name,address,tags,registered,last_contacted,notes,support_level"
        );
        assert_eq!(
            lines[1],
            "Mary,\"12 Main St, Apt 4\",donor; yard sign,Yes,3/7/2024,\"Said \"\"maybe\"\"\",4"
        );
        assert_eq!(lines[2], "Li,,,No,,,0");
    }

    #[test]
    fn export_reads_back() {
        let mut r = VoterRecord::new("Ann", "Lee");
        r.address = Some("1 \"Elm\" Rd, Unit 2".to_string());
        let text = export_csv(&[r], &DEFAULT_EXPORT_FIELDS).unwrap();
        let rows = csv_text::parse(&text).unwrap();
        assert_eq!(rows[1][2], "1 \"Elm\" Rd, Unit 2");
        assert_eq!(rows[0].len(), DEFAULT_EXPORT_FIELDS.len());
    }

    #[test]
    fn export_as_json() {
        let mut r = VoterRecord::new("Ada", "Lovelace");
        r.id = Some(3);
        r.tags = ["donor".to_string()].into_iter().collect();
        let text = export_voters(
            &[r],
            &[VoterField::LastName, VoterField::Tags, VoterField::Email],
            ExportFormat::Json,
        )
        .unwrap();
        let js: JSValue = serde_json::from_str(&text).unwrap();
        assert_eq!(
            js,
            serde_json::json!([{"last_name": "Lovelace", "tags": ["donor"], "email": null}])
        );
        let last_name = text.find("last_name").unwrap();
        assert!(last_name < text.find("tags").unwrap());
        assert!(!text.contains("first_name"));
        assert!(text.starts_with("[\n  {"));
    }

    #[test]
    fn export_formats() {
        assert_eq!("JSON".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert_eq!("csv".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }
}
