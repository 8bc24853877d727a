use clap::{Parser, Subcommand};

/// Command line client for PoliStudio: voter imports, exports and door-knocking turfs.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file. See the manual for the available keys.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (url) The base URL of the PoliStudio API. Overrides the configuration file.
    #[clap(long, value_parser, env = "POLISTUDIO_API_URL")]
    pub api_url: Option<String>,

    /// The access token sent with every request. Overrides the configuration file.
    #[clap(long, value_parser, env = "POLISTUDIO_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Imports voters from a CSV file, after mapping its columns to voter fields.
    Import(ImportArgs),

    /// Exports the voter list as CSV or JSON.
    Export {
        /// (file path, 'stdout' or empty) Where to write the file.
        #[clap(short, long, value_parser)]
        out: Option<String>,

        /// (list of comma-separated field names) The columns to export, in order.
        #[clap(long, value_parser, value_delimiter = ',')]
        fields: Option<Vec<String>>,

        /// (csv or json) The format of the exported file.
        #[clap(long, value_parser, default_value = "csv")]
        format: String,
    },

    /// Manages door-knocking turfs.
    #[clap(subcommand)]
    Turf(TurfCommand),

    /// Records the result of knocking on a door.
    Canvass {
        #[clap(long, value_parser)]
        voter: u64,

        #[clap(long, value_parser)]
        turf: u64,

        /// One of support, no_contact, refused, other.
        #[clap(long, value_parser)]
        result: String,

        #[clap(long, value_parser)]
        notes: Option<String>,
    },

    /// Shows the canvassing progress of the turfs assigned to a volunteer.
    VolunteerProgress {
        #[clap(value_parser)]
        volunteer: u64,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct ImportArgs {
    /// (file path) The CSV file to import. The name must end with .csv.
    #[clap(value_parser)]
    pub file: String,

    /// (repeatable) Overrides the proposed mapping of one column, as COLUMN=FIELD.
    /// COLUMN is a 1-based column number or a header cell. FIELD is a voter field name or
    /// 'ignore'.
    #[clap(long = "map", value_parser)]
    pub overrides: Vec<String>,

    /// (merge, skip or replace) What the server does with rows matching an existing voter.
    #[clap(long, value_parser)]
    pub duplicates: Option<String>,

    /// (list of comma-separated values) Fields used to detect duplicates: email, phone,
    /// name_address.
    #[clap(long, value_parser, value_delimiter = ',')]
    pub identify_by: Option<Vec<String>>,

    /// (50 to 100) Similarity needed to consider two voters the same.
    #[clap(long, value_parser)]
    pub match_threshold: Option<u8>,

    /// Do not update the fields of existing voters when merging.
    #[clap(long, takes_value = false)]
    pub no_update_existing: bool,

    /// Builds the payload without uploading it.
    #[clap(long, takes_value = false)]
    pub dry_run: bool,

    /// (file path) A CSV file with the expected payload. If provided, the generated payload
    /// is compared with it and the command fails on any difference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path or 'stdout') Also writes the generated payload to this location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TurfCommand {
    /// Lists the turfs.
    List,

    /// Creates a turf.
    Create {
        #[clap(long, value_parser)]
        name: String,

        /// The polygon, as 'lat,lng;lat,lng;...' or the path of a JSON file holding a list of
        /// [lat, lng] pairs. At least 3 points.
        #[clap(long, value_parser)]
        boundary: String,
    },

    /// The voters of a turf, with their canvassing status.
    Voters {
        #[clap(value_parser)]
        turf: u64,
    },

    /// Computes locally which voters fall inside a turf.
    Filter {
        #[clap(value_parser)]
        turf: u64,

        /// (file path, optional) A JSON list of voters. The voter list of the server is used
        /// otherwise.
        #[clap(long, value_parser)]
        voters: Option<String>,
    },

    /// Assigns a turf to a volunteer.
    Assign {
        #[clap(value_parser)]
        turf: u64,

        #[clap(long, value_parser)]
        volunteer: u64,
    },

    /// Shows how many voters of a turf have been reached.
    Progress {
        #[clap(value_parser)]
        turf: u64,
    },

    /// Deletes a turf. Its assignments and canvassing results are kept.
    Delete {
        #[clap(value_parser)]
        turf: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_import() {
        let args = Args::parse_from([
            "polistudio",
            "import",
            "people.csv",
            "--map",
            "3=phone",
            "--map",
            "Home Phone=ignore",
            "--identify-by",
            "email,phone",
            "--dry-run",
        ]);
        match args.command {
            Command::Import(a) => {
                assert_eq!(a.file, "people.csv");
                assert_eq!(a.overrides, vec!["3=phone", "Home Phone=ignore"]);
                assert_eq!(
                    a.identify_by,
                    Some(vec!["email".to_string(), "phone".to_string()])
                );
                assert!(a.dry_run);
                assert!(!a.no_update_existing);
            }
            x => panic!("unexpected command {:?}", x),
        }
    }

    #[test]
    fn parse_export() {
        let args = Args::parse_from(["polistudio", "export", "--fields", "email,tags"]);
        match args.command {
            Command::Export {
                out,
                fields,
                format,
            } => {
                assert_eq!(out, None);
                assert_eq!(fields, Some(vec!["email".to_string(), "tags".to_string()]));
                assert_eq!(format, "csv");
            }
            x => panic!("unexpected command {:?}", x),
        }
        let args = Args::parse_from(["polistudio", "export", "--format", "json", "-o", "v.json"]);
        assert!(matches!(
            args.command,
            Command::Export { format, .. } if format == "json"
        ));
    }

    #[test]
    fn parse_turf_and_progress() {
        let args = Args::parse_from(["polistudio", "turf", "assign", "7", "--volunteer", "3"]);
        assert!(matches!(
            args.command,
            Command::Turf(TurfCommand::Assign {
                turf: 7,
                volunteer: 3
            })
        ));
        let args = Args::parse_from(["polistudio", "--verbose", "volunteer-progress", "3"]);
        assert!(args.verbose);
        assert!(matches!(
            args.command,
            Command::VolunteerProgress { volunteer: 3 }
        ));
    }
}
