use log::{debug, info, warn};

pub use campaign_core::*;
use snafu::{prelude::*, Snafu};

use chrono::Utc;
use std::collections::BTreeSet;
use text_diff::print_diff;
use tokio_util::sync::CancellationToken;

use campaign_core::export::ExportFormat;
use campaign_core::notify::{NoticeKind, NoticeRenderer, Notification, NotificationQueue};
use campaign_core::session::{Session, SessionContext};
use campaign_core::turf::TurfDraft;

use crate::args::{Args, Command, ImportArgs, TurfCommand};
use crate::campaign::api::{ExportRequest, HttpResourceApi, ImportOutcome, ResourceApi};
use crate::campaign::config_reader::*;
use crate::campaign::turfs::TurfGeofenceAssigner;

pub mod api;
pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod turfs;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CampaignError {
    #[snafu(context(false), display("{source}"))]
    Core { source: CoreError },

    /// The server answered with an error.
    #[snafu(display("{message}"))]
    Network { message: String, status: Option<u16> },

    /// The server could not be reached, or the answer could not be read.
    #[snafu(display("Request to {url} failed: {source}"))]
    Request { source: reqwest::Error, url: String },

    #[snafu(display("Error opening file {path}: {source}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },

    #[snafu(display("Error parsing JSON in {what}: {source}"))]
    ParsingJson {
        source: serde_json::Error,
        what: String,
    },

    #[snafu(display("Configuration error: {message}"))]
    Config { message: String },

    #[snafu(display("The operation was cancelled."))]
    Cancelled {},

    #[snafu(display("The payload differs from the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(display("Background worker failed: {source}"))]
    Worker { source: tokio::task::JoinError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync>, Some)))]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

pub type CampaignResult<T> = Result<T, CampaignError>;

/// Prints notifications on the standard error, errors and warnings through the logger too.
pub struct StderrRenderer;

impl NoticeRenderer for StderrRenderer {
    fn render(&mut self, n: &Notification) {
        match n.kind {
            NoticeKind::Error => {
                warn!("notification {}: {}", n.id, n.message);
                eprintln!("Error: {}", n.message);
            }
            NoticeKind::Warning => {
                warn!("notification {}: {}", n.id, n.message);
                eprintln!("Warning: {}", n.message);
            }
            NoticeKind::Info | NoticeKind::Success => eprintln!("{}", n.message),
        }
    }
}

/// Runs one command line invocation.
pub async fn run(
    args: &Args,
    notices: &mut NotificationQueue,
    cancel: CancellationToken,
) -> CampaignResult<()> {
    let config = match &args.config {
        Some(p) => read_config(p)?,
        None => ClientConfig::default(),
    };
    let settings = resolve(&config, args.api_url.as_deref(), args.token.as_deref())?;

    let mut session = SessionContext::new();
    session.subscribe(|s: Option<&Session>| {
        debug!("session changed, signed in: {}", s.is_some());
    });
    if let Some(s) = &settings.session {
        session.sign_in(s.clone());
    }
    let api = HttpResourceApi::new(&settings.api_base_url, settings.timeout, &mut session)?;

    match &args.command {
        Command::Import(a) => {
            run_import(&api, &settings.import_policy, a, notices).await?;
        }
        Command::Export {
            out,
            fields,
            format,
        } => {
            let fields = match fields {
                Some(names) => parse_fields(names)?,
                None => settings.export_fields.clone(),
            };
            let format: ExportFormat = match format.parse() {
                Ok(f) => f,
                Err(message) => return ConfigSnafu { message }.fail(),
            };
            let out = out.as_deref().unwrap_or("stdout");
            run_export(&api, &fields, format, out, notices).await?;
        }
        Command::Turf(tc) => {
            let mut assigner = TurfGeofenceAssigner::new(api, cancel);
            run_turf(&mut assigner, tc, notices).await?;
        }
        Command::Canvass {
            voter,
            turf,
            result,
            notes,
        } => {
            let result: CanvassResult = match result.parse() {
                Ok(r) => r,
                Err(message) => return ConfigSnafu { message }.fail(),
            };
            let mut assigner = TurfGeofenceAssigner::new(api, cancel);
            let i = assigner
                .log_interaction(*voter, *turf, result, notes.as_deref())
                .await?;
            notices.push(
                NoticeKind::Success,
                &format!(
                    "Logged {} for voter {} in turf {}",
                    i.result, i.voter_id, i.turf_id
                ),
                Utc::now(),
            );
        }
        Command::VolunteerProgress { volunteer } => {
            let assigner = TurfGeofenceAssigner::new(api, cancel);
            let progress = assigner.volunteer_progress(*volunteer).await?;
            if progress.is_empty() {
                notices.push(
                    NoticeKind::Info,
                    &format!("No turf assigned to volunteer {}", volunteer),
                    Utc::now(),
                );
            }
            for p in progress {
                println!(
                    "{:>6}  {:<30} {} interactions",
                    p.turf_id, p.turf_name, p.total_interactions
                );
            }
        }
    }
    Ok(())
}

/// Maps, validates and uploads a voter file. Returns `None` for a dry run.
pub async fn run_import<A: ResourceApi + ?Sized>(
    api: &A,
    default_policy: &ImportPolicy,
    args: &ImportArgs,
    notices: &mut NotificationQueue,
) -> CampaignResult<Option<ImportOutcome>> {
    let policy = merge_import_policy(default_policy, args)?;
    let mut session = io_csv::load_session(&args.file).await?.policy(&policy);
    io_csv::apply_overrides(&mut session, &args.overrides)?;
    println!("{}", io_csv::describe_mapping(&session)?);

    let payload = session.payload()?;
    info!(
        "run_import: payload of {} rows, digest {}",
        payload.row_count, payload.digest
    );

    // The reference payload, if provided for comparison
    if let Some(reference) = &args.reference {
        io_csv::check_reference(&payload.csv, reference)?;
    }
    if let Some(out) = &args.out {
        io_common::write_output(out, &payload.csv)?;
    }

    if args.dry_run {
        notices.push(
            NoticeKind::Info,
            &format!(
                "Dry run: {} voters ready to import, nothing was sent",
                payload.row_count
            ),
            Utc::now(),
        );
        return Ok(None);
    }

    let outcome = api.import_voters(&payload).await?;
    let mut message = format!("Successfully imported {} voters!", outcome.imported_count);
    if let Some(merged) = outcome.duplicates_merged {
        message.push_str(&format!(" ({} duplicates merged)", merged));
    }
    notices.push(NoticeKind::Success, &message, Utc::now());
    Ok(Some(outcome))
}

/// Exports the voter list. The server builds the file when it can, the client otherwise.
pub async fn run_export<A: ResourceApi + ?Sized>(
    api: &A,
    fields: &[VoterField],
    format: ExportFormat,
    out: &str,
    notices: &mut NotificationQueue,
) -> CampaignResult<usize> {
    let voters = api.list_voters().await?;
    let request = ExportRequest {
        format,
        fields: fields.to_vec(),
        voters: voters.iter().filter_map(|v| v.id).collect(),
    };
    let text = match api.export_voters(&request).await {
        Ok(text) => text,
        Err(e) => {
            warn!("run_export: falling back to client-side export ({})", e);
            export::export_voters(&voters, fields, format)?
        }
    };
    io_common::write_output(out, &text)?;
    if out != "stdout" {
        notices.push(
            NoticeKind::Success,
            &format!("Exported {} voters to {}", voters.len(), out),
            Utc::now(),
        );
    }
    Ok(voters.len())
}

pub async fn run_turf<A: ResourceApi>(
    assigner: &mut TurfGeofenceAssigner<A>,
    command: &TurfCommand,
    notices: &mut NotificationQueue,
) -> CampaignResult<()> {
    let now = Utc::now();
    match command {
        TurfCommand::List => {
            for t in assigner.list().await? {
                println!(
                    "{:>6}  {:<30} {} points",
                    t.id,
                    t.name,
                    t.boundary.vertices().len()
                );
            }
        }
        TurfCommand::Create { name, boundary } => {
            let mut draft = TurfDraft::new(name);
            for p in io_common::read_boundary(boundary)? {
                draft.push_point(p)?;
            }
            let turf = assigner.create(draft).await?;
            notices.push(
                NoticeKind::Success,
                &format!("Turf {} created ({})", turf.name, turf.id),
                now,
            );
        }
        TurfCommand::Voters { turf } => {
            for v in assigner.voters(*turf).await? {
                let result = v.result.map(|r| r.to_string()).unwrap_or_default();
                println!(
                    "{:>6}  {:<30} {:<10} {}",
                    v.voter.id.map(|i| i.to_string()).unwrap_or_default(),
                    v.voter.full_name(),
                    v.status,
                    result
                );
            }
        }
        TurfCommand::Filter { turf, voters } => {
            let all: Vec<VoterRecord> = match voters {
                Some(path) => io_common::read_json(path)?,
                None => assigner.api().list_voters().await?,
            };
            let inside = assigner.filter(*turf, &all).await?;
            let text = export::export_csv(&inside, &export::DEFAULT_EXPORT_FIELDS)?;
            io_common::write_output("stdout", &text)?;
            notices.push(
                NoticeKind::Info,
                &format!("{} of {} voters in turf {}", inside.len(), all.len(), turf),
                now,
            );
        }
        TurfCommand::Assign { turf, volunteer } => {
            if assigner.already_assigned(*turf, *volunteer).await? {
                notices.push(
                    NoticeKind::Warning,
                    &format!(
                        "Turf {} was already assigned to volunteer {}",
                        turf, volunteer
                    ),
                    now,
                );
            }
            assigner.assign(*turf, *volunteer).await?;
            notices.push(
                NoticeKind::Success,
                &format!("Turf {} assigned to volunteer {}", turf, volunteer),
                now,
            );
        }
        TurfCommand::Progress { turf } => {
            let p = assigner.progress(*turf).await?;
            println!(
                "{} / {} voters reached ({}%)",
                p.total_interactions,
                p.total_voters,
                p.completion_percent()
            );
        }
        TurfCommand::Delete { turf } => {
            let t = assigner.delete(*turf).await?;
            notices.push(
                NoticeKind::Success,
                &format!("Turf {} deleted", t.name),
                now,
            );
        }
    }
    Ok(())
}
