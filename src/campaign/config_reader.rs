use crate::args::ImportArgs;
use crate::campaign::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Used when neither the flags, the environment nor the configuration file give a URL.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportDefaults {
    #[serde(rename = "handleDuplicates")]
    pub handle_duplicates: Option<String>,
    #[serde(rename = "identifyBy")]
    pub identify_by: Option<Vec<String>>,
    #[serde(rename = "matchThreshold")]
    pub match_threshold: Option<u8>,
    #[serde(rename = "updateExisting")]
    pub update_existing: Option<bool>,
}

/// The content of the JSON configuration file. Every key is optional.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(rename = "apiBaseUrl")]
    pub api_base_url: Option<String>,
    pub token: Option<String>,
    #[serde(rename = "tokenExpiry")]
    pub token_expiry: Option<DateTime<Utc>>,
    #[serde(rename = "requestTimeoutSecs")]
    pub request_timeout_secs: Option<u64>,
    #[serde(rename = "importDefaults")]
    pub import_defaults: Option<ImportDefaults>,
    #[serde(rename = "exportFields")]
    pub export_fields: Option<Vec<String>>,
}

/// The configuration once the file, the environment and the flags have been merged.
#[derive(PartialEq, Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub session: Option<Session>,
    pub timeout: Duration,
    pub import_policy: ImportPolicy,
    pub export_fields: Vec<VoterField>,
}

pub fn read_config(path: &str) -> CampaignResult<ClientConfig> {
    let contents = io_common::read_text(path)?;
    let config: ClientConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {
        what: path.to_string(),
    })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

/// Merges the configuration file with the values given on the command line (or through the
/// environment), the latter taking precedence.
pub fn resolve(
    config: &ClientConfig,
    api_url: Option<&str>,
    token: Option<&str>,
) -> CampaignResult<Settings> {
    let api_base_url = api_url
        .map(|s| s.to_string())
        .or_else(|| config.api_base_url.clone())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    ensure!(
        api_base_url.starts_with("http://") || api_base_url.starts_with("https://"),
        ConfigSnafu {
            message: format!("apiBaseUrl must be an http(s) URL, got {:?}", api_base_url)
        }
    );

    // A token given on the command line does not inherit the expiry of the file's token.
    let session = match (token, &config.token) {
        (Some(t), _) => Some(Session::new(t, None)),
        (None, Some(t)) => Some(Session::new(t, config.token_expiry)),
        (None, None) => None,
    };

    let import_policy = match &config.import_defaults {
        Some(d) => policy_from_defaults(d)?,
        None => ImportPolicy::default(),
    };

    let export_fields = match &config.export_fields {
        Some(names) => parse_fields(names)?,
        None => campaign_core::export::DEFAULT_EXPORT_FIELDS.to_vec(),
    };

    let timeout = Duration::from_secs(
        config
            .request_timeout_secs
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
    );

    info!(
        "settings: api {}, session: {}, timeout {:?}",
        api_base_url,
        session.is_some(),
        timeout
    );
    Ok(Settings {
        api_base_url,
        session,
        timeout,
        import_policy,
        export_fields,
    })
}

pub fn parse_fields(names: &[String]) -> CampaignResult<Vec<VoterField>> {
    names
        .iter()
        .map(|n| {
            n.parse::<VoterField>()
                .map_err(|message| CampaignError::Config { message })
        })
        .collect()
}

fn policy_from_defaults(d: &ImportDefaults) -> CampaignResult<ImportPolicy> {
    let mut policy = ImportPolicy::default();
    if let Some(mode) = &d.handle_duplicates {
        policy.mode = parse_mode(mode)?;
    }
    if let Some(ids) = &d.identify_by {
        policy.identity_fields = parse_identity(ids)?;
    }
    if let Some(t) = d.match_threshold {
        policy.match_threshold = t;
    }
    if let Some(u) = d.update_existing {
        policy.update_existing = u;
    }
    Ok(policy)
}

/// Applies the import flags on top of the configured defaults.
///
/// The result is not validated here: the threshold range and the identity fields are
/// checked against the mapping when the payload is built.
pub fn merge_import_policy(base: &ImportPolicy, args: &ImportArgs) -> CampaignResult<ImportPolicy> {
    let mut policy = base.clone();
    if let Some(mode) = &args.duplicates {
        policy.mode = parse_mode(mode)?;
    }
    if let Some(ids) = &args.identify_by {
        policy.identity_fields = parse_identity(ids)?;
    }
    if let Some(t) = args.match_threshold {
        policy.match_threshold = t;
    }
    if args.no_update_existing {
        policy.update_existing = false;
    }
    debug!("merge_import_policy: {:?}", policy);
    Ok(policy)
}

fn parse_mode(s: &str) -> CampaignResult<DuplicateMode> {
    s.parse::<DuplicateMode>()
        .map_err(|message| CampaignError::Config { message })
}

fn parse_identity(ids: &[String]) -> CampaignResult<BTreeSet<IdentityField>> {
    ids.iter()
        .map(|s| {
            s.parse::<IdentityField>()
                .map_err(|message| CampaignError::Config { message })
        })
        .collect()
}
