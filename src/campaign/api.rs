//! Access to the PoliStudio backend.
//!
//! [ResourceApi] is the seam used by the commands; [HttpResourceApi] implements it over HTTP
//! with `reqwest`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use campaign_core::export::ExportFormat;

use crate::campaign::*;

/// The answer of the import endpoint.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub imported_count: u64,
    #[serde(default)]
    pub duplicates_merged: Option<u64>,
}

/// A voter located in a turf, as listed by the server.
#[derive(PartialEq, Debug, Clone)]
pub struct TurfVoter {
    pub voter: VoterRecord,
    /// `pending` or `completed`.
    pub status: String,
    /// The canvassing result, once the door has been knocked on.
    pub result: Option<CanvassResult>,
}

/// What the export endpoint is asked to produce.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub fields: Vec<VoterField>,
    /// The ids of the exported voters.
    pub voters: Vec<VoterId>,
}

/// The backend, as seen by the commands.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    async fn list_voters(&self) -> CampaignResult<Vec<VoterRecord>>;

    async fn create_voter(&self, voter: &VoterRecord) -> CampaignResult<VoterRecord>;

    async fn update_voter(&self, voter_id: VoterId, voter: &VoterRecord)
        -> CampaignResult<VoterRecord>;

    async fn delete_voter(&self, voter_id: VoterId) -> CampaignResult<()>;

    async fn import_voters(&self, payload: &ImportPayload) -> CampaignResult<ImportOutcome>;

    /// The exported file, as produced by the server.
    async fn export_voters(&self, request: &ExportRequest) -> CampaignResult<String>;

    async fn list_turfs(&self) -> CampaignResult<Vec<Turf>>;

    async fn create_turf(&self, turf: &NewTurf) -> CampaignResult<Turf>;

    async fn turf_voters(&self, turf_id: TurfId) -> CampaignResult<Vec<TurfVoter>>;

    async fn delete_turf(&self, turf_id: TurfId) -> CampaignResult<()>;

    async fn assign_turf(
        &self,
        turf_id: TurfId,
        volunteer_id: VolunteerId,
    ) -> CampaignResult<TurfAssignment>;

    async fn log_interaction(
        &self,
        voter_id: VoterId,
        turf_id: TurfId,
        result: CanvassResult,
        notes: Option<&str>,
    ) -> CampaignResult<CanvassingInteraction>;

    async fn turf_progress(&self, turf_id: TurfId) -> CampaignResult<TurfProgress>;

    async fn volunteer_progress(
        &self,
        volunteer_id: VolunteerId,
    ) -> CampaignResult<Vec<VolunteerTurfProgress>>;
}

// **** Wire formats ****

// The backend stores the boundary of a turf as a JSON string.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
struct WireTurf {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<TurfId>,
    name: String,
    boundary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

impl WireTurf {
    fn from_new(turf: &NewTurf) -> CampaignResult<WireTurf> {
        let boundary = serde_json::to_string(&turf.boundary).context(ParsingJsonSnafu {
            what: format!("boundary of turf {:?}", turf.name),
        })?;
        Ok(WireTurf {
            id: None,
            name: turf.name.clone(),
            boundary,
            created_at: None,
        })
    }

    fn into_turf(self) -> CampaignResult<Turf> {
        let id = match self.id {
            Some(id) => id,
            None => whatever!("The server sent turf {:?} without an id", self.name),
        };
        let boundary: Boundary =
            serde_json::from_str(&self.boundary).context(ParsingJsonSnafu {
                what: format!("boundary of turf {}", id),
            })?;
        Ok(Turf {
            id,
            name: self.name,
            boundary,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }
}

#[derive(Serialize)]
struct WireInteractionRequest<'a> {
    voter_id: VoterId,
    turf_id: TurfId,
    result: CanvassResult,
    notes: Option<&'a str>,
}

#[derive(Deserialize)]
struct WireInteraction {
    voter_id: VoterId,
    turf_id: TurfId,
    result: CanvassResult,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct WireTurfVoter {
    id: Option<VoterId>,
    first_name: String,
    last_name: String,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
    // A number before the first visit, the canvassing result after.
    #[serde(default)]
    support_level: Option<JSValue>,
    #[serde(default)]
    status: Option<String>,
}

impl From<WireTurfVoter> for TurfVoter {
    fn from(w: WireTurfVoter) -> Self {
        let (support_level, result) = match &w.support_level {
            Some(JSValue::Number(n)) => (n.as_u64().unwrap_or(0).min(u8::MAX as u64) as u8, None),
            Some(JSValue::String(s)) => (0, s.parse::<CanvassResult>().ok()),
            _ => (0, None),
        };
        TurfVoter {
            voter: VoterRecord {
                id: w.id,
                first_name: w.first_name,
                last_name: w.last_name,
                address: w.address,
                support_level,
                lat: w.lat,
                lng: w.lng,
                ..VoterRecord::default()
            },
            status: w.status.unwrap_or_else(|| "pending".to_string()),
            result,
        }
    }
}

/// Turns a non-2xx answer into an error, keeping the `detail` message of the server.
fn response_error(status: u16, body: &str, fallback: &str) -> CampaignError {
    let detail = serde_json::from_str::<JSValue>(body)
        .ok()
        .and_then(|js| js.get("detail").and_then(|d| d.as_str()).map(|s| s.to_string()));
    let message = match detail {
        Some(d) if !d.is_empty() => d,
        _ => format!("{} (status {})", fallback, status),
    };
    CampaignError::Network {
        message,
        status: Some(status),
    }
}

/// [ResourceApi] over HTTP.
///
/// The client follows the [SessionContext] it was built with: signing in or out later changes
/// the token of the next requests. A session that has expired is not sent.
#[derive(Debug, Clone)]
pub struct HttpResourceApi {
    client: Client,
    base_url: String,
    session: Arc<RwLock<Option<Session>>>,
}

impl HttpResourceApi {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: &mut SessionContext,
    ) -> CampaignResult<HttpResourceApi> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context(RequestSnafu {
                url: base_url.to_string(),
            })?;
        let shared = Arc::new(RwLock::new(session.current().cloned()));
        let follower = Arc::clone(&shared);
        session.subscribe(move |s: Option<&Session>| {
            if let Ok(mut current) = follower.write() {
                *current = s.cloned();
            }
        });
        Ok(HttpResourceApi {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: shared,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let rb = self.client.request(method, self.url(path));
        let session = self.session.read().ok().and_then(|s| s.clone());
        match &session {
            Some(s) if s.is_live(Utc::now()) => rb.bearer_auth(&s.token),
            Some(_) => {
                warn!("The session has expired, sending {} without a token", path);
                rb
            }
            None => rb,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        rb: RequestBuilder,
        path: &str,
        fallback: &str,
    ) -> CampaignResult<T> {
        let body = self.send_text(rb, path, fallback).await?;
        serde_json::from_str(&body).context(ParsingJsonSnafu {
            what: self.url(path),
        })
    }

    async fn send_text(
        &self,
        rb: RequestBuilder,
        path: &str,
        fallback: &str,
    ) -> CampaignResult<String> {
        let url = self.url(path);
        let response = rb.send().await.context(RequestSnafu { url: url.clone() })?;
        let status = response.status();
        let body = response.text().await.context(RequestSnafu { url: url.clone() })?;
        debug!("{} -> {} ({} bytes)", url, status, body.len());
        if !status.is_success() {
            let err = response_error(status.as_u16(), &body, fallback);
            warn!("{}: {}", url, err);
            return Err(err);
        }
        Ok(body)
    }
}

#[async_trait]
impl ResourceApi for HttpResourceApi {
    async fn list_voters(&self) -> CampaignResult<Vec<VoterRecord>> {
        let path = "/voters";
        self.send(self.request(Method::GET, path), path, "Failed to fetch voters")
            .await
    }

    async fn create_voter(&self, voter: &VoterRecord) -> CampaignResult<VoterRecord> {
        let path = "/voters";
        let rb = self.request(Method::POST, path).json(voter);
        self.send(rb, path, "Failed to create voter").await
    }

    async fn update_voter(
        &self,
        voter_id: VoterId,
        voter: &VoterRecord,
    ) -> CampaignResult<VoterRecord> {
        let path = format!("/voters/{}", voter_id);
        let rb = self.request(Method::PUT, &path).json(voter);
        self.send(rb, &path, "Failed to update voter").await
    }

    async fn delete_voter(&self, voter_id: VoterId) -> CampaignResult<()> {
        let path = format!("/voters/{}", voter_id);
        let _: JSValue = self
            .send(
                self.request(Method::DELETE, &path),
                &path,
                "Failed to delete voter",
            )
            .await?;
        Ok(())
    }

    async fn import_voters(&self, payload: &ImportPayload) -> CampaignResult<ImportOutcome> {
        let path = "/import/voters";
        let part = reqwest::multipart::Part::bytes(payload.csv.clone().into_bytes())
            .file_name(payload.file_name.clone())
            .mime_str("text/csv")
            .context(RequestSnafu {
                url: self.url(path),
            })?;
        let mut form = reqwest::multipart::Form::new().part("file", part);
        for (name, value) in payload.form_fields()? {
            form = form.text(name, value);
        }
        info!(
            "Uploading {} rows ({}) to {}",
            payload.row_count, payload.digest, path
        );
        let rb = self.request(Method::POST, path).multipart(form);
        self.send(rb, path, "Failed to import CSV").await
    }

    async fn export_voters(&self, request: &ExportRequest) -> CampaignResult<String> {
        let path = "/voters/export";
        let rb = self.request(Method::POST, path).json(request);
        let body = self.send_text(rb, path, "Failed to export voters").await?;
        // Either the file itself, or the file as a JSON string.
        match serde_json::from_str::<JSValue>(&body) {
            Ok(JSValue::String(text)) => Ok(text),
            _ => Ok(body),
        }
    }

    async fn list_turfs(&self) -> CampaignResult<Vec<Turf>> {
        let path = "/door-knocking/turf";
        let wire: Vec<WireTurf> = self
            .send(self.request(Method::GET, path), path, "Failed to fetch turfs")
            .await?;
        wire.into_iter().map(|w| w.into_turf()).collect()
    }

    async fn create_turf(&self, turf: &NewTurf) -> CampaignResult<Turf> {
        let path = "/door-knocking/turf";
        let rb = self
            .request(Method::POST, path)
            .json(&WireTurf::from_new(turf)?);
        let wire: WireTurf = self.send(rb, path, "Failed to create turf").await?;
        wire.into_turf()
    }

    async fn turf_voters(&self, turf_id: TurfId) -> CampaignResult<Vec<TurfVoter>> {
        let path = format!("/door-knocking/turf/{}/voters", turf_id);
        let wire: Vec<WireTurfVoter> = self
            .send(
                self.request(Method::GET, &path),
                &path,
                "Failed to fetch turf voters",
            )
            .await?;
        Ok(wire.into_iter().map(TurfVoter::from).collect())
    }

    async fn delete_turf(&self, turf_id: TurfId) -> CampaignResult<()> {
        let path = format!("/door-knocking/turf/{}", turf_id);
        let _: JSValue = self
            .send(
                self.request(Method::DELETE, &path),
                &path,
                "Failed to delete turf",
            )
            .await?;
        Ok(())
    }

    async fn assign_turf(
        &self,
        turf_id: TurfId,
        volunteer_id: VolunteerId,
    ) -> CampaignResult<TurfAssignment> {
        let path = format!("/door-knocking/volunteers/{}/assign-turf", volunteer_id);
        let form = reqwest::multipart::Form::new().text("turf_id", turf_id.to_string());
        let rb = self.request(Method::POST, &path).multipart(form);
        // The server answers with the turf.
        let _: WireTurf = self.send(rb, &path, "Failed to assign turf").await?;
        Ok(TurfAssignment {
            turf_id,
            volunteer_id,
            created_at: Utc::now(),
        })
    }

    async fn log_interaction(
        &self,
        voter_id: VoterId,
        turf_id: TurfId,
        result: CanvassResult,
        notes: Option<&str>,
    ) -> CampaignResult<CanvassingInteraction> {
        let path = "/door-knocking/canvassing-log";
        let rb = self.request(Method::POST, path).json(&WireInteractionRequest {
            voter_id,
            turf_id,
            result,
            notes,
        });
        let wire: WireInteraction = self.send(rb, path, "Failed to log interaction").await?;
        Ok(CanvassingInteraction {
            voter_id: wire.voter_id,
            turf_id: wire.turf_id,
            result: wire.result,
            notes: wire.notes,
            timestamp: wire.timestamp.unwrap_or_else(Utc::now),
        })
    }

    async fn turf_progress(&self, turf_id: TurfId) -> CampaignResult<TurfProgress> {
        let path = format!("/door-knocking/turf/{}/progress", turf_id);
        self.send(
            self.request(Method::GET, &path),
            &path,
            "Failed to fetch turf progress",
        )
        .await
    }

    async fn volunteer_progress(
        &self,
        volunteer_id: VolunteerId,
    ) -> CampaignResult<Vec<VolunteerTurfProgress>> {
        let path = format!("/door-knocking/volunteers/{}/progress", volunteer_id);
        self.send(
            self.request(Method::GET, &path),
            &path,
            "Failed to fetch volunteer progress",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::builder::ImportSession;
    use mockito::Matcher;

    fn api(url: &str, token: Option<&str>) -> HttpResourceApi {
        let mut ctx = match token {
            Some(t) => SessionContext::with_session(Session::new(t, None)),
            None => SessionContext::new(),
        };
        HttpResourceApi::new(url, Duration::from_secs(5), &mut ctx).unwrap()
    }

    #[tokio::test]
    async fn import_sends_multipart_form() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/import/voters")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="file"; filename="voters.csv""#.to_string()),
                Matcher::Regex("first_name,last_name,phone".to_string()),
                Matcher::Regex(r#"name="handle_duplicates""#.to_string()),
                Matcher::Regex(r#"\["email"\]"#.to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": "success", "imported_count": 1}"#)
            .create_async()
            .await;

        let session = ImportSession::new("list.csv", "fname,lname,cell\nJohn,Doe,555-1234\n")
            .unwrap()
            .policy(&ImportPolicy {
                identity_fields: [IdentityField::Email].into_iter().collect(),
                ..ImportPolicy::default()
            });
        let payload = session.payload().unwrap();
        let outcome = api(&server.url(), Some("secret"))
            .import_voters(&payload)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ImportOutcome {
                imported_count: 1,
                duplicates_merged: None
            }
        );
        m.assert_async().await;
    }

    #[tokio::test]
    async fn server_detail_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/import/voters")
            .with_status(400)
            .with_body(r#"{"detail": "File must be a .csv"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/door-knocking/turf/4/progress")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let client = api(&server.url(), None);
        let payload = ImportSession::new("a.csv", "first_name,last_name\nA,B")
            .unwrap()
            .policy(&ImportPolicy {
                identity_fields: Default::default(),
                ..ImportPolicy::default()
            })
            .payload();
        // No identity field at all is refused before sending.
        assert!(payload.is_err());

        let payload = ImportSession::new("a.csv", "first_name,last_name,email\nA,B,a@b.org")
            .unwrap()
            .payload()
            .unwrap();
        match client.import_voters(&payload).await {
            Err(CampaignError::Network { message, status }) => {
                assert_eq!(message, "File must be a .csv");
                assert_eq!(status, Some(400));
            }
            x => panic!("unexpected {:?}", x),
        }
        match client.turf_progress(4).await {
            Err(e @ CampaignError::Network { .. }) => {
                assert_eq!(
                    e.to_string(),
                    "Failed to fetch turf progress (status 500)"
                );
            }
            x => panic!("unexpected {:?}", x),
        }
    }

    #[tokio::test]
    async fn turfs_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/door-knocking/turf")
            .match_body(Matcher::Json(serde_json::json!({
                "name": "North",
                "boundary": "[[0.0,0.0],[0.0,10.0],[10.0,10.0]]"
            })))
            .with_status(200)
            .with_body(r#"{"id": 3, "name": "North", "boundary": "[[0.0,0.0],[0.0,10.0],[10.0,10.0]]"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/door-knocking/turf/3/voters")
            .with_status(200)
            .with_body(
                r#"[
                {"id": 1, "first_name": "Ada", "last_name": "L", "address": "1 Elm", "lat": 1.0, "lng": 2.0,
                 "support_level": 3, "status": "pending", "turf_name": "North"},
                {"id": 2, "first_name": "Bo", "last_name": "K", "address": "2 Elm", "lat": 1.5, "lng": 2.0,
                 "support_level": "No Contact", "status": "completed", "turf_name": "North"}
            ]"#,
            )
            .create_async()
            .await;
        let assign = server
            .mock("POST", "/door-knocking/volunteers/9/assign-turf")
            .match_body(Matcher::Regex(r#"name="turf_id""#.to_string()))
            .with_status(200)
            .with_body(r#"{"id": 3, "name": "North", "boundary": "[[0.0,0.0],[0.0,10.0],[10.0,10.0]]"}"#)
            .create_async()
            .await;

        let client = api(&server.url(), Some("t"));
        let new_turf = NewTurf {
            name: "North".to_string(),
            boundary: campaign_core::geofence::record_boundary(&[
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 10.0),
                GeoPoint::new(10.0, 10.0),
            ])
            .unwrap(),
        };
        let turf = client.create_turf(&new_turf).await.unwrap();
        assert_eq!(turf.id, 3);
        assert_eq!(turf.boundary, new_turf.boundary);
        create.assert_async().await;

        let voters = client.turf_voters(3).await.unwrap();
        assert_eq!(voters.len(), 2);
        assert_eq!(voters[0].voter.support_level, 3);
        assert_eq!(voters[0].result, None);
        assert_eq!(voters[1].status, "completed");
        assert_eq!(voters[1].result, Some(CanvassResult::NoContact));

        let a = client.assign_turf(3, 9).await.unwrap();
        assert_eq!((a.turf_id, a.volunteer_id), (3, 9));
        assign.assert_async().await;
    }

    #[tokio::test]
    async fn canvassing_and_progress() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/door-knocking/canvassing-log")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "voter_id": 1, "turf_id": 3, "result": "No Contact"
            })))
            .with_status(200)
            .with_body(r#"{"id": 11, "voter_id": 1, "turf_id": 3, "result": "No Contact", "notes": null}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/door-knocking/turf/3/progress")
            .with_status(200)
            .with_body(r#"{"total_interactions": 2, "total_voters": 4}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/door-knocking/volunteers/9/progress")
            .with_status(200)
            .with_body(r#"[{"turf_id": 3, "turf_name": "North", "total_interactions": 2}]"#)
            .create_async()
            .await;

        let client = api(&server.url(), None);
        let i = client
            .log_interaction(1, 3, CanvassResult::NoContact, None)
            .await
            .unwrap();
        assert_eq!(i.result, CanvassResult::NoContact);
        let p = client.turf_progress(3).await.unwrap();
        assert_eq!(p.completion_percent(), 50);
        let vp = client.volunteer_progress(9).await.unwrap();
        assert_eq!(vp[0].turf_name, "North");
    }

    #[tokio::test]
    async fn voter_crud() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"{"id": 4, "first_name": "Ada", "last_name": "Lovelace", "support_level": 2}"#;
        let create = server
            .mock("POST", "/voters")
            .match_body(Matcher::PartialJson(serde_json::json!({"first_name": "Ada"})))
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;
        let update = server
            .mock("PUT", "/voters/4")
            .match_body(Matcher::PartialJson(serde_json::json!({"support_level": 2})))
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;
        server
            .mock("DELETE", "/voters/4")
            .with_status(200)
            .with_body(r#"{"detail": "Voter deleted"}"#)
            .create_async()
            .await;
        server
            .mock("DELETE", "/voters/5")
            .with_status(404)
            .with_body(r#"{"detail": "Voter not found"}"#)
            .create_async()
            .await;

        let client = api(&server.url(), Some("t"));
        let mut v = VoterRecord::new("Ada", "Lovelace");
        let created = client.create_voter(&v).await.unwrap();
        assert_eq!(created.id, Some(4));
        v.support_level = 2;
        let updated = client.update_voter(4, &v).await.unwrap();
        assert_eq!(updated.support_level, 2);
        client.delete_voter(4).await.unwrap();
        match client.delete_voter(5).await {
            Err(e) => assert_eq!(e.to_string(), "Voter not found"),
            Ok(_) => panic!("expected an error"),
        }
        create.assert_async().await;
        update.assert_async().await;
    }

    #[tokio::test]
    async fn expired_session_is_not_sent() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/voters")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        let expired = Utc::now() - chrono::Duration::hours(1);
        let mut ctx = SessionContext::with_session(Session::new("old", Some(expired)));
        let client =
            HttpResourceApi::new(&server.url(), Duration::from_secs(5), &mut ctx).unwrap();
        assert!(client.list_voters().await.unwrap().is_empty());
        m.assert_async().await;
    }

    #[tokio::test]
    async fn client_follows_sign_in_and_out() {
        let mut server = mockito::Server::new_async().await;
        let anonymous = server
            .mock("GET", "/door-knocking/turf")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("[]")
            .expect(2)
            .create_async()
            .await;
        let signed_in = server
            .mock("GET", "/door-knocking/turf")
            .match_header("authorization", "Bearer fresh")
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let mut ctx = SessionContext::new();
        let client =
            HttpResourceApi::new(&server.url(), Duration::from_secs(5), &mut ctx).unwrap();
        client.list_turfs().await.unwrap();
        ctx.sign_in(Session::new("fresh", None));
        client.list_turfs().await.unwrap();
        ctx.sign_out();
        client.list_turfs().await.unwrap();
        anonymous.assert_async().await;
        signed_in.assert_async().await;
    }

    #[tokio::test]
    async fn export_by_the_server() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/voters/export")
            .match_body(Matcher::Json(serde_json::json!({
                "format": "json",
                "fields": ["first_name", "email"],
                "voters": [1, 2]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#""[{\"first_name\": \"Ada\"}]""#)
            .create_async()
            .await;
        let client = api(&server.url(), None);
        let text = client
            .export_voters(&ExportRequest {
                format: ExportFormat::Json,
                fields: vec![VoterField::FirstName, VoterField::Email],
                voters: vec![1, 2],
            })
            .await
            .unwrap();
        assert_eq!(text, r#"[{"first_name": "Ada"}]"#);
        m.assert_async().await;
    }
}
