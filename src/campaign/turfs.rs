// Turf commands: keeps the local ledger in step with the server.

use std::future::Future;

use campaign_core::turf::{TurfDraft, TurfStatus};
use tokio_util::sync::CancellationToken;

use crate::campaign::api::{ResourceApi, TurfVoter};
use crate::campaign::*;

/// Runs the turf operations against the server and mirrors their effect in a [TurfLedger].
///
/// Every request races the cancellation token. A response that arrives once the token is
/// cancelled is dropped and the ledger is left untouched.
pub struct TurfGeofenceAssigner<A: ResourceApi> {
    api: A,
    ledger: TurfLedger,
    cancel: CancellationToken,
    loaded: bool,
}

impl<A: ResourceApi> TurfGeofenceAssigner<A> {
    pub fn new(api: A, cancel: CancellationToken) -> TurfGeofenceAssigner<A> {
        TurfGeofenceAssigner {
            api,
            ledger: TurfLedger::new(),
            cancel,
            loaded: false,
        }
    }

    pub fn ledger(&self) -> &TurfLedger {
        &self.ledger
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    async fn guarded<T, F>(&self, request: F) -> CampaignResult<T>
    where
        F: Future<Output = CampaignResult<T>>,
    {
        let res = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            res = request => Some(res),
        };
        match res {
            Some(r) if !self.cancel.is_cancelled() => r,
            _ => {
                debug!("guarded: cancelled, response discarded");
                CancelledSnafu {}.fail()
            }
        }
    }

    /// Loads the turfs of the server into the ledger.
    pub async fn refresh(&mut self) -> CampaignResult<usize> {
        let turfs = self.guarded(self.api.list_turfs()).await?;
        let n = turfs.len();
        for t in turfs {
            self.ledger.insert(t);
        }
        self.loaded = true;
        info!("refresh: {} turfs", n);
        Ok(n)
    }

    async fn known_turf(&mut self, turf_id: TurfId) -> CampaignResult<Turf> {
        if !self.loaded && self.ledger.status(turf_id).is_none() {
            self.refresh().await?;
        }
        Ok(self.ledger.turf(turf_id)?.clone())
    }

    pub async fn list(&mut self) -> CampaignResult<Vec<Turf>> {
        self.refresh().await?;
        Ok(self.ledger.turfs().cloned().collect())
    }

    /// Saves a traced polygon as a new turf.
    pub async fn create(&mut self, draft: TurfDraft) -> CampaignResult<Turf> {
        let new_turf = draft.finish()?;
        ensure!(
            !new_turf.name.is_empty(),
            ConfigSnafu {
                message: "A turf needs a name".to_string()
            }
        );
        let turf = self.guarded(self.api.create_turf(&new_turf)).await?;
        self.ledger.insert(turf.clone());
        info!("create: turf {} ({})", turf.id, turf.name);
        Ok(turf)
    }

    pub async fn voters(&mut self, turf_id: TurfId) -> CampaignResult<Vec<TurfVoter>> {
        self.known_turf(turf_id).await?;
        self.guarded(self.api.turf_voters(turf_id)).await
    }

    /// The voters of `voters` inside the turf, computed locally.
    pub async fn filter(
        &mut self,
        turf_id: TurfId,
        voters: &[VoterRecord],
    ) -> CampaignResult<Vec<VoterRecord>> {
        self.known_turf(turf_id).await?;
        let inside = self.ledger.voters_in(turf_id, voters)?;
        Ok(inside.into_iter().cloned().collect())
    }

    pub async fn assign(
        &mut self,
        turf_id: TurfId,
        volunteer_id: VolunteerId,
    ) -> CampaignResult<TurfAssignment> {
        self.known_turf(turf_id).await?;
        let remote = self
            .guarded(self.api.assign_turf(turf_id, volunteer_id))
            .await?;
        let assignment = self
            .ledger
            .assign(turf_id, volunteer_id, remote.created_at)?;
        Ok(assignment)
    }

    /// Whether the server already lists the turf among the volunteer's turfs.
    ///
    /// Assigning again is still allowed: the server keeps both records.
    pub async fn already_assigned(
        &mut self,
        turf_id: TurfId,
        volunteer_id: VolunteerId,
    ) -> CampaignResult<bool> {
        self.known_turf(turf_id).await?;
        let turfs = self
            .guarded(self.api.volunteer_progress(volunteer_id))
            .await?;
        let found = turfs.iter().any(|p| p.turf_id == turf_id);
        if found {
            warn!(
                "assign: turf {} is already assigned to volunteer {}",
                turf_id, volunteer_id
            );
        }
        Ok(found)
    }

    pub async fn log_interaction(
        &mut self,
        voter_id: VoterId,
        turf_id: TurfId,
        result: CanvassResult,
        notes: Option<&str>,
    ) -> CampaignResult<CanvassingInteraction> {
        self.known_turf(turf_id).await?;
        let interaction = self
            .guarded(self.api.log_interaction(voter_id, turf_id, result, notes))
            .await?;
        self.ledger.log_interaction(interaction.clone())?;
        Ok(interaction)
    }

    pub async fn progress(&mut self, turf_id: TurfId) -> CampaignResult<TurfProgress> {
        self.known_turf(turf_id).await?;
        self.guarded(self.api.turf_progress(turf_id)).await
    }

    pub async fn volunteer_progress(
        &self,
        volunteer_id: VolunteerId,
    ) -> CampaignResult<Vec<VolunteerTurfProgress>> {
        self.guarded(self.api.volunteer_progress(volunteer_id))
            .await
    }

    /// Deletes a turf on the server. Nothing attached to it is removed.
    pub async fn delete(&mut self, turf_id: TurfId) -> CampaignResult<Turf> {
        let turf = self.known_turf(turf_id).await?;
        if self.ledger.status(turf_id) == Some(TurfStatus::Assigned) {
            warn!("delete: turf {} is assigned to a volunteer", turf_id);
        }
        self.guarded(self.api.delete_turf(turf_id)).await?;
        self.ledger.delete(turf_id)?;
        Ok(turf)
    }
}
