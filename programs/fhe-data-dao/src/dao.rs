//! The DAO surface: every entry point an external caller (or the oracle)
//! invokes, plus the decryption callback handler.
//!
//! Each call runs to completion against the state it finds. All checks,
//! including collaborator calls that can fail, happen before the first
//! local mutation, so a rejected call leaves no trace.

use anchor_lang::prelude::*;

use crate::aggregate::{Accumulator, EncryptedModel, EpochSnapshot};
use crate::cleartext;
use crate::config::{DaoConfig, RevealPolicy};
use crate::correlation::{CorrelationTable, PendingRequest, RequestTarget};
use crate::datasets::{DatasetStore, EncryptedDataset};
use crate::error::DaoError;
use crate::events::*;
use crate::handle::{CiphertextHandle, HomomorphicEngine};
use crate::oracle::{ArtifactRegistry, CallbackSelector, DecryptionOracle, EntityKind, IdAllocator};
use crate::proposal::{AnalysisOutcome, AnalysisProposal, ProposalBook, ProposalState};
use crate::samples::{DecryptedSample, EncryptedSample, RevealState, SampleStore};

/// Caller identity and block time for one call.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub caller: Pubkey,
    pub unix_timestamp: i64,
}

impl Invocation {
    pub fn new(caller: Pubkey, unix_timestamp: i64) -> Self {
        Self {
            caller,
            unix_timestamp,
        }
    }
}

/// Dashboard counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DaoStats {
    pub samples: usize,
    pub revealed_samples: u64,
    pub datasets: usize,
    pub proposals: usize,
    pub pending_proposals: usize,
    pub active_proposals: usize,
    pub approved_proposals: usize,
    pub rejected_proposals: usize,
    pub executed_proposals: usize,
    pub contributions: u64,
    pub current_epoch: u64,
    pub outstanding_requests: usize,
}

pub struct DataDao<E, O, R, I> {
    config: DaoConfig,
    engine: E,
    oracle: O,
    registry: R,
    ids: I,
    samples: SampleStore,
    datasets: DatasetStore,
    model: Accumulator,
    proposals: ProposalBook,
    correlation: CorrelationTable,
    journal: EventJournal,
}

impl<E, O, R, I> DataDao<E, O, R, I>
where
    E: HomomorphicEngine,
    O: DecryptionOracle,
    R: ArtifactRegistry,
    I: IdAllocator,
{
    pub fn new(config: DaoConfig, engine: E, oracle: O, registry: R, ids: I) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            engine,
            oracle,
            registry,
            ids,
            samples: SampleStore::default(),
            datasets: DatasetStore::default(),
            model: Accumulator::default(),
            proposals: ProposalBook::default(),
            correlation: CorrelationTable::new(),
            journal: EventJournal::default(),
        })
    }

    // ==================== SAMPLES ====================

    pub fn submit_sample(
        &mut self,
        ix: &Invocation,
        url: CiphertextHandle,
        headers: CiphertextHandle,
    ) -> Result<u64> {
        let id = self.ids.next_id(EntityKind::Sample);
        self.samples.insert(EncryptedSample {
            id,
            url,
            headers,
            submitted_at: ix.unix_timestamp,
            submitter: ix.caller,
        })?;

        self.journal.record(SampleSubmitted {
            sample_id: id,
            submitter: ix.caller,
            submitted_at: ix.unix_timestamp,
        });
        Ok(id)
    }

    pub fn request_sample_reveal(&mut self, ix: &Invocation, sample_id: u64) -> Result<u64> {
        let sample = self.samples.ensure_revealable(sample_id)?;
        if self.config.reveal_policy == RevealPolicy::SubmitterOnly {
            require_keys_eq!(ix.caller, sample.submitter, DaoError::Unauthorized);
        }
        let handles = vec![
            self.engine.to_transport_handle(&sample.url),
            self.engine.to_transport_handle(&sample.headers),
        ];

        let request_id = self.issue(
            ix,
            RequestTarget::Sample(sample_id),
            CallbackSelector::RevealSample,
            &handles,
        )?;
        self.samples.mark_pending(sample_id, request_id)?;

        self.journal.record(RevealRequested {
            sample_id,
            request_id,
            requested_by: ix.caller,
        });
        Ok(request_id)
    }

    // ==================== AGGREGATE ====================

    /// Folds an encrypted contribution into the current epoch.
    pub fn contribute(&mut self, ix: &Invocation, value: CiphertextHandle) -> Result<u64> {
        let epoch = self
            .model
            .contribute(&mut self.engine, &value, ix.unix_timestamp)?;

        self.journal.record(ContributionAdded {
            epoch,
            contributor: ix.caller,
            contributions: self.model.model().contributions,
        });
        Ok(epoch)
    }

    /// Seals the current epoch and asks the oracle to reveal its sum.
    pub fn request_aggregate_reveal(&mut self, ix: &Invocation) -> Result<u64> {
        let (epoch, sum) = self.model.ensure_revealable()?;
        let handles = vec![self.engine.to_transport_handle(&sum)];

        let request_id = self.issue(
            ix,
            RequestTarget::Aggregate { epoch },
            CallbackSelector::RevealAggregate,
            &handles,
        )?;
        self.model.seal(request_id, ix.unix_timestamp)?;

        self.journal
            .record(AggregateRevealRequested { epoch, request_id });
        Ok(request_id)
    }

    // ==================== DATASETS ====================

    pub fn upload_dataset(
        &mut self,
        ix: &Invocation,
        cid: String,
        metadata: CiphertextHandle,
        restricted: bool,
    ) -> Result<u64> {
        self.config.check_locator(&cid)?;

        let id = self.ids.next_id(EntityKind::Dataset);
        self.datasets.insert(EncryptedDataset {
            id,
            cid: cid.clone(),
            metadata,
            uploader: ix.caller,
            uploaded_at: ix.unix_timestamp,
            restricted,
        })?;

        self.journal.record(DatasetUploaded {
            dataset_id: id,
            uploader: ix.caller,
            cid,
            restricted,
        });
        Ok(id)
    }

    // ==================== PROPOSALS ====================

    pub fn create_proposal(
        &mut self,
        ix: &Invocation,
        dataset_id: u64,
        description_cid: String,
        voting_delay: i64,
        voting_period: i64,
    ) -> Result<u64> {
        let dataset = self.datasets.get(dataset_id)?;
        require!(dataset.may_propose(&ix.caller), DaoError::Unauthorized);
        self.config.check_locator(&description_cid)?;
        let (start_time, end_time) =
            self.config
                .voting_window(ix.unix_timestamp, voting_delay, voting_period)?;

        let id = self.ids.next_id(EntityKind::Proposal);
        self.proposals.insert(AnalysisProposal::new(
            id,
            dataset_id,
            ix.caller,
            description_cid,
            start_time,
            end_time,
            ix.unix_timestamp,
        ))?;

        self.journal.record(ProposalCreated {
            proposal_id: id,
            dataset_id,
            proposer: ix.caller,
            start_time,
            end_time,
        });
        Ok(id)
    }

    pub fn vote(&mut self, ix: &Invocation, proposal_id: u64, support: bool) -> Result<()> {
        self.proposals
            .vote(proposal_id, ix.caller, support, ix.unix_timestamp)?;

        self.journal.record(VoteCast {
            proposal_id,
            voter: ix.caller,
            support,
        });
        Ok(())
    }

    pub fn finalize(&mut self, ix: &Invocation, proposal_id: u64) -> Result<ProposalState> {
        let proposal = self.proposals.get_mut(proposal_id)?;
        let state = proposal.finalize(ix.unix_timestamp)?;
        let (yes_votes, no_votes) = (proposal.yes_votes, proposal.no_votes);
        msg!(
            "Proposal {} finalized as {:?} ({} yes / {} no)",
            proposal_id,
            state,
            yes_votes,
            no_votes
        );

        self.journal.record(ProposalFinalized {
            proposal_id,
            state,
            yes_votes,
            no_votes,
        });
        Ok(state)
    }

    /// Requests the oracle-side analysis of an approved proposal's dataset.
    pub fn request_analysis(&mut self, ix: &Invocation, proposal_id: u64) -> Result<u64> {
        let proposal = self.proposals.get(proposal_id)?;
        proposal.ensure_executable()?;
        let dataset = self.datasets.get(proposal.dataset_id)?;
        let handles = vec![self.engine.to_transport_handle(&dataset.metadata)];

        let request_id = self.issue(
            ix,
            RequestTarget::Proposal(proposal_id),
            CallbackSelector::RunAnalysis,
            &handles,
        )?;
        self.proposals
            .get_mut(proposal_id)?
            .mark_executed(request_id)?;

        self.journal.record(AnalysisRequested {
            proposal_id,
            request_id,
        });
        Ok(request_id)
    }

    // ==================== CALLBACK ====================

    /// Oracle callback. The caller is untrusted: the request id must be one
    /// this DAO issued and not yet consumed, and the proof must authenticate
    /// the cleartext before anything is decoded or written.
    pub fn on_decrypted(
        &mut self,
        ix: &Invocation,
        request_id: u64,
        cleartext: &[u8],
        proof: &[u8],
    ) -> Result<RequestTarget> {
        let target = self.correlation.resolve(request_id)?.target;
        require!(
            self.oracle.verify_proof(request_id, cleartext, proof),
            DaoError::InvalidProof
        );

        match target {
            RequestTarget::Sample(sample_id) => {
                let plaintext = cleartext::decode_sample(cleartext)?;
                self.samples.commit_reveal(sample_id, request_id, plaintext)?;
                self.correlation.consume(request_id)?;
                msg!("Sample {} revealed by request {}", sample_id, request_id);

                self.journal.record(SampleRevealed {
                    sample_id,
                    request_id,
                });
            }
            RequestTarget::Aggregate { epoch } => {
                let total = cleartext::decode_weight(cleartext)?;
                self.model.commit_reveal(epoch, request_id, total)?;
                self.correlation.consume(request_id)?;
                msg!("Aggregate epoch {} revealed by request {}", epoch, request_id);

                self.journal.record(AggregateRevealed {
                    epoch,
                    request_id,
                    total,
                });
            }
            RequestTarget::Proposal(proposal_id) => {
                let result_cid = cleartext::decode_analysis(cleartext)?;
                let proposal = self.proposals.get(proposal_id)?;
                proposal.ensure_completable(request_id)?;
                let recipient = self.datasets.get(proposal.dataset_id)?.uploader;

                let artifact_id = self.registry.mint(&recipient)?;
                self.proposals.get_mut(proposal_id)?.complete(
                    request_id,
                    AnalysisOutcome {
                        result_cid,
                        artifact_id,
                        completed_at: ix.unix_timestamp,
                    },
                )?;
                self.correlation.consume(request_id)?;
                msg!(
                    "Analysis for proposal {} minted artifact {}",
                    proposal_id,
                    artifact_id
                );

                self.journal.record(AnalysisCompleted {
                    proposal_id,
                    request_id,
                    artifact_id,
                    recipient,
                });
            }
        }
        Ok(target)
    }

    fn issue(
        &mut self,
        ix: &Invocation,
        target: RequestTarget,
        selector: CallbackSelector,
        handles: &[Vec<u8>],
    ) -> Result<u64> {
        self.correlation.ensure_idle(&target)?;
        let request_id = self.oracle.request_decryption(handles, selector)?;
        self.correlation.install(PendingRequest {
            request_id,
            target,
            selector,
            comp_def_offset: selector.comp_def_offset(),
            requested_by: ix.caller,
            issued_at: ix.unix_timestamp,
            consumed: false,
        })?;
        Ok(request_id)
    }

    // ==================== QUERIES ====================

    pub fn config(&self) -> &DaoConfig {
        &self.config
    }

    pub fn sample(&self, id: u64) -> Result<&EncryptedSample> {
        self.samples.get(id)
    }

    pub fn decrypted_sample(&self, id: u64) -> Result<&DecryptedSample> {
        self.samples.decrypted(id)
    }

    pub fn sample_reveal_state(&self, id: u64) -> Result<RevealState> {
        self.samples.reveal_state(id)
    }

    pub fn dataset(&self, id: u64) -> Result<&EncryptedDataset> {
        self.datasets.get(id)
    }

    pub fn datasets_of<'a>(
        &'a self,
        uploader: &'a Pubkey,
    ) -> impl Iterator<Item = &'a EncryptedDataset> + 'a {
        self.datasets.uploaded_by(uploader)
    }

    pub fn proposal(&self, id: u64) -> Result<&AnalysisProposal> {
        self.proposals.get(id)
    }

    /// Effective state at `now`, the same view `stats` counts by.
    pub fn proposal_state(&self, id: u64, now: i64) -> Result<ProposalState> {
        Ok(self.proposals.get(id)?.state_at(now))
    }

    pub fn has_voted(&self, proposal_id: u64, voter: &Pubkey) -> bool {
        self.proposals.has_voted(proposal_id, voter)
    }

    pub fn model(&self) -> &EncryptedModel {
        self.model.model()
    }

    pub fn epoch(&self, epoch: u64) -> Result<&EpochSnapshot> {
        self.model.epoch(epoch)
    }

    /// Sealed epochs in ascending order, revealed or not.
    pub fn epochs(&self) -> impl Iterator<Item = &EpochSnapshot> {
        self.model.sealed_epochs()
    }

    pub fn pending_request(&self, request_id: u64) -> Option<&PendingRequest> {
        self.correlation.get(request_id)
    }

    pub fn events(&self) -> &[DaoEvent] {
        self.journal.events()
    }

    pub fn drain_events(&mut self) -> Vec<DaoEvent> {
        self.journal.drain()
    }

    pub fn stats(&self, now: i64) -> DaoStats {
        DaoStats {
            samples: self.samples.len(),
            revealed_samples: self.samples.revealed_count(),
            datasets: self.datasets.len(),
            proposals: self.proposals.len(),
            pending_proposals: self.proposals.count_in_state(ProposalState::Pending, now),
            active_proposals: self.proposals.count_in_state(ProposalState::Active, now),
            approved_proposals: self.proposals.count_in_state(ProposalState::Approved, now),
            rejected_proposals: self.proposals.count_in_state(ProposalState::Rejected, now),
            executed_proposals: self.proposals.count_in_state(ProposalState::Executed, now),
            contributions: self.model.total_contributions(),
            current_epoch: self.model.model().epoch,
            outstanding_requests: self.correlation.outstanding_len(),
        }
    }

    // ==================== COLLABORATORS ====================

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }
}
