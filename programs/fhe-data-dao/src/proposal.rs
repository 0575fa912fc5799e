//! Proposal state machine.
//!
//! ```text
//! Pending -> Active -> Approved -> Executed
//!                   \-> Rejected
//! ```
//!
//! Transitions only move forward. Voting is open on the closed window
//! `[start_time, end_time]`; `finalize` is accepted once `now >= end_time`
//! and approves only on a strict yes majority. At `now == end_time` both are
//! accepted, and whichever lands first wins: once finalized, votes fail
//! `InvalidState`.

use anchor_lang::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::DaoError;
use crate::NULL_ID;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProposalState {
    Pending,
    Active,
    Approved,
    Rejected,
    Executed,
}

impl ProposalState {
    fn rank(self) -> u8 {
        match self {
            ProposalState::Pending => 0,
            ProposalState::Active => 1,
            ProposalState::Approved | ProposalState::Rejected => 2,
            ProposalState::Executed => 3,
        }
    }

    pub fn can_transition_to(self, next: ProposalState) -> bool {
        match (self, next) {
            (ProposalState::Pending, ProposalState::Active) => true,
            (ProposalState::Pending | ProposalState::Active, ProposalState::Approved)
            | (ProposalState::Pending | ProposalState::Active, ProposalState::Rejected) => true,
            (ProposalState::Approved, ProposalState::Executed) => true,
            _ => false,
        }
    }

    pub fn is_open(self) -> bool {
        matches!(self, ProposalState::Pending | ProposalState::Active)
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct AnalysisOutcome {
    pub result_cid: String,
    pub artifact_id: u64,
    pub completed_at: i64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct AnalysisProposal {
    pub id: u64,
    pub dataset_id: u64,
    pub proposer: Pubkey,
    pub description_cid: String,
    pub start_time: i64,
    pub end_time: i64,
    pub yes_votes: u64,
    pub no_votes: u64,
    /// Last written state. `Pending` is promoted lazily, on the first vote;
    /// use [`AnalysisProposal::state_at`] for the state at a given time.
    pub state: ProposalState,
    pub pending_request: Option<u64>,
    pub outcome: Option<AnalysisOutcome>,
}

impl AnalysisProposal {
    pub fn new(
        id: u64,
        dataset_id: u64,
        proposer: Pubkey,
        description_cid: String,
        start_time: i64,
        end_time: i64,
        now: i64,
    ) -> Self {
        let state = if now < start_time {
            ProposalState::Pending
        } else {
            ProposalState::Active
        };
        Self {
            id,
            dataset_id,
            proposer,
            description_cid,
            start_time,
            end_time,
            yes_votes: 0,
            no_votes: 0,
            state,
            pending_request: None,
            outcome: None,
        }
    }

    /// State as of `now`, promoting `Pending` once the window has opened.
    pub fn state_at(&self, now: i64) -> ProposalState {
        if self.state == ProposalState::Pending && now >= self.start_time {
            ProposalState::Active
        } else {
            self.state
        }
    }

    fn advance(&mut self, next: ProposalState) -> Result<()> {
        require!(
            self.state.can_transition_to(next) && next.rank() > self.state.rank(),
            DaoError::InvalidState
        );
        self.state = next;
        Ok(())
    }

    pub fn ensure_voting_open(&self, now: i64) -> Result<()> {
        let state = self.state_at(now);
        require!(state.is_open(), DaoError::InvalidState);
        require!(
            now >= self.start_time && now <= self.end_time,
            DaoError::VotingClosed
        );
        Ok(())
    }

    /// Applies one vote. The caller has already checked the voter's flag.
    pub fn record_vote(&mut self, support: bool, now: i64) -> Result<()> {
        self.ensure_voting_open(now)?;
        let (yes, no) = if support {
            (self.yes_votes.checked_add(1), Some(self.no_votes))
        } else {
            (Some(self.yes_votes), self.no_votes.checked_add(1))
        };
        let (yes, no) = match (yes, no) {
            (Some(yes), Some(no)) => (yes, no),
            _ => return err!(DaoError::TallyOverflow),
        };

        if self.state == ProposalState::Pending {
            self.advance(ProposalState::Active)?;
        }
        self.yes_votes = yes;
        self.no_votes = no;
        Ok(())
    }

    pub fn finalize(&mut self, now: i64) -> Result<ProposalState> {
        require!(self.state.is_open(), DaoError::InvalidState);
        require!(now >= self.end_time, DaoError::VotingOngoing);

        let outcome = if self.yes_votes > self.no_votes {
            ProposalState::Approved
        } else {
            ProposalState::Rejected
        };
        self.advance(outcome)?;
        Ok(outcome)
    }

    pub fn ensure_executable(&self) -> Result<()> {
        require!(self.state == ProposalState::Approved, DaoError::InvalidState);
        require!(self.pending_request.is_none(), DaoError::RequestAlreadyPending);
        Ok(())
    }

    pub fn mark_executed(&mut self, request_id: u64) -> Result<()> {
        self.ensure_executable()?;
        self.advance(ProposalState::Executed)?;
        self.pending_request = Some(request_id);
        Ok(())
    }

    /// Re-validates the proposal when the analysis callback arrives.
    pub fn ensure_completable(&self, request_id: u64) -> Result<()> {
        require!(self.state == ProposalState::Executed, DaoError::InvalidState);
        require!(self.outcome.is_none(), DaoError::AlreadyRevealed);
        require!(
            self.pending_request == Some(request_id),
            DaoError::UnknownRequest
        );
        Ok(())
    }

    pub fn complete(&mut self, request_id: u64, outcome: AnalysisOutcome) -> Result<()> {
        self.ensure_completable(request_id)?;
        self.outcome = Some(outcome);
        Ok(())
    }
}

/// Proposals plus the per-(proposal, voter) used flags.
#[derive(Debug, Default)]
pub struct ProposalBook {
    proposals: BTreeMap<u64, AnalysisProposal>,
    ballots: BTreeSet<(u64, Pubkey)>,
}

impl ProposalBook {
    pub fn insert(&mut self, proposal: AnalysisProposal) -> Result<u64> {
        require!(proposal.id != NULL_ID, DaoError::InvalidIdentifier);
        require!(
            !self.proposals.contains_key(&proposal.id),
            DaoError::InvalidIdentifier
        );
        require!(proposal.start_time <= proposal.end_time, DaoError::InvalidVotingWindow);

        let id = proposal.id;
        self.proposals.insert(id, proposal);
        Ok(id)
    }

    pub fn get(&self, id: u64) -> Result<&AnalysisProposal> {
        self.proposals
            .get(&id)
            .ok_or_else(|| error!(DaoError::NotFound))
    }

    pub fn get_mut(&mut self, id: u64) -> Result<&mut AnalysisProposal> {
        self.proposals
            .get_mut(&id)
            .ok_or_else(|| error!(DaoError::NotFound))
    }

    /// Check-then-set on the voter flag and the tally in one step.
    pub fn vote(&mut self, id: u64, voter: Pubkey, support: bool, now: i64) -> Result<()> {
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or_else(|| error!(DaoError::NotFound))?;
        proposal.ensure_voting_open(now)?;
        require!(
            !self.ballots.contains(&(id, voter)),
            DaoError::DuplicateVote
        );

        proposal.record_vote(support, now)?;
        self.ballots.insert((id, voter));
        Ok(())
    }

    pub fn has_voted(&self, id: u64, voter: &Pubkey) -> bool {
        self.ballots.contains(&(id, *voter))
    }

    pub fn count_in_state(&self, state: ProposalState, now: i64) -> usize {
        self.proposals
            .values()
            .filter(|proposal| proposal.state_at(now) == state)
            .count()
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }
}
