//! Request Correlation Table
//!
//! Maps oracle request ids back to the entity awaiting the result. Entries
//! hold ids only; the stores own the entities. A consumed entry stays in the
//! table so a replayed callback is told `AlreadyConsumed` rather than being
//! confused with a forged id.

use anchor_lang::prelude::*;
use std::collections::BTreeMap;

use crate::error::DaoError;
use crate::oracle::CallbackSelector;
use crate::NULL_ID;

/// Entity a request will act on when its callback arrives.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RequestTarget {
    Sample(u64),
    Aggregate { epoch: u64 },
    Proposal(u64),
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: u64,
    pub target: RequestTarget,
    pub selector: CallbackSelector,
    /// Computation definition the oracle was asked to run.
    pub comp_def_offset: u32,
    /// Audit context: who asked for the request.
    pub requested_by: Pubkey,
    pub issued_at: i64,
    pub consumed: bool,
}

#[derive(Debug, Default)]
pub struct CorrelationTable {
    entries: BTreeMap<u64, PendingRequest>,
    outstanding: BTreeMap<RequestTarget, u64>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails if `target` already has an unconsumed request.
    pub fn ensure_idle(&self, target: &RequestTarget) -> Result<()> {
        require!(
            !self.outstanding.contains_key(target),
            DaoError::RequestAlreadyPending
        );
        Ok(())
    }

    /// Fails if the oracle handed back 0 or an id this table has seen before.
    pub fn ensure_fresh(&self, request_id: u64) -> Result<()> {
        require!(request_id != NULL_ID, DaoError::InvalidRequestId);
        require!(
            !self.entries.contains_key(&request_id),
            DaoError::InvalidRequestId
        );
        Ok(())
    }

    pub fn install(&mut self, request: PendingRequest) -> Result<()> {
        self.ensure_fresh(request.request_id)?;
        self.ensure_idle(&request.target)?;

        self.outstanding.insert(request.target, request.request_id);
        self.entries.insert(request.request_id, request);
        Ok(())
    }

    /// Looks up an outstanding request for a callback.
    pub fn resolve(&self, request_id: u64) -> Result<&PendingRequest> {
        let request = self
            .entries
            .get(&request_id)
            .ok_or_else(|| error!(DaoError::UnknownRequest))?;
        require!(!request.consumed, DaoError::AlreadyConsumed);
        Ok(request)
    }

    /// Marks the request consumed so the same id cannot be replayed.
    pub fn consume(&mut self, request_id: u64) -> Result<PendingRequest> {
        let request = self
            .entries
            .get_mut(&request_id)
            .ok_or_else(|| error!(DaoError::UnknownRequest))?;
        require!(!request.consumed, DaoError::AlreadyConsumed);

        request.consumed = true;
        self.outstanding.remove(&request.target);
        Ok(request.clone())
    }

    pub fn get(&self, request_id: u64) -> Option<&PendingRequest> {
        self.entries.get(&request_id)
    }

    pub fn outstanding_for(&self, target: &RequestTarget) -> Option<u64> {
        self.outstanding.get(target).copied()
    }

    pub fn outstanding_len(&self) -> usize {
        self.outstanding.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
