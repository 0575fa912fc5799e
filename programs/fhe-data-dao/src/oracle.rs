//! Collaborator seams: decryption oracle, artifact registry and id allocation.

use anchor_lang::prelude::*;
use arcium_client::pda::comp_def_offset;

use crate::{REVEAL_AGGREGATE_COMP, REVEAL_SAMPLE_COMP, RUN_ANALYSIS_COMP};

/// Which callback the oracle must route its result to.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallbackSelector {
    RevealSample,
    RevealAggregate,
    RunAnalysis,
}

impl CallbackSelector {
    pub fn name(self) -> &'static str {
        match self {
            CallbackSelector::RevealSample => REVEAL_SAMPLE_COMP,
            CallbackSelector::RevealAggregate => REVEAL_AGGREGATE_COMP,
            CallbackSelector::RunAnalysis => RUN_ANALYSIS_COMP,
        }
    }

    /// Computation definition offset the oracle routes this selector by.
    pub fn comp_def_offset(self) -> u32 {
        comp_def_offset(self.name())
    }

    /// Selector whose computation definition lives at `offset`.
    pub fn from_comp_def_offset(offset: u32) -> Option<Self> {
        [
            CallbackSelector::RevealSample,
            CallbackSelector::RevealAggregate,
            CallbackSelector::RunAnalysis,
        ]
        .into_iter()
        .find(|selector| selector.comp_def_offset() == offset)
    }
}

/// External decryption oracle.
///
/// Request ids are allocated by the oracle and are assumed globally unique
/// and never zero; the core still rejects zero or reused ids.
pub trait DecryptionOracle {
    fn request_decryption(&mut self, handles: &[Vec<u8>], selector: CallbackSelector) -> Result<u64>;

    fn verify_proof(&self, request_id: u64, cleartext: &[u8], proof: &[u8]) -> bool;
}

/// Issues result artifacts (e.g. NFTs) for executed analysis proposals.
pub trait ArtifactRegistry {
    fn mint(&mut self, owner: &Pubkey) -> Result<u64>;
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Sample,
    Dataset,
    Proposal,
}

/// Hands out entity ids. Injected so tests can control sequencing.
pub trait IdAllocator {
    fn next_id(&mut self, kind: EntityKind) -> u64;
}

/// Independent monotonic counters per entity kind, starting at 1.
#[derive(Debug, Default, Clone)]
pub struct SequentialIds {
    samples: u64,
    datasets: u64,
    proposals: u64,
}

impl IdAllocator for SequentialIds {
    fn next_id(&mut self, kind: EntityKind) -> u64 {
        let counter = match kind {
            EntityKind::Sample => &mut self.samples,
            EntityKind::Dataset => &mut self.datasets,
            EntityKind::Proposal => &mut self.proposals,
        };
        *counter += 1;
        *counter
    }
}
