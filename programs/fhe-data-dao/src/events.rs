//! Structured events, one per successful surface call.
//!
//! Each event is emitted through the program log and kept in an
//! [`EventJournal`] so indexers and tests can read it back.

use anchor_lang::prelude::*;

use crate::proposal::ProposalState;

// ==================== EVENTS ====================

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSubmitted {
    pub sample_id: u64,
    pub submitter: Pubkey,
    pub submitted_at: i64,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealRequested {
    pub sample_id: u64,
    pub request_id: u64,
    pub requested_by: Pubkey,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRevealed {
    pub sample_id: u64,
    pub request_id: u64,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionAdded {
    pub epoch: u64,
    pub contributor: Pubkey,
    pub contributions: u64,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRevealRequested {
    pub epoch: u64,
    pub request_id: u64,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRevealed {
    pub epoch: u64,
    pub request_id: u64,
    pub total: u64,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetUploaded {
    pub dataset_id: u64,
    pub uploader: Pubkey,
    pub cid: String,
    pub restricted: bool,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalCreated {
    pub proposal_id: u64,
    pub dataset_id: u64,
    pub proposer: Pubkey,
    pub start_time: i64,
    pub end_time: i64,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteCast {
    pub proposal_id: u64,
    pub voter: Pubkey,
    pub support: bool,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalFinalized {
    pub proposal_id: u64,
    pub state: ProposalState,
    pub yes_votes: u64,
    pub no_votes: u64,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequested {
    pub proposal_id: u64,
    pub request_id: u64,
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisCompleted {
    pub proposal_id: u64,
    pub request_id: u64,
    pub artifact_id: u64,
    pub recipient: Pubkey,
}

macro_rules! dao_events {
    ($($variant:ident),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum DaoEvent {
            $($variant($variant),)*
        }

        impl DaoEvent {
            fn emit(&self) {
                match self {
                    $(DaoEvent::$variant(event) => emit!(*event),)*
                }
            }
        }

        $(
            impl From<$variant> for DaoEvent {
                fn from(event: $variant) -> Self {
                    DaoEvent::$variant(event)
                }
            }
        )*
    };
}

dao_events!(
    SampleSubmitted,
    RevealRequested,
    SampleRevealed,
    ContributionAdded,
    AggregateRevealRequested,
    AggregateRevealed,
    DatasetUploaded,
    ProposalCreated,
    VoteCast,
    ProposalFinalized,
    AnalysisRequested,
    AnalysisCompleted,
);

#[derive(Debug, Default)]
pub struct EventJournal {
    events: Vec<DaoEvent>,
}

impl EventJournal {
    pub fn record(&mut self, event: impl Into<DaoEvent>) {
        let event = event.into();
        event.emit();
        self.events.push(event);
    }

    pub fn events(&self) -> &[DaoEvent] {
        &self.events
    }

    pub fn last(&self) -> Option<&DaoEvent> {
        self.events.last()
    }

    pub fn drain(&mut self) -> Vec<DaoEvent> {
        std::mem::take(&mut self.events)
    }
}
