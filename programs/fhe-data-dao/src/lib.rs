//! FHE Data DAO
//!
//! Bookkeeping core for two encrypted-data workflows:
//!
//! - phishing-sample sharing, where submitters post encrypted URL/header
//!   handles and later ask the decryption oracle to reveal them
//! - decentralized-science governance, where datasets are uploaded with
//!   encrypted metadata, analysis proposals are voted on, and approved
//!   proposals request an oracle-side computation whose result is minted as
//!   an artifact to the dataset owner
//!
//! Homomorphic arithmetic, decryption and artifact minting are external
//! collaborators reached through the traits in [`handle`] and [`oracle`].
//! Every asynchronous request is tracked in a [`correlation::CorrelationTable`]
//! so that the oracle's callback can be authenticated and applied exactly once.
//!
//! Location: programs/fhe-data-dao/src/lib.rs

use anchor_lang::prelude::*;

pub mod aggregate;
pub mod cleartext;
pub mod config;
pub mod correlation;
pub mod dao;
pub mod datasets;
pub mod error;
pub mod events;
pub mod handle;
pub mod instruction;
pub mod oracle;
pub mod processor;
pub mod proposal;
pub mod samples;
pub mod sim;

pub use crate::config::{DaoConfig, RevealPolicy};
pub use crate::correlation::{PendingRequest, RequestTarget};
pub use crate::dao::{DaoStats, DataDao, Invocation};
pub use crate::error::DaoError;
pub use crate::events::DaoEvent;
pub use crate::handle::{CiphertextHandle, HomomorphicEngine};
pub use crate::instruction::DaoInstruction;
pub use crate::oracle::{
    ArtifactRegistry, CallbackSelector, DecryptionOracle, EntityKind, IdAllocator, SequentialIds,
};
pub use crate::processor::Processor;
pub use crate::proposal::ProposalState;

declare_id!("8LTyijkHr5qUn6RohmRyefBgLzgKCHY1DQYedbPAkRS1");

// ==================== CONSTANTS ====================

/// Computation definition names (must match the oracle's registered circuits)
pub const REVEAL_SAMPLE_COMP: &str = "reveal_sample";
pub const REVEAL_AGGREGATE_COMP: &str = "reveal_aggregate";
pub const RUN_ANALYSIS_COMP: &str = "run_analysis";

/// Id 0 is reserved as "absent" for every entity kind.
pub const NULL_ID: u64 = 0;
