//! Aggregation accumulator.
//!
//! Contributions are folded into a running ciphertext with the engine's
//! homomorphic `add`. A reveal seals the live accumulator into an
//! [`EpochSnapshot`] and starts the next epoch before the oracle is even
//! asked, so contributions that arrive while the reveal is in flight belong
//! to the next epoch and the value being decrypted never changes underneath
//! the request.

use anchor_lang::prelude::*;
use std::collections::BTreeMap;

use crate::error::DaoError;
use crate::handle::{CiphertextHandle, HomomorphicEngine};

/// Live accumulator for the current epoch.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct EncryptedModel {
    pub initialized: bool,
    pub accumulator: CiphertextHandle,
    pub last_updated: i64,
    pub epoch: u64,
    pub contributions: u64,
    /// Cleartext sum of the most recently revealed epoch.
    pub last_revealed: Option<u64>,
}

impl Default for EncryptedModel {
    fn default() -> Self {
        Self {
            initialized: false,
            accumulator: CiphertextHandle::default(),
            last_updated: 0,
            epoch: 1,
            contributions: 0,
            last_revealed: None,
        }
    }
}

/// Sealed epoch awaiting, or holding, its revealed sum.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct EpochSnapshot {
    pub epoch: u64,
    pub sum: CiphertextHandle,
    pub contributions: u64,
    pub sealed_at: i64,
    pub request_id: u64,
    pub revealed: Option<u64>,
}

#[derive(Debug, Default)]
pub struct Accumulator {
    model: EncryptedModel,
    epochs: BTreeMap<u64, EpochSnapshot>,
    total_contributions: u64,
}

impl Accumulator {
    pub fn model(&self) -> &EncryptedModel {
        &self.model
    }

    pub fn epoch(&self, epoch: u64) -> Result<&EpochSnapshot> {
        self.epochs
            .get(&epoch)
            .ok_or_else(|| error!(DaoError::NotFound))
    }

    pub fn total_contributions(&self) -> u64 {
        self.total_contributions
    }

    /// Adds `value` into the current epoch. Returns the epoch it landed in.
    pub fn contribute<E: HomomorphicEngine>(
        &mut self,
        engine: &mut E,
        value: &CiphertextHandle,
        now: i64,
    ) -> Result<u64> {
        let base = if self.model.initialized {
            self.model.accumulator
        } else {
            engine.encode_zero()?
        };
        let next = engine.add(&base, value)?;

        self.model.initialized = true;
        self.model.accumulator = next;
        self.model.last_updated = now;
        self.model.contributions += 1;
        self.total_contributions += 1;
        Ok(self.model.epoch)
    }

    /// Returns the epoch and ciphertext a reveal would target.
    pub fn ensure_revealable(&self) -> Result<(u64, CiphertextHandle)> {
        require!(self.model.initialized, DaoError::ModelNotInitialized);
        Ok((self.model.epoch, self.model.accumulator))
    }

    /// Seals the current epoch under `request_id` and opens the next one.
    pub fn seal(&mut self, request_id: u64, now: i64) -> Result<u64> {
        let (epoch, sum) = self.ensure_revealable()?;

        self.epochs.insert(
            epoch,
            EpochSnapshot {
                epoch,
                sum,
                contributions: self.model.contributions,
                sealed_at: now,
                request_id,
                revealed: None,
            },
        );
        self.model.initialized = false;
        self.model.accumulator = CiphertextHandle::default();
        self.model.contributions = 0;
        self.model.epoch = epoch + 1;
        msg!("Aggregate epoch {} sealed under request {}", epoch, request_id);
        Ok(epoch)
    }

    pub fn commit_reveal(&mut self, epoch: u64, request_id: u64, total: u64) -> Result<()> {
        let snapshot = self
            .epochs
            .get_mut(&epoch)
            .ok_or_else(|| error!(DaoError::NotFound))?;
        require!(snapshot.revealed.is_none(), DaoError::AlreadyRevealed);
        require!(snapshot.request_id == request_id, DaoError::UnknownRequest);

        snapshot.revealed = Some(total);
        self.model.last_revealed = Some(total);
        Ok(())
    }

    pub fn sealed_epochs(&self) -> impl Iterator<Item = &EpochSnapshot> {
        self.epochs.values()
    }
}
