//! Phishing-sample store.
//!
//! Each sample is an immutable [`EncryptedSample`] paired with a
//! [`DecryptedSample`] that starts empty and is filled exactly once, by the
//! reveal callback.

use anchor_lang::prelude::*;
use std::collections::BTreeMap;

use crate::cleartext::SamplePlaintext;
use crate::error::DaoError;
use crate::handle::CiphertextHandle;
use crate::NULL_ID;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct EncryptedSample {
    pub id: u64,
    pub url: CiphertextHandle,
    pub headers: CiphertextHandle,
    pub submitted_at: i64,
    pub submitter: Pubkey,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct DecryptedSample {
    pub url: String,
    pub headers: String,
    pub revealed: bool,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealState {
    Sealed,
    Pending { request_id: u64 },
    Revealed { request_id: u64 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct SampleRecord {
    encrypted: EncryptedSample,
    decrypted: DecryptedSample,
    reveal: RevealState,
}

#[derive(Debug, Default)]
pub struct SampleStore {
    records: BTreeMap<u64, SampleRecord>,
    revealed: u64,
}

impl SampleStore {
    pub fn insert(&mut self, sample: EncryptedSample) -> Result<u64> {
        require!(sample.id != NULL_ID, DaoError::InvalidIdentifier);
        require!(
            !self.records.contains_key(&sample.id),
            DaoError::InvalidIdentifier
        );

        let id = sample.id;
        self.records.insert(
            id,
            SampleRecord {
                encrypted: sample,
                decrypted: DecryptedSample::default(),
                reveal: RevealState::Sealed,
            },
        );
        Ok(id)
    }

    fn record(&self, id: u64) -> Result<&SampleRecord> {
        self.records
            .get(&id)
            .ok_or_else(|| error!(DaoError::NotFound))
    }

    pub fn get(&self, id: u64) -> Result<&EncryptedSample> {
        Ok(&self.record(id)?.encrypted)
    }

    pub fn decrypted(&self, id: u64) -> Result<&DecryptedSample> {
        Ok(&self.record(id)?.decrypted)
    }

    pub fn reveal_state(&self, id: u64) -> Result<RevealState> {
        Ok(self.record(id)?.reveal)
    }

    /// Checks that a reveal may be requested for `id`.
    pub fn ensure_revealable(&self, id: u64) -> Result<&EncryptedSample> {
        let record = self.record(id)?;
        match record.reveal {
            RevealState::Sealed => Ok(&record.encrypted),
            RevealState::Pending { .. } => err!(DaoError::RequestAlreadyPending),
            RevealState::Revealed { .. } => err!(DaoError::AlreadyRevealed),
        }
    }

    pub fn mark_pending(&mut self, id: u64, request_id: u64) -> Result<()> {
        self.ensure_revealable(id)?;
        if let Some(record) = self.records.get_mut(&id) {
            record.reveal = RevealState::Pending { request_id };
        }
        Ok(())
    }

    /// Re-validates the sample at callback time, then writes the plaintext.
    pub fn commit_reveal(
        &mut self,
        id: u64,
        request_id: u64,
        plaintext: SamplePlaintext,
    ) -> Result<()> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| error!(DaoError::NotFound))?;
        match record.reveal {
            RevealState::Pending { request_id: pending } if pending == request_id => {}
            RevealState::Revealed { .. } => return err!(DaoError::AlreadyRevealed),
            _ => return err!(DaoError::UnknownRequest),
        }

        record.decrypted = DecryptedSample {
            url: plaintext.url,
            headers: plaintext.headers,
            revealed: true,
        };
        record.reveal = RevealState::Revealed { request_id };
        self.revealed += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn revealed_count(&self) -> u64 {
        self.revealed
    }
}
