use anchor_lang::prelude::*;
use std::collections::BTreeMap;

use crate::error::DaoError;
use crate::handle::CiphertextHandle;
use crate::NULL_ID;

/// Dataset registered for analysis. Immutable once uploaded.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct EncryptedDataset {
    pub id: u64,
    /// Off-chain content locator; never fetched or validated here.
    pub cid: String,
    pub metadata: CiphertextHandle,
    pub uploader: Pubkey,
    pub uploaded_at: i64,
    /// Restricted datasets only accept analysis proposals from the uploader.
    pub restricted: bool,
}

impl EncryptedDataset {
    pub fn may_propose(&self, proposer: &Pubkey) -> bool {
        !self.restricted || self.uploader == *proposer
    }
}

#[derive(Debug, Default)]
pub struct DatasetStore {
    datasets: BTreeMap<u64, EncryptedDataset>,
}

impl DatasetStore {
    pub fn insert(&mut self, dataset: EncryptedDataset) -> Result<u64> {
        require!(dataset.id != NULL_ID, DaoError::InvalidIdentifier);
        require!(
            !self.datasets.contains_key(&dataset.id),
            DaoError::InvalidIdentifier
        );

        let id = dataset.id;
        self.datasets.insert(id, dataset);
        Ok(id)
    }

    pub fn get(&self, id: u64) -> Result<&EncryptedDataset> {
        self.datasets
            .get(&id)
            .ok_or_else(|| error!(DaoError::NotFound))
    }

    pub fn uploaded_by<'a>(&'a self, uploader: &'a Pubkey) -> impl Iterator<Item = &'a EncryptedDataset> + 'a {
        self.datasets
            .values()
            .filter(move |dataset| dataset.uploader == *uploader)
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}
