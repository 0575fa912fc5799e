use anchor_lang::prelude::*;

use crate::error::DaoError;
use crate::handle::CiphertextHandle;

/// One entry of the serialized transaction log.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum DaoInstruction {
    SubmitSample {
        url: CiphertextHandle,
        headers: CiphertextHandle,
    },
    RequestSampleReveal {
        sample_id: u64,
    },
    Contribute {
        value: CiphertextHandle,
    },
    RequestAggregateReveal,
    UploadDataset {
        cid: String,
        metadata: CiphertextHandle,
        restricted: bool,
    },
    CreateProposal {
        dataset_id: u64,
        description_cid: String,
        voting_delay: i64,
        voting_period: i64,
    },
    Vote {
        proposal_id: u64,
        support: bool,
    },
    FinalizeProposal {
        proposal_id: u64,
    },
    RequestAnalysis {
        proposal_id: u64,
    },
    /// Only the oracle sends this; its contents are authenticated by `proof`.
    OnDecrypted {
        request_id: u64,
        cleartext: Vec<u8>,
        proof: Vec<u8>,
    },
}

impl DaoInstruction {
    pub fn unpack(data: &[u8]) -> Result<Self> {
        Self::try_from_slice(data).map_err(|_| error!(DaoError::InvalidInstruction))
    }

    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.serialize(&mut data)
            .map_err(|_| error!(DaoError::InvalidInstruction))?;
        Ok(data)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DaoInstruction::SubmitSample { .. } => "SubmitSample",
            DaoInstruction::RequestSampleReveal { .. } => "RequestSampleReveal",
            DaoInstruction::Contribute { .. } => "Contribute",
            DaoInstruction::RequestAggregateReveal => "RequestAggregateReveal",
            DaoInstruction::UploadDataset { .. } => "UploadDataset",
            DaoInstruction::CreateProposal { .. } => "CreateProposal",
            DaoInstruction::Vote { .. } => "Vote",
            DaoInstruction::FinalizeProposal { .. } => "FinalizeProposal",
            DaoInstruction::RequestAnalysis { .. } => "RequestAnalysis",
            DaoInstruction::OnDecrypted { .. } => "OnDecrypted",
        }
    }
}
