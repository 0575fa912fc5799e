//! Applies serialized transaction-log entries to a [`DataDao`].
//!
//! Entries are applied strictly one after another; each runs to completion
//! before the next is decoded.

use anchor_lang::prelude::*;

use crate::dao::{DataDao, Invocation};
use crate::handle::HomomorphicEngine;
use crate::instruction::DaoInstruction;
use crate::oracle::{ArtifactRegistry, DecryptionOracle, IdAllocator};

pub struct Processor;

impl Processor {
    pub fn process_instruction<E, O, R, I>(
        dao: &mut DataDao<E, O, R, I>,
        invocation: &Invocation,
        instruction_data: &[u8],
    ) -> Result<()>
    where
        E: HomomorphicEngine,
        O: DecryptionOracle,
        R: ArtifactRegistry,
        I: IdAllocator,
    {
        let instruction = DaoInstruction::unpack(instruction_data)?;
        msg!("Instruction: {}", instruction.name());

        match instruction {
            DaoInstruction::SubmitSample { url, headers } => {
                dao.submit_sample(invocation, url, headers).map(|_| ())
            }
            DaoInstruction::RequestSampleReveal { sample_id } => {
                dao.request_sample_reveal(invocation, sample_id).map(|_| ())
            }
            DaoInstruction::Contribute { value } => dao.contribute(invocation, value).map(|_| ()),
            DaoInstruction::RequestAggregateReveal => {
                dao.request_aggregate_reveal(invocation).map(|_| ())
            }
            DaoInstruction::UploadDataset {
                cid,
                metadata,
                restricted,
            } => dao
                .upload_dataset(invocation, cid, metadata, restricted)
                .map(|_| ()),
            DaoInstruction::CreateProposal {
                dataset_id,
                description_cid,
                voting_delay,
                voting_period,
            } => dao
                .create_proposal(
                    invocation,
                    dataset_id,
                    description_cid,
                    voting_delay,
                    voting_period,
                )
                .map(|_| ()),
            DaoInstruction::Vote {
                proposal_id,
                support,
            } => dao.vote(invocation, proposal_id, support),
            DaoInstruction::FinalizeProposal { proposal_id } => {
                dao.finalize(invocation, proposal_id).map(|_| ())
            }
            DaoInstruction::RequestAnalysis { proposal_id } => {
                dao.request_analysis(invocation, proposal_id).map(|_| ())
            }
            DaoInstruction::OnDecrypted {
                request_id,
                cleartext,
                proof,
            } => dao
                .on_decrypted(invocation, request_id, &cleartext, &proof)
                .map(|_| ()),
        }
    }

    /// Applies `entries` in order and reports each outcome. A failed entry
    /// does not stop the ones after it.
    pub fn process_log<E, O, R, I>(
        dao: &mut DataDao<E, O, R, I>,
        entries: &[(Invocation, Vec<u8>)],
    ) -> Vec<Result<()>>
    where
        E: HomomorphicEngine,
        O: DecryptionOracle,
        R: ArtifactRegistry,
        I: IdAllocator,
    {
        entries
            .iter()
            .map(|(invocation, data)| Self::process_instruction(dao, invocation, data))
            .collect()
    }
}
