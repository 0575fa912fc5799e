use anchor_lang::prelude::*;

// ==================== ERRORS ====================

#[error_code]
pub enum DaoError {
    #[msg("Entity not found")]
    NotFound,
    #[msg("Entity has already been revealed")]
    AlreadyRevealed,
    #[msg("Request has already been consumed")]
    AlreadyConsumed,
    #[msg("Unknown request id")]
    UnknownRequest,
    #[msg("Decryption proof does not authenticate the cleartext")]
    InvalidProof,
    #[msg("Cleartext does not match the expected shape")]
    MalformedCleartext,
    #[msg("Operation not allowed in the current proposal state")]
    InvalidState,
    #[msg("Voting is closed")]
    VotingClosed,
    #[msg("Voting period has not ended yet")]
    VotingOngoing,
    #[msg("Already voted")]
    DuplicateVote,
    #[msg("A reveal request is already pending for this entity")]
    RequestAlreadyPending,
    #[msg("Aggregate model has no contributions in the current epoch")]
    ModelNotInitialized,
    #[msg("Unauthorized")]
    Unauthorized,
    #[msg("Content locator is empty or too long")]
    InvalidLocator,
    #[msg("Voting window is outside the configured bounds")]
    InvalidVotingWindow,
    #[msg("Oracle returned an invalid request id")]
    InvalidRequestId,
    #[msg("Id allocator returned an invalid identifier")]
    InvalidIdentifier,
    #[msg("Vote tally overflow")]
    TallyOverflow,
    #[msg("Homomorphic engine rejected the ciphertext")]
    CiphertextRejected,
    #[msg("Invalid instruction data")]
    InvalidInstruction,
    #[msg("Invalid configuration")]
    InvalidConfig,
}

/// Asserts that `result` failed with `expected`, comparing error codes only.
#[cfg(test)]
pub(crate) fn assert_dao_err<T: std::fmt::Debug>(result: Result<T>, expected: DaoError) {
    match result {
        Err(anchor_lang::error::Error::AnchorError(err)) => {
            assert_eq!(
                err.error_code_number,
                u32::from(expected),
                "expected {:?}, got {}",
                expected,
                err.error_name
            );
        }
        other => panic!("expected {:?}, got {:?}", expected, other),
    }
}
