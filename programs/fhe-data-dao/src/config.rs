use anchor_lang::prelude::*;

use crate::error::DaoError;

pub const DEFAULT_MAX_LOCATOR_LEN: u32 = 128;
pub const DEFAULT_MAX_VOTING_PERIOD: i64 = 30 * 24 * 60 * 60;

/// Who may ask the oracle to reveal a submitted sample.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealPolicy {
    /// Only the identity that submitted the sample.
    SubmitterOnly,
    /// Any caller.
    Anyone,
}

impl Default for RevealPolicy {
    fn default() -> Self {
        RevealPolicy::SubmitterOnly
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct DaoConfig {
    /// Upper bound for dataset CIDs and description locators, in bytes.
    pub max_locator_len: u32,
    /// Voting period bounds in seconds. A zero-length period is allowed.
    pub min_voting_period: i64,
    pub max_voting_period: i64,
    pub reveal_policy: RevealPolicy,
}

impl Default for DaoConfig {
    fn default() -> Self {
        Self {
            max_locator_len: DEFAULT_MAX_LOCATOR_LEN,
            min_voting_period: 0,
            max_voting_period: DEFAULT_MAX_VOTING_PERIOD,
            reveal_policy: RevealPolicy::default(),
        }
    }
}

impl DaoConfig {
    pub fn validate(&self) -> Result<()> {
        require!(self.max_locator_len > 0, DaoError::InvalidConfig);
        require!(self.min_voting_period >= 0, DaoError::InvalidConfig);
        require!(
            self.min_voting_period <= self.max_voting_period,
            DaoError::InvalidConfig
        );
        Ok(())
    }

    pub fn check_locator(&self, locator: &str) -> Result<()> {
        require!(!locator.trim().is_empty(), DaoError::InvalidLocator);
        require!(
            locator.len() <= self.max_locator_len as usize,
            DaoError::InvalidLocator
        );
        Ok(())
    }

    /// Returns `(start_time, end_time)` for a proposal created at `now`.
    pub fn voting_window(&self, now: i64, delay: i64, period: i64) -> Result<(i64, i64)> {
        require!(delay >= 0, DaoError::InvalidVotingWindow);
        require!(
            period >= self.min_voting_period && period <= self.max_voting_period,
            DaoError::InvalidVotingWindow
        );
        let start = now
            .checked_add(delay)
            .ok_or_else(|| error!(DaoError::InvalidVotingWindow))?;
        let end = start
            .checked_add(period)
            .ok_or_else(|| error!(DaoError::InvalidVotingWindow))?;
        Ok((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::assert_dao_err;

    #[test]
    fn test_default_config_is_valid() {
        let config = DaoConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reveal_policy, RevealPolicy::SubmitterOnly);
    }

    #[test]
    fn test_inverted_period_bounds_rejected() {
        let config = DaoConfig {
            min_voting_period: 100,
            max_voting_period: 10,
            ..DaoConfig::default()
        };
        assert_dao_err(config.validate(), DaoError::InvalidConfig);
    }

    #[test]
    fn test_locator_bounds() {
        let config = DaoConfig {
            max_locator_len: 8,
            ..DaoConfig::default()
        };
        assert!(config.check_locator("bafy1234").is_ok());
        assert_dao_err(config.check_locator("bafy12345"), DaoError::InvalidLocator);
        assert_dao_err(config.check_locator("   "), DaoError::InvalidLocator);
    }

    #[test]
    fn test_voting_window_zero_period() {
        let config = DaoConfig::default();
        assert_eq!(config.voting_window(1_000, 0, 0).unwrap(), (1_000, 1_000));
        assert_eq!(config.voting_window(1_000, 50, 10).unwrap(), (1_050, 1_060));
    }

    #[test]
    fn test_voting_window_rejects_out_of_bounds() {
        let config = DaoConfig::default();
        assert_dao_err(config.voting_window(0, -1, 10), DaoError::InvalidVotingWindow);
        assert_dao_err(
            config.voting_window(0, 0, DEFAULT_MAX_VOTING_PERIOD + 1),
            DaoError::InvalidVotingWindow,
        );
        assert_dao_err(
            config.voting_window(i64::MAX, 1, 0),
            DaoError::InvalidVotingWindow,
        );
    }
}
