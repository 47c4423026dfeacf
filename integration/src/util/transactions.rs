//! Utilities for asserting on transaction outcomes

use eyre::{eyre, Result};
use scripts::errors::ScriptError;

/// Assert that a transaction was rejected by the contract, optionally with a
/// revert reason containing `expected_reason`
pub fn assert_reverted<T>(
    res: Result<T, ScriptError>,
    expected_reason: Option<&str>,
) -> Result<()> {
    match res {
        Err(ScriptError::TransactionReverted { reason }) => match expected_reason {
            Some(expected) if !reason.contains(expected) => Err(eyre!(
                "expected revert reason containing {expected:?}, got {reason:?}"
            )),
            _ => Ok(()),
        },
        Err(e) => Err(eyre!("expected a revert, got error: {e}")),
        Ok(_) => Err(eyre!("expected a revert, but the transaction succeeded")),
    }
}
