//! Scripts for deploying the governance token, governor and crowdfunding
//! contracts, and for driving governance proposals.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod address;
pub mod artifacts;
pub mod chain;
pub mod cli;
mod commands;
pub mod constants;
pub mod context;
pub mod deploy;
pub mod deployments;
pub mod errors;
pub mod governance;
pub mod retry;
pub mod solidity;
pub mod types;
pub mod utils;
pub mod verify;

#[cfg(test)]
mod test_utils;
