//! Integration tests for the deployment and governance scripts

mod governor;
