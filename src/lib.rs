//! Update-and-swap deployment for the scowl wordlist application.
//!
//! One run stages a fresh copy of the live checkout, synchronizes it with
//! the upstream master branch and the scowl v2 release stream, rebuilds
//! scowl.db, then swaps the staging checkout into place and restarts the
//! service. Any failure before the swap aborts with the live checkout
//! untouched.

pub mod build;
pub mod config;
pub mod constants;
pub mod deploy;
pub mod git;
pub mod lock;
pub mod output;
pub mod service;
pub mod stage;
