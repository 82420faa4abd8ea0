//! Parsers for the machine-readable output of the VCS clients.
//!
//! Parsers are pure and total: malformed lines are skipped, never reported.

pub mod git;
pub mod plastic;

pub use git::{GitStatusFields, parse_porcelain_v2};
pub use plastic::{
    PlasticHeader, PlasticStatusFields, is_auth_failure, parse_status, parse_status_header,
    parse_workspace_from_path, parse_workspace_info_branch,
};
