// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("no record found for agent {0}")]
    NotFound(uuid::Uuid),
    #[error("sequence conflict appending event for agent {0}, retries exhausted")]
    SequenceConflict(uuid::Uuid),
}
