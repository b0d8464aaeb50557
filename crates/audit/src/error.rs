use hub::{AccountId, HubError, Relation};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("failed to fetch profile of root account {account}: {source}")]
    RootProfile { account: AccountId, source: HubError },
    #[error("failed to fetch {relation} of root account {account}: {source}")]
    RootFetch {
        account: AccountId,
        relation: Relation,
        source: HubError,
    },
    #[error("{0} appears in more than one suspect set")]
    OverlappingSuspects(AccountId),
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, AuditError>;
