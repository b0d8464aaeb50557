//! audit - 关注图垃圾账号审计
//!
//! 互关分析、两层启发式判定、有界并发的关注图遍历

mod config;
mod error;
mod heuristic;
mod mutuality;
mod throttle;
mod traversal;

pub use config::{AuditConfig, ConfigError};
pub use error::{AuditError, Result};
pub use heuristic::{AccountAssessment, Classification, SlowOutcome, SpamHeuristicEngine, SpamVerdict, Tier};
pub use mutuality::{analyze, FollowSet, MutualCounts, MutualityReport, SuspectKind};
pub use throttle::{RateLimitGate, Throttled};
pub use traversal::{GraphTraversal, RootAnalysis, SuspectOutcome, SuspectVerdict};
