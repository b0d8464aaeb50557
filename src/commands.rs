//! kith subcommands

use audit::{AuditConfig, GraphTraversal, SpamHeuristicEngine};
use clap::{Args, Subcommand};
use hub::{AccountId, ClientConfig, GithubClient};
use std::sync::Arc;

use crate::report;

#[derive(Args, Debug, Default)]
pub struct ThresholdArgs {
    /// Followers/following ratio above which the fast check flags an account
    #[arg(long)]
    fast_ratio: Option<f64>,
    /// Non-mutual/mutual ratio above which the slow check flags an account
    #[arg(long)]
    slow_ratio: Option<f64>,
    /// Only run the slow check below this many followers
    #[arg(long)]
    max_followers: Option<u64>,
    /// Only run the slow check below this many following
    #[arg(long)]
    max_following: Option<u64>,
    /// Max accounts evaluated at once
    #[arg(short = 'j', long)]
    max_concurrent: Option<usize>,
}

impl ThresholdArgs {
    /// Flags override environment values
    fn apply(&self, mut config: AuditConfig) -> AuditConfig {
        if let Some(v) = self.fast_ratio {
            config.fast_ratio_threshold = v;
        }
        if let Some(v) = self.slow_ratio {
            config.slow_ratio_threshold = v;
        }
        if let Some(v) = self.max_followers {
            config.max_followers_ceiling = v;
        }
        if let Some(v) = self.max_following {
            config.max_following_ceiling = v;
        }
        if let Some(v) = self.max_concurrent {
            config.max_concurrent_pipelines = v;
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check every non-mutual follower and non-follower of an account
    Audit {
        /// GitHub login (defaults to $GITHUB_USER)
        login: Option<String>,
        #[command(flatten)]
        thresholds: ThresholdArgs,
        /// JSON output
        #[arg(long)]
        json: bool,
    },
    /// Check a single account
    Check {
        /// GitHub login
        login: String,
        #[command(flatten)]
        thresholds: ThresholdArgs,
        /// JSON output
        #[arg(long)]
        json: bool,
    },
    /// Show mutual follower stats without checking anyone
    Mutuals {
        /// GitHub login (defaults to $GITHUB_USER)
        login: Option<String>,
        /// List member logins
        #[arg(short, long)]
        list: bool,
        /// JSON output
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Audit { login, thresholds, json } => cmd_audit(login, &thresholds, json).await,
        Commands::Check { login, thresholds, json } => cmd_check(&login, &thresholds, json).await,
        Commands::Mutuals { login, list, json } => cmd_mutuals(login, list, json).await,
    }
}

fn resolve_login(login: Option<String>) -> anyhow::Result<AccountId> {
    let login = login
        .or_else(|| std::env::var("GITHUB_USER").ok())
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty());
    match login {
        Some(login) => Ok(AccountId::from(login)),
        None => anyhow::bail!("No login given: pass one or set GITHUB_USER"),
    }
}

fn github() -> anyhow::Result<Arc<GithubClient>> {
    let config = ClientConfig::from_env();
    if config.token.is_none() {
        tracing::warn!("GITHUB_TOKEN not set, unauthenticated requests are heavily rate limited");
    }
    Ok(Arc::new(GithubClient::new(config)?))
}

fn audit_config(thresholds: &ThresholdArgs) -> anyhow::Result<AuditConfig> {
    let config = thresholds.apply(AuditConfig::from_env());
    config.validate()?;
    Ok(config)
}

async fn cmd_audit(login: Option<String>, thresholds: &ThresholdArgs, json: bool) -> anyhow::Result<()> {
    let root = resolve_login(login)?;
    let traversal = GraphTraversal::new(github()?, audit_config(thresholds)?)?;

    let analysis = traversal.analyze_root(&root).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print!("{}", report::render_analysis(&analysis));
    }
    Ok(())
}

async fn cmd_check(login: &str, thresholds: &ThresholdArgs, json: bool) -> anyhow::Result<()> {
    let id = resolve_login(Some(login.to_string()))?;
    let source = github()?;
    let engine = SpamHeuristicEngine::new(audit_config(thresholds)?);

    let assessment = engine.assess(&*source, &id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    } else {
        print!("{}", report::render_assessment(&assessment));
    }
    Ok(())
}

async fn cmd_mutuals(login: Option<String>, list: bool, json: bool) -> anyhow::Result<()> {
    let root = resolve_login(login)?;
    let traversal = GraphTraversal::new(github()?, AuditConfig::from_env())?;

    let (summary, mutuality) = traversal.root_mutuality(&root).await?;

    if json {
        #[derive(serde::Serialize)]
        struct MutualsView<'a> {
            login: &'a AccountId,
            followers: Option<u64>,
            following: Option<u64>,
            completeness: hub::Completeness,
            non_mutual_followers: usize,
            mutual_followers: usize,
            non_followers: usize,
            #[serde(skip_serializing_if = "Option::is_none")]
            members: Option<&'a audit::MutualityReport>,
        }

        let view = MutualsView {
            login: &summary.id,
            followers: summary.followers_count,
            following: summary.following_count,
            completeness: mutuality.completeness(),
            non_mutual_followers: mutuality.non_mutual_followers_count(),
            mutual_followers: mutuality.mutual_followers_count(),
            non_followers: mutuality.non_followers_count(),
            members: list.then_some(&mutuality),
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", report::render_mutuals(&summary, &mutuality, list));
    }
    Ok(())
}
