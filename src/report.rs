//! Console rendering

use audit::{
    AccountAssessment, Classification, MutualCounts, MutualityReport, RootAnalysis, SlowOutcome, SpamVerdict,
    SuspectKind, SuspectOutcome,
};
use hub::{AccountId, Completeness, ProfileSummary};
use std::fmt;

struct Count(Option<u64>);

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(n) => write!(f, "{}", n),
            None => f.write_str("unknown"),
        }
    }
}

fn label(classification: Classification) -> &'static str {
    match classification {
        Classification::LikelySpam => "might be a spammer",
        Classification::LikelyGenuine => "probably not a spammer",
        Classification::Inconclusive => "inconclusive",
    }
}

struct VerdictLine<'a>(&'a SpamVerdict);

impl fmt::Display for VerdictLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = self.0;
        match verdict.ratio {
            Some(ratio) => write!(f, "{} (ratio {:.2}): {}", label(verdict.classification), ratio, verdict.reason),
            None => write!(f, "{}: {}", label(verdict.classification), verdict.reason),
        }
    }
}

fn write_follows(f: &mut fmt::Formatter<'_>, summary: &ProfileSummary) -> fmt::Result {
    writeln!(f, "  {} number of followers: {}", summary.id, Count(summary.followers_count))?;
    writeln!(f, "  {} number of following: {}", summary.id, Count(summary.following_count))
}

fn write_counts(f: &mut fmt::Formatter<'_>, login: &AccountId, counts: &MutualCounts) -> fmt::Result {
    writeln!(f, "  {} non mutual followers count: {}", login, counts.non_mutual_followers)?;
    writeln!(f, "  {} mutual followers count: {}", login, counts.mutual_followers)?;
    if counts.completeness != Completeness::Complete {
        writeln!(f, "  warning: follow lists are incomplete, counts are lower bounds")?;
    }
    Ok(())
}

fn write_mutuality(f: &mut fmt::Formatter<'_>, login: &AccountId, mutuality: &MutualityReport) -> fmt::Result {
    let counts = mutuality.counts();
    writeln!(f, "  {} non mutual followers count: {}", login, counts.non_mutual_followers)?;
    writeln!(f, "  {} mutual followers count: {}", login, counts.mutual_followers)?;
    writeln!(f, "  {} non followers count: {}", login, counts.non_followers)?;
    if counts.completeness != Completeness::Complete {
        writeln!(f, "  warning: follow lists are incomplete, counts are lower bounds")?;
    }
    Ok(())
}

struct AssessmentReport<'a>(&'a AccountAssessment);

impl fmt::Display for AssessmentReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let assessment = self.0;
        let summary = &assessment.summary;

        write_follows(f, summary)?;
        writeln!(f, "  fast check: {}", VerdictLine(&assessment.fast))?;

        match &assessment.slow {
            SlowOutcome::Gated => writeln!(f, "  slow check: skipped, account too large")?,
            SlowOutcome::Evaluated { verdict, counts } | SlowOutcome::Inconclusive { verdict, counts } => {
                write_counts(f, &summary.id, counts)?;
                writeln!(f, "  slow check: {}", VerdictLine(verdict))?;
            }
        }

        writeln!(f, "  => {} {}", summary.id, label(assessment.final_verdict().classification))
    }
}

pub fn render_assessment(assessment: &AccountAssessment) -> String {
    AssessmentReport(assessment).to_string()
}

struct AnalysisReport<'a>(&'a RootAnalysis);

impl AnalysisReport<'_> {
    fn write_suspect(f: &mut fmt::Formatter<'_>, id: &AccountId, outcome: &SuspectOutcome) -> fmt::Result {
        writeln!(f, "{}", id)?;
        match outcome {
            SuspectOutcome::Assessed(assessment) => write!(f, "{}", AssessmentReport(assessment)),
            SuspectOutcome::Unreachable { reason, rate_limited } => {
                let suffix = if *rate_limited { " (rate limited)" } else { "" };
                writeln!(f, "  unreachable{}: {}", suffix, reason)
            }
        }
    }
}

impl fmt::Display for AnalysisReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let analysis = self.0;
        let root = &analysis.root_summary;

        writeln!(f, "{}", root.id)?;
        write_follows(f, root)?;
        write_mutuality(f, &root.id, &analysis.root_mutuality_report)?;

        let sections = [
            (SuspectKind::NonMutualFollower, "Non-mutual followers"),
            (SuspectKind::NonFollower, "Non-followers"),
        ];
        for (kind, title) in sections {
            let entries: Vec<_> = analysis.verdicts_by(kind).collect();
            writeln!(f, "\n{} ({}):\n", title, entries.len())?;
            for (id, outcome) in entries {
                Self::write_suspect(f, id, outcome)?;
            }
        }

        let (mut spam, mut genuine, mut unknown) = (0, 0, 0);
        for verdict in analysis.suspect_verdicts.values() {
            match &verdict.outcome {
                SuspectOutcome::Assessed(a) => match a.final_verdict().classification {
                    Classification::LikelySpam => spam += 1,
                    Classification::LikelyGenuine => genuine += 1,
                    Classification::Inconclusive => unknown += 1,
                },
                SuspectOutcome::Unreachable { .. } => unknown += 1,
            }
        }
        writeln!(
            f,
            "\n{} checked: {} might be spammers, {} probably not, {} unknown",
            analysis.suspect_verdicts.len(),
            spam,
            genuine,
            unknown
        )?;
        if analysis.rate_limited {
            writeln!(f, "warning: hit the GitHub rate limit, some accounts could not be checked")?;
        }
        Ok(())
    }
}

pub fn render_analysis(analysis: &RootAnalysis) -> String {
    AnalysisReport(analysis).to_string()
}

struct MutualsReport<'a> {
    summary: &'a ProfileSummary,
    mutuality: &'a MutualityReport,
    list: bool,
}

impl fmt::Display for MutualsReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_follows(f, self.summary)?;
        write_mutuality(f, &self.summary.id, self.mutuality)?;

        if self.list {
            let groups = [
                ("Non-mutual followers", self.mutuality.non_mutual_followers()),
                ("Mutual followers", self.mutuality.mutual_followers()),
                ("Non-followers", self.mutuality.non_followers()),
            ];
            for (title, members) in groups {
                writeln!(f, "\n{} ({}):", title, members.len())?;
                for id in members {
                    writeln!(f, "  {}", id)?;
                }
            }
        }
        Ok(())
    }
}

pub fn render_mutuals(summary: &ProfileSummary, mutuality: &MutualityReport, list: bool) -> String {
    MutualsReport {
        summary,
        mutuality,
        list,
    }
    .to_string()
}
