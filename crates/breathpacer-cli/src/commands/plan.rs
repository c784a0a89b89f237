use breathpacer_core::timer::{plan_iter, PlanEntry};
use breathpacer_core::{format_countdown, Config};
use clap::Args;

use super::SessionArgs;

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
    /// Stop after this many phases
    #[arg(long, default_value_t = 500)]
    pub limit: usize,
}

/// First `limit` entries, and whether the plan went on past them.
fn take_limited(entries: impl Iterator<Item = PlanEntry>, limit: usize) -> (Vec<PlanEntry>, bool) {
    let mut taken: Vec<PlanEntry> = entries.take(limit.saturating_add(1)).collect();
    let truncated = taken.len() > limit;
    taken.truncate(limit);
    (taken, truncated)
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let session = args.session.resolve(&config);
    let (plan, truncated) = take_limited(plan_iter(&session), args.limit);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!("{} -- {}", session.title, format_countdown(session.total_seconds));
        for entry in &plan {
            let cut = if entry.runs_for < entry.seconds {
                format!(" (cut to {}s)", entry.runs_for)
            } else {
                String::new()
            };
            println!(
                "{:>6}  {:<22} {}s{}",
                format_countdown(entry.starts_at),
                entry.phase.label(),
                entry.seconds,
                cut
            );
        }
    }

    if truncated {
        eprintln!("plan truncated after {} phases (raise --limit to see more)", args.limit);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use breathpacer_core::timer::{BreathPattern, SessionConfig};

    use super::*;

    #[test]
    fn huge_session_is_cut_at_limit() {
        let session = SessionConfig::new(4_000_000_000, BreathPattern::default(), None, None).unwrap();
        let (plan, truncated) = take_limited(plan_iter(&session), 6);
        assert_eq!(plan.len(), 6);
        assert!(truncated);
        assert_eq!(plan[5].starts_at, 24);
    }

    #[test]
    fn short_session_is_not_marked_truncated() {
        let session = SessionConfig::new(20, BreathPattern::default(), None, None).unwrap();
        let (plan, truncated) = take_limited(plan_iter(&session), 4);
        assert_eq!(plan.len(), 4);
        assert!(!truncated);
    }
}
