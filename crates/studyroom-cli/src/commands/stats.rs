use clap::{Subcommand, ValueEnum};
use serde_json::json;
use studyroom_core::{GoalKind, Journal};

use crate::common::today;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// All-time stats
    All,
    /// Minutes per day, for days with study time
    Daily,
    /// Minutes per weekday of the current week
    Weekly,
    /// Consecutive study days ending today
    Streak,
    /// Total minutes for one course
    Course {
        /// Course ID
        id: i64,
    },
    /// Total minutes for one topic
    Topic {
        /// Topic ID
        id: i64,
    },
    /// Local study goals and their progress
    Goals,
    /// Track a new goal
    AddGoal {
        /// Short name shown in `stats goals`
        title: String,
        /// What the goal counts
        #[arg(long, value_enum)]
        kind: GoalArg,
        /// Minutes, sessions or days, depending on the kind
        #[arg(long)]
        target: u64,
    },
    /// Stop tracking a goal
    RemoveGoal {
        /// Goal ID
        id: i64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum GoalArg {
    /// Recorded minutes
    Hours,
    /// Recorded sessions
    Sessions,
    /// Consecutive study days
    Streak,
}

impl From<GoalArg> for GoalKind {
    fn from(arg: GoalArg) -> Self {
        match arg {
            GoalArg::Hours => GoalKind::Hours,
            GoalArg::Sessions => GoalKind::SessionCount,
            GoalArg::Streak => GoalKind::Streak,
        }
    }
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let journal = Journal::open()?;

    let output = match action {
        StatsAction::Today => serde_json::to_value(journal.stats_today(today())?)?,
        StatsAction::All => serde_json::to_value(journal.stats_all(today())?)?,
        StatsAction::Daily => serde_json::to_value(journal.daily_summary()?)?,
        StatsAction::Weekly => {
            let week = journal.weekly_summary(today())?;
            json!({
                "week_start": week.week_start,
                "total_min": week.total_min(),
                "days": week.days,
            })
        }
        StatsAction::Streak => json!({ "streak_days": journal.streak(today())? }),
        StatsAction::Course { id } => json!({
            "course_id": id,
            "total_min": journal.total_minutes_by_course(id)?,
        }),
        StatsAction::Topic { id } => json!({
            "topic_id": id,
            "total_min": journal.total_minutes_by_topic(id)?,
        }),
        StatsAction::Goals => {
            // Streak goals follow the streak as of today.
            journal.streak(today())?;
            serde_json::to_value(journal.goals()?)?
        }
        StatsAction::AddGoal {
            title,
            kind,
            target,
        } => serde_json::to_value(journal.add_goal(&title, kind.into(), target)?)?,
        StatsAction::RemoveGoal { id } => {
            if !journal.remove_goal(id)? {
                return Err(format!("no goal with id {id}").into());
            }
            json!({ "removed": id })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
