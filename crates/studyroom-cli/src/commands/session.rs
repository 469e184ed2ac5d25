use chrono::NaiveDateTime;
use clap::Subcommand;
use studyroom_core::session::wire::local_time;
use studyroom_core::Config;

use crate::common::{build_recorder, record_session};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Record one study session through the configured session store
    Record {
        /// Course ID
        #[arg(long)]
        course: i64,
        /// Topic ID
        #[arg(long)]
        topic: i64,
        /// Start time, local (e.g. 2025-04-26T14:30:00)
        #[arg(long, value_parser = parse_time)]
        start: NaiveDateTime,
        /// End time, local
        #[arg(long, value_parser = parse_time)]
        end: NaiveDateTime,
        /// Keep the session in the local journal only
        #[arg(long)]
        offline: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_time(raw: &str) -> Result<NaiveDateTime, String> {
    local_time::parse(raw).map_err(|e| format!("expected YYYY-MM-DDTHH:MM:SS: {e}"))
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SessionAction::Record {
            course,
            topic,
            start,
            end,
            offline,
            json,
        } => {
            let config = Config::load()?;
            let recorder = build_recorder(&config, offline)?;
            let stored = record_session(&recorder, course, topic, start, end)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&stored)?);
            } else {
                match stored.id {
                    Some(id) => println!("session recorded: #{id}"),
                    None => println!("session kept locally"),
                }
            }
        }
    }
    Ok(())
}
