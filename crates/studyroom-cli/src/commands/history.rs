use clap::Args;
use studyroom_core::Journal;

use crate::common::short_time;

#[derive(Args)]
pub struct HistoryArgs {
    /// Number of entries to show, newest first
    #[arg(long, default_value = "20")]
    limit: usize,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: HistoryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let journal = Journal::open()?;
    let entries = journal.recent(args.limit)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("no sessions yet");
        return Ok(());
    }
    for entry in &entries {
        let status = match (&entry.error, entry.remote_id) {
            (Some(error), _) => format!("failed: {error}"),
            (None, Some(id)) => format!("recorded #{id}"),
            (None, None) => "kept locally".to_string(),
        };
        println!(
            "{:>4}  {} - {}  {:>3} min  course {} / topic {}  {}",
            entry.id,
            short_time(&entry.start_time),
            entry.end_time.format("%H:%M"),
            entry.duration_min,
            entry.course_id,
            entry.topic_id,
            status,
        );
    }
    Ok(())
}
