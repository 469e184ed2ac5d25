use clap::Subcommand;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::warn;

use studyroom_core::timer::{format_clock, PRESETS};
use studyroom_core::{
    Config, Event, Preset, Selection, TimerController, TimerHandle, TimerRuntime,
};

use crate::common::{block_on, build_recorder};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a timer, reading commands from stdin:
    /// start | pause | stop | preset N | select COURSE TOPIC | status | quit
    Run {
        /// Built-in preset index (see `timer presets`)
        #[arg(long)]
        preset: Option<usize>,
        /// Course ID sessions are recorded under
        #[arg(long)]
        course: Option<i64>,
        /// Topic ID sessions are recorded under
        #[arg(long)]
        topic: Option<i64>,
        /// Work periods before a long break
        #[arg(long)]
        sessions_before_long: Option<u32>,
        /// Long break length in minutes
        #[arg(long)]
        long_break: Option<u32>,
        /// Keep sessions in the local journal only
        #[arg(long)]
        offline: bool,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// List built-in presets
    Presets {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// One parsed stdin line.
#[derive(Debug, PartialEq)]
enum Input {
    Start,
    Pause,
    Stop,
    Preset(Preset),
    Select(Selection),
    Status,
    Quit,
    Empty,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(Input::Empty);
    };
    let args: Vec<&str> = words.collect();

    let input = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("start" | "resume", []) => Input::Start,
        ("pause", []) => Input::Pause,
        ("stop", []) => Input::Stop,
        ("status", []) => Input::Status,
        ("quit" | "exit", []) => Input::Quit,
        ("preset", [index]) => {
            let index: usize = index
                .parse()
                .map_err(|_| format!("preset index must be a number, got '{index}'"))?;
            let preset = Preset::builtin(index)
                .ok_or_else(|| format!("no preset {index}; choose 0..{}", PRESETS.len() - 1))?;
            Input::Preset(preset)
        }
        ("select", ["none"]) => Input::Select(Selection::default()),
        ("select", [course, topic]) => {
            let course = course
                .parse()
                .map_err(|_| format!("course ID must be a number, got '{course}'"))?;
            let topic = topic
                .parse()
                .map_err(|_| format!("topic ID must be a number, got '{topic}'"))?;
            Input::Select(Selection::of(course, topic))
        }
        _ => return Err(format!("unknown command: {}", line.trim())),
    };
    Ok(input)
}

/// Human-readable line for an event; `None` for events not worth a line.
fn describe(event: &Event) -> Option<String> {
    let line = match event {
        Event::PresetSelected { preset, .. } => format!("preset {} selected", preset.label()),
        Event::SelectionChanged {
            course_id,
            topic_id,
            ..
        } => match (course_id, topic_id) {
            (Some(c), Some(t)) => format!("studying course {c} / topic {t}"),
            _ => "no course/topic selected; sessions will not be recorded".to_string(),
        },
        Event::TimerStarted {
            mode,
            remaining_secs,
            ..
        } => format!("{} started ({})", mode.title(), format_clock(*remaining_secs)),
        Event::TimerPaused {
            mode,
            remaining_secs,
            ..
        } => format!("{} paused at {}", mode.title(), format_clock(*remaining_secs)),
        // One line per minute keeps the output readable.
        Event::Tick {
            mode,
            remaining_secs,
        } if remaining_secs % 60 == 0 && *remaining_secs > 0 => {
            format!("{} {}", mode.title(), format_clock(*remaining_secs))
        }
        Event::Tick { .. } => return None,
        Event::TimerCompleted { mode, .. } => format!("{} complete", mode.title()),
        Event::TimerStopped {
            mode, elapsed_secs, ..
        } => format!("{} stopped after {}", mode.title(), format_clock(*elapsed_secs)),
        Event::ModeChanged {
            to, duration_secs, ..
        } => format!("next: {} ({})", to.title(), format_clock(*duration_secs)),
        Event::RecordingSkipped { reason, .. } => format!("session not recorded: {reason}"),
        Event::SessionRecorded {
            duration_min,
            remote_id,
            ..
        } => match remote_id {
            Some(id) => format!("session recorded: {duration_min} min (#{id})"),
            None => format!("session kept locally: {duration_min} min"),
        },
        // Printed as a warning on stderr instead.
        Event::RecordingFailed { .. } => return None,
        Event::StateSnapshot(snap) => format!(
            "{} {} {} | preset {} | completed {}",
            snap.mode.title(),
            snap.display,
            if snap.running { "running" } else { "idle" },
            snap.preset.label(),
            snap.completed_work,
        ),
    };
    Some(line)
}

fn print_event(event: &Event, json: bool) -> Result<(), serde_json::Error> {
    if let Event::RecordingFailed { message, .. } = event {
        eprintln!("warning: could not record session: {message}");
    }
    if json {
        println!("{}", serde_json::to_string(event)?);
    } else if let Some(line) = describe(event) {
        println!("{line}");
    }
    Ok(())
}

struct RunOptions {
    preset: Option<usize>,
    course: Option<i64>,
    topic: Option<i64>,
    sessions_before_long: Option<u32>,
    long_break: Option<u32>,
    offline: bool,
    json: bool,
}

fn build_controller(config: &Config, opts: &RunOptions) -> Result<TimerController, String> {
    let preset = match opts.preset {
        Some(index) => Preset::builtin(index)
            .ok_or_else(|| format!("no preset {index}; see `timer presets`"))?,
        None => config.preset(),
    };

    let mut settings = config.timer_settings();
    if let Some(n) = opts.sessions_before_long {
        if n == 0 {
            return Err("--sessions-before-long must be at least 1".into());
        }
        settings.sessions_before_long = n;
    }
    if let Some(min) = opts.long_break {
        settings.long_break_min = min;
    }

    let defaults = config.selection();
    let selection = Selection::new(
        opts.course.or(defaults.course_id),
        opts.topic.or(defaults.topic_id),
    );

    Ok(TimerController::new(preset, settings).with_selection(selection))
}

async fn dispatch(
    handle: &TimerHandle,
    input: Input,
    json: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    match input {
        Input::Start => handle.start().await?,
        Input::Pause => handle.pause().await?,
        Input::Stop => handle.stop().await?,
        Input::Preset(preset) => handle.select_preset(preset).await?,
        Input::Select(selection) => handle.select(selection).await?,
        Input::Status => print_event(&Event::StateSnapshot(handle.snapshot().await?), json)?,
        Input::Quit => return Ok(false),
        Input::Empty => {}
    }
    Ok(true)
}

async fn run_interactive(opts: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let controller = build_controller(&config, &opts)?;
    let recorder = build_recorder(&config, opts.offline)?;

    let (runtime, handle) = TimerRuntime::new(controller, recorder);
    let mut events = handle.subscribe();
    let join = runtime.spawn();

    print_event(&Event::StateSnapshot(handle.snapshot().await?), opts.json)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                // EOF behaves like quit.
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    Ok(input) => {
                        if !dispatch(&handle, input, opts.json).await? {
                            break;
                        }
                    }
                    Err(msg) => eprintln!("{msg}"),
                }
            }
            event = events.recv() => match event {
                Ok(event) => print_event(&event, opts.json)?,
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event output fell behind"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    // Let in-flight hand-offs finish, then flush what they published.
    drop(handle);
    let controller = join.await?;
    loop {
        match events.try_recv() {
            Ok(event) => print_event(&event, opts.json)?,
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }

    if !opts.json {
        println!("completed work periods: {}", controller.completed_work());
    }
    Ok(())
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Run {
            preset,
            course,
            topic,
            sessions_before_long,
            long_break,
            offline,
            json,
        } => {
            let opts = RunOptions {
                preset,
                course,
                topic,
                sessions_before_long,
                long_break,
                offline,
                json,
            };
            block_on(run_interactive(opts))??;
        }
        TimerAction::Presets { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&PRESETS)?);
            } else {
                for (index, preset) in PRESETS.iter().enumerate() {
                    println!("{index}: {}", preset.label());
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyroom_core::{SkipReason, TimerMode};

    #[test]
    fn parses_plain_commands() {
        assert_eq!(parse_input("start"), Ok(Input::Start));
        assert_eq!(parse_input("  Pause "), Ok(Input::Pause));
        assert_eq!(parse_input("stop"), Ok(Input::Stop));
        assert_eq!(parse_input("status"), Ok(Input::Status));
        assert_eq!(parse_input("quit"), Ok(Input::Quit));
        assert_eq!(parse_input(""), Ok(Input::Empty));
    }

    #[test]
    fn parses_preset_by_index() {
        assert_eq!(parse_input("preset 1"), Ok(Input::Preset(Preset::new(50, 10))));
        assert!(parse_input("preset 9").is_err());
        assert!(parse_input("preset x").is_err());
    }

    #[test]
    fn parses_selection() {
        assert_eq!(
            parse_input("select 3 7"),
            Ok(Input::Select(Selection::of(3, 7)))
        );
        assert_eq!(
            parse_input("select none"),
            Ok(Input::Select(Selection::default()))
        );
        assert!(parse_input("select 3").is_err());
        assert!(parse_input("select a b").is_err());
    }

    #[test]
    fn rejects_unknown_and_extra_words() {
        assert!(parse_input("launch").is_err());
        assert!(parse_input("start now").is_err());
    }

    #[test]
    fn controller_options_override_config() {
        let mut config = Config::default();
        config.study.course_id = Some(1);
        config.study.topic_id = Some(2);

        let opts = RunOptions {
            preset: Some(2),
            course: Some(9),
            topic: None,
            sessions_before_long: Some(2),
            long_break: Some(30),
            offline: true,
            json: false,
        };
        let timer = build_controller(&config, &opts).unwrap();
        assert_eq!(timer.preset(), Preset::new(100, 20));
        assert_eq!(timer.selection(), Selection::of(9, 2));
        assert_eq!(timer.settings().sessions_before_long, 2);
        assert_eq!(timer.duration_secs(TimerMode::LongBreak), 30 * 60);
    }

    #[test]
    fn zero_cadence_is_rejected() {
        let opts = RunOptions {
            preset: None,
            course: None,
            topic: None,
            sessions_before_long: Some(0),
            long_break: None,
            offline: true,
            json: false,
        };
        assert!(build_controller(&Config::default(), &opts).is_err());
    }

    #[test]
    fn ticks_are_summarised_per_minute() {
        let tick = |remaining_secs| Event::Tick {
            mode: TimerMode::Work,
            remaining_secs,
        };
        assert!(describe(&tick(1439)).is_none());
        assert_eq!(describe(&tick(1440)).as_deref(), Some("Work Session 24:00"));
        assert!(describe(&tick(0)).is_none());
    }

    #[test]
    fn skipped_sessions_name_the_reason() {
        let skipped = Event::RecordingSkipped {
            reason: SkipReason::NoTopicSelected,
            at: chrono::Utc::now(),
        };
        assert_eq!(
            describe(&skipped).as_deref(),
            Some("session not recorded: no topic selected")
        );
    }
}
