//! Property tests for the timer controller.
//!
//! These drive the synchronous controller directly, one `tick()` per
//! simulated second.

use proptest::prelude::*;
use studyroom_core::timer::PRESETS;
use studyroom_core::{Preset, Selection, TimerController, TimerMode, TimerSettings};

fn controller(preset: Preset) -> TimerController {
    TimerController::new(preset, TimerSettings::default()).with_selection(Selection::of(3, 7))
}

fn run_ticks(timer: &mut TimerController, n: u64) -> Vec<studyroom_core::SessionHandoff> {
    let mut handoffs = Vec::new();
    for _ in 0..n {
        if let Some(h) = timer.tick().handoff {
            handoffs.push(h);
        }
    }
    handoffs
}

fn small_preset() -> impl Strategy<Value = Preset> {
    (1u32..=5, 1u32..=3).prop_map(|(w, b)| Preset::new(w, b))
}

proptest! {
    #[test]
    fn select_preset_always_yields_fresh_work(idx in 0usize..PRESETS.len(), before in 0u64..200) {
        let mut timer = controller(Preset::new(1, 1));
        timer.start();
        run_ticks(&mut timer, before);

        let preset = PRESETS[idx];
        timer.select_preset(preset);

        prop_assert_eq!(timer.mode(), TimerMode::Work);
        prop_assert_eq!(timer.remaining_secs(), u64::from(preset.work_min) * 60);
        prop_assert!(!timer.is_running());
        prop_assert_eq!(timer.completed_work(), 0);
    }

    #[test]
    fn pause_then_start_resumes_exactly(
        preset in small_preset(),
        a in 0u64..60,
        idle in 0u64..30,
        b in 0u64..60,
    ) {
        let total = preset.work_secs();
        prop_assume!(a + b < total);

        let mut timer = controller(preset);
        timer.start();
        run_ticks(&mut timer, a);
        timer.pause();
        let held = timer.remaining_secs();

        // Ticks while paused are ignored.
        run_ticks(&mut timer, idle);
        prop_assert_eq!(timer.remaining_secs(), held);

        timer.start();
        run_ticks(&mut timer, b);
        prop_assert_eq!(timer.remaining_secs(), total - a - b);
        prop_assert_eq!(timer.mode(), TimerMode::Work);
    }

    #[test]
    fn stop_records_rounded_up_minutes(preset in small_preset(), elapsed in 1u64..300) {
        let total = preset.work_secs();
        prop_assume!(elapsed < total);

        let mut timer = controller(preset);
        timer.start();
        prop_assert!(run_ticks(&mut timer, elapsed).is_empty());

        let handoff = timer.stop().handoff.expect("stop mid-work hands off");
        prop_assert_eq!(handoff.elapsed_secs, elapsed);
        prop_assert_eq!(handoff.duration_min(), elapsed.div_ceil(60));
        prop_assert_eq!((handoff.ended_at - handoff.started_at).num_seconds(), elapsed as i64);

        prop_assert_eq!(timer.mode(), TimerMode::Work);
        prop_assert_eq!(timer.remaining_secs(), total);
        prop_assert_eq!(timer.completed_work(), 0);
    }

    #[test]
    fn pause_then_stop_counts_only_running_seconds(
        preset in small_preset(),
        a in 0u64..120,
        idle in 0u64..60,
        b in 0u64..120,
    ) {
        let total = preset.work_secs();
        prop_assume!(a + b >= 1 && a + b < total);

        let mut timer = controller(preset);
        timer.start();
        run_ticks(&mut timer, a);
        timer.pause();
        run_ticks(&mut timer, idle);
        timer.start();
        prop_assert!(run_ticks(&mut timer, b).is_empty());

        let handoff = timer.stop().handoff.expect("stop after focus time hands off");
        prop_assert_eq!(handoff.elapsed_secs, a + b);
        prop_assert_eq!((handoff.ended_at - handoff.started_at).num_seconds(), (a + b) as i64);
        prop_assert_eq!(handoff.duration_min(), (a + b).div_ceil(60));
        prop_assert_eq!(timer.mode(), TimerMode::Work);
        prop_assert_eq!(timer.remaining_secs(), total);
    }

    #[test]
    fn full_work_period_hands_off_once(preset in small_preset()) {
        let mut timer = controller(preset);
        timer.start();
        let handoffs = run_ticks(&mut timer, preset.work_secs());

        prop_assert_eq!(handoffs.len(), 1);
        prop_assert_eq!(handoffs[0].duration_min(), u64::from(preset.work_min));
        prop_assert_eq!(timer.mode(), TimerMode::ShortBreak);
        prop_assert_eq!(timer.remaining_secs(), preset.break_secs());
    }

    #[test]
    fn long_break_follows_every_nth_completion(every in 1u32..=5, rounds in 1u32..=12) {
        let preset = Preset::new(1, 1);
        let settings = TimerSettings::new(every, 2);
        let mut timer = TimerController::new(preset, settings);

        for n in 1..=rounds {
            timer.start();
            let rest = timer.remaining_secs();
            run_ticks(&mut timer, rest);

            let expected = if n % every == 0 {
                TimerMode::LongBreak
            } else {
                TimerMode::ShortBreak
            };
            prop_assert_eq!(timer.mode(), expected);

            timer.start();
            let rest = timer.remaining_secs();
            run_ticks(&mut timer, rest);
            prop_assert_eq!(timer.mode(), TimerMode::Work);
        }
        prop_assert_eq!(timer.completed_work(), rounds);
    }
}
