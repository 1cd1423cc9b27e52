use rondo::finish::FinishCoordinator;
use rondo::race::{RaceError, RaceScheduler};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn two_minute_heats() -> RaceScheduler {
    RaceScheduler::new(
        vec![
            ("Heat A".into(), vec!["ann".into(), "bo".into()]),
            ("Heat B".into(), vec!["cy".into()]),
            ("Heat C".into(), vec!["dee".into()]),
        ],
        120,
    )
}

#[test]
fn staggered_start_and_relative_finish_times() {
    let mut race = two_minute_heats();

    // Drive the scheduler the way the app does: one observation per tick
    let mut elapsed = 0.0;
    while elapsed < 480.0 {
        elapsed += 0.1;
        race.observe(elapsed);
    }

    assert_eq!(race.groups()[0].start_offset_secs, Some(0));
    assert_eq!(race.groups()[1].start_offset_secs, Some(120));
    assert_eq!(race.groups()[2].start_offset_secs, Some(240));

    // Heat C (third group, 2-minute stagger) finishing at race time 480
    // gets a 240s result.
    race.mark_finished("dee", 480.0).unwrap();
    let dee = race.finish_for("dee").unwrap();
    assert!((dee.finish_secs - 240.0).abs() < 1e-6);
}

#[test]
fn placements_shift_down_after_an_undo() {
    let mut race = two_minute_heats();
    race.observe(300.0);

    race.mark_finished("ann", 300.0).unwrap(); // 300s
    race.mark_finished("cy", 300.0).unwrap(); // 180s
    race.mark_finished("bo", 290.0).unwrap(); // 290s

    assert_eq!(race.finish_for("cy").unwrap().placement, 1);
    assert_eq!(race.finish_for("bo").unwrap().placement, 2);
    assert_eq!(race.finish_for("ann").unwrap().placement, 3);

    race.undo_finish("cy");
    assert_eq!(race.finish_for("bo").unwrap().placement, 1);
    assert_eq!(race.finish_for("ann").unwrap().placement, 2);
    assert!(race.finish_for("cy").is_none());
}

#[test]
fn marking_a_waiting_group_never_panics() {
    let mut race = two_minute_heats();
    race.observe(60.0);
    let err = race.mark_finished("cy", 60.0).unwrap_err();
    assert!(matches!(err, RaceError::GroupNotStarted { .. }));
    assert_eq!(err.to_string(), "Heat B has not started yet");
}

#[test]
fn coordinator_fires_once_across_undo_and_refinish() {
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    let mut coordinator = FinishCoordinator::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let mut race = two_minute_heats();
    race.observe(240.0);

    race.mark_finished("ann", 250.0).unwrap();
    race.mark_finished("bo", 260.0).unwrap();
    race.mark_finished("cy", 270.0).unwrap();
    assert!(!coordinator.evaluate(race.finished_flags()));

    race.mark_finished("dee", 280.0).unwrap();
    assert!(coordinator.evaluate(race.finished_flags()));
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    // The latch stays closed even if the finish set churns afterwards
    race.undo_finish("dee");
    assert!(!coordinator.evaluate(race.finished_flags()));
    race.mark_finished("dee", 300.0).unwrap();
    assert!(!coordinator.evaluate(race.finished_flags()));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn reset_rearms_a_fresh_coordinator_run() {
    let mut race = two_minute_heats();
    let mut coordinator = FinishCoordinator::unarmed();
    race.observe(240.0);
    for name in ["ann", "bo", "cy", "dee"] {
        race.mark_finished(name, 300.0).unwrap();
    }
    assert!(coordinator.evaluate(race.finished_flags()));
    assert!(coordinator.has_fired());

    race.reset();
    let mut coordinator = FinishCoordinator::unarmed();
    assert!(!coordinator.has_fired());
    assert!(!coordinator.evaluate(race.finished_flags()));
    assert_eq!(race.groups()[1].start_offset_secs, None);
}
