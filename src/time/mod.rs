//! Time domain: the four-phase day/night scheduler.
//!
//! Responsible for:
//! - Advancing `DayCycle` by frame deltas while the player is in the shop or forest
//! - Sending `PhaseProgressEvent` every tick and `PhaseChangedEvent` on rollover
//! - Tripping the power breaker when dawn runs out (time stops until reset)
//! - Handling `ResetBreakerEvent` and `ToggleTimeFlowEvent`

use bevy::prelude::*;

use crate::shared::*;

pub struct DayCyclePlugin;

impl Plugin for DayCyclePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DayCycle>().add_systems(
            Update,
            (
                tick_day_cycle.run_if(time_is_flowing),
                handle_breaker_reset.after(tick_day_cycle),
                handle_time_toggle.after(tick_day_cycle),
            )
                .run_if(in_state(GameState::Shop).or(in_state(GameState::Forest))),
        );
    }
}

// ─── Run Conditions ───────────────────────────────────────────────────────────

fn time_is_flowing(cycle: Res<DayCycle>) -> bool {
    cycle.time_active && !cycle.breaker_tripped
}

// ─── Pure scheduler logic ─────────────────────────────────────────────────────

/// What happened to the cycle during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleSignal {
    PhaseChanged { from: TimePhase, to: TimePhase },
    BreakerTripped,
}

/// Advances the cycle by `delta` seconds. At most one phase boundary is crossed
/// per call; time past the boundary is discarded.
pub fn advance_cycle(
    cycle: &mut DayCycle,
    durations: &PhaseDurations,
    delta: f32,
) -> Option<CycleSignal> {
    if !cycle.time_active || cycle.breaker_tripped {
        return None;
    }

    cycle.elapsed += delta;
    if cycle.elapsed < durations.for_phase(cycle.phase) {
        return None;
    }

    if cycle.phase == TimePhase::Dawn {
        cycle.elapsed = durations.for_phase(TimePhase::Dawn);
        cycle.time_active = false;
        cycle.breaker_tripped = true;
        return Some(CycleSignal::BreakerTripped);
    }

    let from = cycle.phase;
    cycle.phase = from.next();
    cycle.elapsed = 0.0;
    Some(CycleSignal::PhaseChanged {
        from,
        to: cycle.phase,
    })
}

/// Resets a tripped breaker and moves dawn on to day.
/// Returns `None` (and changes nothing) unless the breaker tripped at dawn.
pub fn reset_breaker(cycle: &mut DayCycle) -> Option<CycleSignal> {
    if cycle.phase != TimePhase::Dawn || !cycle.breaker_tripped {
        return None;
    }
    cycle.breaker_tripped = false;
    cycle.time_active = true;
    cycle.phase = TimePhase::Day;
    cycle.elapsed = 0.0;
    cycle.cycle_count += 1;
    Some(CycleSignal::PhaseChanged {
        from: TimePhase::Dawn,
        to: TimePhase::Day,
    })
}

/// Pauses or resumes time. A tripped breaker keeps time stopped.
pub fn toggle_time_flow(cycle: &mut DayCycle) -> bool {
    if cycle.breaker_tripped {
        return false;
    }
    cycle.time_active = !cycle.time_active;
    true
}

// ─── Systems ──────────────────────────────────────────────────────────────────

fn tick_day_cycle(
    time: Res<Time>,
    config: Res<GameConfig>,
    mut cycle: ResMut<DayCycle>,
    mut progress_writer: EventWriter<PhaseProgressEvent>,
    mut phase_writer: EventWriter<PhaseChangedEvent>,
    mut breaker_writer: EventWriter<BreakerTrippedEvent>,
) {
    let signal = advance_cycle(&mut cycle, &config.phases, time.delta_secs());

    match signal {
        Some(CycleSignal::PhaseChanged { from, to }) => {
            info!("[Time] {:?} -> {:?} (cycle {})", from, to, cycle.cycle_count);
            phase_writer.send(PhaseChangedEvent { from, to });
        }
        Some(CycleSignal::BreakerTripped) => {
            info!("[Time] Dawn is over: breaker tripped, time stopped");
            breaker_writer.send(BreakerTrippedEvent);
        }
        None => {}
    }

    progress_writer.send(PhaseProgressEvent {
        phase: cycle.phase,
        progress: cycle.progress(&config.phases),
    });
}

fn handle_breaker_reset(
    mut events: EventReader<ResetBreakerEvent>,
    mut cycle: ResMut<DayCycle>,
    mut phase_writer: EventWriter<PhaseChangedEvent>,
) {
    for _ in events.read() {
        match reset_breaker(&mut cycle) {
            Some(CycleSignal::PhaseChanged { from, to }) => {
                info!("[Time] Breaker reset. New day begins (cycle {})", cycle.cycle_count);
                phase_writer.send(PhaseChangedEvent { from, to });
            }
            _ => {
                info!(
                    "[Time] Breaker reset ignored: {:?}, tripped={}",
                    cycle.phase, cycle.breaker_tripped
                );
            }
        }
    }
}

fn handle_time_toggle(
    mut events: EventReader<ToggleTimeFlowEvent>,
    config: Res<GameConfig>,
    mut cycle: ResMut<DayCycle>,
) {
    for _ in events.read() {
        if toggle_time_flow(&mut cycle) {
            info!("[Time] {}", cycle.phase_info(&config.phases));
        } else {
            warn!("[Time] Cannot toggle time while the breaker is tripped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn durations() -> PhaseDurations {
        PhaseDurations::default()
    }

    #[test]
    fn test_starts_in_day_with_time_flowing() {
        let cycle = DayCycle::default();
        assert_eq!(cycle.phase, TimePhase::Day);
        assert!(cycle.time_active);
        assert!(!cycle.breaker_tripped);
        assert_eq!(cycle.progress(&durations()), 0.0);
    }

    #[test]
    fn test_phase_order_day_dusk_night_dawn() {
        let d = durations();
        let mut cycle = DayCycle::default();
        let mut seen = vec![cycle.phase];
        for _ in 0..3 {
            let step = d.for_phase(cycle.phase);
            let signal = advance_cycle(&mut cycle, &d, step);
            assert!(matches!(signal, Some(CycleSignal::PhaseChanged { .. })));
            seen.push(cycle.phase);
        }
        assert_eq!(
            seen,
            vec![TimePhase::Day, TimePhase::Dusk, TimePhase::Night, TimePhase::Dawn]
        );
    }

    #[test]
    fn test_progress_is_fraction_and_clamped() {
        let d = durations();
        let mut cycle = DayCycle::default();
        advance_cycle(&mut cycle, &d, 360.0);
        assert!((cycle.progress(&d) - 0.5).abs() < 1e-6);
        assert!((cycle.remaining_seconds(&d) - 360.0).abs() < 1e-3);

        cycle.elapsed = 10_000.0;
        assert_eq!(cycle.progress(&d), 1.0);
    }

    #[test]
    fn test_leftover_time_is_discarded_on_rollover() {
        let d = durations();
        let mut cycle = DayCycle::default();
        advance_cycle(&mut cycle, &d, 900.0);
        assert_eq!(cycle.phase, TimePhase::Dusk);
        assert_eq!(cycle.elapsed, 0.0);
    }

    #[test]
    fn test_dawn_trips_breaker_and_stops_time() {
        let d = durations();
        let mut cycle = DayCycle {
            phase: TimePhase::Dawn,
            ..Default::default()
        };
        assert_eq!(advance_cycle(&mut cycle, &d, 100.0), None);
        assert_eq!(
            advance_cycle(&mut cycle, &d, 200.0),
            Some(CycleSignal::BreakerTripped)
        );
        assert_eq!(cycle.phase, TimePhase::Dawn);
        assert!(cycle.breaker_tripped);
        assert!(!cycle.time_active);
        assert_eq!(cycle.progress(&d), 1.0);

        // Stopped time stays stopped.
        assert_eq!(advance_cycle(&mut cycle, &d, 1000.0), None);
        assert_eq!(cycle.phase, TimePhase::Dawn);
    }

    #[test]
    fn test_reset_breaker_only_from_tripped_dawn() {
        let mut cycle = DayCycle::default();
        assert_eq!(reset_breaker(&mut cycle), None);

        cycle.phase = TimePhase::Dawn;
        assert_eq!(reset_breaker(&mut cycle), None, "dawn but breaker not tripped");

        cycle.breaker_tripped = true;
        cycle.time_active = false;
        assert_eq!(
            reset_breaker(&mut cycle),
            Some(CycleSignal::PhaseChanged {
                from: TimePhase::Dawn,
                to: TimePhase::Day
            })
        );
        assert_eq!(cycle.phase, TimePhase::Day);
        assert!(cycle.time_active);
        assert!(!cycle.breaker_tripped);
        assert_eq!(cycle.cycle_count, 1);
    }

    #[test]
    fn test_toggle_pauses_and_resumes() {
        let d = durations();
        let mut cycle = DayCycle::default();
        assert!(toggle_time_flow(&mut cycle));
        assert!(!cycle.time_active);
        assert_eq!(advance_cycle(&mut cycle, &d, 5000.0), None);
        assert_eq!(cycle.elapsed, 0.0);
        assert!(toggle_time_flow(&mut cycle));
        assert!(cycle.time_active);

        cycle.breaker_tripped = true;
        assert!(!toggle_time_flow(&mut cycle));
    }

    #[test]
    fn test_total_cycle_duration() {
        assert_eq!(durations().total_cycle_duration(), 1920.0);
    }

    #[test]
    fn test_phase_info_mentions_phase_and_status() {
        let d = durations();
        let mut cycle = DayCycle::default();
        assert!(cycle.phase_info(&d).starts_with("Day 0%"));
        cycle.time_active = false;
        assert!(cycle.phase_info(&d).contains("paused"));
    }
}
