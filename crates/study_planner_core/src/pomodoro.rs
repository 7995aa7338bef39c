//! crates/study_planner_core/src/pomodoro.rs
//!
//! The focus / break cycle of the pomodoro timer.

use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::domain::UserSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub enum PomodoroPhase {
    Focus,
    ShortBreak,
    LongBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PhasePlan {
    pub phase: PomodoroPhase,
    pub minutes: i32,
    /// Whether the client should start this phase without waiting for the user.
    pub auto_start: bool,
}

pub fn phase_minutes(settings: &UserSettings, phase: PomodoroPhase) -> i32 {
    match phase {
        PomodoroPhase::Focus => settings.focus_duration,
        PomodoroPhase::ShortBreak => settings.short_break_duration,
        PomodoroPhase::LongBreak => settings.long_break_duration,
    }
}

/// The phase that follows `current`. `completed_focus_sessions` counts focus
/// blocks finished so far, including the one that just ended.
pub fn next_phase(
    settings: &UserSettings,
    completed_focus_sessions: u32,
    current: PomodoroPhase,
) -> PhasePlan {
    let phase = match current {
        PomodoroPhase::Focus => {
            let every = settings.sessions_before_long_break.max(1) as u32;
            if completed_focus_sessions > 0 && completed_focus_sessions % every == 0 {
                PomodoroPhase::LongBreak
            } else {
                PomodoroPhase::ShortBreak
            }
        }
        PomodoroPhase::ShortBreak | PomodoroPhase::LongBreak => PomodoroPhase::Focus,
    };
    PhasePlan {
        phase,
        minutes: phase_minutes(settings, phase),
        // Breaks start on their own when auto-break is on; focus always waits.
        auto_start: settings.auto_break && phase != PomodoroPhase::Focus,
    }
}
