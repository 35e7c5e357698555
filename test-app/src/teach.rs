// Teach/playback demo for two servos.
//
// In teach mode the servos are unloaded so they can be posed by hand; each
// `Record` captures both positions into the next of four slots. Toggling
// back to playback holds the current pose, and `Record` then replays the
// four slots one per tick.
//
// The state machine is pure: `step` never touches the bus. It returns the
// actions to perform, and `execute` carries them out against a `ServoBus`.

use anyhow::Result;
use tracing::{debug, info};

use lobot::{POSITION_READ_FAILED, ServoBus};

/// Number of recorded poses.
pub const SLOTS: usize = 4;

/// Servo addresses driven by the demo.
pub const SERVO_IDS: [u8; 2] = [1, 2];

/// Move time for each replayed pose.
pub const PLAYBACK_MOVE_MS: u16 = 500;

/// Move time used to lock the servos in place when leaving teach mode.
pub const HOLD_MOVE_MS: u16 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Playback,
    Teach,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeachPlayback {
    pub mode: Mode,
    pub step: usize,
    pub poses: [[i16; 2]; SLOTS],
    pub running: bool,
}

impl Default for TeachPlayback {
    fn default() -> Self {
        TeachPlayback {
            mode: Mode::Playback,
            step: 0,
            poses: [[100, 100], [200, 200], [300, 300], [400, 400]],
            running: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Start playback, or capture a pose while teaching.
    Record,
    /// Switch between playback and teach mode.
    Toggle,
    /// Playback clock.
    Tick,
    /// Positions read back for a `Capture` action.
    Captured { slot: usize, positions: [i16; 2] },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move { id: u8, position: i16, time_ms: u16 },
    Unload { id: u8 },
    /// Read both servo positions and feed them back as `Input::Captured`.
    Capture { slot: usize },
    /// Read the servo's position and command it to stay there.
    HoldCurrent { id: u8 },
}

pub fn step(mut state: TeachPlayback, input: Input) -> (TeachPlayback, Vec<Action>) {
    let mut actions = Vec::new();

    match (state.mode, input) {
        (_, Input::Captured { slot, positions }) => {
            if let Some(pose) = state.poses.get_mut(slot) {
                // Keep the previous value for a servo that did not answer.
                for (stored, read) in pose.iter_mut().zip(positions) {
                    if read != POSITION_READ_FAILED {
                        *stored = read;
                    }
                }
            }
        }

        (Mode::Playback, Input::Record) => {
            state.running = true;
            state.step = 0;
        }
        (Mode::Playback, Input::Toggle) => {
            actions.extend(SERVO_IDS.map(|id| Action::Unload { id }));
            state.mode = Mode::Teach;
            state.step = 0;
            state.running = false;
        }
        (Mode::Playback, Input::Tick) => {
            if state.running {
                let pose = state.poses[state.step];
                for (id, position) in SERVO_IDS.into_iter().zip(pose) {
                    actions.push(Action::Move {
                        id,
                        position,
                        time_ms: PLAYBACK_MOVE_MS,
                    });
                }
                state.step += 1;
                if state.step == SLOTS {
                    state.step = 0;
                    state.running = false;
                }
            }
        }

        (Mode::Teach, Input::Record) => {
            actions.push(Action::Capture { slot: state.step });
            state.step = (state.step + 1) % SLOTS;
        }
        (Mode::Teach, Input::Toggle) => {
            actions.extend(SERVO_IDS.map(|id| Action::HoldCurrent { id }));
            state.mode = Mode::Playback;
            state.step = 0;
        }
        (Mode::Teach, Input::Tick) => {}
    }

    (state, actions)
}

/// Feed one input through the state machine and run the resulting actions.
///
/// Capture results are fed back in before returning.
pub async fn drive(bus: &mut ServoBus, state: TeachPlayback, input: Input) -> Result<TeachPlayback> {
    let (mut state, actions) = step(state, input);
    for action in actions {
        if let Some(feedback) = execute(bus, action).await? {
            let (next, more) = step(state, feedback);
            debug_assert!(more.is_empty());
            state = next;
        }
    }
    Ok(state)
}

async fn execute(bus: &mut ServoBus, action: Action) -> Result<Option<Input>> {
    debug!(?action, "execute");
    match action {
        Action::Move {
            id,
            position,
            time_ms,
        } => bus.move_to(id, position, time_ms).await?,
        Action::Unload { id } => bus.unload(id).await?,
        Action::Capture { slot } => {
            let mut positions = [POSITION_READ_FAILED; 2];
            for (position, id) in positions.iter_mut().zip(SERVO_IDS) {
                *position = bus.read_position(id).await;
            }
            info!(slot, ?positions, "pose recorded");
            return Ok(Some(Input::Captured { slot, positions }));
        }
        Action::HoldCurrent { id } => {
            let position = bus.read_position(id).await;
            if position == POSITION_READ_FAILED {
                debug!(id, "no position reply, not holding");
            } else {
                bus.move_to(id, position, HOLD_MOVE_MS).await?;
            }
        }
    }
    Ok(None)
}
