use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;

use strata::simulation::{Buttons, Frontend, InputSample};

use crate::world::ClientWorld;

const TURN_STEP: f32 = 0.08;
const STATUS_INTERVAL_FRAMES: u64 = 120;

/// Terminal-based stand-in for a real render and input layer. Keys are
/// sampled without blocking; the terminal raw mode is restored on drop.
///
/// Terminals report key presses but not releases, so a movement key counts as
/// held for the one frame its event arrives in.
pub struct ConsoleFrontend {
    buttons: Buttons,
    yaw: f32,
    pitch: f32,
    close: bool,
    frames: u64,
}

impl ConsoleFrontend {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self {
            buttons: Buttons::empty(),
            yaw: 0.0,
            pitch: 0.0,
            close: false,
            frames: 0,
        })
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.close = true;
            return;
        }

        match key.code {
            KeyCode::Char('w') => self.buttons |= Buttons::FORWARD,
            KeyCode::Char('s') => self.buttons |= Buttons::BACK,
            KeyCode::Char('a') => self.buttons |= Buttons::LEFT,
            KeyCode::Char('d') => self.buttons |= Buttons::RIGHT,
            KeyCode::Char(' ') => self.buttons |= Buttons::JUMP,
            KeyCode::Char('z') => self.buttons |= Buttons::SNEAK,
            KeyCode::Left => self.yaw -= TURN_STEP,
            KeyCode::Right => self.yaw += TURN_STEP,
            KeyCode::Up => self.pitch += TURN_STEP,
            KeyCode::Down => self.pitch -= TURN_STEP,
            KeyCode::Char('q') | KeyCode::Esc => self.close = true,
            _ => {}
        }
    }
}

impl Drop for ConsoleFrontend {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Frontend<ClientWorld> for ConsoleFrontend {
    fn sample(&mut self) -> InputSample {
        self.buttons = Buttons::empty();
        while event::poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.handle_key(key);
            }
        }
        InputSample {
            buttons: self.buttons,
            yaw: self.yaw,
            pitch: self.pitch,
        }
    }

    fn present(&mut self, world: &ClientWorld, alpha: f32) {
        self.frames += 1;
        if self.frames % STATUS_INTERVAL_FRAMES == 0 {
            let pos = world.render_position(alpha);
            log::info!(
                "pos ({:.1}, {:.1}, {:.1}) | {} players | {} chunks",
                pos.x,
                pos.y,
                pos.z,
                world.players.len(),
                world.chunks.len(),
            );
        }
    }

    fn close_requested(&mut self) -> bool {
        self.close
    }
}
