//! Terminal pad runner (default binary).
//!
//! Synchronous event loop: render, poll input, apply, repeat. Mouse clicks
//! place the shape directly; the keyboard drives a placement cursor. The
//! remote control adapter (if enabled) is drained once per tick.

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, MouseButton, MouseEventKind};

use tui_tpad::adapter::{
    build_observation, create_ack, create_error, Adapter, ClientCommand, ErrorCode,
    InboundCommand, InboundPayload, OutboundMessage, PadDescriptor, PadName,
};
use tui_tpad::core::{PadSession, PadSnapshot, PassGate};
use tui_tpad::input::{should_quit, CursorDir, InputHandler, PadAction};
use tui_tpad::term::{PadView, TerminalRenderer, ViewModel, Viewport};
use tui_tpad::types::{PadId, DEFAULT_PAD_SIZE, MAX_PAD_SIZE, MIN_PAD_SIZE, TICK_MS, VAULT_PAD_SIZE};

/// Interactive state owned by the event loop.
struct App {
    primary: PadSession,
    vault: PadSession,
    gate: PassGate,
    focus: PadId,
    /// Keyboard placement cursor on the focused pad, as (row, col)
    cursor: (i8, i8),
    /// Passcode entry buffer for the locked vault
    entry: String,
}

impl App {
    fn new(primary_size: u8) -> Self {
        Self {
            primary: PadSession::new(primary_size),
            vault: PadSession::new(VAULT_PAD_SIZE),
            gate: PassGate::new(),
            focus: PadId::Primary,
            cursor: (0, 1),
            entry: String::new(),
        }
    }

    fn session(&self, pad: PadId) -> &PadSession {
        match pad {
            PadId::Primary => &self.primary,
            PadId::Vault => &self.vault,
        }
    }

    fn session_mut(&mut self, pad: PadId) -> &mut PadSession {
        match pad {
            PadId::Primary => &mut self.primary,
            PadId::Vault => &mut self.vault,
        }
    }

    /// True while the locked vault has keyboard focus (digits edit the code).
    fn in_entry_mode(&self) -> bool {
        self.focus == PadId::Vault && !self.gate.unlocked()
    }

    fn clamp_cursor(&mut self) {
        let max = self.session(self.focus).size() as i8 - 1;
        self.cursor.0 = self.cursor.0.clamp(0, max);
        self.cursor.1 = self.cursor.1.clamp(0, max);
    }

    fn apply_action(&mut self, action: PadAction) {
        match action {
            PadAction::Move(dir) => {
                match dir {
                    CursorDir::Up => self.cursor.0 -= 1,
                    CursorDir::Down => self.cursor.0 += 1,
                    CursorDir::Left => self.cursor.1 -= 1,
                    CursorDir::Right => self.cursor.1 += 1,
                }
                self.clamp_cursor();
            }
            PadAction::Place => {
                let (row, col) = self.cursor;
                let focus = self.focus;
                // Rejection is silent; the board simply stays unchanged.
                self.session_mut(focus).place(row, col);
            }
            PadAction::RotateCw => {
                let focus = self.focus;
                self.session_mut(focus).rotate_cw();
            }
            PadAction::RotateCcw => {
                let focus = self.focus;
                self.session_mut(focus).rotate_ccw();
            }
            PadAction::Undo => {
                let focus = self.focus;
                self.session_mut(focus).undo();
            }
            PadAction::Redo => {
                let focus = self.focus;
                self.session_mut(focus).redo();
            }
            PadAction::Reset => {
                let focus = self.focus;
                self.session_mut(focus).reset();
            }
            PadAction::SwitchPad => {
                self.focus = self.focus.other();
                self.clamp_cursor();
            }
        }
    }

    /// A mouse click on a pad cell: focus the pad and place there.
    fn handle_click(&mut self, pad: PadId, row: i8, col: i8) {
        self.focus = pad;
        self.cursor = (row, col);
        self.clamp_cursor();

        if pad == PadId::Vault && !self.gate.unlocked() {
            // Clicking the locked vault only moves focus to the code field.
            return;
        }
        self.session_mut(pad).place(row, col);
    }

    /// Keystroke while the locked vault is focused.
    fn handle_entry_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if self.entry.len() < 4 {
                    self.entry.push(c);
                }
            }
            KeyCode::Backspace => {
                self.entry.pop();
            }
            KeyCode::Enter => {
                self.gate.try_unlock(&self.entry);
                self.entry.clear();
            }
            KeyCode::Tab => {
                self.focus = self.focus.other();
                self.clamp_cursor();
            }
            _ => {}
        }
    }

    /// Apply a remote command; Err carries the protocol error to report.
    fn apply_client_command(
        &mut self,
        cmd: &ClientCommand,
    ) -> Result<bool, (ErrorCode, &'static str)> {
        match cmd {
            ClientCommand::Op { pad, op } => {
                if *pad == PadId::Vault && !self.gate.unlocked() {
                    return Err((ErrorCode::PadLocked, "Unlock the vault first"));
                }
                Ok(self.session_mut(*pad).apply(*op))
            }
            ClientCommand::Unlock { code } => {
                if self.gate.try_unlock(code) {
                    Ok(true)
                } else {
                    Err((ErrorCode::BadCode, "wrong code, try again"))
                }
            }
        }
    }

    fn pad_descriptors(&self) -> [PadDescriptor; 2] {
        [
            PadDescriptor {
                pad: PadName::Primary,
                size: self.primary.size(),
                locked: false,
            },
            PadDescriptor {
                pad: PadName::Vault,
                size: self.vault.size(),
                locked: !self.gate.unlocked(),
            },
        ]
    }
}

fn primary_size_from_env() -> u8 {
    std::env::var("TPAD_SIZE")
        .ok()
        .and_then(|s| s.parse::<u8>().ok())
        .map(|n| n.clamp(MIN_PAD_SIZE, MAX_PAD_SIZE))
        .unwrap_or(DEFAULT_PAD_SIZE)
}

fn main() -> Result<()> {
    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = run(&mut term);

    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

fn run(term: &mut TerminalRenderer) -> Result<()> {
    let mut app = App::new(primary_size_from_env());
    let mut adapter = Adapter::start_from_env(app.pad_descriptors());

    let view = PadView::default();
    let mut input_handler = InputHandler::new();

    let mut last_tick = Instant::now();
    let tick_duration = Duration::from_millis(TICK_MS as u64);

    let mut obs_seq: u64 = 0;
    let mut snapshot = PadSnapshot::default();
    let mut last_broadcast = observable_state(&app);

    loop {
        // Render.
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        let viewport = Viewport::new(w, h);
        let vm = ViewModel {
            primary: &app.primary,
            vault: &app.vault,
            gate: &app.gate,
            focus: app.focus,
            cursor: app.cursor,
            entry: &app.entry,
        };
        let mut fb = view.render(&vm, viewport);
        term.draw_swap(&mut fb)?;

        // Input with timeout until next tick.
        let timeout = tick_duration
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => match key.kind {
                    KeyEventKind::Press => {
                        if should_quit(key) {
                            return Ok(());
                        }
                        if app.in_entry_mode() {
                            app.handle_entry_key(key.code);
                        } else if let Some(action) = input_handler.handle_key_press(key.code) {
                            app.apply_action(action);
                        }
                    }
                    KeyEventKind::Repeat => {
                        // Ignore terminal auto-repeat; DAS/ARR handles repeats.
                    }
                    KeyEventKind::Release => {
                        input_handler.handle_key_release(key.code);
                    }
                },
                Event::Mouse(me) => {
                    if let MouseEventKind::Down(MouseButton::Left) = me.kind {
                        if let Some((pad, row, col)) = view.hit_test(
                            app.primary.size(),
                            app.vault.size(),
                            viewport,
                            me.column,
                            me.row,
                        ) {
                            app.handle_click(pad, row, col);
                        }
                    }
                }
                Event::Resize(_, _) => {
                    term.invalidate();
                }
                _ => {}
            }
        }

        // Tick.
        if last_tick.elapsed() >= tick_duration {
            last_tick = Instant::now();

            for action in input_handler.update(TICK_MS) {
                app.apply_action(action);
            }

            if let Some(adapter) = adapter.as_mut() {
                while let Some(cmd) = adapter.try_recv() {
                    handle_inbound(adapter, &mut app, cmd, &mut snapshot, &mut obs_seq);
                }

                let state = observable_state(&app);
                if state != last_broadcast {
                    last_broadcast = state;
                    broadcast_pads(adapter, &app, &mut snapshot, &mut obs_seq);
                }
            }
        }
    }
}

/// Everything the adapter observes, condensed for change detection.
fn observable_state(app: &App) -> (u32, u32, bool) {
    (
        app.primary.revision(),
        app.vault.revision(),
        app.gate.unlocked(),
    )
}

fn handle_inbound(
    adapter: &Adapter,
    app: &mut App,
    cmd: InboundCommand,
    snapshot: &mut PadSnapshot,
    obs_seq: &mut u64,
) {
    match cmd.payload {
        InboundPayload::SnapshotRequest => {
            for pad in [PadId::Primary, PadId::Vault] {
                snapshot.copy_from(app.session(pad));
                *obs_seq += 1;
                let obs = build_observation(snapshot, pad, !app.gate.unlocked(), *obs_seq);
                adapter.send(OutboundMessage::Observation {
                    client_id: cmd.client_id,
                    obs,
                });
            }
        }
        InboundPayload::Command(ref client_cmd) => match app.apply_client_command(client_cmd) {
            Ok(applied) => {
                adapter.send(OutboundMessage::Ack {
                    client_id: cmd.client_id,
                    ack: create_ack(cmd.seq, applied),
                });
            }
            Err((code, message)) => {
                adapter.send(OutboundMessage::Error {
                    client_id: cmd.client_id,
                    err: create_error(cmd.seq, code, message),
                });
            }
        },
    }
}

fn broadcast_pads(adapter: &Adapter, app: &App, snapshot: &mut PadSnapshot, obs_seq: &mut u64) {
    for pad in [PadId::Primary, PadId::Vault] {
        snapshot.copy_from(app.session(pad));
        *obs_seq += 1;
        let obs = build_observation(snapshot, pad, !app.gate.unlocked(), *obs_seq);
        adapter.send(OutboundMessage::Broadcast { obs });
    }
}
