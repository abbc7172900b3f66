//! App: terminal init, main loop, engine stepping and input handling.

use crate::fx::Effects;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::{Args, Difficulty, GameMode};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use gemtui::engine::{Engine, EngineEvent, GemKind, Pos, SelectOutcome};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    GameOver,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    MainMenu,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    TimeUp,
    OutOfMoves,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTab {
    Difficulty,
    Mode,
    Start,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState {
    pub current_tab: MenuTab,
    pub selected_difficulty: Difficulty,
    pub selected_mode: GameMode,
    pub animation_start: Instant,
}

impl MenuState {
    fn new(difficulty: Difficulty, mode: GameMode) -> Self {
        Self {
            current_tab: MenuTab::Difficulty,
            selected_difficulty: difficulty,
            selected_mode: mode,
            animation_start: Instant::now(),
        }
    }

    fn cycle_choice(&mut self, forward: bool) {
        match self.current_tab {
            MenuTab::Difficulty => {
                let all = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];
                self.selected_difficulty = cycle(&all, self.selected_difficulty, forward);
            }
            MenuTab::Mode => {
                let all = [GameMode::Endless, GameMode::Timed, GameMode::Moves];
                self.selected_mode = cycle(&all, self.selected_mode, forward);
            }
            MenuTab::Start => {}
        }
    }

    fn cycle_tab(&mut self, forward: bool) {
        let all = [MenuTab::Difficulty, MenuTab::Mode, MenuTab::Start];
        self.current_tab = cycle(&all, self.current_tab, forward);
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let i = all.iter().position(|&x| x == current).unwrap_or(0);
    let n = all.len();
    if forward { all[(i + 1) % n] } else { all[(i + n - 1) % n] }
}

pub struct App {
    args: Args,
    theme: Theme,
    engine: Engine,
    difficulty: Difficulty,
    mode: GameMode,
    screen: Screen,
    paused: bool,
    /// Time spent playing, excluding pauses and menus.
    play_time: Duration,
    game_over_reason: Option<GameOverReason>,
    cursor: Pos,
    hint: Option<(Pos, Pos)>,
    effects: Effects,
    /// Board rect from the last frame, for mouse hit-testing.
    board_rect: Option<Rect>,
    menu_state: MenuState,
    quit_selected: QuitOption,
    /// Best score this process has seen; never written to disk.
    best_score: u32,
    best_at_start: u32,
    sessions: u64,
    last_frame: Instant,
}

impl App {
    pub fn new(args: Args, theme: Theme) -> Result<Self> {
        let difficulty = args.difficulty;
        let mode = args.mode;
        let engine = new_engine(&args, difficulty, 0)?;
        let screen = if args.no_menu {
            Screen::Playing
        } else {
            Screen::Menu
        };
        Ok(Self {
            effects: Effects::new(!args.no_animation),
            menu_state: MenuState::new(difficulty, mode),
            args,
            theme,
            engine,
            difficulty,
            mode,
            screen,
            paused: false,
            play_time: Duration::ZERO,
            game_over_reason: None,
            cursor: Pos::new(0, 0),
            hint: None,
            board_rect: None,
            quit_selected: QuitOption::Resume,
            best_score: 0,
            best_at_start: 0,
            sessions: 0,
            last_frame: Instant::now(),
        })
    }

    /// Start a fresh board with the current difficulty and mode.
    fn reset_game(&mut self) -> Result<()> {
        self.sessions += 1;
        self.engine = new_engine(&self.args, self.difficulty, self.sessions)?;
        self.screen = Screen::Playing;
        self.paused = false;
        self.play_time = Duration::ZERO;
        self.game_over_reason = None;
        self.cursor = Pos::new(0, 0);
        self.hint = None;
        self.effects.clear();
        self.best_at_start = self.best_score;
        log::info!(
            "session {} started: {:?}, {:?}",
            self.sessions,
            self.mode,
            self.difficulty
        );
        Ok(())
    }

    fn palette(&self) -> &'static [GemKind] {
        GemKind::palette(self.engine.config().gem_kinds)
    }

    fn time_left(&self) -> Option<Duration> {
        (self.mode == GameMode::Timed)
            .then(|| Duration::from_secs(self.args.time_limit as u64).saturating_sub(self.play_time))
    }

    fn moves_left(&self) -> Option<u32> {
        (self.mode == GameMode::Moves)
            .then(|| self.args.move_limit.saturating_sub(self.engine.summary().moves))
    }

    fn record_score(&mut self) {
        self.best_score = self.best_score.max(self.engine.summary().score);
    }

    /// Limited sessions end only once the board has settled.
    fn check_session_end(&mut self) {
        if !self.engine.is_input_enabled() {
            return;
        }
        let reason = if self.time_left() == Some(Duration::ZERO) {
            Some(GameOverReason::TimeUp)
        } else if self.moves_left() == Some(0) {
            Some(GameOverReason::OutOfMoves)
        } else {
            None
        };
        if let Some(reason) = reason {
            self.record_score();
            let summary = self.engine.summary();
            log::info!(
                "session {} over ({reason:?}): score {}, best chain {}, moves {}",
                self.sessions,
                summary.score,
                summary.max_combo,
                summary.moves
            );
            self.game_over_reason = Some(reason);
            self.screen = Screen::GameOver;
        }
    }

    fn leave_to_menu(&mut self) {
        let summary = self.engine.abort();
        self.record_score();
        self.effects.clear();
        self.hint = None;
        log::info!(
            "session {} abandoned: score {}, moves {}",
            self.sessions,
            summary.score,
            summary.moves
        );
        self.menu_state = MenuState::new(self.difficulty, self.mode);
        self.screen = Screen::Menu;
    }

    fn move_cursor(&mut self, d_row: isize, d_col: isize) {
        let grid = self.engine.grid();
        if let Some(next) = self.cursor.offset(d_row, d_col).filter(|&p| grid.contains(p)) {
            self.cursor = next;
        }
    }

    fn select(&mut self, pos: Pos) {
        self.cursor = pos;
        let outcome = self.engine.select(pos);
        if !matches!(outcome, SelectOutcome::Ignored) {
            self.hint = None;
        }
        log::trace!("select {pos}: {outcome:?}");
    }

    fn on_engine_events(&mut self, events: &[EngineEvent]) {
        for event in events {
            self.effects.on_event(event);
            if let EngineEvent::Reshuffled { playable } = event {
                log::info!("no moves left, board reshuffled (playable: {playable})");
            }
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode, size},
        };

        let (cols, rows) = size()?;
        let config = self.engine.config();
        let (need_cols, need_rows) = crate::ui::min_terminal_size(config.rows, config.cols);
        if cols < need_cols || rows < need_rows {
            log::warn!("terminal {cols}x{rows} is smaller than {need_cols}x{need_rows}, board will be clipped");
        }

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal = DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        if self.screen == Screen::Playing {
            self.reset_game()?;
        }
        let result = self.run_loop(&mut terminal);

        let restored = execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)
            .and_then(|()| disable_raw_mode());
        if let Err(err) = &restored {
            log::error!("failed to restore terminal: {err}");
        }
        log::info!("exiting, best score {}", self.best_score);
        result?;
        restored.context("failed to restore terminal")
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.args.frame_rate.max(1.0));
        self.last_frame = Instant::now();
        loop {
            let now = Instant::now();
            let dt = now.saturating_duration_since(self.last_frame);
            self.last_frame = now;

            if self.screen == Screen::Playing && !self.paused {
                self.play_time += dt;
                let events = self.engine.step(dt);
                self.on_engine_events(&events);
                self.record_score();
                self.check_session_end();
            }
            self.effects.tick(dt);

            let view = self.engine.snapshot();
            let ctx = crate::ui::DrawContext {
                screen: self.screen,
                theme: &self.theme,
                view: &view,
                menu: &self.menu_state,
                quit_selected: self.quit_selected,
                mode: self.mode,
                difficulty: self.difficulty,
                palette: self.palette(),
                cursor: self.cursor,
                hint: self.hint,
                paused: self.paused,
                time_left: self.time_left(),
                moves_left: self.moves_left(),
                best_score: self.best_score,
                new_best: self.best_score > self.best_at_start && self.best_score == view.score,
                game_over_reason: self.game_over_reason,
                now,
            };
            let effects = &mut self.effects;
            let mut board = None;
            terminal.draw(|f| board = crate::ui::draw(f, &ctx, effects, dt))?;
            self.board_rect = board;

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if !event::poll(timeout)? {
                continue;
            }
            while event::poll(Duration::ZERO)? {
                let keep_running = match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_action(key_to_action(key))?
                    }
                    Event::Mouse(mouse) => {
                        self.handle_mouse(mouse);
                        true
                    }
                    _ => true,
                };
                if !keep_running {
                    return Ok(());
                }
            }
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.screen != Screen::Playing || self.paused {
            return;
        }
        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
            let Some(board) = self.board_rect else {
                return;
            };
            let grid = self.engine.grid();
            if let Some(pos) = crate::ui::cell_at(board, grid.rows(), grid.cols(), mouse.column, mouse.row) {
                self.select(pos);
            }
        }
    }

    /// Returns false when the app should exit.
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        match self.screen {
            Screen::Menu => match action {
                Action::Quit => return Ok(false),
                Action::Left => self.menu_state.cycle_choice(false),
                Action::Right => self.menu_state.cycle_choice(true),
                Action::Up => self.menu_state.cycle_tab(false),
                Action::Down => self.menu_state.cycle_tab(true),
                Action::Select => {
                    if self.menu_state.current_tab == MenuTab::Start {
                        self.difficulty = self.menu_state.selected_difficulty;
                        self.mode = self.menu_state.selected_mode;
                        self.reset_game()?;
                    } else {
                        self.menu_state.current_tab = MenuTab::Start;
                    }
                }
                _ => {}
            },
            Screen::Playing if self.paused => match action {
                Action::Pause => self.paused = false,
                Action::Quit => {
                    self.screen = Screen::QuitMenu;
                    self.quit_selected = QuitOption::Resume;
                }
                _ => {}
            },
            Screen::Playing => match action {
                Action::Pause => self.paused = true,
                Action::Quit => {
                    self.screen = Screen::QuitMenu;
                    self.quit_selected = QuitOption::Resume;
                }
                Action::Up => self.move_cursor(-1, 0),
                Action::Down => self.move_cursor(1, 0),
                Action::Left => self.move_cursor(0, -1),
                Action::Right => self.move_cursor(0, 1),
                Action::Select => self.select(self.cursor),
                Action::Hint => {
                    self.hint = self.engine.hint();
                    log::debug!("hint: {:?}", self.hint);
                }
                Action::Restart | Action::None => {}
            },
            Screen::QuitMenu => match action {
                Action::Down | Action::Right => {
                    let all = [QuitOption::Resume, QuitOption::MainMenu, QuitOption::Exit];
                    self.quit_selected = cycle(&all, self.quit_selected, true);
                }
                Action::Up | Action::Left => {
                    let all = [QuitOption::Resume, QuitOption::MainMenu, QuitOption::Exit];
                    self.quit_selected = cycle(&all, self.quit_selected, false);
                }
                Action::Select => match self.quit_selected {
                    QuitOption::Resume => self.screen = Screen::Playing,
                    QuitOption::MainMenu => self.leave_to_menu(),
                    QuitOption::Exit => {
                        self.leave_to_menu();
                        return Ok(false);
                    }
                },
                Action::Pause | Action::Quit => self.screen = Screen::Playing,
                _ => {}
            },
            Screen::GameOver => match action {
                Action::Quit => return Ok(false),
                Action::Restart => self.reset_game()?,
                _ => {}
            },
        }
        Ok(true)
    }
}

/// Engine for one session. A fixed `--seed` is offset per session so restarts differ but
/// a whole run stays reproducible.
fn new_engine(args: &Args, difficulty: Difficulty, session: u64) -> Result<Engine> {
    let seed = match args.seed {
        Some(seed) => seed.wrapping_add(session),
        None => rand::random(),
    };
    log::debug!("board seed {seed}");
    Engine::new(args.engine_config(difficulty), seed).context("cannot start a board")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_wraps_both_ways() {
        let all = [MenuTab::Difficulty, MenuTab::Mode, MenuTab::Start];
        assert_eq!(cycle(&all, MenuTab::Start, true), MenuTab::Difficulty);
        assert_eq!(cycle(&all, MenuTab::Difficulty, false), MenuTab::Start);
    }

    #[test]
    fn test_menu_choice_follows_tab() {
        let mut menu = MenuState::new(Difficulty::Easy, GameMode::Endless);
        menu.cycle_choice(true);
        assert_eq!(menu.selected_difficulty, Difficulty::Medium);
        menu.cycle_tab(true);
        menu.cycle_choice(false);
        assert_eq!(menu.selected_mode, GameMode::Moves);
        assert_eq!(menu.selected_difficulty, Difficulty::Medium);
    }
}
