//! Layout and drawing: menu, board, sidebar, pause, quit menu, game over.

use crate::app::{GameOverReason, MenuState, MenuTab, QuitOption, Screen};
use crate::fx::Effects;
use crate::theme::Theme;
use crate::{Difficulty, GameMode};
use gemtui::engine::{CellView, GemKind, GridView, Pos};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::time::{Duration, Instant};

/// Terminal cells per gem.
pub const CELL_WIDTH: u16 = 4;
pub const CELL_HEIGHT: u16 = 2;
const SIDEBAR_WIDTH: u16 = 26;

/// One glyph per kind so colours are never the only cue.
const GLYPHS: [&str; 7] = ["◆", "●", "■", "▲", "♣", "★", "✚"];

/// Board size in terminal cells, border included.
fn board_outer_size(rows: usize, cols: usize) -> (u16, u16) {
    (cols as u16 * CELL_WIDTH + 2, rows as u16 * CELL_HEIGHT + 2)
}

/// Smallest terminal (columns, rows) that fits the board and sidebar.
pub fn min_terminal_size(rows: usize, cols: usize) -> (u16, u16) {
    let (w, h) = board_outer_size(rows, cols);
    (w + SIDEBAR_WIDTH, h.max(22))
}

/// Screen rect of one gem slot inside the board's inner rect.
pub fn cell_rect(board: Rect, pos: Pos) -> Rect {
    Rect {
        x: board.x + pos.col as u16 * CELL_WIDTH,
        y: board.y + pos.row as u16 * CELL_HEIGHT,
        width: CELL_WIDTH,
        height: CELL_HEIGHT,
    }
}

/// Map a terminal cell (e.g. a mouse click) to the board slot under it.
pub fn cell_at(board: Rect, rows: usize, cols: usize, column: u16, row: u16) -> Option<Pos> {
    if column < board.x || row < board.y {
        return None;
    }
    let pos = Pos::new(
        ((row - board.y) / CELL_HEIGHT) as usize,
        ((column - board.x) / CELL_WIDTH) as usize,
    );
    (pos.row < rows && pos.col < cols).then_some(pos)
}

/// Everything the renderer reads for one frame.
pub struct DrawContext<'a> {
    pub screen: Screen,
    pub theme: &'a Theme,
    pub view: &'a GridView,
    pub menu: &'a MenuState,
    pub quit_selected: QuitOption,
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub palette: &'a [GemKind],
    pub cursor: Pos,
    pub hint: Option<(Pos, Pos)>,
    pub paused: bool,
    pub time_left: Option<Duration>,
    pub moves_left: Option<u32>,
    pub best_score: u32,
    pub new_best: bool,
    pub game_over_reason: Option<GameOverReason>,
    pub now: Instant,
}

/// Draw the current screen. Returns the board's inner rect when the board is on screen,
/// for mapping mouse clicks.
pub fn draw(frame: &mut Frame, ctx: &DrawContext, effects: &mut Effects, dt: Duration) -> Option<Rect> {
    let area = frame.area();
    match ctx.screen {
        Screen::Menu => {
            draw_menu(frame, ctx, area);
            None
        }
        Screen::Playing => {
            let board = draw_game(frame, ctx, area);
            effects.render_flashes(frame, board, dt);
            effects.render_popups(frame, board, ctx.theme.bg);
            if ctx.paused {
                draw_pause_overlay(frame, ctx.theme, area);
            }
            Some(board)
        }
        Screen::QuitMenu => {
            let board = draw_game(frame, ctx, area);
            draw_quit_menu(frame, ctx.theme, ctx.quit_selected);
            Some(board)
        }
        Screen::GameOver => {
            draw_game_over(frame, ctx, area);
            None
        }
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn tab_style(current: bool, selected: bool, theme: &Theme) -> Style {
    if current {
        Style::default().fg(Color::Black).bg(theme.title).bold()
    } else if selected {
        Style::default().fg(theme.title).bold()
    } else {
        Style::default().fg(theme.main_fg)
    }
}

fn draw_menu(frame: &mut Frame, ctx: &DrawContext, area: Rect) {
    let theme = ctx.theme;
    let menu = ctx.menu;
    let popup = centered(area, 48, 20);

    // Title in the first four gem colours.
    let title = Line::from(
        "GEMTUI"
            .chars()
            .enumerate()
            .map(|(i, c)| {
                Span::styled(
                    format!("{c} "),
                    Style::default().fg(theme.gems[i % 4]).bold(),
                )
            })
            .collect::<Vec<_>>(),
    );

    let on_difficulty = menu.current_tab == MenuTab::Difficulty;
    let difficulties = [
        (Difficulty::Easy, " EASY "),
        (Difficulty::Medium, " MEDIUM "),
        (Difficulty::Hard, " HARD "),
    ]
    .map(|(d, label)| {
        let selected = menu.selected_difficulty == d;
        Span::styled(label, tab_style(on_difficulty && selected, selected, theme))
    });

    let on_mode = menu.current_tab == MenuTab::Mode;
    let modes = [
        (GameMode::Endless, " ENDLESS "),
        (GameMode::Timed, " TIMED "),
        (GameMode::Moves, " MOVES "),
    ]
    .map(|(m, label)| {
        let selected = menu.selected_mode == m;
        Span::styled(label, tab_style(on_mode && selected, selected, theme))
    });

    let start_style = tab_style(menu.current_tab == MenuTab::Start, false, theme);
    let key_style = Style::default().fg(theme.gems[2]);
    let spaced = |spans: [Span<'static>; 3]| {
        let [a, b, c] = spans;
        Line::from(vec![a, Span::from("  "), b, Span::from("  "), c])
    };

    let lines = vec![
        Line::from(""),
        title,
        Line::from(Span::styled(
            format!("{} colours", menu.selected_difficulty.gem_kinds()),
            Style::default().fg(theme.inactive_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(" ─ DIFFICULTY ─ ", Style::default().fg(theme.div_line))),
        spaced(difficulties),
        Line::from(""),
        Line::from(Span::styled(" ─ MODE ─ ", Style::default().fg(theme.div_line))),
        spaced(modes),
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(" [ START ] ", start_style)),
        Line::from(""),
        Line::from(""),
        Line::from(vec![
            Span::styled(" ↕ ", key_style),
            Span::from("NAVIGATE   "),
            Span::styled(" ↔ ", key_style),
            Span::from("CHANGE   "),
            Span::styled(" ENTER ", key_style),
            Span::from("PLAY"),
        ]),
        Line::from(""),
        Line::from(Span::styled(" [Q] EXIT ", Style::default().fg(theme.gems[0]))),
    ];

    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );

    // Slide in from below, ease-out cubic.
    let elapsed = ctx.now.duration_since(menu.animation_start).as_millis() as f32;
    let t = (elapsed / 500.0).min(1.0);
    let eased = 1.0 - (1.0 - t).powi(3);
    let mut anim_popup = popup;
    anim_popup.y += ((1.0 - eased) * 10.0) as u16;
    anim_popup.height = anim_popup.height.min(area.bottom().saturating_sub(anim_popup.y));

    p.render(anim_popup, frame.buffer_mut());
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P Resume    Q Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, ctx: &DrawContext, area: Rect) {
    let theme = ctx.theme;
    let view = ctx.view;
    let popup = centered(area, 34, 14);
    let title = match ctx.game_over_reason {
        Some(GameOverReason::TimeUp) => " Time's up! ",
        Some(GameOverReason::OutOfMoves) => " Out of moves! ",
        None => " Game Over ",
    };
    let fg = Style::default().fg(theme.main_fg);
    let mut lines: Vec<Line> = vec![
        Line::from(""),
        Line::from(Span::styled(title, Style::default().fg(Color::White).bg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", view.score), fg)),
        Line::from(Span::styled(format!(" Best: {} ", ctx.best_score), fg)),
        Line::from(Span::styled(format!(" Moves: {} ", view.moves), fg)),
        Line::from(Span::styled(format!(" Longest chain: x{} ", view.max_combo), fg)),
    ];
    if ctx.new_best {
        lines.push(Line::from(Span::styled(
            " New record! ",
            Style::default().fg(Color::Yellow).bold(),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" R Restart    Q Quit ", fg)));
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" gemtui ", theme.title)),
    );
    p.render(popup, frame.buffer_mut());
}

/// Board and sidebar, centred. Returns the board's inner rect.
fn draw_game(frame: &mut Frame, ctx: &DrawContext, area: Rect) -> Rect {
    let (bw, bh) = board_outer_size(ctx.view.rows, ctx.view.cols);
    let total_w = bw + SIDEBAR_WIDTH;

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(bh.max(22)),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    let board_area = Rect {
        height: bh.min(inner[0].height),
        ..inner[0]
    };

    let board = draw_board(frame, ctx, board_area);
    draw_sidebar(frame, ctx, inner[1]);
    board
}

fn board_title(ctx: &DrawContext) -> String {
    match (ctx.mode, ctx.time_left, ctx.moves_left) {
        (GameMode::Timed, Some(left), _) => {
            let secs = left.as_secs();
            format!(" gemtui  Time: {:02}:{:02} ", secs / 60, secs % 60)
        }
        (GameMode::Moves, _, Some(left)) => format!(" gemtui  Moves left: {left} "),
        _ => " gemtui ".to_string(),
    }
}

fn draw_board(frame: &mut Frame, ctx: &DrawContext, area: Rect) -> Rect {
    let theme = ctx.theme;
    let view = ctx.view;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(board_title(ctx), theme.title));
    let board = block.inner(area);
    block.render(area, frame.buffer_mut());

    let buf = frame.buffer_mut();
    for y in board.top()..board.bottom() {
        for x in board.left()..board.right() {
            buf[(x, y)].reset();
            buf[(x, y)].set_style(Style::default().bg(theme.bg));
        }
    }

    for cell in view.cells.iter().flatten() {
        draw_gem(frame, ctx, board, cell);
    }

    // Markers go on top of whatever gem currently occupies the slot.
    if let Some((a, b)) = ctx.hint {
        for pos in [a, b] {
            mark_slot(frame, board, pos, "·", "·", Style::default().fg(theme.title).bold());
        }
    }
    if let Some(sel) = view.selection {
        mark_slot(frame, board, sel, "[", "]", Style::default().fg(Color::White).bold());
    }
    let cursor_style = if view.input_enabled {
        Style::default()
            .fg(theme.title)
            .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK)
    } else {
        Style::default().fg(theme.inactive_fg)
    };
    mark_slot(frame, board, ctx.cursor, "▸", "◂", cursor_style);
    board
}

fn draw_gem(frame: &mut Frame, ctx: &DrawContext, board: Rect, cell: &CellView) {
    let (d_row, d_col) = ctx.view.swap_offset(cell.pos);
    let top = board.y as f32 + (cell.visual_row + d_row) * CELL_HEIGHT as f32;
    let left = board.x as f32 + (cell.pos.col as f32 + d_col) * CELL_WIDTH as f32;
    let top = top.round() as i32;
    let left = left.round() as i32;
    if left < board.x as i32 || left + CELL_WIDTH as i32 > board.right() as i32 {
        return;
    }

    let color = ctx.theme.gem_color(cell.kind);
    let glyph = GLYPHS[cell.kind.index() as usize % GLYPHS.len()];
    let lines: [(String, Style); 2] = if cell.scale < 0.5 {
        [
            (" ·  ".to_string(), Style::default().fg(color).bg(ctx.theme.bg)),
            ("    ".to_string(), Style::default().bg(ctx.theme.bg)),
        ]
    } else if cell.scale < 1.0 {
        [
            (format!(" {glyph}  "), Style::default().fg(color).bg(ctx.theme.bg).bold()),
            ("    ".to_string(), Style::default().bg(ctx.theme.bg)),
        ]
    } else {
        let body = Style::default().fg(Color::Black).bg(color);
        [
            (format!(" {glyph}{glyph} "), body.bold()),
            ("▁▁▁▁".to_string(), Style::default().fg(ctx.theme.bg).bg(color)),
        ]
    };

    let buf = frame.buffer_mut();
    for (i, (text, style)) in lines.into_iter().enumerate() {
        let y = top + i as i32;
        if y < board.y as i32 || y >= board.bottom() as i32 {
            continue;
        }
        buf.set_string(left as u16, y as u16, text, style);
    }
}

/// Put a marker on the left and right edge of a slot's top line.
fn mark_slot(frame: &mut Frame, board: Rect, pos: Pos, left: &str, right: &str, style: Style) {
    let r = cell_rect(board, pos);
    if r.right() > board.right() || r.bottom() > board.bottom() {
        return;
    }
    let buf = frame.buffer_mut();
    let keep_bg = |cell: &ratatui::buffer::Cell| cell.bg;
    let bg_left = keep_bg(&buf[(r.x, r.y)]);
    let bg_right = keep_bg(&buf[(r.right() - 1, r.y)]);
    buf.set_string(r.x, r.y, left, style.bg(bg_left));
    buf.set_string(r.right() - 1, r.y, right, style.bg(bg_right));
}

fn sidebar_block(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
}

fn draw_sidebar(frame: &mut Frame, ctx: &DrawContext, area: Rect) {
    let theme = ctx.theme;
    let view = ctx.view;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let dim_style = Style::default().fg(theme.inactive_fg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Stats
            Constraint::Length(1),
            Constraint::Length(4), // Combo
            Constraint::Length(1),
            Constraint::Length(4), // Colours
            Constraint::Length(1),
            Constraint::Min(4), // Controls
        ])
        .split(area);

    // --- Stats ---
    let block = sidebar_block(theme);
    let inner = block.inner(chunks[0]);
    block.render(chunks[0], frame.buffer_mut());
    let stat = |label: &'static str, value: String| {
        Line::from(vec![Span::styled(label, title_style), Span::styled(value, fg_style)])
    };
    let mut stats = vec![
        stat("Score: ", view.score.to_string()),
        stat("Best: ", ctx.best_score.max(view.score).to_string()),
        stat("Moves: ", view.moves.to_string()),
    ];
    match (ctx.mode, ctx.time_left, ctx.moves_left) {
        (GameMode::Timed, Some(left), _) => stats.push(stat("Time left: ", format!("{}s", left.as_secs()))),
        (GameMode::Moves, _, Some(left)) => stats.push(stat("Moves left: ", left.to_string())),
        _ => stats.push(stat("Mode: ", "endless".to_string())),
    }
    stats.push(stat(
        "Level: ",
        format!("{:?}, {} colours", ctx.difficulty, ctx.palette.len()),
    ));
    Paragraph::new(Text::from(stats)).render(inner, frame.buffer_mut());

    // --- Combo ---
    let block = sidebar_block(theme);
    let inner = block.inner(chunks[2]);
    block.render(chunks[2], frame.buffer_mut());
    let combo = if view.combo > 1 {
        Line::from(Span::styled(
            format!("COMBO x{}", view.combo),
            Style::default().fg(Color::Yellow).bold(),
        ))
    } else {
        Line::from(Span::styled("Combo", dim_style))
    };
    let best_chain = stat("Best chain: ", format!("x{}", view.max_combo));
    Paragraph::new(Text::from(vec![combo, best_chain])).render(inner, frame.buffer_mut());

    // --- Colours in play ---
    let block = sidebar_block(theme);
    let inner = block.inner(chunks[4]);
    block.render(chunks[4], frame.buffer_mut());
    let strip: Vec<Span> = ctx
        .palette
        .iter()
        .map(|&kind| {
            let glyph = GLYPHS[kind.index() as usize % GLYPHS.len()];
            Span::styled(format!("{glyph} "), Style::default().fg(theme.gem_color(kind)))
        })
        .collect();
    Paragraph::new(Text::from(vec![
        Line::from(Span::styled("Colours", title_style)),
        Line::from(strip),
    ]))
    .render(inner, frame.buffer_mut());

    // --- Controls ---
    let block = sidebar_block(theme);
    let inner = block.inner(chunks[6]);
    block.render(chunks[6], frame.buffer_mut());
    let help = [
        ("Arrows ", "move"),
        ("Enter  ", "pick gem"),
        ("Mouse  ", "click gem"),
        ("H      ", "hint"),
        ("P      ", "pause"),
        ("Q      ", "menu"),
    ]
    .map(|(key, what)| Line::from(vec![Span::styled(key, title_style), Span::styled(what, dim_style)]));
    Paragraph::new(Text::from(help.to_vec())).render(inner, frame.buffer_mut());
}

pub fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let quit_rect = centered(frame.area(), 24, 8);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Quit? ");

    Clear.render(quit_rect, frame.buffer_mut());
    for y in quit_rect.top()..quit_rect.bottom() {
        for x in quit_rect.left()..quit_rect.right() {
            frame.buffer_mut()[(x, y)].set_style(Style::default().bg(theme.bg));
        }
    }

    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::MainMenu, " Main Menu "),
        (QuitOption::Exit, " Exit "),
    ];
    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default().fg(theme.bg).bg(theme.title).bold()
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + (inner.width.saturating_sub(label.len() as u16)) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.bottom() {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}
