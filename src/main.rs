use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::{
    cell::Cell as Flag,
    collections::BTreeMap,
    fs::File,
    io::{self, stdout, Stdout},
    path::{Path, PathBuf},
    rc::Rc,
    sync::Mutex,
    time::{Duration, Instant},
};
use thiserror::Error;
use tracing::info;

use klotski::{
    config::{BLOCK_SIZE, MAX_SPEED, MOVE_UNIT},
    drag::{BoardView, FrameScheduler, RenderBlock},
    Cell, Config, DragController, DragListener, Level, Pixel, RenderSink,
};

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 4;
const CELL_HEIGHT: u16 = 2;
const FRAME: Duration = Duration::from_millis(16);
const INFO_WIDTH: u16 = 16;

const PIECE_TOKENS: &str = "123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const PIECE_COLORS: [Color; 8] = [
    Color::Red,
    Color::Yellow,
    Color::Green,
    Color::Cyan,
    Color::Blue,
    Color::Magenta,
    Color::Rgb(255, 165, 0),
    Color::LightGreen,
];
const WALL_COLOR: Color = Color::DarkGray;

// ============================================================================
// Command Line
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "klotski", about = "Sliding-block puzzle for the terminal")]
struct Args {
    /// Level file: start rows, an empty line, then goal rows.
    #[arg(long, value_name = "FILE")]
    level: Option<PathBuf>,
    /// Side length of one grid cell in pixels.
    #[arg(long, value_name = "PIXELS", default_value_t = BLOCK_SIZE)]
    block_size: i32,
    /// Granularity of piece motion in pixels. Must divide the block size.
    #[arg(long, value_name = "PIXELS", default_value_t = MOVE_UNIT)]
    move_unit: i32,
    /// Largest distance a piece moves per frame on each axis.
    #[arg(long, value_name = "PIXELS", default_value_t = MAX_SPEED)]
    max_speed: i32,
    /// Write debug logs to this file.
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

// ============================================================================
// Palette
// ============================================================================

#[derive(Error, Debug)]
#[error("no colour available for piece {0:?}")]
struct MissingAssetError(char);

struct Palette {
    colors: BTreeMap<char, Color>,
}

impl Palette {
    fn for_level(level: &Level) -> Result<Self, MissingAssetError> {
        let colors = level
            .start
            .pieces()
            .keys()
            .map(|&token| {
                let index = PIECE_TOKENS
                    .chars()
                    .position(|c| c == token)
                    .ok_or(MissingAssetError(token))?;
                Ok((token, PIECE_COLORS[index % PIECE_COLORS.len()]))
            })
            .collect::<Result<_, MissingAssetError>>()?;
        Ok(Self { colors })
    }

    fn style(&self, block: &RenderBlock) -> Style {
        let color = match block.cell {
            Cell::Block(token) => self.colors.get(&token).copied().unwrap_or(Color::White),
            _ => WALL_COLOR,
        };
        let style = Style::default().fg(color);
        if block.moving {
            style.add_modifier(Modifier::BOLD)
        } else {
            style
        }
    }
}

// ============================================================================
// Core Collaborators
// ============================================================================

/// Marks the screen dirty whenever the board changes.
struct RedrawFlag(Rc<Flag<bool>>);

impl RenderSink for RedrawFlag {
    fn draw(&mut self, _board: &BoardView<'_>) {
        self.0.set(true);
    }
}

struct LogListener;

impl DragListener for LogListener {
    fn on_piece_moved(&mut self, move_count: u32) {
        info!(move_count, "piece moved");
    }

    fn on_goal_reached(&mut self, move_count: u32) {
        info!(move_count, "puzzle solved");
    }
}

// ============================================================================
// Pointer Mapping
// ============================================================================

/// Centre of a terminal cell in board pixel space, relative to `area`.
/// Inverse of the `origin * CELL / block_size` mapping used when drawing.
fn to_pixel(area: Rect, column: u16, row: u16, block_size: i32) -> Pixel {
    let centre = |offset: i32, cell: u16| (2 * offset + 1) * block_size / (2 * cell as i32);
    Pixel::new(
        centre(column as i32 - area.x as i32, CELL_WIDTH),
        centre(row as i32 - area.y as i32, CELL_HEIGHT),
    )
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    area.x <= column && column < area.x + area.width && area.y <= row && row < area.y + area.height
}

/// Turns raw mouse events into start/drag/end calls, tracking the last
/// pointer position while a piece is held.
#[derive(Default)]
struct PointerTracker {
    last: Option<Pixel>,
}

impl PointerTracker {
    fn handle(&mut self, mouse: MouseEvent, area: Rect, controller: &mut DragController) {
        let block_size = controller.config().block_size;
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.last.is_some() || !contains(area, mouse.column, mouse.row) {
                    return;
                }
                let pointer = to_pixel(area, mouse.column, mouse.row, block_size);
                if controller.is_draggable(pointer) {
                    controller.start(pointer);
                    self.last = Some(pointer);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let Some(last) = self.last else {
                    return;
                };
                let pointer = to_pixel(area, mouse.column, mouse.row, block_size);
                controller.drag(pointer - last);
                self.last = Some(pointer);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if self.last.take().is_some() {
                    controller.end();
                }
            }
            _ => {}
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Glyph for one terminal cell inside a block; gaps are left on edges that
/// border another piece so outlines stay visible.
fn block_glyph(block: &RenderBlock, dx: u16, dy: u16) -> char {
    if block.cell == Cell::Wall {
        return '▓';
    }
    let right = block.edges.right && dx + 1 == CELL_WIDTH;
    let bottom = block.edges.bottom && dy + 1 == CELL_HEIGHT;
    match (right, bottom) {
        (true, true) => '▘',
        (true, false) => '▌',
        (false, true) => '▀',
        (false, false) => '█',
    }
}

fn board_lines(board: &BoardView<'_>, palette: &Palette) -> Vec<Line<'static>> {
    let width = board.map.cols() * CELL_WIDTH as usize;
    let height = board.map.rows() * CELL_HEIGHT as usize;
    let mut screen = vec![vec![(' ', Style::default()); width]; height];

    for block in board.blocks() {
        let left = block.origin.x * CELL_WIDTH as i32 / board.block_size;
        let top = block.origin.y * CELL_HEIGHT as i32 / board.block_size;
        let style = palette.style(&block);
        for dy in 0..CELL_HEIGHT {
            for dx in 0..CELL_WIDTH {
                let (x, y) = ((left + dx as i32) as usize, (top + dy as i32) as usize);
                if let Some(slot) = screen.get_mut(y).and_then(|row| row.get_mut(x)) {
                    *slot = (block_glyph(&block, dx, dy), style);
                }
            }
        }
    }

    screen
        .into_iter()
        .map(|row| {
            Line::from(
                row.into_iter()
                    .map(|(glyph, style)| Span::styled(glyph.to_string(), style))
                    .collect::<Vec<_>>(),
            )
        })
        .collect()
}

/// Draws the whole screen and returns the area the board occupies.
fn render(frame: &mut Frame, board: &BoardView<'_>, palette: &Palette) -> Rect {
    let area = frame.size();
    let grid_width = board.map.cols() as u16 * CELL_WIDTH + 2;
    let grid_height = board.map.rows() as u16 * CELL_HEIGHT + 2;

    let main_area = centered_rect(grid_width + INFO_WIDTH, grid_height + 2, area);
    let vertical = Layout::vertical([Constraint::Length(grid_height), Constraint::Fill(1)])
        .split(main_area);
    let horizontal = Layout::horizontal([
        Constraint::Length(grid_width),
        Constraint::Length(INFO_WIDTH),
    ])
    .split(vertical[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Klotski ")
        .title_alignment(Alignment::Center);
    let grid_area = block.inner(horizontal[0]);
    frame.render_widget(block, horizontal[0]);
    frame.render_widget(Paragraph::new(board_lines(board, palette)), grid_area);

    render_info(frame, board, horizontal[1]);

    let controls = Paragraph::new("Drag pieces with the mouse | R: Reset | Q/ESC: Quit")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(controls, vertical[1]);

    grid_area
}

fn render_info(frame: &mut Frame, board: &BoardView<'_>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("Moves", Style::default().fg(Color::Yellow))),
        Line::from(board.move_count.to_string()),
    ];
    if board.solved {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "SOLVED!",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
    }
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Main Loop
// ============================================================================

fn init_logging(path: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();
    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    controller: &mut DragController,
    scheduler: &FrameScheduler,
    dirty: &Flag<bool>,
    palette: &Palette,
) -> io::Result<()> {
    let mut pointer = PointerTracker::default();
    let mut grid_area = Rect::default();
    let mut last_frame = Instant::now();
    dirty.set(true);

    loop {
        if dirty.replace(false) {
            terminal.draw(|frame| {
                grid_area = render(frame, &controller.board(), palette);
            })?;
        }

        let timeout = FRAME
            .checked_sub(last_frame.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => break,
                    KeyCode::Char('r') | KeyCode::Char('R') => controller.reset(),
                    _ => {}
                },
                Event::Mouse(mouse) => pointer.handle(mouse, grid_area, controller),
                Event::Resize(_, _) => dirty.set(true),
                _ => {}
            }
        }

        if last_frame.elapsed() >= FRAME {
            last_frame = Instant::now();
            if scheduler.take_pending() {
                controller.tick();
            }
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let config = Config::new(args.block_size, args.move_unit, args.max_speed)
        .context("invalid board geometry")?;
    let level = match &args.level {
        Some(path) => Level::load(path)
            .with_context(|| format!("failed to load level {}", path.display()))?,
        None => Level::builtin(),
    };
    let palette = Palette::for_level(&level)?;

    let scheduler = FrameScheduler::new();
    let dirty = Rc::new(Flag::new(false));
    let mut controller = DragController::new(level, config, Box::new(scheduler.clone()))?
        .with_render_sink(Box::new(RedrawFlag(Rc::clone(&dirty))))
        .with_listener(Box::new(LogListener));
    info!(?config, "starting");

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut controller, &scheduler, &dirty, &palette);

    // Restore terminal
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result?;
    Ok(())
}
