use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info, trace};

use crate::config::Config;
use crate::error::ShapeError;
use crate::goal;
use crate::grid::{Cell, Edges, GridMap};
use crate::level::Level;
use crate::motion;
use crate::piece::{Piece, Pixel};

// ============================================================================
// Collaborators
// ============================================================================

/// Next-animation-opportunity primitive. Each request must be answered with
/// exactly one later call to [`DragController::tick`].
pub trait TickScheduler {
    fn request_tick(&mut self);
}

/// Consumer of board snapshots, called after every positional change.
pub trait RenderSink {
    fn draw(&mut self, board: &BoardView<'_>);
}

/// Notification hooks, invoked from inside a tick. Implementations must not
/// call back into the controller.
pub trait DragListener {
    fn on_piece_moved(&mut self, _move_count: u32) {}
    fn on_goal_reached(&mut self, _move_count: u32) {}
}

/// Scheduler backed by a shared flag that a frame loop polls.
#[derive(Clone, Default, Debug)]
pub struct FrameScheduler {
    pending: Rc<std::cell::Cell<bool>>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears and returns the pending request.
    pub fn take_pending(&self) -> bool {
        self.pending.replace(false)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }
}

impl TickScheduler for FrameScheduler {
    fn request_tick(&mut self) {
        self.pending.set(true);
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DragEvent {
    PieceMoved(u32),
    GoalReached(u32),
}

/// Listener that records notifications for later inspection.
#[derive(Clone, Default, Debug)]
pub struct EventLog {
    events: Rc<RefCell<Vec<DragEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes and clears all recorded events
    pub fn take_events(&self) -> Vec<DragEvent> {
        self.events.take()
    }
}

impl DragListener for EventLog {
    fn on_piece_moved(&mut self, move_count: u32) {
        self.events.borrow_mut().push(DragEvent::PieceMoved(move_count));
    }

    fn on_goal_reached(&mut self, move_count: u32) {
        self.events.borrow_mut().push(DragEvent::GoalReached(move_count));
    }
}

struct NoRender;

impl RenderSink for NoRender {
    fn draw(&mut self, _board: &BoardView<'_>) {}
}

struct NoListener;

impl DragListener for NoListener {}

// ============================================================================
// Board snapshot
// ============================================================================

/// One drawable cell: a resting map cell or a cell of the dragged piece.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RenderBlock {
    pub cell: Cell,
    pub origin: Pixel,
    pub edges: Edges,
    pub moving: bool,
}

pub struct BoardView<'a> {
    pub map: &'a GridMap,
    pub active: Option<&'a Piece>,
    pub block_size: i32,
    pub move_count: u32,
    pub solved: bool,
}

impl BoardView<'_> {
    pub fn width(&self) -> i32 {
        self.map.pixel_width(self.block_size)
    }

    pub fn height(&self) -> i32 {
        self.map.pixel_height(self.block_size)
    }

    /// Cell drawn under `pointer`, box edges inclusive. Resting cells win ties
    /// with the moving piece.
    pub fn cell_at(&self, pointer: Pixel) -> Option<Cell> {
        let size = self.block_size;
        if let Some((_, cell)) = self.map.block_at_pixel(pointer.x, pointer.y, size) {
            return Some(cell);
        }
        let piece = self.active?;
        piece
            .cell_pixels(size)
            .any(|o| {
                o.x <= pointer.x
                    && pointer.x <= o.x + size
                    && o.y <= pointer.y
                    && pointer.y <= o.y + size
            })
            .then(|| Cell::Block(piece.token()))
    }

    /// Every non-empty cell in pixel space, resting cells first.
    pub fn blocks(&self) -> Vec<RenderBlock> {
        let mut blocks: Vec<RenderBlock> = self
            .map
            .iter()
            .filter(|(_, cell)| *cell != Cell::Empty)
            .map(|(pos, cell)| RenderBlock {
                cell,
                origin: Pixel::of_cell(pos, self.block_size),
                edges: self.map.edges(pos),
                moving: false,
            })
            .collect();

        if let Some(piece) = self.active {
            blocks.extend(
                piece
                    .cell_pixels(self.block_size)
                    .enumerate()
                    .map(|(i, origin)| RenderBlock {
                        cell: Cell::Block(piece.token()),
                        origin,
                        edges: piece.edges(i),
                        moving: true,
                    }),
            );
        }
        blocks
    }
}

// ============================================================================
// Controller
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DragState {
    Idle,
    Dragging,
    /// Pointer released, piece still sliding onto the grid.
    Settling,
}

pub struct DragController {
    config: Config,
    level: Level,
    // While a piece is active this is the working map with the piece removed.
    map: GridMap,
    active: Option<Piece>,
    state: DragState,
    ticking: bool,
    stopped: bool,
    move_count: u32,
    scheduler: Box<dyn TickScheduler>,
    sink: Box<dyn RenderSink>,
    listener: Box<dyn DragListener>,
}

impl DragController {
    pub fn new(
        level: Level,
        config: Config,
        scheduler: Box<dyn TickScheduler>,
    ) -> Result<Self, ShapeError> {
        config.validate()?;
        let level = Level::from_maps(level.start, level.goal)?;
        Ok(Self {
            config,
            map: level.start.clone(),
            level,
            active: None,
            state: DragState::Idle,
            ticking: false,
            stopped: false,
            move_count: 0,
            scheduler,
            sink: Box::new(NoRender),
            listener: Box::new(NoListener),
        })
    }

    pub fn with_render_sink(mut self, sink: Box<dyn RenderSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_listener(mut self, listener: Box<dyn DragListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn goal(&self) -> &GridMap {
        &self.level.goal
    }

    /// Current occupancy. The dragged piece is absent until it is committed.
    pub fn map(&self) -> &GridMap {
        &self.map
    }

    pub fn active_piece(&self) -> Option<&Piece> {
        self.active.as_ref()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn is_solved(&self) -> bool {
        self.stopped
    }

    /// Whether a tick has been requested and not yet run to a stop.
    pub fn is_ticking(&self) -> bool {
        self.ticking
    }

    pub fn board(&self) -> BoardView<'_> {
        BoardView {
            map: &self.map,
            active: self.active.as_ref(),
            block_size: self.config.block_size,
            move_count: self.move_count,
            solved: self.stopped,
        }
    }

    /// Whether `pointer` is over a piece as drawn, including one still settling.
    pub fn is_draggable(&self, pointer: Pixel) -> bool {
        !self.stopped && self.board().cell_at(pointer).is_some_and(Cell::is_draggable)
    }

    /// Picks up the piece under `pointer`.
    pub fn start(&mut self, pointer: Pixel) {
        if self.stopped || self.state == DragState::Dragging {
            return;
        }
        let hit = self.board().cell_at(pointer);
        if self.active.is_some() {
            // Previous piece is still settling: land it before lifting another.
            if let Some(piece) = self.active.as_mut() {
                let rest = piece.accumulator();
                piece.apply(rest);
            }
            self.finish_drag();
            if self.stopped {
                return;
            }
        }

        let Some(Cell::Block(token)) = hit else {
            return;
        };
        let block_size = self.config.block_size;
        let (working, cells) = self.map.extract_piece(token);
        let Some(piece) = Piece::new(token, &cells, block_size) else {
            return;
        };

        debug!(token = %token, cells = cells.len(), x = pointer.x, y = pointer.y, "drag started");
        self.map = working;
        self.active = Some(piece);
        self.state = DragState::Dragging;
    }

    /// Adds pointer travel to the outstanding drag distance.
    pub fn drag(&mut self, delta: Pixel) {
        if self.stopped || self.state != DragState::Dragging {
            return;
        }
        if let Some(piece) = self.active.as_mut() {
            piece.accumulate(delta);
        }
        self.schedule();
    }

    /// Releases the piece; the tick loop slides it onto the nearest grid line.
    pub fn end(&mut self) {
        if self.stopped || self.state != DragState::Dragging {
            return;
        }
        let block_size = self.config.block_size;
        if let Some(piece) = self.active.as_mut() {
            let snap = piece.snap_delta(block_size);
            piece.set_accumulator(snap);
        }
        self.state = DragState::Settling;
        self.schedule();
    }

    /// Advances residual motion by one resolved step.
    pub fn tick(&mut self) {
        let motion = match self.active.as_ref() {
            Some(piece) => motion::resolve(piece, piece.accumulator(), &self.map, &self.config),
            None => Pixel::ZERO,
        };

        if motion.is_zero() {
            self.ticking = false;
            if self.state == DragState::Settling {
                self.finish_drag();
            }
            return;
        }

        if let Some(piece) = self.active.as_mut() {
            piece.apply(motion);
            let Pixel { x, y } = piece.position();
            trace!(dx = motion.x, dy = motion.y, x, y, "tick");
        }
        self.redraw();
        self.scheduler.request_tick();
    }

    /// Puts every piece back on its start cell and clears the move counter.
    pub fn reset(&mut self) {
        debug!(moves = self.move_count, "board reset");
        self.map = self.level.start.clone();
        self.active = None;
        self.state = DragState::Idle;
        self.stopped = false;
        self.move_count = 0;
        self.redraw();
    }

    fn schedule(&mut self) {
        if !self.ticking {
            self.ticking = true;
            self.scheduler.request_tick();
        }
    }

    fn finish_drag(&mut self) {
        self.state = DragState::Idle;
        let Some(mut piece) = self.active.take() else {
            return;
        };
        let block_size = self.config.block_size;
        if !piece.is_aligned(block_size) {
            let snap = piece.snap_delta(block_size);
            piece.apply(snap);
        }
        self.map.commit(piece.token(), &piece.grid_cells(block_size));
        self.redraw();

        if !piece.has_moved() {
            debug!(token = %piece.token(), "drag finished in place");
            return;
        }
        self.move_count += 1;
        debug!(token = %piece.token(), moves = self.move_count, "piece moved");
        self.listener.on_piece_moved(self.move_count);

        if goal::matches(&self.map, &self.level.goal) {
            self.stopped = true;
            info!(moves = self.move_count, "goal reached");
            self.listener.on_goal_reached(self.move_count);
        }
    }

    fn redraw(&mut self) {
        let board = BoardView {
            map: &self.map,
            active: self.active.as_ref(),
            block_size: self.config.block_size,
            move_count: self.move_count,
            solved: self.stopped,
        };
        self.sink.draw(&board);
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;
    use crate::grid::GridPos;

    /// Upper bound on ticks a single settle may take before a test gives up.
    pub const MAX_TICKS: usize = 10_000;

    pub fn controller(
        start: &[&str],
        goal: &[&str],
        config: Config,
    ) -> (DragController, FrameScheduler, EventLog) {
        let scheduler = FrameScheduler::new();
        let events = EventLog::new();
        let level = Level::new(start, goal).unwrap_or_else(|err| panic!("bad test level: {err}"));
        let controller = DragController::new(level, config, Box::new(scheduler.clone()))
            .unwrap_or_else(|err| panic!("bad test config: {err}"))
            .with_listener(Box::new(events.clone()));
        (controller, scheduler, events)
    }

    /// Runs requested ticks until the loop stops. Returns the tick count.
    pub fn run_ticks(controller: &mut DragController, scheduler: &FrameScheduler) -> usize {
        let mut ticks = 0;
        while scheduler.take_pending() {
            controller.tick();
            ticks += 1;
            assert!(ticks < MAX_TICKS, "tick loop did not terminate");
        }
        ticks
    }

    /// Centre pixel of a grid cell.
    pub fn centre(pos: GridPos, block_size: i32) -> Pixel {
        Pixel::of_cell(pos, block_size) + Pixel::new(block_size / 2, block_size / 2)
    }

    /// Full press, drag, release cycle on the piece covering `pos`.
    pub fn drag_piece(
        controller: &mut DragController,
        scheduler: &FrameScheduler,
        pos: GridPos,
        delta: Pixel,
    ) {
        let block_size = controller.config().block_size;
        controller.start(centre(pos, block_size));
        controller.drag(delta);
        run_ticks(controller, scheduler);
        controller.end();
        run_ticks(controller, scheduler);
    }
}
