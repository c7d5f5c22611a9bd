//! Procedural dungeon grid: random-walk carving and cell-triggered events.

use rand::seq::SliceRandom;

use crate::constants::{
    DUNGEON_HEIGHT, DUNGEON_WIDTH, ENEMY_MARKERS, INFO_MARKERS, LOG_DUNGEON_COLLISION,
    LOG_DUNGEON_ENEMY, LOG_DUNGEON_EXIT, LOG_DUNGEON_INFO, LOG_DUNGEON_LOOT, LOG_DUNGEON_QUEST,
    LOOT_MARKERS, QUEST_MARKERS, WALK_STEPS_PER_LEVEL,
};
use crate::rng::{RngBundle, choice};

/// Contents of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Wall,
    Floor,
    Exit,
    Info,
    QuestHook,
    Loot,
    Enemy,
}

impl Cell {
    /// Glyph used by the text renderer.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Wall => '#',
            Self::Floor => ' ',
            Self::Exit => 'E',
            Self::Info => '!',
            Self::QuestHook => '?',
            Self::Loot => '*',
            Self::Enemy => '%',
        }
    }
}

/// Event kind carried by a marker cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DungeonEventKind {
    Info,
    Quest,
    Loot,
    Enemy,
    Exit,
}

impl DungeonEventKind {
    #[must_use]
    pub const fn log_key(self) -> &'static str {
        match self {
            Self::Info => LOG_DUNGEON_INFO,
            Self::Quest => LOG_DUNGEON_QUEST,
            Self::Loot => LOG_DUNGEON_LOOT,
            Self::Enemy => LOG_DUNGEON_ENEMY,
            Self::Exit => LOG_DUNGEON_EXIT,
        }
    }
}

/// Outcome of a single-step move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Target was out of bounds; nothing happened.
    Idle,
    /// Target was a wall; player did not move.
    Collision,
    /// Moved onto plain floor.
    Moved,
    /// Moved onto a marker; the cell has been cleared to floor.
    Event(DungeonEventKind),
}

impl MoveOutcome {
    /// Locale key describing the outcome, when one exists.
    #[must_use]
    pub const fn log_key(self) -> Option<&'static str> {
        match self {
            Self::Idle | Self::Moved => None,
            Self::Collision => Some(LOG_DUNGEON_COLLISION),
            Self::Event(kind) => Some(kind.log_key()),
        }
    }
}

const DIRECTIONS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

/// Grid world for one dungeon run; regenerated per level, never persisted.
#[derive(Debug, Clone)]
pub struct DungeonEngine {
    width: usize,
    height: usize,
    grid: Vec<Cell>,
    player: (usize, usize),
    current_level: u32,
}

impl Default for DungeonEngine {
    fn default() -> Self {
        Self::new(DUNGEON_WIDTH, DUNGEON_HEIGHT)
    }
}

impl DungeonEngine {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            grid: vec![Cell::Wall; width * height],
            player: (width / 2, height / 2),
            current_level: 1,
        }
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub const fn current_level(&self) -> u32 {
        self.current_level
    }

    #[must_use]
    pub const fn player_position(&self) -> (usize, usize) {
        self.player
    }

    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.grid[y * self.width + x]
    }

    fn set_cell(&mut self, x: usize, y: usize, cell: Cell) {
        self.grid[y * self.width + x] = cell;
    }

    /// Carve a level with a seeded random walk and scatter event markers.
    ///
    /// The walker starts at the grid center, marks its cell floor each
    /// step, and only advances while the next cell stays inside the
    /// one-cell interior margin. Markers are popped from the shuffled
    /// visited pool; an exhausted pool simply stops placement.
    pub fn generate_level(&mut self, level_num: u32, rng: &RngBundle) {
        self.current_level = level_num;
        self.grid.fill(Cell::Wall);

        let start = (self.width / 2, self.height / 2);
        self.player = start;
        let (mut x, mut y) = start;

        let steps =
            self.width * self.height / 2 + level_num as usize * WALK_STEPS_PER_LEVEL;
        let mut walked: Vec<(usize, usize)> = Vec::with_capacity(steps);
        {
            let mut walk_rng = rng.dungeon();
            for _ in 0..steps {
                self.grid[y * self.width + x] = Cell::Floor;
                walked.push((x, y));
                let (dx, dy) = *choice(&mut *walk_rng, &DIRECTIONS).unwrap_or(&(0, 0));
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                let in_margin = nx >= 1
                    && (nx as usize) < self.width - 1
                    && ny >= 1
                    && (ny as usize) < self.height - 1;
                if in_margin {
                    x = nx as usize;
                    y = ny as usize;
                }
            }
        }

        let mut pool: Vec<(usize, usize)> =
            walked.into_iter().filter(|&cell| cell != start).collect();
        pool.shuffle(&mut *rng.dungeon());

        if let Some((ex, ey)) = pool.pop() {
            self.set_cell(ex, ey, Cell::Exit);
        }
        let placements = [
            (Cell::Info, INFO_MARKERS),
            (Cell::QuestHook, QUEST_MARKERS),
            (Cell::Loot, LOOT_MARKERS),
            (Cell::Enemy, ENEMY_MARKERS),
        ];
        for (marker, count) in placements {
            for _ in 0..count {
                let Some((sx, sy)) = pool.pop() else {
                    return;
                };
                self.set_cell(sx, sy, marker);
            }
        }
    }

    /// Resolve a single-step move by delta.
    ///
    /// Marker cells are cleared to floor on trigger and cannot re-fire.
    pub fn move_player(&mut self, dx: i32, dy: i32) -> MoveOutcome {
        let nx = self.player.0 as i32 + dx;
        let ny = self.player.1 as i32 + dy;
        if nx < 0 || ny < 0 || nx as usize >= self.width || ny as usize >= self.height {
            return MoveOutcome::Idle;
        }
        let (nx, ny) = (nx as usize, ny as usize);

        let target = self.cell(nx, ny);
        if target == Cell::Wall {
            return MoveOutcome::Collision;
        }
        self.player = (nx, ny);
        let kind = match target {
            Cell::Floor => return MoveOutcome::Moved,
            Cell::Info => DungeonEventKind::Info,
            Cell::QuestHook => DungeonEventKind::Quest,
            Cell::Loot => DungeonEventKind::Loot,
            Cell::Enemy => DungeonEventKind::Enemy,
            Cell::Exit => DungeonEventKind::Exit,
            Cell::Wall => unreachable!("walls rejected above"),
        };
        self.set_cell(nx, ny, Cell::Floor);
        MoveOutcome::Event(kind)
    }

    /// Render the grid for the UI, with `@` at the player cell.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                if (x, y) == self.player {
                    out.push('@');
                } else {
                    out.push(self.cell(x, y).symbol());
                }
            }
            if y + 1 < self.height {
                out.push('\n');
            }
        }
        out
    }
}
