use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const ACTION_COUNT: usize = Direction::ALL.len();

/// Estimated return for each action, indexed by [`Direction::index`].
pub type ActionValues = [f32; ACTION_COUNT];

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }

    pub fn manhattan(self, other: Cell) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl From<(i32, i32)> for Cell {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// The four actions. `y` grows downward, so `Up` is `(0, -1)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Direction> {
        Self::ALL.get(index).copied()
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    fn code(self) -> char {
        match self {
            Direction::Up => 'U',
            Direction::Down => 'D',
            Direction::Left => 'L',
            Direction::Right => 'R',
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RayDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl RayDirection {
    pub const ALL: [RayDirection; 8] = [
        RayDirection::North,
        RayDirection::NorthEast,
        RayDirection::East,
        RayDirection::SouthEast,
        RayDirection::South,
        RayDirection::SouthWest,
        RayDirection::West,
        RayDirection::NorthWest,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            RayDirection::North => (0, -1),
            RayDirection::NorthEast => (1, -1),
            RayDirection::East => (1, 0),
            RayDirection::SouthEast => (1, 1),
            RayDirection::South => (0, 1),
            RayDirection::SouthWest => (-1, 1),
            RayDirection::West => (-1, 0),
            RayDirection::NorthWest => (-1, -1),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Large score bonus.
    Bonus,
    /// Trims the tail.
    Cutter,
    /// Starts a temporary slow effect.
    Slow,
}

impl ItemKind {
    pub const ALL: [ItemKind; 3] = [ItemKind::Bonus, ItemKind::Cutter, ItemKind::Slow];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransientItem {
    pub kind: ItemKind,
    pub cell: Cell,
    pub expires_at: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RayBlocker {
    Body,
    /// Obstacle or board edge.
    Wall,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemSighting {
    pub kind: ItemKind,
    pub distance: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RayReading {
    pub direction: RayDirection,
    /// Cells travelled up to and including the blocking cell.
    pub distance: u32,
    pub target_seen: bool,
    pub item: Option<ItemSighting>,
    pub blocked_by: RayBlocker,
}

/// Position of the navigation target along one axis, relative to the head.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AxisOffset {
    Negative,
    Aligned,
    Positive,
}

impl AxisOffset {
    pub fn of(delta: i32) -> Self {
        match delta.signum() {
            -1 => AxisOffset::Negative,
            0 => AxisOffset::Aligned,
            _ => AxisOffset::Positive,
        }
    }

    fn bits(self) -> u16 {
        match self {
            AxisOffset::Negative => 0,
            AxisOffset::Aligned => 1,
            AxisOffset::Positive => 2,
        }
    }

    fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            0 => Some(AxisOffset::Negative),
            1 => Some(AxisOffset::Aligned),
            2 => Some(AxisOffset::Positive),
            _ => None,
        }
    }
}

/// Discrete summary of an episode used to index the value table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct StateFeatures {
    pub target_dx: AxisOffset,
    pub target_dy: AxisOffset,
    /// Indexed by [`Direction::index`].
    pub blocked_near: [bool; ACTION_COUNT],
    pub blocked_far: [bool; ACTION_COUNT],
    pub heading: Option<Direction>,
}

impl StateFeatures {
    pub fn key(&self) -> StateKey {
        let mut packed = self.target_dx.bits() | (self.target_dy.bits() << 2);
        for (idx, blocked) in self.blocked_near.iter().enumerate() {
            if *blocked {
                packed |= 1 << (4 + idx);
            }
        }
        for (idx, blocked) in self.blocked_far.iter().enumerate() {
            if *blocked {
                packed |= 1 << (8 + idx);
            }
        }
        let heading = self.heading.map_or(0, |direction| direction.index() as u16 + 1);
        StateKey(packed | (heading << 12))
    }
}

/// Fixed-width fingerprint. Serializes as its string form, e.g. `"LU-0100-0110-R"`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct StateKey(u16);

impl StateKey {
    pub fn features(self) -> StateFeatures {
        let bits = self.0;
        let flag = |offset: usize| bits & (1 << offset) != 0;
        StateFeatures {
            target_dx: AxisOffset::from_bits(bits & 0b11).unwrap_or(AxisOffset::Aligned),
            target_dy: AxisOffset::from_bits((bits >> 2) & 0b11).unwrap_or(AxisOffset::Aligned),
            blocked_near: [flag(4), flag(5), flag(6), flag(7)],
            blocked_far: [flag(8), flag(9), flag(10), flag(11)],
            heading: match (bits >> 12) & 0b111 {
                0 => None,
                n => Direction::from_index(n as usize - 1),
            },
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let features = self.features();
        let dx = match features.target_dx {
            AxisOffset::Negative => 'L',
            AxisOffset::Aligned => 'C',
            AxisOffset::Positive => 'R',
        };
        let dy = match features.target_dy {
            AxisOffset::Negative => 'U',
            AxisOffset::Aligned => 'C',
            AxisOffset::Positive => 'D',
        };
        let flags = |values: [bool; ACTION_COUNT]| -> String {
            values.iter().map(|b| if *b { '1' } else { '0' }).collect()
        };
        let heading = features.heading.map_or('N', Direction::code);
        write!(
            f,
            "{dx}{dy}-{}-{}-{heading}",
            flags(features.blocked_near),
            flags(features.blocked_far)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStateKeyError(pub String);

impl fmt::Display for ParseStateKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid state key {:?}", self.0)
    }
}

impl std::error::Error for ParseStateKeyError {}

impl FromStr for StateKey {
    type Err = ParseStateKeyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let err = || ParseStateKeyError(raw.to_owned());
        let parts: Vec<&str> = raw.split('-').collect();
        let [axes, near, far, heading] = parts.as_slice() else {
            return Err(err());
        };

        let mut axes = axes.chars();
        let target_dx = match axes.next() {
            Some('L') => AxisOffset::Negative,
            Some('C') => AxisOffset::Aligned,
            Some('R') => AxisOffset::Positive,
            _ => return Err(err()),
        };
        let target_dy = match axes.next() {
            Some('U') => AxisOffset::Negative,
            Some('C') => AxisOffset::Aligned,
            Some('D') => AxisOffset::Positive,
            _ => return Err(err()),
        };
        if axes.next().is_some() {
            return Err(err());
        }

        let parse_flags = |raw_flags: &str| -> Option<[bool; ACTION_COUNT]> {
            let mut flags = [false; ACTION_COUNT];
            let mut chars = raw_flags.chars();
            for flag in &mut flags {
                *flag = match chars.next()? {
                    '0' => false,
                    '1' => true,
                    _ => return None,
                };
            }
            chars.next().is_none().then_some(flags)
        };
        let blocked_near = parse_flags(*near).ok_or_else(err)?;
        let blocked_far = parse_flags(*far).ok_or_else(err)?;

        let heading = match *heading {
            "N" => None,
            "U" => Some(Direction::Up),
            "D" => Some(Direction::Down),
            "L" => Some(Direction::Left),
            "R" => Some(Direction::Right),
            _ => return Err(err()),
        };

        Ok(StateFeatures {
            target_dx,
            target_dy,
            blocked_near,
            blocked_far,
            heading,
        }
        .key())
    }
}

impl TryFrom<String> for StateKey {
    type Error = ParseStateKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StateKey> for String {
    fn from(value: StateKey) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpisodeSnapshot {
    pub level: u32,
    pub score: u32,
    pub steps: u64,
    pub level_progress: u32,
    pub terminal: bool,
    pub slow_turns_remaining: u32,
    pub body: Vec<Cell>,
    pub goal: Cell,
    pub portal: Option<Cell>,
    pub items: Vec<TransientItem>,
    pub obstacles: Vec<Cell>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSnapshot {
    pub episode: EpisodeSnapshot,
    pub rays: Vec<RayReading>,
    pub state_key: StateKey,
    pub action_values: ActionValues,
    pub exploration_rate: f32,
    pub lifetime_steps: u64,
    pub table_size: usize,
    pub episode_reward: f32,
    pub stats: TrainingStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TrainingStats {
    pub episodes_completed: u64,
    pub best_score: u32,
    pub best_level: u32,
    pub total_reward: f64,
    /// Final scores of the most recent episodes, oldest first.
    pub recent_scores: Vec<u32>,
}

/// Persisted learner state: the value table plus the two mutable scalars.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TrainedState {
    pub q_table: BTreeMap<StateKey, ActionValues>,
    pub exploration_rate: f32,
    pub lifetime_steps: u64,
}
