//! Game logic constants.
//!
//! These are fixed rules of the simulation rather than configuration: changing
//! them changes the game.

/// Milliseconds of game time per frame.
pub const FRAME_TICK_DURATION_MS: u32 = 100;

/// CPU cycles a baseline machine spends on one instruction.
pub const DEFAULT_CYCLES_PER_INSTRUCTION: u32 = 100;

/// Ticks to build a single component, before hardware modifiers.
///
/// Build time is `ticks_per_component * components * (1 + complexity)`.
pub const DEFAULT_TICKS_TO_BUILD_1_COMPONENT: u32 = 5;

/// Capacitance to build ten components, before hardware modifiers.
pub const DEFAULT_CAP_TO_BUILD_10_COMPONENTS: u32 = 100;

/// Baseline instructions per cycle, used only for relative CPU speed.
pub const CPU_BASELINE_INSTRUCTIONS_PER_CYCLE: f32 = 2.0;

/// Scales engine power against mass when computing turn power.
pub const DEFAULT_MOBILITY: f32 = 1.0;

/// Upper limit on any machine's capacitor.
pub const DEFAULT_MAX_CAPACITOR: u16 = 1000;

/// A tile is this many movement units wide.
pub const INT32_TILE_WIDTH: i32 = 1_000_000;

/// Half a tile in movement units.
pub const INT32_HALF_TILE_WIDTH: i32 = INT32_TILE_WIDTH / 2;

/// Slowest movement speed of a machine that can move.
pub const MIN_MACHINE_MOVE_SPEED: i32 = 1;

/// Fastest movement speed of any machine, per tick.
pub const MAX_MACHINE_MOVE_SPEED: i32 = INT32_TILE_WIDTH / 10;

/// Slowest turn speed of a machine that can turn.
pub const MIN_MACHINE_TURN_SPEED: i32 = 1;

/// Fastest turn speed of any machine, per tick.
pub const MAX_MACHINE_TURN_SPEED: i32 = crate::fixed_angle::SIXTH_PI / 10;

/// Most face turns a single command may request (`83 * 6`).
pub const MAX_FACE_TURNS_LIMIT: u16 = 83 * 6;

/// Capacitance gained per frame per solar panel per unit of sun strength.
pub const SUN_STRENGTH_TO_CAP_FACTOR: f32 = 1.0;

/// Explosion damage per unit of stored capacitance.
pub const EXPLOSIVE_DMG_PER_CAPACITANCE: f32 = 1.0;

/// Explosion damage per component.
pub const EXPLOSIVE_DMG_PER_COMPONENT: f32 = 1.0;

/// Most components any machine may have.
pub const MAX_MACHINE_COMPONENTS: usize = 23;

/// Explosion reach of a machine with every component slot filled.
pub const MAX_EXPLOSION_RANGE: f32 = 4.0;

/// Explosion reach contributed by each component.
#[allow(clippy::cast_precision_loss)]
pub const EXPLOSIVE_RANGE_PER_COMPONENT: f32 = MAX_EXPLOSION_RANGE / MAX_MACHINE_COMPONENTS as f32;

/// Refining period multipliers for Panguite, Kamacite, Ataxite and Chondrite.
pub const REFINING_FACTORS: [f32; 4] = [1.0, 2.0, 4.0, 5.0];

/// Most credits a machine can hold.
pub const MAX_CREDITS_PER_MACHINE: u16 = 0xFFFF;

/// Frames an explosion lasts for observers.
pub const EXPLOSION_DURATION_TICKS: u32 = 20;

/// Frames a firing effect lasts for observers.
pub const FIRING_DURATION_TICKS: u32 = 5;
