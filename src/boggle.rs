//! Boggle grid generation for the 6x22 board.
//!
//! A round is drawn as two grids. The *start* grid shows the rolled letters
//! inside a frame of [`START_BOUNDARY`] tiles; the *end* grid is the same
//! board with the frame switched to [`END_BOUNDARY`], signalling that time
//! is up.
//!
//! Each board size has fixed artwork: the left columns spell "BOGGLE" down
//! the rows and the right columns hold the round timer. Size 4 needs a
//! separate begin row to reach six rows; size 5 does not, its first mid row
//! already carries the top of the artwork.
//!
//! # Example
//!
//! ```
//! use vesta_helper::boggle::{generate_grids, END_BOUNDARY, START_BOUNDARY};
//!
//! let grids = generate_grids(4).unwrap();
//! assert!(grids.start.iter().flatten().any(|&c| c == START_BOUNDARY));
//! assert!(grids.end.iter().flatten().all(|&c| c != START_BOUNDARY));
//! assert!(grids.end.iter().flatten().any(|&c| c == END_BOUNDARY));
//! ```

use std::fmt;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::{Characters, Row, BOARD_ROWS};

/// Template cell that receives a rolled letter.
pub const LETTER_PLACEHOLDER: u8 = 1;

/// Frame tile shown while a round is running.
pub const START_BOUNDARY: u8 = 66;

/// Frame tile shown once the round is over.
pub const END_BOUNDARY: u8 = 63;

/// How long a round lasts before the end grid is shown.
pub const ROUND_DURATION: Duration = Duration::from_secs(200);

/// A single die, one letter per face.
pub type Die = &'static str;

const DICE_4: [Die; 16] = [
    "AEANEG", "AHSPCO", "ABBJOO", "AFFKPS", "AOOTTW", "CIMOTU", "DEILRX", "DELRVY", "DISTTY",
    "EEGHNW", "EEINSU", "EHRTVW", "EIOSST", "ELRTTY", "HIMNUT", "HLNNRZ",
];

const DICE_5: [Die; 25] = [
    "QBZJXK", "HHLRDC", "TELPCI", "TTOTEM", "AEAEEE", "TOUOTC", "NHDTHC", "SSNSEU", "SCTIEP",
    "YIFPSR", "OVWRGR", "LHNROD", "RIYPRH", "EANDNN", "EEEEMA", "AAAFSR", "AFAISR", "DORDLN",
    "MNNEAG", "ITITIE", "AUMEEG", "YIFASR", "CCWNST", "UOTOWN", "ETILIC",
];

const BEGIN_ROW_4: Row = [
    2, 0, 0, 0, 0, 0, 0, 0, 66, 66, 66, 66, 66, 66, 0, 0, 0, 0, 29, 48, 0, 27,
];

const MID_ROWS_4: [Row; 4] = [
    [15, 20, 0, 0, 0, 0, 0, 0, 66, 1, 1, 1, 1, 66, 0, 0, 0, 0, 30, 48, 0, 27],
    [7, 9, 0, 0, 0, 0, 0, 0, 66, 1, 1, 1, 1, 66, 0, 0, 0, 0, 31, 48, 0, 28],
    [7, 13, 0, 0, 0, 0, 0, 0, 66, 1, 1, 1, 1, 66, 0, 0, 0, 0, 32, 48, 0, 29],
    [12, 5, 0, 0, 0, 0, 0, 0, 66, 1, 1, 1, 1, 66, 0, 0, 0, 0, 33, 48, 0, 31],
];

const END_ROW_4: Row = [
    5, 0, 0, 0, 0, 0, 0, 0, 66, 66, 66, 66, 66, 66, 0, 0, 0, 0, 34, 48, 27, 27,
];

const MID_ROWS_5: [Row; 5] = [
    [2, 0, 0, 0, 0, 0, 0, 66, 1, 1, 1, 1, 1, 66, 0, 0, 0, 0, 29, 48, 0, 27],
    [15, 20, 0, 0, 0, 0, 0, 66, 1, 1, 1, 1, 1, 66, 0, 0, 0, 0, 30, 48, 0, 27],
    [7, 9, 0, 0, 0, 0, 0, 66, 1, 1, 1, 1, 1, 66, 0, 0, 0, 0, 31, 48, 0, 28],
    [7, 13, 0, 0, 0, 0, 0, 66, 1, 1, 1, 1, 1, 66, 0, 0, 0, 0, 32, 48, 0, 29],
    [12, 5, 0, 0, 0, 0, 0, 66, 1, 1, 1, 1, 1, 66, 0, 0, 0, 0, 33, 48, 0, 31],
];

const END_ROW_5: Row = [
    5, 0, 0, 0, 0, 0, 0, 66, 66, 66, 66, 66, 66, 66, 0, 0, 0, 0, 34, 48, 27, 27,
];

static TEMPLATE_4: GridTemplate = GridTemplate {
    dice: &DICE_4,
    begin_row: Some(BEGIN_ROW_4),
    mid_rows: &MID_ROWS_4,
    end_row: END_ROW_4,
};

static TEMPLATE_5: GridTemplate = GridTemplate {
    dice: &DICE_5,
    begin_row: None,
    mid_rows: &MID_ROWS_5,
    end_row: END_ROW_5,
};

/// Supported Boggle variants.
///
/// Deserializes from a plain integer; anything other than 4 or 5 is
/// rejected with [`Error::UnsupportedSize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum BoardSize {
    /// 4x4 letters, 16 dice
    Four,
    /// 5x5 letters, 25 dice
    Five,
}

impl BoardSize {
    /// Letters per side.
    pub const fn dimension(self) -> u8 {
        match self {
            BoardSize::Four => 4,
            BoardSize::Five => 5,
        }
    }

    /// Layout and dice for this size.
    pub fn template(self) -> &'static GridTemplate {
        match self {
            BoardSize::Four => &TEMPLATE_4,
            BoardSize::Five => &TEMPLATE_5,
        }
    }

    /// Number of dice (and letters) in a round.
    pub fn dice_count(self) -> usize {
        self.template().dice.len()
    }
}

impl TryFrom<i64> for BoardSize {
    type Error = Error;

    fn try_from(size: i64) -> Result<Self, Self::Error> {
        match size {
            4 => Ok(BoardSize::Four),
            5 => Ok(BoardSize::Five),
            other => Err(Error::UnsupportedSize(other)),
        }
    }
}

impl From<BoardSize> for u8 {
    fn from(size: BoardSize) -> Self {
        size.dimension()
    }
}

impl fmt::Display for BoardSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.dimension();
        write!(f, "{n}x{n}")
    }
}

/// Fixed board artwork for one size.
#[derive(Debug)]
pub struct GridTemplate {
    /// Dice rolled for this size
    pub dice: &'static [Die],
    /// Row above the letters, if the artwork needs one
    pub begin_row: Option<Row>,
    /// Rows holding [`LETTER_PLACEHOLDER`] cells
    pub mid_rows: &'static [Row],
    /// Bottom row
    pub end_row: Row,
}

impl GridTemplate {
    /// Number of placeholder cells across the mid rows.
    pub fn placeholder_count(&self) -> usize {
        count_placeholders(self.mid_rows)
    }

    /// Board coordinates `(row, col)` of every letter cell, in reading order.
    pub fn letter_positions(&self) -> Vec<(usize, usize)> {
        let offset = usize::from(self.begin_row.is_some());
        self.mid_rows
            .iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, &cell)| cell == LETTER_PLACEHOLDER)
                    .map(move |(c, _)| (r + offset, c))
            })
            .collect()
    }
}

/// The two grids of one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoggleGrids {
    /// Size the grids were generated for
    pub size: BoardSize,
    /// Shown immediately
    pub start: Characters,
    /// Shown when the round ends
    pub end: Characters,
}

/// Generate start and end grids for a board size given as a raw integer.
///
/// Sizes other than 4 and 5 fail with [`Error::UnsupportedSize`] before
/// any dice are rolled.
pub fn generate_grids(size: i64) -> Result<BoggleGrids, Error> {
    let size = BoardSize::try_from(size)?;
    generate_grids_with_rng(size, &mut rand::thread_rng())
}

/// Generate start and end grids using the given random source.
pub fn generate_grids_with_rng<R: Rng + ?Sized>(
    size: BoardSize,
    rng: &mut R,
) -> Result<BoggleGrids, Error> {
    let template = size.template();
    let letters = roll_dice(template.dice, rng);
    let mid_rows = populate(template.mid_rows, letters, rng)?;
    let start = assemble(template, mid_rows)?;
    let end = end_grid(&start);

    tracing::debug!("Generated Boggle {} grids", size);
    Ok(BoggleGrids { size, start, end })
}

/// Roll every die once and return the letter codes (`a` = 1 .. `z` = 26).
///
/// The dice are shuffled before rolling, so the returned order carries no
/// information about which die produced which letter.
pub fn roll_dice<R: Rng + ?Sized>(dice: &[Die], rng: &mut R) -> Vec<u8> {
    let mut order = dice.to_vec();
    order.shuffle(rng);

    order
        .iter()
        .map(|die| {
            let faces = die.as_bytes();
            letter_code(faces[rng.gen_range(0..faces.len())])
        })
        .collect()
}

/// Fill the placeholder cells of `mid_rows` with `letters`.
///
/// Each placeholder takes a letter drawn at random from those not yet
/// placed. Every letter must land in exactly one placeholder: running out
/// early or having letters left over is a [`Error::TemplateMismatch`].
pub fn populate<R: Rng + ?Sized>(
    mid_rows: &[Row],
    letters: Vec<u8>,
    rng: &mut R,
) -> Result<Vec<Row>, Error> {
    let placeholders = count_placeholders(mid_rows);
    let rolled = letters.len();
    let mismatch = || {
        Error::TemplateMismatch(format!(
            "{placeholders} placeholder cells but {rolled} rolled letters"
        ))
    };

    let mut pool = letters;
    let mut rows = mid_rows.to_vec();
    for cell in rows.iter_mut().flat_map(|row| row.iter_mut()) {
        if *cell != LETTER_PLACEHOLDER {
            continue;
        }
        if pool.is_empty() {
            return Err(mismatch());
        }
        let pick = rng.gen_range(0..pool.len());
        *cell = pool.swap_remove(pick);
    }

    if !pool.is_empty() {
        return Err(mismatch());
    }
    Ok(rows)
}

/// Stack the optional begin row, the populated mid rows and the end row
/// into a full board.
pub fn assemble(template: &GridTemplate, mid_rows: Vec<Row>) -> Result<Characters, Error> {
    let rows: Vec<Row> = template
        .begin_row
        .into_iter()
        .chain(mid_rows)
        .chain(std::iter::once(template.end_row))
        .collect();
    let count = rows.len();

    rows.try_into().map_err(|_| {
        Error::TemplateMismatch(format!(
            "assembled {count} rows, board has {BOARD_ROWS}"
        ))
    })
}

/// Derive the end grid: every [`START_BOUNDARY`] becomes [`END_BOUNDARY`].
pub fn end_grid(start: &Characters) -> Characters {
    let mut end = *start;
    for cell in end.iter_mut().flatten() {
        if *cell == START_BOUNDARY {
            *cell = END_BOUNDARY;
        }
    }
    end
}

fn count_placeholders(rows: &[Row]) -> usize {
    rows.iter()
        .flatten()
        .filter(|&&cell| cell == LETTER_PLACEHOLDER)
        .count()
}

fn letter_code(face: u8) -> u8 {
    face.to_ascii_lowercase() - b'a' + 1
}
