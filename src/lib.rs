//! # vesta-helper
//!
//! A small home automation service for a [Vestaboard](https://www.vestaboard.com)
//! split-flap display.
//!
//! The board shows 6 rows of 22 character codes. This crate provides:
//! - Boggle rounds: a start grid now, the same letters with an "ended"
//!   border 200 seconds later
//! - Text messages and random sayings from a MySQL quotes store
//! - OC Transpo next-trip lookups
//! - Optional axum routes wiring it all to HTTP
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vesta_helper::{generate_grids, start_round, VestaboardClient, ROUND_DURATION};
//!
//! let board = VestaboardClient::new("key", "secret")?;
//! let grids = generate_grids(4)?;
//! let round = start_round(&board, grids, ROUND_DURATION).await?;
//! round.finished().await?;
//! ```
//!
//! ## HTTP Routes
//!
//! | Endpoint | Method | Purpose |
//! |----------|--------|---------|
//! | `/` | GET | Health check |
//! | `/message` | POST | Show a text message |
//! | `/games/boggle` | POST | Start a Boggle round |
//! | `/sfw_quote` | GET | Show a random SFW saying |
//! | `/nsfw_quote` | GET | Show a random NSFW saying |
//! | `/transit/{stop}` | GET | Upcoming trips for a stop |
//! | `/transit/{stop}/table` | GET | Upcoming trips as a text table |
//!
//! ## Feature Flags
//!
//! - `axum` - HTTP routes and the `vesta-helper` binary (default)

pub mod boggle;
pub mod config;
mod error;
pub mod game;
pub mod sayings;
pub mod transit;
pub mod vestaboard;

pub use boggle::{generate_grids, BoardSize, BoggleGrids, ROUND_DURATION};
pub use config::Settings;
pub use error::Error;
pub use game::{start_round, RoundState, ScheduledRound};
pub use sayings::{QuoteKind, QuoteSource, Sayings};
pub use transit::{StopSchedule, TransitClient};
pub use vestaboard::{DisplaySender, VestaboardClient};

/// Board rows
pub const BOARD_ROWS: usize = 6;

/// Board columns
pub const BOARD_COLS: usize = 22;

/// One board row of character codes.
pub type Row = [u8; BOARD_COLS];

/// A full board of character codes, row-major.
///
/// Codes follow the Vestaboard character set: 0 is blank, 1-26 are `A`-`Z`,
/// 63-70 are the colour tiles.
pub type Characters = [Row; BOARD_ROWS];

#[cfg(feature = "axum")]
pub mod api;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_geometry() {
        let board: Characters = [[0; BOARD_COLS]; BOARD_ROWS];
        assert_eq!(board.len(), 6);
        assert_eq!(board[0].len(), 22);
    }

    #[test]
    fn test_reexports_generate_grids() {
        let grids = generate_grids(5).unwrap();
        assert_eq!(grids.size, BoardSize::Five);
        assert!(matches!(generate_grids(7), Err(Error::UnsupportedSize(7))));
    }
}
