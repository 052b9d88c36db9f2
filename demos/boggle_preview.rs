//! Print a freshly generated Boggle round without touching the board.
//!
//! Run with: cargo run --example boggle_preview -- 5

use vesta_helper::boggle::{END_BOUNDARY, START_BOUNDARY};
use vesta_helper::{generate_grids, Characters};

fn main() -> Result<(), vesta_helper::Error> {
    let size = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(4);

    let grids = generate_grids(size)?;
    let template = grids.size.template();

    println!("Boggle {} letters:", grids.size);
    let positions = template.letter_positions();
    for row in positions.chunks(usize::from(grids.size.dimension())) {
        let letters: Vec<String> = row
            .iter()
            .map(|&(r, c)| letter(grids.start[r][c]).to_string())
            .collect();
        println!("  {}", letters.join(" "));
    }

    println!("\nStart grid:");
    print_grid(&grids.start);
    println!("\nEnd grid:");
    print_grid(&grids.end);
    Ok(())
}

fn letter(code: u8) -> char {
    match code {
        1..=26 => char::from(b'A' + code - 1),
        _ => '?',
    }
}

fn print_grid(grid: &Characters) {
    for row in grid {
        let line: String = row
            .iter()
            .map(|&code| match code {
                0 => ' ',
                START_BOUNDARY => '#',
                END_BOUNDARY => '=',
                1..=26 => letter(code),
                _ => '.',
            })
            .collect();
        println!("  |{line}|");
    }
}
