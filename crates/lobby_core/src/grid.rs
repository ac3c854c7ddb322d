use rand::Rng;
use shared::domain::Grid;

/// English letter frequencies, scaled so the rarest letters still show up.
const LETTER_WEIGHTS: [(char, u32); 26] = [
    ('E', 12),
    ('T', 9),
    ('A', 8),
    ('O', 8),
    ('I', 8),
    ('N', 7),
    ('S', 7),
    ('H', 6),
    ('R', 6),
    ('D', 4),
    ('L', 4),
    ('C', 3),
    ('U', 3),
    ('M', 3),
    ('W', 3),
    ('F', 2),
    ('G', 2),
    ('Y', 2),
    ('P', 2),
    ('B', 2),
    ('V', 1),
    ('K', 1),
    ('J', 1),
    ('X', 1),
    ('Q', 1),
    ('Z', 1),
];

pub const MIN_GRID_SIZE: usize = 4;
pub const MAX_GRID_SIZE: usize = 8;

pub fn weighted_letter<R: Rng + ?Sized>(rng: &mut R) -> char {
    let total: u32 = LETTER_WEIGHTS.iter().map(|(_, weight)| weight).sum();
    let mut roll = rng.gen_range(0..total);
    for (letter, weight) in LETTER_WEIGHTS {
        if roll < weight {
            return letter;
        }
        roll -= weight;
    }
    LETTER_WEIGHTS[0].0
}

pub fn generate_grid_with<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Grid {
    (0..size)
        .map(|_| (0..size).map(|_| weighted_letter(rng)).collect())
        .collect()
}

pub fn generate_grid(size: usize) -> Grid {
    generate_grid_with(size, &mut rand::thread_rng())
}

/// Checks that `grid` is a `size`x`size` matrix of single ASCII letters and
/// returns it upper-cased.
pub fn normalize_grid(grid: &Grid, size: usize) -> Result<Grid, String> {
    if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&size) {
        return Err(format!(
            "grid size must be between {MIN_GRID_SIZE} and {MAX_GRID_SIZE}"
        ));
    }
    if grid.len() != size || grid.iter().any(|row| row.len() != size) {
        return Err(format!("grid must be {size}x{size}"));
    }
    if grid.iter().flatten().any(|cell| !cell.is_ascii_alphabetic()) {
        return Err("grid cells must be letters".to_string());
    }
    Ok(grid
        .iter()
        .map(|row| row.iter().map(char::to_ascii_uppercase).collect())
        .collect())
}

/// Whether every letter of `word` can be taken from a distinct cell of `grid`.
pub fn letters_available(grid: &Grid, word: &str) -> bool {
    let mut counts = [0u32; 26];
    for cell in grid.iter().flatten() {
        if cell.is_ascii_alphabetic() {
            counts[(cell.to_ascii_uppercase() as u8 - b'A') as usize] += 1;
        }
    }
    for letter in word.chars() {
        if !letter.is_ascii_alphabetic() {
            return false;
        }
        let slot = &mut counts[(letter.to_ascii_uppercase() as u8 - b'A') as usize];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
    }
    true
}

#[cfg(test)]
#[path = "tests/grid_tests.rs"]
mod tests;
