use rand::seq::SliceRandom;
use std::io;
use std::path::Path;

/// Passages used when the user does not bring their own text
pub const PASSAGES: &[&str] = &[
    "The quick brown fox jumps over the lazy dog while the cat sleeps in the sun.",
    "Practice makes progress. Type slowly at first, then let your fingers find the rhythm.",
    "A journey of a thousand miles begins with a single step, and every key is one more.",
    "She sells sea shells by the sea shore, and the shells she sells are surely sea shells.",
    "Good habits formed at home carry over to the keyboard: posture, patience and focus.",
    "In 1969, Apollo 11 landed on the Moon; the crew spent about 21 hours on the surface.",
    "fn main() { let total: u32 = (1..=10).sum(); println!(\"{}\", total); }",
];

pub fn random_passage() -> &'static str {
    PASSAGES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(PASSAGES[0])
}

/// Read a passage from a file, collapsing all whitespace runs to single spaces
pub fn load_passage(path: &Path) -> io::Result<String> {
    let raw = std::fs::read_to_string(path)?;
    Ok(normalize(&raw))
}

pub fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
