//! Deterministic tag colours.

/// Palette tag colours are picked from (six hex digits, no `#`).
const PALETTE: &[&str] = &[
    "f44336", "e91e63", "9c27b0", "673ab7", "3f51b5", "2196f3", "03a9f4", "00bcd4",
    "009688", "4caf50", "8bc34a", "cddc39", "ffc107", "ff9800", "ff5722", "795548",
    "607d8b", "aa1409", "2f6a31", "0d47a1",
];

/// Colour for a tag derived from its name. The same name always yields the
/// same colour, across runs and hosts.
#[must_use]
pub fn tag_color(name: &str) -> &'static str {
    // FNV-1a; std's hasher is randomly seeded.
    let hash = name
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
        });
    let index = usize::try_from(hash % PALETTE.len() as u64).unwrap_or_default();
    PALETTE[index]
}

/// Whether `color` is six hex digits.
#[must_use]
pub fn is_valid_color(color: &str) -> bool {
    color.len() == 6 && color.bytes().all(|b| b.is_ascii_hexdigit())
}
