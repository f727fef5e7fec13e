//! Weighted random branches: `<procedural chance="..">` blocks with `<poss>` options
//!
//! A procedural block survives a first roll against its own chance. A surviving
//! block keeps exactly one of its direct `<poss>` children (or none, when the
//! explicit chances leave a gap and the roll lands in it). The wrapping tags
//! are then unwrapped so only the chosen content remains.

use crate::document::{Document, Tag};
use rand::Rng;
use std::cmp::Ordering;
use tracing::debug;

/// Read a `chance` attribute: a leading decimal number in 0..=100
pub fn parse_chance(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, ch) in raw.char_indices() {
        match ch {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + ch.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    let value: f64 = raw[..end].parse().ok()?;
    (0.0..=100.0).contains(&value).then_some(value)
}

/// Roll for a block with the given chance
pub fn keep_block<R: Rng>(chance: f64, rng: &mut R) -> bool {
    rng.gen::<f64>() * 100.0 < chance
}

/// Pick one possibility by chance
///
/// Explicit chances are summed and clamped to 0..=100, and whatever is left
/// is shared evenly between the possibilities without one. Candidates are
/// ordered from most to least likely and the first whose running total
/// exceeds the roll wins.
pub fn choose_possibility<R: Rng>(chances: &[Option<f64>], rng: &mut R) -> Option<usize> {
    let explicit: f64 = chances.iter().flatten().sum::<f64>().clamp(0.0, 100.0);
    let unset = chances.iter().filter(|chance| chance.is_none()).count();
    let share = if unset > 0 {
        (100.0 - explicit) / unset as f64
    } else {
        0.0
    };

    let mut resolved: Vec<(usize, f64)> = chances
        .iter()
        .enumerate()
        .map(|(index, chance)| (index, chance.unwrap_or(share)))
        .collect();
    resolved.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let roll = rng.gen::<f64>() * 100.0;
    let mut threshold = 0.0;
    for (index, chance) in resolved {
        threshold += chance;
        if roll < threshold {
            return Some(index);
        }
    }
    None
}

/// Resolve every procedural block in the document
pub fn resolve_procedurals<R: Rng>(document: &mut Document, rng: &mut R) {
    for procedural in document.elements_by_tag(&Tag::Procedural) {
        // Blocks nested inside a block that already lost are gone
        if !document.is_alive(procedural) || document.parent(procedural).is_none() {
            continue;
        }

        let chance = parse_chance(document.attribute(procedural, "chance")).unwrap_or(100.0);
        if !keep_block(chance, rng) {
            debug!(chance, "procedural block dropped");
            document.remove(procedural);
            continue;
        }

        let possibilities: Vec<_> = document
            .children(procedural)
            .iter()
            .copied()
            .filter(|child| document.is_tag(*child, &Tag::Possibility))
            .collect();
        if possibilities.is_empty() {
            continue;
        }

        let chances: Vec<Option<f64>> = possibilities
            .iter()
            .map(|poss| parse_chance(document.attribute(*poss, "chance")))
            .collect();
        let winner = choose_possibility(&chances, rng);
        debug!(chance, options = possibilities.len(), ?winner, "procedural block kept");

        for (index, poss) in possibilities.into_iter().enumerate() {
            if Some(index) != winner {
                document.remove(poss);
            }
        }
    }

    let wrappers: Vec<_> = document
        .descendants(document.root())
        .into_iter()
        .filter(|id| {
            document.is_tag(*id, &Tag::Procedural) || document.is_tag(*id, &Tag::Possibility)
        })
        .collect();
    for wrapper in wrappers {
        document.unwrap(wrapper);
    }
}
