//! Preview selection: priority ranking, option-driven fallback, and the
//! tier mapping that drives the medium/full entry points
//!
//! Per-format parsers assign priorities; selection only compares them.
//! The tier path works differently: it indexes into the discovered
//! candidate list, using a per-format slot rule, with a Nikon model
//! table overriding slots for bodies whose candidate ordering is known
//! to be unreliable (size-based "smart" selection instead).

use crate::formats::RawFormat;
use crate::options::ExtractionOptions;
use crate::preview::PreviewInfo;

/// Which tier a direct-position entry point asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Medium,
    Full,
}

/// Candidate-list slots for a tier, or size-based selection
#[derive(Debug, Clone, Copy)]
pub(crate) struct SlotRule {
    pub full: usize,
    pub medium: usize,
    pub smart: bool,
}

const SMART: SlotRule = SlotRule {
    full: 0,
    medium: 1,
    smart: true,
};

const TRADITIONAL: SlotRule = SlotRule {
    full: 0,
    medium: 1,
    smart: false,
};

/// Nikon bodies with known candidate-ordering quirks. Matched by
/// substring against the Model tag; unknown models default to smart
/// selection.
const NIKON_MODEL_RULES: &[(&str, SlotRule)] = &[
    ("Z 9", SMART),
    ("Z 8", SMART),
    ("Z 7II", SMART),
    ("Z 6III", SMART),
    ("Z 6II", SMART),
    ("Z 6", TRADITIONAL),
    ("Z 5", SMART),
    ("Z fc", SMART),
    ("Z 30", SMART),
    ("D850", SMART),
    ("D780", SMART),
    ("D6", SMART),
    ("D750", TRADITIONAL),
    ("D810", TRADITIONAL),
    ("D610", TRADITIONAL),
    ("D7500", TRADITIONAL),
    ("D7200", TRADITIONAL),
    ("D5600", TRADITIONAL),
    ("D3500", TRADITIONAL),
];

pub(crate) fn nikon_rule(model: &str) -> SlotRule {
    for (pattern, rule) in NIKON_MODEL_RULES {
        if model.contains(pattern) {
            return *rule;
        }
    }
    SMART
}

pub(crate) fn format_rule(format: RawFormat) -> SlotRule {
    match format {
        // Sony stores the full-size candidate last, the medium first
        RawFormat::Arw => SlotRule {
            full: 2,
            medium: 0,
            smart: false,
        },
        // CR3 candidates are ordered THMB, PRVW, MDAT
        RawFormat::Cr3 => SlotRule {
            full: 2,
            medium: 1,
            smart: false,
        },
        RawFormat::Cr2
        | RawFormat::Nef
        | RawFormat::Dng
        | RawFormat::Raf
        | RawFormat::Orf
        | RawFormat::Rw2 => TRADITIONAL,
    }
}

fn largest(previews: &[PreviewInfo]) -> Option<&PreviewInfo> {
    previews.iter().max_by_key(|p| p.size)
}

fn second_largest(previews: &[PreviewInfo]) -> Option<&PreviewInfo> {
    if previews.len() <= 1 {
        return previews.first();
    }
    let mut by_size: Vec<&PreviewInfo> = previews.iter().collect();
    by_size.sort_by(|a, b| b.size.cmp(&a.size));
    Some(by_size[1])
}

/// Pick the candidate for a tier entry point
///
/// NEF consults the model table; every other format uses its fixed slot
/// rule. A slot beyond the candidate list falls back to position 0 for
/// full and 1 (or 0) for medium.
pub(crate) fn select_tier<'a>(
    format: RawFormat,
    model: Option<&str>,
    previews: &'a [PreviewInfo],
    tier: Tier,
) -> Option<&'a PreviewInfo> {
    if previews.is_empty() {
        return None;
    }

    let rule = match format {
        RawFormat::Nef => nikon_rule(model.unwrap_or("")),
        _ => format_rule(format),
    };

    if rule.smart {
        return match tier {
            Tier::Full => largest(previews),
            Tier::Medium => second_largest(previews),
        };
    }

    let index = match tier {
        Tier::Full => rule.full,
        Tier::Medium => rule.medium,
    };
    if let Some(p) = previews.get(index) {
        return Some(p);
    }
    match tier {
        Tier::Full => previews.first(),
        Tier::Medium => previews.get(1).or_else(|| previews.first()),
    }
}

fn in_range(size: usize, options: &ExtractionOptions) -> bool {
    size >= options.target_min_size && size <= options.target_max_size
}

/// Highest priority wins; on ties prefer a candidate inside the target
/// range (larger within it). With `closest_to_1mb`, ties where both
/// fall outside the range go to the size nearest 1 MiB (Sony bodies
/// cluster there).
pub(crate) fn best_by_priority<'a>(
    previews: &'a [PreviewInfo],
    options: &ExtractionOptions,
    closest_to_1mb: bool,
) -> Option<&'a PreviewInfo> {
    const MID_TARGET: usize = 1024 * 1024;
    let mut best: Option<&PreviewInfo> = None;
    for p in previews {
        let current = match best {
            None => {
                best = Some(p);
                continue;
            }
            Some(b) => b,
        };
        if p.priority > current.priority {
            best = Some(p);
        } else if p.priority == current.priority {
            let current_in = in_range(current.size, options);
            let candidate_in = in_range(p.size, options);
            if candidate_in && (!current_in || p.size > current.size) {
                best = Some(p);
            } else if closest_to_1mb && !current_in && !candidate_in {
                let current_diff = current.size.abs_diff(MID_TARGET);
                let candidate_diff = p.size.abs_diff(MID_TARGET);
                if candidate_diff < current_diff {
                    best = Some(p);
                }
            }
        }
    }
    best
}

/// Highest priority, ties broken by larger size
pub(crate) fn best_by_size(previews: &[PreviewInfo]) -> Option<&PreviewInfo> {
    let mut best: Option<&PreviewInfo> = None;
    for p in previews {
        match best {
            None => best = Some(p),
            Some(b) if p.priority > b.priority => best = Some(p),
            Some(b) if p.priority == b.priority && p.size > b.size => best = Some(p),
            _ => {}
        }
    }
    best
}

/// Largest candidate inside the target range, else the first candidate
pub(crate) fn best_in_range_or_first<'a>(
    previews: &'a [PreviewInfo],
    options: &ExtractionOptions,
) -> Option<&'a PreviewInfo> {
    previews
        .iter()
        .filter(|p| in_range(p.size, options))
        .max_by_key(|p| p.size)
        .or_else(|| previews.first())
}

/// Option-driven fallback when the format's pick lands outside the
/// caller's target range: re-rank all candidates, in-range first, by
/// preferred-quality match then size
pub(crate) fn rerank_for_options<'a>(
    previews: &'a [PreviewInfo],
    options: &ExtractionOptions,
) -> Option<&'a PreviewInfo> {
    let mut candidates: Vec<&PreviewInfo> = previews
        .iter()
        .filter(|p| in_range(p.size, options))
        .collect();
    if candidates.is_empty() {
        candidates = previews.iter().collect();
    }
    candidates.sort_by(|a, b| {
        let a_match = a.quality == options.preferred_quality;
        let b_match = b.quality == options.preferred_quality;
        b_match.cmp(&a_match).then(b.size.cmp(&a.size))
    });
    candidates.first().copied()
}
