use std::collections::HashSet;
use thiserror::Error;

/// Seed used when the command line names none.
pub const DEFAULT_SEED: u64 = 1337;

/// Longest span a `start..end` token may expand to.
pub const MAX_SEED_RANGE: u64 = 10_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("unrecognized seed token: {0}")]
    Unrecognized(String),
    #[error("seed range {start}..{end} is empty")]
    EmptyRange { start: u64, end: u64 },
    #[error("seed range {start}..{end} spans more than 10000 seeds")]
    RangeTooLarge { start: u64, end: u64 },
}

/// Resolve CLI seed tokens into a deduplicated seed list.
///
/// Accepts decimal integers (negative values use their magnitude), `0x` hex
/// literals, and half-open `start..end` ranges. An empty input falls back to
/// [`DEFAULT_SEED`].
///
/// # Errors
///
/// Returns a [`SeedError`] for tokens that are none of the above or for
/// ranges that are empty or too wide.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>, SeedError> {
    let mut seen = HashSet::new();
    let mut seeds = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        for seed in parse_token(token)? {
            if seen.insert(seed) {
                seeds.push(seed);
            }
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }
    Ok(seeds)
}

fn parse_token(token: &str) -> Result<Vec<u64>, SeedError> {
    if let Some((start, end)) = token.split_once("..") {
        let start = parse_single(start)?;
        let end = parse_single(end)?;
        if end <= start {
            return Err(SeedError::EmptyRange { start, end });
        }
        if end - start > MAX_SEED_RANGE {
            return Err(SeedError::RangeTooLarge { start, end });
        }
        return Ok((start..end).collect());
    }
    parse_single(token).map(|seed| vec![seed])
}

fn parse_single(token: &str) -> Result<u64, SeedError> {
    let unrecognized = || SeedError::Unrecognized(token.to_string());
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).map_err(|_| unrecognized());
    }
    if let Ok(value) = token.parse::<i64>() {
        return Ok(value.unsigned_abs());
    }
    token.parse::<u64>().map_err(|_| unrecognized())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolves_numeric_hex_and_negative() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "0xff", "18446744073709551615"]))
            .unwrap();
        assert_eq!(seeds, vec![42, 7, 255, u64::MAX]);
    }

    #[test]
    fn expands_ranges_and_dedupes() {
        let seeds = resolve_seed_inputs(&tokens(&["3..6", "4", "5..7"])).unwrap();
        assert_eq!(seeds, vec![3, 4, 5, 6]);
    }

    #[test]
    fn empty_input_uses_default() {
        assert_eq!(resolve_seed_inputs(&[]).unwrap(), vec![DEFAULT_SEED]);
        assert_eq!(
            resolve_seed_inputs(&tokens(&["", "  "])).unwrap(),
            vec![DEFAULT_SEED]
        );
    }

    #[test]
    fn rejects_bad_tokens_and_ranges() {
        assert_eq!(
            resolve_seed_inputs(&tokens(&["banana"])),
            Err(SeedError::Unrecognized("banana".to_string()))
        );
        assert_eq!(
            resolve_seed_inputs(&tokens(&["9..9"])),
            Err(SeedError::EmptyRange { start: 9, end: 9 })
        );
        assert!(matches!(
            resolve_seed_inputs(&tokens(&["0..20000"])),
            Err(SeedError::RangeTooLarge { .. })
        ));
    }
}
