//! Natural order string comparison
//!
//! Orders strings the way a human reads them: embedded digit runs compare by
//! magnitude, everything else by code point. Used for version qualifiers and
//! SNAPSHOT timestamps / build numbers.

use std::cmp::Ordering;

/// Compare two strings in natural order.
///
/// Whitespace and zeros in front of each run are skipped. When both strings
/// end without a decision, the count of zeros skipped right before the end
/// breaks the tie (fewer zeros sorts first).
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut ia = 0;
    let mut ib = 0;

    loop {
        let (ca, nza) = skip_padding(&a, &mut ia);
        let (cb, nzb) = skip_padding(&b, &mut ib);

        if is_digit(ca) && is_digit(cb) {
            let result = compare_digit_runs(&a[ia..], &b[ib..]);
            if result != Ordering::Equal {
                return result;
            }
        }

        if ca.is_none() && cb.is_none() {
            return nza.cmp(&nzb);
        }

        // None (end of input) sorts before any character
        match ca.cmp(&cb) {
            Ordering::Equal => {}
            unequal => return unequal,
        }

        ia += 1;
        ib += 1;
    }
}

/// Advances `index` past whitespace and zeros, returning the character it
/// stopped on and the count of consecutive zeros directly before it.
fn skip_padding(chars: &[char], index: &mut usize) -> (Option<char>, usize) {
    let mut zeros = 0;
    let mut current = chars.get(*index).copied();

    while let Some(c) = current {
        if c == '0' {
            zeros += 1;
        } else if c.is_whitespace() {
            zeros = 0;
        } else {
            break;
        }
        *index += 1;
        current = chars.get(*index).copied();
    }

    (current, zeros)
}

/// Compares two digit runs by magnitude.
///
/// The longer run wins. For runs of equal length the first differing digit
/// decides, which we only know once both runs have ended.
fn compare_digit_runs(a: &[char], b: &[char]) -> Ordering {
    let mut bias = Ordering::Equal;
    let mut i = 0;

    loop {
        let ca = a.get(i).copied();
        let cb = b.get(i).copied();

        match (is_digit(ca), is_digit(cb)) {
            (false, false) => return bias,
            (false, true) => return Ordering::Less,
            (true, false) => return Ordering::Greater,
            (true, true) => {
                if bias == Ordering::Equal {
                    bias = ca.cmp(&cb);
                }
            }
        }

        i += 1;
    }
}

fn is_digit(c: Option<char>) -> bool {
    c.is_some_and(|c| c.is_ascii_digit())
}
