use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const CURRENCY_MARKER: &str = "R$";

/// Parses a pt-BR style number such as `R$ 1.234,56`.
///
/// When both separators are present the `.` groups thousands and the `,` is
/// the decimal mark. A lone `,` is always the decimal mark. A lone `.` groups
/// thousands only when exactly three digits follow the last one.
///
/// Empty, unparsable and non-positive values yield `None`. Values are held
/// as `Decimal`, so anything beyond its range (about 28 significant digits,
/// magnitude up to ~7.9e28) is unparsable too and ends up `None`, or zero
/// through [`parse_locale_number_or_zero`].
pub fn parse_locale_number(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .replace(CURRENCY_MARKER, "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let has_dot = cleaned.contains('.');
    let has_comma = cleaned.contains(',');

    let canonical = if has_dot && has_comma {
        cleaned.replace('.', "").replace(',', ".")
    } else if has_comma {
        cleaned.replace(',', ".")
    } else if has_dot && groups_thousands(&cleaned) {
        cleaned.replace('.', "")
    } else {
        cleaned
    };

    Decimal::from_str(&canonical).ok().filter(|value| *value > Decimal::ZERO)
}

/// Same as [`parse_locale_number`], with undefined values mapped to zero.
/// Used for columns that are summed.
pub fn parse_locale_number_or_zero(text: &str) -> Decimal {
    parse_locale_number(text).unwrap_or(Decimal::ZERO)
}

/// Converts `H:MM` or `H:MM:SS` into fractional hours.
///
/// Lenient: anything that does not parse counts as a zero-length trip rather
/// than dropping the row.
pub fn parse_duration(text: &str) -> Decimal {
    let parts: Vec<&str> = text.trim().split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Decimal::ZERO;
    }

    let mut fields = [0u32; 3];
    for (slot, part) in fields.iter_mut().zip(&parts) {
        match part.trim().parse::<u32>() {
            Ok(value) => *slot = value,
            Err(_) => return Decimal::ZERO,
        }
    }

    let [hours, minutes, seconds] = fields;
    Decimal::from(hours) + Decimal::from(minutes) / dec!(60) + Decimal::from(seconds) / dec!(3600)
}

fn groups_thousands(text: &str) -> bool {
    text.rsplit('.')
        .next()
        .is_some_and(|tail| tail.len() == 3 && tail.bytes().all(|b| b.is_ascii_digit()))
}
