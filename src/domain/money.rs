use std::fmt;

/// Amounts are kept in the smallest currency unit (dirams, cents).
/// 1 unit = 100 minor units, so 1_000_00 is one thousand.
pub type Money = i64;

/// Render minor units as a decimal string.
/// Example: 100000 -> "1000.00", -5 -> "-0.05"
pub fn format_money(amount: Money) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse a decimal string into minor units.
/// Example: "1000" -> 100000, "12.5" -> 1250, ".05" -> 5
///
/// More than two fractional digits are rejected rather than truncated,
/// since a payment must never be silently rounded.
pub fn parse_money(input: &str) -> Result<Money, ParseMoneyError> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (units_str, fraction_str) = match digits.split_once('.') {
        Some((units, fraction)) => (units, fraction),
        None => (digits, ""),
    };

    if (units_str.is_empty() && fraction_str.is_empty()) || fraction_str.contains('.') {
        return Err(ParseMoneyError::InvalidFormat);
    }
    if fraction_str.len() > 2 {
        return Err(ParseMoneyError::TooPrecise);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        parse_digits(units_str)?
    };
    let fraction: i64 = match fraction_str.len() {
        0 => 0,
        1 => parse_digits(fraction_str)? * 10,
        _ => parse_digits(fraction_str)?,
    };

    let amount = units
        .checked_mul(100)
        .and_then(|minor| minor.checked_add(fraction))
        .ok_or(ParseMoneyError::OutOfRange)?;

    Ok(if negative { -amount } else { amount })
}

fn parse_digits(s: &str) -> Result<i64, ParseMoneyError> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseMoneyError::InvalidFormat);
    }
    s.parse().map_err(|_| ParseMoneyError::OutOfRange)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseMoneyError {
    InvalidFormat,
    TooPrecise,
    OutOfRange,
}

impl fmt::Display for ParseMoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseMoneyError::InvalidFormat => write!(f, "invalid money format"),
            ParseMoneyError::TooPrecise => write!(f, "at most two decimal places are allowed"),
            ParseMoneyError::OutOfRange => write!(f, "amount is out of range"),
        }
    }
}

impl std::error::Error for ParseMoneyError {}
