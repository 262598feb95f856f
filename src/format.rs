//! Display formatting for prices and percentage changes
//!
//! Values are rounded as binary floats, the way the bot always rendered
//! them: `2.675` is stored as `2.67499999...` and shows as `$2.67`, while
//! exact ties such as `68234.5` go to the even neighbour.

use rust_decimal::Decimal;

/// Formats a USD price:
///
/// - `>= 1000`: no decimals, thousands grouped (`$68,234`)
/// - `>= 1`: two decimals, thousands grouped (`$1.50`)
/// - `< 1`: four decimals, no grouping (`$0.0123`)
pub fn format_price(price: Decimal) -> String {
    let Some(value) = to_float(price) else {
        return format!("${}", price);
    };

    if value >= 1000.0 {
        format!("${}", group_thousands(&format!("{:.0}", value)))
    } else if value >= 1.0 {
        format!("${}", group_thousands(&format!("{:.2}", value)))
    } else {
        format!("${:.4}", value)
    }
}

/// Formats a percentage change with an explicit sign: `+2.50%`, `-1.20%`,
/// and `0.00%` only for an exact zero.
pub fn format_change(change: Decimal) -> String {
    if change.is_zero() {
        return "0.00%".to_string();
    }
    let Some(value) = to_float(change) else {
        return format!("{}%", change);
    };

    let magnitude = format!("{:.2}", value.abs());
    if value.is_sign_negative() {
        format!("-{}%", magnitude)
    } else {
        format!("+{}%", magnitude)
    }
}

/// Nearest `f64` to the decimal, as a float parse of the API text gives
fn to_float(value: Decimal) -> Option<f64> {
    value.to_string().parse().ok()
}

/// Inserts `,` every three digits of the integer part
fn group_thousands(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}
