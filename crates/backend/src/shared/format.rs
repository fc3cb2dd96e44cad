/// Format an integer with `,` thousands separators
///
/// # Examples
/// ```ignore
/// assert_eq!(format_number(1234567), "1,234,567");
/// assert_eq!(format_number(42), "42");
/// ```
pub fn format_number(n: usize) -> String {
    group_thousands(&n.to_string())
}

fn group_thousands(digits: &str) -> String {
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Format a number the way en-MY locale output looks: grouped thousands,
/// at most `max_fraction_digits` decimals, trailing zeros dropped.
pub fn format_decimal(value: f64, max_fraction_digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rounded = format!("{:.*}", max_fraction_digits, value.abs());
    let (int_part, frac_part) = match rounded.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (rounded.as_str(), ""),
    };

    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    let mut out = String::new();
    if value < 0.0 && !is_zero {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Compact money: `MYR 1.2M`, `MYR 45K`, `MYR 980`
pub fn format_currency_compact(value: f64, currency: &str) -> String {
    if value >= 1_000_000.0 {
        format!("{} {:.1}M", currency, value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{} {:.0}K", currency, value / 1_000.0)
    } else {
        format!("{} {:.0}", currency, value)
    }
}

/// Whole money with separators: `MYR 12,345`
pub fn format_currency_whole(value: f64, currency: &str) -> String {
    format!("{} {}", currency, format_decimal(value, 0))
}

/// `margin_pct` -> `Margin Pct`
pub fn humanize_column(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// First `n` whitespace separated words, used for short chart labels
pub fn first_words(s: &str, n: usize) -> String {
    s.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}

/// Round to the nearest integer, halves towards positive infinity (`-12.5` -> `-12`)
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}
