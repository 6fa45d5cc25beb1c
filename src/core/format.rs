//! Display formatting for prices, market caps and changes

/// Formats a USD amount as `$1,234.56`, or `-$1,234.56` for anything with a
/// negative sign (including values that round to zero, e.g. `-$0.00`).
/// Non-finite values skip grouping and fall back to `$NaN`, `$Infinity` or
/// `$-Infinity`.
pub fn format_usd(n: f64) -> String {
    if n.is_nan() {
        return "$NaN".to_string();
    }
    if n.is_infinite() {
        let sign = if n < 0.0 { "-" } else { "" };
        return format!("${sign}Infinity");
    }

    let fixed = format!("{:.2}", n.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if n.is_sign_negative() { "-" } else { "" };
    format!("{sign}${}.{frac_part}", group_thousands(int_part))
}

/// Scales large values to T/B/M with two decimals, otherwise `format_usd`.
pub fn format_market_cap(n: f64) -> String {
    if n >= 1e12 {
        format!("${:.2}T", n / 1e12)
    } else if n >= 1e9 {
        format!("${:.2}B", n / 1e9)
    } else if n >= 1e6 {
        format!("${:.2}M", n / 1e6)
    } else {
        format_usd(n)
    }
}

pub fn format_change(change: Option<f64>) -> String {
    format!("{:.2}%", change.unwrap_or(0.0))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
