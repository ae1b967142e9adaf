/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use adkpi_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let formatted = format!("{:.prec$}", value.abs(), prec = decimals as usize);

    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let grouped = group_thousands(int_part);
    let mut result = match frac_part {
        Some(f) => format!("{}.{}", grouped, f),
        None => grouped,
    };
    if negative {
        result.insert(0, '-');
    }
    result
}

/// Format a monetary amount as a USD string with two decimal places.
///
/// # Examples
///
/// ```
/// use adkpi_core::formatting::format_currency;
///
/// assert_eq!(format_currency(1234.56), "$1,234.56");
/// assert_eq!(format_currency(0.0), "$0.00");
/// ```
pub fn format_currency(amount: f64) -> String {
    format!("${}", format_number(amount, 2))
}

/// Format a fraction as a percentage with one decimal place: `0.405` → `"40.5%"`.
pub fn format_percent(fraction: f64) -> String {
    format!("{}%", format_number(fraction * 100.0, 1))
}

/// Format a multiple such as ROAS: `2.5` → `"2.50x"`.
pub fn format_multiple(value: f64) -> String {
    format!("{}x", format_number(value, 2))
}

/// Insert a comma every three digits, right to left.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
