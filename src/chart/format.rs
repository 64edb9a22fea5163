/// Whole dollars with thousands separators, e.g. `$1,744,691` or `-$2,500`.
pub fn format_dollars(value: f64) -> String {
    let rounded = value.round();
    let digits = (rounded.abs() as u64).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// A fraction as a percentage with one decimal, e.g. `0.121` -> `12.1%`.
pub fn format_percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}
