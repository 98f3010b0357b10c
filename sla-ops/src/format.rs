//! Output rendering: one JSON-looking line per minute, joined by `\n`.

use crate::window::OutputRecord;

/// Renders an average: `0` for no data, an integer when the value is whole,
/// otherwise one decimal place.
pub fn format_average(average: Option<f64>) -> String {
    match average {
        None => "0".to_string(),
        Some(v) if v.fract() == 0.0 => format!("{v:.0}"),
        Some(v) => format!("{v:.1}"),
    }
}

pub fn render_record(record: &OutputRecord) -> String {
    format!(
        "{{\"date\": \"{}\", \"average_delivery_time\": {}}}",
        record.minute,
        format_average(record.average)
    )
}

/// Joins rendered records with single newlines, without a trailing one.
pub fn render(records: &[OutputRecord]) -> String {
    records
        .iter()
        .map(render_record)
        .collect::<Vec<_>>()
        .join("\n")
}
