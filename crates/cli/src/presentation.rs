//! Plain-text rendering of search results for the terminal.

use carfinder_core::domain::vehicle::VehicleRecord;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

pub const INTRO: &str = "Car finder. Free-form conversation. Type 'search' when ready; 'exit' to \
                         quit.\n\nExamples:\n- 'I want a Honda under 30k'\n- 'Since 2018, hybrid, \
                         under 25k'\n";
pub const NO_MATCH: &str = "Sorry, at the moment we don't have cars available that match your \
                            search. Please try again.";
pub const NEW_SEARCH_PROMPT: &str = "Type 'new' to start another search or 'exit' to quit.";
pub const FAREWELL: &str = "Bye.";

pub fn render_listing(records: &[VehicleRecord]) -> String {
    let mut lines = vec!["Results:".to_string()];
    lines.extend(
        records.iter().enumerate().map(|(index, record)| render_line(index + 1, record)),
    );
    lines.join("\n")
}

pub fn render_line(position: usize, record: &VehicleRecord) -> String {
    format!(
        "- {position}. {} {} {}, {}, {} km, {}",
        record.make,
        record.model,
        record.year,
        record.color,
        group_thousands(i128::from(record.mileage)),
        format_price(record.dollar_price)
    )
}

/// Whole dollars with `.` as thousands separator; cents are dropped.
pub fn format_price(price: Decimal) -> String {
    match price.trunc().to_i128() {
        Some(dollars) => format!("US$ {}", group_thousands(dollars)),
        None => format!("US$ {price}"),
    }
}

fn group_thousands(value: i128) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    grouped
}
