use contracts::shared::query_row::{CellValue, QueryRow};
use contracts::usecases::u101_ask_question::VisualizationType;

use crate::shared::format::format_decimal;

/// Short natural-language answer for the rows a question produced
pub fn format_answer(
    explanation: &str,
    rows: &[QueryRow],
    visualization_type: VisualizationType,
) -> String {
    if rows.is_empty() {
        return format!("{}\n\nNo data found for this query.", explanation);
    }

    if visualization_type == VisualizationType::Scalar {
        if let Some(value) = rows[0].first_value() {
            return format!(
                "{}\n\nThe answer is: **{}**",
                explanation,
                format_cell(value)
            );
        }
    }

    let suffix = if rows.len() == 1 { "" } else { "s" };
    format!("{}\n\nFound {} result{}.", explanation, rows.len(), suffix)
}

fn format_cell(value: &CellValue) -> String {
    match value {
        CellValue::Number(n) => format_decimal(*n, 2),
        CellValue::Text(s) => s.clone(),
        CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        CellValue::Null => "null".to_string(),
    }
}
