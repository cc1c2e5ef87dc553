//! Plain-text answer formatting for executed query rows

use serde_json::Value;

use crate::pipeline::Row;

const PREVIEW_ROWS: usize = 5;
const COUNT_COLUMNS: &[&str] = &["total", "total_movies"];
// Raw aggregate column left unaliased by model-written SQL
const RAW_COUNT_COLUMN: &str = "COUNT(*)";

/// Summarize `rows` as a short narrative answer
pub fn format_answer(rows: &[Row]) -> String {
    if rows.is_empty() {
        return "I couldn't find any movies matching your criteria. Try asking about a different genre, year, or director.".to_string();
    }

    if let [row] = rows {
        if let Some(count) = COUNT_COLUMNS.iter().find_map(|c| row.get(*c)) {
            return format!("I have {} movies in my database.", display(count));
        }
        if let Some(count) = row.get(RAW_COUNT_COLUMN) {
            return format!("I found {} movies in my database.", display(count));
        }
    }

    if rows.len() <= PREVIEW_ROWS {
        let lines: Vec<String> = rows.iter().map(|r| format!("• {}", movie_line(r))).collect();
        return format!("Here are the movies I found:\n{}", lines.join("\n"));
    }

    let mut answer = format!("I found {} movies. Here are the top results:\n", rows.len());
    for (i, row) in rows.iter().take(PREVIEW_ROWS).enumerate() {
        answer.push_str(&format!("{}. {}\n", i + 1, movie_line(row)));
    }
    answer.push_str(&format!("... and {} more movies.", rows.len() - PREVIEW_ROWS));
    answer
}

fn movie_line(row: &Row) -> String {
    let title = text_or(row.get("title"), "Unknown");
    let genre = text_or(row.get("genre"), "Unknown");
    match row.get("total_views") {
        Some(views) => format!("{} ({}) - {} views", title, genre, thousands(views)),
        None => format!("{} ({}) - Rating: {}", title, genre, text_or(row.get("rating"), "N/A")),
    }
}

fn text_or(value: Option<&Value>, fallback: &str) -> String {
    match value {
        None | Some(Value::Null) => fallback.to_string(),
        Some(v) => display(v),
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render an integral view count with comma separators
fn thousands(value: &Value) -> String {
    let n = match value.as_i64().or_else(|| value.as_f64().map(|f| f.round() as i64)) {
        Some(n) => n,
        None => return display(value),
    };

    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_empty() {
        assert!(format_answer(&[]).starts_with("I couldn't find any movies"));
    }

    #[test]
    fn test_count() {
        let rows = vec![row(json!({"total": 100}))];
        assert_eq!(format_answer(&rows), "I have 100 movies in my database.");
    }

    #[test]
    fn test_raw_count_column() {
        let rows = vec![row(json!({"COUNT(*)": 42}))];
        assert_eq!(format_answer(&rows), "I found 42 movies in my database.");

        let rows = vec![row(json!({"total_movies": 7}))];
        assert_eq!(format_answer(&rows), "I have 7 movies in my database.");
    }

    #[test]
    fn test_short_list_with_views() {
        let rows = vec![
            row(json!({"title": "Heat", "genre": "Crime", "total_views": 1234567})),
            row(json!({"title": "Alien", "genre": "Horror", "rating": 8.5})),
        ];
        assert_eq!(
            format_answer(&rows),
            "Here are the movies I found:\n• Heat (Crime) - 1,234,567 views\n• Alien (Horror) - Rating: 8.5"
        );
    }

    #[test]
    fn test_long_list_truncates() {
        let rows: Vec<Row> = (0..7)
            .map(|i| row(json!({"title": format!("M{}", i), "genre": null, "rating": null})))
            .collect();
        let answer = format_answer(&rows);
        assert!(answer.starts_with("I found 7 movies. Here are the top results:\n1. M0 (Unknown) - Rating: N/A\n"));
        assert!(answer.ends_with("... and 2 more movies."));
        assert!(!answer.contains("M5"));
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(&json!(999)), "999");
        assert_eq!(thousands(&json!(1000)), "1,000");
        assert_eq!(thousands(&json!(12000.0)), "12,000");
    }
}
