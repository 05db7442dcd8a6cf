// src/table/parser.rs

use std::mem;

/// Split raw CSV text into rows of raw fields.
///
/// Single pass, one character at a time:
///  - outside quotes: `"` opens a quoted run, `,` ends the field, `\n` ends
///    the row, `\r` is dropped, anything else is kept
///  - inside quotes: `""` is a literal quote, a lone `"` closes the run,
///    everything else (commas, newlines) is kept verbatim
///
/// A trailing row without a final newline is still emitted. A quote in
/// the middle of an unquoted field opens a quoted run and is itself dropped,
/// so `e"` reads as `e`.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => row.push(mem::take(&mut field)),
            '\n' => {
                row.push(mem::take(&mut field));
                rows.push(mem::take(&mut row));
            }
            '\r' => {}
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}
