use std::borrow::Cow;
use std::fmt::Write as _;

/// Cells wider than this are cut with an ellipsis; attack lists get long.
const MAX_CELL_WIDTH: usize = 48;

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let rows = rows
        .iter()
        .map(|row| row.iter().map(|cell| clip_cell(cell)).collect::<Vec<_>>())
        .collect::<Vec<_>>();

    let mut widths = headers.iter().map(|h| h.chars().count().max(3)).collect::<Vec<_>>();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let header_cells = headers.iter().map(|h| Cow::Borrowed(h.as_str())).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&header_cells, &widths));
    let separator = widths
        .iter()
        .map(|w| Cow::Owned("-".repeat(*w)))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths));
    for row in &rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(cells: &[Cow<'_, str>], widths: &[usize]) -> String {
    let mut line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    line.truncate(line.trim_end().len());
    line
}

fn clip_cell(value: &str) -> Cow<'_, str> {
    let needs_sanitizing = value.contains(['\n', '\r', '\t']);
    let too_wide = value.chars().count() > MAX_CELL_WIDTH;
    if !needs_sanitizing && !too_wide {
        return Cow::Borrowed(value);
    }
    let mut clipped = value
        .chars()
        .map(|ch| if matches!(ch, '\n' | '\r' | '\t') { ' ' } else { ch })
        .take(MAX_CELL_WIDTH)
        .collect::<String>();
    if too_wide {
        clipped.pop();
        clipped.push('…');
    }
    Cow::Owned(clipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligns_columns_and_trims_trailing_space() {
        let rendered = render_table(
            &["name".to_string(), "hp".to_string()],
            &[
                vec!["Pikachu".to_string(), "60.0".to_string()],
                vec!["Mew".to_string(), "".to_string()],
            ],
        );
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "name     hp");
        assert_eq!(lines[1], "-------  ----");
        assert_eq!(lines[2], "Pikachu  60.0");
        assert_eq!(lines[3], "Mew");
    }

    #[test]
    fn clips_long_and_multiline_cells() {
        let long = "x".repeat(MAX_CELL_WIDTH + 10);
        let clipped = clip_cell(&long);
        assert_eq!(clipped.chars().count(), MAX_CELL_WIDTH);
        assert!(clipped.ends_with('…'));
        assert_eq!(clip_cell("a\tb"), "a b");
        assert!(matches!(clip_cell("plain"), Cow::Borrowed("plain")));
    }
}
