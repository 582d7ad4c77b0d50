use serde::Serialize;

/// A record that can be shown as one line of a plain-text table.
pub trait TableRow {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_table<R: TableRow>(rows: &[R]) {
    print!("{}", render_table(rows));
}

/// Left-aligned columns, two spaces apart, widths counted in characters.
pub fn render_table<R: TableRow>(rows: &[R]) -> String {
    let cells: Vec<Vec<String>> = rows.iter().map(TableRow::cells).collect();

    let mut widths: Vec<usize> = R::HEADERS.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, R::HEADERS.iter().copied(), &widths);
    push_line(
        &mut out,
        widths.iter().map(|&w| "-".repeat(w)),
        &widths,
    );
    for row in &cells {
        push_line(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_line<S: AsRef<str>>(out: &mut String, cells: impl Iterator<Item = S>, widths: &[usize]) {
    let line = cells
        .zip(widths)
        .map(|(cell, &width)| {
            let cell = cell.as_ref();
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair(&'static str, &'static str);

    impl TableRow for Pair {
        const HEADERS: &'static [&'static str] = &["NAME", "VALUE"];

        fn cells(&self) -> Vec<String> {
            vec![self.0.to_string(), self.1.to_string()]
        }
    }

    #[test]
    fn columns_align_to_widest_cell() {
        let table = render_table(&[Pair("DeleteTrail", "x"), Pair("é", "")]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "NAME         VALUE");
        assert_eq!(lines[1], "-----------  -----");
        assert_eq!(lines[2], "DeleteTrail  x");
        assert_eq!(lines[3], "é");
    }

    #[test]
    fn empty_table_still_has_header() {
        let table = render_table::<Pair>(&[]);
        assert_eq!(table, "NAME  VALUE\n----  -----\n");
    }
}
