use nepse_core::domain::signal::Snapshot;

const TITLE: &str = "Nepse Live Tracker";

/// Renders the three signal tables, skipping any that are empty.
pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    out.push_str(TITLE);
    out.push('\n');
    out.push_str(&format!(
        "generated {} from {} ({} quotes, {} bands, {} matched)\n",
        snapshot.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        snapshot.source,
        snapshot.quotes_fetched,
        snapshot.bands_loaded,
        snapshot.records_joined,
    ));

    let signals = &snapshot.signals;
    if signals.is_empty() {
        out.push_str("\nNo breakouts, breakdowns or watchlist entries.\n");
        return out;
    }

    if !signals.breakouts.is_empty() {
        let rows: Vec<Vec<String>> = signals
            .breakouts
            .iter()
            .map(|r| vec![r.symbol.clone(), price(r.ltp), price(r.high), r.kind.label().to_string()])
            .collect();
        write_table(&mut out, "Breakout", &["Symbol", "LTP", "High", "Type"], &rows);
    }

    if !signals.breakdowns.is_empty() {
        let rows: Vec<Vec<String>> = signals
            .breakdowns
            .iter()
            .map(|r| vec![r.symbol.clone(), price(r.ltp), price(r.bottom), r.kind.label().to_string()])
            .collect();
        write_table(&mut out, "Breakdown", &["Symbol", "LTP", "Bottom", "Type"], &rows);
    }

    if !signals.watchlist.is_empty() {
        let rows: Vec<Vec<String>> = signals
            .watchlist
            .iter()
            .map(|r| {
                vec![
                    r.symbol.clone(),
                    price(r.ltp),
                    price(r.bottom),
                    price(r.high),
                    r.kind.label().to_string(),
                ]
            })
            .collect();
        write_table(
            &mut out,
            "Watchlist",
            &["Symbol", "LTP", "Bottom", "High", "Type"],
            &rows,
        );
    }

    out
}

fn price(v: f64) -> String {
    format!("{v:.2}")
}

fn write_table(out: &mut String, title: &str, headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    out.push('\n');
    out.push_str(title);
    out.push('\n');

    let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_line(out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(out, &rule, &widths);
    for row in rows {
        push_line(out, row, &widths);
    }
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{cell:<w$}", w = *w))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}
