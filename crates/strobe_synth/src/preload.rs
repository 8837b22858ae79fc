//! Preload tables: per-tick input rows in `$readmemb` format.

use strobe_plan::Port;

/// Builds `rows` preload rows for the input ports of one domain.
///
/// Each row concatenates every port's sample at that tick, each followed by
/// `_`. A port whose sequence is shorter than `rows` holds its last sample.
pub fn preload_rows(ports: &[&Port], rows: usize) -> Vec<String> {
    (0..rows)
        .map(|t| {
            ports.iter().fold(String::new(), |mut row, port| {
                if let Some(sample) = port.samples().get(t).or_else(|| port.last_sample()) {
                    row.push_str(&sample.to_string());
                }
                row.push('_');
                row
            })
        })
        .collect()
}

/// Renders preload rows as file contents, one row per line.
pub fn render_table(rows: &[String]) -> String {
    rows.iter().fold(String::new(), |mut out, row| {
        out.push_str(row);
        out.push('\n');
        out
    })
}
