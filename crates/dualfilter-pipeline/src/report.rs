// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Text report rendered from the final table

use crate::error::{PipelineError, PipelineResult};
use crate::record::Record;
use crate::result_table::ResultTable;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

const LINE_WIDTH: usize = 80;

fn rule(out: &mut String, ch: char) {
    out.extend(std::iter::repeat(ch).take(LINE_WIDTH));
    out.push('\n');
}

/// Render statistics, every input record, and the records that passed both filters
pub fn render_report(records: &[Record], table: &ResultTable) -> String {
    let stats = table.stats();
    let mut out = String::new();

    rule(&mut out, '=');
    out.push_str("STATISTICS:\n");
    let _ = writeln!(
        out,
        "  Total: {}, Filter1: {}, Filter2: {}, Both: {}",
        stats.total, stats.filter1, stats.filter2, stats.both
    );
    out.push('\n');

    rule(&mut out, '=');
    out.push_str("INITIAL DATA\n");
    rule(&mut out, '-');
    let _ = writeln!(
        out,
        "{:<6}{:<16}{:<10}{:<10}",
        "ID", "Location", "Uptime", "Load"
    );
    rule(&mut out, '-');
    for record in records {
        let _ = writeln!(
            out,
            "{:<6}{:<16}{:<10}{:<10.2}",
            record.id, record.location, record.uptime, record.load
        );
    }
    out.push('\n');

    rule(&mut out, '=');
    out.push_str("FILTERED RESULTS (passed both filters)\n");
    rule(&mut out, '-');
    let _ = writeln!(
        out,
        "{:<6}{:<16}{:<10}{:<10}{:<14}{:<14}",
        "ID", "Location", "Uptime", "Load", "Reliability", "Stability"
    );
    rule(&mut out, '-');
    for result in table.intersection() {
        let _ = writeln!(
            out,
            "{:<6}{:<16}{:<10}{:<10.2}{:<14.4}{:<14.4}",
            result.id, result.location, result.uptime, result.load, result.metric_a, result.metric_b
        );
    }
    rule(&mut out, '=');

    out
}

/// Write the report, creating parent directories
pub fn write_report(path: &Path, text: &str) -> PipelineResult<()> {
    let io_err = |source| PipelineError::Report {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, text).map_err(io_err)?;

    info!("[PIPELINE] Report written to {}", path.display());
    Ok(())
}
