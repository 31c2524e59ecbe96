//! Terminal output: the per-pass progress bar and result printing.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

use meshbuild_reconstruction::{AuditSummary, PassReport, Progress};

/// Total width of a rendered bar line, percentage included
const LINE_WIDTH: usize = 80;
/// `[`, `] ` and `NNN%` take the rest of the line
const BAR_WIDTH: usize = LINE_WIDTH - 7;

/// Render `[=====>    ]  42%` for `current` out of `total` iterations
pub fn render_bar(current: usize, total: usize) -> String {
    let (filled, percent) = if total == 0 {
        (BAR_WIDTH, 100)
    } else {
        let current = current.min(total);
        (current * BAR_WIDTH / total, current * 100 / total)
    };

    let mut bar = "=".repeat(filled);
    if filled < BAR_WIDTH {
        bar.push('>');
        bar.push_str(&" ".repeat(BAR_WIDTH - filled - 1));
    }
    format!("[{}] {:>3}%", bar, percent)
}

/// Progress callback that redraws the bar on stdout whenever the percentage changes
pub fn progress_bar() -> Progress {
    let last_percent = AtomicUsize::new(usize::MAX);
    Progress::new(move |current, total, _message| {
        let percent = if total == 0 { 100 } else { current.min(total) * 100 / total };
        if last_percent.swap(percent, Ordering::Relaxed) == percent {
            return;
        }
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "\r{}", render_bar(current, total));
        let _ = stdout.flush();
    })
}

pub fn print_pass(report: &PassReport) {
    println!(
        "With rho={}, constructed a mesh of size {}",
        report.radius, report.total_triangles
    );
}

pub fn print_audit(summary: &AuditSummary) {
    let topology = &summary.topology;
    println!("Audit:");
    println!(
        "  vertices: {} orphan, {} front, {} inner",
        topology.orphan_vertices, topology.front_vertices, topology.inner_vertices
    );
    println!(
        "  edges:    {} active, {} boundary, {} inner",
        topology.active_edges, topology.boundary_edges, topology.inner_edges
    );
    println!("  triangles: {}", topology.triangles);
    if !topology.is_consistent() {
        println!(
            "  topology errors: {} overfull edges, {} edge states, {} vertex states, {} missing edges",
            topology.overfull_edges,
            topology.mismatched_edges,
            topology.mismatched_vertices,
            topology.missing_edges
        );
    }
    println!("  occupied balls: {}", summary.occupied_balls);
    println!("  winding violations: {}", summary.winding_violations);
    println!("  status: {}", if summary.is_clean() { "clean" } else { "FAILED" });
}

/// Pass reports as JSON; with an audit the reports move under `passes`
pub fn to_json(reports: &[PassReport], audit: Option<&AuditSummary>) -> serde_json::Result<String> {
    match audit {
        Some(audit) => serde_json::to_string_pretty(&serde_json::json!({
            "passes": reports,
            "audit": audit,
        })),
        None => serde_json::to_string_pretty(reports),
    }
}
