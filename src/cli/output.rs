//! Output formatting for CLI

use tabload::load::DdlOutcome;
use tabload::pipeline::PipelineReport;

/// Rejected rows listed before truncating
const REJECTED_PREVIEW: usize = 20;

/// Format a run report for the terminal
pub fn format_report(report: &PipelineReport) -> String {
    let mut output = String::new();

    if let DdlOutcome::Ignored(reason) = &report.load.ddl {
        output.push_str(&format!(
            "\n⚠️  Create table failed and was ignored: {reason}\n"
        ));
    }

    if !report.rejected.is_empty() {
        output.push_str(&format!(
            "\n⚠️  Rejected {} row(s):\n",
            report.rejected.len()
        ));
        for rejected in report.rejected.iter().take(REJECTED_PREVIEW) {
            let errors: Vec<String> = rejected.errors.iter().map(|e| e.to_string()).collect();
            output.push_str(&format!(
                "  - row {}: {} [{}]\n",
                rejected.index,
                errors.join("; "),
                rejected.row
            ));
        }
        if report.rejected.len() > REJECTED_PREVIEW {
            output.push_str(&format!(
                "  ... and {} more (see the log file)\n",
                report.rejected.len() - REJECTED_PREVIEW
            ));
        }
    }

    output.push_str(&format!(
        "\n✅ Loaded {} of {} row(s) into '{}' in {} batch(es) ({})\n",
        report.load.rows_inserted,
        report.rows_extracted,
        report.table,
        report.load.committed_batches(),
        report.duration_formatted()
    ));
    output.push_str(&format!("   Run: {}\n", report.run_id));

    output
}

/// Format a run report as JSON
pub fn format_json(report: &PipelineReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
