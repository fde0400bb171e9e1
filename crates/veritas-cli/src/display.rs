//! Verdict rendering: pretty JSON for machines, a vertical card for people.

use clap::ValueEnum;
use veritas_core::VerdictRecord;

const LABEL_WIDTH: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Card,
}

pub fn print_record(record: &VerdictRecord, format: Format) -> anyhow::Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(record)?),
        Format::Card => print!("{}", render_card(record)),
    }
    Ok(())
}

pub fn render_card(record: &VerdictRecord) -> String {
    let mut out = String::from("── Verdict ──\n");
    field(&mut out, "tier", record.tier.as_deref());
    field(&mut out, "remedy", record.remedy.as_deref());
    field(
        &mut out,
        "fairness",
        record.fairness_score.map(|s| format!("{s:.2}")).as_deref(),
    );
    field(&mut out, "ritual", record.ritual.as_deref());
    field(&mut out, "jurisdiction", record.jurisdiction.as_deref());
    field(&mut out, "notes", record.notes.as_deref());

    if !record.citations.is_empty() {
        out.push_str(&format!("  citations ({}):\n", record.citations.len()));
        for c in &record.citations {
            out.push_str(&format!("    - {c}\n"));
        }
    }

    if let Some(diagnostics) = &record.diagnostics {
        out.push_str("── Analyzers ──\n");
        for (name, d) in &diagnostics.0 {
            let state = match (&d.error, d.skipped, d.contributed) {
                (Some(e), _, _) => format!("failed: {e}"),
                (None, true, _) => "skipped".to_string(),
                (None, false, true) => "contributed".to_string(),
                (None, false, false) => "no output".to_string(),
            };
            out.push_str(&format!("  {name:<LABEL_WIDTH$}{state}\n"));
        }
    }
    out
}

fn field(out: &mut String, label: &str, value: Option<&str>) {
    out.push_str(&format!("  {label:<LABEL_WIDTH$}{}\n", value.unwrap_or("-")));
}
