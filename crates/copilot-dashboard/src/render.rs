//! Text rendering of dashboard panels
//!
//! Every function here is pure: state in, `String` out. The CLI prints the
//! result to stdout; tests compare it directly.

use std::fmt::{self, Write};

use serde_json::Value;
use shared_types::{ExtractedTable, RiskCorrelation, RiskLevel};

use crate::state::{AppState, ExplainModal, ExplainStatus, Notice, Slice};

const RULE: &str = "────────────────────────────────────────────────────────────────";

fn build(f: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut output = String::new();
    // fmt::Write for String never fails
    let _ = f(&mut output);
    output
}

fn header(output: &mut String, title: &str) -> fmt::Result {
    writeln!(output, "{}", RULE)?;
    writeln!(output, "{}", title)?;
    writeln!(output, "{}", RULE)
}

/// Writes the loading/error line for a slice; returns true if the body
/// should be skipped
fn slice_status<T>(output: &mut String, slice: &Slice<T>) -> Result<bool, fmt::Error> {
    if slice.loading {
        writeln!(output, "Loading...")?;
        return Ok(true);
    }
    if let Some(error) = &slice.error {
        writeln!(output, "Error: {}", error)?;
        return Ok(true);
    }
    Ok(false)
}

fn badge(level: &RiskLevel) -> String {
    format!("[{}]", level.as_str())
}

/// One line of risk counts for the current flags
pub fn render_stats_grid(state: &AppState) -> String {
    let counts = state.flag_counts();
    format!(
        "Total: {}  High: {}  Medium: {}  Low: {}",
        counts.total, counts.high, counts.medium, counts.low
    )
}

pub fn render_flags(state: &AppState) -> String {
    build(|output| {
        header(output, &format!("Compliance Flags ({})", state.session.region))?;
        if slice_status(output, &state.flags)? {
            return Ok(());
        }
        writeln!(output, "{}", render_stats_grid(state))?;
        writeln!(output)?;

        if state.flags.data.is_empty() {
            writeln!(output, "No flags.")?;
            return Ok(());
        }

        for flag in &state.flags.data {
            writeln!(output, "{} {}  {}", badge(&flag.risk_level), flag.id, flag.category)?;
            writeln!(output, "  {}", flag.rationale)?;

            let contract = &flag.contract_evidence;
            match contract.page {
                Some(page) => writeln!(output, "  Contract: {} (p. {})", contract.file, page)?,
                None => writeln!(output, "  Contract: {}", contract.file)?,
            }
            let rule = &flag.rule_evidence;
            match &rule.section {
                Some(section) => writeln!(output, "  Rule:     {} § {}", rule.file, section)?,
                None => writeln!(output, "  Rule:     {}", rule.file)?,
            }
            writeln!(output)?;
        }
        Ok(())
    })
}

/// Fields extracted from the last uploaded contract, values shown as received
pub fn render_extracted_fields(state: &AppState) -> String {
    build(|output| {
        header(output, "Extracted Fields")?;
        if state.extracted_fields.is_empty() {
            writeln!(output, "No fields extracted.")?;
        }
        for field in &state.extracted_fields {
            match field.evidence.page {
                Some(page) => writeln!(output, "  {}: {}  (p. {})", field.name, field.value, page)?,
                None => writeln!(output, "  {}: {}", field.name, field.value)?,
            }
        }
        Ok(())
    })
}

/// Overall risk across correlations plus follow-up advice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationSummary {
    pub overall: RiskLevel,
    pub high: usize,
    pub medium: usize,
    pub recommendations: Vec<&'static str>,
}

impl CorrelationSummary {
    pub fn from_correlations(correlations: &[RiskCorrelation]) -> Self {
        let high = correlations
            .iter()
            .filter(|c| c.risk_level == RiskLevel::High)
            .count();
        let medium = correlations
            .iter()
            .filter(|c| c.risk_level == RiskLevel::Medium)
            .count();

        let overall = if high > 0 {
            RiskLevel::High
        } else if medium > 0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        let mut recommendations = Vec::new();
        if correlations.is_empty() {
            recommendations.push("No significant risk correlations found");
        }
        if high > 0 {
            recommendations.push("Immediate review required for high-risk correlations");
        }
        if medium > 0 {
            recommendations.push("Consider reviewing medium-risk correlations");
        }

        Self {
            overall,
            high,
            medium,
            recommendations,
        }
    }
}

pub fn render_correlations(state: &AppState) -> String {
    build(|output| {
        header(output, "Risk Correlations")?;
        if slice_status(output, &state.correlations)? {
            return Ok(());
        }

        let correlations = &state.correlations.data;
        let summary = CorrelationSummary::from_correlations(correlations);
        writeln!(output, "Overall risk: {}", summary.overall)?;
        writeln!(
            output,
            "Correlations: {}  High: {}  Medium: {}",
            correlations.len(),
            summary.high,
            summary.medium
        )?;
        for recommendation in &summary.recommendations {
            writeln!(output, "  • {}", recommendation)?;
        }

        for correlation in correlations {
            writeln!(output)?;
            writeln!(
                output,
                "{} {}  (confidence {:.0}%)",
                badge(&correlation.risk_level),
                correlation.correlation_type,
                correlation.confidence * 100.0
            )?;
            writeln!(output, "  {}", correlation.description)?;
            if let Some(matching) = correlation.matching_fields {
                writeln!(
                    output,
                    "  Fields: {} | Indicators: {}",
                    matching,
                    correlation.risk_indicators.len()
                )?;
            }
            for field in &correlation.fields {
                writeln!(output, "  - {}", field)?;
            }
            if !correlation.jurisdictions.is_empty() {
                writeln!(
                    output,
                    "  Jurisdictions: {}",
                    correlation.jurisdictions.join(", ")
                )?;
            }
            for indicator in &correlation.risk_indicators {
                writeln!(
                    output,
                    "  ! {} ({} = {})",
                    indicator.indicator, indicator.field, indicator.value
                )?;
            }
        }
        Ok(())
    })
}

fn write_table(output: &mut String, table: &ExtractedTable) -> fmt::Result {
    let title = table
        .title
        .as_deref()
        .or(table.table_id.as_deref())
        .unwrap_or("Untitled table");
    match table.page {
        Some(page) => writeln!(output, "{} (p. {})", title, page)?,
        None => writeln!(output, "{}", title)?,
    }

    if !table.is_structured() {
        writeln!(output, "{}", table.content.as_deref().unwrap_or(""))?;
        return Ok(());
    }

    let columns = table
        .rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(table.headers.len()))
        .max()
        .unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in std::iter::once(&table.headers).chain(table.rows.iter()) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |output: &mut String, cells: &[String]| -> fmt::Result {
        let padded: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, width)| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                format!("{:<width$}", cell, width = *width)
            })
            .collect();
        writeln!(output, "| {} |", padded.join(" | "))
    };

    if !table.headers.is_empty() {
        line(output, table.headers.as_slice())?;
        let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(output, "|-{}-|", separator.join("-|-"))?;
    }
    for row in &table.rows {
        line(output, row.as_slice())?;
    }
    Ok(())
}

pub fn render_tables(state: &AppState) -> String {
    build(|output| {
        header(output, "Extracted Tables")?;
        if slice_status(output, &state.tables)? {
            return Ok(());
        }
        if state.tables.data.is_empty() {
            writeln!(output, "No tables found.")?;
        }
        for table in &state.tables.data {
            write_table(output, table)?;
            writeln!(output)?;
        }
        Ok(())
    })
}

/// Empty string while the modal is closed
pub fn render_explain_modal(modal: &ExplainModal) -> String {
    let ExplainModal::Open { flag_id, status } = modal else {
        return String::new();
    };

    build(|output| {
        header(output, &format!("Explanation: {}", flag_id))?;
        match status {
            ExplainStatus::Loading => writeln!(output, "Loading explanation...")?,
            ExplainStatus::Populated(result) => {
                if !result.region.is_empty() {
                    writeln!(output, "Region: {}", result.region)?;
                }
                if let Some(contract) = &result.contract {
                    writeln!(output, "Contract: {}", contract.path)?;
                    if let Some(evidence) = &contract.evidence {
                        if let Some(page) = evidence.page {
                            writeln!(output, "Page: {}", page)?;
                        }
                        if let Some(text) = &evidence.text {
                            writeln!(output, "Evidence: {}", text)?;
                        }
                    }
                }
                writeln!(output)?;
                writeln!(output, "Rule snippet:")?;
                writeln!(output, "{}", result.rule_snippet)?;
            }
            ExplainStatus::Failed { message, raw } => {
                writeln!(output, "Error: {}", message)?;
                if let Some(raw) = raw {
                    writeln!(output, "Raw response:")?;
                    writeln!(output, "{}", raw)?;
                }
            }
        }
        Ok(())
    })
}

pub fn render_rules(state: &AppState) -> String {
    build(|output| {
        header(output, "Rules")?;
        if state.rules.items.is_empty() {
            writeln!(output, "No rules uploaded.")?;
        }
        for rule in &state.rules.items {
            match rule.size {
                Some(size) => writeln!(output, "  {}  ({} bytes)", rule.name, size)?,
                None => writeln!(output, "  {}", rule.name)?,
            }
        }

        let editor = &state.rules.editor;
        if !editor.text.is_empty() {
            writeln!(output)?;
            writeln!(output, "Editor: {}", editor.name)?;
            writeln!(output, "{}", editor.text)?;
        }
        Ok(())
    })
}

fn availability(available: bool) -> &'static str {
    if available {
        "✓ available"
    } else {
        "✗ unavailable"
    }
}

pub fn render_system_status(state: &AppState) -> String {
    build(|output| {
        header(output, "System Status")?;
        if slice_status(output, &state.system_status)? {
            return Ok(());
        }
        let Some(status) = &state.system_status.data else {
            writeln!(output, "Not checked yet.")?;
            return Ok(());
        };
        writeln!(output, "  LandingAI:  {}", availability(status.landingai_available))?;
        writeln!(output, "  Pathway:    {}", availability(status.pathway_available))?;
        for (key, value) in &status.extra {
            writeln!(output, "  {}: {}", key, display_value(value))?;
        }
        Ok(())
    })
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn render_pathway(state: &AppState) -> String {
    let pathway = &state.pathway;
    build(|output| {
        header(output, "Pathway")?;
        match &pathway.stats {
            Some(stats) => {
                writeln!(output, "Documents indexed: {}", stats.document_count)?;
                for (key, value) in &stats.extra {
                    writeln!(output, "  {}: {}", key, display_value(value))?;
                }
            }
            None => writeln!(output, "Documents indexed: -")?,
        }

        writeln!(output)?;
        writeln!(output, "Live activity:")?;
        if pathway.activity.is_empty() {
            writeln!(output, "  (none)")?;
        }
        for entry in &pathway.activity {
            let parts: Vec<&str> = [
                entry.timestamp.as_deref(),
                entry.action.as_deref(),
                entry.document.as_deref(),
                entry.message.as_deref(),
            ]
            .into_iter()
            .flatten()
            .collect();
            writeln!(output, "  {}", parts.join("  "))?;
        }

        let search = &pathway.search;
        if search.loading || search.error.is_some() || !search.data.is_empty() {
            writeln!(output)?;
            writeln!(output, "Search results:")?;
            if slice_status(output, search)? {
                return Ok(());
            }
            for (i, result) in search.data.iter().enumerate() {
                match result.score {
                    Some(score) => writeln!(output, "  {}. ({:.3}) {}", i + 1, score, result.content)?,
                    None => writeln!(output, "  {}. {}", i + 1, result.content)?,
                }
            }
        }
        Ok(())
    })
}

pub fn render_notice(notice: &Notice) -> String {
    match notice {
        Notice::Info(message) => format!("✓ {}", message),
        Notice::Error(message) => format!("✗ {}", message),
    }
}

pub fn render_simplified(state: &AppState) -> String {
    let slice = &state.analysis.simplified;
    build(|output| {
        header(output, "Simplified Analysis")?;
        if slice_status(output, slice)? {
            return Ok(());
        }
        let Some(analysis) = &slice.data else {
            writeln!(output, "No analysis yet.")?;
            return Ok(());
        };
        writeln!(output, "Region: {}  Domain: {}", analysis.region, analysis.domain)?;
        if let Some(path) = &analysis.document_path {
            writeln!(output, "Document: {}", path)?;
        }
        writeln!(output, "  Extracted fields:   {}", analysis.extracted_fields.len())?;
        writeln!(output, "  Generated rules:    {}", analysis.generated_rules.len())?;
        writeln!(output, "  Relevant rules:     {}", analysis.relevant_rules.len())?;
        writeln!(output, "  Compliance flags:   {}", analysis.compliance_flags.len())?;
        writeln!(output, "  Risk correlations:  {}", analysis.risk_correlations.len())?;
        Ok(())
    })
}

pub fn render_document_analysis(state: &AppState) -> String {
    let slice = &state.analysis.document;
    build(|output| {
        header(output, "Correction Opportunities")?;
        if slice_status(output, slice)? {
            return Ok(());
        }
        let Some(analysis) = &slice.data else {
            writeln!(output, "No analysis yet.")?;
            return Ok(());
        };
        if analysis.correction_opportunities.is_empty() {
            writeln!(output, "No corrections suggested.")?;
        }
        for opportunity in &analysis.correction_opportunities {
            let level = opportunity
                .risk_level
                .as_ref()
                .map(badge)
                .unwrap_or_else(|| "[-]".to_string());
            writeln!(
                output,
                "{} {}",
                level,
                opportunity.category.as_deref().unwrap_or("general")
            )?;
            if let Some(text) = &opportunity.original_text {
                writeln!(output, "  Original:   {}", text)?;
            }
            if let Some(suggestion) = &opportunity.correction_suggestion {
                writeln!(output, "  Suggested:  {}", suggestion)?;
            }
            if let Some(reason) = &opportunity.reason {
                writeln!(output, "  Reason:     {}", reason)?;
            }
        }
        Ok(())
    })
}

pub fn render_corrected_document(state: &AppState) -> String {
    let slice = &state.analysis.corrected;
    build(|output| {
        header(output, "Corrected Document")?;
        if slice_status(output, slice)? {
            return Ok(());
        }
        let Some(document) = &slice.data else {
            writeln!(output, "Not generated yet.")?;
            return Ok(());
        };
        let summary = &document.change_summary;
        writeln!(
            output,
            "Changes applied: {}  (high priority: {}, medium priority: {})",
            document.changes_applied,
            summary.high_priority_corrections,
            summary.medium_priority_corrections
        )?;
        if !summary.categories.is_empty() {
            writeln!(output, "Categories: {}", summary.categories.join(", "))?;
        }
        writeln!(output)?;
        writeln!(output, "{}", document.corrected_content)?;
        Ok(())
    })
}

pub fn render_anonymization(state: &AppState) -> String {
    let analysis = &state.analysis;
    build(|output| {
        header(output, "Anonymization")?;
        if !slice_status(output, &analysis.anonymization)? {
            if let Some(info) = &analysis.anonymization.data {
                writeln!(output, "Enabled: {}", if info.enabled { "yes" } else { "no" })?;
                if !info.methods.is_empty() {
                    writeln!(output, "Methods: {}", info.methods.join(", "))?;
                }
            }
        }

        if slice_status(output, &analysis.anonymized)? {
            return Ok(());
        }
        if let Some(response) = &analysis.anonymized.data {
            writeln!(output, "Anonymized records: {}", response.data.len())?;
            for record in &response.data {
                writeln!(output, "  {}", record)?;
            }
        }
        Ok(())
    })
}
