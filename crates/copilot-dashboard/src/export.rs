//! Flag export
//!
//! Both formats operate on already-fetched flags only and build the whole
//! document in memory before anything is written.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use shared_types::ComplianceFlag;

/// CSV header, in column order
pub const CSV_COLUMNS: [&str; 9] = [
    "id",
    "category",
    "region",
    "risk_level",
    "rationale",
    "contract_file",
    "contract_page",
    "rule_file",
    "rule_section",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn render(&self, flags: &[ComplianceFlag]) -> String {
        match self {
            ExportFormat::Json => flags_to_json(flags),
            ExportFormat::Csv => flags_to_csv(flags),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format '{}' (expected json or csv)", other)),
        }
    }
}

/// Pretty-printed JSON array of the flags
pub fn flags_to_json(flags: &[ComplianceFlag]) -> String {
    serde_json::to_string_pretty(flags).unwrap_or_else(|_| "[]".to_string())
}

/// CSV with every field quoted and embedded quotes doubled. Rows are joined
/// with `\n`; there is no trailing newline.
pub fn flags_to_csv(flags: &[ComplianceFlag]) -> String {
    let header = CSV_COLUMNS.map(quote).join(",");
    let rows = flags.iter().map(|flag| csv_row(flag).join(","));

    std::iter::once(header)
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}

fn csv_row(flag: &ComplianceFlag) -> [String; 9] {
    let page = flag
        .contract_evidence
        .page
        .map(|p| p.to_string())
        .unwrap_or_default();
    let section = flag.rule_evidence.section.as_deref().unwrap_or_default();

    [
        quote(&flag.id),
        quote(&flag.category),
        quote(&flag.region),
        quote(flag.risk_level.as_str()),
        quote(&flag.rationale),
        quote(&flag.contract_evidence.file),
        quote(&page),
        quote(&flag.rule_evidence.file),
        quote(section),
    ]
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// `flags_<unix millis>.<ext>`
pub fn export_file_name(format: ExportFormat, now: DateTime<Utc>) -> String {
    format!("flags_{}.{}", now.timestamp_millis(), format.extension())
}

/// Write the export into `dir` and return the created path
pub fn write_export(
    dir: &Path,
    format: ExportFormat,
    flags: &[ComplianceFlag],
    now: DateTime<Utc>,
) -> std::io::Result<PathBuf> {
    let path = dir.join(export_file_name(format, now));
    std::fs::write(&path, format.render(flags))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use shared_types::{Evidence, RiskLevel};

    fn sample_flag() -> ComplianceFlag {
        ComplianceFlag {
            id: "privacy-retention".to_string(),
            category: "privacy".to_string(),
            region: "EU".to_string(),
            risk_level: RiskLevel::High,
            rationale: "Clause says \"indefinitely\"".to_string(),
            contract_evidence: Evidence {
                file: "nda.pdf".to_string(),
                page: Some(4),
                section: None,
            },
            rule_evidence: Evidence {
                file: "gdpr.md".to_string(),
                page: None,
                section: Some("Art. 5(1)(e)".to_string()),
            },
        }
    }

    #[test]
    fn test_csv_layout() {
        let csv = flags_to_csv(&[sample_flag()]);
        let expected = concat!(
            "\"id\",\"category\",\"region\",\"risk_level\",\"rationale\",",
            "\"contract_file\",\"contract_page\",\"rule_file\",\"rule_section\"\n",
            "\"privacy-retention\",\"privacy\",\"EU\",\"HIGH\",\"Clause says \"\"indefinitely\"\"\",",
            "\"nda.pdf\",\"4\",\"gdpr.md\",\"Art. 5(1)(e)\""
        );
        assert_eq!(csv, expected);
    }

    #[test]
    fn test_csv_empty_flags_is_header_only() {
        let csv = flags_to_csv(&[]);
        assert_eq!(csv.lines().count(), 1);
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn test_missing_evidence_renders_empty() {
        let mut flag = sample_flag();
        flag.contract_evidence.page = None;
        flag.rule_evidence.section = None;
        let csv = flags_to_csv(&[flag]);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains("\"nda.pdf\",\"\",\"gdpr.md\",\"\""));
    }

    #[test]
    fn test_json_empty_round_trip() {
        let json = flags_to_json(&[]);
        let parsed: Vec<ComplianceFlag> = serde_json::from_str(&json).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_export_file_name() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            export_file_name(ExportFormat::Csv, now),
            "flags_1700000000123.csv"
        );
        assert_eq!(
            export_file_name(ExportFormat::Json, now),
            "flags_1700000000123.json"
        );
    }

    #[test]
    fn test_write_export() {
        let dir = std::env::temp_dir().join(format!("copilot-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let now = Utc.timestamp_millis_opt(42).unwrap();

        let path = write_export(&dir, ExportFormat::Json, &[sample_flag()], now).unwrap();

        assert_eq!(path.file_name().unwrap(), "flags_42.json");
        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<ComplianceFlag> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, vec![sample_flag()]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    fn risk_level() -> impl Strategy<Value = RiskLevel> {
        prop_oneof![
            Just(RiskLevel::High),
            Just(RiskLevel::Medium),
            Just(RiskLevel::Low),
        ]
    }

    fn evidence() -> impl Strategy<Value = Evidence> {
        (
            "[^\r\n]{0,12}",
            proptest::option::of(0u32..500),
            proptest::option::of("[^\r\n]{0,12}"),
        )
            .prop_map(|(file, page, section)| Evidence {
                file,
                page,
                section,
            })
    }

    fn flag_strategy() -> impl Strategy<Value = ComplianceFlag> {
        (
            "[^\r\n]{1,12}",
            "[a-z\"]{0,10}",
            "(EU|US|IN|UK)",
            risk_level(),
            "[^\r\n]{0,40}",
            evidence(),
            evidence(),
        )
            .prop_map(
                |(id, category, region, risk_level, rationale, contract_evidence, rule_evidence)| {
                    ComplianceFlag {
                        id,
                        category,
                        region,
                        risk_level,
                        rationale,
                        contract_evidence,
                        rule_evidence,
                    }
                },
            )
    }

    proptest! {
        /// Property: one header line plus one line per flag
        #[test]
        fn csv_has_one_line_per_flag(flags in proptest::collection::vec(flag_strategy(), 0..20)) {
            let csv = flags_to_csv(&flags);
            prop_assert_eq!(csv.lines().count(), flags.len() + 1);
        }

        /// Property: every quote inside a field is doubled and every field is wrapped
        #[test]
        fn csv_quotes_are_doubled(flag in flag_strategy()) {
            let csv = flags_to_csv(std::slice::from_ref(&flag));
            let row = csv.lines().nth(1).unwrap();

            let embedded: usize = [
                &flag.id,
                &flag.category,
                &flag.region,
                &flag.rationale,
                &flag.contract_evidence.file,
                &flag.rule_evidence.file,
            ]
            .iter()
            .map(|s| s.matches('"').count())
            .sum::<usize>()
                + flag.rule_evidence.section.as_deref().unwrap_or_default().matches('"').count();

            prop_assert_eq!(row.matches('"').count(), 2 * CSV_COLUMNS.len() + 2 * embedded);
            let expected_prefix = format!("\"{}\",", flag.id.replace('"', "\"\""));
            prop_assert!(row.starts_with(&expected_prefix));
        }

        /// Property: JSON export parses back to the same flags
        #[test]
        fn json_round_trip(flags in proptest::collection::vec(flag_strategy(), 0..10)) {
            let json = flags_to_json(&flags);
            let parsed: Vec<ComplianceFlag> = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(parsed, flags);
        }
    }
}
