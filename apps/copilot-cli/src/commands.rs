//! Subcommand execution

use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use copilot_client::CancellationToken;
use copilot_dashboard::render::{
    render_anonymization, render_corrected_document, render_correlations,
    render_document_analysis, render_explain_modal, render_extracted_fields, render_flags,
    render_notice, render_pathway, render_rules, render_simplified, render_system_status,
    render_tables,
};
use copilot_dashboard::{write_export, AppState, Dashboard, RuleInput};
use shared_types::NewDocument;
use tracing::{debug, info};

use crate::{Command, RuleCommand};

fn show(dashboard: &Dashboard, render: impl FnOnce(&AppState) -> String) {
    let output = dashboard.store().read(render);
    print!("{}", output);
}

fn show_notice(dashboard: &Dashboard) {
    if let Some(notice) = dashboard.store().read(|s| s.notice.clone()) {
        println!("{}", render_notice(&notice));
    }
}

fn select_contract(dashboard: &Dashboard, contract: Option<&Path>) {
    if let Some(path) = contract {
        dashboard.select_contract(path);
    }
}

pub async fn run(dashboard: &Dashboard, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Upload { file } => {
            dashboard.select_contract(file);
            let result = dashboard.upload_contract().await;
            show_notice(dashboard);
            result?;
            show(dashboard, render_extracted_fields);
        }

        Command::AddRule { file, text } => {
            let result = dashboard.add_rule(RuleInput { file, text }).await;
            show_notice(dashboard);
            result?;
            show(dashboard, render_rules);
        }

        Command::Rules => {
            dashboard.refresh_rules().await;
            show(dashboard, render_rules);
        }

        Command::Rule(RuleCommand::Show { name }) => {
            let rule = dashboard.load_rule(&name).await?;
            println!("{}", rule.text);
        }

        Command::Rule(RuleCommand::Save(save)) => {
            let text = match (save.file, save.text) {
                (Some(path), _) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, Some(text)) => text,
                (None, None) => anyhow::bail!("Provide --file or --text"),
            };
            dashboard.set_editor(save.name, text);
            let result = dashboard.save_rule().await;
            show_notice(dashboard);
            result?;
            show(dashboard, render_rules);
        }

        Command::Check { contract } => {
            select_contract(dashboard, contract.as_deref());
            let result = dashboard.check_compliance().await;
            show_notice(dashboard);
            result?;
            show(dashboard, render_flags);
        }

        Command::Explain { id } => {
            let result = dashboard.explain(id).await;
            show(dashboard, |s| render_explain_modal(&s.explain));
            result?;
        }

        Command::Correlations => {
            let result = dashboard.analyze_risk_correlation().await;
            show(dashboard, render_correlations);
            result?;
        }

        Command::Tables => {
            let result = dashboard.extract_tables().await;
            show(dashboard, render_tables);
            result?;
        }

        Command::Status => {
            let probe = dashboard.api().health(&CancellationToken::new()).await;
            match &probe {
                Ok(_) => println!("Backend: reachable"),
                Err(e) => println!("Backend: unreachable ({})", e),
            }
            let result = dashboard.check_system_status().await;
            show(dashboard, render_system_status);
            probe?;
            result?;
        }

        Command::Search { query } => {
            let result = dashboard.pathway_search(&query).await;
            show_notice(dashboard);
            result?;
            show(dashboard, render_pathway);
        }

        Command::Stats | Command::Activity => {
            tokio::join!(
                dashboard.refresh_pathway_stats(),
                dashboard.refresh_live_activity()
            );
            show(dashboard, render_pathway);
        }

        Command::AddDoc {
            name,
            content,
            kind,
        } => {
            let document = NewDocument {
                content,
                name,
                kind: kind.into(),
            };
            let result = dashboard.add_document(document).await;
            show_notice(dashboard);
            result?;
            show(dashboard, render_pathway);
        }

        Command::Export {
            format,
            out,
            contract,
        } => {
            select_contract(dashboard, contract.as_deref());
            let flags = dashboard.check_compliance().await?;
            let path = write_export(&out, format, &flags, Utc::now())
                .with_context(|| format!("Failed to write export to {}", out.display()))?;
            info!(path = %path.display(), flags = flags.len(), "Flags exported");
            println!("Exported {} flag(s) to {}", flags.len(), path.display());
        }

        Command::Watch { .. } => watch(dashboard).await,

        Command::Simplified { domain } => {
            let result = dashboard.simplified_analysis(&domain).await;
            show(dashboard, render_simplified);
            result?;
        }

        Command::Anonymize { method, contract } => {
            select_contract(dashboard, contract.as_deref());
            dashboard.check_compliance().await?;
            let result = dashboard.anonymize(method).await;
            show(dashboard, render_anonymization);
            result?;
        }

        Command::AnonymizationInfo => {
            let result = dashboard.anonymization_info().await;
            show(dashboard, render_anonymization);
            result?;
        }

        Command::Analyze => {
            let result = dashboard.analyze_document().await;
            show(dashboard, render_document_analysis);
            result?;
        }

        Command::Correct { out } => {
            let result = dashboard.generate_corrected_document().await;
            show(dashboard, render_corrected_document);
            result?;

            if let Some(out) = out {
                let bytes = dashboard.download_corrected_document().await?;
                tokio::fs::write(&out, &bytes)
                    .await
                    .with_context(|| format!("Failed to write {}", out.display()))?;
                println!("Saved corrected document to {}", out.display());
            }
        }
    }

    Ok(())
}

/// Print the Pathway panel after every poll until Ctrl-C
async fn watch(dashboard: &Dashboard) {
    let poller = dashboard.start_live_polling();
    let mut updates = poller.subscribe();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let diagnostics = updates.borrow_and_update().clone();
                debug!(ticks = diagnostics.ticks, failures = diagnostics.failures, "Poll tick");
                show(dashboard, render_pathway);
            }
        }
    }

    poller.stop().await;
}
