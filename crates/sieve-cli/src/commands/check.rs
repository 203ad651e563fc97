//! Batch check command

use super::Context;
use anyhow::{Context as _, Result};
use sieve_core::ItemUpdate;
use sieve_scrutinize::{EvaluationEngine, QaWarning, ScrutinizerRegistry, Severity, WarningReport};

pub struct CheckArgs {
    pub batch: String,
    pub format: String,
    pub sequential: bool,
}

pub fn run(context: &Context, args: CheckArgs) -> Result<()> {
    let report = evaluate(context, &args)?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
    } else {
        print_report_text(&report);
    }

    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Load the batch and run the selected rules over it
fn evaluate(context: &Context, args: &CheckArgs) -> Result<WarningReport> {
    let content = std::fs::read_to_string(&args.batch)
        .with_context(|| format!("Failed to read batch {}", args.batch))?;
    let updates: Vec<ItemUpdate> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse batch {}", args.batch))?;

    let registry = ScrutinizerRegistry::with_builtin_rules();
    let scrutinizers = match &context.config.engine.rules {
        Some(selected) => registry.create_selected(selected)?,
        None => registry.create_all(),
    };

    let parallel = context.config.engine.parallel && !args.sequential;
    let engine = EvaluationEngine::new(context.constraint_fetcher()?, context.rule_config())
        .with_parallel(parallel);

    tracing::info!(updates = updates.len(), rules = scrutinizers.len(), parallel, "Checking batch");
    Ok(engine.run(&updates, scrutinizers))
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "ERROR",
        Severity::Warning => "WARN ",
        Severity::Info => "INFO ",
    }
}

fn warning_line(warning: &QaWarning) -> String {
    let example = warning
        .property("example_entity")
        .and_then(|v| v.as_str())
        .map(|id| format!(" (e.g. {})", id))
        .unwrap_or_default();
    format!(
        "  [{}] {} x{}: {}{}",
        severity_label(warning.severity),
        warning.aggregation_key,
        warning.count,
        warning.rule_type,
        example
    )
}

fn print_report_text(report: &WarningReport) {
    println!("{}", report.summary());

    let warnings = report.aggregated();
    if !warnings.is_empty() {
        println!();
        for warning in &warnings {
            println!("{}", warning_line(warning));
        }
    }

    if !report.failures.is_empty() {
        println!();
        for failure in &report.failures {
            println!(
                "  [FAIL ] {} on {}: {}",
                failure.rule_type, failure.item_id, failure.error
            );
        }
    }

    for rule in &report.disabled_rules {
        println!("  (rule {} disabled: missing configuration)", rule);
    }
}

fn report_json(report: &WarningReport) -> serde_json::Value {
    let failures: Vec<serde_json::Value> = report
        .failures
        .iter()
        .map(|f| {
            serde_json::json!({
                "rule_type": f.rule_type,
                "item": f.item_id,
                "error": f.error.to_string(),
            })
        })
        .collect();

    serde_json::json!({
        "summary": report.summary(),
        "errors": report.error_count(),
        "warnings": report.warning_count(),
        "info": report.info_count(),
        "issues": report.aggregated(),
        "failures": failures,
        "disabled_rules": report.disabled_rules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sieve_core::{EntityId, SieveError};
    use sieve_fetch::SieveConfig;
    use sieve_scrutinize::RuleFailure;

    fn demo(file: &str) -> String {
        format!("{}/../../demos/{}", env!("CARGO_MANIFEST_DIR"), file)
    }

    fn sample_report() -> WarningReport {
        let warning = QaWarning::new(
            "values-should-not-be-used-as-qualifier",
            "P106P2868",
            Severity::Warning,
            1,
        )
        .with_property("example_entity", serde_json::json!("Q42"));
        WarningReport {
            warnings: vec![warning.clone(), warning],
            failures: vec![RuleFailure {
                rule_type: "difference-of-the-properties-is-not-within-the-specified-range".to_string(),
                item_id: EntityId::new("Q7"),
                error: SieveError::Remote("timeout".to_string()),
            }],
            disabled_rules: Vec::new(),
        }
    }

    #[test]
    fn test_warning_line() {
        let report = sample_report();
        let merged = report.aggregated();
        assert_eq!(
            warning_line(&merged[0]),
            "  [WARN ] P106P2868 x2: values-should-not-be-used-as-qualifier (e.g. Q42)"
        );
    }

    #[test]
    fn test_report_json_shape() {
        let json = report_json(&sample_report());
        assert_eq!(json["warnings"], 2);
        assert_eq!(json["errors"], 0);
        assert_eq!(json["issues"].as_array().map(|a| a.len()), Some(1));
        assert_eq!(json["issues"][0]["count"], 2);
        assert_eq!(json["failures"][0]["item"], "Q7");
        assert_eq!(json["failures"][0]["error"], "Remote error: timeout");
    }

    #[test]
    fn test_demo_batch_offline() {
        let context = Context::new(SieveConfig::default(), Some(demo("entities.json")));
        let args = CheckArgs {
            batch: demo("batch.json"),
            format: "text".to_string(),
            sequential: true,
        };

        let report = evaluate(&context, &args).unwrap();
        assert!(report.failures.is_empty());
        assert!(!report.has_errors());

        let keys: Vec<&str> = report
            .warnings
            .iter()
            .map(|w| w.aggregation_key.as_str())
            .collect();
        assert_eq!(keys, vec!["P570", "P106P2868"]);
    }

    #[test]
    fn test_unknown_rule_selection_fails() {
        let mut config = SieveConfig::default();
        config.engine.rules = Some(vec!["no-such-rule".to_string()]);
        let context = Context::new(config, Some(demo("entities.json")));
        let args = CheckArgs {
            batch: demo("batch.json"),
            format: "json".to_string(),
            sequential: false,
        };

        let err = evaluate(&context, &args).unwrap_err();
        assert!(err.to_string().contains("no-such-rule"));
    }
}
