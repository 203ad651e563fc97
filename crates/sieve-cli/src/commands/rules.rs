//! Rule listing command

use super::Context;
use anyhow::Result;
use sieve_scrutinize::ScrutinizerRegistry;

pub fn run(context: &Context) -> Result<()> {
    let registry = ScrutinizerRegistry::with_builtin_rules();
    for line in rule_lines(context, &registry) {
        println!("{}", line);
    }
    Ok(())
}

fn rule_lines(context: &Context, registry: &ScrutinizerRegistry) -> Vec<String> {
    let config = context.rule_config();
    let selected = context.config.engine.rules.as_ref();

    registry
        .rule_types()
        .into_iter()
        .filter_map(|rule_type| {
            let mut rule = registry.create(rule_type)?;
            let status = if selected.is_some_and(|s| !s.iter().any(|r| r == rule_type)) {
                "not selected"
            } else if rule.prepare_dependencies(&config) {
                "enabled"
            } else {
                "disabled (missing configuration)"
            };
            Some(format!("{:<70} {}", rule_type, status))
        })
        .collect()
}
