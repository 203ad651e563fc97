//! Constraint declaration lookup command

use super::Context;
use anyhow::Result;
use sieve_core::{EntityId, Statement};

pub fn run(context: &Context, property: &str, constraint_type: &str, format: &str) -> Result<()> {
    let fetcher = context.constraint_fetcher()?;
    let declarations =
        fetcher.constraints_by_type(&EntityId::new(property), &EntityId::new(constraint_type))?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&declarations)?);
        return Ok(());
    }

    if declarations.is_empty() {
        println!("No {} constraints declared on {}.", constraint_type, property);
        return Ok(());
    }

    println!(
        "{} {} constraint(s) on {}:",
        declarations.len(),
        constraint_type,
        property
    );
    for (i, declaration) in declarations.iter().enumerate() {
        print!("{}", describe(i + 1, declaration));
    }

    Ok(())
}

fn describe(index: usize, declaration: &Statement) -> String {
    let mut out = format!("  #{} {}\n", index, declaration.value());
    for group in &declaration.qualifiers {
        let values: Vec<String> = group.values().map(|v| v.to_string()).collect();
        out.push_str(&format!("      {}: {}\n", group.property, values.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sieve_core::Value;

    #[test]
    fn test_describe_lists_qualifiers() {
        let declaration = Statement::new("P2302", Value::entity("Q52712340"))
            .with_qualifier("P2306", Value::entity("P2868"))
            .with_qualifier("P2305", Value::entity("Q5"))
            .with_qualifier("P2305", Value::entity("Q6"));

        let text = describe(1, &declaration);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("  #1 "));
        assert!(lines[1].contains("P2306"));
        assert!(lines[2].contains("P2305"));
        assert!(lines[2].contains(", "));
    }
}
