//! # Compile Subcommand
//!
//! Shows the attribute tree a rule compiles to, in the JSON shape that
//! travels inside a policy.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde_json::Value;

use crate::config::{read_yaml, RuleSpec};

/// Arguments for the `access compile` subcommand.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Rule spec YAML file.
    #[arg(long)]
    pub rule: PathBuf,
}

/// Execute the compile subcommand.
pub fn run_compile(args: &CompileArgs) -> Result<u8> {
    let spec: RuleSpec = read_yaml(&args.rule)?;
    let tree = compile_spec(&spec)?;
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(0)
}

/// Build the rule and return its compiled tree as JSON.
pub fn compile_spec(spec: &RuleSpec) -> Result<Value> {
    let rule = spec.to_rule()?;
    let tree = rule.compile();
    tracing::info!(rule_id = %rule.id(), kind = tree.kind(), "compiled rule");
    Ok(tree.to_value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn execute_count_tree() {
        let tree = compile_spec(&RuleSpec::ExecuteCount { max: 4 }).unwrap();
        assert_eq!(
            tree,
            json!({
                "operation": "gt",
                "attribute_list": [
                    {"type": "execution_num", "value": "4"},
                    {"type": "request.execution_num.type", "value": "request.execution_num.value"}
                ]
            })
        );
    }

    #[test]
    fn invalid_rule_reports_error() {
        let spec = RuleSpec::Multiple {
            satisfy: Default::default(),
            rules: Vec::new(),
        };
        assert!(compile_spec(&spec).is_err());
    }
}
