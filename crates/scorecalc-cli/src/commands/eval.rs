//! The `scorecalc eval` command.

use anyhow::{Context, Result};

use scorecalc_core::formula::{self, Bindings};

pub fn execute(expression: String, vars: Vec<String>, show_postfix: bool) -> Result<()> {
    let bindings = parse_bindings(&vars)?;

    if show_postfix {
        let tokens = formula::tokenize(&expression)?;
        let substituted = formula::substitute(&tokens, &bindings)?;
        let postfix = formula::to_postfix(&substituted)?;
        eprintln!("postfix: {}", formula::token::render(&postfix));
    }

    let value = formula::evaluate(&expression, &bindings)
        .with_context(|| format!("failed to evaluate '{expression}'"))?;
    println!("{value}");
    Ok(())
}

fn parse_bindings(vars: &[String]) -> Result<Bindings> {
    let mut bindings = Bindings::new();
    for var in vars {
        let (name, value) = var
            .split_once('=')
            .with_context(|| format!("invalid --var '{var}', expected NAME=VALUE"))?;
        let name = name.trim();
        anyhow::ensure!(!name.is_empty(), "invalid --var '{var}', name is empty");
        if bindings.insert(name.to_string(), value.trim().to_string()).is_some() {
            anyhow::bail!("variable '{name}' given more than once");
        }
    }
    Ok(bindings)
}
