// Main entry point for the whereql CLI
// Compiles a filter expression to WHERE text, or starts an interactive shell

use anyhow::{anyhow, Context, Result};
use clap::Parser as ClapParser;
use std::io::{self, Write};
use std::path::PathBuf;
use whereql::value::{parse_assignment, variables_from_json};
use whereql::{CompileOptions, Compiler, Normalization, VariableMap};

/// whereql - compile C-style filter expressions into SQL WHERE clauses
#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Expression to compile; starts the interactive shell when omitted
    expression: Option<String>,

    /// Merge field value as name=value (repeatable)
    #[arg(short, long = "var", value_name = "NAME=VALUE")]
    vars: Vec<String>,

    /// Merge field values as a JSON object
    #[arg(long, value_name = "JSON")]
    vars_json: Option<String>,

    /// Compile options as a JSON file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Keep whitespace inside string literals and only rewrite standalone IN
    #[arg(long)]
    strict: bool,

    /// Reject IN lists
    #[arg(long)]
    no_in_lists: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let compiler = Compiler::with_options(load_options(&args)?);
    let mut variables = load_variables(&args)?;

    match &args.expression {
        Some(expression) => {
            println!("{}", compiler.compile(expression, &variables)?);
            Ok(())
        }
        None => {
            println!("whereql interactive shell");
            println!("Type an expression, '.help' for help or '.exit' to quit");
            println!();
            repl(&compiler, &mut variables)
        }
    }
}

fn load_options(args: &Args) -> Result<CompileOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => CompileOptions::default(),
    };
    if args.strict {
        options.normalization = Normalization::Strict;
    }
    if args.no_in_lists {
        options.in_lists = false;
    }
    Ok(options)
}

fn load_variables(args: &Args) -> Result<VariableMap> {
    let mut variables = match &args.vars_json {
        Some(json) => variables_from_json(json).context("parsing --vars-json")?,
        None => VariableMap::new(),
    };
    for assignment in &args.vars {
        let (name, value) = parse_assignment(assignment)
            .ok_or_else(|| anyhow!("expected NAME=VALUE, got '{}'", assignment))?;
        variables.insert(name, value);
    }
    Ok(variables)
}

/// Read expressions line by line and print the compiled WHERE text
fn repl(compiler: &Compiler, variables: &mut VariableMap) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("whereql> ");
        stdout.flush()?;

        let mut input = String::new();
        if stdin.read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('.') {
            let (name, rest) = command.split_once(' ').unwrap_or((command, ""));
            match name {
                "exit" | "quit" => break,
                "help" => print_help(),
                "vars" => {
                    let mut names: Vec<_> = variables.iter().collect();
                    names.sort_by(|a, b| a.0.cmp(b.0));
                    for (name, value) in names {
                        println!("  ${} = {:?}", name, value);
                    }
                }
                "set" => match parse_assignment(rest) {
                    Some((name, value)) => {
                        variables.insert(name, value);
                    }
                    None => eprintln!("Usage: .set name=value"),
                },
                "unset" => {
                    variables.remove(rest.trim().trim_start_matches('$'));
                }
                _ => {
                    println!("Unknown command: {}", input);
                    println!("Type '.help' for help");
                }
            }
            continue;
        }

        match compiler.compile(input, variables) {
            Ok(sql) => println!("{}", sql),
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn print_help() {
    println!("Special Commands:");
    println!("  .help              Show this help message");
    println!("  .set name=value    Set a merge field");
    println!("  .unset name        Remove a merge field");
    println!("  .vars              List merge fields");
    println!("  .exit, .quit       Exit the shell");
    println!();
    println!("Expression syntax:");
    println!("  Comparators:  <  <=  >  >=  ==  !=  %% (LIKE)  -> or IN (list)");
    println!("  Logical:      && (AND)  || (OR), no precedence, group with ( )");
    println!("  Values:       'text'  \"text\"  42  1.5  true  false  $name");
    println!();
    println!("Examples:");
    println!("  a == 'x' && (b < 2 || c >= 3)");
    println!("  price %% 'screw'");
    println!("  id IN (1, 2, 3)");
    println!("  age > $minAge");
}
