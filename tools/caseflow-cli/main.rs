use caseflow::prelude::*;
use clap::Parser;
use std::fs;
use std::process::ExitCode;
use std::time::Instant;

/// Compiles a service-flow schema and validates sample values against it.
///
/// The schema file is the raw backend response (`{ "service_flow": [...] }`);
/// the optional values file is a flat JSON object keyed by field name. The
/// exit code reflects whether every step validated.
#[derive(Parser)]
#[command(name = "caseflow-cli", version, about)]
struct Args {
    /// Path to the service-flow schema JSON
    schema: String,

    /// Path to a JSON object of field values to apply
    #[arg(short, long)]
    values: Option<String>,

    /// Also list each field's compiled validators
    #[arg(long)]
    detail: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(all_valid) => {
            if all_valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<bool, Box<dyn std::error::Error>> {
    let schema_json = fs::read_to_string(&args.schema)?;

    let start = Instant::now();
    let schema = FlowSchema::from_json(&schema_json)?;
    let mut wizard = Wizard::new(&schema);
    println!(
        "Compiled {} navigable step(s) in {:?}",
        wizard.total_steps(),
        start.elapsed()
    );

    if let Some(path) = &args.values {
        let values: ValueMap = serde_json::from_str(&fs::read_to_string(path)?)?;
        for index in 0..wizard.total_steps() {
            let form = wizard.step_mut(index).expect("index in range");
            let names: Vec<String> = form.fields().iter().map(|f| f.name.clone()).collect();
            for name in names {
                if let Some(value) = values.get(&name) {
                    form.set_value(&name, value.clone());
                }
            }
        }
    }

    let mut all_valid = true;
    for (index, step) in schema.navigable_steps().enumerate() {
        let form = wizard.step(index).expect("index in range");
        let derived = form.derived();
        all_valid &= derived.is_valid;

        println!();
        println!(
            "Step {} - {} [{}]",
            index + 1,
            step.name,
            if derived.is_valid { "valid" } else { "invalid" }
        );

        for field in form.fields() {
            if !derived.is_field_visible(&field.name) {
                if args.detail {
                    println!("  {} (hidden)", field.name);
                }
                continue;
            }
            if args.detail {
                println!(
                    "  {} = {} ({} validator(s))",
                    field.name,
                    form.value(&field.name),
                    field.validators.len()
                );
            }
            for error in derived.field_errors(&field.name) {
                println!("  ! {}", error);
            }
        }
        for check in &derived.pending {
            println!("  ? {} awaits an image probe", check.field);
        }
    }

    println!();
    if all_valid {
        println!("All steps valid.");
    } else {
        println!("Some steps are not valid yet.");
    }
    Ok(all_valid)
}
