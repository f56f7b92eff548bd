use clap::Args;
use serde_json::Value;

use calcworks_core::Calculation;

use crate::input;

/// Arguments for running a tagged calculation request
#[derive(Args)]
pub struct RunArgs {
    /// Path to a JSON/YAML request carrying a "calculator" tag
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_calculation(args: RunArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let calculation: Calculation = input::read_request(args.input.as_deref())?
        .ok_or("--input <file> or stdin required for run")?;
    Ok(calculation.run()?)
}
