use clap::Args;
use serde_json::Value;

use calcworks_core::combinatorics::{self, CountingInput, Selection};

/// Arguments for counting combinations or permutations
#[derive(Args)]
pub struct CountingArgs {
    /// Size of the pool
    #[arg(long)]
    pub n: u64,

    /// Items drawn
    #[arg(long)]
    pub r: u64,

    /// Allow the same item to be drawn more than once
    #[arg(long)]
    pub repetition: bool,
}

pub fn run_combinations(args: CountingArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_counting(Selection::Combinations, args)
}

pub fn run_permutations(args: CountingArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_counting(Selection::Permutations, args)
}

fn run_counting(
    selection: Selection,
    args: CountingArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let input = CountingInput {
        selection,
        n: args.n,
        r: args.r,
        repetition: args.repetition,
    };
    let result = combinatorics::count_arrangements(&input)?;
    Ok(serde_json::to_value(result)?)
}
