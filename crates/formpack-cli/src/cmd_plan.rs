/// Implementation of `formpack plan`.
///
/// Reports what the encoder would do with an input without resolving
/// anything: the selected encoding path and the key path of every
/// `blob:` reference, in traversal order.
///
/// ```text
/// Mode: async
/// Blob references: 2
///   scan
///   attachments[1]
/// ```
use std::fs;

use anyhow::{Context, Result};
use formpack_encoder::{ephemeral_paths, select_encoder};
use formpack_types::FormValue;

use crate::PlanArgs;

/// Run the `formpack plan` command.
///
/// # Errors
///
/// Returns an error if the input cannot be read or is not valid JSON.
pub fn run(args: &PlanArgs) -> Result<()> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let json: serde_json::Value = serde_json::from_str(&source)
        .with_context(|| format!("failed to parse {}", args.input.display()))?;
    let form = FormValue::from(json);

    println!("Mode: {}", select_encoder(&form));
    let paths = ephemeral_paths(&form);
    println!("Blob references: {}", paths.len());
    for path in paths {
        println!("  {path}");
    }
    Ok(())
}
