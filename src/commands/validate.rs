use anyhow::Result;

use crate::Context;
use crate::cli::ValidateArgs;
use crate::config;
use crate::ui;

/// Load the document and list what a sync would touch. No credentials, no network.
pub fn run(ctx: &Context, args: &ValidateArgs) -> Result<()> {
    let desired = config::load_document(&args.config)?;
    log::debug!("{} parsed", args.config.display());

    if ctx.quiet {
        return Ok(());
    }

    ui::header(&args.config.display().to_string());
    for group in desired.groups() {
        ui::kv(&group.name, &format!("{} variables", group.variables.len()));
        if ctx.verbose > 0 {
            for variable in &group.variables {
                ui::dim(&format!("  {}", variable.name));
            }
        }
    }
    println!();
    ui::success(&format!(
        "Valid: {} contexts, {} variables",
        desired.groups().len(),
        desired.total_variables()
    ));

    Ok(())
}
