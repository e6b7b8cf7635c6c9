//! Select command - show the variants chosen for a configuration

use crate::cli::args::{OutputFormat, SelectArgs};
use crate::config::Config;
use crate::descriptor;
use crate::error::ResolveResult;
use crate::select::select_variants;
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;

#[derive(Serialize)]
struct VariantRow<'a> {
    owner: &'a str,
    name: &'a str,
    attributes: &'a crate::model::AttributeSet,
    artifacts: Vec<String>,
}

/// Execute the select command
pub async fn execute(args: SelectArgs, _config: &Config) -> ResolveResult<()> {
    let component = descriptor::load(&args.descriptor).await?;
    let configuration = component.require_configuration(&args.configuration)?;
    let selected = select_variants(&component, configuration);

    let rows: Vec<VariantRow<'_>> = selected
        .iter()
        .map(|variant| VariantRow {
            owner: &variant.identity.owner,
            name: variant.name(),
            attributes: &variant.attributes,
            artifacts: variant.artifacts.iter().map(ToString::to_string).collect(),
        })
        .collect();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain => {
            for row in &rows {
                println!("{}", row.name);
            }
        }
        OutputFormat::Table => {
            let ctx = UiContext::detect();
            ui::intro(
                &ctx,
                &format!("{} / {}", component.id, configuration.name),
            );
            ui::key_value(&ctx, "capabilities", &configuration.capabilities.to_string());

            if rows.is_empty() {
                ui::step_info(&ctx, "No variants selected");
                return Ok(());
            }

            println!();
            println!(
                "{:<28} {:<28} {}",
                style("VARIANT").bold(),
                style("OWNER").bold(),
                style("ARTIFACTS").bold()
            );
            println!("{}", "-".repeat(80));
            for row in &rows {
                println!(
                    "{:<28} {:<28} {}",
                    row.name,
                    style(row.owner).dim(),
                    row.artifacts.join(", ")
                );
                if !row.attributes.is_empty() {
                    println!("  {}", style(row.attributes).dim());
                }
            }
            println!();
            println!("{} variant(s)", rows.len());
        }
    }

    Ok(())
}
