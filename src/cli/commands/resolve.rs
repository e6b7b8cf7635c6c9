//! Resolve command - locate the artifact files of a configuration

use crate::artifact::{ResolvedArtifactSet, ResolvedFile};
use crate::cli::args::{OutputFormat, ResolveArgs};
use crate::config::Config;
use crate::descriptor;
use crate::error::{ResolveError, ResolveResult};
use crate::exclude::ExcludeSpec;
use crate::model::{AttributeSet, AttributesSchema, RawValue, ValueType};
use crate::select::{AllVariantsComponentArtifacts, ComponentArtifacts};
use crate::session::ResolutionSession;
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

#[derive(Serialize)]
struct ArtifactRow<'a> {
    variant: &'a str,
    artifact: String,
    attributes: &'a AttributeSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a ResolvedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Execute the resolve command
pub async fn execute(args: ResolveArgs, config: &Config) -> ResolveResult<()> {
    let component = descriptor::load(&args.descriptor).await?;
    let configuration = component.require_configuration(&args.configuration)?;

    let mut config = config.clone();
    if let Some(root) = args.repository {
        config.repository.root = root;
    }
    if args.checksums {
        config.resolution.checksums = true;
    }

    let session = ResolutionSession::from_config(&config);
    debug!("Session {} for {}", session.id(), component.id);

    let exclusions = ExcludeSpec::any_of(args.exclude);
    let overrides = parse_overrides(&component.schema, args.attribute)?;

    let artifacts = AllVariantsComponentArtifacts.artifacts_for(
        &component,
        configuration,
        &exclusions,
        &overrides,
        &session,
    );
    let resolved = artifacts.resolve().await;

    match args.format {
        OutputFormat::Json => print_json(&resolved)?,
        OutputFormat::Plain => print_plain(&resolved),
        OutputFormat::Table => print_table(&resolved, &config.repository.root),
    }

    let failures = resolved.failures();
    match failures.as_slice() {
        [] => Ok(()),
        [(_, error)] => Err((*error).clone()),
        _ => Err(ResolveError::User(format!(
            "{} artifact(s) could not be resolved",
            failures.len()
        ))),
    }
}

/// Turn KEY=VALUE pairs into attributes typed by the component's schema
fn parse_overrides(
    schema: &AttributesSchema,
    pairs: Vec<(String, String)>,
) -> ResolveResult<AttributeSet> {
    let entries = pairs
        .into_iter()
        .map(|(key, text)| {
            let raw = raw_value(schema.value_type(&key), &key, text)?;
            Ok((key, raw))
        })
        .collect::<ResolveResult<Vec<_>>>()?;
    schema.attributes(entries)
}

fn raw_value(value_type: ValueType, key: &str, text: String) -> ResolveResult<RawValue> {
    match value_type {
        ValueType::Long => {
            text.parse()
                .map(RawValue::Long)
                .map_err(|_| ResolveError::InvalidAttributeValue {
                    attribute: key.to_string(),
                    reason: format!("'{}' is not a number", text),
                })
        }
        ValueType::Bool => match text.to_lowercase().as_str() {
            "true" => Ok(RawValue::Bool(true)),
            "false" => Ok(RawValue::Bool(false)),
            _ => Err(ResolveError::InvalidAttributeValue {
                attribute: key.to_string(),
                reason: format!("'{}' is not true/false", text),
            }),
        },
        // Known constants are passed as constants; anything else is left to
        // the sanitizer, which reports the valid values
        ValueType::Enum(enum_type) => Ok(enum_type
            .constant(&text)
            .map(RawValue::Constant)
            .unwrap_or(RawValue::Text(text))),
        ValueType::String | ValueType::Any => Ok(RawValue::Text(text)),
    }
}

fn rows(resolved: &ResolvedArtifactSet) -> Vec<ArtifactRow<'_>> {
    resolved
        .variants
        .iter()
        .flat_map(|variant| {
            variant.artifacts.iter().map(move |artifact| ArtifactRow {
                variant: &variant.identity.name,
                artifact: artifact.identity.artifact.to_string(),
                attributes: &artifact.attributes,
                file: artifact.file.as_ref().ok(),
                error: artifact.file.as_ref().err().map(ToString::to_string),
            })
        })
        .collect()
}

fn print_json(resolved: &ResolvedArtifactSet) -> ResolveResult<()> {
    let json = serde_json::to_string_pretty(&rows(resolved))?;
    println!("{}", json);
    Ok(())
}

fn print_plain(resolved: &ResolvedArtifactSet) {
    for path in resolved.files() {
        println!("{}", path.display());
    }
}

fn print_table(resolved: &ResolvedArtifactSet, repository: &Path) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Resolved artifacts");
    ui::key_value(&ctx, "repository", &repository.display().to_string());

    if resolved.is_empty() {
        ui::step_info(&ctx, "Nothing to resolve");
        return;
    }

    for variant in &resolved.variants {
        ui::section(&ctx, &variant.identity.to_string());
        for artifact in &variant.artifacts {
            match &artifact.file {
                Ok(file) => {
                    let detail = match &file.sha256 {
                        Some(sha) => format!("{} sha256:{}", file.path.display(), sha),
                        None => file.path.display().to_string(),
                    };
                    ui::step_ok_detail(&ctx, &artifact.identity.artifact.to_string(), &detail);
                }
                Err(e) => ui::step_error_detail(
                    &ctx,
                    &artifact.identity.artifact.to_string(),
                    &e.to_string(),
                ),
            }
        }
    }

    let total = resolved.artifacts().count();
    let failed = resolved.failures().len();
    println!();
    if failed == 0 {
        println!("{} artifact(s)", total);
    } else {
        println!(
            "{} artifact(s), {}",
            total,
            style(format!("{} failed", failed)).red()
        );
    }
}
