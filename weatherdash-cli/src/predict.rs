//! Interactive prediction form: auto-fill, `--set` overrides, prompts and
//! submit with retry.

use anyhow::{Context, Result, anyhow, bail};
use inquire::{Confirm, CustomType, validator::Validation};
use weatherdash_core::{
    BackendClient, Config, Dashboard, DashboardError, FormInput, Location, PredictionForm,
    validation::{BoundSet, FieldKind, FieldSpec, FieldValue},
};

use crate::render;

#[derive(Debug)]
pub struct PredictOptions {
    pub location: Location,
    pub auto_fill: bool,
    pub assignments: Vec<(String, String)>,
    pub interactive: bool,
}

/// `field=value` from the command line.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected FIELD=VALUE, got '{raw}'")),
    }
}

/// Interpret a raw string according to the field's kind.
fn parse_value(bounds: &BoundSet, field: &str, raw: &str) -> Result<FieldValue> {
    let spec = bounds
        .spec(field)
        .ok_or_else(|| anyhow!("Unknown field '{field}'. Fields: {}", field_names(bounds)))?;

    match spec.kind {
        FieldKind::Flag => match raw.to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Ok(FieldValue::Flag(true)),
            "false" | "no" | "n" | "0" => Ok(FieldValue::Flag(false)),
            _ => bail!("{field} expects true or false, got '{raw}'"),
        },
        FieldKind::Number(_) => raw
            .parse::<f64>()
            .map(FieldValue::Number)
            .map_err(|_| anyhow!("{field} expects a number, got '{raw}'")),
    }
}

fn field_names(bounds: &BoundSet) -> String {
    bounds.fields().iter().map(|f| f.name).collect::<Vec<_>>().join(", ")
}

fn prompt_field(spec: &FieldSpec, current: FieldValue) -> Result<FieldValue> {
    match spec.kind {
        FieldKind::Flag => {
            let answer = Confirm::new(spec.label)
                .with_default(current.as_flag().unwrap_or(false))
                .prompt()?;
            Ok(FieldValue::Flag(answer))
        }
        FieldKind::Number(_) => {
            let checked = spec.clone();
            let answer = CustomType::<f64>::new(spec.label)
                .with_default(current.as_number().unwrap_or_default())
                .with_error_message("Expected a number")
                .with_validator(move |v: &f64| {
                    Ok(match checked.check(FieldValue::Number(*v)) {
                        Some(err) => Validation::Invalid(err.message.into()),
                        None => Validation::Valid,
                    })
                })
                .prompt()?;
            Ok(FieldValue::Number(answer))
        }
    }
}

fn prompt_all<I: FormInput>(form: &PredictionForm<I>) -> Result<()> {
    let values = form.input().values();
    for spec in form.bounds().fields() {
        let current = values
            .iter()
            .find(|(name, _)| *name == spec.name)
            .map(|(_, v)| *v)
            .ok_or_else(|| anyhow!("form has no value for {}", spec.name))?;
        let value = prompt_field(spec, current)?;
        form.set_field(spec.name, value)?;
    }
    Ok(())
}

pub async fn run<I: FormInput>(config: &Config, opts: PredictOptions) -> Result<()> {
    let form: PredictionForm<I> =
        PredictionForm::from_config(config).context("Invalid [bounds] configuration")?;
    let backend = BackendClient::from_config(config)?;

    form.open();

    if opts.auto_fill {
        let dashboard = Dashboard::from_config(config)?;
        form.auto_fill(&dashboard, &opts.location)
            .await
            .with_context(|| {
                format!("Auto-fill from current conditions at {} failed", opts.location)
            })?;
        println!("Filled from current conditions at {}.", opts.location);
    }

    for (field, raw) in &opts.assignments {
        let value = parse_value(form.bounds(), field, raw)?;
        form.set_field(field, value)?;
    }

    loop {
        if opts.interactive {
            prompt_all(&form)?;
        }

        match form.submit(&backend).await {
            Ok(result) => {
                render::prediction(&result);
                return Ok(());
            }
            Err(err @ DashboardError::Validation(_)) => {
                eprintln!("Some values are out of range:");
                render::field_errors(&err);
                if !opts.interactive {
                    return Err(err.into());
                }
            }
            Err(err) => {
                eprintln!("Prediction failed: {err}");
                if !opts.interactive {
                    return Err(err.into());
                }
                let retry = Confirm::new("Edit the values and try again?")
                    .with_default(true)
                    .prompt()?;
                if !retry {
                    form.close();
                    return Err(err.into());
                }
            }
        }
    }
}
