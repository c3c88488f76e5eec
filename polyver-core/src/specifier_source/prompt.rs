use crate::clients::Prompter;
use crate::config::ReleaseGroup;
use crate::error::Result;
use crate::reporter::ProjectLogger;
use crate::specifier::{increment, SemverBump, Specifier};

use super::SpecifierInput;

const CUSTOM_CHOICE: &str = "Custom exact version";

/// Asks interactively for the kind of change.
pub(crate) async fn resolve(
    prompter: &dyn Prompter,
    group: &ReleaseGroup,
    input: &SpecifierInput<'_>,
    preid: Option<&str>,
    logger: &mut ProjectLogger,
) -> Result<Option<Specifier>> {
    let subject = if group.is_independent() {
        format!("project \"{}\"", input.project)
    } else {
        format!("the {} matched project(s)", input.matched_projects)
    };
    let subject = if group.is_default() {
        subject
    } else {
        format!("{} in release group \"{}\"", subject, group.name)
    };

    let mut items = Vec::with_capacity(SemverBump::ALL.len() + 1);
    for bump in SemverBump::ALL {
        let preview = increment(input.current_version, bump, preid)?;
        items.push(format!("{} {}", bump, preview));
    }
    items.push(CUSTOM_CHOICE.to_string());

    let message = format!("What kind of change is this for {}?", subject);
    let Some(choice) = prompter.select(&message, &items).await? else {
        return Ok(None);
    };

    let specifier = match SemverBump::ALL.get(choice) {
        Some(bump) => Specifier::Bump(*bump),
        None => {
            let raw = prompter
                .input(&format!("What is the exact version for {}?", subject))
                .await?;
            Specifier::parse(&raw)?
        }
    };

    logger.buffer(format!(
        "Resolved the specifier as \"{}\" from the prompt",
        specifier
    ));
    Ok(Some(specifier))
}
