use crate::error::Result;
use crate::reporter::ProjectLogger;
use crate::specifier::Specifier;
use crate::version_plan::{select_specifier, VersionPlan};

use super::SpecifierInput;

pub(crate) fn resolve(
    plans: &[VersionPlan],
    input: &SpecifierInput<'_>,
    preid: Option<&str>,
    logger: &mut ProjectLogger,
) -> Result<Option<Specifier>> {
    let specifier = select_specifier(plans, input.project, input.current_version, preid)?;
    if let Some(specifier) = &specifier {
        logger.buffer(format!(
            "Resolved the specifier as \"{}\" using version plans",
            specifier
        ));
    }
    Ok(specifier)
}
