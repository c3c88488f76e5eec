use crate::error::Result;
use crate::reporter::ProjectLogger;
use crate::specifier::Specifier;

/// Validates a user-supplied specifier such as `minor` or `v2.1.0`.
pub(crate) fn resolve(raw: &str, logger: &mut ProjectLogger) -> Result<Specifier> {
    let specifier = Specifier::parse(raw)?;
    logger.buffer(format!("Using the provided version specifier \"{}\"", raw));
    Ok(specifier)
}
