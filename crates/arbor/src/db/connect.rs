use arbor_core::{driver::Driver, Error, Result};
use url::Url;

/// Resolve a connection URL to a driver by scheme.
pub(crate) fn driver_for(connection_url: &str) -> Result<Box<dyn Driver>> {
    let parsed =
        Url::parse(connection_url).map_err(|err| Error::invalid_connection_url(err.to_string()))?;

    match parsed.scheme() {
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Box::new(arbor_driver_sqlite::Sqlite::new(connection_url)?)),
        scheme => Err(Error::invalid_connection_url(format!(
            "no driver registered for scheme `{scheme}`"
        ))),
    }
}
