use super::{connect, ConnectionHandle, Db, DEFAULT_CONNECTION};
use crate::{Model, Result};
use arbor_core::{bail, driver::Driver};

use std::collections::HashMap;

/// How to reach one database: a connection URL or an already-built
/// driver, plus an optional table-name prefix applied by the record
/// layer.
#[derive(Debug)]
pub struct ConnectionInfo {
    source: Source,
    prefix: Option<String>,
}

#[derive(Debug)]
enum Source {
    Url(String),
    Driver(Box<dyn Driver>),
}

impl ConnectionInfo {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            source: Source::Url(url.into()),
            prefix: None,
        }
    }

    pub fn driver(driver: impl Driver + 'static) -> Self {
        Self {
            source: Source::Driver(Box::new(driver)),
            prefix: None,
        }
    }

    /// Prefix prepended to every table name computed for this connection.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

#[derive(Default)]
pub struct Builder {
    connections: Vec<(String, ConnectionInfo)>,
    models: Vec<Model>,
}

impl Builder {
    /// Register a named connection.
    pub fn connection(mut self, name: impl Into<String>, info: ConnectionInfo) -> Self {
        self.connections.push((name.into(), info));
        self
    }

    /// Register a connection under the default name.
    pub fn default_connection(self, info: ConnectionInfo) -> Self {
        self.connection(DEFAULT_CONNECTION, info)
    }

    /// Register a model descriptor so relations can resolve it by name.
    pub fn register(mut self, model: Model) -> Self {
        self.models.push(model);
        self
    }

    /// Connect every registered connection eagerly and assemble the
    /// registries.
    pub fn build(self) -> Result<Db> {
        let mut connections = HashMap::new();

        for (name, info) in self.connections {
            if connections.contains_key(&name) {
                bail!("connection `{name}` registered twice");
            }

            let driver = match info.source {
                Source::Driver(driver) => driver,
                Source::Url(url) => connect::driver_for(&url)?,
            };

            let url = driver.url().into_owned();
            let connection = driver.connect()?;
            let prefix = info.prefix.unwrap_or_default();

            connections.insert(
                name.clone(),
                ConnectionHandle::new(name, url, prefix, connection),
            );
        }

        let mut models = HashMap::new();

        for model in self.models {
            let name = model.name().to_string();
            if models.insert(name.clone(), model).is_some() {
                bail!("model `{name}` registered twice");
            }
        }

        Ok(Db {
            connections,
            models,
        })
    }
}
