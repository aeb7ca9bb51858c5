use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub port: u16,
}

impl Settings {
    /// Environment variables win over the built-in defaults, so a bare
    /// `cargo run` works against a local file database.
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("database_url", "sqlite://db/pickup.db")?
            .set_default("port", 3000)?
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
