use freshprice_catalog::PricingConfig;
use serde::Deserialize;
use std::env;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub pricing: PricingConfig,
}

impl Config {
    /// Layer `default`, `{RUN_MODE}`, an optional explicit file and
    /// `FRESHPRICE__*` environment variables, in that order.
    pub fn load(config_dir: &Path, extra_file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "production".into());

        let mut builder = config::Config::builder()
            .add_source(config::File::from(config_dir.join("default")).required(false))
            .add_source(config::File::from(config_dir.join(&run_mode)).required(false));

        if let Some(path) = extra_file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        // Eg.. `FRESHPRICE__PRICING__VARIANT=original`
        let s = builder
            .add_source(
                config::Environment::with_prefix("FRESHPRICE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
