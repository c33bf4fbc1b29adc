/// Default configuration file name.
pub(crate) const CONFIG_NAME: &str = "config.toml";
/// Package name.
pub(crate) const PKG_NAME: &str = env!("CARGO_PKG_NAME");
/// Environment variable selecting the log level.
pub(crate) const LOG_ENV: &str = "JCDBG";
