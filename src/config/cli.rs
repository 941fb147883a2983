use crate::config::toml_config::TomlConfig;
use crate::config::{normalize_fields, Settings};
use crate::utils::error::Result;
use clap::Parser;

/// Command line flags. `-h` is the geocoder host, so help is `--help` only.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "batch-geocoder")]
#[command(about = "Geocode a file (JSON or CSV) against a Google-style geocoder")]
#[command(disable_help_flag = true)]
pub struct CliConfig {
    /// JSON or CSV file to be geocoded
    #[arg(short = 'f', long)]
    pub file: Option<String>,

    /// Comma-separated list of address fields, in order
    #[arg(short = 'a', long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Whether the file is json or csv (default: json)
    #[arg(short = 't', long = "type")]
    pub format: Option<String>,

    /// Store containing records. If given, file input is ignored
    #[arg(short = 'd', long)]
    pub database: Option<String>,

    /// Geocoder host (default: localhost)
    #[arg(short = 'h', long)]
    pub host: Option<String>,

    /// Geocoder port (default: 8080)
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Seconds to wait after each geocoding request (default: 0)
    #[arg(short = 's', long)]
    pub throttle: Option<f64>,

    /// Geocoder request path
    #[arg(long)]
    pub path: Option<String>,

    /// Per-request timeout in seconds (default: 30)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Optional TOML configuration file
    #[arg(short = 'c', long)]
    pub config: Option<String>,

    #[arg(short = 'v', long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit log lines as JSON")]
    pub log_json: bool,

    #[arg(long, help = "Do not draw the progress line")]
    pub no_progress: bool,

    #[arg(long, action = clap::ArgAction::Help, help = "Print help")]
    pub help: Option<bool>,
}

impl CliConfig {
    /// Resolves defaults, the optional TOML file and these flags, in that
    /// order of precedence.
    pub fn into_settings(self) -> Result<Settings> {
        let file_config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        let mut settings = Settings::from_toml(&file_config)?;
        self.apply_to(&mut settings)?;
        Ok(settings)
    }

    pub fn apply_to(&self, settings: &mut Settings) -> Result<()> {
        if let Some(file) = &self.file {
            settings.file = Some(file.clone());
        }
        if !self.fields.is_empty() {
            settings.address_fields = normalize_fields(&self.fields);
        }
        if let Some(format) = &self.format {
            settings.format = format.parse()?;
        }
        if let Some(database) = &self.database {
            settings.database = Some(database.clone());
        }
        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(throttle) = self.throttle {
            settings.throttle_seconds = throttle;
        }
        if let Some(path) = &self.path {
            settings.path = path.clone();
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_seconds = timeout;
        }
        if self.no_progress {
            settings.show_progress = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::formats::DataFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_classic_flags() {
        let cli = CliConfig::parse_from([
            "batch-geocoder",
            "-f",
            "addresses.csv",
            "-a",
            "street,city,state",
            "-t",
            "csv",
            "-h",
            "geo.local",
            "-p",
            "9000",
            "-s",
            "0.25",
        ]);

        let settings = cli.into_settings().unwrap();
        assert_eq!(settings.file.as_deref(), Some("addresses.csv"));
        assert_eq!(settings.address_fields, vec!["street", "city", "state"]);
        assert_eq!(settings.format, DataFormat::Csv);
        assert_eq!(settings.host, "geo.local");
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.throttle_seconds, 0.25);
        assert!(settings.show_progress);
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(
                br#"
[input]
database = "stored.db"
address_fields = ["city"]

[geocoder]
host = "from-file"
port = 7000
"#,
            )
            .unwrap();

        let cli = CliConfig::parse_from([
            "batch-geocoder",
            "--config",
            temp_file.path().to_str().unwrap(),
            "--host",
            "from-flag",
            "--no-progress",
        ]);

        let settings = cli.into_settings().unwrap();
        assert_eq!(settings.database.as_deref(), Some("stored.db"));
        assert_eq!(settings.address_fields, vec!["city"]);
        assert_eq!(settings.host, "from-flag");
        assert_eq!(settings.port, 7000);
        assert!(!settings.show_progress);
    }

    #[test]
    fn test_bad_type_flag() {
        let cli = CliConfig::parse_from(["batch-geocoder", "-f", "a.txt", "-a", "x", "-t", "xml"]);
        assert!(cli.into_settings().is_err());
    }
}
