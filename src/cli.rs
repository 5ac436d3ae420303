use std::path::PathBuf;

use clap::builder::{styling::AnsiColor, Styles};
use clap::Parser;

const ABOUT: &str = "Weather lookup TUI";

const LONG_ABOUT: &str = "
TUI for looking up the weather anywhere, sourced from Open-Meteo.

Type a place name to see current conditions, a 7 day forecast and an hourly forecast for the
selected day. Units can be switched between metric and imperial, or per category (temperature,
wind speed, precipitation), without fetching again.
";

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default())
    .usage(AnsiColor::Green.on_default())
    .literal(AnsiColor::Green.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, Debug)]
#[command(version, styles=STYLES, about=ABOUT, long_about = LONG_ABOUT)]
pub struct Args {
    #[arg(help = "Place to search for on start-up (e.g. Berlin, \"New York\")")]
    pub place: Option<String>,

    #[arg(long, help = "Start with temperature, wind speed and precipitation in imperial units")]
    pub imperial: bool,

    #[arg(long, value_name = "PATH", help = "Write logs here instead of the temp directory")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("wx-lookup.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_place_and_flags() {
        let args = Args::try_parse_from(["wx-lookup", "New York", "--imperial"]).unwrap();
        assert_eq!(args.place.as_deref(), Some("New York"));
        assert!(args.imperial);
        assert!(args.log_path().ends_with("wx-lookup.log"));
    }

    #[test]
    fn log_file_override() {
        let args = Args::try_parse_from(["wx-lookup", "--log-file", "/var/tmp/wx.log"]).unwrap();
        assert_eq!(args.place, None);
        assert!(!args.imperial);
        assert_eq!(args.log_path(), PathBuf::from("/var/tmp/wx.log"));
    }
}
