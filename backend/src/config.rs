use std::{net::SocketAddr, time::Duration};

use clap::Parser;

use crate::{directions::OrsConfig, geocoding::NominatimConfig};

/// Map demo server: route finder, shortest-path graph and live tracker.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Address the HTTP server listens on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: SocketAddr,

    /// OpenRouteService API key used by the route finder
    #[arg(long, env = "ORS_API_KEY", default_value = "", hide_env_values = true)]
    pub ors_api_key: String,

    #[arg(long, env = "ORS_BASE_URL", default_value = "https://api.openrouteservice.org")]
    pub ors_base_url: String,

    /// Nominatim-compatible search endpoint
    #[arg(long, env = "NOMINATIM_URL", default_value = "https://nominatim.openstreetmap.org")]
    pub nominatim_url: String,

    #[arg(long, env = "IPINFO_URL", default_value = "https://ipinfo.io")]
    pub ipinfo_url: String,

    /// Nominatim's usage policy asks every client to identify itself
    #[arg(long, env = "GEOCODER_USER_AGENT", default_value = "routefinder")]
    pub geocoder_user_agent: String,

    /// Minimum spacing between geocoding requests, in milliseconds
    #[arg(long, env = "GEOCODER_MIN_DELAY_MS", default_value_t = 1000)]
    pub geocoder_min_delay_ms: u64,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub nominatim: NominatimConfig,
    pub ors: OrsConfig,
    pub ipinfo_url: String,
}

impl From<Args> for Settings {
    fn from(args: Args) -> Self {
        Self {
            bind_addr: args.bind_addr,
            nominatim: NominatimConfig {
                base_url: args.nominatim_url,
                user_agent: args.geocoder_user_agent,
                min_delay: Duration::from_millis(args.geocoder_min_delay_ms),
                ..NominatimConfig::default()
            },
            ors: OrsConfig {
                base_url: args.ors_base_url,
                api_key: args.ors_api_key,
                ..OrsConfig::default()
            },
            ipinfo_url: args.ipinfo_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "routefinder",
            "--bind-addr",
            "127.0.0.1:9000",
            "--ors-api-key",
            "abc",
            "--geocoder-min-delay-ms",
            "250",
        ])
        .unwrap();
        let settings = Settings::from(args);
        assert_eq!(settings.bind_addr.port(), 9000);
        assert!(settings.ors.has_api_key());
        assert_eq!(settings.nominatim.min_delay, Duration::from_millis(250));
        assert_eq!(settings.nominatim.max_retries, NominatimConfig::default().max_retries);
    }

    #[test]
    fn command_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
