use std::path::PathBuf;

/// Server settings read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub db_path: PathBuf,
    pub dist_dir: PathBuf,
    pub public_dir: PathBuf,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub geocoder_limit: u8,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset or unparseable values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Config {
            port: get("PORT", "3000").parse().unwrap_or(3000),
            db_path: PathBuf::from(get("DB_PATH", "data/profiles.redb")),
            dist_dir: PathBuf::from(get("DIST_DIR", "dist")),
            public_dir: PathBuf::from(get("PUBLIC_DIR", "public")),
            geocoder_url: get("GEOCODER_URL", "https://nominatim.openstreetmap.org"),
            geocoder_user_agent: get("GEOCODER_USER_AGENT", "member-map/0.1"),
            geocoder_limit: get("GEOCODER_LIMIT", "5").parse().unwrap_or(5),
        }
    }
}
