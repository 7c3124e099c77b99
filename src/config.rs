use std::env;

use crate::database::SortOrder;

const DEFAULT_DATABASE_NAME: &str = "recipe_app";

/// Runtime settings, read from the environment (after `.env` is loaded)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_name: String,
    pub allowed_origins: Vec<String>,
    pub bcrypt_cost: u32,
    /// Name ordering of tag / ingredient listings
    pub attr_order: SortOrder,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| format!("PORT must be a port number: {}", e))?,
            None => 8000,
        };

        let database_url = lookup("DATABASE_URL").ok_or("DATABASE_URL must be set")?;

        let database_name = lookup("DATABASE_NAME")
            .or_else(|| database_name_from_url(&database_url))
            .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string());

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(raw) => {
                let cost = raw
                    .trim()
                    .parse::<u32>()
                    .map_err(|e| format!("BCRYPT_COST must be an integer: {}", e))?;
                if !(4..=31).contains(&cost) {
                    return Err(format!("BCRYPT_COST must be between 4 and 31, got {}", cost));
                }
                cost
            }
            None => bcrypt::DEFAULT_COST,
        };

        let attr_order = match lookup("ATTR_NAME_ORDER") {
            Some(raw) => SortOrder::parse(&raw)
                .ok_or_else(|| format!("ATTR_NAME_ORDER must be 'asc' or 'desc', got '{}'", raw))?,
            None => SortOrder::Descending,
        };

        Ok(AppConfig {
            host,
            port,
            database_url,
            database_name,
            allowed_origins,
            bcrypt_cost,
            attr_order,
        })
    }

    /// `*` anywhere in ALLOWED_ORIGINS opens CORS to every origin
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "mongodb://localhost:27017/recipe_app_test".to_string(),
            database_name: "recipe_app_test".to_string(),
            allowed_origins: Vec::new(),
            bcrypt_cost: 4,
            attr_order: SortOrder::Descending,
        }
    }
}

/// `mongodb://host/name?opts` -> `name`
fn database_name_from_url(url: &str) -> Option<String> {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let (_, path) = without_scheme.split_once('/')?;
    let name = path.split('?').next().unwrap_or_default();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
