use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    pub scouting_config_path: String,
    pub uploads_dir: String,
    pub allowed_origins: Vec<String>,
    pub initial_admin_emails: Vec<String>,
    pub identity_header: String,
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/scouting.db".to_string());

        let scouting_config_path = env::var("SCOUTING_CONFIG_PATH")
            .unwrap_or_else(|_| "./scouting-config.json".to_string());

        let uploads_dir = env::var("UPLOADS_DIR").unwrap_or_else(|_| "./uploads".to_string());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        // Bootstrap admins; can also be added later through the users API
        let initial_admin_emails = env::var("INITIAL_ADMIN_EMAILS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        // Header carrying the verified email of the signed-in user, set by
        // the authentication proxy in front of this server
        let identity_header = env::var("IDENTITY_HEADER")
            .unwrap_or_else(|_| "x-auth-request-email".to_string())
            .to_lowercase();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        Ok(Config {
            server_host,
            server_port,
            database_path,
            scouting_config_path,
            uploads_dir,
            allowed_origins,
            initial_admin_emails,
            identity_header,
            environment,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
