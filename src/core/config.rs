use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub tickets: TicketConfig,
    pub history: HistoryConfig,
    pub delay_sync: DelaySyncConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Ticket creation settings
#[derive(Debug, Clone)]
pub struct TicketConfig {
    /// Maximum probes when a generated code collides with an existing one
    pub code_max_attempts: u32,
    /// Source forced onto tickets created outside the provider IT department
    pub self_service_source: String,
}

#[derive(Debug, Clone)]
pub struct HistoryConfig {
    pub queue_capacity: usize,
}

/// Delay reconciliation sweep settings
#[derive(Debug, Clone)]
pub struct DelaySyncConfig {
    /// Minimum time between two completed sweeps
    pub cooldown: Duration,
    /// Tickets fetched per page during a sweep
    pub page_size: i64,
    /// Period of the daemon's reconciliation worker
    pub interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            database: DatabaseConfig::from_env()?,
            tickets: TicketConfig::from_env()?,
            history: HistoryConfig::from_env()?,
            delay_sync: DelaySyncConfig::from_env()?,
        })
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl TicketConfig {
    pub const DEFAULT_CODE_MAX_ATTEMPTS: u32 = 50;
    pub const DEFAULT_SELF_SERVICE_SOURCE: &'static str = "plateforme";

    pub fn from_env() -> Result<Self, String> {
        let code_max_attempts = env::var("TICKET_CODE_MAX_ATTEMPTS")
            .unwrap_or_else(|_| Self::DEFAULT_CODE_MAX_ATTEMPTS.to_string())
            .parse::<u32>()
            .map_err(|_| "TICKET_CODE_MAX_ATTEMPTS must be a valid number".to_string())?;

        if code_max_attempts == 0 {
            return Err("TICKET_CODE_MAX_ATTEMPTS must be at least 1".to_string());
        }

        let self_service_source = env::var("TICKET_SELF_SERVICE_SOURCE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| Self::DEFAULT_SELF_SERVICE_SOURCE.to_string());

        Ok(Self {
            code_max_attempts,
            self_service_source,
        })
    }
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            code_max_attempts: Self::DEFAULT_CODE_MAX_ATTEMPTS,
            self_service_source: Self::DEFAULT_SELF_SERVICE_SOURCE.to_string(),
        }
    }
}

impl HistoryConfig {
    pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

    pub fn from_env() -> Result<Self, String> {
        let queue_capacity = env::var("HISTORY_QUEUE_CAPACITY")
            .unwrap_or_else(|_| Self::DEFAULT_QUEUE_CAPACITY.to_string())
            .parse::<usize>()
            .map_err(|_| "HISTORY_QUEUE_CAPACITY must be a valid number".to_string())?;

        if queue_capacity == 0 {
            return Err("HISTORY_QUEUE_CAPACITY must be at least 1".to_string());
        }

        Ok(Self { queue_capacity })
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            queue_capacity: Self::DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl DelaySyncConfig {
    const DEFAULT_COOLDOWN_SECS: u64 = 120; // 2 minutes
    const DEFAULT_PAGE_SIZE: i64 = 500;
    const DEFAULT_INTERVAL_SECS: u64 = 600; // 10 minutes

    pub fn from_env() -> Result<Self, String> {
        let cooldown_secs = env::var("DELAY_SYNC_COOLDOWN_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_COOLDOWN_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DELAY_SYNC_COOLDOWN_SECS must be a valid number".to_string())?;

        let page_size = env::var("DELAY_SYNC_PAGE_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_PAGE_SIZE.to_string())
            .parse::<i64>()
            .map_err(|_| "DELAY_SYNC_PAGE_SIZE must be a valid number".to_string())?;

        if page_size < 1 {
            return Err("DELAY_SYNC_PAGE_SIZE must be at least 1".to_string());
        }

        let interval_secs = env::var("DELAY_SYNC_INTERVAL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_INTERVAL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DELAY_SYNC_INTERVAL_SECS must be a valid number".to_string())?;

        Ok(Self {
            cooldown: Duration::from_secs(cooldown_secs),
            page_size,
            interval: Duration::from_secs(interval_secs.max(1)),
        })
    }
}

impl Default for DelaySyncConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(Self::DEFAULT_COOLDOWN_SECS),
            page_size: Self::DEFAULT_PAGE_SIZE,
            interval: Duration::from_secs(Self::DEFAULT_INTERVAL_SECS),
        }
    }
}
