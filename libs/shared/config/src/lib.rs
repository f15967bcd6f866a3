use std::env;
use std::str::FromStr;

use chrono::FixedOffset;
use tracing::warn;

/// Which appointment/patient storage backend the process should assemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Supabase,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            "supabase" | "postgrest" => Ok(StorageBackend::Supabase),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub storage_backend: StorageBackend,
    /// IANA label of the clinic's calendar zone, carried for logs and
    /// downstream display.
    pub clinic_timezone: String,
    /// Offset actually used for "today" arithmetic. The clinic zone has no
    /// DST, so a fixed offset is sufficient and keeps every backend on the
    /// same calendar.
    pub clinic_utc_offset: FixedOffset,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            storage_backend: env::var("STORAGE_BACKEND")
                .ok()
                .and_then(|raw| {
                    raw.parse()
                        .map_err(|e: String| warn!("{}, falling back to memory", e))
                        .ok()
                })
                .unwrap_or(StorageBackend::Memory),
            clinic_timezone: env::var("CLINIC_TIMEZONE")
                .unwrap_or_else(|_| "Asia/Manila".to_string()),
            clinic_utc_offset: env::var("CLINIC_UTC_OFFSET")
                .ok()
                .and_then(|raw| parse_utc_offset(&raw))
                .unwrap_or_else(|| {
                    warn!("CLINIC_UTC_OFFSET not set or invalid, using +08:00");
                    manila_offset()
                }),
        };

        if config.storage_backend == StorageBackend::Supabase && !config.is_supabase_configured() {
            warn!("Supabase backend selected but not fully configured - missing environment variables");
        }

        config
    }

    /// Load a `.env` file first, then read the environment. Intended for
    /// process entrypoints; library code should take an already-built config.
    pub fn from_env_file() -> Self {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    /// Configuration for a self-contained in-memory clinic. Used by tests
    /// and local tooling that never touch Supabase.
    pub fn in_memory() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            storage_backend: StorageBackend::Memory,
            clinic_timezone: "Asia/Manila".to_string(),
            clinic_utc_offset: manila_offset(),
        }
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }
}

/// Parse offsets of the form `+08:00` / `-05:30`.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    raw.trim().parse().ok()
}

fn manila_offset() -> FixedOffset {
    // In range for FixedOffset, so this cannot fail.
    FixedOffset::east_opt(8 * 3600).unwrap()
}
