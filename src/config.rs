use crate::error::{Error, Result};
use dotenvy::dotenv;
use rust_decimal::Decimal;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub webhook_secret: String,
    pub payment: PaymentConfig,
    pub pricing: PricingConfig,
    pub reservation_hold_minutes: i64,
    pub schedule_utc_offset_minutes: i32,
    pub meeting_base_url: String,
    pub email_api_url: Option<String>,
    pub email_api_key: Option<String>,
    pub email_from: String,
    pub admin_email: Option<String>,
    pub public_rps: u32,
    pub api_rps: u32,
    pub max_reschedules: i32,
    pub reminder_lead_minutes: i64,
    pub maintenance_cron: String,
    pub uploads_dir: String,
    pub log_format: String,
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub environment: String,
    pub api_base_url: String,
    pub api_version: String,
    pub client_id: String,
    pub client_secret: String,
    pub return_url: Option<String>,
    pub notify_url: Option<String>,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub basic: Decimal,
    pub pro: Decimal,
    pub premium: Decimal,
    pub resume_review: Decimal,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let environment = get_env_or("PAYMENT_ENVIRONMENT", "sandbox").to_lowercase();
        if environment != "sandbox" && environment != "production" {
            return Err(Error::Config(format!(
                "Invalid value for PAYMENT_ENVIRONMENT: {}",
                environment
            )));
        }
        let default_base_url = if environment == "production" {
            "https://api.cashfree.com/pg"
        } else {
            "https://sandbox.cashfree.com/pg"
        };

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            webhook_secret: get_env("WEBHOOK_SECRET")?,
            payment: PaymentConfig {
                api_base_url: get_env_url_or("PAYMENT_API_BASE_URL", default_base_url)?,
                environment,
                api_version: get_env_or("PAYMENT_API_VERSION", "2023-08-01"),
                client_id: get_env("PAYMENT_CLIENT_ID")?,
                client_secret: get_env("PAYMENT_CLIENT_SECRET")?,
                return_url: get_env_opt("PAYMENT_RETURN_URL"),
                notify_url: get_env_opt("PAYMENT_NOTIFY_URL"),
                currency: get_env_or("CURRENCY", "INR"),
            },
            pricing: PricingConfig {
                basic: get_env_parse_or("PRICE_BASIC", Decimal::from(999))?,
                pro: get_env_parse_or("PRICE_PRO", Decimal::from(1999))?,
                premium: get_env_parse_or("PRICE_PREMIUM", Decimal::from(2999))?,
                resume_review: get_env_parse_or("RESUME_REVIEW_PRICE", Decimal::from(499))?,
            },
            reservation_hold_minutes: get_env_parse_or("RESERVATION_HOLD_MINUTES", 10)?,
            schedule_utc_offset_minutes: get_env_parse_or("SCHEDULE_UTC_OFFSET_MINUTES", 330)?,
            meeting_base_url: get_env_url_or("MEETING_BASE_URL", "https://meet.jit.si")?,
            email_api_url: get_env_opt("EMAIL_API_URL")
                .map(|raw| parse_url("EMAIL_API_URL", &raw))
                .transpose()?,
            email_api_key: get_env_opt("EMAIL_API_KEY"),
            email_from: get_env_or("EMAIL_FROM", "MockHire <no-reply@mockhire.app>"),
            admin_email: get_env_opt("ADMIN_EMAIL"),
            public_rps: get_env_parse_or("PUBLIC_RPS", 50)?,
            api_rps: get_env_parse_or("API_RPS", 100)?,
            max_reschedules: get_env_parse_or("MAX_RESCHEDULES", 2)?,
            reminder_lead_minutes: get_env_parse_or("REMINDER_LEAD_MINUTES", 1440)?,
            maintenance_cron: get_env_or("MAINTENANCE_CRON", "0 * * * * *"),
            uploads_dir: get_env_or("UPLOADS_DIR", "./uploads"),
            log_format: get_env_or("LOG_FORMAT", "text"),
        })
    }

    pub fn plan_price(&self, plan: crate::models::plan::PlanType) -> Decimal {
        use crate::models::plan::PlanType;
        match plan {
            PlanType::Basic => self.pricing.basic,
            PlanType::Pro => self.pricing.pro,
            PlanType::Premium => self.pricing.premium,
        }
    }

    pub fn schedule_offset(&self) -> chrono::FixedOffset {
        chrono::FixedOffset::east_opt(self.schedule_utc_offset_minutes * 60)
            .unwrap_or_else(|| chrono::FixedOffset::east_opt(0).expect("zero offset is valid"))
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or(name: &str, default: &str) -> String {
    get_env_opt(name).unwrap_or_else(|| default.to_string())
}

fn parse_url(name: &str, raw: &str) -> Result<String> {
    url::Url::parse(raw.trim())
        .map(|_| raw.trim().trim_end_matches('/').to_string())
        .map_err(|e| Error::Config(format!("Invalid URL for {}: {}", name, e)))
}

fn get_env_url_or(name: &str, default: &str) -> Result<String> {
    parse_url(name, &get_env_or(name, default))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_opt(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_checked_and_trimmed() {
        assert_eq!(
            parse_url("MEETING_BASE_URL", " https://meet.example.com/ ").unwrap(),
            "https://meet.example.com"
        );
        assert!(matches!(parse_url("EMAIL_API_URL", "not a url"), Err(Error::Config(_))));
    }
}
