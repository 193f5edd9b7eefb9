//! [`Config`]-related definitions.

use std::time;

use common::{money::Currency, Percent};
use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;
use service::domain::rental::Terms;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [JWT] secret the identity service signs sessions with.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[default("secret".to_owned())]
    pub jwt_secret: String,

    /// Commercial terms of the marketplace.
    pub rental: Rental,

    /// Service tasks configuration.
    pub tasks: Tasks,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            jwt_secret,
            rental:
                Rental {
                    currency,
                    tax_rate,
                    quotation_validity,
                    invoice_due,
                    late_fee_rate,
                },
            tasks: Tasks { expire_quotations },
        } = value;
        Self {
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                jwt_secret.as_bytes(),
            ),
            terms: Terms {
                currency,
                tax_rate,
                quotation_validity,
                invoice_due,
                late_fee_rate,
            },
            expire_quotations: service::task::expire_quotations::Config {
                interval: expire_quotations.interval,
            },
        }
    }
}

/// Commercial terms configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Rental {
    /// Currency every product is priced in.
    #[default(Terms::default().currency)]
    pub currency: Currency,

    /// Tax rate applied to quotations.
    #[default(Terms::default().tax_rate)]
    pub tax_rate: Percent,

    /// Time a quotation stays valid after its creation.
    #[default(Terms::default().quotation_validity)]
    #[serde(with = "humantime_serde")]
    pub quotation_validity: time::Duration,

    /// Time an invoice is due in after its creation.
    #[default(Terms::default().invoice_due)]
    #[serde(with = "humantime_serde")]
    pub invoice_due: time::Duration,

    /// Share of the daily rate charged per unit for every day of a late
    /// return.
    #[default(Terms::default().late_fee_rate)]
    pub late_fee_rate: Percent,
}

/// Service tasks configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Tasks {
    /// `ExpireQuotations` task configuration.
    pub expire_quotations: Task,
}

/// Service task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Task {
    /// Task execution interval.
    #[default(time::Duration::from_secs(60 * 60))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::{str::FromStr as _, time};

    use common::{money::Currency, Percent};
    use config::{File, FileFormat};
    use service::domain::rental::Terms;

    use super::Service;

    fn parse(toml: &str) -> Service {
        config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .get("service")
            .unwrap()
    }

    #[test]
    fn defaults_to_marketplace_terms() {
        let terms = service::Config::from(Service::default()).terms;
        let expected = Terms::default();

        assert_eq!(terms.currency, expected.currency);
        assert_eq!(terms.tax_rate, expected.tax_rate);
        assert_eq!(terms.quotation_validity, expected.quotation_validity);
        assert_eq!(terms.invoice_due, expected.invoice_due);
        assert_eq!(terms.late_fee_rate, expected.late_fee_rate);
    }

    #[test]
    fn overrides_rental_terms() {
        let svc = parse(
            r#"
            [service]
            jwt_secret = "top"

            [service.rental]
            currency = "USD"
            tax_rate = 12.5
            quotation_validity = "3days"
            late_fee_rate = "15"

            [service.tasks.expire_quotations]
            interval = "5m"
            "#,
        );

        assert_eq!(svc.jwt_secret, "top");
        assert_eq!(svc.rental.currency, Currency::Usd);
        assert_eq!(svc.rental.tax_rate, Percent::from_str("12.5").unwrap());
        assert_eq!(
            svc.rental.quotation_validity,
            time::Duration::from_secs(3 * 24 * 60 * 60),
        );
        assert_eq!(svc.rental.invoice_due, Terms::default().invoice_due);
        assert_eq!(svc.rental.late_fee_rate, Percent::from_str("15").unwrap());
        assert_eq!(
            svc.tasks.expire_quotations.interval,
            time::Duration::from_secs(5 * 60),
        );
    }
}
