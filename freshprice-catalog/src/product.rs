use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::expiry::{self, ExpiryError};
use crate::pricing::Variant;

/// Optional floor/ceiling a product's price may be held to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBand {
    pub min: f64,
    pub max: f64,
}

impl PriceBand {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Hold `price` inside the band. An inverted band (floor above ceiling)
    /// cannot hold anything and yields `None`.
    pub fn clamp(&self, price: f64) -> Option<f64> {
        (self.min <= self.max).then(|| price.clamp(self.min, self.max))
    }
}

/// Product description as handed over by the calling server
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    /// Caller's identifier, only used as log context
    pub id: Option<String>,

    pub name: Option<String>,

    /// Price before any adjustment
    pub base_price: f64,

    /// Units on hand; `None` when the caller did not say
    pub stock_level: Option<i64>,

    /// Absent only for the revised variant, which then passes the price through
    pub expiry_date: Option<NaiveDate>,

    /// Last day of the festival markup window
    pub festival_end_date: Option<NaiveDate>,

    pub price_band: Option<PriceBand>,
}

/// Product-related errors
#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    #[error("no product argument supplied")]
    MissingArgument,

    #[error("malformed product JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("product JSON must be an object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("invalid date in '{field}': {source}")]
    Date {
        field: &'static str,
        #[source]
        source: ExpiryError,
    },

    #[error("price {0} cannot be rounded to cents")]
    Unroundable(f64),
}

impl ProductInput {
    /// Parse and validate the caller's JSON.
    ///
    /// `Original` requires `basePrice` and `expiryDate` and ignores
    /// `festivalEndDate`. `Revised` defaults `basePrice` to 0 and treats a
    /// missing or non-string `expiryDate` as "no expiry".
    pub fn from_json(raw: &str, variant: Variant) -> Result<Self, ProductError> {
        let value: Value = serde_json::from_str(raw)?;
        let fields = value.as_object().ok_or(ProductError::NotAnObject)?;

        let base_price = match (number_field(fields, "basePrice")?, variant) {
            (Some(price), _) => price,
            (None, Variant::Revised) => 0.0,
            (None, Variant::Original) => return Err(ProductError::MissingField("basePrice")),
        };

        let expiry_date = match variant {
            Variant::Original => {
                let raw = match present(fields, "expiryDate") {
                    Some(Value::String(s)) => s,
                    Some(_) => {
                        return Err(ProductError::InvalidField {
                            field: "expiryDate",
                            expected: "a date string",
                        })
                    }
                    None => return Err(ProductError::MissingField("expiryDate")),
                };
                Some(date_field("expiryDate", raw)?)
            }
            Variant::Revised => optional_date_field(fields, "expiryDate")?,
        };

        // without an expiry the price is passed through untouched, so stock
        // and festival fields are never looked at
        let festival_end_date = match (variant, expiry_date) {
            (Variant::Revised, Some(_)) => optional_date_field(fields, "festivalEndDate")?,
            _ => None,
        };

        let stock_level = match expiry_date {
            Some(_) => stock_field(fields)?,
            None => None,
        };

        // only consulted when clamping is enabled, so a malformed band is not an error here
        let price_band = match (number_field(fields, "minPrice"), number_field(fields, "maxPrice")) {
            (Ok(Some(min)), Ok(Some(max))) => Some(PriceBand::new(min, max)),
            _ => None,
        };

        Ok(Self {
            id: string_field(fields, "_id"),
            name: string_field(fields, "name"),
            base_price,
            stock_level,
            expiry_date,
            festival_end_date,
            price_band,
        })
    }
}

/// A key that is missing or explicitly `null` counts as absent.
fn present<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|v| !v.is_null())
}

fn number_field(fields: &Map<String, Value>, key: &'static str) -> Result<Option<f64>, ProductError> {
    match present(fields, key) {
        None => Ok(None),
        Some(v) => v.as_f64().map(Some).ok_or(ProductError::InvalidField {
            field: key,
            expected: "a number",
        }),
    }
}

fn stock_field(fields: &Map<String, Value>) -> Result<Option<i64>, ProductError> {
    let invalid = ProductError::InvalidField {
        field: "stockLevel",
        expected: "a whole number",
    };

    match present(fields, "stockLevel") {
        None => Ok(None),
        Some(v) => {
            if let Some(n) = v.as_i64() {
                return Ok(Some(n));
            }
            // 3.0 is still a whole number
            match v.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
                _ => Err(invalid),
            }
        }
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

fn date_field(field: &'static str, raw: &str) -> Result<NaiveDate, ProductError> {
    expiry::parse_calendar_date(raw).map_err(|source| ProductError::Date { field, source })
}

/// Only string values are parsed; anything else means "not set".
fn optional_date_field(fields: &Map<String, Value>, key: &'static str) -> Result<Option<NaiveDate>, ProductError> {
    match fields.get(key) {
        Some(Value::String(raw)) => date_field(key, raw).map(Some),
        _ => Ok(None),
    }
}
