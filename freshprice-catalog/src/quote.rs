//! One invocation of the calculator, from raw argument to the lines the
//! caller will read back.

use serde_json::Value;

use crate::pricing::{PricingContext, PricingEngine, Variant};
use crate::product::{ProductError, ProductInput};

/// What a single invocation reports back to its caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quote {
    /// A computed price, already formatted
    Priced(String),
    /// Nothing to price and nothing to report
    Silent,
    /// Pricing failed. `fallback` is the price to print anyway, if one could
    /// be recovered from the argument.
    Failed {
        diagnostic: String,
        fallback: Option<String>,
    },
}

impl Quote {
    /// The line to write to stdout, if any
    pub fn stdout_line(&self) -> Option<&str> {
        match self {
            Quote::Priced(price) => Some(price.as_str()),
            Quote::Silent => None,
            Quote::Failed { fallback, .. } => fallback.as_deref(),
        }
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Quote::Failed { diagnostic, .. } => Some(diagnostic.as_str()),
            _ => None,
        }
    }

    /// A recovered fallback still counts as a failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Quote::Priced(_) | Quote::Silent => 0,
            Quote::Failed { .. } => 1,
        }
    }
}

/// Price the product described by `argument`.
pub fn quote(argument: Option<&str>, context: &PricingContext, engine: &PricingEngine) -> Quote {
    let variant = engine.config().variant;

    let Some(raw) = argument else {
        return match variant {
            Variant::Revised => {
                tracing::debug!("no product argument, nothing to price");
                Quote::Silent
            }
            Variant::Original => failed(ProductError::MissingArgument, None),
        };
    };

    let priced = ProductInput::from_json(raw, variant).and_then(|product| {
        let breakdown = engine.price(&product, context)?;
        let window = breakdown.window.map_or_else(|| "none".to_string(), |w| w.to_string());
        tracing::debug!(
            product_id = product.id.as_deref().unwrap_or("-"),
            name = product.name.as_deref().unwrap_or("-"),
            today = %context.today,
            days_left = ?breakdown.days_left,
            window = %window,
            time = breakdown.time_multiplier,
            stock = breakdown.stock_multiplier,
            festival = breakdown.festival_multiplier,
            amount = %breakdown.amount,
            "priced product"
        );
        Ok(breakdown)
    });

    match priced {
        Ok(breakdown) => Quote::Priced(breakdown.display_amount()),
        Err(err) => {
            let fallback = match variant {
                Variant::Revised => fallback_base_price(raw),
                Variant::Original => None,
            };
            failed(err, fallback)
        }
    }
}

fn failed(err: ProductError, fallback: Option<String>) -> Quote {
    tracing::debug!(error = ?err, fallback = ?fallback, "pricing failed");
    Quote::Failed {
        diagnostic: err.to_string(),
        fallback,
    }
}

/// Recover the unadjusted base price from the raw argument, as the caller
/// sent it. An absent `basePrice` reads as 0; anything that is not a JSON
/// object with a numeric (or missing) `basePrice` yields nothing.
pub fn fallback_base_price(raw: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw).ok()?;
    match value.as_object()?.get("basePrice") {
        None | Some(Value::Null) => Some("0".to_string()),
        Some(Value::Number(price)) => Some(price.to_string()),
        Some(_) => None,
    }
}
