use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::expiry::{self, ExpiryWindow};
use crate::money::{self, RoundingMode};
use crate::product::{ProductError, ProductInput};

/// Behaviour profile of the calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Strict input, 5% low-stock discount, no festival markup
    Original,
    /// Lenient input with a base-price fallback, 10% low-stock discount, festival markup
    #[default]
    Revised,
}

/// Context for pricing calculations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingContext {
    /// The day prices are computed for
    pub today: NaiveDate,
}

impl PricingContext {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }
}

impl Default for PricingContext {
    fn default() -> Self {
        Self {
            today: Local::now().date_naive(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub variant: Variant,

    /// Stock assumed when the product does not report one
    pub default_stock_level: i64,

    /// Days left at or below which the urgent markdown applies
    pub urgent_days: i64,
    pub urgent_multiplier: f64,

    /// Days left at or below which the "expiring soon" markdown applies
    pub soon_days: i64,
    pub soon_multiplier: f64,

    /// Stock at or below which (but above zero) the clearance discount applies
    pub low_stock_threshold: i64,

    /// Falls back to the variant's own value when unset
    pub low_stock_multiplier: Option<f64>,

    /// Markup while a festival window is open
    pub festival_multiplier: f64,

    pub rounding: RoundingMode,

    /// Hold prices inside the product's `minPrice`..`maxPrice` band
    pub clamp_to_price_band: bool,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self::for_variant(Variant::default())
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PricingConfigError {
    #[error("{field} must be greater than zero, got {value}")]
    NonPositiveMultiplier { field: &'static str, value: f64 },

    #[error("urgent_days ({urgent}) must not exceed soon_days ({soon})")]
    WindowOrder { urgent: i64, soon: i64 },

    #[error("{field} must not be negative, got {value}")]
    NegativeCount { field: &'static str, value: i64 },
}

impl PricingConfig {
    pub fn for_variant(variant: Variant) -> Self {
        Self {
            variant,
            default_stock_level: 100,
            urgent_days: 3,
            urgent_multiplier: 0.70,
            soon_days: 10,
            soon_multiplier: 0.90,
            low_stock_threshold: 5,
            low_stock_multiplier: None,
            festival_multiplier: 1.30,
            rounding: RoundingMode::default(),
            clamp_to_price_band: false,
        }
    }

    pub fn effective_low_stock_multiplier(&self) -> f64 {
        self.low_stock_multiplier.unwrap_or(match self.variant {
            Variant::Original => 0.95,
            Variant::Revised => 0.90,
        })
    }

    pub fn validate(&self) -> Result<(), PricingConfigError> {
        let multipliers = [
            ("urgent_multiplier", self.urgent_multiplier),
            ("soon_multiplier", self.soon_multiplier),
            ("low_stock_multiplier", self.effective_low_stock_multiplier()),
            ("festival_multiplier", self.festival_multiplier),
        ];
        for (field, value) in multipliers {
            if !value.is_finite() || value <= 0.0 {
                return Err(PricingConfigError::NonPositiveMultiplier { field, value });
            }
        }

        if self.urgent_days > self.soon_days {
            return Err(PricingConfigError::WindowOrder {
                urgent: self.urgent_days,
                soon: self.soon_days,
            });
        }

        for (field, value) in [
            ("default_stock_level", self.default_stock_level),
            ("low_stock_threshold", self.low_stock_threshold),
        ] {
            if value < 0 {
                return Err(PricingConfigError::NegativeCount { field, value });
            }
        }

        Ok(())
    }
}

/// Every factor that went into a price, for logging and tests
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBreakdown {
    pub base_price: f64,
    /// `None` when the product had no expiry and was passed through
    pub days_left: Option<i64>,
    pub window: Option<ExpiryWindow>,
    pub time_multiplier: f64,
    pub stock_multiplier: f64,
    pub festival_multiplier: f64,
    pub final_discount: f64,
    pub amount: Decimal,
}

impl PriceBreakdown {
    pub fn display_amount(&self) -> String {
        money::format_price(self.amount)
    }
}

/// Expiry/stock/festival pricing engine
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Markdown for the product's expiry window
    pub fn time_multiplier(&self, days_left: i64) -> f64 {
        match self.expiry_window(days_left) {
            ExpiryWindow::Urgent => self.config.urgent_multiplier,
            ExpiryWindow::Soon => self.config.soon_multiplier,
            ExpiryWindow::Fresh => 1.0,
        }
    }

    pub fn expiry_window(&self, days_left: i64) -> ExpiryWindow {
        ExpiryWindow::classify(days_left, self.config.urgent_days, self.config.soon_days)
    }

    /// Clearance discount for low stock. Zero stock gets nothing.
    pub fn stock_multiplier(&self, stock_level: i64) -> f64 {
        if stock_level > 0 && stock_level <= self.config.low_stock_threshold {
            self.config.effective_low_stock_multiplier()
        } else {
            1.0
        }
    }

    pub fn festival_multiplier(&self, festival_end: Option<NaiveDate>, today: NaiveDate) -> f64 {
        match festival_end {
            Some(end) if expiry::is_festival_active(end, today) => self.config.festival_multiplier,
            _ => 1.0,
        }
    }

    /// The more aggressive of the two discounts wins; they never stack.
    pub fn final_discount(&self, time_multiplier: f64, stock_multiplier: f64) -> f64 {
        time_multiplier.min(stock_multiplier)
    }

    /// Calculate the adjusted price of a product
    pub fn price(&self, product: &ProductInput, context: &PricingContext) -> Result<PriceBreakdown, ProductError> {
        let Some(expiry_date) = product.expiry_date else {
            return Ok(PriceBreakdown {
                base_price: product.base_price,
                days_left: None,
                window: None,
                time_multiplier: 1.0,
                stock_multiplier: 1.0,
                festival_multiplier: 1.0,
                final_discount: 1.0,
                amount: self.round(product.base_price)?,
            });
        };

        let days_left = expiry::days_left(expiry_date, context.today);
        let stock_level = product.stock_level.unwrap_or(self.config.default_stock_level);

        let festival_multiplier = self.festival_multiplier(product.festival_end_date, context.today);
        let time_multiplier = self.time_multiplier(days_left);
        let stock_multiplier = self.stock_multiplier(stock_level);
        let final_discount = self.final_discount(time_multiplier, stock_multiplier);

        let mut raw = product.base_price * festival_multiplier * final_discount;
        if self.config.clamp_to_price_band {
            if let Some(band) = product.price_band {
                match band.clamp(raw) {
                    Some(clamped) => raw = clamped,
                    None => tracing::debug!(min = band.min, max = band.max, "ignoring inverted price band"),
                }
            }
        }

        Ok(PriceBreakdown {
            base_price: product.base_price,
            days_left: Some(days_left),
            window: Some(self.expiry_window(days_left)),
            time_multiplier,
            stock_multiplier,
            festival_multiplier,
            final_discount,
            amount: self.round(raw)?,
        })
    }

    fn round(&self, raw: f64) -> Result<Decimal, ProductError> {
        money::round_price(raw, self.config.rounding).ok_or(ProductError::Unroundable(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::PriceBand;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn context() -> PricingContext {
        PricingContext::new(today())
    }

    fn product(base_price: f64, stock_level: Option<i64>, days_out: Option<i64>) -> ProductInput {
        ProductInput {
            id: None,
            name: None,
            base_price,
            stock_level,
            expiry_date: days_out.map(|d| today() + chrono::Duration::days(d)),
            festival_end_date: None,
            price_band: None,
        }
    }

    fn cents(raw: &str) -> Decimal {
        raw.parse().unwrap()
    }

    #[test]
    fn test_time_multiplier_tiers() {
        let engine = PricingEngine::new(PricingConfig::default());

        assert_eq!(engine.time_multiplier(-5), 0.70);
        assert_eq!(engine.time_multiplier(3), 0.70);
        assert_eq!(engine.time_multiplier(4), 0.90);
        assert_eq!(engine.time_multiplier(10), 0.90);
        assert_eq!(engine.time_multiplier(11), 1.0);
    }

    #[test]
    fn test_stock_multiplier_bounds() {
        let engine = PricingEngine::new(PricingConfig::default());
        assert_eq!(engine.stock_multiplier(0), 1.0);
        assert_eq!(engine.stock_multiplier(1), 0.90);
        assert_eq!(engine.stock_multiplier(5), 0.90);
        assert_eq!(engine.stock_multiplier(6), 1.0);

        let original = PricingEngine::new(PricingConfig::for_variant(Variant::Original));
        assert_eq!(original.stock_multiplier(5), 0.95);
        assert_eq!(original.stock_multiplier(0), 1.0);
    }

    #[test]
    fn test_low_stock_far_expiry() {
        let engine = PricingEngine::new(PricingConfig::default());
        let breakdown = engine.price(&product(100.0, Some(3), Some(5000)), &context()).unwrap();

        assert_eq!(breakdown.window, Some(ExpiryWindow::Fresh));
        assert_eq!(breakdown.final_discount, 0.90);
        assert_eq!(breakdown.display_amount(), "90.0");
    }

    #[test]
    fn test_no_adjustment_when_fresh_and_stocked() {
        let engine = PricingEngine::new(PricingConfig::default());
        for stock in [None, Some(0), Some(6), Some(500)] {
            let breakdown = engine.price(&product(19.999, stock, Some(11)), &context()).unwrap();
            assert_eq!(breakdown.amount, cents("20.00"));
        }
    }

    #[test]
    fn test_most_aggressive_discount_wins() {
        let engine = PricingEngine::new(PricingConfig::default());

        // urgent expiry beats low stock
        let breakdown = engine.price(&product(100.0, Some(2), Some(1)), &context()).unwrap();
        assert_eq!(breakdown.final_discount, 0.70);
        assert_eq!(breakdown.amount, cents("70"));

        // low stock ties with the "soon" tier
        let breakdown = engine.price(&product(100.0, Some(2), Some(7)), &context()).unwrap();
        assert_eq!(breakdown.amount, cents("90"));

        // original variant: "soon" (10%) beats low stock (5%)
        let original = PricingEngine::new(PricingConfig::for_variant(Variant::Original));
        let breakdown = original.price(&product(100.0, Some(2), Some(7)), &context()).unwrap();
        assert_eq!(breakdown.amount, cents("90"));
        let breakdown = original.price(&product(100.0, Some(2), Some(30)), &context()).unwrap();
        assert_eq!(breakdown.amount, cents("95"));
    }

    #[test]
    fn test_urgent_tier_caps_price() {
        let engine = PricingEngine::new(PricingConfig::default());
        for days in [-30, 0, 1, 2, 3] {
            for stock in [0, 1, 5, 100] {
                let breakdown = engine.price(&product(89.99, Some(stock), Some(days)), &context()).unwrap();
                assert_eq!(breakdown.amount, cents("62.99"), "days={days} stock={stock}");
            }
        }
    }

    #[test]
    fn test_festival_markup() {
        let engine = PricingEngine::new(PricingConfig::default());

        let mut item = product(200.0, Some(50), Some(30));
        item.festival_end_date = Some(today());
        let breakdown = engine.price(&item, &context()).unwrap();
        assert_eq!(breakdown.festival_multiplier, 1.30);
        assert_eq!(breakdown.amount, cents("260"));

        // hike and markdown combine
        let mut item = product(200.0, Some(50), Some(2));
        item.festival_end_date = Some(today() + chrono::Duration::days(10));
        assert_eq!(engine.price(&item, &context()).unwrap().amount, cents("182"));

        // festival over
        let mut item = product(200.0, Some(50), Some(30));
        item.festival_end_date = Some(today() - chrono::Duration::days(1));
        assert_eq!(engine.price(&item, &context()).unwrap().amount, cents("200"));
    }

    #[test]
    fn test_pass_through_without_expiry() {
        let engine = PricingEngine::new(PricingConfig::default());
        let mut item = product(100.0, Some(1), None);
        item.festival_end_date = Some(today());

        let breakdown = engine.price(&item, &context()).unwrap();
        assert_eq!(breakdown.days_left, None);
        assert_eq!(breakdown.window, None);
        assert_eq!(breakdown.display_amount(), "100.0");
    }

    #[test]
    fn test_negative_price_is_not_rejected() {
        let engine = PricingEngine::new(PricingConfig::default());
        let breakdown = engine.price(&product(-10.0, Some(100), Some(1)), &context()).unwrap();
        assert_eq!(breakdown.amount, cents("-7"));
    }

    #[test]
    fn test_price_band_clamp_is_opt_in() {
        let mut item = product(50.0, Some(100), Some(1));
        item.price_band = Some(PriceBand::new(40.0, 65.0));

        let engine = PricingEngine::new(PricingConfig::default());
        assert_eq!(engine.price(&item, &context()).unwrap().amount, cents("35"));

        let engine = PricingEngine::new(PricingConfig {
            clamp_to_price_band: true,
            ..PricingConfig::default()
        });
        assert_eq!(engine.price(&item, &context()).unwrap().amount, cents("40"));

        // an inverted band leaves the price alone
        item.price_band = Some(PriceBand::new(70.0, 65.0));
        assert_eq!(engine.price(&item, &context()).unwrap().amount, cents("35"));
    }

    #[test]
    fn test_rounding_mode_applies() {
        // 0.25 * 0.5 == 0.125 exactly
        let item = product(0.25, Some(100), Some(0));
        let config = PricingConfig {
            urgent_multiplier: 0.5,
            ..PricingConfig::default()
        };

        let engine = PricingEngine::new(config.clone());
        assert_eq!(engine.price(&item, &context()).unwrap().amount, cents("0.12"));

        let engine = PricingEngine::new(PricingConfig {
            rounding: RoundingMode::HalfUp,
            ..config
        });
        assert_eq!(engine.price(&item, &context()).unwrap().amount, cents("0.13"));
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(PricingConfig::default().validate(), Ok(()));
        assert_eq!(PricingConfig::for_variant(Variant::Original).validate(), Ok(()));

        let bad = PricingConfig {
            festival_multiplier: 0.0,
            ..PricingConfig::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(PricingConfigError::NonPositiveMultiplier { field: "festival_multiplier", .. })
        ));

        let bad = PricingConfig {
            urgent_days: 12,
            ..PricingConfig::default()
        };
        assert_eq!(bad.validate(), Err(PricingConfigError::WindowOrder { urgent: 12, soon: 10 }));

        let bad = PricingConfig {
            low_stock_threshold: -1,
            ..PricingConfig::default()
        };
        assert!(matches!(bad.validate(), Err(PricingConfigError::NegativeCount { .. })));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: PricingConfig =
            serde_json::from_str(r#"{"variant": "original", "rounding": "half_up"}"#).unwrap();
        assert_eq!(config.variant, Variant::Original);
        assert_eq!(config.rounding, RoundingMode::HalfUp);
        assert_eq!(config.urgent_days, 3);
        assert_eq!(config.effective_low_stock_multiplier(), 0.95);
    }
}
