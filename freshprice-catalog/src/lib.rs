pub mod product;
pub mod expiry;
pub mod pricing;
pub mod money;
pub mod quote;

pub use product::{PriceBand, ProductError, ProductInput};
pub use expiry::{ExpiryError, ExpiryWindow};
pub use pricing::{PriceBreakdown, PricingConfig, PricingConfigError, PricingContext, PricingEngine, Variant};
pub use money::RoundingMode;
pub use quote::{quote, Quote};
