mod helpers;
mod price;
mod secret;

pub use helpers::{parse_boolean_flag, parse_env_or_default};
pub use price::{Price, PriceConversionError};
pub use secret::Secret;
