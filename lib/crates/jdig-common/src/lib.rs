pub mod locator;
pub mod payload;

pub use locator::{ContextLocator, LocatorError};
pub use payload::{
    AttachParameters, DEFAULT_PORT, DecodedPayload, EnvSource, PayloadError, decode, encode,
};
