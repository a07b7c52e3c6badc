//! Client side of `POST /predict`.

pub mod http;

pub use http::{ClientError, PredictClient};
