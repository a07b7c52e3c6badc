pub mod record;
pub mod schema;

pub use record::{ChurnClass, CustomerRecord, Prediction, Probabilities, RawValue, TrainingRow};
pub use schema::{LayoutError, check_layout};
