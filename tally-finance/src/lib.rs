//! tally-finance: rule classification, month bucketing, spend forecast and
//! recurring-payment detection.

pub mod classifier;
pub mod forecast;
pub mod monthly;
pub mod recurring;

pub use classifier::{Classifier, ClassifyStats};
pub use forecast::{forecast_next_month, Forecast, Prediction, DEFAULT_LOOKBACK_MONTHS};
pub use monthly::{
    CategoryShare, CategorySeries, Flow, MonthTotals, MonthlyBuckets, Tally,
    DEFAULT_IGNORED_CATEGORY, UNSORTED,
};
pub use recurring::{detect_recurring, monthly_commitment, Frequency, RecurrenceThresholds, RecurringPayment};
