use thiserror::Error;

use crate::models::YearMonth;

/// Failures of the positioning engine.
///
/// None of these reach the user: every caller treats an error as
/// "position unchanged".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("no grid widget is attached to this pane")]
    NoWidget,
    #[error("month {0} is not present in the date index")]
    MonthNotIndexed(YearMonth),
    #[error("invalid year-month: {0:?}")]
    InvalidYearMonth(String),
    #[error("no month is known for this pane yet")]
    NoPosition,
    #[error("grid reports zero columns")]
    ZeroColumns,
}
