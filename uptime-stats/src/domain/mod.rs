mod check_pk;
mod output;
mod stats;
mod window;

pub use check_pk::{CheckPk, CheckSelection};
pub use output::{OutputFormat, OutputKind};
pub use stats::{
    Alert, CheckNames, CheckSeries, CheckStatistics, Datapoint, StatDay, StatisticBlock,
    AggregatedStats,
};
pub use window::{DateWindow, DEFAULT_WINDOW_DAYS, parse_end_date};
