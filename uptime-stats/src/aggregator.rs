use crate::client::{ApiError, UptimeApi};
use crate::domain::{AggregatedStats, CheckPk, CheckSelection, CheckSeries, DateWindow, StatDay};
use crate::governor::Pacer;
use crate::names::NameResolver;
use chrono::NaiveDate;

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("Failed to look up the name of check {pk}")]
    Name {
        pk: CheckPk,
        #[source]
        source: ApiError,
    },
    #[error("Failed to fetch statistics for {scope} on {date}")]
    Stats {
        scope: String,
        date: NaiveDate,
        #[source]
        source: ApiError,
    },
}

fn scope(pk: Option<&CheckPk>) -> String {
    match pk {
        Some(pk) => format!("check {}", pk),
        None => "all checks".to_owned(),
    }
}

/// Walks a date window one day per call and collects the results per check.
/// The first failed call aborts the whole run.
pub struct Aggregator<A, P> {
    api: A,
    pacer: P,
    names: NameResolver,
}

impl<A: UptimeApi, P: Pacer> Aggregator<A, P> {
    pub fn new(api: A, pacer: P) -> Self {
        Self {
            api,
            pacer,
            names: NameResolver::new(),
        }
    }

    #[tracing::instrument(
        name = "Aggregating check statistics",
        skip(self, selection),
        fields(start = %window.start(), end = %window.end())
    )]
    pub fn aggregate(
        mut self,
        selection: &CheckSelection,
        window: DateWindow,
    ) -> Result<AggregatedStats, AggregateError> {
        let series = match selection {
            CheckSelection::All => vec![CheckSeries {
                pk: None,
                days: self.fetch_days(None, window)?,
            }],
            CheckSelection::Explicit(keys) => {
                let mut series = Vec::with_capacity(keys.len());
                for pk in keys {
                    series.push(self.fetch_check(pk, window)?);
                }
                series
            }
        };
        Ok(AggregatedStats {
            series,
            names: self.names.into_names(),
        })
    }

    fn fetch_check(&mut self, pk: &CheckPk, window: DateWindow) -> Result<CheckSeries, AggregateError> {
        tracing::info!("Fetching data for check with primary key: {} ...", pk);
        self.resolve_name(pk)?;
        Ok(CheckSeries {
            pk: Some(pk.clone()),
            days: self.fetch_days(Some(pk), window)?,
        })
    }

    fn resolve_name(&mut self, pk: &CheckPk) -> Result<(), AggregateError> {
        self.names
            .resolve(&self.api, &mut self.pacer, pk)
            .map_err(|source| AggregateError::Name {
                pk: pk.clone(),
                source,
            })?;
        Ok(())
    }

    fn fetch_days(
        &mut self,
        pk: Option<&CheckPk>,
        window: DateWindow,
    ) -> Result<Vec<StatDay>, AggregateError> {
        let mut days = Vec::with_capacity(window.day_count());
        for date in window.days() {
            self.pacer.pace();
            let checks = self
                .api
                .stats_for_day(pk, date)
                .map_err(|source| AggregateError::Stats {
                    scope: scope(pk),
                    date,
                    source,
                })?;
            tracing::debug!("{} check entries for {} on {}", checks.len(), scope(pk), date);

            // Account-wide payloads introduce checks we have not named yet.
            if pk.is_none() {
                for entry in &checks {
                    self.resolve_name(&entry.pk)?;
                }
            }
            days.push(StatDay { date, checks });
        }
        Ok(days)
    }
}
