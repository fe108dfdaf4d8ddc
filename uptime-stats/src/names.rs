use crate::client::{ApiError, UptimeApi};
use crate::domain::{CheckNames, CheckPk};
use crate::governor::Pacer;
use std::collections::btree_map::Entry;

/// Run-scoped cache of check names. Each key is fetched at most once and
/// never refreshed.
#[derive(Debug, Default)]
pub struct NameResolver {
    names: CheckNames,
}

impl NameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(
        &mut self,
        api: &impl UptimeApi,
        pacer: &mut impl Pacer,
        pk: &CheckPk,
    ) -> Result<&str, ApiError> {
        match self.names.entry(pk.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut().as_str()),
            Entry::Vacant(entry) => {
                pacer.pace();
                let name = api.check_name(pk)?;
                tracing::debug!("Check {} is named {:?}", pk, name);
                Ok(entry.insert(name).as_str())
            }
        }
    }

    pub fn names(&self) -> &CheckNames {
        &self.names
    }

    pub fn into_names(self) -> CheckNames {
        self.names
    }
}
