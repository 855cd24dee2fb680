use crate::family::RecordFamily;
use engine_core::{
    connectors::target::TargetStore, error::StoreError, state::identity::IdentityMap,
};
use model::records::{SourceRecord, key::NaturalKey};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// A source row that passed every existence check.
#[derive(Debug, Clone)]
pub struct Candidate<S> {
    pub record: S,
    /// New id of the record this row depends on, if the family has one.
    pub owner: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SkipCounts {
    pub dependency_missing: u64,
    pub natural_key: u64,
    pub already_migrated: u64,
}

impl SkipCounts {
    pub fn total(&self) -> u64 {
        self.dependency_missing + self.natural_key + self.already_migrated
    }
}

#[derive(Debug)]
pub struct FilterOutcome<S> {
    pub eligible: Vec<Candidate<S>>,
    pub skipped: SkipCounts,
    /// `(legacy id, existing target id)` pairs found by natural key.
    pub adopted: Vec<(String, String)>,
}

/// Rows left after the checks that need no target query.
#[derive(Debug)]
pub struct Screened<S> {
    pending: Vec<(S, Option<String>, Vec<NaturalKey>)>,
    pub skipped: SkipCounts,
}

/// Drops rows that must not be inserted, in this order: missing dependency,
/// already in the identity map, natural-key collision, duplicate within the
/// batch.
pub struct ExistenceFilter<'a, F: RecordFamily> {
    family: &'a F,
    target: &'a dyn TargetStore<F::Target>,
    dependencies: Option<&'a IdentityMap>,
}

impl<'a, F: RecordFamily> ExistenceFilter<'a, F> {
    pub fn new(
        family: &'a F,
        target: &'a dyn TargetStore<F::Target>,
        dependencies: Option<&'a IdentityMap>,
    ) -> Self {
        Self {
            family,
            target,
            dependencies,
        }
    }

    pub async fn apply(
        &self,
        batch: Vec<F::Source>,
        identities: &IdentityMap,
    ) -> Result<FilterOutcome<F::Source>, StoreError> {
        let screened = self.screen(batch, identities);
        self.resolve(screened, identities).await
    }

    /// Dependency and identity-map checks. Never touches the target.
    pub fn screen(&self, batch: Vec<F::Source>, identities: &IdentityMap) -> Screened<F::Source> {
        let family = self.family.name();
        let mut skipped = SkipCounts::default();
        let mut pending = Vec::with_capacity(batch.len());

        for record in batch {
            let owner = match self.family.dependency_id(&record) {
                None => None,
                Some(dependency) => match self.dependencies.and_then(|deps| deps.get(dependency)) {
                    Some(owner) => Some(owner.to_string()),
                    None => {
                        debug!(family, id = record.id(), dependency, "Dependency not migrated, skipping");
                        skipped.dependency_missing += 1;
                        continue;
                    }
                },
            };

            if identities.contains(record.id()) {
                debug!(family, id = record.id(), "Already migrated, skipping");
                skipped.already_migrated += 1;
                continue;
            }

            let keys = self.family.natural_keys(&record, owner.as_deref());
            pending.push((record, owner, keys));
        }

        Screened { pending, skipped }
    }

    /// Natural-key checks against the target and within the batch.
    pub async fn resolve(
        &self,
        screened: Screened<F::Source>,
        identities: &IdentityMap,
    ) -> Result<FilterOutcome<F::Source>, StoreError> {
        let family = self.family.name();
        let Screened { pending, mut skipped } = screened;
        let existing = self.lookup_existing(&pending).await?;

        let mut claimed: HashSet<NaturalKey> = HashSet::new();
        let mut taken: HashSet<String> = HashSet::new();
        let mut eligible = Vec::with_capacity(pending.len());
        let mut adopted = Vec::new();

        for (record, owner, keys) in pending {
            let collisions: Vec<(&NaturalKey, &String)> = keys
                .iter()
                .filter_map(|key| existing.get(key).map(|id| (key, id)))
                .collect();

            if let Some((key, _)) = collisions.first() {
                debug!(family, id = record.id(), %key, "Natural key already in target, skipping");
                skipped.natural_key += 1;

                if let Some((key, existing_id)) = collisions
                    .iter()
                    .find(|(key, _)| self.family.adopts_on(key))
                {
                    if identities.maps_to(existing_id) || !taken.insert((*existing_id).clone()) {
                        warn!(
                            family,
                            id = record.id(),
                            %key,
                            existing = %existing_id,
                            "Existing target record already claimed by another legacy id, not adopting"
                        );
                    } else {
                        adopted.push((record.id().to_string(), (*existing_id).clone()));
                    }
                }
                continue;
            }

            if let Some(key) = keys.iter().find(|key| claimed.contains(*key)) {
                warn!(family, id = record.id(), %key, "Natural key duplicated within batch, skipping");
                skipped.natural_key += 1;
                continue;
            }

            claimed.extend(keys);
            eligible.push(Candidate { record, owner });
        }

        Ok(FilterOutcome {
            eligible,
            skipped,
            adopted,
        })
    }

    /// One bulk membership query for every key of the batch.
    async fn lookup_existing(
        &self,
        pending: &[(F::Source, Option<String>, Vec<NaturalKey>)],
    ) -> Result<HashMap<NaturalKey, String>, StoreError> {
        let mut keys: Vec<NaturalKey> = pending
            .iter()
            .flat_map(|(_, _, keys)| keys.iter().cloned())
            .collect();
        keys.sort();
        keys.dedup();

        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        self.target.find_existing(&keys).await
    }
}
