//! Business-key reconciliation of an incoming snapshot against local state.
//!
//! Matching is by [`SyncEntity::business_key`], never by storage id. An
//! incoming entity with no local counterpart is a create; one whose content
//! differs is an update; identical content is left alone. Local entities
//! the leader does not mention are retained. Deletions do not propagate.

use std::collections::{BTreeMap, HashMap, HashSet};

use fleetsync_types::{
    AccessRule, Category, CategoryCounts, Certificate, DomainConfig, Snapshot, SyncEntity,
    UserAccount, WafRule,
};

/// Creates and updates for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryPlan<T> {
    pub creates: Vec<T>,
    pub updates: Vec<T>,
}

impl<T> Default for CategoryPlan<T> {
    fn default() -> Self {
        Self { creates: Vec::new(), updates: Vec::new() }
    }
}

impl<T> CategoryPlan<T> {
    pub fn counts(&self) -> CategoryCounts {
        CategoryCounts { created: self.creates.len(), updated: self.updates.len() }
    }

    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty()
    }

    /// Every entity that must be written, creates first.
    pub fn writes(&self) -> impl Iterator<Item = &T> {
        self.creates.iter().chain(self.updates.iter())
    }
}

/// First business key that appears more than once.
pub fn first_duplicate<T: SyncEntity>(entities: &[T]) -> Option<&str> {
    let mut seen = HashSet::new();
    entities.iter().map(SyncEntity::business_key).find(|key| !seen.insert(*key))
}

/// Category and key of the first duplicated business key in a snapshot.
pub fn duplicate_key(snapshot: &Snapshot) -> Option<(Category, String)> {
    fn check<T: SyncEntity>(entities: &[T]) -> Option<(Category, String)> {
        first_duplicate(entities).map(|key| (T::CATEGORY, key.to_string()))
    }
    check(&snapshot.domains)
        .or_else(|| check(&snapshot.certificates))
        .or_else(|| check(&snapshot.waf_rules))
        .or_else(|| check(&snapshot.access_rules))
        .or_else(|| check(&snapshot.users))
}

/// Diff one category. `incoming` must not repeat a business key.
pub fn diff_category<T: SyncEntity>(local: &[T], incoming: &[T]) -> CategoryPlan<T> {
    let by_key: HashMap<&str, &T> = local.iter().map(|e| (e.business_key(), e)).collect();
    let mut plan = CategoryPlan::default();

    for entity in incoming {
        match by_key.get(entity.business_key()) {
            None => plan.creates.push(entity.clone()),
            Some(existing) if *existing != entity => plan.updates.push(entity.clone()),
            Some(_) => {},
        }
    }
    plan
}

/// Full reconciliation plan across every category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    pub domains: CategoryPlan<DomainConfig>,
    pub certificates: CategoryPlan<Certificate>,
    pub waf_rules: CategoryPlan<WafRule>,
    pub access_rules: CategoryPlan<AccessRule>,
    pub users: CategoryPlan<UserAccount>,
}

impl ReconcilePlan {
    /// Both snapshots are expected to be normalized.
    pub fn between(local: &Snapshot, incoming: &Snapshot) -> Self {
        Self {
            domains: diff_category(&local.domains, &incoming.domains),
            certificates: diff_category(&local.certificates, &incoming.certificates),
            waf_rules: diff_category(&local.waf_rules, &incoming.waf_rules),
            access_rules: diff_category(&local.access_rules, &incoming.access_rules),
            users: diff_category(&local.users, &incoming.users),
        }
    }

    pub fn counts(&self) -> BTreeMap<Category, CategoryCounts> {
        BTreeMap::from([
            (Category::Domains, self.domains.counts()),
            (Category::Certificates, self.certificates.counts()),
            (Category::WafRules, self.waf_rules.counts()),
            (Category::AccessRules, self.access_rules.counts()),
            (Category::Users, self.users.counts()),
        ])
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
            && self.certificates.is_empty()
            && self.waf_rules.is_empty()
            && self.access_rules.is_empty()
            && self.users.is_empty()
    }
}
