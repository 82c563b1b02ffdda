use derive_more::Display;
use std::collections::BTreeMap;

///
/// Alias
///
/// Table alias inside one query. `T0` is always the queried record type.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("T{_0}")]
pub struct Alias(pub u32);

impl Alias {
    pub const ROOT: Self = Self(0);

    #[must_use]
    pub const fn is_root(self) -> bool {
        self.0 == 0
    }
}

///
/// Join
///
/// One foreign-key hop: `parent.via` references the primary key of `entity`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Join {
    pub entity: String,
    pub parent: Alias,
    pub via: String,
    pub target_column: String,

    /// Left outer join; unmatched rows read null columns.
    pub outer: bool,

    /// Number of constraints reading through this join.
    pub refcount: usize,
}

///
/// JoinMap
///
/// Join bookkeeping for one query. A constraint reading alias `Tn` holds one
/// reference on `Tn` and on every ancestor join back to the root.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinMap {
    root_entity: String,
    joins: BTreeMap<Alias, Join>,
    next: u32,
}

impl JoinMap {
    #[must_use]
    pub fn new(root_entity: impl Into<String>) -> Self {
        Self {
            root_entity: root_entity.into(),
            joins: BTreeMap::new(),
            next: 1,
        }
    }

    #[must_use]
    pub fn root_entity(&self) -> &str {
        &self.root_entity
    }

    #[must_use]
    pub fn get(&self, alias: Alias) -> Option<&Join> {
        self.joins.get(&alias)
    }

    /// Record type read through `alias`.
    #[must_use]
    pub fn entity_of(&self, alias: Alias) -> Option<&str> {
        if alias.is_root() {
            return Some(&self.root_entity);
        }

        self.joins.get(&alias).map(|join| join.entity.as_str())
    }

    #[must_use]
    pub fn contains(&self, alias: Alias) -> bool {
        alias.is_root() || self.joins.contains_key(&alias)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Alias, &Join)> {
        self.joins.iter().map(|(alias, join)| (*alias, join))
    }

    /// Find the join that follows `via` out of `parent`, if the query has one.
    #[must_use]
    pub fn find(&self, parent: Alias, via: &str) -> Option<Alias> {
        self.joins
            .iter()
            .find(|(_, join)| join.parent == parent && join.via == via)
            .map(|(alias, _)| *alias)
    }

    /// Reuse or create the join for `parent.via`, returning its alias.
    /// The caller takes references separately through [`Self::ref_chain`].
    pub fn join(
        &mut self,
        parent: Alias,
        via: &str,
        entity: &str,
        target_column: &str,
        outer: bool,
    ) -> Alias {
        if let Some(alias) = self.find(parent, via) {
            if let Some(join) = self.joins.get_mut(&alias) {
                join.outer |= outer;
            }
            return alias;
        }

        let alias = Alias(self.next);
        self.next += 1;
        self.joins.insert(
            alias,
            Join {
                entity: entity.to_string(),
                parent,
                via: via.to_string(),
                target_column: target_column.to_string(),
                outer,
                refcount: 0,
            },
        );

        alias
    }

    /// Aliases from `alias` back to (not including) the root.
    #[must_use]
    pub fn chain(&self, alias: Alias) -> Vec<Alias> {
        let mut out = Vec::new();
        let mut current = alias;

        while let Some(join) = self.joins.get(&current) {
            out.push(current);
            current = join.parent;
        }

        out
    }

    /// Take one reference on `alias` and every ancestor join.
    pub fn ref_chain(&mut self, alias: Alias) {
        for hop in self.chain(alias) {
            if let Some(join) = self.joins.get_mut(&hop) {
                join.refcount += 1;
            }
        }
    }

    /// Drop one reference on `alias` only, removing it at zero.
    /// Returns whether the join was removed.
    pub fn unref(&mut self, alias: Alias) -> bool {
        let Some(join) = self.joins.get_mut(&alias) else {
            return false;
        };

        join.refcount = join.refcount.saturating_sub(1);
        if join.refcount == 0 {
            self.joins.remove(&alias);
            return true;
        }

        false
    }

    /// Drop one reference on `alias` and every ancestor join.
    /// Returns how many joins were removed.
    pub fn unref_chain(&mut self, alias: Alias) -> usize {
        self.chain(alias)
            .into_iter()
            .filter(|hop| self.unref(*hop))
            .count()
    }
}
