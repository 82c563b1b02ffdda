use crate::{
    db::{
        Host, RecordStore,
        query::{FilterSpec, Query, lower},
        write::{WriteRow, WriteSet},
    },
    error::InternalError,
    index::Indexer,
    value::Value,
};

///
/// Session
///
/// Pairs an [`Indexer`] with a host so callers can save and filter without
/// threading the conversion steps by hand.
///

#[derive(Clone, Copy, Debug)]
pub struct Session<'a, H> {
    indexer: &'a Indexer,
    host: &'a H,
}

impl<'a, H> Session<'a, H>
where
    H: Host + RecordStore,
{
    #[must_use]
    pub const fn new(indexer: &'a Indexer, host: &'a H) -> Self {
        Self { indexer, host }
    }

    /// Convert and persist a write set; returns the touched keys.
    pub fn save(&self, mut write: WriteSet) -> Result<Vec<Value>, InternalError> {
        self.indexer.convert_write(self.host, &mut write)?;

        self.host.persist(write)
    }

    pub fn insert(&self, entity: &str, rows: Vec<WriteRow>) -> Result<Vec<Value>, InternalError> {
        self.save(WriteSet::insert(entity, rows))
    }

    pub fn update(&self, entity: &str, rows: Vec<WriteRow>) -> Result<Vec<Value>, InternalError> {
        self.save(WriteSet::update(entity, rows))
    }

    /// Lower and rewrite a filter without executing it.
    pub fn query(&self, entity: &str, spec: &FilterSpec) -> Result<Query, InternalError> {
        let mut query = lower(self.host, entity, spec)?;
        self.indexer.rewrite_filters(self.host, &mut query)?;

        Ok(query)
    }

    /// Primary keys of `entity` records matching `spec`, in key order.
    pub fn filter(&self, entity: &str, spec: &FilterSpec) -> Result<Vec<Value>, InternalError> {
        let query = self.query(entity, spec)?;

        self.host.select_keys(&query)
    }
}
