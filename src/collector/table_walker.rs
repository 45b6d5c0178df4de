use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::error::SnmpError;
use crate::snmp::{ObjectId, RawValue, SnmpTransport, VarBind};

/// GETBULK page size when a call site does not pick its own.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Why a walk stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEnd {
    /// Collected `max_rows` rows
    MaxRows,
    /// First OID outside the prefix, or endOfMibView
    EndOfTable,
    /// Agent returned no varbinds
    EmptyPage,
    /// A page added no new row
    NoProgress,
    /// Request failed; rows collected so far are kept
    Error(SnmpError),
}

/// Rows of one table walk, keyed by interface index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableWalkResult {
    pub rows: BTreeMap<u32, RawValue>,
    pub end: WalkEnd,
}

impl TableWalkResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The error that ended the walk, if it ended before any row was read.
    pub fn failure(&self) -> Option<&SnmpError> {
        match &self.end {
            WalkEnd::Error(e) if self.rows.is_empty() => Some(e),
            _ => None,
        }
    }

    /// Integer rows whose index passes `keep`; non-integer values are dropped.
    pub fn integers_where(&self, keep: impl Fn(u32) -> bool) -> BTreeMap<u32, i64> {
        self.rows
            .iter()
            .filter(|(index, _)| keep(**index))
            .filter_map(|(index, value)| value.as_integer().map(|v| (*index, v)))
            .collect()
    }
}

/// Paged walk of a single table column.
#[derive(Debug, Clone, Copy)]
pub struct BulkTableWalker {
    page_size: u32,
}

impl Default for BulkTableWalker {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl BulkTableWalker {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    /// Walks `prefix` until the table ends, `max_rows` rows are collected, or
    /// the agent errors. Never fails: errors end the walk with what was read.
    pub async fn walk(
        &self,
        transport: &mut dyn SnmpTransport,
        prefix: &ObjectId,
        max_rows: usize,
    ) -> TableWalkResult {
        let mut rows = BTreeMap::new();
        let mut cursor = prefix.clone();

        let end = loop {
            if rows.len() >= max_rows {
                break WalkEnd::MaxRows;
            }

            let remaining = u32::try_from(max_rows - rows.len()).unwrap_or(u32::MAX);
            let page = match transport.get_bulk(&cursor, self.page_size.min(remaining)).await {
                Ok(page) => page,
                Err(e) => {
                    debug!(%prefix, error = %e, rows = rows.len(), "walk ended by error");
                    break WalkEnd::Error(e);
                }
            };

            if page.is_empty() {
                break WalkEnd::EmptyPage;
            }

            match self.consume_page(page, prefix, &mut cursor, &mut rows, max_rows) {
                Some(end) => break end,
                None => continue,
            }
        };

        trace!(%prefix, rows = rows.len(), ?end, "walk finished");
        TableWalkResult { rows, end }
    }

    /// Folds one page into `rows`. Returns the end reason if the walk is over.
    fn consume_page(
        &self,
        page: Vec<VarBind>,
        prefix: &ObjectId,
        cursor: &mut ObjectId,
        rows: &mut BTreeMap<u32, RawValue>,
        max_rows: usize,
    ) -> Option<WalkEnd> {
        let mut new_rows = 0usize;

        for vb in page {
            if !vb.oid.starts_with(prefix) || vb.value == RawValue::EndOfMibView {
                return Some(WalkEnd::EndOfTable);
            }

            match vb.oid.trailing_index(prefix) {
                Some(index) => {
                    if rows.insert(index, vb.value).is_none() {
                        new_rows += 1;
                    }
                }
                None => trace!(oid = %vb.oid, "skipping row with malformed index"),
            }
            *cursor = vb.oid;

            if rows.len() >= max_rows {
                return Some(WalkEnd::MaxRows);
            }
        }

        if new_rows == 0 {
            return Some(WalkEnd::NoProgress);
        }
        None
    }
}
