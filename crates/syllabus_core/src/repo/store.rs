//! Document store adapter over SQLite tables.
//!
//! # Responsibility
//! - Name the five content collections and their queryable fields.
//! - Translate field predicates (equality, membership, publication gate) and
//!   an optional ascending sort key into parameterized SQL.
//! - Run `find`, `find_one`, `count` and `distinct` with one statement each.
//!
//! # Invariants
//! - Field names are checked against the collection before SQL is built.
//! - Values are always bound, never interpolated.
//! - Membership over an empty set matches nothing.
//! - Results without a sort key come back in storage order; sorted results
//!   break ties on storage order.
//! - No match is an empty result, not an error.
//! - With a query timeout set, every statement runs under a fresh deadline.

use crate::db::{arm_query_deadline, DbError};
use log::trace;
use rusqlite::types::{FromSql, Value};
use rusqlite::{params_from_iter, Connection, Row};
use std::cell::Cell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for store adapter and repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Persisted data cannot be converted to a valid document.
    InvalidData(String),
    /// Predicate or sort key names a field the collection does not have.
    UnknownField {
        collection: &'static str,
        field: &'static str,
    },
    /// Publication gate requested on a collection without a terminal flag.
    UngatedCollection(&'static str),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
}

impl RepoError {
    /// Returns whether the failure is the store being unreachable or too slow.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Db(err) => err.is_unavailable(),
            _ => false,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted content: {message}"),
            Self::UnknownField { collection, field } => {
                write!(f, "collection `{collection}` has no field `{field}`")
            }
            Self::UngatedCollection(collection) => {
                write!(f, "collection `{collection}` has no publication gate")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "content repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "content repository requires table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Named document collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Syllabus,
    SubTopics,
    MicroUnits,
    MicroUnitNotes,
    MicroUnitMcqs,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Syllabus,
        Collection::SubTopics,
        Collection::MicroUnits,
        Collection::MicroUnitNotes,
        Collection::MicroUnitMcqs,
    ];

    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            Self::Syllabus => "syllabus",
            Self::SubTopics => "subtopics",
            Self::MicroUnits => "micro_units",
            Self::MicroUnitNotes => "micro_unit_notes",
            Self::MicroUnitMcqs => "micro_unit_mcqs",
        }
    }

    /// Every stored field, in projection order.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Syllabus => &[
                "uuid",
                "exam",
                "stage",
                "paper",
                "subject",
                "subtopics",
                "v1",
                "v2",
                "v3",
                "v4",
            ],
            Self::SubTopics => &[
                "uuid",
                "name",
                "subject",
                "generated",
                "cleaned",
                "verified",
                "finalized",
            ],
            Self::MicroUnits => &[
                "uuid",
                "name",
                "subject",
                "subtopic_uuid",
                "sort_order",
                "generated",
                "verified",
                "finalized",
            ],
            Self::MicroUnitNotes => &[
                "uuid",
                "micro_unit_uuid",
                "content",
                "word_count",
                "image_required",
                "image_reasons",
                "generated",
                "verified",
            ],
            Self::MicroUnitMcqs => &[
                "uuid",
                "micro_unit_uuid",
                "mcq_count",
                "mcqs",
                "remarks",
                "commentary",
                "content",
                "image_required",
                "image_reasons",
                "generated",
                "verified",
            ],
        }
    }

    /// Terminal pipeline flag deciding reader visibility, if the collection is gated.
    pub fn gate_field(self) -> Option<&'static str> {
        match self {
            Self::Syllabus => Some("v4"),
            Self::SubTopics => Some("finalized"),
            Self::MicroUnits => Some("finalized"),
            Self::MicroUnitNotes | Self::MicroUnitMcqs => None,
        }
    }

    fn check_field(self, field: &'static str) -> RepoResult<()> {
        if self.fields().contains(&field) {
            Ok(())
        } else {
            Err(RepoError::UnknownField {
                collection: self.table(),
                field,
            })
        }
    }
}

/// A typed document decoded from one collection row.
pub trait Document: Sized {
    const COLLECTION: Collection;

    fn from_row(row: &Row<'_>) -> RepoResult<Self>;
}

/// One field predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq { field: &'static str, value: Value },
    In { field: &'static str, values: Vec<Value> },
}

/// Predicate set plus optional ascending sort key over one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFilter {
    collection: Collection,
    predicates: Vec<Predicate>,
    published_only: bool,
    sort_by: Option<&'static str>,
}

impl DocumentFilter {
    /// Matches every document of the collection.
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            predicates: Vec::new(),
            published_only: false,
            sort_by: None,
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Adds `field = value`.
    pub fn eq(mut self, field: &'static str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Eq {
            field,
            value: value.into(),
        });
        self
    }

    /// Adds `field = value` for text values.
    pub fn eq_text(self, field: &'static str, value: &str) -> Self {
        self.eq(field, Value::Text(value.to_string()))
    }

    /// Adds `field ∈ values`.
    pub fn is_in<I, V>(mut self, field: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.predicates.push(Predicate::In {
            field,
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Restricts to documents passing the publication gate.
    pub fn published(mut self) -> Self {
        self.published_only = true;
        self
    }

    /// Sorts ascending by `field`, ties in storage order.
    pub fn sort_ascending(mut self, field: &'static str) -> Self {
        self.sort_by = Some(field);
        self
    }

    fn where_clause(&self) -> RepoResult<(String, Vec<Value>)> {
        let mut clauses: Vec<String> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        for predicate in &self.predicates {
            match predicate {
                Predicate::Eq { field, value } => {
                    self.collection.check_field(field)?;
                    clauses.push(format!("{field} = ?"));
                    bind_values.push(value.clone());
                }
                Predicate::In { field, values } => {
                    self.collection.check_field(field)?;
                    if values.is_empty() {
                        clauses.push("0 = 1".to_string());
                        continue;
                    }
                    let marks = vec!["?"; values.len()].join(", ");
                    clauses.push(format!("{field} IN ({marks})"));
                    bind_values.extend(values.iter().cloned());
                }
            }
        }

        if self.published_only {
            let gate = self
                .collection
                .gate_field()
                .ok_or(RepoError::UngatedCollection(self.collection.table()))?;
            clauses.push(format!("{gate} = 1"));
        }

        let sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        Ok((sql, bind_values))
    }

    fn order_clause(&self) -> RepoResult<String> {
        match self.sort_by {
            Some(field) => {
                self.collection.check_field(field)?;
                Ok(format!(" ORDER BY {field} ASC, rowid ASC"))
            }
            None => Ok(" ORDER BY rowid ASC".to_string()),
        }
    }

    fn select_sql(&self) -> RepoResult<(String, Vec<Value>)> {
        let (where_sql, bind_values) = self.where_clause()?;
        let order_sql = self.order_clause()?;
        let sql = format!(
            "SELECT {} FROM {}{}{};",
            self.collection.fields().join(", "),
            self.collection.table(),
            where_sql,
            order_sql
        );
        Ok((sql, bind_values))
    }
}

/// Read-only query executor over one connection.
pub struct DocumentStore<'conn> {
    conn: &'conn Connection,
    round_trips: Cell<u64>,
    query_timeout: Option<Duration>,
}

impl<'conn> DocumentStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            round_trips: Cell::new(0),
            query_timeout: None,
        }
    }

    /// Bounds the execution time of each statement issued from now on.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Number of statements executed through this store.
    pub fn round_trips(&self) -> u64 {
        self.round_trips.get()
    }

    /// Returns every matching document.
    pub fn find<D: Document>(&self, filter: &DocumentFilter) -> RepoResult<Vec<D>> {
        ensure_collection::<D>(filter)?;
        let (sql, bind_values) = filter.select_sql()?;
        self.record(&sql);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(D::from_row(row)?);
        }
        Ok(documents)
    }

    /// Returns the first matching document in filter order.
    pub fn find_one<D: Document>(&self, filter: &DocumentFilter) -> RepoResult<Option<D>> {
        ensure_collection::<D>(filter)?;
        let (select_sql, bind_values) = filter.select_sql()?;
        let sql = format!("{} LIMIT 1;", select_sql.trim_end_matches(';'));
        self.record(&sql);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        match rows.next()? {
            Some(row) => Ok(Some(D::from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Counts matching documents.
    pub fn count(&self, filter: &DocumentFilter) -> RepoResult<u64> {
        let (where_sql, bind_values) = filter.where_clause()?;
        let sql = format!(
            "SELECT COUNT(*) FROM {}{};",
            filter.collection().table(),
            where_sql
        );
        self.record(&sql);

        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(bind_values), |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }

    /// Returns distinct values of `field` among matching documents, ascending.
    pub fn distinct<T: FromSql>(
        &self,
        filter: &DocumentFilter,
        field: &'static str,
    ) -> RepoResult<Vec<T>> {
        filter.collection().check_field(field)?;
        let (where_sql, bind_values) = filter.where_clause()?;
        let sql = format!(
            "SELECT DISTINCT {field} FROM {}{} ORDER BY {field} ASC;",
            filter.collection().table(),
            where_sql
        );
        self.record(&sql);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut values = Vec::new();
        while let Some(row) = rows.next()? {
            values.push(row.get::<_, T>(0)?);
        }
        Ok(values)
    }

    fn record(&self, sql: &str) {
        self.round_trips.set(self.round_trips.get() + 1);
        if let Some(timeout) = self.query_timeout {
            arm_query_deadline(self.conn, timeout);
        }
        trace!("event=store_query module=repo sql={sql}");
    }
}

fn ensure_collection<D: Document>(filter: &DocumentFilter) -> RepoResult<()> {
    if filter.collection() == D::COLLECTION {
        Ok(())
    } else {
        Err(RepoError::InvalidData(format!(
            "filter targets `{}` but document decodes from `{}`",
            filter.collection().table(),
            D::COLLECTION.table()
        )))
    }
}
