//! Static record descriptors.
//!
//! Every table-backed type declares, in one place, the ordered list of its
//! fields and the SQL column each one maps to. The [`record!`] macro expands a
//! single declaration into the struct, its [`FieldDescriptor`] table, the
//! positional row scan and the positional value list, so the three can never
//! disagree about column order.
//!
//! Convention: the first declared field is the primary key. The mapper keys
//! every `WHERE <pk> = ?` off position zero.

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, ValueRef};

/// Semantic type of a column as stored in SQLite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
    Boolean,
}

/// One (field, column, type, nullability) entry of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub field: &'static str,
    pub column: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
}

impl FieldDescriptor {
    pub const fn new(
        field: &'static str,
        column: &'static str,
        ty: ColumnType,
        nullable: bool,
    ) -> Self {
        Self {
            field,
            column,
            ty,
            nullable,
        }
    }
}

/// A value ready to be bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Text(String),
    Boolean(bool),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Boolean(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

/// Bind one [`SqlValue`] to the next placeholder of `query`.
pub fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<i64>),
        SqlValue::Integer(v) => query.bind(v),
        SqlValue::Text(v) => query.bind(v),
        SqlValue::Boolean(v) => query.bind(v),
    }
}

/// Rust types that can sit in a record field.
pub trait SqlColumn: Sized {
    const TYPE: ColumnType;
    const NULLABLE: bool = false;

    fn to_value(&self) -> SqlValue;

    fn decode(row: &SqliteRow, index: usize) -> Result<Self, sqlx::Error>;
}

impl SqlColumn for i64 {
    const TYPE: ColumnType = ColumnType::Integer;

    fn to_value(&self) -> SqlValue {
        SqlValue::Integer(*self)
    }

    fn decode(row: &SqliteRow, index: usize) -> Result<Self, sqlx::Error> {
        row.try_get(index)
    }
}

impl SqlColumn for bool {
    const TYPE: ColumnType = ColumnType::Boolean;

    fn to_value(&self) -> SqlValue {
        SqlValue::Boolean(*self)
    }

    fn decode(row: &SqliteRow, index: usize) -> Result<Self, sqlx::Error> {
        row.try_get(index)
    }
}

impl SqlColumn for String {
    const TYPE: ColumnType = ColumnType::Text;

    fn to_value(&self) -> SqlValue {
        SqlValue::Text(self.clone())
    }

    fn decode(row: &SqliteRow, index: usize) -> Result<Self, sqlx::Error> {
        row.try_get(index)
    }
}

impl<T: SqlColumn> SqlColumn for Option<T> {
    const TYPE: ColumnType = T::TYPE;
    const NULLABLE: bool = true;

    fn to_value(&self) -> SqlValue {
        match self {
            Some(v) => v.to_value(),
            None => SqlValue::Null,
        }
    }

    fn decode(row: &SqliteRow, index: usize) -> Result<Self, sqlx::Error> {
        if row.try_get_raw(index)?.is_null() {
            return Ok(None);
        }
        T::decode(row, index).map(Some)
    }
}

/// Primary key field: `Option<i64>` on insertable records, `i64` on
/// read-only projections.
pub trait PrimaryKey {
    fn key(&self) -> Option<i64>;
    fn assign(&mut self, id: i64);
}

impl PrimaryKey for i64 {
    fn key(&self) -> Option<i64> {
        Some(*self)
    }

    fn assign(&mut self, id: i64) {
        *self = id;
    }
}

impl PrimaryKey for Option<i64> {
    fn key(&self) -> Option<i64> {
        *self
    }

    fn assign(&mut self, id: i64) {
        *self = Some(id);
    }
}

/// Sequential typed scan over one result row.
pub struct RowCursor<'r> {
    row: &'r SqliteRow,
    next: usize,
}

impl<'r> RowCursor<'r> {
    pub fn new(row: &'r SqliteRow) -> Self {
        Self { row, next: 0 }
    }

    pub fn take<T: SqlColumn>(&mut self) -> Result<T, sqlx::Error> {
        let value = T::decode(self.row, self.next)?;
        self.next += 1;
        Ok(value)
    }
}

/// A type with a static descriptor that the mapper can read.
pub trait Record: Sized + Send + Unpin + Serialize + DeserializeOwned {
    /// Primary table; the `FROM` target and the `INSERT`/`UPDATE` target.
    const TABLE: &'static str;

    /// Join clauses appended after `FROM <TABLE>` for projections.
    const JOINS: &'static [&'static str];

    /// Ordered fields; index zero is the primary key.
    const FIELDS: &'static [FieldDescriptor];

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error>;

    /// Field values in descriptor order.
    fn values(&self) -> Vec<SqlValue>;

    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: i64);

    fn select_list() -> String {
        Self::FIELDS
            .iter()
            .map(|f| f.column)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `<TABLE> <JOINS...>`
    fn source() -> String {
        if Self::JOINS.is_empty() {
            Self::TABLE.to_string()
        } else {
            format!("{} {}", Self::TABLE, Self::JOINS.join(" "))
        }
    }
}

/// Marker for records backed one-to-one by a table, whose columns can be
/// written. Join projections never implement it.
pub trait Writable: Record {}

/// Declare a record struct together with its descriptor.
///
/// ```ignore
/// record! {
///     #[derive(Debug, Clone, Serialize, Deserialize)]
///     pub struct Manufacture in "manufacture" {
///         pub manufacture_id: Option<i64> => "manufactureId";
///         pub manufacture_name: String => "manufactureName",
///     }
/// }
/// ```
///
/// The key field is terminated with `;`, the rest with `,`. Projections add
/// `join JOINS_CONST` after the table name, naming a `[&str; N]` constant of
/// join clauses.
macro_rules! record {
    (@joins) => { &[] };
    (@joins $joins:path) => { &$joins };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident in $table:literal
        $(join $joins:path)?
        {
            $(#[$id_meta:meta])*
            $id_vis:vis $id:ident : $id_ty:ty => $id_col:literal;
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $field_ty:ty => $col:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(#[$id_meta])*
            $id_vis $id: $id_ty,
            $(
                $(#[$field_meta])*
                $field_vis $field: $field_ty,
            )*
        }

        impl $crate::database::descriptor::Record for $name {
            const TABLE: &'static str = $table;

            const JOINS: &'static [&'static str] =
                $crate::database::descriptor::record!(@joins $($joins)?);

            const FIELDS: &'static [$crate::database::descriptor::FieldDescriptor] = &[
                $crate::database::descriptor::FieldDescriptor::new(
                    stringify!($id),
                    $id_col,
                    <$id_ty as $crate::database::descriptor::SqlColumn>::TYPE,
                    <$id_ty as $crate::database::descriptor::SqlColumn>::NULLABLE,
                ),
                $(
                    $crate::database::descriptor::FieldDescriptor::new(
                        stringify!($field),
                        $col,
                        <$field_ty as $crate::database::descriptor::SqlColumn>::TYPE,
                        <$field_ty as $crate::database::descriptor::SqlColumn>::NULLABLE,
                    ),
                )*
            ];

            fn from_row(row: &::sqlx::sqlite::SqliteRow) -> Result<Self, ::sqlx::Error> {
                let mut cursor = $crate::database::descriptor::RowCursor::new(row);
                Ok(Self {
                    $id: cursor.take()?,
                    $($field: cursor.take()?,)*
                })
            }

            fn values(&self) -> Vec<$crate::database::descriptor::SqlValue> {
                vec![
                    $crate::database::descriptor::SqlColumn::to_value(&self.$id),
                    $($crate::database::descriptor::SqlColumn::to_value(&self.$field),)*
                ]
            }

            fn id(&self) -> Option<i64> {
                $crate::database::descriptor::PrimaryKey::key(&self.$id)
            }

            fn set_id(&mut self, id: i64) {
                $crate::database::descriptor::PrimaryKey::assign(&mut self.$id, id)
            }
        }
    };
}

pub(crate) use record;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    const SAMPLE_JOINS: [&str; 1] = ["LEFT JOIN other ON other.id = sample.otherId"];

    record! {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct Sample in "sample" join SAMPLE_JOINS {
            pub sample_id: Option<i64> => "sample.sampleId";
            pub label: String => "sample.label",
            pub flag: bool => "sample.flag",
            pub note: Option<String> => "other.note",
        }
    }

    #[test]
    fn descriptor_follows_declaration_order() {
        let columns: Vec<&str> = Sample::FIELDS.iter().map(|f| f.column).collect();
        assert_eq!(
            columns,
            vec!["sample.sampleId", "sample.label", "sample.flag", "other.note"]
        );
        assert_eq!(Sample::FIELDS[0].field, "sample_id");
    }

    #[test]
    fn descriptor_types_come_from_field_types() {
        assert_eq!(Sample::FIELDS[0].ty, ColumnType::Integer);
        assert!(Sample::FIELDS[0].nullable);
        assert_eq!(Sample::FIELDS[1].ty, ColumnType::Text);
        assert!(!Sample::FIELDS[1].nullable);
        assert_eq!(Sample::FIELDS[2].ty, ColumnType::Boolean);
        assert!(Sample::FIELDS[3].nullable);
    }

    #[test]
    fn values_are_positional() {
        let s = Sample {
            sample_id: None,
            label: "tent".into(),
            flag: true,
            note: Some("green".into()),
        };
        assert_eq!(
            s.values(),
            vec![
                SqlValue::Null,
                SqlValue::Text("tent".into()),
                SqlValue::Boolean(true),
                SqlValue::Text("green".into()),
            ]
        );
    }

    #[test]
    fn set_id_fills_the_key() {
        let mut s = Sample {
            sample_id: None,
            label: String::new(),
            flag: false,
            note: None,
        };
        assert_eq!(s.id(), None);
        s.set_id(9);
        assert_eq!(s.id(), Some(9));
    }

    #[test]
    fn source_appends_joins() {
        assert_eq!(
            Sample::source(),
            "sample LEFT JOIN other ON other.id = sample.otherId"
        );
        assert_eq!(
            Sample::select_list(),
            "sample.sampleId, sample.label, sample.flag, other.note"
        );
    }
}
