//! Entity model definitions.
//!
//! Closed enumerations are declared with `labelled_enum!`, which gives each
//! one a canonical persisted label plus `FromStr`, serde, and rusqlite
//! conversions that all agree on that label.

/// Declare a closed enum persisted as its human label.
///
/// Parsing ignores case and punctuation, so "Bi_weekly", "bi-weekly" and
/// "Bi-weekly" are the same value. Extra `| "alias"` spellings map older
/// labels onto a variant.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $variant:ident => $label:literal $(| $alias:literal)* ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            /// Canonical persisted label.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::flock_core::error::FlockError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let key = $crate::models::label_key(s);
                $(
                    if key == $crate::models::label_key($label)
                        $( || key == $crate::models::label_key($alias) )*
                    {
                        return Ok($name::$variant);
                    }
                )+
                Err(::flock_core::error::FlockError::Validation(format!(
                    "unknown {} '{}'",
                    stringify!($name),
                    s.trim()
                )))
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let label = String::deserialize(deserializer)?;
                label.parse().map_err(::serde::de::Error::custom)
            }
        }

        impl ::rusqlite::types::ToSql for $name {
            fn to_sql(&self) -> ::rusqlite::Result<::rusqlite::types::ToSqlOutput<'_>> {
                Ok(::rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl ::rusqlite::types::FromSql for $name {
            fn column_result(
                value: ::rusqlite::types::ValueRef<'_>,
            ) -> ::rusqlite::types::FromSqlResult<Self> {
                value.as_str()?.parse().map_err(
                    |e: ::flock_core::error::FlockError| {
                        ::rusqlite::types::FromSqlError::Other(Box::new(e))
                    },
                )
            }
        }
    };
}

pub mod member;
pub mod demographics;
pub mod event;
pub mod volunteer;
pub mod sent_notification;

/// Comparison key for enum labels: lowercase ASCII alphanumerics only.
pub(crate) fn label_key(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Trim a text field, treating blank as absent.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
