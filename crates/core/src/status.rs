//! Status enums mapping to SMALLINT lookup tables.
//!
//! Each variant's discriminant matches the seed data order (1-based) in the
//! corresponding `*_statuses` table. Serialized names are lowercase, which
//! is also the `name` column of the lookup rows.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Look up a variant from its database status ID.
            pub fn from_id(id: StatusId) -> Result<Self, CoreError> {
                match id {
                    $( $val => Ok(Self::$variant), )+
                    other => Err(CoreError::Internal(format!(
                        "Unknown {} id {other}",
                        stringify!($name)
                    ))),
                }
            }

            /// Lowercase name, as stored in the lookup table.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_status_enum! {
    /// Aggregate status of a playlist.
    PlaylistStatus {
        Pending = 1 => "pending",
        Generating = 2 => "generating",
        Ready = 3 => "ready",
        /// Some but not all tracks are ready.
        Partial = 4 => "partial",
        Error = 5 => "error",
    }
}

define_status_enum! {
    /// Status of a single track.
    TrackStatus {
        Pending = 1 => "pending",
        Generating = 2 => "generating",
        Ready = 3 => "ready",
        Error = 4 => "error",
    }
}

/// UI-facing lifecycle of one generation run. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Idle,
    Generating,
    Completed,
    Error,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn ids_round_trip_through_lookup() {
        for status in [
            PlaylistStatus::Pending,
            PlaylistStatus::Generating,
            PlaylistStatus::Ready,
            PlaylistStatus::Partial,
            PlaylistStatus::Error,
        ] {
            assert_eq!(PlaylistStatus::from_id(status.id()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_id_is_rejected() {
        assert_matches!(TrackStatus::from_id(9), Err(CoreError::Internal(_)));
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(PlaylistStatus::Partial).unwrap(),
            serde_json::json!("partial")
        );
        assert_eq!(TrackStatus::Generating.to_string(), "generating");
    }
}
