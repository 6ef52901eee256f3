use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use super::error::{CoreError, CoreResult, InvalidIdSnafu};

// Every backend id is a positive integer; wrappers keep rooms, messages and users apart.
macro_rules! define_wire_id {
    ($name:ident, $id_type:literal) => {
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub fn parse(raw: &str) -> CoreResult<Self> {
                let parsed = raw.trim().parse::<u64>().context(InvalidIdSnafu {
                    stage: "parse-wire-id",
                    id_type: $id_type,
                    raw: raw.to_string(),
                })?;
                Ok(Self(parsed))
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self::new(value)
            }
        }

        impl From<$name> for u64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(raw: &str) -> CoreResult<Self> {
                Self::parse(raw)
            }
        }
    };
}

define_wire_id!(RoomId, "room-id");
define_wire_id!(MessageId, "message-id");
define_wire_id!(UserId, "user-id");
