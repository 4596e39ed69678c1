//! Identity types.
//!
//! All three ids are human-readable strings on the wire: player ids look
//! like `bouncy-coral-quokka-x7k2`, room and game ids like `K3Q9ZD`. The
//! newtypes keep them from being mixed up in function signatures.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// `true` for the empty string, which clients send when they
            /// mean "no id".
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

string_id! {
    /// The stable identity of a player. Survives reconnects; a session
    /// token resolves to exactly one of these.
    PlayerId
}

string_id! {
    /// A room: the persistent container players join.
    RoomId
}

string_id! {
    /// One game inside a room. Unique among that room's active games.
    GameId
}
