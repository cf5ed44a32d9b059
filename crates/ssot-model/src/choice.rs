//! Choice attributes.
//!
//! The inventory API represents enum-like attributes (status, role, duplex,
//! interface type, ...) as `{"value": "active", "label": "Active"}` on read
//! and accepts the bare value string on write. Choice enums here accept both
//! shapes and always serialize to the value string, so the label never leaks
//! into a request body.
//!
//! The server knows far more values than are modelled here (interface types
//! alone run to a few hundred). A value no variant matches deserializes into
//! the enum's `Unrecognized` variant and serializes back unchanged, so a
//! record carrying it still loads and diffs. Parsing with [`str::parse`]
//! stays strict.

use std::collections::HashSet;
use std::sync::{Mutex, OnceLock, PoisonError};

use serde::Deserialize;
use thiserror::Error;

/// Common behaviour of every choice enum.
pub trait Choice: Copy + Eq + std::fmt::Debug + Send + Sync + 'static {
    /// Canonical wire value.
    fn value(&self) -> &'static str;

    /// Human-readable label (display only).
    fn label(&self) -> &'static str;
}

/// Error returned when a wire value does not match any known choice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} choice: {value:?}")]
pub struct UnknownChoice {
    pub kind: &'static str,
    pub value: String,
}

/// Both wire shapes a choice can arrive in.
#[derive(Deserialize)]
#[serde(untagged)]
#[doc(hidden)]
pub enum ChoiceRepr {
    Plain(String),
    Labelled { value: String },
}

impl ChoiceRepr {
    #[doc(hidden)]
    pub fn into_value(self) -> String {
        match self {
            ChoiceRepr::Plain(value) | ChoiceRepr::Labelled { value } => value,
        }
    }
}

/// Interned copy of a wire value no variant matches.
///
/// Interning keeps choice enums `Copy`; the set only grows by the distinct
/// unknown values the server actually returns.
#[doc(hidden)]
pub fn intern(value: String) -> &'static str {
    static VALUES: OnceLock<Mutex<HashSet<&'static str>>> = OnceLock::new();
    let mut values = VALUES
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(known) = values.get(value.as_str()) {
        return known;
    }
    let leaked: &'static str = Box::leak(value.into_boxed_str());
    values.insert(leaked);
    leaked
}

/// Macro to define a choice enum with its wire values and labels.
macro_rules! choice {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => ($value:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// Server value with no matching variant, kept verbatim.
            Unrecognized(&'static str),
        }

        impl $name {
            /// Every known variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
        }

        impl $crate::choice::Choice for $name {
            fn value(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                    $name::Unrecognized(value) => *value,
                }
            }

            fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                    $name::Unrecognized(value) => *value,
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::choice::Choice::value(self))
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::choice::UnknownChoice;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    _ => Err($crate::choice::UnknownChoice {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str($crate::choice::Choice::value(self))
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> ::std::result::Result<Self, D::Error> {
                let raw = <$crate::choice::ChoiceRepr as ::serde::Deserialize>::deserialize(deserializer)?;
                let value = raw.into_value();
                Ok(value
                    .parse()
                    .unwrap_or_else(|_| $name::Unrecognized($crate::choice::intern(value))))
            }
        }
    };
}
