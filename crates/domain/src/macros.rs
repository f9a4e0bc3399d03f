//! Macro for implementing Display and FromStr for wire-level enums
//!
//! Wire enums (HTTP methods, cookie attributes) have one canonical spelling
//! on output but are accepted in any case on input.
//!
//! # Example
//!
//! ```rust
//! use feedwire_domain::impl_wire_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Priority {
//!     Low,
//!     High,
//! }
//!
//! impl_wire_enum_conversions!(Priority {
//!     Low => "low",
//!     High => "HIGH",
//! });
//!
//! assert_eq!(Priority::High.to_string(), "HIGH");
//! assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
//! ```

/// Implements `Display` (canonical spelling) and case-insensitive `FromStr`
/// for a fieldless enum.
#[macro_export]
macro_rules! impl_wire_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical wire spelling of this variant.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.trim().eq_ignore_ascii_case($str) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}
