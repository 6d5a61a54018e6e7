//! Macro for implementing Display and FromStr for settings enums
//!
//! Destination settings arrive as strings (config files, environment
//! variables). This macro gives each enum a single, case-insensitive
//! string mapping used for both parsing and display.
//!
//! # Example
//!
//! ```rust
//! use adrelay_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Channel {
//!     Web,
//!     MobileApp,
//! }
//!
//! impl_domain_enum_conversions!(Channel {
//!     Web => "web",
//!     MobileApp => "mobile_app",
//! });
//!
//! assert_eq!("MOBILE_APP".parse::<Channel>().unwrap(), Channel::MobileApp);
//! ```

/// Implements Display and FromStr traits for settings enums
///
/// This macro generates:
/// - Display trait: converts enum variants to lowercase strings
/// - FromStr trait: parses case-insensitive strings to enum variants
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their string
///   representations
///
/// # Features
///
/// - Case-insensitive parsing (e.g., "PENDING", "pending", "Pending" all work)
/// - Consistent lowercase string output
/// - Descriptive error messages with enum name
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
