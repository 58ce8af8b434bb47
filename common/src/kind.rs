//! Macros for defining kind enums.

/// Macro for defining a kind enum with a fixed wire tag per variant.
///
/// # Example
///
/// ```rust
/// use common::define_kind;
///
/// define_kind! {
///     #[doc = "Shape kind."]
///     enum Kind {
///         #[doc = "A cube"]
///         Cube = "CUBE",
///
///         #[doc = "A sphere"]
///         Sphere = "SPHERE",
///     }
/// }
///
/// assert_eq!(Kind::Cube.as_str(), "CUBE");
/// assert_eq!("sphere".parse::<Kind>().unwrap(), Kind::Sphere);
/// ```
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_kind {
    (
        #[doc = $doc:literal]
        enum $name:ident {
            $(
                #[doc = $variant_doc:literal]
                $variant:ident = $tag:literal
            ),* $(,)?
        }
    ) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            $crate::private::strum::Display,
            $crate::private::strum::EnumString,
            Eq,
            PartialEq,
        )]
        #[cfg_attr(
            feature = "serde",
            derive(
                $crate::private::serde::Deserialize,
                $crate::private::serde::Serialize,
            ),
        )]
        #[doc = $doc]
        #[strum(ascii_case_insensitive)]
        pub enum $name {
            $(
                 #[doc = $variant_doc]
                 #[cfg_attr(feature = "serde", serde(rename = $tag))]
                 #[strum(serialize = $tag)]
                 $variant,
            )*
        }

        impl $name {
            /// Returns the wire tag of this kind.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(
                        Self::$variant => $tag,
                    )*
                }
            }
        }
    };
}
