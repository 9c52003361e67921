use crate::channel::ErasedChannel;
use crate::runtime::ErasedValue;
use std::sync::Arc;

/// A record value managed by a context provider.
///
/// `Props` is the partial override a provider accepts: every field is
/// optional and [`merge`](Aggregate::merge) lets set fields win over the
/// record's own.
pub trait Aggregate: Clone + PartialEq + Send + Sync + 'static {
    type Props: Clone + Default + Send + Sync + 'static;

    /// Shallow merge: fields set in `props` replace the record's fields.
    fn merge(&self, props: &Self::Props) -> Self;

    /// Whether this value counts as "no value published".
    ///
    /// A simple context accessor that finds an unset value reports a
    /// missing provider, even when a provider is present.
    fn is_unset(&self) -> bool {
        false
    }
}

/// A record whose fields are published on independent channels.
pub trait AtomicAggregate: Aggregate {
    /// Field names in declaration order.
    const KEYS: &'static [&'static str];

    /// The value of a field, or `None` for an unknown name.
    fn field(&self, key: &str) -> Option<ErasedValue>;

    /// A channel for a field, defaulting to this record's value of it.
    fn channel_for(&self, key: &str, label: &str) -> Option<Arc<dyn ErasedChannel>>;
}

/// Declare a record usable with both context factories.
///
/// Generates the struct (with `Clone` and `PartialEq`), a props struct with
/// one `Option` per field, and implementations of [`Aggregate`] and
/// [`AtomicAggregate`].
///
/// # Examples
///
/// ```
/// use context_helper::{aggregate, Aggregate, AtomicAggregate};
///
/// aggregate! {
///     #[derive(Debug)]
///     pub struct Settings => SettingsProps {
///         pub theme: String,
///         pub font_size: u32,
///     }
/// }
///
/// let defaults = Settings { theme: "light".into(), font_size: 12 };
/// let merged = defaults.merge(&SettingsProps { font_size: Some(16), ..Default::default() });
///
/// assert_eq!(merged, Settings { theme: "light".into(), font_size: 16 });
/// assert_eq!(Settings::KEYS, ["theme", "font_size"]);
/// ```
#[macro_export]
macro_rules! aggregate {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident => $props:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        #[derive(Clone, Debug, Default, PartialEq)]
        $vis struct $props {
            $(
                $field_vis $field: ::core::option::Option<$ty>,
            )*
        }

        impl $crate::Aggregate for $name {
            type Props = $props;

            fn merge(&self, props: &$props) -> Self {
                Self {
                    $(
                        $field: match &props.$field {
                            ::core::option::Option::Some(value) => ::core::clone::Clone::clone(value),
                            ::core::option::Option::None => ::core::clone::Clone::clone(&self.$field),
                        },
                    )*
                }
            }
        }

        impl $crate::AtomicAggregate for $name {
            const KEYS: &'static [&'static str] = &[$(::core::stringify!($field)),*];

            fn field(&self, key: &str) -> ::core::option::Option<$crate::runtime::ErasedValue> {
                $(
                    if key == ::core::stringify!($field) {
                        return ::core::option::Option::Some(::std::sync::Arc::new(
                            ::core::clone::Clone::clone(&self.$field),
                        ));
                    }
                )*
                ::core::option::Option::None
            }

            fn channel_for(
                &self,
                key: &str,
                label: &str,
            ) -> ::core::option::Option<::std::sync::Arc<dyn $crate::ErasedChannel>> {
                $(
                    if key == ::core::stringify!($field) {
                        return ::core::option::Option::Some(::std::sync::Arc::new($crate::Channel::new(
                            label,
                            ::core::clone::Clone::clone(&self.$field),
                        )));
                    }
                )*
                ::core::option::Option::None
            }
        }
    };
}
