//! Binding between configuration structs and named secret slots.
//!
//! A slot is a `String` field whose name doubles as the secret identifier.
//! Types opt in through [`BindableConfig`], usually via the [`bind_slots!`]
//! macro rather than a hand-written impl.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, SecretsError};

/// A configuration value whose string fields can be filled from a secret
/// store.
///
/// Implementations walk every slot in declaration order and hand the
/// visitor the field name together with a mutable reference to the field.
/// The same visitor drives both name collection and write-back, so an
/// impl must visit a stable set of slots each time it is called.
pub trait BindableConfig {
    fn visit_slots(&mut self, visit: &mut dyn FnMut(&'static str, &mut String));
}

/// Generates a [`BindableConfig`] impl for a struct with named `String`
/// fields.
///
/// ```
/// use secretbind::{bind_slots, BindableConfig};
///
/// #[derive(Default)]
/// struct AppConfig {
///     database_url: String,
///     api_key: String,
/// }
///
/// bind_slots!(AppConfig { database_url, api_key });
///
/// let mut config = AppConfig::default();
/// let mut names = Vec::new();
/// config.visit_slots(&mut |name, _| names.push(name));
/// assert_eq!(names, ["database_url", "api_key"]);
/// ```
#[macro_export]
macro_rules! bind_slots {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::binder::BindableConfig for $ty {
            fn visit_slots(
                &mut self,
                visit: &mut dyn FnMut(&'static str, &mut ::std::string::String),
            ) {
                $(visit(stringify!($field), &mut self.$field);)+
            }
        }
    };
}

/// Collects the slot names of a config, rejecting duplicates.
pub(crate) fn slot_names(config: &mut dyn BindableConfig) -> Result<Vec<String>> {
    let mut names = Vec::new();
    config.visit_slots(&mut |name, _| names.push(name.to_string()));

    let mut seen = HashSet::new();
    for name in &names {
        if !seen.insert(name.as_str()) {
            return Err(SecretsError::precondition(format!(
                "duplicate slot name: {}",
                name
            )));
        }
    }
    Ok(names)
}

/// Writes resolved values into their slots. Slots without a resolved
/// value keep whatever they held before.
pub(crate) fn write_back(config: &mut dyn BindableConfig, values: &HashMap<String, String>) {
    config.visit_slots(&mut |name, slot| {
        if let Some(value) = values.get(name) {
            *slot = value.clone();
        }
    });
}
