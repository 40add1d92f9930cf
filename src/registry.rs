//! An application-owned table of collators by locale.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::collator::{Freezable, RuleBasedCollator};
use crate::error::{CollationError, Result};
use crate::locale::LocaleId;
use crate::locale_data::{BuiltinLocaleData, LocaleData, LocaleImporter};

/// Identifies one registration so it can be removed again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegistrationKey(u64);

struct Registration {
    key: RegistrationKey,
    locale: String,
    collator: RuleBasedCollator,
}

pub struct CollatorRegistry {
    data: Box<dyn LocaleData>,
    registered: Vec<Registration>,
    next_key: u64,
    /// Compiled tailorings by (locale, collation type).
    compiled: Mutex<HashMap<(String, String), RuleBasedCollator>>,
}

impl CollatorRegistry {
    pub fn new(data: Box<dyn LocaleData>) -> Self {
        Self {
            data,
            registered: Vec::new(),
            next_key: 0,
            compiled: Mutex::new(HashMap::new()),
        }
    }

    pub fn locale_data(&self) -> &dyn LocaleData {
        self.data.as_ref()
    }

    /// Makes `collator` the answer for `locale` and its sublocales, ahead of
    /// locale data and earlier registrations.
    pub fn register(&mut self, locale: &str, collator: RuleBasedCollator) -> Result<RegistrationKey> {
        let locale = LocaleId::parse(locale)?.base_name();
        let key = RegistrationKey(self.next_key);
        self.next_key += 1;
        debug!(locale = %locale, key = key.0, "collator registered");
        self.registered.push(Registration {
            key,
            locale,
            collator: collator.frozen(),
        });
        Ok(key)
    }

    /// Removes one registration. Returns false if `key` was not registered.
    pub fn unregister(&mut self, key: RegistrationKey) -> bool {
        let Some(index) = self.registered.iter().position(|r| r.key == key) else {
            return false;
        };
        let removed = self.registered.remove(index);
        debug!(locale = %removed.locale, key = key.0, "collator unregistered");
        true
    }

    /// A thawed collator for `locale_id`, with its keywords applied.
    pub fn collator_for(&self, locale_id: &str) -> Result<RuleBasedCollator> {
        let locale = LocaleId::parse(locale_id)?;
        let chain = locale.fallback_chain();

        let registered = chain.iter().find_map(|name| {
            self.registered
                .iter()
                .rev()
                .find(|r| &r.locale == name)
                .map(|r| r.collator.clone_as_thawed())
        });

        let mut collator = match registered {
            Some(collator) => collator,
            None => self.from_locale_data(&locale, &chain)?,
        };
        locale.apply_keywords(&mut collator)?;
        Ok(collator)
    }

    fn from_locale_data(&self, locale: &LocaleId, chain: &[String]) -> Result<RuleBasedCollator> {
        let requested = locale.collation_type();
        let collation_type = requested
            .unwrap_or_else(|| self.data.default_collation_type(&locale.base_name()))
            .to_string();

        let found = chain.iter().find_map(|name| {
            self.data
                .tailoring_rules(name, &collation_type)
                .map(|rules| (name, rules))
        });
        let Some((name, rules)) = found else {
            if requested.is_some() && collation_type != "standard" {
                return Err(CollationError::UnsupportedAttribute(format!(
                    "collation type {} for {}",
                    collation_type, locale
                )));
            }
            return Ok(RuleBasedCollator::root());
        };

        let cache_key = (name.clone(), collation_type.clone());
        let mut compiled = self.compiled.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(collator) = compiled.get(&cache_key) {
            return Ok(collator.clone_as_thawed());
        }
        let collator = RuleBasedCollator::with_importer(rules, &LocaleImporter(self.data.as_ref()))?;
        debug!(locale = %name, collation_type = %collation_type, "tailoring compiled");
        let thawed = collator.clone_as_thawed();
        compiled.insert(cache_key, collator.frozen());
        Ok(thawed)
    }

    /// Locales with data or a registration, sorted.
    pub fn available_locales(&self) -> Vec<String> {
        let mut locales: Vec<String> = self
            .data
            .locales()
            .into_iter()
            .map(str::to_owned)
            .chain(self.registered.iter().map(|r| r.locale.clone()))
            .collect();
        locales.sort();
        locales.dedup();
        locales
    }
}

impl Default for CollatorRegistry {
    fn default() -> Self {
        Self::new(Box::new(BuiltinLocaleData))
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::*;
    use crate::collator::Collator;
    use crate::Strength;

    fn sorted(collator: &RuleBasedCollator, words: &[&str]) -> Vec<String> {
        let mut words: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        words.sort_by(|a, b| collator.compare(a, b));
        words
    }

    #[test]
    fn locale_tailorings() {
        let registry = CollatorRegistry::default();
        let words = ["\u{E4}", "a", "z", "b"];
        let root = registry.collator_for("en_US").unwrap();
        assert_eq!(sorted(&root, &words), ["a", "\u{E4}", "b", "z"]);
        let swedish = registry.collator_for("sv").unwrap();
        assert_eq!(sorted(&swedish, &words), ["a", "b", "z", "\u{E4}"]);
    }

    #[test]
    fn collation_types() {
        let registry = CollatorRegistry::default();
        let phonebook = registry.collator_for("de-u-co-phonebk").unwrap();
        assert_eq!(phonebook.compare("\u{E4}z", "af"), Ordering::Less);
        let standard = registry.collator_for("de").unwrap();
        assert_eq!(standard.compare("\u{E4}z", "af"), Ordering::Greater);

        let traditional = registry.collator_for("es@collation=traditional").unwrap();
        assert_eq!(traditional.compare("cz", "ch"), Ordering::Less);

        assert!(matches!(
            registry.collator_for("en-u-co-phonebk"),
            Err(CollationError::UnsupportedAttribute(_))
        ));
    }

    #[test]
    fn fallback_and_keywords() {
        let registry = CollatorRegistry::default();
        let collator = registry.collator_for("zh_Hant_TW-u-ks-level1").unwrap();
        assert_eq!(collator.strength(), Strength::Primary);
        assert!(collator.rules().contains('\u{2801}'));
        let pinyin = registry.collator_for("zh").unwrap();
        assert!(pinyin.rules().contains("\u{FDD0}A"));
    }

    #[test]
    fn registrations_override_and_unregister() {
        let mut registry = CollatorRegistry::default();
        let custom = RuleBasedCollator::new("&a < z").unwrap();
        let key = registry.register("en", custom).unwrap();
        assert!(registry.available_locales().contains(&"en".to_string()));

        let collator = registry.collator_for("en_GB").unwrap();
        assert!(!collator.is_frozen());
        assert_eq!(collator.compare("z", "b"), Ordering::Less);

        assert!(registry.unregister(key));
        assert!(!registry.unregister(key));
        let collator = registry.collator_for("en_GB").unwrap();
        assert_eq!(collator.compare("z", "b"), Ordering::Greater);
    }
}
