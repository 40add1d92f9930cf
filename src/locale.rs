//! Locale identifiers with collation keywords.
//!
//! Both BCP 47 extensions (`de-DE-u-co-phonebk-ks-level1`) and the ICU
//! keyword form (`de_DE@collation=phonebook`) are accepted. Keywords apply
//! to a collator as settings; `co` selects the tailoring.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::collator::{Reorderable, RuleBasedCollator};
use crate::error::{CollationError, Result};
use crate::reorder::ReorderCode;
use crate::{CaseFirst, MaxVariable, Strength};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LocaleId {
    pub language: String,
    pub script: Option<String>,
    pub region: Option<String>,
    /// Lowercased Unicode extension keys and values, `co` included.
    pub keywords: BTreeMap<String, String>,
}

impl LocaleId {
    pub fn root() -> LocaleId {
        LocaleId {
            language: "root".to_string(),
            script: None,
            region: None,
            keywords: BTreeMap::new(),
        }
    }

    pub fn parse(id: &str) -> Result<LocaleId> {
        let (tag, icu_keywords) = match id.split_once('@') {
            Some((tag, keywords)) => (tag, Some(keywords)),
            None => (id, None),
        };
        if tag.is_empty() {
            let mut locale = LocaleId::root();
            if let Some(keywords) = icu_keywords {
                locale.parse_icu_keywords(keywords)?;
            }
            return Ok(locale);
        }

        let re = regex!(
            r"^(?i)([a-z]{2,3}|root)(?:[-_]([a-z]{4}))?(?:[-_]([a-z]{2}|[0-9]{3}))?((?:[-_][a-z0-9]{5,8})*)((?:[-_]u(?:[-_][a-z0-9]{2,8})+)?)$"
        );
        let caps = re
            .captures(tag)
            .ok_or_else(|| CollationError::invalid(format!("malformed locale id {:?}", id)))?;

        let mut locale = LocaleId {
            language: caps[1].to_ascii_lowercase(),
            script: caps.get(2).map(|m| title_case(m.as_str())),
            region: caps.get(3).map(|m| m.as_str().to_ascii_uppercase()),
            keywords: BTreeMap::new(),
        };
        if let Some(extension) = caps.get(5).filter(|m| !m.as_str().is_empty()) {
            locale.parse_extension(&extension.as_str()[2..]);
        }
        if let Some(keywords) = icu_keywords {
            locale.parse_icu_keywords(keywords)?;
        }
        Ok(locale)
    }

    /// Reads `-k1-v1-v2-k2-...` subtags. A key without a value means `true`.
    fn parse_extension(&mut self, subtags: &str) {
        let mut key: Option<String> = None;
        let mut values: Vec<String> = Vec::new();
        for subtag in subtags.split(['-', '_']).filter(|s| !s.is_empty()) {
            let subtag = subtag.to_ascii_lowercase();
            if subtag.len() == 2 {
                if let Some(key) = key.take() {
                    self.insert_keyword(key, &values);
                }
                key = Some(subtag);
                values.clear();
            } else {
                values.push(subtag);
            }
        }
        if let Some(key) = key {
            self.insert_keyword(key, &values);
        }
    }

    fn insert_keyword(&mut self, key: String, values: &[String]) {
        let value = if values.is_empty() {
            "true".to_string()
        } else {
            values.join("-")
        };
        self.keywords.entry(key).or_insert(value);
    }

    fn parse_icu_keywords(&mut self, keywords: &str) -> Result<()> {
        for pair in keywords.split(';').filter(|p| !p.trim().is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(CollationError::invalid(format!("malformed keyword {:?}", pair)));
            };
            let value = value.trim().to_ascii_lowercase();
            match key.trim().to_ascii_lowercase().as_str() {
                "collation" => {
                    let value = match value.as_str() {
                        "phonebook" => "phonebk".to_string(),
                        "traditional" => "trad".to_string(),
                        _ => value,
                    };
                    self.keywords.insert("co".to_string(), value);
                }
                "colstrength" => {
                    let value = match value.as_str() {
                        "primary" => "level1",
                        "secondary" => "level2",
                        "tertiary" => "level3",
                        "quaternary" => "level4",
                        "identical" => "identic",
                        other => other,
                    };
                    self.keywords.insert("ks".to_string(), value.to_string());
                }
                "colnumeric" => {
                    let value = if value == "yes" { "true".to_string() } else { value };
                    self.keywords.insert("kn".to_string(), value);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// `language[_Script][_REGION]`, the key locale data is stored under.
    pub fn base_name(&self) -> String {
        let mut name = self.language.clone();
        for part in [&self.script, &self.region].into_iter().flatten() {
            name.push('_');
            name.push_str(part);
        }
        name
    }

    /// Base names from most to least specific, ending with `root`.
    pub fn fallback_chain(&self) -> Vec<String> {
        let mut chain = vec![self.base_name()];
        if self.language != "root" {
            if let (Some(script), Some(_)) = (&self.script, &self.region) {
                chain.push(format!("{}_{}", self.language, script));
            }
            if self.script.is_some() || self.region.is_some() {
                chain.push(self.language.clone());
            }
            chain.push("root".to_string());
        }
        chain
    }

    /// The requested collation type, if any.
    pub fn collation_type(&self) -> Option<&str> {
        self.keywords.get("co").map(String::as_str)
    }

    /// Applies every settings keyword to `collator`.
    pub fn apply_keywords(&self, collator: &mut RuleBasedCollator) -> Result<()> {
        for (key, value) in &self.keywords {
            let unsupported =
                || CollationError::UnsupportedAttribute(format!("-u-{}-{}", key, value));
            match key.as_str() {
                "ks" => collator.set_strength(match value.as_str() {
                    "level1" => Strength::Primary,
                    "level2" => Strength::Secondary,
                    "level3" => Strength::Tertiary,
                    "level4" => Strength::Quaternary,
                    "identic" => Strength::Identical,
                    _ => return Err(unsupported()),
                })?,
                "kn" => collator.set_numeric_collation(parse_bool(value).ok_or_else(unsupported)?)?,
                "kc" => collator.set_case_level(parse_bool(value).ok_or_else(unsupported)?)?,
                "kb" => collator.set_french_collation(parse_bool(value).ok_or_else(unsupported)?)?,
                "kf" => collator.set_case_first(match value.as_str() {
                    "upper" => CaseFirst::UpperFirst,
                    "lower" => CaseFirst::LowerFirst,
                    "false" => CaseFirst::Off,
                    _ => return Err(unsupported()),
                })?,
                "ka" => collator.set_alternate_handling_shifted(match value.as_str() {
                    "shifted" => true,
                    "noignore" => false,
                    _ => return Err(unsupported()),
                })?,
                "kv" => collator
                    .set_max_variable(MaxVariable::from_name(value).ok_or_else(unsupported)?)?,
                "kr" => {
                    let codes = value
                        .split('-')
                        .map(|name| ReorderCode::parse(name).ok_or_else(unsupported))
                        .collect::<Result<Vec<_>>>()?;
                    collator.set_reorder_codes(&codes)?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

fn title_case(s: &str) -> String {
    let mut out = s.to_ascii_lowercase();
    if let Some(first) = out.get_mut(..1) {
        first.make_ascii_uppercase();
    }
    out
}

impl FromStr for LocaleId {
    type Err = CollationError;

    fn from_str(s: &str) -> Result<Self> {
        LocaleId::parse(s)
    }
}

impl fmt::Display for LocaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_name().replace('_', "-"))?;
        if !self.keywords.is_empty() {
            write!(f, "-u")?;
            for (key, value) in &self.keywords {
                write!(f, "-{}-{}", key, value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collator::Collator;

    #[test]
    fn base_names_and_fallback() {
        let locale = LocaleId::parse("zh-hant-tw").unwrap();
        assert_eq!(locale.base_name(), "zh_Hant_TW");
        assert_eq!(locale.fallback_chain(), ["zh_Hant_TW", "zh_Hant", "zh", "root"]);
        assert_eq!(LocaleId::parse("de_DE").unwrap().fallback_chain(), ["de_DE", "de", "root"]);
        assert_eq!(LocaleId::parse("root").unwrap().fallback_chain(), ["root"]);
        assert!(LocaleId::parse("not a locale").is_err());
    }

    #[test]
    fn extension_keywords() {
        let locale: LocaleId = "de-DE-u-co-phonebk-ks-level1-kn".parse().unwrap();
        assert_eq!(locale.collation_type(), Some("phonebk"));
        assert_eq!(locale.keywords["ks"], "level1");
        assert_eq!(locale.keywords["kn"], "true");
        assert_eq!(locale.to_string(), "de-DE-u-co-phonebk-kn-true-ks-level1");

        let locale = LocaleId::parse("en-u-kr-grek-latn").unwrap();
        assert_eq!(locale.keywords["kr"], "grek-latn");
    }

    #[test]
    fn icu_keywords() {
        let locale = LocaleId::parse("es@collation=traditional").unwrap();
        assert_eq!(locale.base_name(), "es");
        assert_eq!(locale.collation_type(), Some("trad"));
        let locale = LocaleId::parse("@collation=phonebook;colStrength=primary").unwrap();
        assert_eq!(locale.base_name(), "root");
        assert_eq!(locale.keywords["ks"], "level1");
    }

    #[test]
    fn keywords_become_settings() {
        let mut collator = RuleBasedCollator::root();
        LocaleId::parse("en-u-ks-level2-kf-upper-ka-shifted")
            .unwrap()
            .apply_keywords(&mut collator)
            .unwrap();
        assert_eq!(collator.strength(), Strength::Secondary);
        assert_eq!(collator.case_first(), CaseFirst::UpperFirst);
        assert!(collator.is_alternate_handling_shifted());
        assert!(collator.equals("a", "A"));

        let mut collator = RuleBasedCollator::root();
        let bad = LocaleId::parse("en-u-ks-level9").unwrap();
        assert!(matches!(
            bad.apply_keywords(&mut collator),
            Err(CollationError::UnsupportedAttribute(_))
        ));
    }
}
