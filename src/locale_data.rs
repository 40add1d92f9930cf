//! Tailoring rules and exemplar characters per locale.

use crate::rules::Importer;

/// Source of locale-specific collation data.
pub trait LocaleData: Send + Sync {
    /// Rule text for `locale` (a base name such as `zh_Hant`) and collation
    /// type (`standard`, `phonebk`, ...).
    fn tailoring_rules(&self, locale: &str, collation_type: &str) -> Option<&str>;

    /// The type used when the locale id names none.
    fn default_collation_type(&self, _locale: &str) -> &str {
        "standard"
    }

    /// Every locale base name with data.
    fn locales(&self) -> Vec<&str>;

    /// Labels for an alphabetic index, if the locale defines them.
    fn index_exemplars(&self, locale: &str) -> Option<Vec<String>>;

    /// The characters of the locale's main alphabet.
    fn standard_exemplars(&self, locale: &str) -> Option<Vec<String>>;
}

/// Resolves `[import]` through a [`LocaleData`], falling back along the
/// locale's parents.
pub struct LocaleImporter<'a>(pub &'a dyn LocaleData);

impl Importer for LocaleImporter<'_> {
    fn import_rules(&self, locale: &str, collation_type: &str) -> Option<String> {
        let locale = crate::locale::LocaleId::parse(locale).ok()?;
        let collation_type = match collation_type {
            "standard" => self.0.default_collation_type(&locale.base_name()).to_string(),
            other => other.to_string(),
        };
        locale
            .fallback_chain()
            .iter()
            .find_map(|name| self.0.tailoring_rules(name, &collation_type))
            .map(str::to_owned)
    }
}

struct Entry {
    locale: &'static str,
    collation_type: &'static str,
    rules: &'static str,
}

const RULES: &[Entry] = &[
    Entry {
        locale: "root",
        collation_type: "standard",
        rules: "",
    },
    Entry {
        locale: "en",
        collation_type: "standard",
        rules: "",
    },
    Entry {
        locale: "de",
        collation_type: "standard",
        rules: "",
    },
    Entry {
        locale: "de",
        collation_type: "phonebk",
        rules: "&ae<<\u{E4}<<<\u{C4}&oe<<\u{F6}<<<\u{D6}&ue<<\u{FC}<<<\u{DC}",
    },
    Entry {
        locale: "sv",
        collation_type: "standard",
        rules: "&d<<\u{111}<<<\u{110}<<\u{F0}<<<\u{D0}\
                &t<<<\u{FE}/h\
                &y<<\u{FC}<<<\u{DC}\
                &z<\u{E5}<<<\u{C5}<\u{E4}<<<\u{C4}<<\u{E6}<<<\u{C6}<\u{F6}<<<\u{D6}<<\u{F8}<<<\u{D8}",
    },
    Entry {
        locale: "da",
        collation_type: "standard",
        rules: "[caseFirst upper]\
                &d<<\u{111}<<<\u{110}<<\u{F0}<<<\u{D0}\
                &t<<<\u{FE}/h\
                &y<<\u{FC}<<<\u{DC}\
                &z<\u{E6}<<<\u{C6}<<\u{E4}<<<\u{C4}<\u{F8}<<<\u{D8}<<\u{F6}<<<\u{D6}<\u{E5}<<<\u{C5}<<<aa<<<Aa<<<AA",
    },
    Entry {
        locale: "es",
        collation_type: "standard",
        rules: "&n<\u{F1}<<<\u{D1}",
    },
    Entry {
        locale: "es",
        collation_type: "trad",
        rules: "&n<\u{F1}<<<\u{D1}&c<ch<<<Ch<<<CH&l<ll<<<Ll<<<LL",
    },
    Entry {
        locale: "fr_CA",
        collation_type: "standard",
        rules: "[backwards 2]",
    },
    Entry {
        locale: "cs",
        collation_type: "standard",
        rules: "&c<\u{10D}<<<\u{10C}&h<ch<<<cH<<<Ch<<<CH&r<\u{159}<<<\u{158}&s<\u{161}<<<\u{160}&z<\u{17E}<<<\u{17D}",
    },
    Entry {
        locale: "ru",
        collation_type: "standard",
        rules: "[reorder Cyrl]",
    },
    Entry {
        locale: "el",
        collation_type: "standard",
        rules: "[normalization on][reorder Grek]",
    },
    Entry {
        locale: "ja",
        collation_type: "standard",
        rules: "[normalization on][reorder Kana Hani]",
    },
    Entry {
        locale: "ko",
        collation_type: "standard",
        rules: "[reorder Hang Hani]",
    },
    Entry {
        locale: "zh",
        collation_type: "pinyin",
        rules: "[normalization on]\
                &[last regular]\
                <\u{FDD0}A<*\u{963F}\u{554A}\u{7231}\u{5B89}\
                <\u{FDD0}B<*\u{516B}\u{628A}\u{767D}\u{5317}\
                <\u{FDD0}C<*\u{624D}\u{8349}\u{8336}\u{957F}\
                <\u{FDD0}D<*\u{5927}\u{7684}\u{7B2C}\u{4E1C}\u{6E21}\
                <\u{FDD0}E<*\u{997F}\u{800C}\u{4E8C}\
                <\u{FDD0}F<*\u{53D1}\u{996D}\u{98DE}\u{98CE}\
                <\u{FDD0}G<*\u{4E2A}\u{9AD8}\u{5DE5}\u{56FD}\
                <\u{FDD0}H<*\u{548C}\u{597D}\u{7EA2}\u{706B}\
                <\u{FDD0}J<*\u{5BB6}\u{89C1}\u{4ECA}\u{4E5D}\
                <\u{FDD0}K<*\u{5F00}\u{770B}\u{53E3}\u{5757}\
                <\u{FDD0}L<*\u{6765}\u{8001}\u{91CC}\u{516D}\
                <\u{FDD0}M<*\u{5417}\u{4E70}\u{6BDB}\u{4EEC}\
                <\u{FDD0}N<*\u{90A3}\u{5E74}\u{4F60}\u{5973}\
                <\u{FDD0}O<*\u{54E6}\u{5076}\
                <\u{FDD0}P<*\u{6015}\u{670B}\u{7247}\
                <\u{FDD0}Q<*\u{4E03}\u{94B1}\u{53BB}\u{5168}\
                <\u{FDD0}R<*\u{7136}\u{4EBA}\u{65E5}\u{8089}\
                <\u{FDD0}S<*\u{4E09}\u{4E0A}\u{5341}\u{6C34}\
                <\u{FDD0}T<*\u{4ED6}\u{5929}\u{542C}\u{5934}\
                <\u{FDD0}W<*\u{5916}\u{738B}\u{6211}\u{4E94}\
                <\u{FDD0}X<*\u{897F}\u{4E0B}\u{5C0F}\u{5B66}\
                <\u{FDD0}Y<*\u{4E00}\u{8981}\u{6709}\u{6708}\
                <\u{FDD0}Z<*\u{5728}\u{8FD9}\u{4E2D}\u{5B50}",
    },
    Entry {
        locale: "zh_Hant",
        collation_type: "stroke",
        rules: "[normalization on]\
                &[last regular]\
                <\u{FDD0}\u{2801}<*\u{4E00}\u{4E59}\
                <\u{FDD0}\u{2802}<*\u{4E8C}\u{4EBA}\u{5165}\u{516B}\u{5341}\
                <\u{FDD0}\u{2803}<*\u{4E09}\u{4E0A}\u{4E0B}\u{5927}\u{5C0F}\u{5C71}\
                <\u{FDD0}\u{2804}<*\u{4E2D}\u{4E94}\u{5929}\u{65E5}\u{6708}\u{6C34}\
                <\u{FDD0}\u{2805}<*\u{53F0}\u{5317}\u{5E73}\u{767D}\
                <\u{FDD0}\u{2806}<*\u{540D}\u{6709}\u{5728}\u{5E74}\
                <\u{FDD0}\u{2807}<*\u{6211}\u{4F60}\u{5B8C}\
                <\u{FDD0}\u{2808}<*\u{6771}\u{9577}\u{91D1}\
                <\u{FDD0}\u{2809}<*\u{5357}\u{98A8}\u{98DB}\
                <\u{FDD0}\u{280A}<*\u{9AD8}\u{99AC}\u{6642}\
                <\u{FDD0}\u{280B}<*\u{570B}\u{73FE}\
                <\u{FDD0}\u{280C}<*\u{6E21}\u{9EC3}\u{958B}",
    },
];

const DEFAULT_TYPES: &[(&str, &str)] = &[("zh", "pinyin"), ("zh_Hant", "stroke")];

const INDEX_EXEMPLARS: &[(&str, &str)] = &[
    ("de", "A B C D E F G H I J K L M N O P Q R S T U V W X Y Z"),
    ("sv", "A B C D E F G H I J K L M N O P Q R S T U V W X Y Z \u{C5} \u{C4} \u{D6}"),
    ("da", "A B C D E F G H I J K L M N O P Q R S T U V W X Y Z \u{C6} \u{D8} \u{C5}"),
    ("es", "A B C D E F G H I J K L M N \u{D1} O P Q R S T U V W X Y Z"),
    ("cs", "A B C \u{10C} D E F G H CH I J K L M N O P Q R \u{158} S \u{160} T U V W X Y Z \u{17D}"),
    ("ru", "\u{410} \u{411} \u{412} \u{413} \u{414} \u{415} \u{416} \u{417} \u{418} \u{419} \u{41A} \u{41B} \u{41C} \u{41D} \u{41E} \u{41F} \u{420} \u{421} \u{422} \u{423} \u{424} \u{425} \u{426} \u{427} \u{428} \u{429} \u{42B} \u{42D} \u{42E} \u{42F}"),
    ("el", "\u{391} \u{392} \u{393} \u{394} \u{395} \u{396} \u{397} \u{398} \u{399} \u{39A} \u{39B} \u{39C} \u{39D} \u{39E} \u{39F} \u{3A0} \u{3A1} \u{3A3} \u{3A4} \u{3A5} \u{3A6} \u{3A7} \u{3A8} \u{3A9}"),
    ("ja", "\u{3042} \u{304B} \u{3055} \u{305F} \u{306A} \u{306F} \u{307E} \u{3084} \u{3089} \u{308F}"),
];

const STANDARD_EXEMPLARS: &[(&str, &str)] = &[
    ("en", "a b c d e f g h i j k l m n o p q r s t u v w x y z"),
    ("de", "a \u{E4} b c d e f g h i j k l m n o \u{F6} p q r s \u{DF} t u \u{FC} v w x y z"),
    ("fr_CA", "a \u{E0} \u{E2} \u{E6} b c \u{E7} d e \u{E9} \u{E8} \u{EA} \u{EB} f g h i \u{EE} \u{EF} j k l m n o \u{F4} \u{153} p q r s t u \u{F9} \u{FB} \u{FC} v w x y \u{FF} z"),
    ("ko", "\u{AC00} \u{AC01} \u{B098} \u{B2E4} \u{B77C} \u{B9C8} \u{BC14} \u{C0AC} \u{C544} \u{C790} \u{CC28} \u{CE74} \u{D0C0} \u{D30C} \u{D558} \u{D55C}"),
    ("ru", "\u{430} \u{431} \u{432} \u{433} \u{434} \u{435} \u{451} \u{436} \u{437} \u{438} \u{439} \u{43A} \u{43B} \u{43C} \u{43D} \u{43E} \u{43F} \u{440} \u{441} \u{442} \u{443} \u{444} \u{445} \u{446} \u{447} \u{448} \u{449} \u{44A} \u{44B} \u{44C} \u{44D} \u{44E} \u{44F}"),
];

fn split_exemplars(table: &[(&str, &'static str)], locale: &str) -> Option<Vec<String>> {
    table
        .iter()
        .find(|(name, _)| *name == locale)
        .map(|(_, chars)| chars.split(' ').map(str::to_owned).collect())
}

/// A small built-in data set.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinLocaleData;

impl LocaleData for BuiltinLocaleData {
    fn tailoring_rules(&self, locale: &str, collation_type: &str) -> Option<&str> {
        RULES
            .iter()
            .find(|e| e.locale == locale && e.collation_type == collation_type)
            .map(|e| e.rules)
    }

    fn default_collation_type(&self, locale: &str) -> &str {
        // Most specific entries come last
        DEFAULT_TYPES
            .iter()
            .rev()
            .find(|(name, _)| *name == locale || locale.starts_with(&format!("{}_", name)))
            .map_or("standard", |&(_, collation_type)| collation_type)
    }

    fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = RULES.iter().map(|e| e.locale).collect();
        locales.dedup();
        locales
    }

    fn index_exemplars(&self, locale: &str) -> Option<Vec<String>> {
        split_exemplars(INDEX_EXEMPLARS, locale)
    }

    fn standard_exemplars(&self, locale: &str) -> Option<Vec<String>> {
        split_exemplars(STANDARD_EXEMPLARS, locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::parse_rules;

    #[test]
    fn every_rule_string_parses() {
        let importer = LocaleImporter(&BuiltinLocaleData);
        for entry in RULES {
            if let Err(error) = parse_rules(entry.rules, &importer) {
                panic!("{}/{}: {}", entry.locale, entry.collation_type, error);
            }
        }
    }

    #[test]
    fn default_types() {
        let data = BuiltinLocaleData;
        assert_eq!(data.default_collation_type("zh"), "pinyin");
        assert_eq!(data.default_collation_type("zh_Hant_TW"), "stroke");
        assert_eq!(data.default_collation_type("de"), "standard");
        assert!(data.locales().contains(&"fr_CA"));
    }

    #[test]
    fn imports_follow_parents() {
        let importer = LocaleImporter(&BuiltinLocaleData);
        assert!(importer.import_rules("de", "phonebk").is_some());
        assert!(importer.import_rules("de-AT", "phonebk").is_some());
        let pinyin = RULES.iter().find(|e| e.locale == "zh").map(|e| e.rules);
        assert_eq!(importer.import_rules("zh", "standard").as_deref(), pinyin);
        assert!(importer.import_rules("de", "bogus").is_none());
    }
}
