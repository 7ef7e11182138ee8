//! Synonym groups and abbreviation expansions used by header matching.
//!
//! The built-in tables are process-wide, read-only data exposed through
//! [`Lexicon::builtin`]. Callers that need extra vocabulary (for example from
//! a settings file) build an owned copy with [`Lexicon::extended`]; the
//! built-in instance is never mutated, so a `&Lexicon` can be shared freely
//! between concurrent mapping jobs.

use std::{
    collections::{BTreeMap, HashMap},
    sync::LazyLock,
};

const BUILTIN_SYNONYMS: &[(&str, &[&str])] = &[
    (
        "email",
        &[
            "email",
            "e-mail",
            "mail",
            "email address",
            "emailaddress",
            "electronic mail",
            "e mail",
        ],
    ),
    (
        "phone",
        &[
            "phone",
            "telephone",
            "mobile",
            "cell",
            "contact number",
            "phone number",
            "phonenumber",
            "tel",
            "contact",
            "phone no",
        ],
    ),
    (
        "name",
        &[
            "name",
            "full name",
            "fullname",
            "customer name",
            "person name",
            "client name",
        ],
    ),
    (
        "first_name",
        &["first name", "firstname", "given name", "fname", "first"],
    ),
    (
        "last_name",
        &["last name", "lastname", "surname", "family name", "lname", "last"],
    ),
    (
        "address",
        &[
            "address",
            "street address",
            "streetaddress",
            "location",
            "addr",
            "street",
            "address line",
        ],
    ),
    ("city", &["city", "town", "municipality"]),
    ("state", &["state", "province", "region"]),
    (
        "zip",
        &[
            "zip",
            "zipcode",
            "postal code",
            "postalcode",
            "postcode",
            "zip code",
            "postal",
        ],
    ),
    ("country", &["country", "nation"]),
    ("date", &["date", "dt", "timestamp", "time", "datetime"]),
    (
        "id",
        &[
            "id",
            "identifier",
            "uid",
            "unique id",
            "record id",
            "customer id",
            "user id",
        ],
    ),
    (
        "amount",
        &["amount", "total", "sum", "value", "price", "cost", "amt"],
    ),
    ("quantity", &["quantity", "qty", "count", "number", "num"]),
    (
        "description",
        &["description", "desc", "details", "notes", "comments"],
    ),
    ("status", &["status", "state", "condition"]),
    (
        "company",
        &[
            "company",
            "organization",
            "org",
            "business",
            "company name",
            "companyname",
        ],
    ),
    ("title", &["title", "job title", "jobtitle", "position", "role"]),
    ("department", &["department", "dept", "division"]),
    ("salary", &["salary", "wage", "pay", "compensation"]),
    ("age", &["age", "years old", "yrs"]),
    ("gender", &["gender", "sex"]),
    ("website", &["website", "url", "web", "site"]),
];

const BUILTIN_ABBREVIATIONS: &[(&str, &str)] = &[
    ("addr", "address"),
    ("qty", "quantity"),
    ("desc", "description"),
    ("num", "number"),
    ("amt", "amount"),
    ("dt", "date"),
    ("tel", "telephone"),
    ("mob", "mobile"),
    ("fname", "first name"),
    ("lname", "last name"),
    ("dob", "date of birth"),
    ("ssn", "social security number"),
    ("ein", "employer identification number"),
    ("org", "organization"),
    ("dept", "department"),
    ("mgr", "manager"),
    ("emp", "employee"),
    ("cust", "customer"),
    ("prod", "product"),
    ("cat", "category"),
    ("ref", "reference"),
    ("no", "number"),
    ("st", "street"),
    ("ave", "avenue"),
    ("blvd", "boulevard"),
    ("dr", "drive"),
    ("ln", "lane"),
    ("rd", "road"),
    ("ct", "court"),
    ("pl", "place"),
];

static BUILTIN: LazyLock<Lexicon> = LazyLock::new(|| {
    let abbreviations = BUILTIN_ABBREVIATIONS
        .iter()
        .map(|(short, long)| (short.to_string(), long.to_string()))
        .collect();
    let synonyms = BUILTIN_SYNONYMS
        .iter()
        .map(|(name, variants)| SynonymGroup {
            name: name.to_string(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
        })
        .collect();
    Lexicon {
        synonyms,
        abbreviations,
    }
});

/// A named category of interchangeable header phrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymGroup {
    pub name: String,
    pub variants: Vec<String>,
}

impl SynonymGroup {
    pub fn contains(&self, phrase: &str) -> bool {
        self.variants.iter().any(|variant| variant == phrase)
    }
}

#[derive(Debug, Clone)]
pub struct Lexicon {
    synonyms: Vec<SynonymGroup>,
    abbreviations: HashMap<String, String>,
}

impl Lexicon {
    pub fn builtin() -> &'static Lexicon {
        &BUILTIN
    }

    /// Returns a copy of the built-in lexicon with extra vocabulary merged in.
    ///
    /// Extra abbreviations are added first so that extra synonym variants are
    /// normalized with the complete table. Variants for an existing group name
    /// are appended to that group; unknown names create new groups.
    pub fn extended(
        extra_synonyms: &BTreeMap<String, Vec<String>>,
        extra_abbreviations: &BTreeMap<String, String>,
    ) -> Lexicon {
        let mut lexicon = Lexicon::builtin().clone();
        for (short, long) in extra_abbreviations {
            let key = short.trim().to_ascii_lowercase();
            if key.is_empty() {
                continue;
            }
            lexicon
                .abbreviations
                .insert(key, long.trim().to_ascii_lowercase());
        }
        for (name, variants) in extra_synonyms {
            let normalized = variants
                .iter()
                .map(|variant| crate::normalize::normalize_header_with(variant, &lexicon))
                .filter(|variant| !variant.is_empty())
                .collect::<Vec<_>>();
            match lexicon.synonyms.iter_mut().find(|g| &g.name == name) {
                Some(group) => {
                    for variant in normalized {
                        if !group.contains(&variant) {
                            group.variants.push(variant);
                        }
                    }
                }
                None => lexicon.synonyms.push(SynonymGroup {
                    name: name.clone(),
                    variants: normalized,
                }),
            }
        }
        lexicon
    }

    pub fn expand(&self, word: &str) -> Option<&str> {
        self.abbreviations.get(word).map(String::as_str)
    }

    pub fn groups(&self) -> &[SynonymGroup] {
        &self.synonyms
    }

    /// Name of the first group listing both phrases verbatim.
    pub fn shared_group(&self, left: &str, right: &str) -> Option<&str> {
        self.synonyms
            .iter()
            .find(|group| group.contains(left) && group.contains(right))
            .map(|group| group.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansions_never_contain_abbreviation_keys() {
        let lexicon = Lexicon::builtin();
        for (_, long) in BUILTIN_ABBREVIATIONS {
            for word in long.split_whitespace() {
                assert!(
                    lexicon.expand(word).is_none(),
                    "expansion word '{word}' is itself abbreviated"
                );
            }
        }
    }

    #[test]
    fn shared_group_requires_both_phrases() {
        let lexicon = Lexicon::builtin();
        assert_eq!(lexicon.shared_group("zip code", "postalcode"), Some("zip"));
        assert_eq!(lexicon.shared_group("email", "phone"), None);
    }

    #[test]
    fn extended_merges_without_touching_builtin() {
        let mut synonyms = BTreeMap::new();
        synonyms.insert("zip".to_string(), vec!["PLZ".to_string()]);
        synonyms.insert("sku".to_string(), vec!["sku".to_string(), "item code".to_string()]);
        let mut abbreviations = BTreeMap::new();
        abbreviations.insert("itm".to_string(), "item".to_string());

        let lexicon = Lexicon::extended(&synonyms, &abbreviations);

        assert_eq!(lexicon.shared_group("plz", "zip"), Some("zip"));
        assert_eq!(lexicon.shared_group("sku", "item code"), Some("sku"));
        assert_eq!(lexicon.expand("itm"), Some("item"));
        assert_eq!(Lexicon::builtin().shared_group("plz", "zip"), None);
        assert_eq!(Lexicon::builtin().expand("itm"), None);
    }
}
