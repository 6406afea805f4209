use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer};

/// One page request against the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub district_id: u32,
    pub page: u32,
    pub page_size: u32,
}

impl SearchQuery {
    pub fn first_page(keyword: &str, district_id: u32, page_size: u32) -> Self {
        Self {
            keyword: keyword.to_string(),
            district_id,
            page: 0,
            page_size,
        }
    }

    pub fn next_page(&self) -> Self {
        Self {
            page: self.page + 1,
            ..self.clone()
        }
    }

    /// The portal's embedded `query` parameter.
    pub fn query_string(&self) -> String {
        format!(
            "texto={}&tipo=0&tipocontrato=0&pais=0&distrito={}&concelho=0",
            self.keyword, self.district_id
        )
    }

    pub fn form(&self, api_version: &str) -> Vec<(&'static str, String)> {
        vec![
            ("type", "search_contratos".to_string()),
            ("version", api_version.to_string()),
            ("query", self.query_string()),
            ("sort", "-publicationDate".to_string()),
            ("page", self.page.to_string()),
            ("size", self.page_size.to_string()),
        ]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractSummary {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<ContractSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Party {
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
}

/// Full contract record from the detail endpoint.
///
/// `contracting` and `contracted` arrive either as a list or as a single
/// object; both are stored as lists.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDetail {
    #[serde(skip)]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub execution_place: String,
    #[serde(default, rename = "contracting", deserialize_with = "one_or_many")]
    pub contracting_entities: Vec<Party>,
    #[serde(default, rename = "contracted", deserialize_with = "one_or_many")]
    pub contracted_entities: Vec<Party>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub initial_contractual_price: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub signing_date: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub publication_date: String,
}

impl ContractDetail {
    pub fn contracting_entity_name(&self) -> &str {
        first_description(&self.contracting_entities)
    }

    pub fn contracted_entity_name(&self) -> &str {
        first_description(&self.contracted_entities)
    }
}

fn first_description(parties: &[Party]) -> &str {
    parties
        .first()
        .map(|p| p.description.as_str())
        .unwrap_or("")
}

/// A report line. `value` is `None` when the price is absent or unparseable.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub district: String,
    pub municipality: String,
    pub matched_keywords: String,
    pub object_description: String,
    pub contracting_entity: String,
    pub contracted_entity: String,
    pub value: Option<BigDecimal>,
    pub contract_date: String,
    pub publication_date: String,
    pub detail_link: String,
    pub contract_id: String,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number identifier, got {}",
            other
        ))),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
        None => Vec::new(),
    })
}
