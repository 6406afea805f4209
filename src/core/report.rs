use crate::domain::aggregation::AggregationEntry;
use crate::domain::model::{ContractDetail, ReportRow};
use crate::utils::error::{EtlError, Result};
use crate::utils::parse::{format_date, parse_date, parse_price};
use crate::utils::text::normalize;
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap, HashSet};

pub const HEADERS: [&str; 11] = [
    "Distrito",
    "Município",
    "Palavra-Chave Encontrada",
    "Objeto do Contrato",
    "Entidade Contratante",
    "Adjudicatário",
    "Valor (€)",
    "Data do Contrato",
    "Publicação",
    "Link",
    "ID Contrato",
];

pub const KEYWORD_SEPARATOR: &str = ", ";
const DELIMITER: u8 = b';';
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One spelling per normalized keyword: the first one configured.
#[derive(Debug, Clone, Default)]
pub struct KeywordCanon {
    canonical: HashMap<String, String>,
}

impl KeywordCanon {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut canonical = HashMap::new();
        for keyword in keywords {
            let keyword = keyword.as_ref();
            canonical
                .entry(normalize(keyword))
                .or_insert_with(|| keyword.to_string());
        }
        Self { canonical }
    }

    /// Deduplicates by normalized form, sorts, and joins.
    pub fn render<'a, I>(&self, keywords: I) -> String
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut by_form: HashMap<String, &str> = HashMap::new();
        for keyword in keywords {
            let form = normalize(keyword);
            let spelling = self
                .canonical
                .get(&form)
                .map(String::as_str)
                .unwrap_or(keyword.as_str());
            by_form
                .entry(form)
                .and_modify(|current| {
                    if spelling < *current {
                        *current = spelling;
                    }
                })
                .or_insert(spelling);
        }

        let rendered: BTreeSet<&str> = by_form.into_values().collect();
        rendered.into_iter().collect::<Vec<_>>().join(KEYWORD_SEPARATOR)
    }
}

pub struct ReportBuilder {
    keywords: KeywordCanon,
    detail_page_url: String,
}

impl ReportBuilder {
    pub fn new(keywords: KeywordCanon, detail_page_url: &str) -> Self {
        Self {
            keywords,
            detail_page_url: detail_page_url.to_string(),
        }
    }

    pub fn build_row(
        &self,
        detail: &ContractDetail,
        district: &str,
        entry: &AggregationEntry,
    ) -> ReportRow {
        ReportRow {
            district: district.to_string(),
            municipality: detail.execution_place.clone(),
            matched_keywords: self.keywords.render(&entry.keywords),
            object_description: detail.description.clone(),
            contracting_entity: detail.contracting_entity_name().to_string(),
            contracted_entity: detail.contracted_entity_name().to_string(),
            value: parse_price(&detail.initial_contractual_price),
            contract_date: format_date(&detail.signing_date),
            publication_date: format_date(&detail.publication_date),
            detail_link: self.detail_page_url.replace("{id}", &entry.id),
            contract_id: entry.id.clone(),
        }
    }
}

/// Keeps the first row for every contract id. Idempotent.
pub fn dedup_by_id(rows: Vec<ReportRow>) -> Vec<ReportRow> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.contract_id.clone()))
        .collect()
}

/// Newest publication first; rows without a parseable date go last and keep
/// their relative order.
pub fn sort_by_publication_desc(rows: &mut [ReportRow]) {
    rows.sort_by_key(|row| Reverse(parse_date(&row.publication_date)));
}

impl ReportRow {
    pub fn to_record(&self) -> [String; 11] {
        [
            self.district.clone(),
            self.municipality.clone(),
            self.matched_keywords.clone(),
            self.object_description.clone(),
            self.contracting_entity.clone(),
            self.contracted_entity.clone(),
            self.value
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_default(),
            self.contract_date.clone(),
            self.publication_date.clone(),
            self.detail_link.clone(),
            self.contract_id.clone(),
        ]
    }
}

/// Semicolon-separated report with a UTF-8 byte-order mark.
pub fn to_csv_bytes(rows: &[ReportRow]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_writer(UTF8_BOM.to_vec());

    writer.write_record(HEADERS)?;
    for row in rows {
        writer.write_record(row.to_record())?;
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}
