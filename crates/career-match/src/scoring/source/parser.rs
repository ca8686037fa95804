use super::normalizer::{clean_name, header_key};
use super::{ElementRow, ValidationRecord};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::io::Read;

pub(crate) fn parse_element_rows<R: Read>(reader: R) -> Result<Vec<ElementRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for record in csv_reader.deserialize::<ElementCsvRow>() {
        let row = record?;
        if let Some(parsed) = row.into_element_row() {
            rows.push(parsed);
        }
    }

    Ok(rows)
}

pub(crate) fn parse_validation_records<R: Read>(
    reader: R,
) -> Result<Vec<ValidationRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = csv_reader.headers()?.iter().map(header_key).collect();
    let mut records = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let fields: BTreeMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(header, value)| (header.clone(), value.to_string()))
            .collect();
        records.push(ValidationRecord::from_fields(fields));
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct ElementCsvRow {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Element Name")]
    element_name: String,
    #[serde(rename = "Scale Name")]
    scale_name: String,
    #[serde(rename = "Data Value", default, deserialize_with = "lenient_number")]
    data_value: Option<f64>,
}

impl ElementCsvRow {
    fn into_element_row(self) -> Option<ElementRow> {
        let data_value = self.data_value.filter(|value| value.is_finite())?;
        let title = clean_name(&self.title);
        let element_name = clean_name(&self.element_name);
        if title.is_empty() || element_name.is_empty() {
            return None;
        }

        Some(ElementRow {
            title,
            element_name,
            scale_name: clean_name(&self.scale_name),
            data_value,
        })
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.and_then(|value| value.trim().parse::<f64>().ok()))
}
