use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Schema object kinds reported by `list_objects`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Table,
    View,
    Collection,
    CollectionView,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Table => "TABLE",
            ObjectKind::View => "VIEW",
            ObjectKind::Collection => "COLLECTION",
            ObjectKind::CollectionView => "COLLECTION_VIEW",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One column row of catalog introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogColumn {
    pub name: String,
    pub data_type: String,
    /// Empty for ordinary columns.
    pub generation_expression: String,
}

const DOC_COLUMN: &str = "doc";
const ID_COLUMN: &str = "_id";
const ID_EXPRESSION: &str = "json_unquote(json_extract(doc,'$._id'))";

fn member_expression() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(json_unquote\()?json_extract\(doc,'\$(\.[^\s.]+)+'\)\)?$")
            .expect("member expression pattern")
    })
}

fn charset_introducer() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([,(])_[a-z0-9]+'").expect("charset introducer pattern"))
}

/// Lower-cases and strips back-ticks, whitespace and charset introducers.
pub fn normalize_expression(expr: &str) -> String {
    let compact: String = expr
        .chars()
        .filter(|c| *c != '`' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    charset_introducer()
        .replace_all(&compact, "${1}'")
        .into_owned()
}

fn is_doc(column: &CatalogColumn) -> bool {
    column.name == DOC_COLUMN && column.data_type.eq_ignore_ascii_case("json")
}

fn is_id(column: &CatalogColumn) -> bool {
    column.name == ID_COLUMN && normalize_expression(&column.generation_expression) == ID_EXPRESSION
}

fn is_document_member(column: &CatalogColumn) -> bool {
    column.name != ID_COLUMN
        && !column.generation_expression.is_empty()
        && member_expression().is_match(&normalize_expression(&column.generation_expression))
}

/// Classifies a table or view from its type (`BASE TABLE`, `VIEW`, ...) and columns.
pub fn classify_table(table_type: &str, columns: &[CatalogColumn]) -> ObjectKind {
    let docs = columns.iter().filter(|c| is_doc(c)).count();
    if table_type.to_ascii_uppercase().ends_with("VIEW") {
        return if columns.len() == 1 && docs == 1 {
            ObjectKind::CollectionView
        } else {
            ObjectKind::View
        };
    }
    let ids = columns.iter().filter(|c| is_id(c)).count();
    let members = columns.iter().filter(|c| is_document_member(c)).count();
    if docs == 1 && ids == 1 && columns.len() == members + 2 {
        ObjectKind::Collection
    } else {
        ObjectKind::Table
    }
}
