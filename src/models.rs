use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::export::{cell, Tabular};

// ---------------------------------------------------------------------------
// Lenient column decoders
// ---------------------------------------------------------------------------

// The inspection endpoint returns numeric columns as numbers or strings
// depending on the SQL type, and pads CHAR columns with spaces.

fn de_opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(whole)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Codes sent as floats must be whole and fit an i64.
fn whole(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn de_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    de_opt_i64(d)?.ok_or_else(|| serde::de::Error::custom("expected an integer code"))
}

fn de_opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn de_opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn de_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(de_opt_text(d)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Remote rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationNode {
    #[serde(rename = "CODLOCAL", deserialize_with = "de_i64")]
    pub code: i64,
    #[serde(rename = "CODLOCALPAI", default, deserialize_with = "de_opt_i64")]
    pub parent: Option<i64>,
    #[serde(rename = "DESCRLOCAL", default, deserialize_with = "de_text")]
    pub name: String,
}

impl LocationNode {
    /// Parent code, with the zero sentinel read as "no parent".
    pub fn parent_code(&self) -> Option<i64> {
        self.parent.filter(|&p| p != 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductStock {
    #[serde(rename = "CODPROD", default, deserialize_with = "de_opt_i64")]
    pub product: Option<i64>,
    #[serde(rename = "DESCRPROD", default, deserialize_with = "de_opt_text")]
    pub description: Option<String>,
    #[serde(rename = "UNIDADE", default, deserialize_with = "de_opt_text")]
    pub unit: Option<String>,
    #[serde(rename = "MARCA", default, deserialize_with = "de_opt_text")]
    pub brand: Option<String>,
    #[serde(rename = "NCM", default, deserialize_with = "de_opt_text")]
    pub ncm: Option<String>,
    /// Absent from per-location queries; the caller fills it in.
    #[serde(rename = "CODLOCAL", default, deserialize_with = "de_opt_i64")]
    pub location: Option<i64>,
    #[serde(rename = "TOTAL_ESTOQUE", default, deserialize_with = "de_opt_f64")]
    pub quantity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastPurchase {
    #[serde(rename = "VLRUNIT", default, deserialize_with = "de_opt_f64")]
    pub unit_price: Option<f64>,
    #[serde(rename = "DTNEG", default, deserialize_with = "de_opt_text")]
    pub date: Option<String>,
    #[serde(rename = "NUNOTA", default, deserialize_with = "de_opt_i64")]
    pub transaction: Option<i64>,
    #[serde(rename = "CODEMP", default, deserialize_with = "de_opt_i64")]
    pub company: Option<i64>,
}

/// A location joined with its partner record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDetail {
    #[serde(rename = "CODLOCAL", deserialize_with = "de_i64")]
    pub code: i64,
    #[serde(rename = "CODLOCALPAI", default, deserialize_with = "de_opt_i64")]
    pub parent: Option<i64>,
    #[serde(rename = "DESCRLOCAL", default, deserialize_with = "de_text")]
    pub name: String,
    #[serde(rename = "AD_DESCRBASE", default, deserialize_with = "de_opt_text")]
    pub base_description: Option<String>,
    #[serde(rename = "UTILIZAWMS", default, deserialize_with = "de_opt_text")]
    pub uses_wms: Option<String>,
    #[serde(rename = "CAPACIDADEPRODUCAO", default, deserialize_with = "de_opt_text")]
    pub production_capacity: Option<String>,
    #[serde(rename = "CODPARC", default, deserialize_with = "de_opt_i64")]
    pub partner_code: Option<i64>,
    #[serde(rename = "NOMEPARC", default, deserialize_with = "de_opt_text")]
    pub partner_name: Option<String>,
    #[serde(rename = "RAZAOSOCIAL", default, deserialize_with = "de_opt_text")]
    pub partner_legal_name: Option<String>,
    #[serde(rename = "CGC_CPF", default, deserialize_with = "de_opt_text")]
    pub partner_tax_id: Option<String>,
    #[serde(rename = "TELEFONE", default, deserialize_with = "de_opt_text")]
    pub partner_phone: Option<String>,
    #[serde(rename = "EMAIL", default, deserialize_with = "de_opt_text")]
    pub partner_email: Option<String>,
}

// ---------------------------------------------------------------------------
// Derived rows
// ---------------------------------------------------------------------------

/// Ancestor chain of one location, root first, ending at the location itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PathInfo {
    pub names: Vec<String>,
    pub codes: Vec<i64>,
    pub depth: usize,
}

impl PathInfo {
    pub fn path(&self) -> String {
        self.names.join(" > ")
    }

    pub fn code_path(&self) -> String {
        self.codes
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathRow {
    #[serde(rename = "CODLOCAL")]
    pub code: i64,
    #[serde(rename = "DESCRLOCAL")]
    pub name: String,
    #[serde(rename = "LOCAL_PATH")]
    pub path: String,
    #[serde(rename = "LOCAL_PATH_CODES")]
    pub code_path: String,
    #[serde(rename = "LOCAL_DEPTH")]
    pub depth: usize,
}

impl PathRow {
    pub fn new(node: &LocationNode, info: &PathInfo) -> Self {
        Self {
            code: node.code,
            name: node.name.clone(),
            path: info.path(),
            code_path: info.code_path(),
            depth: info.depth,
        }
    }
}

/// Product, stock and last-purchase columns shared by both report shapes.
/// All fields are null and the stock is zero for a location with no stock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockColumns {
    #[serde(rename = "CODPROD")]
    pub product: Option<i64>,
    #[serde(rename = "DESCRPROD")]
    pub description: Option<String>,
    #[serde(rename = "UNIDADE")]
    pub unit: Option<String>,
    #[serde(rename = "MARCA")]
    pub brand: Option<String>,
    #[serde(rename = "NCM")]
    pub ncm: Option<String>,
    #[serde(rename = "TOTAL_ESTOQUE")]
    pub total_stock: f64,
    #[serde(rename = "LAST_PURCHASE_UNIT")]
    pub last_unit_price: Option<f64>,
    #[serde(rename = "LAST_PURCHASE_DATE")]
    pub last_purchase_date: Option<String>,
    #[serde(rename = "LAST_PURCHASE_NUNOTA")]
    pub last_transaction: Option<i64>,
    #[serde(rename = "LAST_PURCHASE_CODEMP")]
    pub last_company: Option<i64>,
}

impl StockColumns {
    pub fn new(stock: Option<&ProductStock>, last: Option<&LastPurchase>) -> Self {
        Self {
            product: stock.and_then(|s| s.product),
            description: stock.and_then(|s| s.description.clone()),
            unit: stock.and_then(|s| s.unit.clone()),
            brand: stock.and_then(|s| s.brand.clone()),
            ncm: stock.and_then(|s| s.ncm.clone()),
            total_stock: stock.and_then(|s| s.quantity).unwrap_or(0.0),
            last_unit_price: last.and_then(|l| l.unit_price),
            last_purchase_date: last.and_then(|l| l.date.clone()),
            last_transaction: last.and_then(|l| l.transaction),
            last_company: last.and_then(|l| l.company),
        }
    }

    fn cells(&self) -> Vec<Option<String>> {
        vec![
            cell(&self.product),
            self.description.clone(),
            self.unit.clone(),
            self.brand.clone(),
            self.ncm.clone(),
            Some(self.total_stock.to_string()),
            cell(&self.last_unit_price),
            self.last_purchase_date.clone(),
            cell(&self.last_transaction),
            cell(&self.last_company),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "CODLOCAL")]
    pub location: i64,
    #[serde(rename = "DESCRLOCAL")]
    pub location_name: String,
    #[serde(rename = "LOCAL_PATH")]
    pub path: String,
    #[serde(rename = "LOCAL_PATH_CODES")]
    pub code_path: String,
    #[serde(rename = "LOCAL_DEPTH")]
    pub depth: usize,
    #[serde(flatten)]
    pub stock: StockColumns,
}

impl ReportRow {
    pub fn new(path: &PathRow, stock: Option<&ProductStock>, last: Option<&LastPurchase>) -> Self {
        Self {
            location: path.code,
            location_name: path.name.clone(),
            path: path.path.clone(),
            code_path: path.code_path.clone(),
            depth: path.depth,
            stock: StockColumns::new(stock, last),
        }
    }
}

impl Tabular for ReportRow {
    const COLUMNS: &'static [&'static str] = &[
        "CODLOCAL",
        "DESCRLOCAL",
        "LOCAL_PATH",
        "LOCAL_PATH_CODES",
        "LOCAL_DEPTH",
        "CODPROD",
        "DESCRPROD",
        "UNIDADE",
        "MARCA",
        "NCM",
        "TOTAL_ESTOQUE",
        "LAST_PURCHASE_UNIT",
        "LAST_PURCHASE_DATE",
        "LAST_PURCHASE_NUNOTA",
        "LAST_PURCHASE_CODEMP",
    ];

    fn cells(&self) -> Vec<Option<String>> {
        let mut cells = vec![
            Some(self.location.to_string()),
            Some(self.location_name.clone()),
            Some(self.path.clone()),
            Some(self.code_path.clone()),
            Some(self.depth.to_string()),
        ];
        cells.extend(self.stock.cells());
        cells
    }
}

/// One product stocked at a single location, with the location's partner.
/// Path columns are null when the location's path is unknown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationReportRow {
    #[serde(rename = "CODLOCAL")]
    pub location: i64,
    #[serde(rename = "DESCRLOCAL")]
    pub location_name: String,
    #[serde(rename = "CODLOCALPAI")]
    pub parent: Option<i64>,
    #[serde(rename = "AD_DESCRBASE")]
    pub base_description: Option<String>,
    #[serde(rename = "UTILIZAWMS")]
    pub uses_wms: Option<String>,
    #[serde(rename = "CAPACIDADEPRODUCAO")]
    pub production_capacity: Option<String>,
    #[serde(rename = "PARTNER_CODPARC")]
    pub partner_code: Option<i64>,
    #[serde(rename = "PARTNER_NOMEPARC")]
    pub partner_name: Option<String>,
    #[serde(rename = "PARTNER_RAZAOSOCIAL")]
    pub partner_legal_name: Option<String>,
    #[serde(rename = "PARTNER_CGC_CPF")]
    pub partner_tax_id: Option<String>,
    #[serde(rename = "PARTNER_TELEFONE")]
    pub partner_phone: Option<String>,
    #[serde(rename = "PARTNER_EMAIL")]
    pub partner_email: Option<String>,
    #[serde(rename = "LOCAL_PATH")]
    pub path: Option<String>,
    #[serde(rename = "LOCAL_PATH_CODES")]
    pub code_path: Option<String>,
    #[serde(rename = "LOCAL_DEPTH")]
    pub depth: Option<usize>,
    #[serde(flatten)]
    pub stock: StockColumns,
}

impl LocationReportRow {
    pub fn new(detail: &LocationDetail, path: Option<&PathRow>, stock: StockColumns) -> Self {
        Self {
            location: detail.code,
            location_name: detail.name.clone(),
            parent: detail.parent,
            base_description: detail.base_description.clone(),
            uses_wms: detail.uses_wms.clone(),
            production_capacity: detail.production_capacity.clone(),
            partner_code: detail.partner_code,
            partner_name: detail.partner_name.clone(),
            partner_legal_name: detail.partner_legal_name.clone(),
            partner_tax_id: detail.partner_tax_id.clone(),
            partner_phone: detail.partner_phone.clone(),
            partner_email: detail.partner_email.clone(),
            path: path.map(|p| p.path.clone()),
            code_path: path.map(|p| p.code_path.clone()),
            depth: path.map(|p| p.depth),
            stock,
        }
    }
}

impl Tabular for LocationReportRow {
    const COLUMNS: &'static [&'static str] = &[
        "CODLOCAL",
        "DESCRLOCAL",
        "CODLOCALPAI",
        "AD_DESCRBASE",
        "UTILIZAWMS",
        "CAPACIDADEPRODUCAO",
        "PARTNER_CODPARC",
        "PARTNER_NOMEPARC",
        "PARTNER_RAZAOSOCIAL",
        "PARTNER_CGC_CPF",
        "PARTNER_TELEFONE",
        "PARTNER_EMAIL",
        "LOCAL_PATH",
        "LOCAL_PATH_CODES",
        "LOCAL_DEPTH",
        "CODPROD",
        "DESCRPROD",
        "UNIDADE",
        "MARCA",
        "NCM",
        "TOTAL_ESTOQUE",
        "LAST_PURCHASE_UNIT",
        "LAST_PURCHASE_DATE",
        "LAST_PURCHASE_NUNOTA",
        "LAST_PURCHASE_CODEMP",
    ];

    fn cells(&self) -> Vec<Option<String>> {
        let mut cells = vec![
            Some(self.location.to_string()),
            Some(self.location_name.clone()),
            cell(&self.parent),
            self.base_description.clone(),
            self.uses_wms.clone(),
            self.production_capacity.clone(),
            cell(&self.partner_code),
            self.partner_name.clone(),
            self.partner_legal_name.clone(),
            self.partner_tax_id.clone(),
            self.partner_phone.clone(),
            self.partner_email.clone(),
            self.path.clone(),
            self.code_path.clone(),
            cell(&self.depth),
        ];
        cells.extend(self.stock.cells());
        cells
    }
}
