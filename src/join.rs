use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::error::{LoctreeError, Result};
use crate::models::{LastPurchase, LocationReportRow, PathRow, ProductStock, ReportRow, StockColumns};
use crate::source::LocationSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinStrategy {
    /// One query for every location, split by the returned location column.
    #[default]
    Batched,
    /// One query per location.
    PerLocation,
}

/// Collapse rows sharing (location, product) into one, summing quantities
/// with nulls counted as zero. First-seen order is kept.
pub fn aggregate_stock(rows: Vec<ProductStock>) -> Vec<ProductStock> {
    let mut index: HashMap<(Option<i64>, Option<i64>), usize> = HashMap::new();
    let mut out: Vec<ProductStock> = Vec::new();
    for row in rows {
        let key = (row.location, row.product);
        let quantity = row.quantity.unwrap_or(0.0);
        match index.get(&key) {
            Some(&i) => {
                let total = out[i].quantity.unwrap_or(0.0) + quantity;
                out[i].quantity = Some(total);
            }
            None => {
                index.insert(key, out.len());
                out.push(ProductStock {
                    quantity: Some(quantity),
                    ..row
                });
            }
        }
    }
    out
}

pub fn fetch_stock(
    source: &dyn LocationSource,
    codes: &[i64],
    strategy: JoinStrategy,
) -> Vec<ProductStock> {
    let raw = match strategy {
        JoinStrategy::Batched => source.stock_for(codes),
        JoinStrategy::PerLocation => codes.iter().flat_map(|&c| source.stock_at(c)).collect(),
    };
    tracing::info!(locations = codes.len(), rows = raw.len(), ?strategy, "stock fetched");
    aggregate_stock(raw)
}

/// Last purchase per distinct product code in `stock`. Products without a
/// completed inbound purchase are absent from the map.
pub fn fetch_last_purchases(
    source: &dyn LocationSource,
    stock: &[ProductStock],
) -> BTreeMap<i64, LastPurchase> {
    let products: BTreeSet<i64> = stock.iter().filter_map(|s| s.product).collect();
    let found: BTreeMap<i64, LastPurchase> = products
        .iter()
        .filter_map(|&p| source.last_purchase(p).map(|lp| (p, lp)))
        .collect();
    tracing::info!(products = products.len(), found = found.len(), "last purchases fetched");
    found
}

/// One row per (location, product); a location with no stock gets exactly
/// one row with null product columns and zero stock. Rows are ordered by
/// location code, then in the order the source returned the products.
pub fn join_rows(
    paths: &[PathRow],
    stock: Vec<ProductStock>,
    purchases: &BTreeMap<i64, LastPurchase>,
) -> Vec<ReportRow> {
    let wanted: HashSet<i64> = paths.iter().map(|p| p.code).collect();
    let mut by_location: BTreeMap<i64, Vec<ProductStock>> = BTreeMap::new();
    let mut stray = 0usize;
    for row in stock {
        match row.location {
            Some(loc) if wanted.contains(&loc) => {
                by_location.entry(loc).or_default().push(row)
            }
            _ => stray += 1,
        }
    }
    if stray > 0 {
        tracing::debug!(stray, "stock rows for locations outside the report dropped");
    }

    let mut ordered: Vec<&PathRow> = paths.iter().collect();
    ordered.sort_by_key(|p| p.code);

    let mut rows = Vec::new();
    for path in ordered {
        match by_location.get(&path.code) {
            Some(products) if !products.is_empty() => {
                for product in products {
                    let last = product.product.and_then(|p| purchases.get(&p));
                    rows.push(ReportRow::new(path, Some(product), last));
                }
            }
            _ => rows.push(ReportRow::new(path, None, None)),
        }
    }
    rows
}

/// Report for a single location: its partner detail repeated on one row per
/// stocked product, each with that product's last purchase.
pub fn location_report(
    source: &dyn LocationSource,
    code: i64,
    path: Option<&PathRow>,
) -> Result<Vec<LocationReportRow>> {
    let detail = source
        .location_detail(code)
        .ok_or(LoctreeError::MissingLocation(code))?;
    let stock = aggregate_stock(source.stock_at(code));
    let purchases = fetch_last_purchases(source, &stock);

    if stock.is_empty() {
        return Ok(vec![LocationReportRow::new(
            &detail,
            path,
            StockColumns::new(None, None),
        )]);
    }
    Ok(stock
        .iter()
        .map(|s| {
            let last = s.product.and_then(|p| purchases.get(&p));
            LocationReportRow::new(&detail, path, StockColumns::new(Some(s), last))
        })
        .collect())
}
