use serde::de::DeserializeOwned;

use crate::client::{QueryClient, Row, Transport};
use crate::models::{LastPurchase, LocationDetail, LocationNode, ProductStock};
use crate::retry::Sleeper;
use crate::sql;

/// Where location and stock data comes from. Lookups that fail after retries
/// come back empty rather than as errors.
pub trait LocationSource {
    fn children_of(&self, parents: &[i64]) -> Vec<LocationNode>;
    fn locations(&self, codes: &[i64]) -> Vec<LocationNode>;
    fn location(&self, code: i64) -> Option<LocationNode>;
    fn location_detail(&self, code: i64) -> Option<LocationDetail>;
    /// Stock aggregates for many locations in one round trip.
    fn stock_for(&self, codes: &[i64]) -> Vec<ProductStock>;
    /// Stock aggregates for one location, `location` filled in.
    fn stock_at(&self, code: i64) -> Vec<ProductStock>;
    fn last_purchase(&self, product: i64) -> Option<LastPurchase>;
}

/// `LocationSource` backed by the remote inspection endpoint.
pub struct InspectionSource<T, S> {
    client: QueryClient<T, S>,
}

impl<T: Transport, S: Sleeper> InspectionSource<T, S> {
    pub fn new(client: QueryClient<T, S>) -> Self {
        Self { client }
    }

    fn fetch<R: DeserializeOwned>(&self, query: &str) -> Vec<R> {
        decode_rows(self.client.rows(query))
    }
}

fn decode_rows<R: DeserializeOwned>(rows: Vec<Row>) -> Vec<R> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(serde_json::Value::Object(row)) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!("skipping undecodable row: {e}");
                None
            }
        })
        .collect()
}

impl<T: Transport, S: Sleeper> LocationSource for InspectionSource<T, S> {
    fn children_of(&self, parents: &[i64]) -> Vec<LocationNode> {
        if parents.is_empty() {
            return Vec::new();
        }
        self.fetch(&sql::children_of(parents))
    }

    fn locations(&self, codes: &[i64]) -> Vec<LocationNode> {
        if codes.is_empty() {
            return Vec::new();
        }
        self.fetch(&sql::locations_by_code(codes))
    }

    fn location(&self, code: i64) -> Option<LocationNode> {
        self.fetch(&sql::location_by_code(code)).into_iter().next()
    }

    fn location_detail(&self, code: i64) -> Option<LocationDetail> {
        self.fetch(&sql::location_detail(code)).into_iter().next()
    }

    fn stock_for(&self, codes: &[i64]) -> Vec<ProductStock> {
        if codes.is_empty() {
            return Vec::new();
        }
        self.fetch(&sql::stock_for_locations(codes))
    }

    fn stock_at(&self, code: i64) -> Vec<ProductStock> {
        let mut rows: Vec<ProductStock> = self.fetch(&sql::stock_at_location(code));
        for row in &mut rows {
            row.location = Some(code);
        }
        rows
    }

    fn last_purchase(&self, product: i64) -> Option<LastPurchase> {
        self.fetch(&sql::last_purchase(product)).into_iter().next()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::{BTreeMap, HashSet};

    use super::*;
    use crate::client::tests::ScriptedTransport;
    use crate::retry::tests::RecordingSleeper;
    use crate::retry::Retry;

    /// In-memory location tree with per-location stock and call counters.
    #[derive(Default)]
    pub(crate) struct MemorySource {
        pub nodes: BTreeMap<i64, LocationNode>,
        pub details: BTreeMap<i64, LocationDetail>,
        pub stock: Vec<ProductStock>,
        pub purchases: BTreeMap<i64, LastPurchase>,
        /// Codes whose single and batched lookups fail.
        pub unreachable: HashSet<i64>,
        pub child_queries: Cell<usize>,
        pub batch_lookups: RefCell<Vec<Vec<i64>>>,
        pub single_lookups: RefCell<Vec<i64>>,
        pub stock_queries: Cell<usize>,
    }

    impl MemorySource {
        pub fn node(mut self, code: i64, parent: i64, name: &str) -> Self {
            self.nodes.insert(
                code,
                LocationNode {
                    code,
                    parent: Some(parent),
                    name: name.to_string(),
                },
            );
            self
        }

        pub fn stock(mut self, location: i64, product: i64, quantity: Option<f64>) -> Self {
            self.stock.push(ProductStock {
                product: Some(product),
                description: Some(format!("PRODUTO {product}")),
                unit: Some("UN".to_string()),
                brand: None,
                ncm: None,
                location: Some(location),
                quantity,
            });
            self
        }
    }

    impl LocationSource for MemorySource {
        fn children_of(&self, parents: &[i64]) -> Vec<LocationNode> {
            self.child_queries.set(self.child_queries.get() + 1);
            self.nodes
                .values()
                .filter(|n| n.parent.is_some_and(|p| parents.contains(&p)))
                .cloned()
                .collect()
        }

        fn locations(&self, codes: &[i64]) -> Vec<LocationNode> {
            self.batch_lookups.borrow_mut().push(codes.to_vec());
            codes
                .iter()
                .filter(|c| !self.unreachable.contains(c))
                .filter_map(|c| self.nodes.get(c).cloned())
                .collect()
        }

        fn location(&self, code: i64) -> Option<LocationNode> {
            self.single_lookups.borrow_mut().push(code);
            if self.unreachable.contains(&code) {
                return None;
            }
            self.nodes.get(&code).cloned()
        }

        fn location_detail(&self, code: i64) -> Option<LocationDetail> {
            self.details.get(&code).cloned()
        }

        fn stock_for(&self, codes: &[i64]) -> Vec<ProductStock> {
            self.stock_queries.set(self.stock_queries.get() + 1);
            self.stock
                .iter()
                .filter(|s| s.location.is_some_and(|l| codes.contains(&l)))
                .cloned()
                .collect()
        }

        fn stock_at(&self, code: i64) -> Vec<ProductStock> {
            self.stock_for(&[code])
        }

        fn last_purchase(&self, product: i64) -> Option<LastPurchase> {
            self.purchases.get(&product).cloned()
        }
    }

    fn source(transport: ScriptedTransport) -> InspectionSource<ScriptedTransport, RecordingSleeper> {
        InspectionSource::new(
            QueryClient::new(transport, Retry::default()).with_sleeper(RecordingSleeper::default()),
        )
    }

    #[test]
    fn test_children_decode_and_skip_bad_rows() {
        let src = source(ScriptedTransport::default().ok(
            r#"{"data":[
                {"CODLOCAL":101010,"CODLOCALPAI":101000,"DESCRLOCAL":"ALMOX  "},
                {"DESCRLOCAL":"no code"},
                {"CODLOCAL":"101020","CODLOCALPAI":101000,"DESCRLOCAL":"EXPEDICAO"}
            ]}"#,
        ));
        let children = src.children_of(&[101000]);
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name, "ALMOX");
        assert_eq!(children[1].code, 101020);
        let queries = src.client_queries();
        assert!(queries[0].contains("CODLOCALPAI IN (101000)"));
    }

    #[test]
    fn test_empty_code_lists_skip_the_network() {
        let src = source(ScriptedTransport::default());
        assert!(src.children_of(&[]).is_empty());
        assert!(src.locations(&[]).is_empty());
        assert!(src.stock_for(&[]).is_empty());
        assert!(src.client_queries().is_empty());
    }

    #[test]
    fn test_stock_at_fills_location() {
        let src = source(ScriptedTransport::default().ok(
            r#"{"data":[{"CODPROD":1,"DESCRPROD":"A","TOTAL_ESTOQUE":4}]}"#,
        ));
        let rows = src.stock_at(101010);
        assert_eq!(rows[0].location, Some(101010));
        assert_eq!(rows[0].quantity, Some(4.0));
    }

    #[test]
    fn test_missing_single_rows_are_none() {
        let src = source(ScriptedTransport::default().ok(r#"{"data":[]}"#).ok(r#"{"data":[]}"#));
        assert!(src.location(9).is_none());
        assert!(src.last_purchase(9).is_none());
    }

    impl<S: Sleeper> InspectionSource<ScriptedTransport, S> {
        fn client_queries(&self) -> Vec<String> {
            self.client.transport().queries.borrow().clone()
        }
    }
}
