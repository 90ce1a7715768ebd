//! GraphQL gateway implementation for the hosted inventory platform.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{GatewayError, Result};
use crate::{department_for, InventoryGateway, InventoryLookup, Location, ResolvedItem};

const API_VERSION: &str = "2024-10";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Admin-API GraphQL client for the external inventory platform.
pub struct ShopifyGateway {
    client: Client,
    endpoint: String,
    token: String,
}

impl ShopifyGateway {
    /// Create a gateway for `shop_domain` (e.g. `my-store.myshopify.com`)
    /// using an Admin API access token.
    pub fn new(shop_domain: &str, access_token: &str) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            endpoint: format!("https://{shop_domain}/admin/api/{API_VERSION}/graphql.json"),
            token: access_token.to_string(),
        })
    }

    /// Execute one GraphQL document and return the `data` payload.
    async fn graphql(&self, query: String) -> Result<Value> {
        debug!(endpoint = %self.endpoint, "GraphQL request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Shopify-Access-Token", &self.token)
            .json(&json!({ "query": query }))
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(GatewayError::Throttled);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api(format!("HTTP {status}: {body}")));
        }

        let mut body: Value = response.json().await?;
        check_graphql_errors(&body)?;

        Ok(body
            .get_mut("data")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }
}

/// The platform reports throttling both as HTTP 429 and as a GraphQL error
/// with a `THROTTLED` extension code; map both to [`GatewayError::Throttled`].
fn check_graphql_errors(body: &Value) -> Result<()> {
    let Some(errors) = body.get("errors").and_then(Value::as_array) else {
        return Ok(());
    };
    if errors.is_empty() {
        return Ok(());
    }

    let throttled = errors.iter().any(|err| {
        err.pointer("/extensions/code").and_then(Value::as_str) == Some("THROTTLED")
    });
    if throttled {
        return Err(GatewayError::Throttled);
    }

    let messages: Vec<&str> = errors
        .iter()
        .filter_map(|err| err.get("message").and_then(Value::as_str))
        .collect();
    Err(GatewayError::Api(messages.join("; ")))
}

/// Barcodes are interpolated into GraphQL search strings; strip characters
/// that would break out of the quoted term.
fn sanitize_code(barcode: &str) -> String {
    barcode
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
        .collect()
}

#[async_trait]
impl InventoryGateway for ShopifyGateway {
    async fn resolve_item(&self, barcode: &str) -> Result<Option<ResolvedItem>> {
        let code = sanitize_code(barcode);
        let query = format!(
            r#"{{
              productVariants(first: 1, query: "barcode:{code}") {{
                edges {{
                  node {{
                    inventoryItem {{ id }}
                    product {{ title productType }}
                    metafield(namespace: "custom", key: "name") {{ value }}
                  }}
                }}
              }}
            }}"#
        );

        let data = self.graphql(query).await?;
        let Some(node) = data.pointer("/productVariants/edges/0/node") else {
            return Ok(None);
        };

        let Some(inventory_item_id) = node
            .pointer("/inventoryItem/id")
            .and_then(Value::as_str)
        else {
            return Ok(None);
        };

        let title = node
            .pointer("/product/title")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let name = node
            .pointer("/metafield/value")
            .and_then(Value::as_str)
            .unwrap_or(title);

        Ok(Some(ResolvedItem {
            inventory_item_id: inventory_item_id.to_string(),
            name: name.to_string(),
            product_type: node
                .pointer("/product/productType")
                .and_then(Value::as_str)
                .map(str::to_string),
        }))
    }

    async fn lookup_inventory(
        &self,
        barcode: &str,
        location_id: &str,
    ) -> Result<InventoryLookup> {
        let code = sanitize_code(barcode);
        let query = format!(
            r#"{{
              productVariants(first: 5, query: "barcode:{code}") {{
                edges {{
                  node {{
                    sku
                    barcode
                    inventoryItem {{
                      id
                      inventoryLevels(first: 20) {{
                        edges {{
                          node {{
                            location {{ id }}
                            quantities(names: ["available"]) {{ name quantity }}
                          }}
                        }}
                      }}
                    }}
                    metafield(namespace: "custom", key: "name") {{ value }}
                    product {{ title productType }}
                  }}
                }}
              }}
            }}"#
        );

        let data = self.graphql(query).await?;
        let Some(variant) = data.pointer("/productVariants/edges/0/node") else {
            return Err(GatewayError::NotFound(format!(
                "No catalog entry for barcode {barcode}"
            )));
        };

        let inventory_item_id = variant
            .pointer("/inventoryItem/id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                GatewayError::Api(format!("Variant for {barcode} has no inventory item"))
            })?;

        // Absent levels at the requested location read as 0.
        let soh = variant
            .pointer("/inventoryItem/inventoryLevels/edges")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .find(|edge| {
                edge.pointer("/node/location/id").and_then(Value::as_str) == Some(location_id)
            })
            .and_then(|edge| {
                edge.pointer("/node/quantities")
                    .and_then(Value::as_array)?
                    .iter()
                    .find(|q| q.get("name").and_then(Value::as_str) == Some("available"))?
                    .get("quantity")
                    .and_then(Value::as_i64)
            })
            .unwrap_or(0);

        let title = variant
            .pointer("/product/title")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let name = variant
            .pointer("/metafield/value")
            .and_then(Value::as_str)
            .unwrap_or(title);
        let product_type = variant
            .pointer("/product/productType")
            .and_then(Value::as_str)
            .map(str::to_string);
        let reported_code = variant
            .get("barcode")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .or_else(|| variant.get("sku").and_then(Value::as_str))
            .unwrap_or(barcode);

        Ok(InventoryLookup {
            barcode: reported_code.to_string(),
            name: name.to_string(),
            soh,
            department: product_type
                .as_deref()
                .and_then(department_for)
                .map(str::to_string),
            product_type,
            inventory_item_id: inventory_item_id.to_string(),
        })
    }

    async fn adjust_quantity(
        &self,
        inventory_item_id: &str,
        location_id: &str,
        delta: i64,
        reason: &str,
    ) -> Result<()> {
        let mutation = format!(
            r#"mutation {{
              inventoryAdjustQuantities(input: {{
                reason: "{reason}",
                name: "available",
                changes: [{{
                  inventoryItemId: "{inventory_item_id}",
                  locationId: "{location_id}",
                  delta: {delta}
                }}]
              }}) {{
                userErrors {{ field message }}
              }}
            }}"#
        );

        let data = self.graphql(mutation).await?;
        let user_errors = data
            .pointer("/inventoryAdjustQuantities/userErrors")
            .and_then(Value::as_array);
        if let Some(errors) = user_errors {
            if !errors.is_empty() {
                let messages: Vec<&str> = errors
                    .iter()
                    .filter_map(|err| err.get("message").and_then(Value::as_str))
                    .collect();
                return Err(GatewayError::Api(messages.join("; ")));
            }
        }

        Ok(())
    }

    async fn list_locations(&self) -> Result<Vec<Location>> {
        let query = r#"{
          locations(first: 50) {
            edges { node { id name } }
          }
        }"#
        .to_string();

        let data = self.graphql(query).await?;
        let edges = data
            .pointer("/locations/edges")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(edges
            .iter()
            .filter_map(|edge| {
                let node = edge.get("node")?;
                Some(Location {
                    id: node.get("id")?.as_str()?.to_string(),
                    name: node.get("name")?.as_str()?.to_string(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graphql_throttle_code_maps_to_throttled() {
        let body = json!({
            "errors": [
                { "message": "Throttled", "extensions": { "code": "THROTTLED" } }
            ]
        });
        assert!(matches!(
            check_graphql_errors(&body),
            Err(GatewayError::Throttled)
        ));
    }

    #[test]
    fn graphql_errors_surface_messages() {
        let body = json!({
            "errors": [
                { "message": "Field 'foo' doesn't exist" },
                { "message": "Access denied" }
            ]
        });
        match check_graphql_errors(&body) {
            Err(GatewayError::Api(msg)) => {
                assert!(msg.contains("Field 'foo' doesn't exist"));
                assert!(msg.contains("Access denied"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn clean_bodies_pass() {
        assert!(check_graphql_errors(&json!({ "data": {} })).is_ok());
        assert!(check_graphql_errors(&json!({ "errors": [] })).is_ok());
    }

    #[test]
    fn sanitize_strips_query_breaking_characters() {
        assert_eq!(sanitize_code("012345678905"), "012345678905");
        assert_eq!(sanitize_code("ABC-123_x.9"), "ABC-123_x.9");
        assert_eq!(sanitize_code("bad\"code) {}"), "badcode");
    }
}
