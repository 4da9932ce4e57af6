//! `search_cars` tool and the stdio server around it.

use std::sync::Arc;

use carfinder_core::domain::filter::SearchFilter;
use carfinder_core::search::VehicleSearch;
use rmcp::{
    handler::server::router::tool::ToolRouter,
    model::{CallToolResult, Content, JsonObject, ServerCapabilities, ServerInfo},
    ErrorData, ServerHandler, ServiceExt,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::{McpError, McpResult};

pub const DEFAULT_TOOL_LIMIT: u32 = 20;

/// Arguments of `search_cars`: every filter field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SearchCarsInput {
    #[serde(flatten)]
    pub filter: SearchFilter,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_TOOL_LIMIT
}

impl SearchCarsInput {
    /// Parses raw tool arguments. Fuel names are matched case-insensitively;
    /// blank text fields are treated as absent.
    pub fn from_params(mut params: JsonObject) -> McpResult<Self> {
        for key in ["make", "model", "fuel"] {
            match params.get(key) {
                Some(Value::String(text)) if text.trim().is_empty() => {
                    params.remove(key);
                }
                Some(Value::String(text)) if key == "fuel" => {
                    let normalized = text.trim().to_ascii_lowercase();
                    params.insert(key.to_string(), Value::String(normalized));
                }
                Some(Value::String(text)) => {
                    let trimmed = text.trim().to_string();
                    params.insert(key.to_string(), Value::String(trimmed));
                }
                _ => {}
            }
        }

        serde_json::from_value(Value::Object(params))
            .map_err(|error| McpError::Validation(error.to_string()))
    }
}

#[derive(Clone)]
pub struct CarSearchMcp {
    catalog: Arc<dyn VehicleSearch>,
    tool_router: ToolRouter<Self>,
}

impl CarSearchMcp {
    pub fn new(catalog: Arc<dyn VehicleSearch>) -> Self {
        Self { catalog, tool_router: Self::tool_router() }
    }

    /// Runs one search and returns the records as a JSON array.
    pub async fn search_json(&self, params: JsonObject) -> McpResult<String> {
        let input = SearchCarsInput::from_params(params)?;
        let records = self.catalog.search(&input.filter, input.limit).await?;
        debug!(event_name = "mcp.search_cars", returned = records.len(), limit = input.limit);
        serde_json::to_string(&records).map_err(|error| McpError::Internal(error.to_string()))
    }

    /// Serves MCP over stdin/stdout until the client disconnects.
    pub async fn run_stdio(self) -> anyhow::Result<()> {
        info!(event_name = "mcp.started", "starting MCP server with stdio transport");
        let service = self.serve(rmcp::transport::stdio()).await?;
        service.waiting().await?;
        info!(event_name = "mcp.stopped", "MCP server shutdown complete");
        Ok(())
    }
}

#[rmcp::tool_router]
impl CarSearchMcp {
    #[rmcp::tool(
        name = "search_cars",
        description = "Search the used-car catalog. All filters are optional; \
                       results are ordered by id.",
        input_schema = search_cars_schema()
    )]
    async fn search_cars(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
        let body = self.search_json(params).await.map_err(McpError::into_error_data)?;
        Ok(CallToolResult::success(vec![Content::text(body)]))
    }
}

#[rmcp::tool_handler]
impl ServerHandler for CarSearchMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Car catalog search. Use search_cars with any of make, model, fuel, year and \
                 price bounds, mileage_max and the equipment flags."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

fn search_cars_schema() -> Arc<JsonObject> {
    Arc::new(rmcp::object!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "make": { "type": "string" },
            "model": { "type": "string" },
            "fuel": {
                "type": "string",
                "enum": ["gasoline", "flex", "diesel", "electric", "hybrid"]
            },
            "year_min": { "type": "integer" },
            "year_max": { "type": "integer" },
            "price_min": { "type": "integer", "description": "USD" },
            "price_max": { "type": "integer", "description": "USD" },
            "mileage_max": { "type": "integer", "description": "kilometers" },
            "is_new": { "type": "boolean" },
            "is_automatic": { "type": "boolean" },
            "has_air_conditioning": { "type": "boolean" },
            "has_bt_radio": { "type": "boolean" },
            "has_charger_plug": { "type": "boolean" },
            "is_armored": { "type": "boolean" },
            "limit": { "type": "integer", "minimum": 1, "maximum": 100, "default": 20 }
        }
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use carfinder_core::domain::criterion::FuelType;
    use carfinder_core::domain::vehicle::VehicleRecord;
    use carfinder_db::InMemoryVehicleRepository;
    use rmcp::model::JsonObject;
    use rmcp::ServerHandler;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};

    use super::{CarSearchMcp, SearchCarsInput, DEFAULT_TOOL_LIMIT};
    use crate::McpError;

    fn params(value: Value) -> JsonObject {
        match value {
            Value::Object(object) => object,
            other => panic!("expected object, got {other}"),
        }
    }

    fn car(make: &str, model: &str, fuel: FuelType, price: i64) -> VehicleRecord {
        VehicleRecord {
            id: None,
            make: make.to_string(),
            model: model.to_string(),
            year: 2020,
            color: "blue".to_string(),
            fuel,
            mileage: 70_000,
            dollar_price: Decimal::from(price),
            is_new: false,
            is_automatic: true,
            has_air_conditioning: true,
            has_charger_plug: fuel == FuelType::Electric,
            is_armored: false,
            has_bt_radio: true,
        }
    }

    fn server() -> CarSearchMcp {
        CarSearchMcp::new(Arc::new(InMemoryVehicleRepository::with_vehicles([
            car("Tesla", "Model 3", FuelType::Electric, 38_000),
            car("Toyota", "Corolla", FuelType::Hybrid, 27_000),
            car("Toyota", "Hilux", FuelType::Diesel, 45_000),
        ])))
    }

    #[test]
    fn input_defaults_and_normalization() {
        let input = SearchCarsInput::from_params(params(json!({}))).expect("empty input");
        assert_eq!(input.limit, DEFAULT_TOOL_LIMIT);
        assert!(input.filter.is_unconstrained());

        let input = SearchCarsInput::from_params(params(json!({
            "make": "  Toyota ",
            "model": "",
            "fuel": "Diesel",
            "price_max": 50000,
            "is_armored": false,
            "limit": 5
        })))
        .expect("input");
        assert_eq!(input.filter.make.as_deref(), Some("Toyota"));
        assert_eq!(input.filter.model, None);
        assert_eq!(input.filter.fuel, Some(FuelType::Diesel));
        assert_eq!(input.filter.price_max, Some(50_000));
        assert_eq!(input.filter.is_armored, Some(false));
        assert_eq!(input.limit, 5);
    }

    #[test]
    fn mistyped_arguments_are_validation_errors() {
        let error = SearchCarsInput::from_params(params(json!({ "fuel": "steam" })))
            .expect_err("unknown fuel");
        assert!(matches!(error, McpError::Validation(_)));
        assert_eq!(error.error_code(), -32602);

        let error = SearchCarsInput::from_params(params(json!({ "year_min": "recent" })))
            .expect_err("non-numeric year");
        assert!(matches!(error, McpError::Validation(_)));
    }

    #[tokio::test]
    async fn search_returns_matching_records_as_json() {
        let body = server()
            .search_json(params(json!({ "make": "toyota", "price_max": 30000 })))
            .await
            .expect("search");

        let records: Vec<VehicleRecord> = serde_json::from_str(&body).expect("json records");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].model, "Corolla");
        assert_eq!(records[0].id, Some(2));
    }

    #[tokio::test]
    async fn empty_result_is_an_empty_array() {
        let body = server()
            .search_json(params(json!({ "make": "Lada" })))
            .await
            .expect("search");
        assert_eq!(body, "[]");
    }

    #[test]
    fn server_advertises_tools() {
        let info = server().get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap_or_default().contains("search_cars"));
    }
}
