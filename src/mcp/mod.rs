//! Model Context Protocol server exposing the recipe tools over stdio.
//!
//! Tool names, descriptions and argument schemas come from the `#[tool]`
//! attributes below; `rmcp` generates the JSON schemas from the parameter
//! structs.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo, Tool as ToolInfo},
    schemars,
    schemars::JsonSchema,
    tool, tool_handler, tool_router,
    transport::stdio,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::dataset::DatasetSource;
use crate::service::RecipeService;
use crate::updater::RemoteSource;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecipeIdParams {
    #[schemars(description = "Exact recipe id (case-sensitive)")]
    pub recipe_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct NameQueryParams {
    #[schemars(description = "Part of the recipe name")]
    pub name_query: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TagParams {
    #[schemars(description = "Tag to look for")]
    pub tag: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CategoryParams {
    #[schemars(description = "Category name")]
    pub category: String,
    #[schemars(description = "Subcategory to narrow the result to (optional)")]
    pub subcategory: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DependencyParams {
    #[schemars(description = "Part of the dependency coordinates")]
    pub dependency: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SubcategoriesParams {
    #[schemars(description = "Category name")]
    pub category: String,
}

fn json_text<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string(value).map_err(|e| {
        McpError::internal_error("encode_error", Some(json!({"error": e.to_string()})))
    })?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// The nine recipe tools, each answering with JSON text.
pub struct RecipeTools<S, R> {
    service: Arc<RecipeService<S, R>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl<S: DatasetSource + Send + Sync + 'static, R: RemoteSource + 'static> RecipeTools<S, R> {
    pub fn new(service: impl Into<Arc<RecipeService<S, R>>>) -> Self {
        Self {
            service: service.into(),
            tool_router: Self::tool_router(),
        }
    }

    /// Name, description and input schema of every tool.
    pub fn catalog() -> Vec<ToolInfo> {
        Self::tool_router().list_all()
    }

    #[tool(description = "Get a single recipe by its exact id. Returns {} when not found.")]
    pub async fn get_recipe_by_id(
        &self,
        params: Parameters<RecipeIdParams>,
    ) -> Result<CallToolResult, McpError> {
        json_text(&self.service.find_by_id(Some(&params.0.recipe_id)))
    }

    #[tool(description = "Get recipes whose name contains the query (case-insensitive).")]
    pub async fn get_recipes_by_name(
        &self,
        params: Parameters<NameQueryParams>,
    ) -> Result<CallToolResult, McpError> {
        json_text(&self.service.find_by_name(Some(&params.0.name_query)))
    }

    #[tool(description = "Get recipes that carry the given tag (case-insensitive exact match).")]
    pub async fn get_recipes_by_tag(
        &self,
        params: Parameters<TagParams>,
    ) -> Result<CallToolResult, McpError> {
        json_text(&self.service.find_by_tag(Some(&params.0.tag)))
    }

    #[tool(description = "Get recipes of a category, optionally narrowed to a subcategory.")]
    pub async fn get_recipes_by_category(
        &self,
        params: Parameters<CategoryParams>,
    ) -> Result<CallToolResult, McpError> {
        let CategoryParams {
            category,
            subcategory,
        } = params.0;
        json_text(
            &self
                .service
                .find_by_category(Some(&category), subcategory.as_deref()),
        )
    }

    #[tool(description = "Get recipes whose dependency contains the query (case-insensitive).")]
    pub async fn get_recipes_by_dependency(
        &self,
        params: Parameters<DependencyParams>,
    ) -> Result<CallToolResult, McpError> {
        json_text(&self.service.find_by_dependency(Some(&params.0.dependency)))
    }

    #[tool(description = "List all categories, lowercased and sorted.")]
    pub async fn get_all_categories(&self) -> Result<CallToolResult, McpError> {
        json_text(&self.service.list_categories())
    }

    #[tool(description = "List the subcategories of a category, lowercased and sorted.")]
    pub async fn get_subcategories_by_category(
        &self,
        params: Parameters<SubcategoriesParams>,
    ) -> Result<CallToolResult, McpError> {
        json_text(&self.service.list_subcategories(Some(&params.0.category)))
    }

    #[tool(description = "List every category together with its subcategories.")]
    pub async fn get_categories_with_subcategories(&self) -> Result<CallToolResult, McpError> {
        json_text(&self.service.list_categories_with_subcategories())
    }

    #[tool(
        description = "Download the published recipes database, verify its SHA-256 and install it."
    )]
    pub async fn update_recipes_database(&self) -> Result<CallToolResult, McpError> {
        json_text(&self.service.update_database().await)
    }
}

#[tool_handler]
impl<S: DatasetSource + Send + Sync + 'static, R: RemoteSource + 'static> ServerHandler
    for RecipeTools<S, R>
{
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build()).with_instructions(
            "OpenRewrite recipes database: look recipes up by id, name, tag, category or \
             dependency, browse categories, and refresh the local database.",
        )
    }
}

/// Serve the tools on stdin/stdout until the client disconnects.
pub async fn serve_stdio<S, R>(service: RecipeService<S, R>) -> anyhow::Result<()>
where
    S: DatasetSource + Send + Sync + 'static,
    R: RemoteSource + 'static,
{
    let running = RecipeTools::new(service).serve(stdio()).await?;
    info!("MCP server listening on stdio");
    running.waiting().await?;
    info!("MCP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Producer;
    use crate::repositories::RecipeRepository;
    use crate::service::UpdateTarget;
    use crate::tools::Tool;
    use crate::updater::RemoteUpdater;
    use crate::updater::tests::StubSource;
    use rmcp::model::RawContent;
    use serde_json::Value;
    use std::path::PathBuf;

    type TestTools = RecipeTools<Producer<fn() -> Value>, StubSource>;

    fn dataset() -> Value {
        json!([
            {"id": "r1", "name": "Add Spring JDBC", "category": "spring", "sub-category": "jdbc",
             "tags": ["spring", "jdbc"], "dependency": "org.openrewrite.recipe:rewrite-spring"},
            {"id": "r2", "name": "Add Spring Web", "category": "spring", "sub-category": "web",
             "tags": ["spring", "web"], "dependency": "org.openrewrite.recipe:rewrite-spring"}
        ])
    }

    fn tools() -> TestTools {
        RecipeTools::new(RecipeService::new(
            RecipeRepository::new(Producer(dataset as fn() -> Value)),
            RemoteUpdater::new(StubSource::failing("offline")),
            UpdateTarget {
                dataset_url: "https://example.com/recipes.json".into(),
                checksum_url: "https://example.com/recipes.json.sha256".into(),
                dest_dir: PathBuf::from("unused"),
            },
        ))
    }

    fn body(result: CallToolResult) -> Value {
        let text = match &result.content[0].raw {
            RawContent::Text(text) => text.text.as_str(),
            _ => panic!("Expected text content"),
        };
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn catalog_lists_the_nine_tools() {
        let catalog = TestTools::catalog();
        assert_eq!(catalog.len(), 9);
        for tool in Tool::ALL {
            assert!(
                catalog.iter().any(|info| info.name == tool.name()),
                "{tool} missing from the MCP catalog"
            );
        }
    }

    #[test]
    fn schemas_mark_required_arguments() {
        let catalog = TestTools::catalog();
        let by_category = catalog
            .iter()
            .find(|info| info.name == "get_recipes_by_category")
            .unwrap();
        let schema = Value::Object((*by_category.input_schema).clone());

        assert!(schema["properties"]["category"].is_object());
        assert!(schema["properties"]["subcategory"].is_object());
        assert_eq!(schema["required"], json!(["category"]));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn query_tools_answer_with_json_text() {
        let tools = tools();

        let found = tools
            .get_recipe_by_id(Parameters(RecipeIdParams {
                recipe_id: "r2".into(),
            }))
            .await
            .unwrap();
        assert_eq!(body(found)["name"], json!("Add Spring Web"));

        let narrowed = tools
            .get_recipes_by_category(Parameters(CategoryParams {
                category: "SPRING".into(),
                subcategory: Some("jdbc".into()),
            }))
            .await
            .unwrap();
        assert_eq!(body(narrowed), json!([dataset()[0]]));

        let tree = tools.get_categories_with_subcategories().await.unwrap();
        assert_eq!(
            body(tree),
            json!([{"category": "spring", "sub-categories": ["jdbc", "web"]}])
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn blank_arguments_give_empty_answers() {
        let tools = tools();

        let missing = tools
            .get_recipe_by_id(Parameters(RecipeIdParams {
                recipe_id: "  ".into(),
            }))
            .await
            .unwrap();
        assert_eq!(body(missing), json!({}));

        let none = tools
            .get_recipes_by_tag(Parameters(TagParams { tag: String::new() }))
            .await
            .unwrap();
        assert_eq!(body(none), json!([]));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_failure_is_reported_in_the_result() {
        let outcome = body(tools().update_recipes_database().await.unwrap());
        assert_eq!(outcome["success"], json!(false));
        assert!(outcome["error"].as_str().unwrap().contains("offline"));
    }
}
