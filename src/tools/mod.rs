//! In-process dispatch of the recipe tools by name, used by the CLI `tool`
//! subcommand and the interactive menu. The MCP server in `crate::mcp` owns
//! the descriptions and argument schemas.
//!
//! Each tool takes a JSON object of arguments and answers with JSON text. An
//! argument that is missing or not a string counts as not given.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::dataset::DatasetSource;
use crate::service::RecipeService;
use crate::updater::RemoteSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    GetRecipeById,
    GetRecipesByName,
    GetRecipesByTag,
    GetRecipesByCategory,
    GetRecipesByDependency,
    GetAllCategories,
    GetSubcategoriesByCategory,
    GetCategoriesWithSubcategories,
    UpdateRecipesDatabase,
}

impl Tool {
    pub const ALL: [Tool; 9] = [
        Tool::GetRecipeById,
        Tool::GetRecipesByName,
        Tool::GetRecipesByTag,
        Tool::GetRecipesByCategory,
        Tool::GetRecipesByDependency,
        Tool::GetAllCategories,
        Tool::GetSubcategoriesByCategory,
        Tool::GetCategoriesWithSubcategories,
        Tool::UpdateRecipesDatabase,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::GetRecipeById => "get_recipe_by_id",
            Tool::GetRecipesByName => "get_recipes_by_name",
            Tool::GetRecipesByTag => "get_recipes_by_tag",
            Tool::GetRecipesByCategory => "get_recipes_by_category",
            Tool::GetRecipesByDependency => "get_recipes_by_dependency",
            Tool::GetAllCategories => "get_all_categories",
            Tool::GetSubcategoriesByCategory => "get_subcategories_by_category",
            Tool::GetCategoriesWithSubcategories => "get_categories_with_subcategories",
            Tool::UpdateRecipesDatabase => "update_recipes_database",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tool {
    type Err = ToolError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|tool| tool.name() == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

fn arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

/// Run `tool` with `args` and encode the answer as JSON text.
pub async fn call<S, R>(
    service: &RecipeService<S, R>,
    tool: Tool,
    args: &Value,
) -> Result<String, ToolError>
where
    S: DatasetSource,
    R: RemoteSource,
{
    let text = match tool {
        Tool::GetRecipeById => serde_json::to_string(&service.find_by_id(arg(args, "recipe_id")))?,
        Tool::GetRecipesByName => {
            serde_json::to_string(&service.find_by_name(arg(args, "name_query")))?
        }
        Tool::GetRecipesByTag => serde_json::to_string(&service.find_by_tag(arg(args, "tag")))?,
        Tool::GetRecipesByCategory => serde_json::to_string(
            &service.find_by_category(arg(args, "category"), arg(args, "subcategory")),
        )?,
        Tool::GetRecipesByDependency => {
            serde_json::to_string(&service.find_by_dependency(arg(args, "dependency")))?
        }
        Tool::GetAllCategories => serde_json::to_string(&service.list_categories())?,
        Tool::GetSubcategoriesByCategory => {
            serde_json::to_string(&service.list_subcategories(arg(args, "category")))?
        }
        Tool::GetCategoriesWithSubcategories => {
            serde_json::to_string(&service.list_categories_with_subcategories())?
        }
        Tool::UpdateRecipesDatabase => serde_json::to_string(&service.update_database().await)?,
    };
    Ok(text)
}

/// Same as [`call`], looking the tool up by name.
pub async fn call_by_name<S, R>(
    service: &RecipeService<S, R>,
    name: &str,
    args: &Value,
) -> Result<String, ToolError>
where
    S: DatasetSource,
    R: RemoteSource,
{
    call(service, name.parse()?, args).await
}
