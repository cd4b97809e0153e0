use anyhow::Result;
use rmcp::model::Tool as ToolInfo;
use serde_json::{Map, Value};

use crate::dataset::DatasetSource;
use crate::helpers::{choose_one, prompt};
use crate::mcp::RecipeTools;
use crate::service::RecipeService;
use crate::tools::{self, Tool};
use crate::updater::RemoteSource;

const EXIT: &str = "Exit";

/// Menu label for each tool, in display order.
fn entries() -> Vec<(&'static str, Tool)> {
    vec![
        ("List all categories", Tool::GetAllCategories),
        (
            "List categories with subcategories",
            Tool::GetCategoriesWithSubcategories,
        ),
        ("Get subcategories by category", Tool::GetSubcategoriesByCategory),
        ("Get recipes by category", Tool::GetRecipesByCategory),
        ("Get recipes by tag", Tool::GetRecipesByTag),
        ("Get recipes by name", Tool::GetRecipesByName),
        ("Get recipe by ID", Tool::GetRecipeById),
        ("Get recipes by dependency", Tool::GetRecipesByDependency),
        ("Update recipes database", Tool::UpdateRecipesDatabase),
    ]
}

/// Arguments declared in a tool's input schema, each flagged as required or
/// not.
fn arguments(info: &ToolInfo) -> Vec<(String, bool)> {
    let required: Vec<&str> = info
        .input_schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .collect();

    info.input_schema
        .get("properties")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|properties| properties.keys())
        .map(|name| (name.clone(), required.contains(&name.as_str())))
        .collect()
}

fn prompt_label(param: &str, required: bool) -> String {
    let label = match param {
        "recipe_id" => "Enter recipe ID",
        "name_query" => "Enter name (partial)",
        "dependency" => "Enter dependency (partial)",
        "tag" => "Enter tag",
        "category" => "Enter category",
        "subcategory" => "Enter subcategory",
        other => other,
    };
    if required {
        label.to_string()
    } else {
        format!("{label} (or leave empty)")
    }
}

/// Interactive loop: pick an operation, answer its prompts, see the JSON.
/// Ends on "Exit", on a cancelled menu or at end of input.
pub async fn run<S, R>(service: &RecipeService<S, R>) -> Result<()>
where
    S: DatasetSource + Send + Sync + 'static,
    R: RemoteSource + 'static,
{
    let catalog = RecipeTools::<S, R>::catalog();
    let entries = entries();
    let mut labels: Vec<&str> = entries.iter().map(|(label, _)| *label).collect();
    labels.push(EXIT);

    loop {
        let Some(choice) = choose_one("Queries Menu", labels.clone())? else {
            break;
        };
        let Some((_, tool)) = entries.iter().find(|(label, _)| *label == choice) else {
            break;
        };

        let params = catalog
            .iter()
            .find(|info| info.name == tool.name())
            .map(arguments)
            .unwrap_or_default();

        let mut args = Map::new();
        for (param, required) in params {
            let Some(answer) = prompt(&prompt_label(&param, required))? else {
                println!("\nInput terminated.");
                return Ok(());
            };
            args.insert(param, Value::String(answer));
        }

        match tools::call(service, *tool, &Value::Object(args)).await {
            Ok(text) => println!("{text}"),
            Err(err) => eprintln!("Error executing query: {err}"),
        }
    }

    Ok(())
}
