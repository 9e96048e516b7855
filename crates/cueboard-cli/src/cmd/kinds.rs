use cueboard_core::{
    plugins::{CommandKind, PluginQuery},
    types::{Namespace, ParamShape, QueryShape},
};

use crate::output::{print_json, print_table};

fn param_label(shape: ParamShape) -> String {
    match shape {
        ParamShape::Nothing => "-".to_string(),
        ParamShape::Target(kind) => format!("--target <{kind} name>"),
        ParamShape::Delay => "--seconds".to_string(),
        ParamShape::CommandLine => "--program [--arg ...] [--dir]".to_string(),
        ParamShape::Position => "--x --y --rotation --size --time".to_string(),
        ParamShape::Variable => "--variable".to_string(),
        ParamShape::Restore => "--variable --time".to_string(),
    }
}

fn expect_label(shape: QueryShape) -> String {
    match shape {
        QueryShape::Identity(kind) => format!("<{kind} name>"),
        QueryShape::Flag => "true | false".to_string(),
        QueryShape::Text => "<text>".to_string(),
    }
}

/// Print the commands and queries each plugin offers.
pub fn run(namespace: Option<Namespace>, json: bool) -> anyhow::Result<()> {
    let namespaces: Vec<Namespace> = match namespace {
        Some(ns) => vec![ns],
        None => Namespace::all().to_vec(),
    };

    let mut commands = Vec::new();
    let mut queries = Vec::new();
    for ns in namespaces {
        for kind in CommandKind::all_for(ns) {
            commands.push(vec![ns.to_string(), kind.as_str().to_string(), param_label(kind.shape())]);
        }
        for query in PluginQuery::all_for(ns) {
            queries.push(vec![ns.to_string(), query.as_str().to_string(), expect_label(query.shape())]);
        }
    }

    if json {
        return print_json(&serde_json::json!({ "commands": commands, "queries": queries }));
    }
    print_table(&["PLUGIN", "COMMAND", "PARAMETERS"], commands);
    if !queries.is_empty() {
        println!();
        print_table(&["PLUGIN", "QUERY", "EXPECT"], queries);
    }
    Ok(())
}
