use stepsim_config::{StepSimConfig, ToolSetName};
use stepsim_mcp::ToolSet;

pub fn run(
    config: &StepSimConfig,
    tools: Option<ToolSetName>,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let tools = ToolSet::from(tools.unwrap_or(config.gateway.tools));
    let definitions = tools.tool_definitions();

    if pretty {
        println!("{}", serde_json::to_string_pretty(&definitions)?);
    } else {
        println!("{}", serde_json::to_string(&definitions)?);
    }

    Ok(())
}
