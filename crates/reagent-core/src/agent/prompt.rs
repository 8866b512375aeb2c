use std::collections::BTreeMap;

use reagent_tools::ToolRegistry;

use super::parser::ParseError;

pub const SYSTEM_HEADER_TEMPLATE: &str = "\
You are a careful assistant that answers questions, summarizes material and runs \
analyses. You may use the tools listed below whenever they help.

## Tools

Break the question into smaller steps and pick the tool that fits each step. \
Tools can be used several times and in any order.

{tool_desc}
## Output Format

When you need a tool, reply in exactly this format:

```
Thought: <what you are going to do and why>
Action: <one of {tool_names}>
Action Input: <tool input as JSON, e.g. {\"input\": \"revenue growth in 2024\"}>
```

Always start with a Thought. Action Input must be valid JSON; do not wrap a plain \
string without keys.

After each Action the user replies with:

```
Observation: <tool output>
```

Repeat Thought/Action/Action Input until you can answer, then reply with one of:

```
Thought: I can answer without using any more tools.
Answer: <your answer>
```

```
Thought: I cannot answer the question with the provided tools.
Answer: <explain why>
```

## Current Conversation
";

/// Render the system header for a concrete set of tools.
#[must_use]
pub fn render_system_header(registry: &ToolRegistry) -> String {
    let tool_desc = registry.format_for_prompt();
    let tool_names = registry.names().join(", ");
    SYSTEM_HEADER_TEMPLATE
        .replace("{tool_desc}", &tool_desc)
        .replace("{tool_names}", &tool_names)
}

#[must_use]
pub fn format_reminder(err: &ParseError) -> String {
    format!(
        "Error: could not parse your reply ({err}). Reply with `Thought:` followed by either \
         `Action:` and `Action Input:` lines, or an `Answer:` line."
    )
}

/// Named prompt templates, for inspection.
#[must_use]
pub fn prompt_templates(registry: &ToolRegistry) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        ("react_header", SYSTEM_HEADER_TEMPLATE.to_owned()),
        ("system_prompt", render_system_header(registry)),
        (
            "text_qa_template",
            reagent_index::query::render_qa_prompt(&[], "{query_str}"),
        ),
    ])
}
