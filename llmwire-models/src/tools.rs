//! Built-in tools: `get_current_time` and `read_file`.
//!
//! OpenAI-style requests may resolve these in a non-streaming call before
//! the streaming follow-up. The clock tool is offered according to the
//! provider's [`ToolPermissions`] and, under `auto`, the user's message.
//! `read_file` accompanies local attachments, since the attachment notice
//! tells the model to call it.

use crate::context::ToolRequest;
use chrono::{DateTime, Local, TimeZone};
use llmwire_core::{ChatTool, ToolChoice, ToolPermissions};
use serde_json::{json, Value};

pub use llmwire_core::builder::READ_FILE_TOOL;

/// Tool name.
pub const CURRENT_TIME_TOOL: &str = "get_current_time";

const ASCII_KEYWORDS: &[&str] = &["time", "date", "today", "now", "clock", "weekday"];
const CJK_KEYWORDS: &[&str] = &["现在", "几点", "日期", "今天"];

/// Definition sent to the provider.
#[must_use]
pub fn current_time_tool() -> ChatTool {
    ChatTool::function(
        CURRENT_TIME_TOOL,
        "Get the current local date, time, weekday and timezone offset.",
        json!({"type": "object", "properties": {}, "required": []}),
    )
}

/// Definition of the file-reading tool.
#[must_use]
pub fn read_file_tool() -> ChatTool {
    ChatTool::function(
        READ_FILE_TOOL,
        "Read the text content of a file the user attached to the conversation.",
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path of the attached file, as listed in the attachment notice."
                }
            },
            "required": ["path"]
        }),
    )
}

/// Whether a message looks like it asks about the date or time.
///
/// English keywords must match whole words; CJK keywords match anywhere.
#[must_use]
pub fn is_time_query(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| ASCII_KEYWORDS.contains(&word))
        || CJK_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// The tool request for this turn, or `None` when no tool is offered.
///
/// `local_files` adds `read_file`; its choice is `auto` unless the clock
/// tool's permissions pick something stricter.
#[must_use]
pub fn tool_request(
    permissions: &ToolPermissions,
    message: &str,
    local_files: bool,
) -> Option<ToolRequest> {
    let time_choice = time_tool_choice(permissions, message);

    let mut tools = Vec::new();
    if local_files {
        tools.push(read_file_tool());
    }
    if time_choice.is_some() {
        tools.push(current_time_tool());
    }
    if tools.is_empty() {
        return None;
    }

    Some(ToolRequest {
        tools,
        tool_choice: time_choice.unwrap_or_else(|| json!("auto")),
    })
}

fn time_tool_choice(permissions: &ToolPermissions, message: &str) -> Option<Value> {
    if !permissions.enabled {
        return None;
    }

    match permissions.tool_choice {
        ToolChoice::None => None,
        ToolChoice::Required => Some(json!("required")),
        ToolChoice::Specific if permissions.names(CURRENT_TIME_TOOL) => Some(json!({
            "type": "function",
            "function": {"name": CURRENT_TIME_TOOL}
        })),
        ToolChoice::Specific => None,
        ToolChoice::Auto if is_time_query(message) => Some(json!("auto")),
        ToolChoice::Auto => None,
    }
}

/// Tool output for the given instant.
pub fn time_result<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let value: Value = json!({
        "datetime": now.to_rfc3339(),
        "date": now.format("%Y-%m-%d").to_string(),
        "time": now.format("%H:%M:%S").to_string(),
        "weekday": now.format("%A").to_string(),
        "timezone": now.format("%:z").to_string(),
    });
    value.to_string()
}

/// Run a tool that needs nothing but the local clock.
///
/// `read_file` touches the filesystem and is run by the request pipeline.
#[must_use]
pub fn execute(name: &str) -> Option<String> {
    (name == CURRENT_TIME_TOOL).then(|| time_result(&Local::now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use rstest::rstest;

    fn permissions(choice: ToolChoice, specific: Option<&str>) -> ToolPermissions {
        ToolPermissions {
            enabled: true,
            tool_choice: choice,
            specific_tool: specific.map(str::to_string),
        }
    }

    #[rstest]
    #[case("What time is it?", true)]
    #[case("what's the DATE today", true)]
    #[case("现在几点了", true)]
    #[case("Do you know Rust?", false)]
    #[case("Write a haiku", false)]
    fn test_time_query_heuristic(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(is_time_query(text), expected);
    }

    #[test]
    fn test_disabled_or_none_offers_nothing() {
        let mut off = permissions(ToolChoice::Required, None);
        off.enabled = false;
        assert!(tool_request(&off, "time?", false).is_none());
        assert!(tool_request(&permissions(ToolChoice::None, None), "time?", false).is_none());
    }

    #[test]
    fn test_choice_mapping() {
        let required = tool_request(&permissions(ToolChoice::Required, None), "hello", false).unwrap();
        assert_eq!(required.tool_choice, json!("required"));

        let specific = tool_request(
            &permissions(ToolChoice::Specific, Some(CURRENT_TIME_TOOL)),
            "hello",
            false,
        )
        .unwrap();
        assert_eq!(specific.tool_choice["function"]["name"], CURRENT_TIME_TOOL);

        assert!(tool_request(&permissions(ToolChoice::Specific, Some("other")), "time", false).is_none());
        assert!(tool_request(&permissions(ToolChoice::Auto, None), "hello", false).is_none());
        assert!(tool_request(&permissions(ToolChoice::Auto, None), "what time is it", false).is_some());
    }

    #[test]
    fn test_local_files_offer_read_file() {
        let mut off = permissions(ToolChoice::Auto, None);
        off.enabled = false;
        let request = tool_request(&off, "summarize the notes", true).unwrap();
        let names: Vec<&str> = request.tools.iter().map(|t| t.function.name.as_str()).collect();
        assert_eq!(names, vec![READ_FILE_TOOL]);
        assert_eq!(request.tool_choice, json!("auto"));
        assert_eq!(request.tools[0].function.parameters["required"], json!(["path"]));

        let request =
            tool_request(&permissions(ToolChoice::Required, None), "hello", true).unwrap();
        let names: Vec<&str> = request.tools.iter().map(|t| t.function.name.as_str()).collect();
        assert_eq!(names, vec![READ_FILE_TOOL, CURRENT_TIME_TOOL]);
        assert_eq!(request.tool_choice, json!("required"));
    }

    #[test]
    fn test_time_result_fields() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let now = offset.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let value: Value = serde_json::from_str(&time_result(&now)).unwrap();
        assert_eq!(value["datetime"], "2024-03-01T09:30:00+08:00");
        assert_eq!(value["weekday"], "Friday");
        assert_eq!(value["timezone"], "+08:00");
    }

    #[test]
    fn test_execute_runs_clock_only() {
        assert!(execute(READ_FILE_TOOL).is_none());
        assert!(execute("unknown").is_none());
        assert!(execute(CURRENT_TIME_TOOL).is_some());
    }
}
