pub(crate) fn build_intent_prompt(query: &str, context: &serde_json::Value) -> String {
    let context_block = if context.is_null() {
        "(none)".to_string()
    } else {
        serde_json::to_string_pretty(context).unwrap_or_else(|_| context.to_string())
    };

    format!(
        r#"
# Intent Analysis

You analyze requests sent to an autonomous coding assistant and break them
into typed intents. Do not plan or perform the work.

## Request
{}

## Workspace Context
{}

## Output Format

Respond with a JSON array only:

```json
[
  {{
    "id": "intent-1",
    "type": "analysis|implementation|testing|deployment|modification|optimization|general",
    "action": "short verb, e.g. create",
    "confidence": 0.9,
    "complexity": "low|medium|high",
    "priority": 1,
    "entities": {{
      "files": ["src/auth.ts"],
      "technologies": ["react"],
      "concepts": ["authentication"],
      "patterns": []
    }}
  }}
]
```

## Rules

1. One intent per distinct action in the request
2. `confidence` is a number between 0 and 1
3. `priority` starts at 1; lower numbers run first (analyze before build, build before test, test before deploy)
4. Only mention files, technologies and concepts that appear in the request or context
"#,
        query, context_block
    )
}
