//! Name shaping for model names and operation ids.
//!
//! Model names follow the `{apiNamespace}.{PascalCase(functionName)}` convention
//! with fixed suffixes for each model kind. Operation ids in the final document
//! are rewritten to kebab-case.

/// Suffix for the request body model of write endpoints.
pub const REQUEST_BODY_SUFFIX: &str = "Request.Body";
/// Suffix for the response model.
pub const RESPONSE_SUFFIX: &str = "Response";
/// Suffix for the optional query string parameters model.
pub const QUERY_PARAMS_SUFFIX: &str = "Request.QueryParams";
/// Suffix for the optional path parameters model.
pub const PATH_PARAMS_SUFFIX: &str = "Request.PathParams";

/// Builds the model name prefix for a function: `{namespace}.{PascalCase(name)}`.
pub fn definition_prefix(namespace: &str, function_name: &str) -> String {
    format!("{}.{}", namespace, pascal_case(function_name))
}

/// Joins a definition prefix with a model kind suffix.
pub fn model_name(prefix: &str, suffix: &str) -> String {
    format!("{}.{}", prefix, suffix)
}

/// Splits an identifier into words at separators, case boundaries and
/// letter/digit transitions. `"getFunc"` -> `["get", "Func"]`,
/// `"my-api_v2"` -> `["my", "api", "v", "2"]`.
fn words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut out = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            continue;
        }

        if !current.is_empty() {
            let prev = chars[i - 1];
            let lower_to_upper = prev.is_lowercase() && c.is_uppercase();
            let digit_boundary = prev.is_ascii_digit() != c.is_ascii_digit();
            // End of an acronym run: "HTTPServer" splits before "Server".
            let acronym_end = prev.is_uppercase()
                && c.is_uppercase()
                && chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if lower_to_upper || digit_boundary || acronym_end {
                out.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }

    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// `camelCase` conversion: first word lowercased, the rest capitalized.
pub fn camel_case(input: &str) -> String {
    let mut result = String::new();
    for (i, word) in words(input).iter().enumerate() {
        if i == 0 {
            result.push_str(&word.to_lowercase());
        } else {
            result.push_str(&capitalize(word));
        }
    }
    result
}

/// `PascalCase` conversion: every word capitalized.
pub fn pascal_case(input: &str) -> String {
    words(input).iter().map(|w| capitalize(w)).collect()
}

/// `kebab-case` conversion: words lowercased and joined with dashes.
pub fn kebab_case(input: &str) -> String {
    words(input)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Collapses a dotted model name into a single PascalCase identifier, used
/// for request validator entries: `"Api.CreateFunc.Request.Body"` ->
/// `"ApiCreateFuncRequestBody"`.
pub fn format_name(model_name: &str) -> String {
    pascal_case(model_name)
}
