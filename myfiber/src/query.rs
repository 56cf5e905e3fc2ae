//! Query string handling.

use std::collections::HashMap;

/// Query parameters. Keys are case sensitive.
pub type Params = HashMap<String, String>;

/// Percent-encode the parameters, sorted by key so the same parameters always give the same
/// query string regardless of their insertion order.
pub fn encode_query(params: &Params) -> String {
    let mut sorted: Vec<(&String, &String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    sorted
        .into_iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Append the parameters to the path. Path might already carry a query string.
pub fn with_query(path: &str, params: Option<&Params>) -> String {
    match params {
        Some(params) if !params.is_empty() => {
            let separator = if path.contains('?') { '&' } else { '?' };
            format!("{path}{separator}{}", encode_query(params))
        }
        _ => path.to_owned(),
    }
}

/// Split URL into the part before `?` and the parameters after it.
pub fn split_url(url: &str) -> (String, Params) {
    let Some((path, query)) = url.split_once('?') else {
        return (url.to_owned(), Params::new());
    };

    let params = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(key), decode(value))
        })
        .collect();

    (path.to_owned(), params)
}

fn decode(text: &str) -> String {
    let text = text.replace('+', " ");
    match urlencoding::decode(&text) {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => {
            log::warn!("Keeping '{text}' undecoded: {err}");
            text
        }
    }
}
