//! Response rendering helpers.
//!
//! JSON, API envelope, not-found and CSV bodies. All helpers return a new
//! [`Response`]. Diagnostic details are only rendered when the response is in
//! debug mode.

use crate::message::Response;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde::Serialize;
use serde_json::{json, Map, Value as Json};
use std::fmt::Write as _;

const JSON_CONTENT_TYPE: &str = "application/json";
const CSV_CONTENT_TYPE: &str = "text/csv;charset=utf-8";

impl Response {
    /// Returns a copy with `data` serialised as the JSON body.
    ///
    /// The body is pretty-printed in debug mode.
    ///
    /// # Errors
    ///
    /// Fails if `data` cannot be serialised.
    pub fn with_json<T: Serialize + ?Sized>(
        &self,
        data: &T,
        status: Option<StatusCode>,
    ) -> Result<Self, serde_json::Error> {
        let body = if self.is_debug() {
            serde_json::to_vec_pretty(data)?
        } else {
            serde_json::to_vec(data)?
        };

        let mut response = self
            .with_content_type(HeaderValue::from_static(JSON_CONTENT_TYPE))
            .with_body(body);
        if let Some(status) = status {
            response = response.with_status(status);
        }
        Ok(response)
    }

    /// Returns a copy with the API envelope `{"status": .., "data": ..}`.
    ///
    /// # Errors
    ///
    /// Fails if `data` cannot be serialised.
    pub fn with_api<T: Serialize + ?Sized>(
        &self,
        data: &T,
        status: Option<StatusCode>,
    ) -> Result<Self, serde_json::Error> {
        let data = serde_json::to_value(data)?;
        self.api_envelope(Some(data), Map::new(), status)
    }

    /// Returns a copy with an API error envelope.
    ///
    /// The body holds `error`, every key of `extra` not already present, the
    /// status code and, in debug mode, a `_debug` object.
    ///
    /// # Errors
    ///
    /// Fails if the body cannot be serialised.
    pub fn with_api_error(
        &self,
        error: &str,
        status: StatusCode,
        extra: Option<Map<String, Json>>,
        debug_message: &str,
        debug_data: Option<Json>,
    ) -> Result<Self, serde_json::Error> {
        let mut fields = Map::new();
        fields.insert("error".to_string(), Json::from(error));
        for (key, value) in extra.unwrap_or_default() {
            fields.entry(key).or_insert(value);
        }
        for (key, value) in self.debug_fields(debug_message, debug_data) {
            fields.entry(key).or_insert(value);
        }
        self.api_envelope(None, fields, Some(status))
    }

    /// Returns a copy rendered as a 404 page.
    ///
    /// A JSON body is produced when the current content type is
    /// `application/json`; otherwise an HTML body, which only carries the
    /// diagnostic message and data in debug mode.
    ///
    /// # Errors
    ///
    /// Fails if the debug data cannot be serialised.
    pub fn with_not_found(
        &self,
        debug_message: &str,
        debug_data: Option<Json>,
    ) -> Result<Self, serde_json::Error> {
        let response = self.with_status(StatusCode::NOT_FOUND);

        if self.header_line(&CONTENT_TYPE) == JSON_CONTENT_TYPE {
            let mut body = Map::new();
            body.insert(
                "error".to_string(),
                Json::from(response.status().as_u16()),
            );
            body.insert(
                "message".to_string(),
                Json::from(response.reason_phrase()),
            );
            for (key, value) in self.debug_fields(debug_message, debug_data) {
                body.entry(key).or_insert(value);
            }
            return response.with_json(&body, None);
        }

        if self.is_debug() {
            let mut body = format!("<p>{}</p>", escape_html(debug_message));
            if let Some(data) = debug_data {
                let dump = serde_json::to_string_pretty(&data)?;
                let _ = write!(body, "<pre>{}</pre>", escape_html(&dump));
            }
            return Ok(response.with_body_string(body));
        }

        let reason = response.reason_phrase();
        Ok(response.with_body_string(reason))
    }

    /// Returns a copy with a CSV body built from a header row and data rows.
    #[must_use]
    pub fn with_csv<H, R, F>(&self, headers: &[H], rows: R, status: Option<StatusCode>) -> Self
    where
        H: AsRef<str>,
        R: IntoIterator,
        R::Item: IntoIterator<Item = F>,
        F: AsRef<str>,
    {
        let mut body = String::new();
        write_csv_row(&mut body, headers);
        for row in rows {
            let fields: Vec<F> = row.into_iter().collect();
            write_csv_row(&mut body, &fields);
        }

        let mut response = self
            .with_content_type(HeaderValue::from_static(CSV_CONTENT_TYPE))
            .with_body_string(body);
        if let Some(status) = status {
            response = response.with_status(status);
        }
        response
    }

    fn api_envelope(
        &self,
        data: Option<Json>,
        mut fields: Map<String, Json>,
        status: Option<StatusCode>,
    ) -> Result<Self, serde_json::Error> {
        let code = status.unwrap_or_else(|| self.status());
        fields.insert("status".to_string(), Json::from(code.as_u16()));
        if let Some(data) = data.filter(|data| !data.is_null()) {
            fields.insert("data".to_string(), data);
        }
        self.with_json(&fields, status)
    }

    fn debug_fields(&self, message: &str, data: Option<Json>) -> Map<String, Json> {
        let mut fields = Map::new();
        if !self.is_debug() {
            return fields;
        }

        let data = data.filter(|data| !is_empty_json(data));
        if message.is_empty() && data.is_none() {
            return fields;
        }

        fields.insert(
            "_debug".to_string(),
            json!({
                "message": message,
                "data": data,
            }),
        );
        fields
    }
}

fn is_empty_json(value: &Json) -> bool {
    match value {
        Json::Null => true,
        Json::Array(items) => items.is_empty(),
        Json::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Escapes `&`, `<`, `>`, `"` and `'` for inclusion in HTML.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn write_csv_row<F: AsRef<str>>(out: &mut String, fields: &[F]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let field = field.as_ref();
        let needs_quotes = field
            .chars()
            .any(|c| matches!(c, ',' | '"' | '\\' | '\n' | '\r' | '\t' | ' '));
        if needs_quotes {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}
