//! Enveloped JSON rendering

use std::borrow::Cow;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Number, Value};
use tracing::debug;

use crate::config::{JsonOptions, RenderContext};

use super::{Rendered, Renderer, DEFAULT_STATUS};

/// Transport status emitted for enveloped responses; the envelope itself
/// carries the real status
const ENVELOPE_STATUS: u16 = 200;

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Envelope wire shape
#[derive(Serialize)]
struct Envelope<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<&'a str>,
    ret: u16,
    msg: Cow<'a, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
}

/// Renderer for enveloped JSON responses
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn media_type(&self) -> &'static str {
        "application/json"
    }

    fn render(&self, data: Option<&Value>, ctx: &RenderContext) -> Result<Rendered> {
        let Some(status) = ctx.status_code else {
            // No upstream response to wrap: encode the payload as-is
            return match data {
                None => Ok(Rendered::new(Vec::new(), self.media_type(), DEFAULT_STATUS)),
                Some(payload) => {
                    let body = encode(payload, ctx.pretty)?;
                    Ok(Rendered::new(body, self.media_type(), DEFAULT_STATUS))
                }
            };
        };

        let envelope = if is_success(status) {
            Envelope {
                request_id: ctx.request_id.as_deref(),
                ret: status,
                msg: Cow::Borrowed("success"),
                data,
            }
        } else {
            // Failure: surface the error detail, drop the payload
            let msg = error_detail(data)
                .map(Cow::Owned)
                .unwrap_or(Cow::Borrowed("Invalid input."));
            Envelope {
                request_id: ctx.request_id.as_deref(),
                ret: status,
                msg,
                data: None,
            }
        };

        let body = encode(&envelope, ctx.pretty)?;
        if status != ENVELOPE_STATUS {
            debug!(ret = status, "transport status normalized for envelope");
        }

        Ok(Rendered::new(body, self.media_type(), ENVELOPE_STATUS))
    }
}

fn encode<T: Serialize>(value: &T, pretty: bool) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    if pretty {
        serde_json::to_writer_pretty(&mut buf, value)
            .context("Failed to serialize JSON response")?;
    } else {
        sonic_rs::to_writer(&mut buf, value).context("Failed to serialize JSON response")?;
    }
    Ok(buf)
}

/// Pull an error detail out of a failure payload.
///
/// Accepts a mapping with a `detail` member, or a list whose first element
/// is one. Every other shape yields `None`, which callers turn into the
/// generic message.
fn error_detail(data: Option<&Value>) -> Option<String> {
    let payload = match data? {
        Value::Array(items) => items.first()?,
        other => other,
    };
    match payload.get("detail")? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Conversion into a JSON payload value, for types the serializer has no
/// native encoding for
pub trait IntoPayload {
    fn into_payload(self, opts: &JsonOptions) -> Value;
}

impl IntoPayload for NaiveDateTime {
    fn into_payload(self, opts: &JsonOptions) -> Value {
        Value::String(self.format(&opts.datetime_format).to_string())
    }
}

impl<Tz: TimeZone> IntoPayload for DateTime<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    fn into_payload(self, opts: &JsonOptions) -> Value {
        Value::String(self.format(&opts.datetime_format).to_string())
    }
}

impl IntoPayload for NaiveDate {
    fn into_payload(self, _opts: &JsonOptions) -> Value {
        Value::String(self.format("%Y-%m-%d").to_string())
    }
}

impl IntoPayload for Decimal {
    fn into_payload(self, opts: &JsonOptions) -> Value {
        if opts.decimal_as_string {
            return Value::String(self.to_string());
        }
        match self.to_f64().and_then(Number::from_f64) {
            Some(n) => Value::Number(n),
            None => Value::String(self.to_string()),
        }
    }
}

impl IntoPayload for Value {
    fn into_payload(self, _opts: &JsonOptions) -> Value {
        self
    }
}

impl<T: IntoPayload> IntoPayload for Option<T> {
    fn into_payload(self, opts: &JsonOptions) -> Value {
        match self {
            Some(value) => value.into_payload(opts),
            None => Value::Null,
        }
    }
}

impl<T: IntoPayload> IntoPayload for Vec<T> {
    fn into_payload(self, opts: &JsonOptions) -> Value {
        Value::Array(
            self.into_iter()
                .map(|value| value.into_payload(opts))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(data: Option<&Value>, ctx: &RenderContext) -> Rendered {
        JsonRenderer.render(data, ctx).unwrap()
    }

    fn body_json(rendered: &Rendered) -> Value {
        serde_json::from_slice(&rendered.body).unwrap()
    }

    #[test]
    fn test_success_envelope() {
        let data = json!({"a": 1});
        let out = render(Some(&data), &RenderContext::new(200));

        assert_eq!(
            body_json(&out),
            json!({"ret": 200, "msg": "success", "data": {"a": 1}})
        );
        assert_eq!(out.status, 200);
    }

    #[test]
    fn test_success_without_data_omits_key() {
        let out = render(None, &RenderContext::new(204));
        assert_eq!(body_json(&out), json!({"ret": 204, "msg": "success"}));
    }

    #[test]
    fn test_request_id_included() {
        let data = json!({"a": 1});
        let ctx = RenderContext::new(200).with_request_id("req-1");
        let out = render(Some(&data), &ctx);

        assert_eq!(body_json(&out)["request_id"], json!("req-1"));
    }

    #[test]
    fn test_error_detail_from_mapping() {
        let data = json!({"detail": "not found"});
        let out = render(Some(&data), &RenderContext::new(404));

        assert_eq!(body_json(&out), json!({"ret": 404, "msg": "not found"}));
        // Transport status is normalized; the envelope carries the failure
        assert_eq!(out.status, 200);
    }

    #[test]
    fn test_error_detail_from_list() {
        let data = json!([{"detail": "bad"}]);
        let out = render(Some(&data), &RenderContext::new(400));

        assert_eq!(body_json(&out)["msg"], json!("bad"));
        assert!(body_json(&out).get("data").is_none());
    }

    #[test]
    fn test_error_detail_fallback() {
        let shapes = [
            json!({"field": ["required"]}),
            json!([]),
            json!([42]),
            json!("oops"),
        ];
        for data in &shapes {
            let out = render(Some(data), &RenderContext::new(400));
            assert_eq!(body_json(&out)["msg"], json!("Invalid input."));
        }

        let out = render(None, &RenderContext::new(500));
        assert_eq!(body_json(&out)["msg"], json!("Invalid input."));
    }

    #[test]
    fn test_passthrough_without_status() {
        let data = json!({"raw": true});
        let out = render(Some(&data), &RenderContext::default());

        assert_eq!(body_json(&out), data);
    }

    #[test]
    fn test_passthrough_none_yields_zero_bytes() {
        let out = render(None, &RenderContext::default());
        assert!(out.body.is_empty());
    }

    #[test]
    fn test_pretty_output_is_indented() {
        let data = json!({"a": 1});
        let ctx = RenderContext::new(200).with_pretty(true);
        let out = render(Some(&data), &ctx);

        let text = String::from_utf8(out.body.clone()).unwrap();
        assert!(text.contains('\n'));
        assert_eq!(body_json(&out)["data"], json!({"a": 1}));
    }

    #[test]
    fn test_datetime_payload_coercion() {
        let opts = JsonOptions::default();
        let dt = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();

        assert_eq!(dt.into_payload(&opts), json!("2024-05-01 12:30:00"));
    }

    #[test]
    fn test_date_payload_coercion() {
        let opts = JsonOptions::default();
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(date.into_payload(&opts), json!("2024-05-01"));
    }

    #[test]
    fn test_decimal_payload_coercion() {
        let opts = JsonOptions::default();
        let price = Decimal::new(12345, 2);
        assert_eq!(price.into_payload(&opts), json!("123.45"));

        let as_float = JsonOptions {
            decimal_as_string: false,
            ..Default::default()
        };
        assert_eq!(price.into_payload(&as_float), json!(123.45));
    }

    #[test]
    fn test_sequence_payload_coercion() {
        let opts = JsonOptions::default();
        let amounts = vec![Decimal::new(100, 0), Decimal::new(250, 1)];
        assert_eq!(amounts.into_payload(&opts), json!(["100", "25.0"]));

        let missing: Option<Decimal> = None;
        assert_eq!(missing.into_payload(&opts), Value::Null);
    }
}
