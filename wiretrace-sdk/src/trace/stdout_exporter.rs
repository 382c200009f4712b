use crate::error::{SdkError, SdkResult};
use crate::trace::{SpanData, SpanExporter};
use futures_util::future::BoxFuture;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};
use std::time::{SystemTime, UNIX_EPOCH};

/// Writes every exported span as one JSON object per line.
///
/// Writes to standard output unless another writer is supplied with
/// [`StdoutSpanExporter::with_writer`].
pub struct StdoutSpanExporter {
    writer: Box<dyn Write + Send + Sync>,
    is_shutdown: bool,
}

impl fmt::Debug for StdoutSpanExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StdoutSpanExporter")
    }
}

impl Default for StdoutSpanExporter {
    fn default() -> Self {
        StdoutSpanExporter::with_writer(io::stdout())
    }
}

impl StdoutSpanExporter {
    /// Create an exporter writing to `writer`.
    pub fn with_writer<W: Write + Send + Sync + 'static>(writer: W) -> Self {
        StdoutSpanExporter {
            writer: Box::new(writer),
            is_shutdown: false,
        }
    }

    fn write_batch(&mut self, batch: Vec<SpanData>) -> io::Result<()> {
        for span in batch {
            serde_json::to_writer(&mut self.writer, &JsonSpan::from(span))?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()
    }
}

impl SpanExporter for StdoutSpanExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, SdkResult> {
        let result = if self.is_shutdown {
            Err(SdkError::AlreadyShutdown)
        } else {
            self.write_batch(batch)
                .map_err(|err| SdkError::InternalFailure(err.to_string()))
        };
        Box::pin(futures_util::future::ready(result))
    }

    fn shutdown(&mut self) -> SdkResult {
        self.is_shutdown = true;
        Ok(())
    }

    fn force_flush(&mut self) -> SdkResult {
        self.writer
            .flush()
            .map_err(|err| SdkError::InternalFailure(err.to_string()))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSpan {
    service_name: Cow<'static, str>,
    scope: Cow<'static, str>,
    trace_id: String,
    span_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_span_id: Option<String>,
    name: Cow<'static, str>,
    kind: &'static str,
    #[serde(serialize_with = "as_unix_nano")]
    start_time_unix_nano: SystemTime,
    #[serde(serialize_with = "as_unix_nano")]
    end_time_unix_nano: SystemTime,
    attributes: Vec<JsonKeyValue>,
    status: JsonStatus,
}

impl From<SpanData> for JsonSpan {
    fn from(value: SpanData) -> Self {
        JsonSpan {
            service_name: value.service_name,
            scope: value.instrumentation_scope,
            trace_id: value.span_context.trace_id().to_string(),
            span_id: value.span_context.span_id().to_string(),
            parent_span_id: value.parent_span_id.map(|id| id.to_string()),
            name: value.name,
            kind: value.span_kind.as_str(),
            start_time_unix_nano: value.start_time,
            end_time_unix_nano: value.end_time,
            attributes: value.attributes.into_iter().map(Into::into).collect(),
            status: value.status.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonKeyValue {
    key: String,
    value: JsonValue,
}

impl From<wiretrace::KeyValue> for JsonKeyValue {
    fn from(kv: wiretrace::KeyValue) -> Self {
        JsonKeyValue {
            key: kv.key.as_str().to_owned(),
            value: kv.value.into(),
        }
    }
}

#[derive(Debug, Serialize)]
enum JsonValue {
    #[serde(rename = "boolValue")]
    Bool(bool),
    #[serde(rename = "intValue")]
    Int(i64),
    #[serde(rename = "doubleValue")]
    Double(f64),
    #[serde(rename = "stringValue")]
    String(String),
}

impl From<wiretrace::Value> for JsonValue {
    fn from(value: wiretrace::Value) -> Self {
        match value {
            wiretrace::Value::Bool(b) => JsonValue::Bool(b),
            wiretrace::Value::I64(i) => JsonValue::Int(i),
            wiretrace::Value::F64(f) => JsonValue::Double(f),
            wiretrace::Value::String(s) => JsonValue::String(s.into_owned()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonStatus {
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<Cow<'static, str>>,
}

impl From<wiretrace::trace::Status> for JsonStatus {
    fn from(value: wiretrace::trace::Status) -> Self {
        match value {
            wiretrace::trace::Status::Unset => JsonStatus {
                code: "UNSET",
                message: None,
            },
            wiretrace::trace::Status::Error { description } => JsonStatus {
                code: "ERROR",
                message: Some(description),
            },
            wiretrace::trace::Status::Ok => JsonStatus {
                code: "OK",
                message: None,
            },
        }
    }
}

fn as_unix_nano<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let nanos = time
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    serializer.serialize_u64(u64::try_from(nanos).unwrap_or(u64::MAX))
}
