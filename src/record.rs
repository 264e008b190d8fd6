use std::borrow::Cow;
use std::fmt;
use std::panic::Location;

use serde::Serialize;

use crate::buffer::Buffer;
use crate::level::Level;

/// One owned message argument, rendered on the worker thread.
///
/// Arguments are captured by value when the record is created so the
/// caller is free to mutate or drop the originals immediately.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Bool(bool),
    Int(i64),
    Uint(u64),
    F32(f32),
    F64(f64),
    Str(Cow<'static, str>),
    Bytes(Vec<u8>),
    Error(String),
    /// Anything else, captured as a JSON value and rendered compactly.
    Structured(serde_json::Value),
}

impl Arg {
    pub fn error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        Arg::Error(err.to_string())
    }

    pub fn display<T: fmt::Display + ?Sized>(value: &T) -> Self {
        Arg::Str(Cow::Owned(value.to_string()))
    }

    /// Captures any serializable value; unserializable values degrade to
    /// an error argument describing why.
    pub fn structured<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => Arg::Structured(v),
            Err(e) => Arg::Error(format!("unserializable argument: {}", e)),
        }
    }

    pub fn render(&self, buf: &mut Buffer) {
        match self {
            Arg::Bool(v) => buf.append_bool(*v),
            Arg::Int(v) => buf.append_int(*v),
            Arg::Uint(v) => buf.append_uint(*v),
            Arg::F32(v) => buf.append_f32(*v),
            Arg::F64(v) => buf.append_f64(*v),
            Arg::Str(s) => buf.write_str(s),
            Arg::Bytes(b) => buf.write_bytes(b),
            Arg::Error(e) => buf.write_str(e),
            Arg::Structured(v) => {
                if let Err(e) = serde_json::to_writer(&mut *buf, v) {
                    tracing::error!(error = %e, "structured argument encoding failed");
                }
            }
        }
    }
}

macro_rules! arg_from {
    ($variant:ident as $target:ty: $($ty:ty),*) => {
        $(
            impl From<$ty> for Arg {
                #[inline]
                fn from(v: $ty) -> Self {
                    Arg::$variant(v as $target)
                }
            }
        )*
    };
}

arg_from!(Int as i64: i8, i16, i32, i64, isize);
arg_from!(Uint as u64: u8, u16, u32, u64, usize);

impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        Arg::Bool(v)
    }
}

impl From<f32> for Arg {
    fn from(v: f32) -> Self {
        Arg::F32(v)
    }
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg::F64(v)
    }
}

impl From<char> for Arg {
    fn from(v: char) -> Self {
        Arg::Str(Cow::Owned(v.to_string()))
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Str(Cow::Owned(v.to_owned()))
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::Str(Cow::Owned(v))
    }
}

impl From<&String> for Arg {
    fn from(v: &String) -> Self {
        Arg::Str(Cow::Owned(v.clone()))
    }
}

impl From<Cow<'static, str>> for Arg {
    fn from(v: Cow<'static, str>) -> Self {
        Arg::Str(v)
    }
}

impl From<Vec<u8>> for Arg {
    fn from(v: Vec<u8>) -> Self {
        Arg::Bytes(v)
    }
}

impl From<&[u8]> for Arg {
    fn from(v: &[u8]) -> Self {
        Arg::Bytes(v.to_vec())
    }
}

impl From<serde_json::Value> for Arg {
    fn from(v: serde_json::Value) -> Self {
        Arg::Structured(v)
    }
}

/// How a record's message body gets written.
pub enum Body {
    /// Tagged values rendered on the worker, separated by single spaces.
    Args(Vec<Arg>),
    /// Text formatted by the caller.
    Text(String),
    /// A closure owning everything it captures.
    Render(Box<dyn FnOnce(&mut Buffer) + Send>),
}

impl Body {
    pub fn render(self, buf: &mut Buffer) {
        match self {
            Body::Args(args) => {
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        buf.write_byte(b' ');
                    }
                    arg.render(buf);
                }
            }
            Body::Text(text) => buf.write_str(&text),
            Body::Render(render) => render(buf),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Args(args) => f.debug_tuple("Args").field(args).finish(),
            Body::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Body::Render(_) => f.write_str("Render(..)"),
        }
    }
}

/// `file:line` of the logging call, file reduced to its base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: Cow<'static, str>,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<Cow<'static, str>>, line: u32) -> Self {
        let file = match file.into() {
            Cow::Borrowed(path) => Cow::Borrowed(base_name(path)),
            Cow::Owned(path) => Cow::Owned(base_name(&path).to_owned()),
        };
        Self { file, line }
    }

    pub fn from_caller(location: &'static Location<'static>) -> Self {
        Self::new(location.file(), location.line())
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path)
}

/// A message travelling from a caller to the worker.
///
/// Consumed exactly once, either by the worker or by the fallback path.
#[derive(Debug)]
pub struct LogRecord {
    pub level: Level,
    pub prefix: Option<String>,
    pub location: Option<SourceLocation>,
    pub body: Body,
}

impl LogRecord {
    pub fn new(level: Level, body: Body) -> Self {
        Self {
            level,
            prefix: None,
            location: None,
            body,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Person {
        a: &'static str,
        b: i64,
    }

    fn rendered(body: Body) -> String {
        let mut buf = Buffer::new();
        body.render(&mut buf);
        buf.to_string()
    }

    #[test]
    fn test_args_render_space_separated() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let body = Body::Args(vec![
            Arg::from(true),
            Arg::from(-7i32),
            Arg::from(42u64),
            Arg::from(1.5f64),
            Arg::from("text"),
            Arg::error(&io),
        ]);
        assert_eq!(rendered(body), "true -7 42 1.5 text disk gone");
    }

    #[test]
    fn test_structured_fallback() {
        let body = Body::Args(vec![Arg::structured(&Person { a: "Hello", b: 64 })]);
        assert_eq!(rendered(body), r#"{"a":"Hello","b":64}"#);
    }

    #[test]
    fn test_render_closure() {
        let owned = String::from("captured");
        let body = Body::Render(Box::new(move |buf: &mut Buffer| buf.write_str(&owned)));
        assert_eq!(rendered(body), "captured");
    }

    #[test]
    fn test_location_base_name() {
        let loc = SourceLocation::new("src/deep/module.rs", 12);
        assert_eq!(loc.file, "module.rs");
        let loc = SourceLocation::new(String::from(r"C:\src\main.rs"), 3);
        assert_eq!(loc.file, "main.rs");
    }
}
