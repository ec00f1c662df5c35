//! Format detection and conversion between on-disk encodings and the in-memory mapping tree.
//!
//! Every format is read into a `serde_json::Value`. Property lists are converted explicitly
//! because their data, date and UID values have no JSON counterpart; those are rejected rather
//! than silently rewritten.

use crate::error::{MetadataError, MetadataResult};
use camino::Utf8Path;
use serde_json::{Map, Number, Value};
use std::fmt;
use std::io::Cursor;

const BINARY_PLIST_MAGIC: &[u8] = b"bplist00";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataFormat {
    XmlPlist,
    BinaryPlist,
    Json,
    Yaml,
    Toml,
}

impl MetadataFormat {
    /// Infer the format from the file extension. `.plist` files are assumed XML until their
    /// bytes say otherwise (see [`MetadataFormat::refine`]).
    pub fn from_path(path: &Utf8Path) -> MetadataResult<Self> {
        let ext = path.extension().map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("plist") | Some("entitlements") => Ok(Self::XmlPlist),
            Some("json") => Ok(Self::Json),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            _ => Err(MetadataError::UnknownFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Distinguish binary from XML property lists by their magic bytes.
    pub fn refine(self, bytes: &[u8]) -> Self {
        match self {
            Self::XmlPlist | Self::BinaryPlist if bytes.starts_with(BINARY_PLIST_MAGIC) => {
                Self::BinaryPlist
            }
            Self::BinaryPlist => Self::XmlPlist,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::XmlPlist => "xml plist",
            Self::BinaryPlist => "binary plist",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
        }
    }
}

impl fmt::Display for MetadataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn parse(bytes: &[u8], format: MetadataFormat) -> MetadataResult<Value> {
    match format {
        MetadataFormat::Json => {
            serde_json::from_slice(bytes).map_err(|e| MetadataError::parse(format, e))
        }
        MetadataFormat::Yaml => {
            serde_yaml::from_slice(bytes).map_err(|e| MetadataError::parse(format, e))
        }
        MetadataFormat::Toml => {
            let text = std::str::from_utf8(bytes).map_err(|e| MetadataError::parse(format, e))?;
            toml::from_str(text).map_err(|e| MetadataError::parse(format, e))
        }
        MetadataFormat::XmlPlist | MetadataFormat::BinaryPlist => {
            let value = plist::Value::from_reader(Cursor::new(bytes))
                .map_err(|e| MetadataError::parse(format, e))?;
            plist_to_json(value, format)
        }
    }
}

pub fn render(value: &Value, format: MetadataFormat) -> MetadataResult<Vec<u8>> {
    match format {
        MetadataFormat::Json => {
            let mut out =
                serde_json::to_string_pretty(value).map_err(|e| MetadataError::serialize(format, e))?;
            out.push('\n');
            Ok(out.into_bytes())
        }
        MetadataFormat::Yaml => serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| MetadataError::serialize(format, e)),
        MetadataFormat::Toml => toml::to_string_pretty(value)
            .map(String::into_bytes)
            .map_err(|e| MetadataError::serialize(format, e)),
        MetadataFormat::XmlPlist => {
            let mut out = Vec::new();
            json_to_plist(value, format)?
                .to_writer_xml(&mut out)
                .map_err(|e| MetadataError::serialize(format, e))?;
            out.push(b'\n');
            Ok(out)
        }
        MetadataFormat::BinaryPlist => {
            let mut out = Vec::new();
            json_to_plist(value, format)?
                .to_writer_binary(&mut out)
                .map_err(|e| MetadataError::serialize(format, e))?;
            Ok(out)
        }
    }
}

fn plist_to_json(value: plist::Value, format: MetadataFormat) -> MetadataResult<Value> {
    let unsupported = |what| MetadataError::Unsupported { format, what };
    Ok(match value {
        plist::Value::Dictionary(dict) => {
            let mut map = Map::new();
            for (key, value) in dict {
                map.insert(key, plist_to_json(value, format)?);
            }
            Value::Object(map)
        }
        plist::Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| plist_to_json(item, format))
                .collect::<MetadataResult<_>>()?,
        ),
        plist::Value::Boolean(b) => Value::Bool(b),
        plist::Value::String(s) => Value::String(s),
        plist::Value::Integer(i) => {
            if let Some(n) = i.as_signed() {
                Value::from(n)
            } else if let Some(n) = i.as_unsigned() {
                Value::from(n)
            } else {
                return Err(unsupported("out-of-range integers"));
            }
        }
        plist::Value::Real(r) => Number::from_f64(r)
            .map(Value::Number)
            .ok_or_else(|| unsupported("non-finite reals"))?,
        plist::Value::Data(_) => return Err(unsupported("data values")),
        plist::Value::Date(_) => return Err(unsupported("date values")),
        _ => return Err(unsupported("uid values")),
    })
}

fn json_to_plist(value: &Value, format: MetadataFormat) -> MetadataResult<plist::Value> {
    Ok(match value {
        Value::Null => {
            return Err(MetadataError::Unsupported {
                format,
                what: "null values",
            });
        }
        Value::Bool(b) => plist::Value::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                plist::Value::Integer(i.into())
            } else if let Some(u) = n.as_u64() {
                plist::Value::Integer(u.into())
            } else {
                plist::Value::Real(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => plist::Value::String(s.clone()),
        Value::Array(items) => plist::Value::Array(
            items
                .iter()
                .map(|item| json_to_plist(item, format))
                .collect::<MetadataResult<_>>()?,
        ),
        Value::Object(map) => {
            let mut dict = plist::Dictionary::new();
            for (key, value) in map {
                dict.insert(key.clone(), json_to_plist(value, format)?);
            }
            plist::Value::Dictionary(dict)
        }
    })
}
