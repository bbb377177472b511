#![allow(missing_docs)]

pub(crate) mod http;

pub(crate) use http::{parse_json_body, serve};
