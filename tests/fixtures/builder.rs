//! Byte level builders for binary XML test documents.
//!
//! Shared by the unit tests, the integration tests and the benchmarks, so it only depends on std.
#![allow(dead_code)]

/// `0xFFFFFFFF`, an absent string reference.
pub const NONE: u32 = u32::MAX;

pub const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";

const TYPE_NULL: u8 = 0x00;
const TYPE_REFERENCE: u8 = 0x01;
const TYPE_STRING: u8 = 0x03;
const TYPE_INT_DEC: u8 = 0x10;
const TYPE_INT_BOOLEAN: u8 = 0x12;

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn pad4(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

/// A chunk with the given header size, where `rest` holds everything after the first 8 bytes.
pub fn raw_chunk(chunk_type: u16, header_size: u16, rest: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + rest.len());
    put_u16(&mut out, chunk_type);
    put_u16(&mut out, header_size);
    put_u32(&mut out, (8 + rest.len()) as u32);
    out.extend_from_slice(rest);
    out
}

/// Wraps `chunks` in the top level `Xml` chunk.
pub fn document(chunks: &[Vec<u8>]) -> Vec<u8> {
    raw_chunk(0x0003, 8, &chunks.concat())
}

fn utf8_length(out: &mut Vec<u8>, len: usize) {
    if len > 0x7f {
        out.push(0x80 | ((len >> 8) as u8 & 0x7f));
    }
    out.push((len & 0xff) as u8);
}

fn utf16_length(out: &mut Vec<u8>, len: usize) {
    if len > 0x7fff {
        put_u16(out, 0x8000 | ((len >> 16) as u16 & 0x7fff));
    }
    put_u16(out, (len & 0xffff) as u16);
}

fn encode_entry(text: &str, utf8: bool) -> Vec<u8> {
    let mut out = Vec::new();
    let units: Vec<u16> = text.encode_utf16().collect();
    if utf8 {
        utf8_length(&mut out, units.len());
        utf8_length(&mut out, text.len());
        out.extend_from_slice(text.as_bytes());
        out.push(0);
    } else {
        utf16_length(&mut out, units.len());
        for unit in units {
            put_u16(&mut out, unit);
        }
        put_u16(&mut out, 0);
    }
    out
}

pub fn string_pool_chunk(strings: &[&str], utf8: bool) -> Vec<u8> {
    string_pool_chunk_with_styles(strings, utf8, &[])
}

/// A string pool; `styles[i]` lists the `(name, first_char, last_char)` spans of string `i`.
pub fn string_pool_chunk_with_styles(
    strings: &[&str],
    utf8: bool,
    styles: &[&[(u32, u32, u32)]],
) -> Vec<u8> {
    let mut data = Vec::new();
    let mut offsets = Vec::with_capacity(strings.len());
    for text in strings {
        offsets.push(data.len() as u32);
        data.extend_from_slice(&encode_entry(text, utf8));
    }
    pad4(&mut data);

    let mut style_data = Vec::new();
    let mut style_offsets = Vec::with_capacity(styles.len());
    for spans in styles {
        style_offsets.push(style_data.len() as u32);
        for &(name, first, last) in spans.iter() {
            put_u32(&mut style_data, name);
            put_u32(&mut style_data, first);
            put_u32(&mut style_data, last);
        }
        put_u32(&mut style_data, u32::MAX);
    }
    if !styles.is_empty() {
        put_u32(&mut style_data, u32::MAX);
        put_u32(&mut style_data, u32::MAX);
    }

    let strings_start = 28 + 4 * (strings.len() + styles.len());
    let styles_start = if styles.is_empty() {
        0
    } else {
        strings_start + data.len()
    };

    let mut rest = Vec::new();
    put_u32(&mut rest, strings.len() as u32);
    put_u32(&mut rest, styles.len() as u32);
    put_u32(&mut rest, if utf8 { 0x100 } else { 0 });
    put_u32(&mut rest, strings_start as u32);
    put_u32(&mut rest, styles_start as u32);
    for offset in offsets.into_iter().chain(style_offsets) {
        put_u32(&mut rest, offset);
    }
    rest.extend_from_slice(&data);
    rest.extend_from_slice(&style_data);

    raw_chunk(0x0001, 28, &rest)
}

pub fn resource_map_chunk(ids: &[u32]) -> Vec<u8> {
    let mut rest = Vec::with_capacity(ids.len() * 4);
    for &id in ids {
        put_u32(&mut rest, id);
    }
    raw_chunk(0x0180, 8, &rest)
}

fn node_chunk(chunk_type: u16, line: u32, body: &[u8]) -> Vec<u8> {
    let mut rest = Vec::with_capacity(8 + body.len());
    put_u32(&mut rest, line);
    put_u32(&mut rest, NONE);
    rest.extend_from_slice(body);
    raw_chunk(chunk_type, 16, &rest)
}

fn pair(a: u32, b: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(8);
    put_u32(&mut out, a);
    put_u32(&mut out, b);
    out
}

pub fn start_namespace_chunk(line: u32, prefix: u32, uri: u32) -> Vec<u8> {
    node_chunk(0x0100, line, &pair(prefix, uri))
}

pub fn end_namespace_chunk(line: u32, prefix: u32, uri: u32) -> Vec<u8> {
    node_chunk(0x0101, line, &pair(prefix, uri))
}

pub fn end_element_chunk(line: u32, ns: u32, name: u32) -> Vec<u8> {
    node_chunk(0x0103, line, &pair(ns, name))
}

pub fn cdata_chunk(line: u32, data: u32) -> Vec<u8> {
    let mut body = Vec::with_capacity(12);
    put_u32(&mut body, data);
    put_u16(&mut body, 8);
    body.push(0);
    body.push(TYPE_STRING);
    put_u32(&mut body, data);
    node_chunk(0x0104, line, &body)
}

#[derive(Debug, Clone, Copy)]
pub struct Attr {
    pub ns: u32,
    pub name: u32,
    pub raw: u32,
    pub data_type: u8,
    pub data: u32,
}

impl Attr {
    pub fn string(ns: u32, name: u32, value: u32) -> Self {
        Attr {
            ns,
            name,
            raw: value,
            data_type: TYPE_STRING,
            data: value,
        }
    }

    pub fn typed(ns: u32, name: u32, data_type: u8, data: u32) -> Self {
        Attr {
            ns,
            name,
            raw: NONE,
            data_type,
            data,
        }
    }

    pub fn int(ns: u32, name: u32, value: i32) -> Self {
        Attr::typed(ns, name, TYPE_INT_DEC, value as u32)
    }

    pub fn boolean(ns: u32, name: u32, value: bool) -> Self {
        Attr::typed(ns, name, TYPE_INT_BOOLEAN, if value { u32::MAX } else { 0 })
    }

    pub fn reference(ns: u32, name: u32, id: u32) -> Self {
        Attr::typed(ns, name, TYPE_REFERENCE, id)
    }

    pub fn null(ns: u32, name: u32) -> Self {
        Attr::typed(ns, name, TYPE_NULL, 0)
    }
}

pub fn start_element_chunk(line: u32, ns: u32, name: u32, attrs: &[Attr]) -> Vec<u8> {
    start_element_chunk_with_indices(line, ns, name, attrs, (0, 0, 0))
}

/// A start element with 1-based `(id, class, style)` attribute indices.
pub fn start_element_chunk_with_indices(
    line: u32,
    ns: u32,
    name: u32,
    attrs: &[Attr],
    (id, class, style): (u16, u16, u16),
) -> Vec<u8> {
    let mut body = Vec::with_capacity(20 + attrs.len() * 20);
    put_u32(&mut body, ns);
    put_u32(&mut body, name);
    put_u16(&mut body, 20);
    put_u16(&mut body, 20);
    put_u16(&mut body, attrs.len() as u16);
    put_u16(&mut body, id);
    put_u16(&mut body, class);
    put_u16(&mut body, style);
    for attr in attrs {
        put_u32(&mut body, attr.ns);
        put_u32(&mut body, attr.name);
        put_u32(&mut body, attr.raw);
        put_u16(&mut body, 8);
        body.push(0);
        body.push(attr.data_type);
        put_u32(&mut body, attr.data);
    }
    node_chunk(0x0102, line, &body)
}

/// String pool of [`sample_manifest`].
pub const SAMPLE_STRINGS: &[&str] = &[
    "versionCode",
    "minSdkVersion",
    "label",
    "debuggable",
    "name",
    "android",
    ANDROID_NS,
    "manifest",
    "package",
    "com.example.app",
    "uses-sdk",
    "application",
    "Example",
    "activity",
    "com.example.app.Main",
    "meta-data",
    "hello",
];

/// Resource ids of the first [`SAMPLE_STRINGS`] entries.
pub const SAMPLE_RESOURCE_IDS: &[u32] = &[
    0x0101_021b,
    0x0101_020c,
    0x0101_0001,
    0x0101_000f,
    0x0101_0003,
];

/// A small but complete manifest:
///
/// ```xml
/// <manifest xmlns:android="..." package="com.example.app" android:versionCode="1">
///   <uses-sdk android:minSdkVersion="21"/>
///   <application android:label="Example" android:debuggable="true">
///     <activity android:name="com.example.app.Main">
///       <meta-data>hello</meta-data>
///     </activity>
///   </application>
/// </manifest>
/// ```
pub fn sample_manifest() -> Vec<u8> {
    sample_manifest_with_pool(true)
}

pub fn sample_manifest_with_pool(utf8: bool) -> Vec<u8> {
    let android = 6;
    document(&[
        string_pool_chunk(SAMPLE_STRINGS, utf8),
        resource_map_chunk(SAMPLE_RESOURCE_IDS),
        start_namespace_chunk(1, 5, android),
        start_element_chunk(
            1,
            NONE,
            7,
            &[Attr::int(android, 0, 1), Attr::string(NONE, 8, 9)],
        ),
        start_element_chunk(2, NONE, 10, &[Attr::int(android, 1, 21)]),
        end_element_chunk(2, NONE, 10),
        start_element_chunk(
            3,
            NONE,
            11,
            &[Attr::string(android, 2, 12), Attr::boolean(android, 3, true)],
        ),
        start_element_chunk(4, NONE, 13, &[Attr::string(android, 4, 14)]),
        start_element_chunk(5, NONE, 15, &[]),
        cdata_chunk(5, 16),
        end_element_chunk(5, NONE, 15),
        end_element_chunk(6, NONE, 13),
        end_element_chunk(7, NONE, 11),
        end_element_chunk(8, NONE, 7),
        end_namespace_chunk(8, 5, android),
    ])
}
