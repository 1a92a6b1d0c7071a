// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! pax extended-header record encode/decode: `"<len> <key>=<value>\n"` records,
//! where `<len>` is the record's own total byte length.

use super::error::{TarError, TarResult};
use std::collections::BTreeMap;

/// Encode a set of pax attributes (e.g. `path` for long names) into the record
/// text carried as the payload of a `typeflag='x'` header.
pub fn encode(records: &BTreeMap<String, String>) -> Vec<u8> {
    let mut out = Vec::new();
    for (key, value) in records {
        out.extend_from_slice(encode_record(key, value).as_bytes());
    }
    out
}

fn encode_record(key: &str, value: &str) -> String {
    let tail = format!(" {}={}\n", key, value);
    let mut length = tail.len() + 1;
    loop {
        let candidate_len = length.to_string().len() + tail.len();
        if candidate_len == length {
            return format!("{}{}", length, tail);
        }
        length = candidate_len;
    }
}

/// Decode pax record text back into key/value pairs. Malformed records (missing
/// the `=`, non-numeric length prefix) are reported as `BadHeader`.
pub fn decode(mut data: &[u8]) -> TarResult<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    while !data.is_empty() {
        let space = data
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| TarError::BadHeader("pax record missing length prefix".into()))?;
        let len_text = std::str::from_utf8(&data[..space])
            .map_err(|_| TarError::BadHeader("pax record length is not UTF-8".into()))?;
        let len: usize = len_text
            .parse()
            .map_err(|_| TarError::BadHeader(format!("pax record length '{}' is not numeric", len_text)))?;
        if len == 0 || len > data.len() {
            return Err(TarError::BadHeader("pax record length out of range".into()));
        }
        let record = &data[..len];
        let body = &record[space + 1..record.len() - 1]; // strip "<len> " prefix and trailing '\n'
        let body_text = std::str::from_utf8(body)
            .map_err(|_| TarError::BadHeader("pax record body is not UTF-8".into()))?;
        let eq = body_text
            .find('=')
            .ok_or_else(|| TarError::BadHeader("pax record missing '='".into()))?;
        out.insert(body_text[..eq].to_string(), body_text[eq + 1..].to_string());
        data = &data[len..];
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_records() {
        let mut records = BTreeMap::new();
        records.insert("path".to_string(), "dir/a-very-long-name.bin".to_string());
        records.insert("size".to_string(), "16".to_string());

        let encoded = encode(&records);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn record_length_prefix_is_self_consistent() {
        // A key/value pair chosen so the length digit count itself changes the
        // overall length, exercising the fixed-point loop.
        let mut records = BTreeMap::new();
        records.insert("path".to_string(), "x".repeat(90));
        let encoded = encode(&records);
        let text = String::from_utf8(encoded.clone()).unwrap();
        let space = text.find(' ').unwrap();
        let declared_len: usize = text[..space].parse().unwrap();
        assert_eq!(declared_len, encoded.len());
    }
}
