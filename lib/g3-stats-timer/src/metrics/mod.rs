/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use thiserror::Error;

mod name;
pub use name::MetricName;

mod tag;
pub use tag::{MetricTagMap, MetricTagName, MetricTagValue};

mod identity;
pub use identity::MetricIdentity;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("empty string")]
    Empty,
    #[error("invalid graphic char: {0}")]
    InvalidGraphic(char),
    #[error("not alpha numeric char")]
    NotAlphaNumeric,
}

fn chars_allowed_in_opentsdb(s: &str) -> Result<(), ParseError> {
    for c in s.chars() {
        // Same character range as OpenTSDB
        // http://opentsdb.net/docs/build/html/user_guide/writing/index.html#metrics-and-tags
        if c.is_ascii() {
            match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '/' => {}
                _ => {
                    return if c.is_ascii_graphic() {
                        Err(ParseError::InvalidGraphic(c))
                    } else {
                        Err(ParseError::NotAlphaNumeric)
                    };
                }
            }
        } else if !c.is_alphanumeric() {
            return Err(ParseError::NotAlphaNumeric);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_chars() {
        assert!(chars_allowed_in_opentsdb("request.duration_ms/p-1").is_ok());
        assert!(matches!(
            chars_allowed_in_opentsdb("a=b"),
            Err(ParseError::InvalidGraphic('='))
        ));
        assert!(matches!(
            chars_allowed_in_opentsdb("a b"),
            Err(ParseError::NotAlphaNumeric)
        ));
        assert!(chars_allowed_in_opentsdb("延迟").is_ok());
    }
}
