// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use uuid::Uuid;

/// Random hyphenated UUID v4, used for trace ids.
#[must_use]
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Id for requests and process-level jobs.
///
/// Shares the UUID format with [`generate_id`] so collectors can index both the same way.
#[must_use]
pub fn generate_short_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_uuid_format(id: &str) {
        assert_eq!(id.len(), 36, "{id} should be 36 characters");
        let bytes = id.as_bytes();
        for position in [8, 13, 18, 23] {
            assert_eq!(bytes[position], b'-', "{id} missing hyphen at {position}");
        }
    }

    #[test]
    fn test_generate_id() {
        let id = generate_id();
        assert_uuid_format(&id);
        assert_ne!(id, generate_id());
    }

    #[test]
    fn test_generate_short_id() {
        let id = generate_short_id();
        assert_uuid_format(&id);
        assert_ne!(id, generate_short_id());
    }
}
